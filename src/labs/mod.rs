pub mod corrosion;
pub mod electricity;
pub mod enzyme;
pub mod geometry;
pub mod light;
pub mod motion;
pub mod panel;
pub mod photosynthesis;
pub mod thermodynamics;

use std::time::Instant;

use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A lab as the host shell sees it.
pub trait Screen {
    fn title(&self) -> &'static str;
    fn update(&mut self, now: Instant);
    fn handle_input(&mut self, key: KeyEvent, now: Instant);
    fn render(&mut self, frame: &mut Frame, area: Rect);
    fn reset(&mut self);
    /// Called when the tab loses focus.
    fn suspend(&mut self);
}
