//! Keyboard-driven wrapper binding one simulation to one canvas.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use tracing::{debug, warn};

use crate::engine::lab::Lab;
use crate::engine::simulation::{SimOptions, Simulation, MAX_SPEED, MIN_SPEED};
use crate::error::Result;
use crate::labs::Screen;
use crate::ui::canvas::CanvasSurface;

pub struct LabPanel<L: Lab> {
    sim: Simulation<L>,
    surface: CanvasSurface,
    selected: usize,
    status: Option<String>,
}

impl<L: Lab> LabPanel<L> {
    pub fn new(lab: L, options: SimOptions) -> Result<Self> {
        Ok(Self {
            sim: Simulation::new(lab, options)?,
            surface: CanvasSurface::default(),
            selected: 0,
            status: None,
        })
    }

    pub fn simulation(&self) -> &Simulation<L> {
        &self.sim
    }

    #[cfg(test)]
    pub fn surface(&self) -> &CanvasSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut CanvasSurface {
        &mut self.surface
    }

    /// Index of the highlighted control.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Last rejected input, shown in the help bar.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn select(&mut self, delta: isize) {
        let params = self.sim.params();
        if params.is_empty() {
            return;
        }
        self.selected = (self.selected as isize + delta).rem_euclid(params.len() as isize) as usize;
    }

    fn adjust(&mut self, steps: i32) {
        let Some(name) = self.sim.params().name_at(self.selected) else { return };
        match self.sim.nudge(name, steps) {
            Ok(changed) => {
                self.status = None;
                if changed {
                    debug!(lab = self.sim.lab().title(), param = name, "nudged");
                }
            }
            Err(err) => {
                warn!(lab = self.sim.lab().title(), %err, "rejected input");
                self.status = Some(err.to_string());
            }
        }
    }

    fn change_speed(&mut self, faster: bool) {
        self.sim.set_speed(next_speed(self.sim.clock().speed, faster));
    }
}

/// Fine steps below 1x, coarse above.
fn next_speed(speed: f64, faster: bool) -> f64 {
    let step = if speed < 1.0 || (speed == 1.0 && !faster) { 0.1 } else { 0.5 };
    let next = if faster { speed + step } else { speed - step };
    // Round away the float noise of repeated tenths.
    ((next * 10.0).round() / 10.0).clamp(MIN_SPEED, MAX_SPEED)
}

impl<L: Lab> Screen for LabPanel<L> {
    fn title(&self) -> &'static str {
        self.sim.lab().title()
    }

    fn update(&mut self, now: Instant) {
        self.sim.on_frame(now, &mut self.surface);
    }

    fn handle_input(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Up => self.select(-1),
            KeyCode::Down => self.select(1),
            KeyCode::Left => self.adjust(-1),
            KeyCode::Right => self.adjust(1),
            KeyCode::Char(' ') => self.sim.toggle(now),
            KeyCode::Char('s') | KeyCode::Char('S') => self.sim.stop(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.sim.explain(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.change_speed(true),
            KeyCode::Char('-') | KeyCode::Char('_') => self.change_speed(false),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        crate::ui::lab::render_lab(frame, area, self);
    }

    fn reset(&mut self) {
        self.sim.reset();
        self.status = None;
    }

    fn suspend(&mut self) {
        self.sim.suspend();
        self.surface.unmount();
    }
}
