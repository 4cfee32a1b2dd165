pub mod canvas;
pub mod home;
pub mod lab;
pub mod tabs;

use ratatui::prelude::*;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),   // Content
        ])
        .split(frame.area());

    tabs::render_tabs(frame, app, chunks[0]);

    let selected_lab = app.selected_lab;
    match app.active_screen() {
        Some(screen) => screen.render(frame, chunks[1]),
        None => home::render_home(frame, chunks[1], selected_lab),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::app::Tab;
    use crate::config::Settings;
    use crate::engine::draw::Surface;

    #[test]
    fn every_tab_renders() {
        let mut app = App::new(&Settings::default()).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(120, 45)).unwrap();
        for tab in Tab::all() {
            app.switch_to(*tab);
            terminal.draw(|frame| render(frame, &mut app)).unwrap();
        }
        assert!(app.light.surface().viewport().is_some());
    }
}
