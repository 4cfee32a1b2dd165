use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, Tab};
use crate::engine::simulation::RunState;

/// Running labs keep their place in the bar with a badge.
fn badge(state: Option<RunState>) -> Span<'static> {
    match state {
        Some(RunState::Running) => Span::styled("▶", Style::default().fg(Color::Rgb(80, 220, 80))),
        Some(RunState::Paused) => Span::styled("Ⅱ", Style::default().fg(Color::Rgb(255, 220, 80))),
        Some(RunState::Stopped) => Span::styled("■", Style::default().fg(Color::Rgb(220, 80, 80))),
        Some(RunState::Idle) | None => Span::raw(""),
    }
}

pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::all()
        .iter()
        .map(|t| {
            let style = if *t == app.current_tab {
                Style::default()
                    .fg(Color::Rgb(255, 220, 80))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Rgb(120, 120, 140))
            };
            Line::from(vec![Span::styled(t.title().to_string(), style), badge(app.run_state(*t))])
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
                .border_type(BorderType::Rounded)
                .title(" 🔬 LabSim ")
                .title_style(
                    Style::default()
                        .fg(Color::Rgb(200, 120, 255))
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .select(app.current_tab.index())
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Rgb(255, 220, 80))
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::styled(" │ ", Style::default().fg(Color::Rgb(60, 60, 80))));

    frame.render_widget(tabs, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_active_labs_get_a_badge() {
        assert!(badge(None).content.is_empty());
        assert!(badge(Some(RunState::Idle)).content.is_empty());
        assert_eq!(badge(Some(RunState::Running)).content, "▶");
        assert_eq!(badge(Some(RunState::Stopped)).content, "■");
    }
}
