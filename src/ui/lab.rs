use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::engine::lab::Lab;
use crate::engine::params::{ParamKind, ParamSpec, Value};
use crate::engine::simulation::{RunState, Simulation};
use crate::labs::panel::LabPanel;
use crate::ui::canvas::canvas_block;

const SLIDER_WIDTH: usize = 14;
const LABEL: Color = Color::Rgb(140, 140, 140);
const KEY: Color = Color::Rgb(80, 200, 255);
const ACCENT: Color = Color::Rgb(255, 220, 80);
const FRAME: Color = Color::Rgb(60, 150, 200);

pub fn render_lab<L: Lab>(frame: &mut Frame, area: Rect, panel: &mut LabPanel<L>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Workspace
            Constraint::Length(3), // Help bar
        ])
        .split(area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(38), Constraint::Min(0)])
        .split(rows[0]);

    let readouts = panel.simulation().readouts();
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(readouts.len() as u16 + 4),
        ])
        .split(cols[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(9)])
        .split(cols[1]);

    render_controls(frame, left[0], panel);
    render_readouts(frame, left[1], panel, &readouts);
    let title = panel.simulation().lab().title();
    panel.surface_mut().render(frame, right[0], canvas_block(title));
    render_narrative(frame, right[1], panel.simulation().narrative());
    render_help(frame, rows[1], panel.status());
}

fn slider(spec: &ParamSpec, value: Value) -> String {
    let filled = (spec.fraction(value) * SLIDER_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(SLIDER_WIDTH - filled.min(SLIDER_WIDTH)))
}

fn control_lines(spec: &ParamSpec, value: Value, selected: bool) -> Vec<Line<'static>> {
    let marker = if selected { "▶ " } else { "  " };
    let label_color = if selected { Color::Rgb(255, 255, 255) } else { LABEL };
    let mut header = vec![
        Span::styled(marker, Style::default().fg(ACCENT)),
        Span::styled(spec.label, Style::default().fg(label_color).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(value.to_string(), Style::default().fg(ACCENT)),
    ];
    if !spec.unit.is_empty() {
        header.push(Span::styled(format!(" {}", spec.unit), Style::default().fg(LABEL)));
    }
    let detail = match &spec.kind {
        ParamKind::Number { .. } => Span::styled(
            format!("    {}", slider(spec, value)),
            Style::default().fg(if selected { KEY } else { Color::Rgb(60, 90, 120) }),
        ),
        ParamKind::Flag => Span::styled(
            if value == Value::Flag(true) { "    [x]" } else { "    [ ]" },
            Style::default().fg(KEY),
        ),
        ParamKind::Choice { options } => Span::styled(
            format!("    ◀ {} ▶", options.join(" · ")),
            Style::default().fg(Color::Rgb(100, 100, 120)),
        ),
    };
    vec![Line::from(header), Line::from(detail)]
}

fn render_controls<L: Lab>(frame: &mut Frame, area: Rect, panel: &LabPanel<L>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(FRAME))
        .title(" 🎛 Controls ")
        .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD));

    let lines: Vec<Line> = panel
        .simulation()
        .params()
        .controls()
        .enumerate()
        .flat_map(|(i, (spec, value))| control_lines(spec, value, i == panel.selected()))
        .collect();

    // Keep the selected control in view on short terminals.
    let visible = block.inner(area).height as usize;
    let scroll = (panel.selected() * 2 + 2).saturating_sub(visible) as u16;
    frame.render_widget(Paragraph::new(lines).block(block).scroll((scroll, 0)), area);
}

fn state_color(state: RunState) -> Color {
    match state {
        RunState::Idle => Color::Rgb(120, 120, 140),
        RunState::Running => Color::Rgb(80, 220, 80),
        RunState::Paused => ACCENT,
        RunState::Stopped => Color::Rgb(220, 80, 80),
    }
}

/// Run state, simulated time, speed and frames drawn so far.
fn clock_line<L: Lab>(sim: &Simulation<L>) -> Line<'static> {
    let clock = sim.clock();
    let stats = sim.stats();
    let mut spans = vec![
        Span::styled(
            format!(" {} ", sim.run_state().label()),
            Style::default().fg(Color::Black).bg(state_color(sim.run_state())).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  t = {:.1} s", clock.elapsed), Style::default().fg(Color::White)),
        Span::styled(format!("  ×{:.1}", clock.speed), Style::default().fg(KEY)),
        Span::styled(format!("  ⟳ {}", stats.draws), Style::default().fg(LABEL)),
    ];
    if stats.skipped > 0 {
        spans.push(Span::styled(format!(" ({} skipped)", stats.skipped), Style::default().fg(LABEL)));
    }
    Line::from(spans)
}

fn render_readouts<L: Lab>(
    frame: &mut Frame,
    area: Rect,
    panel: &LabPanel<L>,
    readouts: &[crate::engine::lab::Readout],
) {
    let mut lines = vec![clock_line(panel.simulation()), Line::from("")];
    for r in readouts {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<10}", r.label), Style::default().fg(LABEL)),
            Span::styled(r.value.clone(), Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        ]));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(FRAME))
        .title(" 📊 Readouts ")
        .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_narrative(frame: &mut Frame, area: Rect, narrative: &[String]) {
    let lines: Vec<Line> = if narrative.is_empty() {
        vec![Line::from(Span::styled(
            "  Press Space to run the experiment or E for an explanation.",
            Style::default().fg(Color::Rgb(100, 100, 120)).add_modifier(Modifier::ITALIC),
        ))]
    } else {
        narrative
            .iter()
            .map(|text| {
                Line::from(vec![
                    Span::styled("• ", Style::default().fg(ACCENT)),
                    Span::styled(text.clone(), Style::default().fg(Color::Rgb(200, 200, 220))),
                ])
            })
            .collect()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(FRAME))
        .title(" 🧠 Analysis ")
        .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD));
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), area);
}

fn render_help(frame: &mut Frame, area: Rect, status: Option<&str>) {
    let keys = [
        ("↑↓", "Select"),
        ("←→", "Adjust"),
        ("Space", "Run/Pause"),
        ("S", "Stop"),
        ("R", "Reset"),
        ("+/-", "Speed"),
        ("E", "Explain"),
        ("Esc", "Home"),
    ];
    let mut spans = Vec::new();
    for (key, action) in keys {
        spans.push(Span::styled(format!(" {key} "), Style::default().fg(KEY).add_modifier(Modifier::BOLD)));
        spans.push(Span::styled(format!("{action}  "), Style::default().fg(LABEL)));
    }
    if let Some(status) = status {
        spans.push(Span::styled(format!(" ⚠ {status}"), Style::default().fg(Color::Rgb(220, 80, 80))));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(60, 60, 80)));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::engine::draw::Surface;
    use crate::engine::simulation::SimOptions;
    use crate::labs::electricity::ElectricityLab;
    use crate::labs::Screen;

    #[test]
    fn slider_fills_with_the_value() {
        let spec = ParamSpec::number("v", "V", "", (0.0, 10.0, 1.0), 5.0);
        assert_eq!(slider(&spec, Value::Number(0.0)), "░".repeat(SLIDER_WIDTH));
        assert_eq!(slider(&spec, Value::Number(10.0)), "█".repeat(SLIDER_WIDTH));
        assert_eq!(slider(&spec, Value::Number(5.0)).chars().filter(|c| *c == '█').count(), 7);
    }

    #[test]
    fn clock_line_counts_frames_drawn() {
        let mut panel = LabPanel::new(ElectricityLab, SimOptions::default()).unwrap();
        panel.surface_mut().mount(Rect::new(0, 0, 60, 20));
        panel.update(Instant::now());
        let text: String = clock_line(panel.simulation()).spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("IDLE"), "{text}");
        assert!(text.contains("⟳ 1"), "{text}");
        assert!(!text.contains("skipped"));
    }

    #[test]
    fn render_mounts_the_canvas_and_idle_repaint_follows() {
        let mut panel = LabPanel::new(ElectricityLab, SimOptions::default()).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| panel.render(frame, frame.area())).unwrap();
        assert!(panel.surface().viewport().is_some());

        panel.update(Instant::now());
        assert_eq!(panel.simulation().stats().draws, 1);
        terminal.draw(|frame| panel.render(frame, frame.area())).unwrap();
        assert!(panel.surface().scene().is_some());
    }
}
