use ratatui::prelude::*;
use ratatui::widgets::*;

const BANNER: &str = r#"
 ╔══════════════════════════════════════════════════════════╗
 ║  ██╗      █████╗ ██████╗ ███████╗██╗███╗   ███╗           ║
 ║  ██║     ██╔══██╗██╔══██╗██╔════╝██║████╗ ████║           ║
 ║  ██║     ███████║██████╔╝███████╗██║██╔████╔██║           ║
 ║  ██║     ██╔══██║██╔══██╗╚════██║██║██║╚██╔╝██║           ║
 ║  ███████╗██║  ██║██████╔╝███████║██║██║ ╚═╝ ██║           ║
 ║  ╚══════╝╚═╝  ╚═╝╚═════╝ ╚══════╝╚═╝╚═╝     ╚═╝           ║
 ╚══════════════════════════════════════════════════════════╝"#;

pub const LAB_COUNT: usize = 8;

struct LabTile {
    key: &'static str,
    icon: &'static str,
    name: &'static str,
    desc: &'static str,
    color: Color,
    border_color: Color,
}

const LAB_TILES: [LabTile; LAB_COUNT] = [
    LabTile { key: "1", icon: "🧪", name: "Enzymes", desc: "Catalase kinetics\nand inhibitors", color: Color::Rgb(80, 220, 80), border_color: Color::Rgb(40, 120, 40) },
    LabTile { key: "2", icon: "⚡", name: "Electricity", desc: "Ohm's law, AC\nand resonance", color: Color::Rgb(255, 220, 80), border_color: Color::Rgb(140, 110, 40) },
    LabTile { key: "3", icon: "🌿", name: "Photosynthesis", desc: "Light, CO₂ and\nlimiting factors", color: Color::Rgb(120, 220, 120), border_color: Color::Rgb(50, 110, 50) },
    LabTile { key: "4", icon: "🔥", name: "Thermodynamics", desc: "Ideal gas in\na piston", color: Color::Rgb(255, 140, 80), border_color: Color::Rgb(140, 70, 40) },
    LabTile { key: "5", icon: "🚀", name: "Motion", desc: "Forces, flight\nand bounces", color: Color::Rgb(100, 180, 255), border_color: Color::Rgb(50, 90, 140) },
    LabTile { key: "6", icon: "🔩", name: "Corrosion", desc: "Rust under\nsalt and acid", color: Color::Rgb(220, 110, 60), border_color: Color::Rgb(120, 55, 30) },
    LabTile { key: "7", icon: "📐", name: "Triangles", desc: "Heron's formula\nand angles", color: Color::Rgb(200, 120, 255), border_color: Color::Rgb(100, 60, 140) },
    LabTile { key: "8", icon: "🌈", name: "Light", desc: "Snell's law and\ntotal reflection", color: Color::Rgb(120, 200, 255), border_color: Color::Rgb(60, 100, 140) },
];

fn render_lab_tile(frame: &mut Frame, area: Rect, tile: &LabTile, selected: bool) {
    let border_color = if selected { Color::Rgb(255, 220, 80) } else { tile.border_color };
    let border_type = if selected { BorderType::Double } else { BorderType::Rounded };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 { return; }

    let name_color = if selected { Color::Rgb(255, 255, 255) } else { tile.color };
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("[{}] ", tile.key), Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)),
        Span::styled(format!("{} ", tile.icon), Style::default()),
        Span::styled(tile.name, Style::default().fg(name_color).add_modifier(Modifier::BOLD)),
    ])];

    for desc_line in tile.desc.split('\n') {
        lines.push(Line::from(Span::styled(
            desc_line,
            Style::default().fg(if selected { Color::Rgb(180, 180, 200) } else { Color::Rgb(120, 120, 140) }),
        )));
    }

    if selected {
        lines.push(Line::from(Span::styled(
            "▶ Enter to open",
            Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD),
        )));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn key_line(key: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("    {key:<17}"), Style::default().fg(Color::Rgb(80, 200, 255))),
        Span::styled(action, Style::default().fg(Color::Rgb(140, 140, 140))),
    ])
}

fn lab_notes(lab_idx: usize) -> Vec<Line<'static>> {
    let tile = &LAB_TILES[lab_idx];
    let (summary, controls): (&str, Vec<(&'static str, &'static str)>) = match lab_idx {
        0 => (
            "Michaelis-Menten rate with a Q10 temperature response.",
            vec![("enzyme, substrate", "Concentrations"), ("temperature, pH", "Conditions"), ("inhibitor", "none / competitive / non")],
        ),
        1 => (
            "DC and AC circuits, reactance and impedance.",
            vec![("circuit", "dc / ac / rc / rl / rlc"), ("V, R, C, L, f", "Component values"), ("field, electrons", "Overlays")],
        ),
        2 => (
            "Four interacting limiting factors on a leaf.",
            vec![("light, CO₂", "Inputs"), ("temperature, water", "Conditions")],
        ),
        3 => (
            "PV = nRT while heating, cooling or moving the piston.",
            vec![("process", "hold / heat / cool / ..."), ("T, P, V", "Starting state"), ("particles", "Molecules shown")],
        ),
        4 => (
            "Constant force plus gravity and drag, with bounces.",
            vec![("mass, force, angle", "Launch"), ("velocity", "Initial speed"), ("gravity, friction", "Environment")],
        ),
        5 => (
            "Rust advances once per second of simulated time.",
            vec![("metal", "iron / steel / Al / Cu"), ("environment", "normal / salty / acidic"), ("protection", "paint / galvanize / oil")],
        ),
        6 => (
            "Perimeter, Heron area and interior angles.",
            vec![("a, b, c", "Side lengths")],
        ),
        _ => (
            "Snell's law at a flat boundary, with dispersion.",
            vec![("medium, environment", "vacuum / air / water / glass / diamond"), ("angle", "Incidence from the normal"), ("wavelength, photons", "Light")],
        ),
    };
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {} {}", tile.icon, tile.name),
            Style::default().fg(tile.color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(format!("  {summary}"), Style::default().fg(Color::Rgb(100, 100, 120)))),
        Line::from(""),
    ];
    lines.extend(controls.into_iter().map(|(key, action)| key_line(key, action)));
    lines
}

pub fn render_home(frame: &mut Frame, area: Rect, selected_lab: usize) {
    let selected_lab = selected_lab.min(LAB_COUNT - 1);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(10), // Banner
            Constraint::Length(2),  // Subtitle
            Constraint::Length(12), // Lab tiles (2 rows)
            Constraint::Min(10),    // Controls area
            Constraint::Length(2),  // Footer
        ])
        .split(area);

    let banner = Paragraph::new(BANNER)
        .style(Style::default().fg(Color::Rgb(80, 200, 255)))
        .alignment(Alignment::Center);
    frame.render_widget(banner, chunks[0]);

    let subtitle = Paragraph::new(Line::from(Span::styled(
        "  ⚗ Your Terminal Science Lab ⚗  ",
        Style::default()
            .fg(Color::Rgb(255, 220, 80))
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(subtitle, chunks[1]);

    let labs_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
        .title(" 🔬 Labs - ↑↓←→ Select, Enter to Open ")
        .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD));
    let labs_inner = labs_block.inner(chunks[2]);
    frame.render_widget(labs_block, chunks[2]);

    // Two rows of four tiles
    let tile_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(labs_inner);
    let quarter = [Constraint::Ratio(1, 4); 4];
    let top_cols = Layout::default().direction(Direction::Horizontal).constraints(quarter).split(tile_rows[0]);
    let bot_cols = Layout::default().direction(Direction::Horizontal).constraints(quarter).split(tile_rows[1]);

    for (i, tile) in LAB_TILES.iter().enumerate() {
        let cell = if i < 4 { top_cols[i] } else { bot_cols[i - 4] };
        render_lab_tile(frame, cell, tile, selected_lab == i);
    }

    let ctrl_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[3]);

    let heading = |text: &'static str| {
        Line::from(Span::styled(text, Style::default().fg(Color::Rgb(255, 220, 80)).add_modifier(Modifier::BOLD)))
    };
    let controls = Paragraph::new(vec![
        Line::from(""),
        heading("  🔧 Navigation"),
        key_line("Tab / Shift+Tab", "Switch tabs"),
        key_line("1-8", "Open lab"),
        key_line("↑ ↓ ← →", "Select lab"),
        key_line("Enter", "Open selected"),
        key_line("Esc", "Return to Home"),
        key_line("q / Ctrl+C", "Quit"),
        Line::from(""),
        heading("  🧪 In a lab"),
        key_line("↑ ↓  ← →", "Pick / adjust control"),
        key_line("Space", "Run / Pause"),
        key_line("S / R", "Stop / Reset"),
        key_line("+ / -", "Speed 0.1x to 5x"),
        key_line("E", "Explain"),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
            .title(" ⌨ Navigation Control ")
            .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(controls, ctrl_cols[0]);

    let tile = &LAB_TILES[selected_lab];
    let notes = Paragraph::new(lab_notes(selected_lab)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(tile.border_color))
            .title(format!(" {} {} ", tile.icon, tile.name))
            .title_style(Style::default().fg(tile.color).add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(notes, ctrl_cols[1]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("  🦀 ", Style::default().fg(Color::Rgb(255, 100, 50))),
        Span::styled(concat!("v", env!("CARGO_PKG_VERSION")), Style::default().fg(Color::Rgb(80, 80, 100))),
        Span::styled("  │  ", Style::default().fg(Color::Rgb(40, 40, 60))),
        Span::styled("seeded, reproducible runs", Style::default().fg(Color::Rgb(100, 100, 130))),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(footer, chunks[4]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn every_lab_has_notes() {
        for idx in 0..LAB_COUNT {
            let lines = lab_notes(idx);
            assert!(lines.len() > 4, "lab {idx} has no controls listed");
        }
    }

    #[test]
    fn home_renders_on_a_small_terminal() {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|frame| render_home(frame, frame.area(), 99)).unwrap();
    }
}
