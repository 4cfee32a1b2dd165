//! Paints presented scenes with ratatui's braille canvas.

use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Points, Rectangle};
use ratatui::widgets::{Block, BorderType, Borders};

use crate::engine::draw::{sample_arc, sample_curve, DrawCommand, Point, Scene, Surface, Viewport};

const ARC_SEGMENTS: usize = 24;
const CURVE_SEGMENTS: usize = 16;
/// Horizontal lines per filled rectangle.
const FILL_ROWS: usize = 24;

/// Holds the most recent scene until the next render.
#[derive(Debug, Default)]
pub struct CanvasSurface {
    viewport: Option<Viewport>,
    scene: Option<Scene>,
}

impl CanvasSurface {
    /// Records the area the canvas was laid out in; ticks are skipped
    /// until this has happened at least once.
    pub fn mount(&mut self, area: Rect) {
        self.viewport = (area.width > 0 && area.height > 0)
            .then_some(Viewport { width: area.width, height: area.height });
    }

    pub fn unmount(&mut self) {
        self.viewport = None;
    }

    #[cfg(test)]
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, block: Block) {
        let inner = block.inner(area);
        self.mount(inner);
        let Some(scene) = self.scene.as_ref() else {
            frame.render_widget(block, area);
            return;
        };
        let background = scene
            .commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Clear(color) => Some(*color),
                _ => None,
            })
            .unwrap_or(Color::Reset);
        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .background_color(background)
            .x_bounds(scene.bounds.x)
            .y_bounds(scene.bounds.y)
            .paint(|ctx| paint(ctx, scene));
        frame.render_widget(canvas, area);
    }
}

impl Surface for CanvasSurface {
    fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn present(&mut self, scene: Scene) {
        self.scene = Some(scene);
    }
}

pub fn canvas_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
        .title(format!(" 🔬 {title} "))
        .title_style(Style::default().fg(Color::Rgb(80, 200, 255)).add_modifier(Modifier::BOLD))
}

fn segments(ctx: &mut Context, points: &[Point], color: Color) {
    for pair in points.windows(2) {
        ctx.draw(&CanvasLine { x1: pair[0].0, y1: pair[0].1, x2: pair[1].0, y2: pair[1].1, color });
    }
}

fn paint(ctx: &mut Context, scene: &Scene) {
    for command in &scene.commands {
        match command {
            DrawCommand::Clear(_) => {}
            DrawCommand::Line { from, to, color } => {
                ctx.draw(&CanvasLine { x1: from.0, y1: from.1, x2: to.0, y2: to.1, color: *color });
            }
            DrawCommand::Polyline { points, closed, color } => {
                segments(ctx, points, *color);
                if let (true, Some(first), Some(last)) = (*closed, points.first(), points.last()) {
                    segments(ctx, &[*last, *first], *color);
                }
            }
            DrawCommand::Circle { center, radius, color } => {
                ctx.draw(&Circle { x: center.0, y: center.1, radius: *radius, color: *color });
            }
            DrawCommand::Arc { center, radius, start, end, color } => {
                segments(ctx, &sample_arc(*center, *radius, *start, *end, ARC_SEGMENTS), *color);
            }
            DrawCommand::Curve { from, control, to, color } => {
                segments(ctx, &sample_curve(*from, *control, *to, CURVE_SEGMENTS), *color);
            }
            DrawCommand::Rect { origin, width, height, filled, color } => {
                if *filled {
                    for row in 0..=FILL_ROWS {
                        let y = origin.1 + height * row as f64 / FILL_ROWS as f64;
                        ctx.draw(&CanvasLine { x1: origin.0, y1: y, x2: origin.0 + width, y2: y, color: *color });
                    }
                } else {
                    ctx.draw(&Rectangle { x: origin.0, y: origin.1, width: *width, height: *height, color: *color });
                }
            }
            DrawCommand::Points { coords, color } => {
                ctx.draw(&Points { coords, color: *color });
            }
            DrawCommand::Text { at, text, color } => {
                ctx.print(at.0, at.1, Span::styled(text.clone(), Style::default().fg(*color)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::engine::draw::{Bounds, Sketch};

    #[test]
    fn viewport_follows_mounting() {
        let mut surface = CanvasSurface::default();
        assert_eq!(surface.viewport(), None);
        surface.mount(Rect::new(0, 0, 40, 10));
        assert_eq!(surface.viewport(), Some(Viewport { width: 40, height: 10 }));
        surface.mount(Rect::new(0, 0, 0, 10));
        assert_eq!(surface.viewport(), None);
    }

    #[test]
    fn paints_every_primitive_without_panicking() {
        let mut sketch = Sketch::new(Bounds::new(100.0, 50.0));
        sketch.clear(Color::Black);
        sketch.line((0.0, 0.0), (100.0, 50.0), Color::White);
        sketch.polyline(vec![(10.0, 10.0), (20.0, 30.0), (30.0, 10.0)], true, Color::Red);
        sketch.circle((50.0, 25.0), 10.0, Color::Green);
        sketch.arc((50.0, 25.0), 5.0, 0.0, std::f64::consts::PI, Color::Yellow);
        sketch.curve((0.0, 0.0), (50.0, 50.0), (100.0, 0.0), Color::Cyan);
        sketch.fill_rect((60.0, 5.0), 20.0, 10.0, Color::Blue);
        sketch.rect((60.0, 5.0), 20.0, 10.0, Color::White);
        sketch.points(vec![(1.0, 1.0), (2.0, 2.0)], Color::Magenta);
        sketch.text((5.0, 45.0), "hello", Color::White);

        let mut surface = CanvasSurface::default();
        surface.present(sketch.finish());
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        terminal
            .draw(|frame| surface.render(frame, frame.area(), canvas_block("Test")))
            .unwrap();
        assert_eq!(surface.viewport(), Some(Viewport { width: 38, height: 10 }));
    }
}
