//! Immediate-mode draw primitives and the surface they are presented to.

use ratatui::style::Color;

pub type Point = (f64, f64);

/// World coordinates a lab draws in. The y axis points up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { x: [0.0, width], y: [0.0, height] }
    }
}

/// Size in terminal cells of the area a surface was last laid out in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Line { from: Point, to: Point, color: Color },
    Polyline { points: Vec<Point>, closed: bool, color: Color },
    Circle { center: Point, radius: f64, color: Color },
    Arc { center: Point, radius: f64, start: f64, end: f64, color: Color },
    Curve { from: Point, control: Point, to: Point, color: Color },
    Rect { origin: Point, width: f64, height: f64, filled: bool, color: Color },
    Points { coords: Vec<Point>, color: Color },
    Text { at: Point, text: String, color: Color },
}

/// One tick's worth of draw commands.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub bounds: Bounds,
    pub commands: Vec<DrawCommand>,
}

pub trait Surface {
    /// `None` until the host has laid the surface out.
    fn viewport(&self) -> Option<Viewport>;
    fn present(&mut self, scene: Scene);
}

fn finite(p: Point) -> bool {
    p.0.is_finite() && p.1.is_finite()
}

/// Scene builder handed to a lab's draw routine.
///
/// Primitives with non-finite coordinates are dropped here rather than
/// reaching the surface.
pub struct Sketch {
    bounds: Bounds,
    commands: Vec<DrawCommand>,
}

impl Sketch {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds, commands: Vec::new() }
    }

    pub fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    pub fn line(&mut self, from: Point, to: Point, color: Color) {
        if finite(from) && finite(to) {
            self.commands.push(DrawCommand::Line { from, to, color });
        }
    }

    pub fn polyline(&mut self, points: Vec<Point>, closed: bool, color: Color) {
        if points.len() > 1 && points.iter().all(|p| finite(*p)) {
            self.commands.push(DrawCommand::Polyline { points, closed, color });
        }
    }

    pub fn circle(&mut self, center: Point, radius: f64, color: Color) {
        if finite(center) && radius.is_finite() && radius > 0.0 {
            self.commands.push(DrawCommand::Circle { center, radius, color });
        }
    }

    pub fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64, color: Color) {
        if finite(center) && radius.is_finite() && start.is_finite() && end.is_finite() {
            self.commands.push(DrawCommand::Arc { center, radius, start, end, color });
        }
    }

    pub fn curve(&mut self, from: Point, control: Point, to: Point, color: Color) {
        if finite(from) && finite(control) && finite(to) {
            self.commands.push(DrawCommand::Curve { from, control, to, color });
        }
    }

    pub fn rect(&mut self, origin: Point, width: f64, height: f64, color: Color) {
        self.push_rect(origin, width, height, false, color);
    }

    pub fn fill_rect(&mut self, origin: Point, width: f64, height: f64, color: Color) {
        self.push_rect(origin, width, height, true, color);
    }

    fn push_rect(&mut self, origin: Point, width: f64, height: f64, filled: bool, color: Color) {
        if finite(origin) && width.is_finite() && height.is_finite() {
            self.commands.push(DrawCommand::Rect { origin, width, height, filled, color });
        }
    }

    pub fn points(&mut self, coords: Vec<Point>, color: Color) {
        let coords: Vec<Point> = coords.into_iter().filter(|p| finite(*p)).collect();
        if !coords.is_empty() {
            self.commands.push(DrawCommand::Points { coords, color });
        }
    }

    pub fn text(&mut self, at: Point, text: impl Into<String>, color: Color) {
        if finite(at) {
            self.commands.push(DrawCommand::Text { at, text: text.into(), color });
        }
    }

    pub fn finish(self) -> Scene {
        Scene { bounds: self.bounds, commands: self.commands }
    }
}

/// Samples an arc into line-segment endpoints. Angles are radians.
pub fn sample_arc(center: Point, radius: f64, start: f64, end: f64, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let t = start + (end - start) * i as f64 / segments as f64;
            (center.0 + radius * t.cos(), center.1 + radius * t.sin())
        })
        .collect()
}

/// Samples a quadratic bezier into line-segment endpoints.
pub fn sample_curve(from: Point, control: Point, to: Point, segments: usize) -> Vec<Point> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            let u = 1.0 - t;
            (
                u * u * from.0 + 2.0 * u * t * control.0 + t * t * to.0,
                u * u * from.1 + 2.0 * u * t * control.1 + t * t * to.1,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sketch_drops_non_finite_primitives() {
        let mut sketch = Sketch::new(Bounds::new(100.0, 50.0));
        sketch.line((0.0, 0.0), (f64::NAN, 1.0), Color::White);
        sketch.circle((10.0, 10.0), f64::INFINITY, Color::White);
        sketch.points(vec![(1.0, 1.0), (f64::NAN, 2.0)], Color::White);
        sketch.text((5.0, 5.0), "ok", Color::White);
        let scene = sketch.finish();
        assert_eq!(scene.commands.len(), 2);
        assert_eq!(
            scene.commands[0],
            DrawCommand::Points { coords: vec![(1.0, 1.0)], color: Color::White }
        );
    }

    #[test]
    fn arc_samples_hit_both_ends() {
        let pts = sample_arc((0.0, 0.0), 2.0, 0.0, std::f64::consts::PI, 8);
        assert_eq!(pts.len(), 9);
        assert_relative_eq!(pts[0].0, 2.0, epsilon = 1e-12);
        assert_relative_eq!(pts[8].0, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn curve_samples_start_and_end_on_anchors() {
        let pts = sample_curve((0.0, 0.0), (5.0, 10.0), (10.0, 0.0), 4);
        assert_eq!(pts.first(), Some(&(0.0, 0.0)));
        assert_eq!(pts.last(), Some(&(10.0, 0.0)));
        assert_relative_eq!(pts[2].1, 5.0, epsilon = 1e-12);
    }
}
