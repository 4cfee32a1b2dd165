//! Triangle measurements from three side lengths.

use rand::rngs::StdRng;
use ratatui::style::Color;

use crate::engine::draw::{Bounds, Point, Sketch};
use crate::engine::lab::{Lab, Readout};
use crate::engine::narrative::Narrator;
use crate::engine::numeric::{heron_area, safe_div};
use crate::engine::params::{ParamSpec, ParameterStore};
use crate::error::Result;

const WORLD: f64 = 200.0;
const MARGIN: f64 = 20.0;

#[derive(Clone, Debug)]
pub struct Sides {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleMetrics {
    pub perimeter: f64,
    pub semi_perimeter: f64,
    /// `None` when the sides cannot close into a triangle.
    pub area: Option<f64>,
    /// Interior angles in degrees, opposite a, b and c.
    pub angles: Option<[f64; 3]>,
    pub problem: Option<String>,
}

impl TriangleMetrics {
    pub fn kind(&self, sides: &Sides) -> Option<&'static str> {
        let angles = self.angles?;
        let equal = |x: f64, y: f64| (x - y).abs() < 1e-9;
        let by_sides = if equal(sides.a, sides.b) && equal(sides.b, sides.c) {
            "equilateral"
        } else if equal(sides.a, sides.b) || equal(sides.b, sides.c) || equal(sides.a, sides.c) {
            "isosceles"
        } else {
            "scalene"
        };
        let widest = angles.iter().copied().fold(0.0, f64::max);
        let by_angles = if (widest - 90.0).abs() < 1e-6 {
            "right"
        } else if widest > 90.0 {
            "obtuse"
        } else {
            "acute"
        };
        // Only one label is returned; right angles win over side symmetry.
        Some(if by_angles == "right" { "right" } else if by_sides == "scalene" { by_angles } else { by_sides })
    }
}

/// Angle opposite `opposite`, by the law of cosines.
fn angle_opposite(opposite: f64, x: f64, y: f64) -> f64 {
    let cosine = safe_div(x * x + y * y - opposite * opposite, 2.0 * x * y).clamp(-1.0, 1.0);
    cosine.acos().to_degrees()
}

pub struct GeometryLab;

impl GeometryLab {
    /// Vertex positions scaled into the world, with side c on the baseline.
    fn vertices(sides: &Sides, angles: [f64; 3]) -> [Point; 3] {
        let alpha = angles[0].to_radians();
        let raw = [(0.0, 0.0), (sides.c, 0.0), (sides.b * alpha.cos(), sides.b * alpha.sin())];
        let min_x = raw.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = raw.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let max_y = raw.iter().map(|p| p.1).fold(0.0, f64::max);
        let span = (max_x - min_x).max(max_y);
        let scale = safe_div(WORLD - 2.0 * MARGIN, span);
        raw.map(|(x, y)| (MARGIN + (x - min_x) * scale, MARGIN + y * scale))
    }
}

impl Lab for GeometryLab {
    type Params = Sides;
    type State = ();
    type Derived = TriangleMetrics;

    fn title(&self) -> &'static str {
        "Triangle Geometry"
    }

    fn world(&self) -> Bounds {
        Bounds::new(WORLD, WORLD)
    }

    fn controls(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::number("a", "Side a", "", (0.5, 20.0, 0.5), 3.0),
            ParamSpec::number("b", "Side b", "", (0.5, 20.0, 0.5), 4.0),
            ParamSpec::number("c", "Side c", "", (0.5, 20.0, 0.5), 5.0),
        ]
    }

    fn read(&self, store: &ParameterStore) -> Result<Sides> {
        Ok(Sides { a: store.number("a")?, b: store.number("b")?, c: store.number("c")? })
    }

    fn initial_state(&self, _p: &Sides, _rng: &mut StdRng) {}

    fn evaluate(&self, p: &Sides, _elapsed: f64) -> TriangleMetrics {
        let perimeter = p.a + p.b + p.c;
        let semi_perimeter = perimeter / 2.0;
        match heron_area(p.a, p.b, p.c) {
            Ok(area) => TriangleMetrics {
                perimeter,
                semi_perimeter,
                area: Some(area),
                angles: Some([
                    angle_opposite(p.a, p.b, p.c),
                    angle_opposite(p.b, p.a, p.c),
                    angle_opposite(p.c, p.a, p.b),
                ]),
                problem: None,
            },
            Err(e) => TriangleMetrics {
                perimeter,
                semi_perimeter,
                area: None,
                angles: None,
                problem: Some(e.to_string()),
            },
        }
    }

    fn advance(&self, _s: &mut (), _p: &Sides, _d: &TriangleMetrics, _dt: f64, _rng: &mut StdRng) {}

    fn draw(&self, _s: &(), p: &Sides, d: &TriangleMetrics, sketch: &mut Sketch) {
        sketch.clear(Color::Rgb(16, 16, 24));
        let Some(angles) = d.angles else {
            // Show the three sticks that fail to meet.
            let unit = safe_div(WORLD - 2.0 * MARGIN, p.a.max(p.b).max(p.c));
            for (i, side) in [p.a, p.b, p.c].iter().enumerate() {
                let y = 60.0 + i as f64 * 40.0;
                sketch.line((MARGIN, y), (MARGIN + side * unit, y), Color::Rgb(233, 87, 63));
            }
            sketch.text((MARGIN, 180.0), "not a triangle", Color::Rgb(233, 87, 63));
            return;
        };
        let [va, vb, vc] = Self::vertices(p, angles);
        sketch.polyline(vec![va, vb, vc], true, Color::Rgb(74, 137, 220));
        for (vertex, label) in [(va, "A"), (vb, "B"), (vc, "C")] {
            sketch.circle(vertex, 2.0, Color::Rgb(255, 255, 255));
            sketch.text((vertex.0 + 3.0, vertex.1 + 3.0), label, Color::Rgb(255, 255, 255));
        }
        // Interior angle at A, swept from the baseline.
        sketch.arc(va, 12.0, 0.0, angles[0].to_radians(), Color::Rgb(255, 200, 60));
        if let Some(area) = d.area {
            sketch.text((MARGIN, 190.0), format!("area {area:.4}"), Color::Rgb(120, 220, 120));
        }
    }

    fn describe(&self, p: &Sides, d: &TriangleMetrics, _s: &(), n: &mut Narrator) -> Vec<String> {
        let mut lines = vec![
            format!("Triangle with sides a={}, b={}, c={}", p.a, p.b, p.c),
            format!("Perimeter = a + b + c = {}", d.perimeter),
            format!("Semi-perimeter s = Perimeter/2 = {}", d.semi_perimeter),
        ];
        match (d.area, &d.problem) {
            (Some(area), _) => {
                lines.push(format!(
                    "{} Area = √[s(s-a)(s-b)(s-c)] = {:.4}",
                    n.pick(&["By Heron's formula,", "Heron's formula gives"]),
                    area
                ));
                if let Some(kind) = d.kind(p) {
                    let article = if kind.starts_with(['a', 'e', 'i', 'o']) { "an" } else { "a" };
                    lines.push(format!("This is {article} {kind} triangle."));
                }
            }
            (None, Some(problem)) => {
                lines.push(format!("Invalid triangle sides: {problem}."));
                lines.push("Each side must be shorter than the other two combined.".into());
            }
            (None, None) => {}
        }
        lines
    }

    fn readouts(&self, _p: &Sides, d: &TriangleMetrics, _s: &()) -> Vec<Readout> {
        let mut out = vec![Readout::new("Perimeter", format!("{:.2}", d.perimeter))];
        match (d.area, d.angles) {
            (Some(area), Some([a, b, c])) => {
                out.push(Readout::new("Area", format!("{area:.4}")));
                out.push(Readout::new("Angles", format!("{a:.1}° {b:.1}° {c:.1}°")));
            }
            _ => out.push(Readout::new("Area", "invalid")),
        }
        out
    }
}
