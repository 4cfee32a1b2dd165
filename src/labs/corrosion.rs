//! Rusting of a metal sample, advanced once per second.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use ratatui::style::Color;

use crate::engine::draw::{Bounds, Point, Sketch};
use crate::engine::lab::{Lab, Readout};
use crate::engine::narrative::Narrator;
use crate::engine::numeric::non_negative;
use crate::engine::params::{ParamSpec, ParameterStore};
use crate::engine::scheduler::Cadence;
use crate::error::{LabError, Result};

pub const METALS: &[&str] = &["iron", "steel", "aluminum", "copper"];
pub const ENVIRONMENTS: &[&str] = &["normal", "salty", "acidic"];
pub const PROTECTIONS: &[&str] = &["none", "paint", "galvanize", "oil"];

pub const MAX_LEVEL: f64 = 100.0;
/// Level gained per simulated second at unit rate.
const LEVEL_PER_SECOND: f64 = 0.1;
const SPOTS: usize = 160;
const PLATE_ORIGIN: Point = (60.0, 40.0);
const PLATE_WIDTH: f64 = 180.0;
const PLATE_HEIGHT: f64 = 120.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metal {
    Iron,
    Steel,
    Aluminum,
    Copper,
}

impl Metal {
    fn parse(tag: &str) -> Result<Self> {
        match tag {
            "iron" => Ok(Metal::Iron),
            "steel" => Ok(Metal::Steel),
            "aluminum" => Ok(Metal::Aluminum),
            "copper" => Ok(Metal::Copper),
            other => Err(LabError::InvalidChoice { name: "metal".into(), value: other.into() }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metal::Iron => "Iron",
            Metal::Steel => "Steel",
            Metal::Aluminum => "Aluminum",
            Metal::Copper => "Copper",
        }
    }

    pub fn base_rate(self) -> f64 {
        match self {
            Metal::Iron => 1.0,
            Metal::Steel => 0.8,
            Metal::Aluminum => 0.2,
            Metal::Copper => 0.3,
        }
    }

    fn colors(self) -> (Color, Color) {
        match self {
            Metal::Iron => (Color::Rgb(183, 65, 14), Color::Rgb(139, 0, 0)),
            Metal::Steel => (Color::Rgb(113, 121, 126), Color::Rgb(101, 67, 33)),
            Metal::Aluminum => (Color::Rgb(169, 169, 169), Color::Rgb(230, 214, 144)),
            Metal::Copper => (Color::Rgb(184, 115, 51), Color::Rgb(51, 184, 124)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Normal,
    Salty,
    Acidic,
}

impl Environment {
    fn parse(tag: &str) -> Result<Self> {
        match tag {
            "normal" => Ok(Environment::Normal),
            "salty" => Ok(Environment::Salty),
            "acidic" => Ok(Environment::Acidic),
            other => Err(LabError::InvalidChoice { name: "environment".into(), value: other.into() }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Environment::Normal => "Normal Air",
            Environment::Salty => "Salt Water",
            Environment::Acidic => "Acid Rain",
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            Environment::Normal => 1.0,
            Environment::Salty => 3.0,
            Environment::Acidic => 2.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protection {
    None,
    Paint,
    Galvanize,
    Oil,
}

impl Protection {
    fn parse(tag: &str) -> Result<Self> {
        match tag {
            "none" => Ok(Protection::None),
            "paint" => Ok(Protection::Paint),
            "galvanize" => Ok(Protection::Galvanize),
            "oil" => Ok(Protection::Oil),
            other => Err(LabError::InvalidChoice { name: "protection".into(), value: other.into() }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Protection::None => "No Protection",
            Protection::Paint => "Painted",
            Protection::Galvanize => "Galvanized",
            Protection::Oil => "Oiled",
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            Protection::None => 1.0,
            Protection::Paint => 0.3,
            Protection::Galvanize => 0.1,
            Protection::Oil => 0.4,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SampleParams {
    pub metal: Metal,
    pub environment: Environment,
    pub protection: Protection,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrosionRate {
    /// Units per second.
    pub rate: f64,
}

#[derive(Debug, Default)]
pub struct SampleState {
    /// Percent, 0..=100.
    pub level: f64,
    pub seconds: f64,
    spots: Vec<Point>,
}

impl SampleState {
    pub fn clock_label(&self) -> String {
        let total = self.seconds.max(0.0) as u64;
        format!("{}:{:02}", total / 60, total % 60)
    }
}

pub struct CorrosionLab;

impl Lab for CorrosionLab {
    type Params = SampleParams;
    type State = SampleState;
    type Derived = CorrosionRate;

    fn title(&self) -> &'static str {
        "Rusting & Corrosion"
    }

    fn cadence(&self) -> Cadence {
        Cadence::Every(Duration::from_secs(1))
    }

    fn world(&self) -> Bounds {
        Bounds::new(300.0, 200.0)
    }

    fn controls(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::choice("metal", "Metal", METALS, "iron"),
            ParamSpec::choice("environment", "Environment", ENVIRONMENTS, "normal"),
            ParamSpec::choice("protection", "Protection", PROTECTIONS, "none"),
        ]
    }

    fn read(&self, store: &ParameterStore) -> Result<SampleParams> {
        Ok(SampleParams {
            metal: Metal::parse(store.choice("metal")?)?,
            environment: Environment::parse(store.choice("environment")?)?,
            protection: Protection::parse(store.choice("protection")?)?,
        })
    }

    fn initial_state(&self, _p: &SampleParams, rng: &mut StdRng) -> SampleState {
        let spots = (0..SPOTS)
            .map(|_| {
                (
                    PLATE_ORIGIN.0 + rng.gen_range(0.0..PLATE_WIDTH),
                    PLATE_ORIGIN.1 + rng.gen_range(0.0..PLATE_HEIGHT),
                )
            })
            .collect();
        SampleState { level: 0.0, seconds: 0.0, spots }
    }

    fn evaluate(&self, p: &SampleParams, _elapsed: f64) -> CorrosionRate {
        CorrosionRate { rate: p.metal.base_rate() * p.environment.factor() * p.protection.factor() }
    }

    fn advance(&self, s: &mut SampleState, _p: &SampleParams, d: &CorrosionRate, dt: f64, _rng: &mut StdRng) {
        s.seconds += dt;
        s.level = (s.level + non_negative(d.rate) * LEVEL_PER_SECOND * dt).min(MAX_LEVEL);
    }

    fn draw(&self, s: &SampleState, p: &SampleParams, _d: &CorrosionRate, sketch: &mut Sketch) {
        sketch.clear(Color::Rgb(14, 14, 18));
        let (base, rust) = p.metal.colors();
        sketch.fill_rect(PLATE_ORIGIN, PLATE_WIDTH, PLATE_HEIGHT, base);
        sketch.rect(PLATE_ORIGIN, PLATE_WIDTH, PLATE_HEIGHT, Color::Rgb(200, 200, 200));

        let visible = ((s.level / MAX_LEVEL) * s.spots.len() as f64).round() as usize;
        sketch.points(s.spots.iter().take(visible).copied().collect(), rust);

        match p.environment {
            Environment::Salty => {
                for i in 0..6 {
                    let x = 40.0 + i as f64 * 40.0;
                    sketch.curve((x, 20.0), (x + 10.0, 30.0), (x + 20.0, 20.0), Color::Rgb(60, 120, 220));
                }
            }
            Environment::Acidic => {
                for i in 0..8 {
                    let x = 50.0 + i as f64 * 28.0;
                    sketch.line((x, 195.0), (x - 6.0, 175.0), Color::Rgb(150, 220, 80));
                }
            }
            Environment::Normal => {}
        }
        if p.protection != Protection::None {
            let edge = (PLATE_ORIGIN.0 - 4.0, PLATE_ORIGIN.1 - 4.0);
            sketch.rect(edge, PLATE_WIDTH + 8.0, PLATE_HEIGHT + 8.0, Color::Rgb(120, 200, 255));
        }
        sketch.text(
            (PLATE_ORIGIN.0, 180.0),
            format!("{:.1}%  {}", s.level, s.clock_label()),
            Color::Rgb(230, 230, 230),
        );
    }

    fn describe(&self, p: &SampleParams, d: &CorrosionRate, s: &SampleState, n: &mut Narrator) -> Vec<String> {
        let mut lines = vec![format!(
            "The {} sample is exposed to {} conditions ({}).",
            p.metal.name(),
            p.environment.name().to_lowercase(),
            p.protection.name().to_lowercase()
        )];
        let stage = if s.level < 20.0 {
            n.pick(&["Currently showing minimal corrosion", "Only traces of corrosion so far"])
        } else if s.level < 50.0 {
            n.pick(&["Moderate corrosion is visible", "Corrosion is spreading across the surface"])
        } else {
            n.pick(&["Severe corrosion has occurred", "The surface is badly corroded"])
        };
        lines.push(format!("{} ({:.1}%).", stage, s.level));
        lines.push(format!("Corrosion rate is {:.2} units per second.", d.rate));
        lines.push(format!(
            "This rate is influenced by: {}'s natural corrosion resistance ({:.1}), {} environment (x{:.1}), and {} protection (x{:.1}).",
            p.metal.name(),
            p.metal.base_rate(),
            p.environment.name(),
            p.environment.factor(),
            p.protection.name(),
            p.protection.factor()
        ));
        if s.level > 30.0 {
            let advice = match p.protection {
                Protection::None => Some("painting, galvanizing, or applying protective oils."),
                Protection::Oil => Some("galvanizing or using more durable coatings."),
                Protection::Paint => Some("galvanizing for longer-term protection."),
                Protection::Galvanize => None,
            };
            if let Some(advice) = advice {
                lines.push(format!("To reduce corrosion, consider better protection methods like {advice}"));
            }
        }
        lines
    }

    fn readouts(&self, _p: &SampleParams, d: &CorrosionRate, s: &SampleState) -> Vec<Readout> {
        vec![
            Readout::new("Corrosion", format!("{:.1}%", s.level)),
            Readout::new("Rate", format!("{:.2}/s", d.rate)),
            Readout::new("Time", s.clock_label()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn params() -> SampleParams {
        SampleParams { metal: Metal::Iron, environment: Environment::Normal, protection: Protection::None }
    }

    #[test]
    fn rate_multiplies_the_three_factors() {
        let p = SampleParams { metal: Metal::Steel, environment: Environment::Salty, protection: Protection::Oil };
        assert_relative_eq!(CorrosionLab.evaluate(&p, 0.0).rate, 0.8 * 3.0 * 0.4, epsilon = 1e-12);
        let p = SampleParams { protection: Protection::Galvanize, ..params() };
        assert_relative_eq!(CorrosionLab.evaluate(&p, 0.0).rate, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn level_grows_per_second_and_caps() {
        let p = SampleParams { environment: Environment::Salty, ..params() };
        let d = CorrosionLab.evaluate(&p, 0.0);
        let mut rng = StdRng::seed_from_u64(4);
        let mut s = CorrosionLab.initial_state(&p, &mut rng);
        CorrosionLab.advance(&mut s, &p, &d, 1.0, &mut rng);
        assert_relative_eq!(s.level, 0.3, epsilon = 1e-12);
        for _ in 0..1000 {
            CorrosionLab.advance(&mut s, &p, &d, 1.0, &mut rng);
        }
        assert_eq!(s.level, MAX_LEVEL);
        assert_eq!(s.clock_label(), "16:41");
    }

    #[test]
    fn ticks_once_per_second() {
        assert_eq!(CorrosionLab.cadence(), Cadence::Every(Duration::from_secs(1)));
    }

    #[test]
    fn prevention_tips_depend_on_protection() {
        let mut n = Narrator::new(crate::engine::narrative::Phrasing::Fixed, 0);
        let heavy = SampleState { level: 40.0, ..SampleState::default() };

        let p = SampleParams { protection: Protection::Paint, ..params() };
        let lines = CorrosionLab.describe(&p, &CorrosionLab.evaluate(&p, 0.0), &heavy, &mut n);
        assert_eq!(lines[1], "Moderate corrosion is visible (40.0%).");
        assert!(lines.last().is_some_and(|l| l.ends_with("galvanizing for longer-term protection.")));

        let p = SampleParams { protection: Protection::Galvanize, ..params() };
        let lines = CorrosionLab.describe(&p, &CorrosionLab.evaluate(&p, 0.0), &heavy, &mut n);
        assert!(!lines.iter().any(|l| l.starts_with("To reduce corrosion")));
    }

    #[test]
    fn light_corrosion_gives_no_advice() {
        let mut n = Narrator::new(crate::engine::narrative::Phrasing::Fixed, 0);
        let p = params();
        let lines = CorrosionLab.describe(&p, &CorrosionLab.evaluate(&p, 0.0), &SampleState::default(), &mut n);
        assert_eq!(lines[0], "The Iron sample is exposed to normal air conditions (no protection).");
        assert_eq!(lines.len(), 4);
    }
}
