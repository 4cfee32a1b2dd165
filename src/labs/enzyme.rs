//! Catalase breaking down hydrogen peroxide, modelled with Michaelis-Menten
//! kinetics and a Q10 temperature response.

use rand::rngs::StdRng;
use rand::Rng;
use ratatui::style::Color;

use crate::engine::draw::{Bounds, Sketch};
use crate::engine::lab::{Lab, Readout};
use crate::engine::narrative::{efficiency, Narrator};
use crate::engine::numeric::{non_negative, safe_div};
use crate::engine::params::{ParamSpec, ParameterStore};
use crate::error::{LabError, Result};

pub const INHIBITORS: &[&str] = &["none", "competitive", "noncompetitive"];

const KM: f64 = 30.0;
const OPTIMAL_RATE: f64 = 5.0;
/// Chance that an enzyme touching its target substrate converts it.
const CONVERSION_CHANCE: f64 = 0.3;
const CONTACT_DISTANCE: f64 = 10.0;
const MAX_BUBBLES: usize = 300;

// Test tube interior in world units.
const TUBE_LEFT: f64 = 100.0;
const TUBE_RIGHT: f64 = 200.0;
const TUBE_BOTTOM: f64 = 20.0;
const TUBE_TOP: f64 = 170.0;
const LIQUID_TOP: f64 = 120.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inhibitor {
    None,
    Competitive,
    Noncompetitive,
}

impl Inhibitor {
    fn parse(tag: &str) -> Result<Self> {
        match tag {
            "none" => Ok(Inhibitor::None),
            "competitive" => Ok(Inhibitor::Competitive),
            "noncompetitive" => Ok(Inhibitor::Noncompetitive),
            other => Err(LabError::InvalidChoice { name: "inhibitor".into(), value: other.into() }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EnzymeParams {
    pub enzyme: f64,
    pub substrate: f64,
    pub temperature: f64,
    pub ph: f64,
    pub inhibitor: Inhibitor,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Kinetics {
    pub vmax: f64,
    pub km: f64,
    pub temp_effect: f64,
    pub ph_effect: f64,
    pub rate: f64,
}

#[derive(Clone, Debug)]
struct Particle {
    x: f64,
    y: f64,
    speed: f64,
    target: Option<usize>,
}

#[derive(Clone, Debug)]
struct Bubble {
    x: f64,
    y: f64,
    size: f64,
    speed: f64,
    opacity: f64,
}

#[derive(Debug, Default)]
pub struct EnzymeState {
    pub oxygen: f64,
    pub conversions: u64,
    enzymes: Vec<Particle>,
    substrates: Vec<Particle>,
    bubbles: Vec<Bubble>,
    bubble_debt: f64,
}

pub struct EnzymeLab;

impl EnzymeLab {
    fn spawn_enzyme(rng: &mut StdRng) -> Particle {
        Particle {
            x: rng.gen_range(110.0..150.0),
            y: rng.gen_range(30.0..110.0),
            speed: rng.gen_range(0.5..1.0),
            target: None,
        }
    }

    fn spawn_substrate(rng: &mut StdRng) -> Particle {
        Particle {
            x: rng.gen_range(150.0..190.0),
            y: rng.gen_range(30.0..110.0),
            speed: rng.gen_range(0.3..0.8),
            target: None,
        }
    }

    fn keep_inside(p: &mut Particle) {
        p.x = p.x.clamp(TUBE_LEFT + 3.0, TUBE_RIGHT - 3.0);
        p.y = p.y.clamp(TUBE_BOTTOM + 3.0, LIQUID_TOP - 3.0);
    }
}

impl Lab for EnzymeLab {
    type Params = EnzymeParams;
    type State = EnzymeState;
    type Derived = Kinetics;

    fn title(&self) -> &'static str {
        "Enzyme Activity"
    }

    fn world(&self) -> Bounds {
        Bounds::new(300.0, 190.0)
    }

    fn controls(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::number("enzyme", "Enzyme", "%", (10.0, 100.0, 1.0), 50.0),
            ParamSpec::number("substrate", "Substrate (H2O2)", "%", (10.0, 100.0, 1.0), 50.0),
            ParamSpec::number("temperature", "Temperature", "°C", (10.0, 60.0, 1.0), 37.0),
            ParamSpec::number("ph", "pH", "", (3.0, 11.0, 0.5), 7.0),
            ParamSpec::choice("inhibitor", "Inhibitor", INHIBITORS, "none"),
        ]
    }

    fn read(&self, store: &ParameterStore) -> Result<EnzymeParams> {
        Ok(EnzymeParams {
            enzyme: store.number("enzyme")?,
            substrate: store.number("substrate")?,
            temperature: store.number("temperature")?,
            ph: store.number("ph")?,
            inhibitor: Inhibitor::parse(store.choice("inhibitor")?)?,
        })
    }

    fn initial_state(&self, _params: &EnzymeParams, _rng: &mut StdRng) -> EnzymeState {
        EnzymeState::default()
    }

    fn evaluate(&self, p: &EnzymeParams, _elapsed: f64) -> Kinetics {
        let base_vmax = non_negative(p.enzyme) / 10.0;
        let km = if p.inhibitor == Inhibitor::Competitive { KM * 3.0 } else { KM };
        let vmax = if p.inhibitor == Inhibitor::Noncompetitive { base_vmax / 3.0 } else { base_vmax };
        let temp_effect = 2f64.powf((p.temperature - 37.0) / 10.0);
        let ph_effect = (-((p.ph - 7.0) / 2.0).powi(2)).exp();
        let substrate = non_negative(p.substrate);
        let rate = non_negative(safe_div(vmax * temp_effect * ph_effect * substrate, km + substrate));
        Kinetics { vmax, km, temp_effect, ph_effect, rate }
    }

    fn advance(&self, s: &mut EnzymeState, p: &EnzymeParams, k: &Kinetics, dt: f64, rng: &mut StdRng) {
        s.oxygen += k.rate * dt;

        if (s.enzymes.len() as f64) < p.enzyme / 5.0 {
            s.enzymes.push(Self::spawn_enzyme(rng));
        }
        if (s.substrates.len() as f64) < p.substrate / 5.0 {
            s.substrates.push(Self::spawn_substrate(rng));
        }

        // Bubble emission follows the kinetic rate, not the particle collisions.
        if k.rate > 0.1 {
            s.bubble_debt += k.rate * dt * 20.0;
            while s.bubble_debt >= 1.0 && s.bubbles.len() < MAX_BUBBLES {
                s.bubble_debt -= 1.0;
                s.bubbles.push(Bubble {
                    x: rng.gen_range(140.0..180.0),
                    y: TUBE_BOTTOM + 5.0,
                    size: rng.gen_range(1.5..3.5),
                    speed: 0.5 + rng.gen::<f64>() * k.rate,
                    opacity: rng.gen_range(0.3..0.8),
                });
            }
            s.bubble_debt = s.bubble_debt.min(1.0);
        }

        let mut consumed: Vec<usize> = Vec::new();
        for enzyme in s.enzymes.iter_mut() {
            if enzyme.target.map_or(true, |t| t >= s.substrates.len() || consumed.contains(&t)) {
                enzyme.target = s
                    .substrates
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !consumed.contains(i))
                    .min_by(|(_, a), (_, b)| {
                        let da = (a.x - enzyme.x).hypot(a.y - enzyme.y);
                        let db = (b.x - enzyme.x).hypot(b.y - enzyme.y);
                        da.total_cmp(&db)
                    })
                    .map(|(i, _)| i);
            }
            match enzyme.target {
                Some(t) => {
                    let dx = s.substrates[t].x - enzyme.x;
                    let dy = s.substrates[t].y - enzyme.y;
                    let distance = dx.hypot(dy);
                    if distance < CONTACT_DISTANCE && rng.gen::<f64>() < CONVERSION_CHANCE {
                        consumed.push(t);
                        enzyme.target = None;
                    } else if distance > 0.0 {
                        enzyme.x += dx / distance * enzyme.speed;
                        enzyme.y += dy / distance * enzyme.speed;
                    }
                }
                None => {
                    enzyme.x += (rng.gen::<f64>() - 0.5) * enzyme.speed;
                    enzyme.y += (rng.gen::<f64>() - 0.5) * enzyme.speed;
                }
            }
            Self::keep_inside(enzyme);
        }
        if !consumed.is_empty() {
            s.conversions += consumed.len() as u64;
            let mut idx = 0;
            s.substrates.retain(|_| {
                let keep = !consumed.contains(&idx);
                idx += 1;
                keep
            });
            // Indices shifted; every enzyme re-targets next tick.
            for enzyme in s.enzymes.iter_mut() {
                enzyme.target = None;
            }
        }

        for substrate in s.substrates.iter_mut() {
            substrate.x += (rng.gen::<f64>() - 0.5) * substrate.speed;
            substrate.y += (rng.gen::<f64>() - 0.5) * substrate.speed;
            Self::keep_inside(substrate);
        }

        for bubble in s.bubbles.iter_mut() {
            bubble.y += bubble.speed;
            bubble.opacity *= 0.99;
        }
        s.bubbles.retain(|b| b.y < TUBE_TOP + 10.0 && b.opacity > 0.1);
    }

    fn draw(&self, s: &EnzymeState, p: &EnzymeParams, k: &Kinetics, sketch: &mut Sketch) {
        sketch.clear(Color::Rgb(10, 10, 20));

        sketch.fill_rect(
            (TUBE_LEFT, TUBE_BOTTOM),
            TUBE_RIGHT - TUBE_LEFT,
            LIQUID_TOP - TUBE_BOTTOM,
            Color::Rgb(30, 50, 80),
        );
        sketch.polyline(
            vec![
                (TUBE_LEFT, TUBE_TOP),
                (TUBE_LEFT, TUBE_BOTTOM),
                (TUBE_RIGHT, TUBE_BOTTOM),
                (TUBE_RIGHT, TUBE_TOP),
            ],
            false,
            Color::Rgb(160, 160, 180),
        );

        let enzyme_color = if p.inhibitor == Inhibitor::None {
            Color::Rgb(74, 137, 220)
        } else {
            Color::Rgb(120, 110, 170)
        };
        for e in &s.enzymes {
            sketch.circle((e.x, e.y), 4.0, enzyme_color);
            // Active site
            sketch.arc((e.x, e.y), 2.4, 0.0, std::f64::consts::PI, Color::Rgb(255, 255, 255));
        }
        let substrate_coords = s.substrates.iter().map(|sub| (sub.x, sub.y)).collect();
        sketch.points(substrate_coords, Color::Rgb(233, 87, 63));

        for b in &s.bubbles {
            let shade = (100.0 + 155.0 * b.opacity) as u8;
            sketch.circle((b.x, b.y), b.size, Color::Rgb(shade / 2, shade, 255));
        }

        // Rate gauge beside the tube.
        let gauge = (k.rate / OPTIMAL_RATE).clamp(0.0, 1.0) * 120.0;
        sketch.rect((230.0, 30.0), 20.0, 120.0, Color::Rgb(60, 60, 80));
        sketch.fill_rect((231.0, 31.0), 18.0, gauge, Color::Rgb(80, 220, 120));
        sketch.text((222.0, 160.0), format!("{:.2}", k.rate), Color::Rgb(200, 200, 220));
        sketch.text((10.0, 178.0), format!("O2 {:.2} ml", s.oxygen), Color::Rgb(120, 200, 255));
    }

    fn describe(&self, p: &EnzymeParams, k: &Kinetics, _s: &EnzymeState, n: &mut Narrator) -> Vec<String> {
        let mut insights = Vec::new();
        if p.enzyme < 30.0 {
            insights.push(n.pick(&[
                "Low enzyme concentration is limiting the reaction rate. Try increasing enzyme amount.",
                "Too few catalase molecules: the reaction is enzyme-limited.",
            ]).to_string());
        }
        if p.substrate < 30.0 {
            insights.push(n.pick(&[
                "Low substrate concentration is limiting the reaction rate. Add more hydrogen peroxide.",
                "Active sites sit idle waiting for peroxide; raise the substrate level.",
            ]).to_string());
        } else if p.substrate > 70.0 && k.rate < OPTIMAL_RATE * 0.9 {
            insights.push("Enzyme saturation detected - most active sites are occupied.".to_string());
        }
        if p.temperature < 25.0 {
            insights.push(
                "Low temperature is slowing molecular motion and reducing enzyme-substrate collisions.".to_string(),
            );
        } else if p.temperature > 45.0 {
            insights.push("High temperature may be denaturing the catalase enzyme.".to_string());
        }
        if p.ph < 5.0 || p.ph > 9.0 {
            insights.push("Extreme pH is altering the enzyme's shape and reducing activity.".to_string());
        }
        match p.inhibitor {
            Inhibitor::Competitive => insights.push(
                "Competitive inhibitor detected - it's competing with substrate for active sites.".to_string(),
            ),
            Inhibitor::Noncompetitive => insights.push(
                "Noncompetitive inhibitor detected - it's altering the enzyme's shape.".to_string(),
            ),
            Inhibitor::None => {}
        }
        insights.push(format!(
            "Current reaction efficiency: {:.1}% of maximum potential.",
            efficiency(k.rate, OPTIMAL_RATE)
        ));
        insights
    }

    fn readouts(&self, _p: &EnzymeParams, k: &Kinetics, s: &EnzymeState) -> Vec<Readout> {
        vec![
            Readout::new("Rate", format!("{:.2}", k.rate)),
            Readout::new("Vmax", format!("{:.2}", k.vmax)),
            Readout::new("Km", format!("{:.0}", k.km)),
            Readout::new("O2", format!("{:.2} ml", s.oxygen)),
            Readout::new("Reactions", s.conversions.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn params() -> EnzymeParams {
        EnzymeParams {
            enzyme: 50.0,
            substrate: 50.0,
            temperature: 37.0,
            ph: 7.0,
            inhibitor: Inhibitor::None,
        }
    }

    #[test]
    fn michaelis_menten_reference_point() {
        let k = EnzymeLab.evaluate(&params(), 0.0);
        assert_relative_eq!(k.vmax, 5.0, epsilon = 1e-12);
        assert_relative_eq!(k.km, 30.0, epsilon = 1e-12);
        assert_relative_eq!(k.temp_effect, 1.0, epsilon = 1e-12);
        assert_relative_eq!(k.ph_effect, 1.0, epsilon = 1e-12);
        assert_relative_eq!(k.rate, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn inhibitors_reduce_the_rate() {
        let base = EnzymeLab.evaluate(&params(), 0.0).rate;
        let competitive = EnzymeLab.evaluate(&EnzymeParams { inhibitor: Inhibitor::Competitive, ..params() }, 0.0);
        let noncompetitive =
            EnzymeLab.evaluate(&EnzymeParams { inhibitor: Inhibitor::Noncompetitive, ..params() }, 0.0);
        assert_relative_eq!(competitive.km, 90.0, epsilon = 1e-12);
        assert_relative_eq!(noncompetitive.rate, base / 3.0, epsilon = 1e-12);
        assert!(competitive.rate < base);
    }

    #[test]
    fn rate_is_never_negative() {
        for enzyme in [-50.0, 0.0, 10.0, 100.0] {
            for substrate in [-100.0, -30.0, 0.0, 10.0, 100.0] {
                for temperature in [-40.0, 10.0, 60.0] {
                    for ph in [0.0, 3.0, 7.0, 14.0] {
                        for inhibitor in [Inhibitor::None, Inhibitor::Competitive, Inhibitor::Noncompetitive] {
                            let p = EnzymeParams { enzyme, substrate, temperature, ph, inhibitor };
                            let rate = EnzymeLab.evaluate(&p, 0.0).rate;
                            assert!(rate >= 0.0 && rate.is_finite(), "{p:?} gave {rate}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn evaluate_is_pure() {
        let p = EnzymeParams { temperature: 44.0, ph: 5.5, ..params() };
        let a = EnzymeLab.evaluate(&p, 3.0);
        let b = EnzymeLab.evaluate(&p, 3.0);
        assert_eq!(a.rate.to_bits(), b.rate.to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn oxygen_follows_kinetic_rate() {
        let p = params();
        let k = EnzymeLab.evaluate(&p, 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = EnzymeLab.initial_state(&p, &mut rng);
        for _ in 0..100 {
            EnzymeLab.advance(&mut s, &p, &k, 0.1, &mut rng);
        }
        assert_relative_eq!(s.oxygen, 25.0, epsilon = 1e-9);
        assert!(!s.enzymes.is_empty());
        assert!(s.enzymes.len() <= 10 && s.substrates.len() <= 10);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let p = params();
        let k = EnzymeLab.evaluate(&p, 0.0);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut s = EnzymeLab.initial_state(&p, &mut rng);
            for _ in 0..300 {
                EnzymeLab.advance(&mut s, &p, &k, 0.016, &mut rng);
            }
            (s.conversions, s.substrates.len(), s.bubbles.len())
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn narrative_flags_limiting_conditions() {
        let p = EnzymeParams { enzyme: 20.0, temperature: 50.0, inhibitor: Inhibitor::Competitive, ..params() };
        let k = EnzymeLab.evaluate(&p, 0.0);
        let mut n = Narrator::new(crate::engine::narrative::Phrasing::Fixed, 0);
        let lines = EnzymeLab.describe(&p, &k, &EnzymeState::default(), &mut n);
        assert!(lines[0].starts_with("Low enzyme concentration"));
        assert!(lines.iter().any(|l| l.contains("denaturing")));
        assert!(lines.iter().any(|l| l.starts_with("Competitive inhibitor")));
        assert!(lines.last().unwrap().starts_with("Current reaction efficiency"));
    }
}
