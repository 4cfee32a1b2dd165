//! An ideal gas in a piston, driven through heating, cooling and volume
//! changes.

use rand::rngs::StdRng;
use rand::Rng;
use ratatui::style::Color;

use crate::engine::draw::{Bounds, Sketch};
use crate::engine::lab::{Lab, Readout};
use crate::engine::narrative::Narrator;
use crate::engine::numeric::{non_negative, safe_div, sqrt_floor};
use crate::engine::params::{ParamSpec, ParameterStore};
use crate::error::{LabError, Result};

/// J/(mol·K)
pub const GAS_CONSTANT: f64 = 8.314;
pub const PROCESSES: &[&str] = &["hold", "heat", "cool", "compress", "expand"];

const MIN_TEMPERATURE: f64 = 100.0;
const MIN_VOLUME: f64 = 0.2;
const MAX_VOLUME: f64 = 2.0;
/// Per-frame increments are quoted for a 60 Hz refresh.
const FRAMES_PER_SECOND: f64 = 60.0;
const BOX_LEFT: f64 = 50.0;
const BOX_BOTTOM: f64 = 40.0;
const BOX_HEIGHT: f64 = 200.0;
const BOX_MAX_WIDTH: f64 = 300.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Process {
    Hold,
    Heat,
    Cool,
    Compress,
    Expand,
}

impl Process {
    fn parse(tag: &str) -> Result<Self> {
        match tag {
            "hold" => Ok(Process::Hold),
            "heat" => Ok(Process::Heat),
            "cool" => Ok(Process::Cool),
            "compress" => Ok(Process::Compress),
            "expand" => Ok(Process::Expand),
            other => Err(LabError::InvalidChoice { name: "process".into(), value: other.into() }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GasParams {
    /// K
    pub temperature: f64,
    /// kPa
    pub pressure: f64,
    /// m³
    pub volume: f64,
    pub particles: f64,
    pub process: Process,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GasProperties {
    pub moles: f64,
    pub internal_energy: f64,
    pub heat_capacity: f64,
    /// Relative particle speed, 1.0 at 300 K.
    pub thermal_speed: f64,
}

impl GasProperties {
    fn of(pressure: f64, volume: f64, temperature: f64) -> Self {
        let moles = non_negative(safe_div(pressure * volume, GAS_CONSTANT * temperature));
        GasProperties {
            moles,
            internal_energy: 1.5 * moles * GAS_CONSTANT * non_negative(temperature),
            heat_capacity: 1.5 * moles * GAS_CONSTANT,
            thermal_speed: safe_div(sqrt_floor(temperature), sqrt_floor(300.0)),
        }
    }
}

#[derive(Clone, Debug)]
struct Molecule {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

/// The gas as it evolves under the chosen process. `moles` holds steady
/// while a process runs; pressure follows from PV = nRT.
#[derive(Debug, Default)]
pub struct GasState {
    pub temperature: f64,
    pub volume: f64,
    pub pressure: f64,
    pub moles: f64,
    pub heat_added: f64,
    pub work_done: f64,
    /// Control values last written into the gas: T, P, V.
    applied: [f64; 3],
    molecules: Vec<Molecule>,
}

impl GasState {
    pub fn properties(&self) -> GasProperties {
        GasProperties::of(self.pressure, self.volume, self.temperature)
    }

    fn box_width(&self) -> f64 {
        BOX_MAX_WIDTH * (self.volume / MAX_VOLUME).clamp(0.05, 1.0)
    }
}

pub struct ThermodynamicsLab;

impl Lab for ThermodynamicsLab {
    type Params = GasParams;
    type State = GasState;
    type Derived = GasProperties;

    fn title(&self) -> &'static str {
        "Thermodynamics"
    }

    fn world(&self) -> Bounds {
        Bounds::new(420.0, 280.0)
    }

    fn controls(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::choice("process", "Process", PROCESSES, "hold"),
            ParamSpec::number("temperature", "Temperature", "K", (100.0, 600.0, 10.0), 300.0),
            ParamSpec::number("pressure", "Pressure", "kPa", (50.0, 200.0, 0.1), 101.3),
            ParamSpec::number("volume", "Volume", "m³", (0.2, 2.0, 0.1), 1.0),
            ParamSpec::number("particles", "Particles", "", (10.0, 200.0, 10.0), 100.0),
        ]
    }

    fn read(&self, store: &ParameterStore) -> Result<GasParams> {
        Ok(GasParams {
            temperature: store.number("temperature")?,
            pressure: store.number("pressure")?,
            volume: store.number("volume")?,
            particles: store.number("particles")?,
            process: Process::parse(store.choice("process")?)?,
        })
    }

    fn initial_state(&self, p: &GasParams, rng: &mut StdRng) -> GasState {
        let props = GasProperties::of(p.pressure, p.volume, p.temperature);
        let mut state = GasState {
            temperature: p.temperature,
            volume: p.volume,
            pressure: p.pressure,
            moles: props.moles,
            heat_added: 0.0,
            work_done: 0.0,
            applied: [p.temperature, p.pressure, p.volume],
            molecules: Vec::new(),
        };
        let width = state.box_width();
        let count = non_negative(p.particles).round() as usize;
        state.molecules = (0..count)
            .map(|_| {
                let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                let speed = rng.gen_range(40.0..80.0);
                Molecule {
                    x: BOX_LEFT + rng.gen_range(0.0..1.0) * width,
                    y: BOX_BOTTOM + rng.gen_range(0.0..1.0) * BOX_HEIGHT,
                    vx: angle.cos() * speed,
                    vy: angle.sin() * speed,
                }
            })
            .collect();
        state
    }

    /// A moved slider overrides the live value it names; the amount of gas
    /// is then recounted from the live state.
    fn apply_controls(&self, s: &mut GasState, p: &GasParams) {
        let [t, pr, v] = s.applied;
        if p.temperature == t && p.pressure == pr && p.volume == v {
            return;
        }
        if p.temperature != t {
            s.temperature = p.temperature;
        }
        if p.pressure != pr {
            s.pressure = p.pressure;
        }
        if p.volume != v {
            s.volume = p.volume;
        }
        s.applied = [p.temperature, p.pressure, p.volume];
        s.moles = GasProperties::of(s.pressure, s.volume, s.temperature).moles;
    }

    fn evaluate(&self, p: &GasParams, _elapsed: f64) -> GasProperties {
        GasProperties::of(p.pressure, p.volume, p.temperature)
    }

    fn advance(&self, s: &mut GasState, p: &GasParams, _d: &GasProperties, dt: f64, _rng: &mut StdRng) {
        let frames = dt * FRAMES_PER_SECOND;
        let heat_capacity = 1.5 * s.moles * GAS_CONSTANT;
        match p.process {
            Process::Hold => {}
            Process::Heat => {
                s.temperature += 0.5 * frames;
                s.heat_added += heat_capacity * 0.5 * frames;
            }
            Process::Cool => {
                let before = s.temperature;
                s.temperature = (s.temperature - 0.5 * frames).max(MIN_TEMPERATURE);
                s.heat_added -= heat_capacity * (before - s.temperature);
            }
            Process::Compress => {
                if s.volume > MIN_VOLUME {
                    s.volume = (s.volume - 0.01 * frames).max(MIN_VOLUME);
                    s.work_done += s.pressure * 0.01 * frames;
                }
            }
            Process::Expand => {
                if s.volume < MAX_VOLUME {
                    s.volume = (s.volume + 0.01 * frames).min(MAX_VOLUME);
                    s.work_done -= s.pressure * 0.01 * frames;
                }
            }
        }
        s.pressure = safe_div(s.moles * GAS_CONSTANT * s.temperature, s.volume);

        let speed = safe_div(sqrt_floor(s.temperature), sqrt_floor(300.0));
        let right = BOX_LEFT + s.box_width();
        let top = BOX_BOTTOM + BOX_HEIGHT;
        for m in s.molecules.iter_mut() {
            m.x += m.vx * speed * dt;
            m.y += m.vy * speed * dt;
            if m.x < BOX_LEFT || m.x > right {
                m.vx = -m.vx;
                m.x = m.x.clamp(BOX_LEFT, right);
            }
            if m.y < BOX_BOTTOM || m.y > top {
                m.vy = -m.vy;
                m.y = m.y.clamp(BOX_BOTTOM, top);
            }
        }
    }

    fn draw(&self, s: &GasState, p: &GasParams, _d: &GasProperties, sketch: &mut Sketch) {
        sketch.clear(Color::Rgb(12, 12, 20));
        let width = s.box_width();
        let piston = BOX_LEFT + width;
        sketch.polyline(
            vec![
                (piston, BOX_BOTTOM),
                (BOX_LEFT, BOX_BOTTOM),
                (BOX_LEFT, BOX_BOTTOM + BOX_HEIGHT),
                (piston, BOX_BOTTOM + BOX_HEIGHT),
            ],
            false,
            Color::Rgb(150, 150, 170),
        );
        sketch.fill_rect((piston, BOX_BOTTOM), 8.0, BOX_HEIGHT, Color::Rgb(110, 110, 130));
        sketch.line((piston + 8.0, BOX_BOTTOM + BOX_HEIGHT / 2.0), (400.0, BOX_BOTTOM + BOX_HEIGHT / 2.0), Color::Rgb(110, 110, 130));

        // Blue when cold, red when hot.
        let heat = ((s.temperature - MIN_TEMPERATURE) / 500.0).clamp(0.0, 1.0);
        let gas = Color::Rgb((60.0 + 195.0 * heat) as u8, 90, (255.0 - 195.0 * heat) as u8);
        let coords = s.molecules.iter().map(|m| (m.x, m.y)).collect();
        sketch.points(coords, gas);

        match p.process {
            Process::Heat => {
                for i in 0..5 {
                    let x = BOX_LEFT + 20.0 + i as f64 * 40.0;
                    sketch.curve((x, 10.0), (x + 10.0, 25.0), (x, 35.0), Color::Rgb(255, 120, 40));
                }
            }
            Process::Cool => {
                sketch.text((BOX_LEFT, 20.0), "* * * * *", Color::Rgb(150, 200, 255));
            }
            _ => {}
        }

        sketch.text(
            (BOX_LEFT, 265.0),
            format!("T {:.0} K  V {:.2} m³  P {:.1} kPa", s.temperature, s.volume, s.pressure),
            Color::Rgb(220, 220, 220),
        );
    }

    fn describe(&self, p: &GasParams, d: &GasProperties, s: &GasState, n: &mut Narrator) -> Vec<String> {
        let now = s.properties();
        let mut lines = vec![format!(
            "{} n = PV/RT = {:.4} mol; internal energy U = {:.1} J.",
            n.pick(&["Ideal gas law:", "From PV = nRT,", "Counting the gas:"]),
            now.moles,
            now.internal_energy
        )];
        if (now.internal_energy - d.internal_energy).abs() > 0.5 {
            lines.push(format!(
                "Starting from the set point ({:.1} J), the gas has {} {:.1} J of internal energy.",
                d.internal_energy,
                if now.internal_energy > d.internal_energy { "gained" } else { "lost" },
                (now.internal_energy - d.internal_energy).abs()
            ));
        }
        match p.process {
            Process::Heat => lines.push(format!(
                "Heating at fixed volume: {:.1} J added raises both temperature and pressure.",
                s.heat_added
            )),
            Process::Cool => lines.push("Cooling removes energy; molecules slow and pressure falls.".into()),
            Process::Compress => lines.push(format!(
                "Compression: {:.1} J of work done on the gas pushes pressure up.",
                s.work_done
            )),
            Process::Expand => lines.push("Expansion: the gas does work on the piston and pressure drops.".into()),
            Process::Hold => {}
        }
        if s.temperature >= 500.0 {
            lines.push("Molecules are moving fast: average kinetic energy grows with temperature.".into());
        } else if s.temperature <= 150.0 {
            lines.push("Near the cold limit, molecular motion is sluggish.".into());
        }
        if s.volume <= MIN_VOLUME + 1e-9 {
            lines.push("The piston has reached its minimum volume.".into());
        }
        lines
    }

    fn readouts(&self, _p: &GasParams, d: &GasProperties, s: &GasState) -> Vec<Readout> {
        let props = s.properties();
        vec![
            Readout::new("T", format!("{:.0} K", s.temperature)),
            Readout::new("P", format!("{:.1} kPa", s.pressure)),
            Readout::new("V", format!("{:.2} m³", s.volume)),
            Readout::new("n", format!("{:.4} mol", props.moles)),
            Readout::new("U", format!("{:.1} J", props.internal_energy)),
            Readout::new("ΔU", format!("{:+.1} J", props.internal_energy - d.internal_energy)),
            Readout::new("Q", format!("{:.1} J", s.heat_added)),
            Readout::new("W", format!("{:.1} J", s.work_done)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use approx::assert_relative_eq;
    use rand::SeedableRng;

    use crate::engine::params::Value;
    use crate::engine::simulation::tests::{frames, RecordingSurface};
    use crate::engine::simulation::{SimOptions, Simulation};

    fn params() -> GasParams {
        GasParams { temperature: 300.0, pressure: 101.3, volume: 1.0, particles: 100.0, process: Process::Hold }
    }

    #[test]
    fn ideal_gas_reference_point() {
        let d = ThermodynamicsLab.evaluate(&params(), 0.0);
        assert_relative_eq!(d.moles, 0.04063, epsilon = 1e-5);
        assert_relative_eq!(d.internal_energy, 1.5 * 101.3, epsilon = 1e-9);
        assert_relative_eq!(d.thermal_speed, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_temperature_is_guarded() {
        let d = ThermodynamicsLab.evaluate(&GasParams { temperature: 0.0, ..params() }, 0.0);
        assert_eq!(d.moles, 0.0);
        assert!(d.internal_energy.is_finite());
    }

    #[test]
    fn heating_raises_pressure_at_fixed_volume() {
        let p = GasParams { process: Process::Heat, ..params() };
        let mut rng = StdRng::seed_from_u64(9);
        let mut s = ThermodynamicsLab.initial_state(&p, &mut rng);
        let d = ThermodynamicsLab.evaluate(&p, 0.0);
        for _ in 0..60 {
            ThermodynamicsLab.advance(&mut s, &p, &d, 1.0 / 60.0, &mut rng);
        }
        assert_relative_eq!(s.temperature, 330.0, epsilon = 1e-9);
        assert_relative_eq!(s.pressure, 101.3 * 330.0 / 300.0, epsilon = 1e-9);
        assert_relative_eq!(s.heat_added, 1.5 * s.moles * GAS_CONSTANT * 30.0, epsilon = 1e-9);
    }

    #[test]
    fn cooling_and_compression_respect_limits() {
        let mut rng = StdRng::seed_from_u64(9);
        let cool = GasParams { process: Process::Cool, temperature: 110.0, ..params() };
        let mut s = ThermodynamicsLab.initial_state(&cool, &mut rng);
        let d = ThermodynamicsLab.evaluate(&cool, 0.0);
        for _ in 0..600 {
            ThermodynamicsLab.advance(&mut s, &cool, &d, 1.0 / 60.0, &mut rng);
        }
        assert_eq!(s.temperature, MIN_TEMPERATURE);

        let squeeze = GasParams { process: Process::Compress, ..params() };
        let mut s = ThermodynamicsLab.initial_state(&squeeze, &mut rng);
        for _ in 0..600 {
            ThermodynamicsLab.advance(&mut s, &squeeze, &d, 1.0 / 60.0, &mut rng);
        }
        assert_eq!(s.volume, MIN_VOLUME);
        assert_relative_eq!(s.pressure, 101.3 * 1.0 / MIN_VOLUME, epsilon = 1e-6);
        assert!(s.work_done > 0.0);
    }

    #[test]
    fn sliders_drive_the_live_gas_while_running_and_paused() {
        let mut sim = Simulation::new(ThermodynamicsLab, SimOptions::default()).unwrap();
        let mut surface = RecordingSurface::mounted();
        let t0 = Instant::now();
        sim.start(t0);
        let now = frames(&mut sim, &mut surface, t0, 3);

        sim.set("temperature", Value::Number(600.0)).unwrap();
        let now = frames(&mut sim, &mut surface, now, 3);
        assert_eq!(sim.state().temperature, 600.0);
        assert_relative_eq!(sim.state().moles, 101.3 / (GAS_CONSTANT * 600.0), epsilon = 1e-12);
        assert_relative_eq!(sim.state().pressure, 101.3, epsilon = 1e-9);
        assert_relative_eq!(sim.derived().moles, sim.state().moles, epsilon = 1e-12);

        sim.pause();
        sim.set("volume", Value::Number(2.0)).unwrap();
        frames(&mut sim, &mut surface, now, 1);
        assert_eq!(sim.state().volume, 2.0);
        assert_eq!(sim.state().temperature, 600.0);
        assert_relative_eq!(sim.state().moles, 101.3 * 2.0 / (GAS_CONSTANT * 600.0), epsilon = 1e-12);
    }

    #[test]
    fn process_drift_survives_untouched_sliders() {
        let p = GasParams { process: Process::Heat, ..params() };
        let mut rng = StdRng::seed_from_u64(9);
        let mut s = ThermodynamicsLab.initial_state(&p, &mut rng);
        let d = ThermodynamicsLab.evaluate(&p, 0.0);
        for _ in 0..60 {
            ThermodynamicsLab.apply_controls(&mut s, &p);
            ThermodynamicsLab.advance(&mut s, &p, &d, 1.0 / 60.0, &mut rng);
        }
        assert_relative_eq!(s.temperature, 330.0, epsilon = 1e-9);

        let moved = GasParams { volume: 1.5, ..p.clone() };
        ThermodynamicsLab.apply_controls(&mut s, &moved);
        assert_relative_eq!(s.temperature, 330.0, epsilon = 1e-9);
        assert_eq!(s.volume, 1.5);
    }

    #[test]
    fn molecules_stay_in_the_box() {
        let p = GasParams { process: Process::Compress, ..params() };
        let mut rng = StdRng::seed_from_u64(2);
        let mut s = ThermodynamicsLab.initial_state(&p, &mut rng);
        assert_eq!(s.molecules.len(), 100);
        let d = ThermodynamicsLab.evaluate(&p, 0.0);
        for _ in 0..300 {
            ThermodynamicsLab.advance(&mut s, &p, &d, 1.0 / 60.0, &mut rng);
        }
        let right = BOX_LEFT + s.box_width();
        assert!(s.molecules.iter().all(|m| m.x >= BOX_LEFT && m.x <= right));
    }
}
