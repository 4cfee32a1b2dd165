//! DC and AC circuits: Ohm's law, reactance, impedance and resonance.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::Rng;
use ratatui::style::Color;

use crate::engine::draw::{Bounds, Sketch};
use crate::engine::lab::{Lab, Readout};
use crate::engine::narrative::Narrator;
use crate::engine::numeric::{finite_or_zero, safe_div, sqrt_floor};
use crate::engine::params::{ParamSpec, ParameterStore};
use crate::error::{LabError, Result};

pub const CIRCUITS: &[&str] = &["dc", "ac", "rc", "rl", "rlc"];

const ELECTRONS: usize = 50;
const FIXED_CHARGES: usize = 20;
const FIELD_LINES: usize = 40;
const WIRE_LEFT: f64 = 100.0;
const WIRE_RIGHT: f64 = 500.0;
const WIRE_Y: f64 = 200.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Circuit {
    Dc,
    Ac,
    Rc,
    Rl,
    Rlc,
}

impl Circuit {
    fn parse(tag: &str) -> Result<Self> {
        match tag {
            "dc" => Ok(Circuit::Dc),
            "ac" => Ok(Circuit::Ac),
            "rc" => Ok(Circuit::Rc),
            "rl" => Ok(Circuit::Rl),
            "rlc" => Ok(Circuit::Rlc),
            other => Err(LabError::InvalidChoice { name: "circuit".into(), value: other.into() }),
        }
    }

    fn alternating(self) -> bool {
        matches!(self, Circuit::Ac | Circuit::Rlc)
    }

    fn has_capacitor(self) -> bool {
        matches!(self, Circuit::Rc | Circuit::Rlc)
    }

    fn has_inductor(self) -> bool {
        matches!(self, Circuit::Rl | Circuit::Rlc)
    }
}

#[derive(Clone, Debug)]
pub struct CircuitParams {
    pub voltage: f64,
    pub resistance: f64,
    /// Microfarads.
    pub capacitance: f64,
    /// Millihenries.
    pub inductance: f64,
    pub frequency: f64,
    pub circuit: Circuit,
    pub show_field: bool,
    pub show_electrons: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CircuitQuantities {
    pub current: f64,
    pub power: f64,
    pub capacitive_reactance: f64,
    pub inductive_reactance: f64,
    pub impedance: f64,
    pub ac_current: f64,
    pub resonance: f64,
    /// Instantaneous source voltage; equals `voltage` for DC.
    pub instantaneous_voltage: f64,
}

impl CircuitQuantities {
    /// The current the circuit type actually draws.
    pub fn effective_current(&self, circuit: Circuit) -> f64 {
        if circuit.alternating() { self.ac_current } else { self.current }
    }
}

#[derive(Clone, Debug)]
struct Charge {
    x: f64,
    y: f64,
    drift: f64,
    negative: bool,
}

#[derive(Clone, Debug)]
struct FieldLine {
    y: f64,
    length: f64,
    target: f64,
}

#[derive(Debug, Default)]
pub struct CircuitState {
    charges: Vec<Charge>,
    field: Vec<FieldLine>,
    pub charge_passed: f64,
}

pub struct ElectricityLab;

impl Lab for ElectricityLab {
    type Params = CircuitParams;
    type State = CircuitState;
    type Derived = CircuitQuantities;

    fn title(&self) -> &'static str {
        "Electricity"
    }

    fn world(&self) -> Bounds {
        Bounds::new(600.0, 400.0)
    }

    fn controls(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::choice("circuit", "Circuit", CIRCUITS, "dc"),
            ParamSpec::number("voltage", "Voltage", "V", (1.0, 24.0, 1.0), 12.0),
            ParamSpec::number("resistance", "Resistance", "Ω", (10.0, 1000.0, 10.0), 100.0),
            ParamSpec::number("capacitance", "Capacitance", "µF", (1.0, 1000.0, 1.0), 100.0),
            ParamSpec::number("inductance", "Inductance", "mH", (1.0, 100.0, 1.0), 10.0),
            ParamSpec::number("frequency", "Frequency", "Hz", (1.0, 1000.0, 1.0), 60.0),
            ParamSpec::flag("show_field", "Field lines", true),
            ParamSpec::flag("show_electrons", "Electrons", true),
        ]
    }

    fn read(&self, store: &ParameterStore) -> Result<CircuitParams> {
        Ok(CircuitParams {
            voltage: store.number("voltage")?,
            resistance: store.number("resistance")?,
            capacitance: store.number("capacitance")?,
            inductance: store.number("inductance")?,
            frequency: store.number("frequency")?,
            circuit: Circuit::parse(store.choice("circuit")?)?,
            show_field: store.flag("show_field")?,
            show_electrons: store.flag("show_electrons")?,
        })
    }

    fn initial_state(&self, _p: &CircuitParams, rng: &mut StdRng) -> CircuitState {
        let mut charges = Vec::with_capacity(ELECTRONS + FIXED_CHARGES);
        for _ in 0..ELECTRONS {
            charges.push(Charge {
                x: rng.gen_range(WIRE_LEFT..WIRE_RIGHT),
                y: WIRE_Y + rng.gen_range(-50.0..50.0),
                drift: rng.gen_range(0.5..1.0),
                negative: true,
            });
        }
        for _ in 0..FIXED_CHARGES {
            charges.push(Charge {
                x: rng.gen_range(WIRE_LEFT..WIRE_RIGHT),
                y: WIRE_Y + rng.gen_range(-50.0..50.0),
                drift: 0.0,
                negative: false,
            });
        }
        let field = (0..FIELD_LINES)
            .map(|_| FieldLine {
                y: rng.gen_range(100.0..300.0),
                length: 0.0,
                target: rng.gen_range(300.0..400.0),
            })
            .collect();
        CircuitState { charges, field, charge_passed: 0.0 }
    }

    fn evaluate(&self, p: &CircuitParams, elapsed: f64) -> CircuitQuantities {
        let current = safe_div(p.voltage, p.resistance);
        let power = p.voltage * current;
        let capacitive_reactance = safe_div(1.0, 2.0 * PI * p.frequency * p.capacitance * 1e-6);
        let inductive_reactance = 2.0 * PI * p.frequency * p.inductance * 1e-3;
        let (xc, xl) = match p.circuit {
            Circuit::Dc => (0.0, 0.0),
            Circuit::Ac => (capacitive_reactance, inductive_reactance),
            Circuit::Rc => (capacitive_reactance, 0.0),
            Circuit::Rl => (0.0, inductive_reactance),
            Circuit::Rlc => (capacitive_reactance, inductive_reactance),
        };
        let impedance = sqrt_floor(p.resistance.powi(2) + (xl - xc).powi(2));
        let ac_current = safe_div(p.voltage, impedance);
        let resonance = safe_div(1.0, 2.0 * PI * sqrt_floor(p.inductance * 1e-3 * p.capacitance * 1e-6));
        let instantaneous_voltage = if p.circuit.alternating() {
            finite_or_zero(p.voltage * (2.0 * PI * p.frequency * elapsed).sin())
        } else {
            p.voltage
        };
        CircuitQuantities {
            current,
            power,
            capacitive_reactance,
            inductive_reactance,
            impedance,
            ac_current,
            resonance,
            instantaneous_voltage,
        }
    }

    fn advance(&self, s: &mut CircuitState, p: &CircuitParams, q: &CircuitQuantities, dt: f64, _rng: &mut StdRng) {
        s.charge_passed += q.effective_current(p.circuit) * dt;

        // Drift scales with source voltage, as in the reference 12 V setup.
        let push = if p.circuit.alternating() {
            safe_div(q.instantaneous_voltage, 12.0)
        } else {
            p.voltage / 12.0
        };
        let frames = dt * 60.0;
        for c in s.charges.iter_mut().filter(|c| c.negative) {
            c.x += c.drift * push * frames;
            if c.x > WIRE_RIGHT {
                c.x = WIRE_LEFT;
            } else if c.x < WIRE_LEFT {
                c.x = WIRE_RIGHT;
            }
        }
        for line in s.field.iter_mut() {
            line.length += 0.5 * frames;
            if line.length > line.target * 1.2 {
                line.length = 0.0;
            }
        }
    }

    fn draw(&self, s: &CircuitState, p: &CircuitParams, q: &CircuitQuantities, sketch: &mut Sketch) {
        sketch.clear(Color::Rgb(10, 10, 20));
        let wire = Color::Rgb(200, 170, 60);
        let top = 320.0;
        let bottom = 80.0;
        sketch.polyline(
            vec![(60.0, bottom), (60.0, top), (540.0, top), (540.0, bottom)],
            false,
            wire,
        );
        sketch.line((60.0, bottom), (540.0, bottom), wire);

        // Source
        if p.circuit.alternating() {
            sketch.circle((60.0, WIRE_Y), 20.0, Color::Rgb(255, 255, 255));
            let wave: Vec<(f64, f64)> = (0..=20)
                .map(|i| {
                    let x = 45.0 + i as f64 * 1.5;
                    (x, WIRE_Y + (i as f64 / 20.0 * 2.0 * PI).sin() * 10.0)
                })
                .collect();
            sketch.polyline(wave, false, Color::Rgb(120, 200, 255));
        } else {
            sketch.line((45.0, WIRE_Y + 10.0), (75.0, WIRE_Y + 10.0), Color::Rgb(255, 255, 255));
            sketch.line((52.0, WIRE_Y - 10.0), (68.0, WIRE_Y - 10.0), Color::Rgb(255, 255, 255));
            sketch.text((80.0, WIRE_Y + 14.0), "+", Color::Rgb(255, 100, 100));
        }

        // Resistor zig-zag on the top wire
        let zig: Vec<(f64, f64)> = (0..=8)
            .map(|i| (160.0 + i as f64 * 10.0, top + if i % 2 == 0 { 0.0 } else { 10.0 }))
            .collect();
        sketch.polyline(zig, false, Color::Rgb(255, 150, 80));

        if p.circuit.has_capacitor() {
            sketch.line((330.0, top - 15.0), (330.0, top + 15.0), Color::Rgb(120, 200, 255));
            sketch.line((340.0, top - 15.0), (340.0, top + 15.0), Color::Rgb(120, 200, 255));
        }
        if p.circuit.has_inductor() {
            for i in 0..4 {
                let cx = 410.0 + i as f64 * 12.0;
                sketch.arc((cx, top), 6.0, 0.0, PI, Color::Rgb(180, 120, 255));
            }
        }

        if p.show_field {
            let strength = (q.effective_current(p.circuit) * 5.0).clamp(0.1, 1.0);
            let shade = (60.0 + 150.0 * strength) as u8;
            for line in &s.field {
                let length = line.length.min(line.target);
                sketch.line((WIRE_LEFT, line.y), (WIRE_LEFT + length, line.y), Color::Rgb(shade / 3, shade / 2, shade));
            }
        }

        if p.show_electrons {
            let electrons = s.charges.iter().filter(|c| c.negative).map(|c| (c.x, c.y)).collect();
            sketch.points(electrons, Color::Rgb(80, 200, 255));
        }
        let fixed = s.charges.iter().filter(|c| !c.negative).map(|c| (c.x, c.y)).collect();
        sketch.points(fixed, Color::Rgb(255, 90, 90));

        sketch.text(
            (360.0, 380.0),
            format!("I = {:.3} A", q.effective_current(p.circuit)),
            Color::Rgb(255, 220, 80),
        );
    }

    fn describe(&self, p: &CircuitParams, q: &CircuitQuantities, _s: &CircuitState, n: &mut Narrator) -> Vec<String> {
        let mut lines = vec![format!(
            "{} {:.0} V across {:.0} Ω gives I = {:.3} A and P = {:.2} W.",
            n.pick(&["Ohm's law:", "By V = IR,", "Applying Ohm's law,"]),
            p.voltage,
            p.resistance,
            q.current,
            q.power
        )];
        if p.circuit != Circuit::Dc {
            lines.push(format!(
                "Reactance X_C = {:.2} Ω, X_L = {:.2} Ω; impedance Z = {:.2} Ω limits the current to {:.3} A.",
                q.capacitive_reactance, q.inductive_reactance, q.impedance, q.ac_current
            ));
        }
        if p.circuit == Circuit::Rlc {
            let detune = safe_div((p.frequency - q.resonance).abs(), q.resonance);
            if detune < 0.1 {
                lines.push("The source is near resonance: reactances cancel and the current peaks.".into());
            } else {
                lines.push(format!("Resonance sits at {:.2} Hz; tune the frequency toward it.", q.resonance));
            }
        }
        if q.power > 2.0 {
            lines.push("High power dissipation: the resistor will heat noticeably.".into());
        }
        lines
    }

    fn readouts(&self, p: &CircuitParams, q: &CircuitQuantities, s: &CircuitState) -> Vec<Readout> {
        let mut out = vec![
            Readout::new("I", format!("{:.3} A", q.effective_current(p.circuit))),
            Readout::new("P", format!("{:.2} W", q.power)),
        ];
        if p.circuit != Circuit::Dc {
            out.push(Readout::new("Z", format!("{:.1} Ω", q.impedance)));
        }
        if p.circuit == Circuit::Rlc {
            out.push(Readout::new("f_r", format!("{:.1} Hz", q.resonance)));
        }
        out.push(Readout::new("Q", format!("{:.2} C", s.charge_passed)));
        out
    }
}
