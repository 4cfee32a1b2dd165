//! Leaf photosynthesis with four interacting limiting factors.

use rand::rngs::StdRng;
use rand::Rng;
use ratatui::style::Color;

use crate::engine::draw::{Bounds, Sketch};
use crate::engine::lab::{Lab, Readout};
use crate::engine::narrative::{efficiency, Narrator};
use crate::engine::numeric::{log10_1p, non_negative, safe_div};
use crate::engine::params::{ParamSpec, ParameterStore};
use crate::error::Result;

const OPTIMAL_RATE: f64 = 0.5;
const MAX_BUBBLES: usize = 200;
const WATER_SURFACE: f64 = 260.0;

#[derive(Clone, Debug)]
pub struct LightParams {
    pub light: f64,
    pub co2: f64,
    pub temperature: f64,
    pub water: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limiting {
    Light,
    CarbonDioxide,
    Temperature,
    Water,
}

impl Limiting {
    pub fn name(&self) -> &'static str {
        match self {
            Limiting::Light => "Light intensity",
            Limiting::CarbonDioxide => "CO₂ concentration",
            Limiting::Temperature => "Temperature",
            Limiting::Water => "Water availability",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Photosynthesis {
    pub light_factor: f64,
    pub co2_factor: f64,
    pub temp_factor: f64,
    pub water_factor: f64,
    pub rate: f64,
    /// 0..=100
    pub plant_health: f64,
    pub limiting: Option<Limiting>,
}

#[derive(Clone, Debug)]
struct Bubble {
    x: f64,
    y: f64,
    size: f64,
    speed: f64,
}

#[derive(Debug, Default)]
pub struct LeafState {
    pub oxygen: f64,
    pub glucose: f64,
    pub bubbles_released: u64,
    bubbles: Vec<Bubble>,
    bubble_debt: f64,
}

pub struct PhotosynthesisLab;

impl Lab for PhotosynthesisLab {
    type Params = LightParams;
    type State = LeafState;
    type Derived = Photosynthesis;

    fn title(&self) -> &'static str {
        "Photosynthesis"
    }

    fn world(&self) -> Bounds {
        Bounds::new(400.0, 300.0)
    }

    fn controls(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::number("light", "Light intensity", "%", (0.0, 100.0, 5.0), 50.0),
            ParamSpec::number("co2", "CO₂", "ppm", (100.0, 1500.0, 50.0), 400.0),
            ParamSpec::number("temperature", "Temperature", "°C", (10.0, 40.0, 1.0), 25.0),
            ParamSpec::number("water", "Water", "%", (10.0, 100.0, 5.0), 70.0),
        ]
    }

    fn read(&self, store: &ParameterStore) -> Result<LightParams> {
        Ok(LightParams {
            light: store.number("light")?,
            co2: store.number("co2")?,
            temperature: store.number("temperature")?,
            water: store.number("water")?,
        })
    }

    fn initial_state(&self, _p: &LightParams, _rng: &mut StdRng) -> LeafState {
        LeafState::default()
    }

    fn evaluate(&self, p: &LightParams, _elapsed: f64) -> Photosynthesis {
        let light_factor = 0.5 * log10_1p(p.light);
        let co2 = non_negative(p.co2);
        let co2_factor = safe_div(co2, co2 + 200.0);
        let temp_factor = (-((p.temperature - 25.0) / 15.0).powi(2)).exp();
        let water_factor = (non_negative(p.water) / 70.0).min(1.0);
        let rate = non_negative(0.1 * light_factor * co2_factor * temp_factor * water_factor);

        let comfortable = p.temperature > 15.0 && p.temperature < 35.0;
        let plant_health =
            (rate * 200.0 + non_negative(p.water) * 0.8 + if comfortable { 20.0 } else { 0.0 }).min(100.0);

        let limiting = if p.light < 30.0 {
            Some(Limiting::Light)
        } else if p.co2 < 200.0 {
            Some(Limiting::CarbonDioxide)
        } else if !comfortable {
            Some(Limiting::Temperature)
        } else if p.water < 40.0 {
            Some(Limiting::Water)
        } else {
            None
        };

        Photosynthesis { light_factor, co2_factor, temp_factor, water_factor, rate, plant_health, limiting }
    }

    fn advance(&self, s: &mut LeafState, _p: &LightParams, d: &Photosynthesis, dt: f64, rng: &mut StdRng) {
        s.oxygen += d.rate * dt;
        s.glucose += d.rate * dt * 0.1;

        // One bubble per 50 ms of simulated time at unit rate.
        s.bubble_debt += d.rate * dt * 1000.0 / 50.0;
        while s.bubble_debt >= 1.0 {
            s.bubble_debt -= 1.0;
            s.bubbles_released += 1;
            if s.bubbles.len() < MAX_BUBBLES {
                s.bubbles.push(Bubble {
                    x: rng.gen_range(170.0..230.0),
                    y: rng.gen_range(120.0..180.0),
                    size: rng.gen_range(1.5..4.0),
                    speed: rng.gen_range(20.0..50.0),
                });
            }
        }
        for b in s.bubbles.iter_mut() {
            b.y += b.speed * dt;
            b.x += (rng.gen::<f64>() - 0.5) * 0.5;
        }
        s.bubbles.retain(|b| b.y < WATER_SURFACE);
    }

    fn draw(&self, s: &LeafState, p: &LightParams, d: &Photosynthesis, sketch: &mut Sketch) {
        sketch.clear(Color::Rgb(8, 16, 24));

        // Sun, brighter with light intensity.
        let glow = (80.0 + 1.75 * p.light.clamp(0.0, 100.0)) as u8;
        sketch.circle((50.0, 250.0), 20.0, Color::Rgb(glow, glow, 60));
        let rays = (p.light / 20.0).round().clamp(0.0, 5.0) as usize;
        for i in 0..rays {
            let y = 240.0 - i as f64 * 12.0;
            sketch.line((75.0, y), (160.0, 150.0 + i as f64 * 6.0), Color::Rgb(glow, glow, 80));
        }

        // Water tank
        sketch.rect((140.0, 40.0), 120.0, WATER_SURFACE - 40.0, Color::Rgb(90, 90, 110));
        let depth = (p.water / 100.0).clamp(0.0, 1.0) * (WATER_SURFACE - 40.0);
        sketch.line((141.0, 40.0 + depth), (259.0, 40.0 + depth), Color::Rgb(60, 120, 200));

        // Plant: stem and two leaves whose colour tracks health.
        let health = (d.plant_health / 100.0).clamp(0.0, 1.0);
        let leaf = Color::Rgb((160.0 * (1.0 - health)) as u8 + 40, (80.0 + 150.0 * health) as u8, 40);
        sketch.line((200.0, 40.0), (200.0, 150.0), Color::Rgb(60, 140, 60));
        sketch.curve((200.0, 110.0), (170.0, 140.0), (160.0, 120.0), leaf);
        sketch.curve((200.0, 110.0), (185.0, 95.0), (160.0, 120.0), leaf);
        sketch.curve((200.0, 130.0), (230.0, 160.0), (240.0, 140.0), leaf);
        sketch.curve((200.0, 130.0), (215.0, 115.0), (240.0, 140.0), leaf);

        let bubbles: Vec<(f64, f64)> = s.bubbles.iter().filter(|b| b.size > 2.5).map(|b| (b.x, b.y)).collect();
        for b in s.bubbles.iter().filter(|b| b.size <= 2.5) {
            sketch.circle((b.x, b.y), b.size, Color::Rgb(180, 220, 255));
        }
        sketch.points(bubbles, Color::Rgb(220, 240, 255));

        // CO₂ molecules drifting in from the right.
        let co2_marks = (p.co2 / 150.0).round().clamp(0.0, 10.0) as usize;
        let marks = (0..co2_marks).map(|i| (300.0 + (i % 3) as f64 * 25.0, 60.0 + i as f64 * 18.0)).collect();
        sketch.points(marks, Color::Rgb(200, 200, 200));
        sketch.text((290.0, 270.0), "CO₂", Color::Rgb(200, 200, 200));

        sketch.text((10.0, 20.0), format!("rate {:.3}", d.rate), Color::Rgb(120, 220, 120));
    }

    fn describe(&self, p: &LightParams, d: &Photosynthesis, _s: &LeafState, n: &mut Narrator) -> Vec<String> {
        let mut insights = Vec::new();
        if p.light < 30.0 {
            insights.push(n.pick(&[
                "Low light intensity is limiting the light-dependent reactions.",
                "Chlorophyll is starved of photons; more light would speed things up.",
            ]).to_string());
        } else if p.light > 80.0 {
            insights.push("Light is plentiful; another factor now sets the pace.".to_string());
        }
        if p.co2 < 200.0 {
            insights.push("CO₂ is scarce, so the Calvin cycle cannot fix carbon quickly.".to_string());
        } else if p.co2 > 1000.0 {
            insights.push("CO₂ is abundant; Rubisco is close to saturation.".to_string());
        }
        if p.temperature < 15.0 {
            insights.push("Cold is slowing the enzymes of the Calvin cycle.".to_string());
        } else if p.temperature > 35.0 {
            insights.push("Heat stress: enzymes are losing efficiency and stomata are closing.".to_string());
        }
        if p.water < 40.0 {
            insights.push("Water stress is closing stomata and cutting CO₂ uptake.".to_string());
        }
        insights.push(format!(
            "Limiting factor: {}.",
            d.limiting.map_or("None - optimal conditions", |l| l.name())
        ));
        insights.push(format!(
            "Photosynthesis is running at {:.1}% of the optimal rate.",
            efficiency(d.rate, OPTIMAL_RATE)
        ));
        insights
    }

    fn readouts(&self, _p: &LightParams, d: &Photosynthesis, s: &LeafState) -> Vec<Readout> {
        vec![
            Readout::new("Rate", format!("{:.3}", d.rate)),
            Readout::new("O2", format!("{:.2}", s.oxygen)),
            Readout::new("Glucose", format!("{:.3}", s.glucose)),
            Readout::new("Bubbles", s.bubbles_released.to_string()),
            Readout::new("Health", format!("{:.0}%", d.plant_health)),
        ]
    }
}
