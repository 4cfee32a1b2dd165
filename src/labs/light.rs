//! Refraction of a ray at a flat boundary between two media.

use std::f64::consts::FRAC_PI_2;

use rand::rngs::StdRng;
use rand::Rng;
use ratatui::style::Color;

use crate::engine::draw::{Bounds, Point, Sketch};
use crate::engine::lab::{Lab, Readout};
use crate::engine::narrative::Narrator;
use crate::engine::numeric::safe_div;
use crate::engine::params::{ParamSpec, ParameterStore};
use crate::error::{LabError, Result};

pub const MEDIA: &[&str] = &["vacuum", "air", "water", "glass", "diamond"];

const SPEED_OF_LIGHT: f64 = 2.998e8;
const PLANCK: f64 = 6.626e-34;
/// Index tables are quoted at this wavelength, in nm.
const REFERENCE_WAVELENGTH: f64 = 550.0;
/// Share of `n - 1` that swings across the visible band.
const DISPERSION: f64 = 0.05;

const WORLD: f64 = 200.0;
const HIT: Point = (100.0, 100.0);
const RAY_LEN: f64 = 90.0;
const PHOTONS: usize = 12;
/// World units per second in vacuum.
const PHOTON_SPEED: f64 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Medium {
    Vacuum,
    Air,
    Water,
    Glass,
    Diamond,
}

impl Medium {
    fn parse(name: &'static str, tag: &str) -> Result<Self> {
        match tag {
            "vacuum" => Ok(Medium::Vacuum),
            "air" => Ok(Medium::Air),
            "water" => Ok(Medium::Water),
            "glass" => Ok(Medium::Glass),
            "diamond" => Ok(Medium::Diamond),
            other => Err(LabError::InvalidChoice { name: name.into(), value: other.into() }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Medium::Vacuum => "vacuum",
            Medium::Air => "air",
            Medium::Water => "water",
            Medium::Glass => "glass",
            Medium::Diamond => "diamond",
        }
    }

    pub fn base_index(self) -> f64 {
        match self {
            Medium::Vacuum => 1.0,
            Medium::Air => 1.0003,
            Medium::Water => 1.333,
            Medium::Glass => 1.52,
            Medium::Diamond => 2.42,
        }
    }

    /// Refractive index at `wavelength` nm. Vacuum never disperses.
    pub fn index_at(self, wavelength: f64) -> f64 {
        let ratio = safe_div(REFERENCE_WAVELENGTH, wavelength.max(1.0));
        1.0 + (self.base_index() - 1.0) * (1.0 + DISPERSION * (ratio * ratio - 1.0))
    }

    fn tint(self) -> Color {
        match self {
            Medium::Vacuum => Color::Rgb(8, 8, 14),
            Medium::Air => Color::Rgb(18, 22, 34),
            Medium::Water => Color::Rgb(20, 50, 90),
            Medium::Glass => Color::Rgb(40, 70, 80),
            Medium::Diamond => Color::Rgb(70, 70, 100),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RayParams {
    pub from: Medium,
    pub into: Medium,
    /// Angle of incidence from the normal, in degrees.
    pub angle: f64,
    pub wavelength: f64,
    pub show_photons: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Refraction {
    pub n1: f64,
    pub n2: f64,
    pub incidence: f64,
    /// `None` under total internal reflection.
    pub refracted: Option<f64>,
    /// Only exists when `n1 > n2`.
    pub critical: Option<f64>,
    /// Fraction reflected at the boundary, 1 under total internal reflection.
    pub reflectance: f64,
    /// Phase speed in the second medium, m/s.
    pub speed: f64,
    pub frequency_thz: f64,
    pub photon_energy: f64,
}

impl Refraction {
    pub fn is_total_reflection(&self) -> bool {
        self.refracted.is_none()
    }
}

/// Refraction angle in degrees, or `None` when `n1 sin θ1 / n2` leaves [-1, 1].
pub fn snell(n1: f64, n2: f64, incidence: f64) -> Option<f64> {
    let sine = safe_div(n1, n2) * incidence.to_radians().sin();
    if !sine.is_finite() || sine.abs() > 1.0 {
        return None;
    }
    Some(sine.asin().to_degrees())
}

/// Schlick's approximation, taken on the side with the wider angle.
fn reflectance(n1: f64, n2: f64, incidence: f64, refracted: Option<f64>) -> f64 {
    let Some(refracted) = refracted else {
        return 1.0;
    };
    let r0 = safe_div(n1 - n2, n1 + n2).powi(2);
    let widest = if n1 > n2 { refracted } else { incidence };
    let c = 1.0 - widest.to_radians().cos();
    (r0 + (1.0 - r0) * c.powi(5)).clamp(0.0, 1.0)
}

pub fn wavelength_color(nm: f64) -> Color {
    let (r, g, b) = match nm {
        w if (380.0..440.0).contains(&w) => (-(w - 440.0) / 60.0, 0.0, 1.0),
        w if (440.0..490.0).contains(&w) => (0.0, (w - 440.0) / 50.0, 1.0),
        w if (490.0..510.0).contains(&w) => (0.0, 1.0, -(w - 510.0) / 20.0),
        w if (510.0..580.0).contains(&w) => ((w - 510.0) / 70.0, 1.0, 0.0),
        w if (580.0..645.0).contains(&w) => (1.0, -(w - 645.0) / 65.0, 0.0),
        w if (645.0..=780.0).contains(&w) => (1.0, 0.0, 0.0),
        _ => (1.0, 1.0, 1.0),
    };
    let channel = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb(channel(r), channel(g), channel(b))
}

pub fn wavelength_name(nm: f64) -> &'static str {
    match nm {
        w if w < 450.0 => "Violet",
        w if w < 485.0 => "Blue",
        w if w < 500.0 => "Cyan",
        w if w < 565.0 => "Green",
        w if w < 590.0 => "Yellow",
        w if w < 625.0 => "Orange",
        _ => "Red",
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Photon {
    /// Distance along the ray, incident leg first.
    pub travelled: f64,
    pub reflected: bool,
}

#[derive(Clone, Debug, Default)]
pub struct RayState {
    pub photons: Vec<Photon>,
    pub transmitted: u64,
    pub reflected: u64,
}

pub struct LightLab;

impl LightLab {
    fn incident_start(d: &Refraction) -> Point {
        let t = d.incidence.to_radians();
        (HIT.0 - RAY_LEN * t.sin(), HIT.1 + RAY_LEN * t.cos())
    }

    fn reflected_dir(d: &Refraction) -> Point {
        let t = d.incidence.to_radians();
        (t.sin(), t.cos())
    }

    fn refracted_dir(angle: f64) -> Point {
        let t = angle.to_radians();
        (t.sin(), -t.cos())
    }

    fn position(photon: &Photon, d: &Refraction) -> Point {
        if photon.travelled < RAY_LEN {
            let (sx, sy) = Self::incident_start(d);
            let f = photon.travelled / RAY_LEN;
            return (sx + (HIT.0 - sx) * f, sy + (HIT.1 - sy) * f);
        }
        let dir = match (photon.reflected, d.refracted) {
            (false, Some(angle)) => Self::refracted_dir(angle),
            _ => Self::reflected_dir(d),
        };
        let out = photon.travelled - RAY_LEN;
        (HIT.0 + dir.0 * out, HIT.1 + dir.1 * out)
    }
}

impl Lab for LightLab {
    type Params = RayParams;
    type State = RayState;
    type Derived = Refraction;

    fn title(&self) -> &'static str {
        "Light & Refraction"
    }

    fn world(&self) -> Bounds {
        Bounds::new(WORLD, WORLD)
    }

    fn controls(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::choice("medium", "From", MEDIA, "air"),
            ParamSpec::choice("environment", "Into", MEDIA, "water"),
            ParamSpec::number("angle", "Incidence", "°", (0.0, 89.0, 1.0), 30.0),
            ParamSpec::number("wavelength", "Wavelength", "nm", (380.0, 780.0, 10.0), 550.0),
            ParamSpec::flag("photons", "Photons", true),
        ]
    }

    fn read(&self, store: &ParameterStore) -> Result<RayParams> {
        Ok(RayParams {
            from: Medium::parse("medium", store.choice("medium")?)?,
            into: Medium::parse("environment", store.choice("environment")?)?,
            angle: store.number("angle")?,
            wavelength: store.number("wavelength")?,
            show_photons: store.flag("photons")?,
        })
    }

    fn initial_state(&self, _p: &RayParams, _rng: &mut StdRng) -> RayState {
        let spacing = 2.0 * RAY_LEN / PHOTONS as f64;
        RayState {
            photons: (0..PHOTONS)
                .map(|i| Photon { travelled: i as f64 * spacing, reflected: false })
                .collect(),
            ..RayState::default()
        }
    }

    fn evaluate(&self, p: &RayParams, _elapsed: f64) -> Refraction {
        let n1 = p.from.index_at(p.wavelength);
        let n2 = p.into.index_at(p.wavelength);
        let refracted = snell(n1, n2, p.angle);
        let critical = (n1 > n2).then(|| (n2 / n1).asin().to_degrees());
        let frequency = safe_div(SPEED_OF_LIGHT, p.wavelength * 1e-9);
        Refraction {
            n1,
            n2,
            incidence: p.angle,
            refracted,
            critical,
            reflectance: reflectance(n1, n2, p.angle, refracted),
            speed: safe_div(SPEED_OF_LIGHT, n2),
            frequency_thz: frequency / 1e12,
            photon_energy: PLANCK * frequency,
        }
    }

    fn advance(&self, s: &mut RayState, _p: &RayParams, d: &Refraction, dt: f64, rng: &mut StdRng) {
        let lap = 2.0 * RAY_LEN;
        for photon in &mut s.photons {
            let n = if photon.travelled >= RAY_LEN && !photon.reflected && d.refracted.is_some() {
                d.n2
            } else {
                d.n1
            };
            let before = photon.travelled;
            photon.travelled += safe_div(PHOTON_SPEED, n) * dt;
            if before < RAY_LEN && photon.travelled >= RAY_LEN {
                photon.reflected = d.is_total_reflection() || rng.gen_bool(d.reflectance.clamp(0.0, 1.0));
                if photon.reflected {
                    s.reflected += 1;
                } else {
                    s.transmitted += 1;
                }
            }
            if photon.travelled >= lap {
                photon.travelled %= lap;
                photon.reflected = false;
            }
        }
    }

    fn draw(&self, s: &RayState, p: &RayParams, d: &Refraction, sketch: &mut Sketch) {
        sketch.clear(p.from.tint());
        sketch.fill_rect((0.0, 0.0), WORLD, HIT.1, p.into.tint());
        sketch.line((0.0, HIT.1), (WORLD, HIT.1), Color::Rgb(160, 160, 180));
        sketch.line((HIT.0, 20.0), (HIT.0, 180.0), Color::Rgb(90, 90, 110));

        let beam = wavelength_color(p.wavelength);
        sketch.line(Self::incident_start(d), HIT, beam);
        // Angles sweep from the normal, up for the incident leg and down for the refracted one.
        sketch.arc(HIT, 15.0, FRAC_PI_2, FRAC_PI_2 + d.incidence.to_radians(), Color::Rgb(255, 200, 60));

        let (rx, ry) = Self::reflected_dir(d);
        let mirror = if d.is_total_reflection() { beam } else { Color::Rgb(110, 110, 130) };
        sketch.line(HIT, (HIT.0 + rx * RAY_LEN, HIT.1 + ry * RAY_LEN), mirror);

        match d.refracted {
            Some(angle) => {
                let (tx, ty) = Self::refracted_dir(angle);
                sketch.line(HIT, (HIT.0 + tx * RAY_LEN, HIT.1 + ty * RAY_LEN), beam);
                sketch.arc(HIT, 15.0, -FRAC_PI_2, -FRAC_PI_2 + angle.to_radians(), Color::Rgb(120, 220, 120));
            }
            None => sketch.text((110.0, 60.0), "total internal reflection", Color::Rgb(233, 87, 63)),
        }

        if p.show_photons {
            let dots = s.photons.iter().map(|ph| Self::position(ph, d)).collect();
            sketch.points(dots, Color::Rgb(255, 255, 255));
        }
        sketch.text((5.0, 190.0), format!("{} n={:.4}", p.from.name(), d.n1), Color::Rgb(200, 200, 220));
        sketch.text((5.0, 5.0), format!("{} n={:.4}", p.into.name(), d.n2), Color::Rgb(200, 200, 220));
    }

    fn describe(&self, p: &RayParams, d: &Refraction, s: &RayState, n: &mut Narrator) -> Vec<String> {
        let mut lines = vec![format!(
            "{} n₁ sin θ₁ = n₂ sin θ₂: {:.4} × sin {:.0}° = {:.4} × sin θ₂.",
            n.pick(&["Snell's law:", "By Snell's law,"]),
            d.n1,
            d.incidence,
            d.n2
        )];
        match (d.refracted, d.critical) {
            (None, Some(critical)) => lines.push(format!(
                "Past the critical angle of {critical:.1}°, no light leaves the {}: total internal reflection.",
                p.from.name()
            )),
            (None, None) => {}
            (Some(angle), critical) => {
                let bend = if (d.n2 - d.n1).abs() < 1e-12 || d.incidence == 0.0 {
                    "passes straight through".to_string()
                } else if d.n2 > d.n1 {
                    format!("bends toward the normal, to {angle:.1}°")
                } else {
                    format!("bends away from the normal, to {angle:.1}°")
                };
                lines.push(format!("Entering {}, the ray {bend}.", p.into.name()));
                if let Some(critical) = critical {
                    lines.push(format!("Beyond {critical:.1}° the ray would be reflected completely."));
                }
                lines.push(format!("About {:.1}% of the light reflects at the surface.", d.reflectance * 100.0));
            }
        }
        lines.push(format!(
            "{} light ({:.0} nm) sees n = {:.4} in {}; {}",
            wavelength_name(p.wavelength),
            p.wavelength,
            d.n2,
            p.into.name(),
            n.pick(&["shorter wavelengths bend more.", "violet bends more than red."]),
        ));
        lines.push(format!(
            "Light slows to {:.3} × 10⁸ m/s; each photon carries {:.2} × 10⁻¹⁹ J at {:.0} THz.",
            d.speed / 1e8,
            d.photon_energy * 1e19,
            d.frequency_thz
        ));
        let arrived = s.reflected + s.transmitted;
        if arrived > 0 {
            lines.push(format!("{} of {arrived} photons so far bounced back.", s.reflected));
        }
        lines
    }

    fn readouts(&self, _p: &RayParams, d: &Refraction, s: &RayState) -> Vec<Readout> {
        let mut out = vec![
            Readout::new("n₁", format!("{:.4}", d.n1)),
            Readout::new("n₂", format!("{:.4}", d.n2)),
            Readout::new("θ₂", d.refracted.map_or_else(|| "TIR".to_string(), |a| format!("{a:.1}°"))),
        ];
        if let Some(critical) = d.critical {
            out.push(Readout::new("θc", format!("{critical:.1}°")));
        }
        out.push(Readout::new("R", format!("{:.1}%", d.reflectance * 100.0)));
        out.push(Readout::new("Back", format!("{}/{}", s.reflected, s.reflected + s.transmitted)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::narrative::Phrasing;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn ray(from: Medium, into: Medium, angle: f64) -> RayParams {
        RayParams { from, into, angle, wavelength: REFERENCE_WAVELENGTH, show_photons: true }
    }

    #[test]
    fn air_into_water_at_thirty_degrees() {
        let d = LightLab.evaluate(&ray(Medium::Air, Medium::Water, 30.0), 0.0);
        assert_relative_eq!(d.n1, 1.0003, epsilon = 1e-12);
        assert_relative_eq!(d.n2, 1.333, epsilon = 1e-12);
        assert_relative_eq!(d.refracted.unwrap_or(f64::NAN), 22.0371, epsilon = 1e-3);
        assert_eq!(d.critical, None);
        assert!(d.reflectance > 0.0203 && d.reflectance < 0.05, "{}", d.reflectance);
        assert_relative_eq!(d.speed, SPEED_OF_LIGHT / 1.333, max_relative = 1e-12);
    }

    #[test]
    fn glass_to_air_past_the_critical_angle_reflects_totally() {
        let d = LightLab.evaluate(&ray(Medium::Glass, Medium::Air, 60.0), 0.0);
        assert!(d.is_total_reflection());
        assert_relative_eq!(d.critical.unwrap_or(f64::NAN), 41.1545, epsilon = 1e-3);
        assert_eq!(d.reflectance, 1.0);
        for value in [d.n1, d.n2, d.reflectance, d.speed, d.frequency_thz, d.photon_energy] {
            assert!(value.is_finite());
        }
        let mut n = Narrator::new(Phrasing::Fixed, 0);
        let lines = LightLab.describe(&ray(Medium::Glass, Medium::Air, 60.0), &d, &RayState::default(), &mut n);
        assert!(lines.iter().any(|l| l.contains("total internal reflection")));
        let readouts = LightLab.readouts(&ray(Medium::Glass, Medium::Air, 60.0), &d, &RayState::default());
        assert!(readouts.iter().any(|r| r.label == "θ₂" && r.value == "TIR"));
    }

    #[test]
    fn grazing_exit_stays_finite() {
        // sin 30° rounds just under one half, so the ratio sits at the asin limit.
        let angle = snell(2.0, 1.0, 30.0);
        assert_relative_eq!(angle.unwrap_or(f64::NAN), 90.0, epsilon = 1e-4);
        assert_eq!(snell(2.0, 1.0, 31.0), None);
        assert_eq!(snell(1.0, 0.0, 10.0), None);
    }

    #[test]
    fn normal_incidence_goes_straight_through() {
        let d = LightLab.evaluate(&ray(Medium::Air, Medium::Diamond, 0.0), 0.0);
        assert_eq!(d.refracted, Some(0.0));
        let r0 = ((1.0003 - 2.42) / (1.0003 + 2.42_f64)).powi(2);
        assert_relative_eq!(d.reflectance, r0, epsilon = 1e-12);
    }

    #[test]
    fn violet_bends_more_than_red() {
        let mut p = ray(Medium::Air, Medium::Glass, 45.0);
        p.wavelength = 400.0;
        let violet = LightLab.evaluate(&p, 0.0);
        p.wavelength = 700.0;
        let red = LightLab.evaluate(&p, 0.0);
        assert!(violet.n2 > red.n2);
        assert!(violet.refracted.unwrap_or(f64::NAN) < red.refracted.unwrap_or(f64::NAN));
        assert_eq!(Medium::Vacuum.index_at(400.0), 1.0);
        assert_eq!(Medium::Vacuum.index_at(700.0), 1.0);
    }

    #[test]
    fn trapped_photons_never_cross() {
        let p = ray(Medium::Glass, Medium::Air, 60.0);
        let d = LightLab.evaluate(&p, 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = LightLab.initial_state(&p, &mut rng);
        for _ in 0..600 {
            LightLab.advance(&mut s, &p, &d, 0.05, &mut rng);
        }
        assert_eq!(s.transmitted, 0);
        assert!(s.reflected > 0);
        for photon in &s.photons {
            let (x, y) = LightLab::position(photon, &d);
            assert!(x.is_finite() && y.is_finite());
            assert!(y >= HIT.1 - 1e-9, "a reflected photon dipped below the boundary: {y}");
        }
    }

    #[test]
    fn colours_follow_the_spectrum() {
        assert_eq!(wavelength_color(700.0), Color::Rgb(255, 0, 0));
        assert_eq!(wavelength_color(460.0), Color::Rgb(0, 102, 255));
        assert_eq!(wavelength_color(900.0), Color::Rgb(255, 255, 255));
        assert_eq!(wavelength_name(550.0), "Green");
        assert_eq!(wavelength_name(400.0), "Violet");
    }
}
