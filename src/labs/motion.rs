//! Projectile launched under a constant applied force, gravity and linear
//! drag, bouncing on the ground.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use ratatui::style::Color;

use crate::engine::draw::{Bounds, Point, Sketch};
use crate::engine::lab::{Lab, Readout};
use crate::engine::narrative::Narrator;
use crate::engine::numeric::{non_negative, safe_div};
use crate::engine::params::{ParamSpec, ParameterStore};
use crate::error::Result;

const PREVIEW_STEP: f64 = 0.1;
const PREVIEW_HORIZON: f64 = 20.0;
const BOUNCE: f64 = 0.8;
/// Vertical speed below which a bounce is absorbed.
const REST_SPEED: f64 = 2.0;
/// World units per metre.
const SCALE: f64 = 20.0;
const ORIGIN: Point = (20.0, 20.0);
const TRAIL_LEN: usize = 120;

#[derive(Clone, Debug)]
pub struct LaunchParams {
    pub mass: f64,
    pub velocity: f64,
    pub force: f64,
    /// Degrees above horizontal.
    pub angle: f64,
    pub gravity: f64,
    pub friction: f64,
}

impl LaunchParams {
    fn radians(&self) -> f64 {
        self.angle.to_radians()
    }

    /// Net acceleration for a body moving at `(vx, vy)`, with y pointing up.
    fn acceleration(&self, vx: f64, vy: f64) -> (f64, f64) {
        let mass = self.mass.max(f64::EPSILON);
        let theta = self.radians();
        let ax = self.force * theta.cos() / mass - self.friction * vx;
        let ay = self.force * theta.sin() / mass - self.gravity - self.friction * vy;
        (ax, ay)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    /// Metres, sampled every 0.1 s until the body lands.
    pub path: Vec<Point>,
    pub max_height: f64,
    pub range: f64,
    pub flight_time: f64,
    pub initial_acceleration: (f64, f64),
}

#[derive(Debug, Default)]
pub struct Body {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub bounces: u32,
    pub distance: f64,
    trail: VecDeque<Point>,
}

impl Body {
    pub fn kinetic_energy(&self, mass: f64) -> f64 {
        0.5 * non_negative(mass) * (self.vx * self.vx + self.vy * self.vy)
    }

    pub fn potential_energy(&self, mass: f64, gravity: f64) -> f64 {
        non_negative(mass) * gravity * self.y.max(0.0)
    }
}

pub struct MotionLab;

impl Lab for MotionLab {
    type Params = LaunchParams;
    type State = Body;
    type Derived = Trajectory;

    fn title(&self) -> &'static str {
        "Motion & Forces"
    }

    fn world(&self) -> Bounds {
        Bounds::new(800.0, 400.0)
    }

    fn controls(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::number("mass", "Mass", "kg", (1.0, 20.0, 1.0), 5.0),
            ParamSpec::number("velocity", "Initial velocity", "m/s", (0.0, 50.0, 1.0), 10.0),
            ParamSpec::number("force", "Applied force", "N", (0.0, 100.0, 5.0), 20.0),
            ParamSpec::number("angle", "Angle", "°", (0.0, 90.0, 5.0), 30.0),
            ParamSpec::number("gravity", "Gravity", "m/s²", (0.0, 20.0, 0.1), 9.8),
            ParamSpec::number("friction", "Friction", "", (0.0, 0.5, 0.01), 0.1),
        ]
    }

    fn read(&self, store: &ParameterStore) -> Result<LaunchParams> {
        Ok(LaunchParams {
            mass: store.number("mass")?,
            velocity: store.number("velocity")?,
            force: store.number("force")?,
            angle: store.number("angle")?,
            gravity: store.number("gravity")?,
            friction: store.number("friction")?,
        })
    }

    fn initial_state(&self, p: &LaunchParams, _rng: &mut StdRng) -> Body {
        let theta = p.radians();
        Body {
            vx: p.velocity * theta.cos(),
            vy: p.velocity * theta.sin(),
            ..Body::default()
        }
    }

    /// Forward-Euler preview of the flight, independent of the running body.
    fn evaluate(&self, p: &LaunchParams, _elapsed: f64) -> Trajectory {
        let theta = p.radians();
        let (mut x, mut y) = (0.0, 0.0);
        let (mut vx, mut vy) = (p.velocity * theta.cos(), p.velocity * theta.sin());
        let mut t = 0.0;
        let mut path = vec![(0.0, 0.0)];
        let mut max_height: f64 = 0.0;
        while t < PREVIEW_HORIZON {
            let (ax, ay) = p.acceleration(vx, vy);
            vx += ax * PREVIEW_STEP;
            vy += ay * PREVIEW_STEP;
            x += vx * PREVIEW_STEP;
            y += vy * PREVIEW_STEP;
            t += PREVIEW_STEP;
            if !(x.is_finite() && y.is_finite()) {
                break;
            }
            if y < 0.0 {
                path.push((x, 0.0));
                break;
            }
            max_height = max_height.max(y);
            path.push((x, y));
        }
        Trajectory {
            range: path.last().map_or(0.0, |pt| pt.0),
            path,
            max_height,
            flight_time: t,
            initial_acceleration: p.acceleration(0.0, 0.0),
        }
    }

    fn advance(&self, b: &mut Body, p: &LaunchParams, _t: &Trajectory, dt: f64, _rng: &mut StdRng) {
        if dt <= 0.0 {
            return;
        }
        let resting = b.y <= 0.0 && b.vy == 0.0;
        let (ax, mut ay) = p.acceleration(b.vx, b.vy);
        if resting && ay < 0.0 {
            ay = 0.0;
        }
        b.vx += ax * dt;
        b.vy += ay * dt;
        let step_x = b.vx * dt;
        b.x += step_x;
        b.y += b.vy * dt;
        b.distance += step_x.abs();

        if b.y < 0.0 {
            b.y = 0.0;
            if b.vy.abs() < REST_SPEED {
                b.vy = 0.0;
            } else {
                b.vy = -b.vy * BOUNCE;
                b.bounces += 1;
            }
        }
        let world_width = 800.0 / SCALE - 2.0;
        if b.x > world_width || b.x < 0.0 {
            b.x = b.x.clamp(0.0, world_width);
            b.vx = -b.vx * BOUNCE;
        }

        b.trail.push_back((b.x, b.y));
        if b.trail.len() > TRAIL_LEN {
            b.trail.pop_front();
        }
    }

    fn draw(&self, b: &Body, p: &LaunchParams, t: &Trajectory, sketch: &mut Sketch) {
        sketch.clear(Color::Rgb(12, 16, 24));
        let to_world = |(x, y): Point| (ORIGIN.0 + x * SCALE, ORIGIN.1 + y * SCALE);

        sketch.line((0.0, ORIGIN.1), (800.0, ORIGIN.1), Color::Rgb(90, 160, 90));
        sketch.polyline(t.path.iter().copied().map(to_world).collect(), false, Color::Rgb(80, 80, 120));
        sketch.points(b.trail.iter().copied().map(to_world).collect(), Color::Rgb(140, 140, 200));

        let centre = to_world((b.x, b.y));
        let radius = 4.0 + p.mass.clamp(1.0, 20.0) * 0.4;
        sketch.circle((centre.0, centre.1 + radius), radius, Color::Rgb(255, 200, 60));

        // Force and velocity arrows from the body.
        let theta = p.radians();
        let force_len = p.force * 0.8;
        let tip = (centre.0 + theta.cos() * force_len, centre.1 + radius + theta.sin() * force_len);
        sketch.line((centre.0, centre.1 + radius), tip, Color::Rgb(255, 90, 90));
        let vel_tip = (centre.0 + b.vx * 2.0, centre.1 + radius + b.vy * 2.0);
        sketch.line((centre.0, centre.1 + radius), vel_tip, Color::Rgb(90, 200, 255));

        sketch.text(
            (ORIGIN.0, 380.0),
            format!("peak {:.1} m  range {:.1} m", t.max_height, t.range),
            Color::Rgb(220, 220, 220),
        );
    }

    fn describe(&self, p: &LaunchParams, t: &Trajectory, b: &Body, n: &mut Narrator) -> Vec<String> {
        let (ax, ay) = t.initial_acceleration;
        let mut lines = vec![format!(
            "{} F = {:.0} N on {:.0} kg gives a = ({:.2}, {:.2}) m/s² before drag.",
            n.pick(&["Newton's second law:", "With a = F/m,", "Applying F = ma,"]),
            p.force,
            p.mass,
            ax,
            ay
        )];
        lines.push(format!(
            "The preview peaks at {:.1} m and lands {:.1} m away after {:.1} s.",
            t.max_height, t.range, t.flight_time
        ));
        if p.gravity == 0.0 {
            lines.push("With no gravity the body keeps climbing along the applied force.".into());
        }
        if p.friction > 0.3 {
            lines.push("Heavy drag is bleeding kinetic energy on every step.".into());
        }
        if b.bounces > 0 {
            lines.push(format!(
                "{} bounce(s) so far; each keeps {:.0}% of the vertical speed.",
                b.bounces,
                BOUNCE * 100.0
            ));
        }
        let kinetic = b.kinetic_energy(p.mass);
        let potential = b.potential_energy(p.mass, p.gravity);
        lines.push(format!(
            "Energy split: {:.0}% kinetic, {:.0}% potential.",
            100.0 * safe_div(kinetic, kinetic + potential),
            100.0 * safe_div(potential, kinetic + potential)
        ));
        lines
    }

    fn readouts(&self, p: &LaunchParams, t: &Trajectory, b: &Body) -> Vec<Readout> {
        vec![
            Readout::new("x", format!("{:.1} m", b.x)),
            Readout::new("y", format!("{:.1} m", b.y)),
            Readout::new("|v|", format!("{:.1} m/s", b.vx.hypot(b.vy))),
            Readout::new("KE", format!("{:.0} J", b.kinetic_energy(p.mass))),
            Readout::new("Peak", format!("{:.1} m", t.max_height)),
            Readout::new("Range", format!("{:.1} m", t.range)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn params() -> LaunchParams {
        LaunchParams { mass: 5.0, velocity: 10.0, force: 20.0, angle: 30.0, gravity: 9.8, friction: 0.1 }
    }

    #[test]
    fn initial_acceleration_from_newtons_law() {
        let t = MotionLab.evaluate(&params(), 0.0);
        let (ax, ay) = t.initial_acceleration;
        assert_relative_eq!(ax, 4.0 * 30f64.to_radians().cos(), epsilon = 1e-12);
        assert_relative_eq!(ay, 4.0 * 0.5 - 9.8, epsilon = 1e-12);
    }

    #[test]
    fn preview_lands_on_the_ground() {
        let t = MotionLab.evaluate(&params(), 0.0);
        assert!(t.max_height > 0.0);
        assert!(t.range > 0.0);
        assert!(t.flight_time < PREVIEW_HORIZON);
        assert_eq!(t.path.last().map(|pt| pt.1), Some(0.0));
    }

    #[test]
    fn drag_free_flight_matches_ballistics_roughly() {
        let p = LaunchParams { force: 0.0, friction: 0.0, angle: 45.0, velocity: 20.0, ..params() };
        let t = MotionLab.evaluate(&p, 0.0);
        let ideal_range = 400.0 / 9.8;
        assert!((t.range - ideal_range).abs() < 2.5, "range {}", t.range);
    }

    #[test]
    fn zero_gravity_never_lands() {
        let p = LaunchParams { gravity: 0.0, ..params() };
        let t = MotionLab.evaluate(&p, 0.0);
        assert_relative_eq!(t.flight_time, PREVIEW_HORIZON, epsilon = 0.11);
        assert!(t.path.iter().all(|pt| pt.0.is_finite() && pt.1.is_finite()));
    }

    #[test]
    fn body_bounces_then_settles() {
        let p = LaunchParams { force: 0.0, ..params() };
        let mut rng = StdRng::seed_from_u64(0);
        let mut b = MotionLab.initial_state(&p, &mut rng);
        let t = MotionLab.evaluate(&p, 0.0);
        for _ in 0..2000 {
            MotionLab.advance(&mut b, &p, &t, 1.0 / 60.0, &mut rng);
            assert!(b.y >= 0.0);
        }
        assert!(b.bounces >= 1);
        assert_eq!(b.y, 0.0);
        assert_eq!(b.vy, 0.0);
    }

    #[test]
    fn trail_keeps_only_the_latest_positions() {
        let p = params();
        let mut rng = StdRng::seed_from_u64(0);
        let mut b = MotionLab.initial_state(&p, &mut rng);
        let t = MotionLab.evaluate(&p, 0.0);
        for _ in 0..TRAIL_LEN + 30 {
            MotionLab.advance(&mut b, &p, &t, 1.0 / 60.0, &mut rng);
        }
        assert_eq!(b.trail.len(), TRAIL_LEN);
        assert_eq!(b.trail.back().copied(), Some((b.x, b.y)));
    }

    #[test]
    fn zero_dt_leaves_body_untouched() {
        let p = params();
        let mut rng = StdRng::seed_from_u64(0);
        let mut b = MotionLab.initial_state(&p, &mut rng);
        let t = MotionLab.evaluate(&p, 0.0);
        MotionLab.advance(&mut b, &p, &t, 0.0, &mut rng);
        assert_eq!((b.x, b.y), (0.0, 0.0));
    }
}
