//! The shared tick loop: advance time, evaluate, update state, redraw.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::engine::draw::{Sketch, Surface};
use crate::engine::lab::{Lab, Readout};
use crate::engine::narrative::{Narrator, Phrasing};
use crate::engine::params::ParameterStore;
use crate::engine::scheduler::{TickHandle, TickScheduler};
use crate::error::Result;

pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 5.0;
const NARRATIVE_PERIOD: f64 = 5.0;
// Keeps the narrator's stream distinct from the model's for the same seed.
const NARRATOR_SALT: u64 = 0x6e61_7272;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl RunState {
    pub fn label(&self) -> &'static str {
        match self {
            RunState::Idle => "IDLE",
            RunState::Running => "RUNNING",
            RunState::Paused => "PAUSED",
            RunState::Stopped => "STOPPED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clock {
    pub elapsed: f64,
    pub ticks: u64,
    pub speed: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub evaluations: u64,
    pub draws: u64,
    pub skipped: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct SimOptions {
    pub seed: u64,
    pub phrasing: Phrasing,
    pub speed: f64,
    /// Upper bound on one frame's wall-clock delta, in seconds.
    pub max_step: f64,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self { seed: 42, phrasing: Phrasing::Varied, speed: 1.0, max_step: 0.25 }
    }
}

pub struct Simulation<L: Lab> {
    lab: L,
    params: ParameterStore,
    state: L::State,
    derived: L::Derived,
    clock: Clock,
    run_state: RunState,
    scheduler: TickScheduler,
    rng: StdRng,
    narrator: Narrator,
    narrative: Vec<String>,
    options: SimOptions,
    drawn_revision: Option<u64>,
    stats: TickStats,
}

impl<L: Lab> Simulation<L> {
    pub fn new(lab: L, options: SimOptions) -> Result<Self> {
        let params = ParameterStore::new(lab.controls())?;
        let typed = lab.read(&params)?;
        let mut rng = StdRng::seed_from_u64(options.seed);
        let state = lab.initial_state(&typed, &mut rng);
        let derived = lab.evaluate(&typed, 0.0);
        let scheduler = TickScheduler::new(lab.cadence());
        Ok(Self {
            narrator: Narrator::new(options.phrasing, options.seed ^ NARRATOR_SALT),
            lab,
            params,
            state,
            derived,
            clock: Clock {
                elapsed: 0.0,
                ticks: 0,
                speed: options.speed.clamp(MIN_SPEED, MAX_SPEED),
            },
            run_state: RunState::Idle,
            scheduler,
            rng,
            narrative: Vec::new(),
            options,
            drawn_revision: None,
            stats: TickStats::default(),
        })
    }

    pub fn lab(&self) -> &L {
        &self.lab
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    #[cfg(test)]
    pub fn state(&self) -> &L::State {
        &self.state
    }

    #[cfg(test)]
    pub fn derived(&self) -> &L::Derived {
        &self.derived
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn narrative(&self) -> &[String] {
        &self.narrative
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    #[cfg(test)]
    pub fn is_tick_pending(&self) -> bool {
        self.scheduler.is_armed()
    }

    #[cfg(test)]
    pub fn set(&mut self, name: &str, value: crate::engine::params::Value) -> Result<bool> {
        self.params.set(name, value)
    }

    pub fn nudge(&mut self, name: &str, steps: i32) -> Result<bool> {
        self.params.nudge(name, steps)
    }

    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() {
            self.clock.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        }
    }

    pub fn start(&mut self, now: Instant) {
        match self.run_state {
            RunState::Idle | RunState::Paused => {
                debug!(
                    lab = self.lab.title(),
                    from = self.run_state.label(),
                    cadence = ?self.scheduler.cadence(),
                    "start"
                );
                self.run_state = RunState::Running;
                self.scheduler.arm(now);
            }
            RunState::Running | RunState::Stopped => {}
        }
    }

    pub fn pause(&mut self) {
        if self.run_state == RunState::Running {
            debug!(lab = self.lab.title(), "pause");
            self.scheduler.cancel();
            self.run_state = RunState::Paused;
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        match self.run_state {
            RunState::Running => self.pause(),
            _ => self.start(now),
        }
    }

    /// Terminal until `reset`. No further evaluate or draw happens.
    pub fn stop(&mut self) {
        if matches!(self.run_state, RunState::Running | RunState::Paused) {
            debug!(lab = self.lab.title(), "stop");
            self.scheduler.cancel();
            self.run_state = RunState::Stopped;
        }
    }

    /// Cancels the pending tick when the lab leaves the screen.
    pub fn suspend(&mut self) {
        self.scheduler.cancel();
        if self.run_state == RunState::Running {
            self.run_state = RunState::Paused;
        }
    }

    pub fn reset(&mut self) {
        self.scheduler.cancel();
        self.rng = StdRng::seed_from_u64(self.options.seed);
        self.narrator.rewind();
        match self.lab.read(&self.params) {
            Ok(params) => {
                self.state = self.lab.initial_state(&params, &mut self.rng);
                self.derived = self.lab.evaluate(&params, 0.0);
            }
            Err(err) => warn!(lab = self.lab.title(), %err, "reset could not read parameters"),
        }
        self.clock.elapsed = 0.0;
        self.clock.ticks = 0;
        self.narrative.clear();
        self.run_state = RunState::Idle;
        self.drawn_revision = None;
        info!(lab = self.lab.title(), "reset");
    }

    /// Rebuilds the explanation from the current quantities.
    pub fn explain(&mut self) {
        if let Ok(params) = self.lab.read(&self.params) {
            self.narrative = self
                .lab
                .describe(&params, &self.derived, &self.state, &mut self.narrator);
        }
    }

    pub fn readouts(&self) -> Vec<Readout> {
        match self.lab.read(&self.params) {
            Ok(params) => self.lab.readouts(&params, &self.derived, &self.state),
            Err(_) => Vec::new(),
        }
    }

    /// Host refresh callback.
    pub fn on_frame(&mut self, now: Instant, surface: &mut dyn Surface) {
        match self.run_state {
            RunState::Running => {
                if let Some(handle) = self.scheduler.due(now) {
                    self.run_tick(handle, now, surface);
                }
            }
            RunState::Idle | RunState::Paused => {
                if self.drawn_revision != Some(self.params.revision()) {
                    self.repaint(surface);
                }
            }
            RunState::Stopped => {}
        }
    }

    /// Runs one scheduled tick. A stale handle is ignored.
    pub fn run_tick(&mut self, handle: TickHandle, now: Instant, surface: &mut dyn Surface) {
        if !self.scheduler.is_current(handle) || self.run_state != RunState::Running {
            return;
        }
        if surface.viewport().is_none() {
            self.stats.skipped += 1;
            self.scheduler.arm(now);
            return;
        }
        let params = match self.lab.read(&self.params) {
            Ok(p) => p,
            Err(err) => {
                warn!(lab = self.lab.title(), %err, "skipping tick");
                self.scheduler.arm(now);
                return;
            }
        };

        let dt = self.scheduler.step(now, self.options.max_step) * self.clock.speed;
        let before = self.clock.elapsed;
        self.clock.elapsed += dt;
        self.clock.ticks += 1;

        self.lab.apply_controls(&mut self.state, &params);
        let derived = self.lab.evaluate(&params, self.clock.elapsed);
        self.stats.evaluations += 1;
        self.lab.advance(&mut self.state, &params, &derived, dt, &mut self.rng);
        self.derived = derived;

        if self.clock.ticks == 1
            || (before / NARRATIVE_PERIOD).floor() != (self.clock.elapsed / NARRATIVE_PERIOD).floor()
        {
            self.narrative = self
                .lab
                .describe(&params, &self.derived, &self.state, &mut self.narrator);
        }

        self.present(&params, surface);
        self.scheduler.arm(now);
    }

    /// Redraws without advancing time, e.g. after a parameter change while paused.
    fn repaint(&mut self, surface: &mut dyn Surface) {
        if surface.viewport().is_none() {
            return;
        }
        let Ok(params) = self.lab.read(&self.params) else { return };
        if self.run_state == RunState::Idle {
            // Before the first start the state follows the controls.
            self.rng = StdRng::seed_from_u64(self.options.seed);
            self.state = self.lab.initial_state(&params, &mut self.rng);
        } else {
            self.lab.apply_controls(&mut self.state, &params);
        }
        self.derived = self.lab.evaluate(&params, self.clock.elapsed);
        self.stats.evaluations += 1;
        self.present(&params, surface);
    }

    fn present(&mut self, params: &L::Params, surface: &mut dyn Surface) {
        let mut sketch = Sketch::new(self.lab.world());
        self.lab.draw(&self.state, params, &self.derived, &mut sketch);
        surface.present(sketch.finish());
        self.stats.draws += 1;
        self.drawn_revision = Some(self.params.revision());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    use ratatui::style::Color;

    use crate::engine::draw::{Bounds, Scene, Viewport};
    use crate::engine::params::{ParamSpec, Value};
    use crate::engine::scheduler::Cadence;

    /// Counts presented scenes; can pretend to be unmounted.
    pub(crate) struct RecordingSurface {
        pub mounted: bool,
        pub presented: usize,
        pub last: Option<Scene>,
    }

    impl RecordingSurface {
        pub(crate) fn mounted() -> Self {
            Self { mounted: true, presented: 0, last: None }
        }
    }

    impl Surface for RecordingSurface {
        fn viewport(&self) -> Option<Viewport> {
            self.mounted.then_some(Viewport { width: 80, height: 24 })
        }

        fn present(&mut self, scene: Scene) {
            self.presented += 1;
            self.last = Some(scene);
        }
    }

    /// Fills a tank at `rate` litres per second.
    struct Tank;

    #[derive(Clone, Debug)]
    struct TankParams {
        rate: f64,
    }

    #[derive(Clone, Debug, Default)]
    struct TankDerived {
        rate: f64,
    }

    #[derive(Debug, Default)]
    struct TankState {
        volume: f64,
    }

    impl Lab for Tank {
        type Params = TankParams;
        type State = TankState;
        type Derived = TankDerived;

        fn title(&self) -> &'static str {
            "Tank"
        }

        fn world(&self) -> Bounds {
            Bounds::new(10.0, 10.0)
        }

        fn controls(&self) -> Vec<ParamSpec> {
            vec![ParamSpec::number("rate", "Rate", "L/s", (0.0, 10.0, 1.0), 2.0)]
        }

        fn read(&self, store: &ParameterStore) -> Result<TankParams> {
            Ok(TankParams { rate: store.number("rate")? })
        }

        fn initial_state(&self, _: &TankParams, _: &mut StdRng) -> TankState {
            TankState::default()
        }

        fn evaluate(&self, params: &TankParams, _: f64) -> TankDerived {
            TankDerived { rate: params.rate }
        }

        fn advance(&self, state: &mut TankState, _: &TankParams, d: &TankDerived, dt: f64, _: &mut StdRng) {
            state.volume += d.rate * dt;
        }

        fn draw(&self, state: &TankState, _: &TankParams, _: &TankDerived, sketch: &mut Sketch) {
            sketch.fill_rect((0.0, 0.0), 10.0, state.volume.min(10.0), Color::Blue);
        }

        fn describe(&self, _: &TankParams, d: &TankDerived, _: &TankState, n: &mut Narrator) -> Vec<String> {
            vec![format!("{} {}", n.pick(&["filling at", "flow"]), d.rate)]
        }

        fn readouts(&self, _: &TankParams, _: &TankDerived, s: &TankState) -> Vec<Readout> {
            vec![Readout::new("Volume", format!("{:.2}", s.volume))]
        }
    }

    struct SlowTank;

    impl Lab for SlowTank {
        type Params = TankParams;
        type State = TankState;
        type Derived = TankDerived;
        fn title(&self) -> &'static str { "Slow tank" }
        fn cadence(&self) -> Cadence { Cadence::Every(Duration::from_secs(1)) }
        fn world(&self) -> Bounds { Tank.world() }
        fn controls(&self) -> Vec<ParamSpec> { Tank.controls() }
        fn read(&self, s: &ParameterStore) -> Result<TankParams> { Tank.read(s) }
        fn initial_state(&self, p: &TankParams, r: &mut StdRng) -> TankState { Tank.initial_state(p, r) }
        fn evaluate(&self, p: &TankParams, t: f64) -> TankDerived { Tank.evaluate(p, t) }
        fn advance(&self, s: &mut TankState, p: &TankParams, d: &TankDerived, dt: f64, r: &mut StdRng) {
            Tank.advance(s, p, d, dt, r)
        }
        fn draw(&self, s: &TankState, p: &TankParams, d: &TankDerived, k: &mut Sketch) { Tank.draw(s, p, d, k) }
        fn describe(&self, p: &TankParams, d: &TankDerived, s: &TankState, n: &mut Narrator) -> Vec<String> {
            Tank.describe(p, d, s, n)
        }
        fn readouts(&self, p: &TankParams, d: &TankDerived, s: &TankState) -> Vec<Readout> {
            Tank.readouts(p, d, s)
        }
    }

    pub(crate) fn frames<L: Lab>(sim: &mut Simulation<L>, surface: &mut RecordingSurface, t0: Instant, count: u64) -> Instant {
        let mut now = t0;
        for _ in 0..count {
            now += Duration::from_millis(16);
            sim.on_frame(now, surface);
        }
        now
    }

    #[test]
    fn running_ticks_accumulate_time_and_state() {
        let mut sim = Simulation::new(Tank, SimOptions::default()).unwrap();
        let mut surface = RecordingSurface::mounted();
        let t0 = Instant::now();
        sim.start(t0);
        frames(&mut sim, &mut surface, t0, 11);
        // First tick covers no time, the next ten cover 16 ms each.
        assert!((sim.clock().elapsed - 0.16).abs() < 1e-9);
        assert!((sim.state().volume - 0.32).abs() < 1e-9);
        assert_eq!(sim.stats().draws, 11);
        assert_eq!(surface.presented, 11);
        assert!(!sim.narrative().is_empty());
    }

    #[test]
    fn stop_halts_all_evaluation_and_drawing() {
        let mut sim = Simulation::new(Tank, SimOptions::default()).unwrap();
        let mut surface = RecordingSurface::mounted();
        let t0 = Instant::now();
        sim.start(t0);
        let now = frames(&mut sim, &mut surface, t0, 5);
        sim.stop();
        let stats = sim.stats();
        let presented = surface.presented;

        sim.set("rate", Value::Number(7.0)).unwrap();
        frames(&mut sim, &mut surface, now, 100);
        assert_eq!(sim.stats(), stats);
        assert_eq!(surface.presented, presented);
        assert_eq!(sim.run_state(), RunState::Stopped);

        sim.start(now);
        assert_eq!(sim.run_state(), RunState::Stopped);
    }

    #[test]
    fn stale_handle_has_no_side_effects() {
        let mut sim = Simulation::new(Tank, SimOptions::default()).unwrap();
        let mut surface = RecordingSurface::mounted();
        let t0 = Instant::now();
        sim.start(t0);
        let stale = sim.scheduler.due(t0).unwrap();
        sim.pause();
        sim.start(t0);
        let before = sim.stats();
        sim.run_tick(stale, t0 + Duration::from_millis(16), &mut surface);
        assert_eq!(sim.stats(), before);
        assert_eq!(sim.clock().ticks, 0);
    }

    #[test]
    fn missing_surface_skips_the_frame_and_retries() {
        let mut sim = Simulation::new(Tank, SimOptions::default()).unwrap();
        let mut surface = RecordingSurface { mounted: false, presented: 0, last: None };
        let t0 = Instant::now();
        sim.start(t0);
        let now = frames(&mut sim, &mut surface, t0, 3);
        assert_eq!(sim.stats().evaluations, 0);
        assert_eq!(sim.stats().skipped, 3);
        assert!(sim.is_tick_pending());

        surface.mounted = true;
        frames(&mut sim, &mut surface, now, 1);
        assert_eq!(sim.stats().draws, 1);
    }

    #[test]
    fn reset_clears_time_and_accumulators() {
        let mut sim = Simulation::new(Tank, SimOptions::default()).unwrap();
        let mut surface = RecordingSurface::mounted();
        let t0 = Instant::now();
        sim.start(t0);
        frames(&mut sim, &mut surface, t0, 200);
        assert!(sim.state().volume > 0.0);

        sim.reset();
        assert_eq!(sim.clock().elapsed, 0.0);
        assert_eq!(sim.clock().ticks, 0);
        assert_eq!(sim.state().volume, 0.0);
        assert_eq!(sim.run_state(), RunState::Idle);
        assert!(!sim.is_tick_pending());
        assert!(sim.narrative().is_empty());
    }

    #[test]
    fn paused_simulation_repaints_once_per_parameter_change() {
        let mut sim = Simulation::new(Tank, SimOptions::default()).unwrap();
        let mut surface = RecordingSurface::mounted();
        let t0 = Instant::now();
        sim.start(t0);
        let now = frames(&mut sim, &mut surface, t0, 3);
        sim.pause();
        let draws = sim.stats().draws;
        let elapsed = sim.clock().elapsed;

        let now = frames(&mut sim, &mut surface, now, 10);
        assert_eq!(sim.stats().draws, draws);

        sim.set("rate", Value::Number(5.0)).unwrap();
        frames(&mut sim, &mut surface, now, 10);
        assert_eq!(sim.stats().draws, draws + 1);
        assert_eq!(sim.derived().rate, 5.0);
        assert_eq!(sim.clock().elapsed, elapsed);
    }

    #[test]
    fn idle_simulation_paints_once_mounted() {
        let mut sim = Simulation::new(Tank, SimOptions::default()).unwrap();
        let mut surface = RecordingSurface::mounted();
        frames(&mut sim, &mut surface, Instant::now(), 5);
        assert_eq!(surface.presented, 1);
        assert_eq!(sim.clock().ticks, 0);
    }

    #[test]
    fn suspend_cancels_pending_tick() {
        let mut sim = Simulation::new(Tank, SimOptions::default()).unwrap();
        let t0 = Instant::now();
        sim.start(t0);
        assert!(sim.is_tick_pending());
        sim.suspend();
        assert!(!sim.is_tick_pending());
        assert_eq!(sim.run_state(), RunState::Paused);
    }

    #[test]
    fn interval_cadence_advances_one_second_per_tick() {
        let mut sim = Simulation::new(SlowTank, SimOptions::default()).unwrap();
        let mut surface = RecordingSurface::mounted();
        let t0 = Instant::now();
        sim.start(t0);
        frames(&mut sim, &mut surface, t0, 30);
        assert_eq!(sim.clock().ticks, 0);
        let mut now = t0;
        for _ in 0..4 {
            now += Duration::from_secs(1);
            sim.on_frame(now, &mut surface);
        }
        assert_eq!(sim.clock().ticks, 4);
        assert!((sim.clock().elapsed - 4.0).abs() < 1e-12);
        assert!((sim.state().volume - 8.0).abs() < 1e-12);
    }

    #[test]
    fn speed_multiplier_scales_and_clamps() {
        let mut sim = Simulation::new(SlowTank, SimOptions::default()).unwrap();
        let mut surface = RecordingSurface::mounted();
        sim.set_speed(2.0);
        let t0 = Instant::now();
        sim.start(t0);
        sim.on_frame(t0 + Duration::from_secs(1), &mut surface);
        assert!((sim.clock().elapsed - 2.0).abs() < 1e-12);

        sim.set_speed(50.0);
        assert_eq!(sim.clock().speed, MAX_SPEED);
        sim.set_speed(f64::NAN);
        assert_eq!(sim.clock().speed, MAX_SPEED);
    }
}
