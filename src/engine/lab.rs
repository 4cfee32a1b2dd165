use std::fmt;

use rand::rngs::StdRng;

use crate::engine::draw::{Bounds, Sketch};
use crate::engine::narrative::Narrator;
use crate::engine::params::{ParamSpec, ParameterStore};
use crate::engine::scheduler::Cadence;
use crate::error::Result;

/// One labelled quantity for the status bar.
#[derive(Clone, Debug, PartialEq)]
pub struct Readout {
    pub label: &'static str,
    pub value: String,
}

impl Readout {
    pub fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self { label, value: value.into() }
    }
}

/// What a lab supplies to the shared simulation engine: its controls,
/// its formula, its state update, its drawing and its narrative.
pub trait Lab {
    type Params: Clone + fmt::Debug;
    type State;
    type Derived: Clone + fmt::Debug + Default;

    fn title(&self) -> &'static str;

    fn cadence(&self) -> Cadence {
        Cadence::Frame
    }

    /// World coordinates the draw routine works in.
    fn world(&self) -> Bounds;

    fn controls(&self) -> Vec<ParamSpec>;

    /// Reads the typed parameter set out of the store.
    fn read(&self, store: &ParameterStore) -> Result<Self::Params>;

    fn initial_state(&self, params: &Self::Params, rng: &mut StdRng) -> Self::State;

    /// Folds control edits into live state that the lab evolves on its
    /// own. Runs before every tick and on repaint once the lab has started.
    fn apply_controls(&self, _state: &mut Self::State, _params: &Self::Params) {}

    /// Pure: identical inputs give identical outputs.
    fn evaluate(&self, params: &Self::Params, elapsed: f64) -> Self::Derived;

    /// Integrates accumulators and moves particles by `dt` simulated seconds.
    fn advance(
        &self,
        state: &mut Self::State,
        params: &Self::Params,
        derived: &Self::Derived,
        dt: f64,
        rng: &mut StdRng,
    );

    fn draw(
        &self,
        state: &Self::State,
        params: &Self::Params,
        derived: &Self::Derived,
        sketch: &mut Sketch,
    );

    fn describe(
        &self,
        params: &Self::Params,
        derived: &Self::Derived,
        state: &Self::State,
        narrator: &mut Narrator,
    ) -> Vec<String>;

    fn readouts(
        &self,
        params: &Self::Params,
        derived: &Self::Derived,
        state: &Self::State,
    ) -> Vec<Readout>;
}
