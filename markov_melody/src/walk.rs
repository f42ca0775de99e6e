// Random walk over a transition model.
//
// Starting from a seed history, each step looks up the distribution for the
// current window, makes one categorical draw with `WeightedIndex`, and slides
// the window: the oldest state drops out, the drawn state goes in.
//
// `Walker` holds the window and yields one drawn state per step;
// `sample_sequence` runs a walker for a fixed number of steps and returns the
// seed followed by every drawn state.
//
// A lookup miss is reported as `UnknownHistory`. A model built for the same
// `num_states` and `order` covers every window the walk can reach, so a miss
// means the caller paired a model with the wrong seed.

use crate::error::{MarkovError, Result};
use crate::markov::{History, TransitionModel};
use log::{debug, trace};
use rand::Rng;
use rand::distr::weighted::WeightedIndex;

/// Step-by-step walk over a model, owning its sliding history window.
pub struct Walker<'a, R: Rng> {
    model: &'a TransitionModel,
    window: History,
    rng: R,
}

impl<'a, R: Rng> Walker<'a, R> {
    /// Start a walk at `init`. `init` must be exactly `model.order()` long.
    pub fn new(model: &'a TransitionModel, init: History, rng: R) -> Result<Self> {
        if init.len() != model.order() {
            return Err(MarkovError::InvalidParameter(format!(
                "initial history {init} has length {}, expected {}",
                init.len(),
                model.order()
            )));
        }
        Ok(Self {
            model,
            window: init,
            rng,
        })
    }

    /// The current history window.
    pub fn window(&self) -> &History {
        &self.window
    }

    /// Draw the next state and slide the window.
    pub fn step(&mut self) -> Result<usize> {
        let distribution = self
            .model
            .get(&self.window)
            .ok_or_else(|| MarkovError::UnknownHistory {
                history: self.window.clone(),
            })?;
        let index = self.rng.sample(WeightedIndex::new(distribution.weights())?);
        let next = distribution.symbols()[index];
        trace!("{} -> {next}", self.window);
        self.window = self.window.shifted(next);
        Ok(next)
    }
}

impl<R: Rng> Iterator for Walker<'_, R> {
    type Item = Result<usize>;

    /// Never ends on its own; bound it with `take`.
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.step())
    }
}

/// Walk `steps` transitions from `init` and return `init` followed by every
/// drawn state (length `order + steps`).
///
/// `order` must match the model. No state is drawn and the model is not
/// consulted when `steps` is zero.
pub fn sample_sequence<R: Rng>(
    model: &TransitionModel,
    order: usize,
    init: &History,
    steps: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    if order != model.order() {
        return Err(MarkovError::InvalidParameter(format!(
            "order {order} does not match the model's order {}",
            model.order()
        )));
    }
    let mut walker = Walker::new(model, init.clone(), rng)?;
    let mut sequence = Vec::with_capacity(order.saturating_add(steps));
    sequence.extend_from_slice(init.as_slice());
    for _ in 0..steps {
        sequence.push(walker.step()?);
    }
    debug!("sampled {steps} steps from {init}");
    Ok(sequence)
}
