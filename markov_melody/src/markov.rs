// Randomly initialized fixed-order Markov transition model.
//
// A model of order `k` over `n` states maps every length-`k` history (all
// `n^k` of them) to a probability distribution over the `n` next states.
// There is no learning step: each distribution is synthesized by drawing `n`
// uniform weights from the caller's random source and normalizing them.
//
// Types:
// - `History`: the length-`k` context window, used as a structural map key.
// - `Distribution`: the `(symbols, weights)` pair for one history.
// - `TransitionModel`: the read-only history -> distribution table.
//
// Invariants are enforced when a model is constructed, never at lookup time:
// total coverage (every history present exactly once) and normalization
// (weights non-negative, summing to 1 within `NORMALIZATION_TOLERANCE`).
// After construction the model is immutable.
//
// Builders:
// - `build_model`: sequential, draws from one `&mut impl Rng`.
// - `build_model_parallel`: one `MelodyRng` sub-stream per fixed-size chunk
//   of histories, chunks built with rayon. Deterministic for a given
//   generator state, whatever the thread count.
// - `TransitionModel::from_distributions`: validated assembly from explicit
//   entries (fixed test models, hand-written chains).
//
// The walk over a built model lives in `walk.rs`.

use crate::error::{MarkovError, Result};
use log::{debug, warn};
use markov_melody_prng::MelodyRng;
use rand::Rng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

/// Maximum allowed deviation of a distribution's weight sum from 1.0.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-9;

/// How many times a history's weights are redrawn before giving up on a
/// zero-sum draw.
pub const MAX_RESAMPLE_ATTEMPTS: usize = 8;

/// Upper bound on `num_states^order`. Larger history spaces are rejected
/// before any entropy is consumed.
pub const MAX_HISTORIES: usize = 1 << 24;

/// Number of consecutive histories that share one sub-stream in
/// `build_model_parallel`.
pub const HISTORIES_PER_STREAM: usize = 1024;

/// A fixed-length window of recent states.
///
/// Compares, hashes, and orders structurally (lexicographically), so it can
/// key a map directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct History(Box<[usize]>);

impl History {
    pub fn new(states: Vec<usize>) -> Self {
        History(states.into_boxed_slice())
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.0.iter()
    }

    /// The next window: drops the oldest state and appends `next`, keeping
    /// the length unchanged.
    pub fn shifted(&self, next: usize) -> History {
        if self.0.is_empty() {
            return self.clone();
        }
        self.0
            .iter()
            .skip(1)
            .copied()
            .chain(std::iter::once(next))
            .collect()
    }

    /// True if this is a length-`order` history over `0..num_states`.
    pub fn fits(&self, num_states: usize, order: usize) -> bool {
        self.len() == order && self.iter().all(|&s| s < num_states)
    }
}

impl From<Vec<usize>> for History {
    fn from(states: Vec<usize>) -> Self {
        History::new(states)
    }
}

impl From<&[usize]> for History {
    fn from(states: &[usize]) -> Self {
        History(states.into())
    }
}

impl<const N: usize> From<[usize; N]> for History {
    fn from(states: [usize; N]) -> Self {
        History(Box::new(states))
    }
}

impl FromIterator<usize> for History {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        History(iter.into_iter().collect())
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, state) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{state}")?;
        }
        write!(f, ")")
    }
}

/// Next-state probabilities for one history.
///
/// `symbols` is always `0..len`; `weights[i]` is the probability of moving
/// to `symbols[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    symbols: Vec<usize>,
    weights: Vec<f64>,
}

impl Distribution {
    /// Wrap already-normalized weights, checking that they form a valid
    /// probability distribution.
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(MarkovError::InvalidDistribution(
                "distribution has no weights".into(),
            ));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(MarkovError::InvalidDistribution(format!(
                "weight {bad} is not a finite non-negative number"
            )));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > NORMALIZATION_TOLERANCE {
            return Err(MarkovError::InvalidDistribution(format!(
                "weights sum to {total}, expected 1.0"
            )));
        }
        Ok(Self {
            symbols: (0..weights.len()).collect(),
            weights,
        })
    }

    /// Normalize raw non-negative weights by their sum.
    ///
    /// Returns `None` when the sum is zero or not finite, or when any raw
    /// weight is negative or not finite.
    pub fn normalized(raw: &[f64]) -> Option<Self> {
        if raw.is_empty() || raw.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return None;
        }
        let total: f64 = raw.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        let weights: Vec<f64> = raw.iter().map(|w| w / total).collect();
        debug_assert!(
            (weights.iter().sum::<f64>() - 1.0).abs() <= NORMALIZATION_TOLERANCE,
            "normalized weights do not sum to 1"
        );
        Some(Self {
            symbols: (0..raw.len()).collect(),
            weights,
        })
    }

    pub fn symbols(&self) -> &[usize] {
        &self.symbols
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Probability of moving to `symbol`, or `None` outside the alphabet.
    pub fn probability(&self, symbol: usize) -> Option<f64> {
        self.weights.get(symbol).copied()
    }
}

/// Complete, normalized, read-only transition table.
#[derive(Debug, Clone)]
pub struct TransitionModel {
    num_states: usize,
    order: usize,
    entries: BTreeMap<History, Distribution>,
}

impl TransitionModel {
    /// Assemble a model from explicit entries.
    ///
    /// Every history must be a valid length-`order` history over
    /// `0..num_states`, appear once, and carry a distribution over exactly
    /// `num_states` symbols. Coverage must be total.
    pub fn from_distributions<I>(num_states: usize, order: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (History, Distribution)>,
    {
        let expected = history_count(num_states, order)?;
        let mut table = BTreeMap::new();
        for (history, distribution) in entries {
            if !history.fits(num_states, order) {
                return Err(MarkovError::InvalidHistory {
                    history,
                    num_states,
                    order,
                });
            }
            if distribution.len() != num_states {
                return Err(MarkovError::InvalidDistribution(format!(
                    "history {history} has {} weights, expected {num_states}",
                    distribution.len()
                )));
            }
            if table.contains_key(&history) {
                return Err(MarkovError::DuplicateHistory { history });
            }
            table.insert(history, distribution);
        }
        // All keys are distinct valid histories, so a full count means full
        // coverage.
        if table.len() != expected {
            return Err(MarkovError::IncompleteModel {
                expected,
                actual: table.len(),
            });
        }
        Ok(Self {
            num_states,
            order,
            entries: table,
        })
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of histories, always `num_states^order`.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, history: &History) -> Option<&Distribution> {
        self.entries.get(history)
    }

    /// Entries in lexicographic history order.
    pub fn iter(&self) -> impl Iterator<Item = (&History, &Distribution)> {
        self.entries.iter()
    }

    /// P(next | history), or `None` if either is outside the model.
    pub fn probability(&self, history: &History, next: usize) -> Option<f64> {
        self.entries.get(history)?.probability(next)
    }

    /// The chain as flat `(history, next, probability)` rows, one per
    /// history/next-state pair.
    pub fn flat_probabilities(&self) -> impl Iterator<Item = (&History, usize, f64)> {
        self.entries.iter().flat_map(|(history, distribution)| {
            distribution
                .symbols()
                .iter()
                .zip(distribution.weights())
                .map(move |(&symbol, &weight)| (history, symbol, weight))
        })
    }
}

/// Every length-`order` history over `0..num_states`, in lexicographic
/// order, each exactly once.
pub struct Histories {
    num_states: usize,
    next: Option<Vec<usize>>,
}

impl Histories {
    pub fn new(num_states: usize, order: usize) -> Self {
        let next = (num_states > 0 && order > 0).then(|| vec![0; order]);
        Self { num_states, next }
    }
}

impl Iterator for Histories {
    type Item = History;

    fn next(&mut self) -> Option<History> {
        let current = self.next.take()?;
        let mut successor = current.clone();
        // Odometer increment: bump the last digit, carry leftward.
        let mut wrapped = true;
        for digit in successor.iter_mut().rev() {
            *digit += 1;
            if *digit < self.num_states {
                wrapped = false;
                break;
            }
            *digit = 0;
        }
        if !wrapped {
            self.next = Some(successor);
        }
        Some(History::new(current))
    }
}

/// Validate the parameters and return `num_states^order`.
pub fn history_count(num_states: usize, order: usize) -> Result<usize> {
    if num_states == 0 {
        return Err(MarkovError::InvalidParameter(
            "num_states must be at least 1".into(),
        ));
    }
    if order == 0 {
        return Err(MarkovError::InvalidParameter(
            "order must be at least 1".into(),
        ));
    }
    u32::try_from(order)
        .ok()
        .and_then(|order| num_states.checked_pow(order))
        .filter(|&count| count <= MAX_HISTORIES)
        .ok_or_else(|| {
            MarkovError::InvalidParameter(format!(
                "{num_states}^{order} histories exceeds the limit of {MAX_HISTORIES}"
            ))
        })
}

/// Build a random transition model over `num_states` states with histories
/// of length `order`.
///
/// Histories are visited in lexicographic order and each draws `num_states`
/// uniform weights in [0, 1) from `rng`, so the same generator state always
/// yields the same model.
pub fn build_model<R: Rng>(
    num_states: usize,
    order: usize,
    rng: &mut R,
) -> Result<TransitionModel> {
    let expected = history_count(num_states, order)?;
    let mut entries = BTreeMap::new();
    for history in Histories::new(num_states, order) {
        let distribution = draw_distribution(&history, num_states, rng)?;
        entries.insert(history, distribution);
    }
    debug_assert_eq!(entries.len(), expected);
    debug!("built transition model: {num_states} states, order {order}, {expected} histories");
    Ok(TransitionModel {
        num_states,
        order,
        entries,
    })
}

/// Build a random transition model in parallel.
///
/// Histories are split, in lexicographic order, into chunks of
/// `HISTORIES_PER_STREAM`. Chunk `i` draws from sub-stream `i` of `rng` (see
/// `MelodyRng::split_streams`), so the result depends only on `rng`'s state
/// and not on how rayon schedules the chunks. `rng` is left past every
/// sub-stream.
pub fn build_model_parallel(
    num_states: usize,
    order: usize,
    rng: &mut MelodyRng,
) -> Result<TransitionModel> {
    let expected = history_count(num_states, order)?;
    let histories: Vec<History> = Histories::new(num_states, order).collect();
    let streams = rng.split_streams(expected.div_ceil(HISTORIES_PER_STREAM));
    let chunks = histories
        .into_par_iter()
        .chunks(HISTORIES_PER_STREAM)
        .zip(streams.into_par_iter())
        .map(|(chunk, mut stream)| {
            chunk
                .into_iter()
                .map(|history| -> Result<(History, Distribution)> {
                    let distribution = draw_distribution(&history, num_states, &mut stream)?;
                    Ok((history, distribution))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    let entries: BTreeMap<History, Distribution> = chunks.into_iter().flatten().collect();
    debug!(
        "built transition model in parallel: {num_states} states, order {order}, {expected} histories"
    );
    Ok(TransitionModel {
        num_states,
        order,
        entries,
    })
}

fn draw_distribution<R: Rng>(
    history: &History,
    num_states: usize,
    rng: &mut R,
) -> Result<Distribution> {
    let mut raw = vec![0.0f64; num_states];
    for attempt in 1..=MAX_RESAMPLE_ATTEMPTS {
        for weight in raw.iter_mut() {
            *weight = rng.random::<f64>();
        }
        if let Some(distribution) = Distribution::normalized(&raw) {
            return Ok(distribution);
        }
        warn!("weights for history {history} summed to zero (attempt {attempt}), resampling");
    }
    Err(MarkovError::DegenerateDistribution {
        history: history.clone(),
    })
}
