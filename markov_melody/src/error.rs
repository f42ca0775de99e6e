// Error type shared by every module of the crate.
//
// Chain construction and sampling either succeed completely or fail with one
// of these variants; there is no partial model and no truncated sequence.
// `UnknownHistory` means the model and the walk disagree about the history
// space and is never retried.

use crate::markov::History;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkovError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Every resample of this history's weights summed to zero.
    #[error("degenerate distribution for history {history}: all weight draws summed to zero")]
    DegenerateDistribution { history: History },

    /// The walk reached a history the model has no entry for.
    #[error("history {history} is not in the transition model")]
    UnknownHistory { history: History },

    #[error("history {history} is not a length-{order} history over {num_states} states")]
    InvalidHistory {
        history: History,
        num_states: usize,
        order: usize,
    },

    #[error("history {history} appears more than once")]
    DuplicateHistory { history: History },

    #[error("transition model covers {actual} of {expected} histories")]
    IncompleteModel { expected: usize, actual: usize },

    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("weighted choice failed: {0}")]
    Weighted(#[from] rand::distr::weighted::Error),

    #[error("symbol {symbol} has no pitch in the scale")]
    UnmappedSymbol { symbol: usize },

    #[error("pitch {pitch} is outside the MIDI range 0..=127")]
    PitchOutOfRange { pitch: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MarkovError>;
