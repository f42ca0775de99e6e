// Markov Melody Generator
//
// Builds a randomly initialized fixed-order Markov chain over a small state
// alphabet, walks it from a seed history, maps the walk onto pitches through
// a scale, and writes the result as a MIDI file.
//
// Architecture:
// - markov.rs: History/Distribution/TransitionModel types and the random
//   model builders (sequential and rayon-parallel)
// - walk.rs: Sliding-window random walk over a built model
// - scale.rs: Symbol -> pitch lookup
// - midi.rs: MIDI file output via `midly`
// - config.rs: JSON-loadable generation settings
// - pipeline.rs: One-call config -> melody run
// - error.rs: Crate-wide `MarkovError`
//
// Randomness is always passed in by the caller. Given the same seed the
// generator produces the same chain and the same melody.

pub mod config;
pub mod error;
pub mod markov;
pub mod midi;
pub mod pipeline;
pub mod scale;
pub mod walk;

#[cfg(test)]
mod testing;

pub use error::{MarkovError, Result};
pub use markov::{Distribution, History, TransitionModel, build_model, build_model_parallel};
pub use walk::{Walker, sample_sequence};
