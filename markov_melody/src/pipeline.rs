// End-to-end generation: config -> chain -> walk -> pitches.
//
// One `MelodyRng` drives the whole run. The model is drawn first and the
// walk continues from wherever model construction left the generator, so a
// seed pins down both the chain and the melody. The parallel builder
// advances the generator past all of its per-history sub-streams before the
// walk starts drawing.

use crate::config::GenerationConfig;
use crate::error::Result;
use crate::markov::{TransitionModel, build_model, build_model_parallel};
use crate::scale::map_to_pitches;
use crate::walk::sample_sequence;
use log::debug;
use markov_melody_prng::MelodyRng;

/// How the transition model gets built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Sequential,
    Parallel,
}

/// Output of one generation run.
#[derive(Debug, Clone)]
pub struct Melody {
    pub model: TransitionModel,
    pub symbols: Vec<usize>,
    pub pitches: Vec<u8>,
}

/// Validate `config`, build a chain, walk it, and map the walk to pitches.
pub fn generate(config: &GenerationConfig, rng: &mut MelodyRng, mode: BuildMode) -> Result<Melody> {
    config.validate()?;
    let model = match mode {
        BuildMode::Sequential => build_model(config.num_states, config.order, rng)?,
        BuildMode::Parallel => build_model_parallel(config.num_states, config.order, rng)?,
    };
    let symbols = sample_sequence(&model, config.order, &config.init_history(), config.steps, rng)?;
    let pitches = map_to_pitches(&symbols, &config.scale, config.base_pitch)?;
    debug!("generated {} notes from a {}-entry chain", pitches.len(), model.len());
    Ok(Melody {
        model,
        symbols,
        pitches,
    })
}
