// Generation settings.
//
// Every tunable of a run lives in `GenerationConfig`: chain shape, walk
// length, seed, scale, and MIDI timing. Loaded from JSON; any field left out
// takes its default, and the defaults describe the classic run (three
// states, order 2, seed history (0, 1), twenty steps, root/fourth/fifth on
// middle C, quarter notes at 480 ticks). The CLI layers its flags on top.

use crate::error::{MarkovError, Result};
use crate::markov::History;
use crate::midi::MidiSettings;
use crate::scale::{DEFAULT_BASE_PITCH, Scale};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Size of the state alphabet.
    pub num_states: usize,
    /// History length.
    pub order: usize,
    /// Seed history; must be `order` states long.
    pub init: Vec<usize>,
    /// Number of states to draw after the seed history.
    pub steps: usize,
    /// RNG seed. `None` picks one at random.
    pub seed: Option<u64>,
    /// Semitone offset per symbol; needs at least `num_states` entries.
    pub scale: Scale,
    pub base_pitch: u8,
    pub midi: MidiSettings,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            num_states: 3,
            order: 2,
            init: vec![0, 1],
            steps: 20,
            seed: None,
            scale: Scale::default_triad(),
            base_pitch: DEFAULT_BASE_PITCH,
            midi: MidiSettings::default(),
        }
    }
}

impl GenerationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn init_history(&self) -> History {
        History::from(self.init.as_slice())
    }

    /// Check that the settings describe a run that can succeed end to end.
    pub fn validate(&self) -> Result<()> {
        crate::markov::history_count(self.num_states, self.order)?;
        let init = self.init_history();
        if !init.fits(self.num_states, self.order) {
            return Err(MarkovError::InvalidHistory {
                history: init,
                num_states: self.num_states,
                order: self.order,
            });
        }
        if self.scale.len() < self.num_states {
            return Err(MarkovError::InvalidParameter(format!(
                "scale has {} offsets but the chain has {} states",
                self.scale.len(),
                self.num_states
            )));
        }
        if let Some(top) = self.scale.offsets()[..self.num_states].iter().max() {
            let highest = u32::from(self.base_pitch) + u32::from(*top);
            if highest > 127 {
                return Err(MarkovError::PitchOutOfRange { pitch: highest });
            }
        }
        self.midi.validate()
    }
}
