// Symbol-to-pitch mapping.
//
// A `Scale` is a fixed lookup table of semitone offsets indexed by chain
// symbol; a melody is the base pitch plus the offset of each symbol. The
// default triad `[0, 5, 7]` maps symbols 0, 1, 2 to the root, fourth, and
// fifth above the base.

use crate::error::{MarkovError, Result};
use serde::{Deserialize, Serialize};

/// Middle C.
pub const DEFAULT_BASE_PITCH: u8 = 60;

/// Highest MIDI note number.
const MAX_PITCH: u32 = 127;

/// Semitone offsets, indexed by symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scale {
    offsets: Vec<u8>,
}

impl Scale {
    pub fn new(offsets: Vec<u8>) -> Result<Self> {
        if offsets.is_empty() {
            return Err(MarkovError::InvalidParameter(
                "scale needs at least one offset".into(),
            ));
        }
        Ok(Self { offsets })
    }

    /// Root, fourth, fifth.
    pub fn default_triad() -> Self {
        Self {
            offsets: vec![0, 5, 7],
        }
    }

    pub fn offset(&self, symbol: usize) -> Option<u8> {
        self.offsets.get(symbol).copied()
    }

    pub fn offsets(&self) -> &[u8] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::default_triad()
    }
}

/// Map each symbol to `base_pitch + scale offset`.
pub fn map_to_pitches(symbols: &[usize], scale: &Scale, base_pitch: u8) -> Result<Vec<u8>> {
    symbols
        .iter()
        .map(|&symbol| -> Result<u8> {
            let offset = scale
                .offset(symbol)
                .ok_or(MarkovError::UnmappedSymbol { symbol })?;
            let pitch = u32::from(base_pitch) + u32::from(offset);
            if pitch > MAX_PITCH {
                return Err(MarkovError::PitchOutOfRange { pitch });
            }
            Ok(pitch as u8)
        })
        .collect()
}
