// Stub random sources for unit tests.
//
// `rand`'s `StandardUniform` turns a `u64` draw `x` into the `f64`
// `(x >> 11) * 2^-53`, so a source that returns 0 yields weight 0.0 and one
// that returns `1 << 63` yields 0.5.

use rand::RngCore;
use std::collections::VecDeque;

/// Returns the same `u64` forever.
pub(crate) struct ConstantRng(pub u64);

impl RngCore for ConstantRng {
    fn next_u32(&mut self) -> u32 {
        (self.0 >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.0
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.0.to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Plays back a fixed script of `u64` draws, then repeats `fallback`.
pub(crate) struct ScriptedRng {
    script: VecDeque<u64>,
    fallback: u64,
    pub draws: usize,
}

impl ScriptedRng {
    pub(crate) fn new(script: &[u64], fallback: u64) -> Self {
        Self {
            script: script.iter().copied().collect(),
            fallback,
            draws: 0,
        }
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.draws += 1;
        self.script.pop_front().unwrap_or(self.fallback)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}
