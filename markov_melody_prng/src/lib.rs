// Deterministic, portable pseudo-random number generator for melody generation.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// The generator core is hand-rolled so that a given seed produces the same
// chain and the same melody on every platform and every `rand` release. The
// `rand` crate is only used for its traits: `MelodyRng` implements `RngCore`
// and `SeedableRng`, so it plugs into anything that takes `&mut impl Rng`
// (the model builder, the walk, `WeightedIndex`).
//
// Sub-streams: `jump()` advances the state by 2^128 draws, the standard
// xoshiro256 jump polynomial. `split_streams(n)` hands out `n` generators that
// start one jump apart, so each worker of a parallel model build owns a
// non-overlapping slice of the sequence and no generator state is shared.
//
// **Critical constraint: determinism.** Every method on `MelodyRng` must
// produce identical output given the same prior state, regardless of
// platform, compiler version, or optimization level. Do not use
// floating-point arithmetic in the core generator.

use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// Xoshiro256 jump polynomial: applying it is equivalent to 2^128 calls to
/// `next_u64`.
const JUMP: [u64; 4] = [
    0x180e_c6d3_3cfd_0aba,
    0xd5a6_1266_f0c9_392c,
    0xa958_2618_e03f_c9aa,
    0x39ab_dc45_29b1_661c,
];

/// Xoshiro256++ PRNG used for chain construction and sampling.
///
/// Callers own their generator and pass it down explicitly; nothing in the
/// workspace keeps a global one. Two `MelodyRng` instances created from the
/// same seed produce identical output streams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MelodyRng {
    s: [u64; 4],
}

impl MelodyRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    fn step(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Advance the state by 2^128 draws.
    pub fn jump(&mut self) {
        let mut acc = [0u64; 4];
        for &word in &JUMP {
            for bit in 0..64 {
                if word & (1u64 << bit) != 0 {
                    for (a, s) in acc.iter_mut().zip(self.s.iter()) {
                        *a ^= *s;
                    }
                }
                self.step();
            }
        }
        self.s = acc;
    }

    /// Hand out `n` generators whose sequences do not overlap.
    ///
    /// Stream `i` starts `i` jumps past the current state. `self` ends up `n`
    /// jumps ahead, past every stream it handed out, so it can keep drawing
    /// without colliding with any of them.
    pub fn split_streams(&mut self, n: usize) -> Vec<MelodyRng> {
        let mut streams = Vec::with_capacity(n);
        for _ in 0..n {
            streams.push(self.clone());
            self.jump();
        }
        streams
    }
}

impl RngCore for MelodyRng {
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for MelodyRng {
    type Seed = [u8; 32];

    /// Use the seed bytes as the raw little-endian state. The all-zero state
    /// is a fixed point of xoshiro, so an all-zero seed falls back to
    /// `MelodyRng::new(0)`.
    fn from_seed(seed: Self::Seed) -> Self {
        let mut s = [0u64; 4];
        for (word, bytes) in s.iter_mut().zip(seed.chunks_exact(8)) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            *word = u64::from_le_bytes(buf);
        }
        if s == [0; 4] {
            return Self::new(0);
        }
        Self { s }
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

/// SplitMix64, used only for expanding a `u64` seed into the full state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_seed_same_stream() {
        let mut a = MelodyRng::new(42);
        let mut b = MelodyRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_different_output() {
        let mut a = MelodyRng::new(42);
        let mut b = MelodyRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn seed_from_u64_matches_new() {
        let mut a = MelodyRng::seed_from_u64(7);
        let mut b = MelodyRng::new(7);
        assert_eq!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn zero_seed_bytes_do_not_stall() {
        let mut rng = MelodyRng::from_seed([0; 32]);
        let first = rng.next_u64();
        let second = rng.next_u64();
        assert!(first != 0 || second != 0);
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = MelodyRng::new(12345);
        for _ in 0..10_000 {
            let v: f64 = rng.random();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn works_through_rng_extension_trait() {
        let mut rng = MelodyRng::new(99);
        for _ in 0..1000 {
            let v: f64 = rng.random();
            assert!((0.0..1.0).contains(&v));
            let i = rng.random_range(0..3usize);
            assert!(i < 3);
        }
    }

    #[test]
    fn fill_bytes_handles_partial_chunks() {
        let mut a = MelodyRng::new(5);
        let mut b = MelodyRng::new(5);
        let mut buf = [0u8; 11];
        a.fill_bytes(&mut buf);
        let first = b.next_u64().to_le_bytes();
        let second = b.next_u64().to_le_bytes();
        assert_eq!(&buf[..8], &first);
        assert_eq!(&buf[8..], &second[..3]);
    }

    #[test]
    fn jump_moves_to_a_different_stream() {
        let mut base = MelodyRng::new(1);
        let mut jumped = base.clone();
        jumped.jump();
        assert_ne!(base, jumped);
        let a: Vec<u64> = (0..16).map(|_| base.next_u64()).collect();
        let b: Vec<u64> = (0..16).map(|_| jumped.next_u64()).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn jump_is_deterministic() {
        let mut a = MelodyRng::new(2024);
        let mut b = MelodyRng::new(2024);
        a.jump();
        b.jump();
        assert_eq!(a, b);
    }

    #[test]
    fn split_streams_are_distinct_and_parent_moves_on() {
        let mut parent = MelodyRng::new(3);
        let start = parent.clone();
        let mut streams = parent.split_streams(4);
        assert_eq!(streams.len(), 4);
        assert_eq!(streams[0], start);

        let mut firsts: Vec<u64> = streams.iter_mut().map(|s| s.next_u64()).collect();
        firsts.push(parent.next_u64());
        let mut unique = firsts.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), firsts.len());
    }

    #[test]
    fn split_zero_streams_leaves_parent_untouched() {
        let mut parent = MelodyRng::new(8);
        let before = parent.clone();
        assert!(parent.split_streams(0).is_empty());
        assert_eq!(parent, before);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut rng = MelodyRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: MelodyRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
