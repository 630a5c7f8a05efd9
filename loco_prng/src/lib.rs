// Deterministic, portable pseudo-random number generator.
//
// xoshiro256++ (Blackman & Vigna, 2019) seeded through SplitMix64. The
// train simulation draws every random decision from one `GameRng` owned by
// `SimState`, so two runs with the same seed and the same commands produce
// the same breakdown sounds tick for tick, and a saved game resumes the exact
// same stream after load.
//
// **Critical constraint: determinism.** Every method must produce identical
// output given the same prior state on every platform. No floating point in
// the integer paths, no OS entropy, no stdlib hashing.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG, the simulation's only source of randomness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    s: [u64; 4],
}

impl GameRng {
    /// Create a generator from a `u64` seed.
    ///
    /// SplitMix64 expands the seed into the 256-bit state, so nearby seeds
    /// still give unrelated streams.
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

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
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

    /// Upper 32 bits of the next `u64`.
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform integer in `[low, high)`, rejection-sampled so small ranges
    /// carry no modulo bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `u8` in `[low, high)`. Used for picking sound ids.
    ///
    /// Panics if `low >= high`.
    pub fn range_u8(&mut self, low: u8, high: u8) -> u8 {
        self.range_u64(low as u64, high as u64) as u8
    }
}

/// SplitMix64 step, only used to expand the seed.
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

    #[test]
    fn same_seed_same_stream() {
        let mut a = GameRng::new(7);
        let mut b = GameRng::new(7);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn neighbouring_seeds_diverge() {
        let mut a = GameRng::new(7);
        let mut b = GameRng::new(8);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn range_u8_covers_breakdown_sound_ids() {
        let mut rng = GameRng::new(2024);
        let mut seen = [false; 5];
        for _ in 0..10_000 {
            let v = rng.range_u8(26, 31);
            assert!((26..31).contains(&v), "sound id out of range: {v}");
            seen[(v - 26) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "every id should be drawn: {seen:?}");
    }

    #[test]
    fn range_u64_power_of_two_fast_path() {
        let mut rng = GameRng::new(3);
        for _ in 0..1000 {
            let v = rng.range_u64(100, 108);
            assert!((100..108).contains(&v));
        }
    }

    #[test]
    #[should_panic(expected = "low must be less than high")]
    fn empty_range_panics() {
        let mut rng = GameRng::new(1);
        rng.range_u8(5, 5);
    }

    #[test]
    fn resumes_after_json_roundtrip() {
        let mut rng = GameRng::new(99);
        for _ in 0..37 {
            rng.next_u32();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: GameRng = serde_json::from_str(&json).unwrap();
        assert_eq!(rng, restored);
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
