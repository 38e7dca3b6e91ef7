//! Deterministic pseudo-random stream.
//!
//! [`RandomStream`] is a Mulberry32 generator: a 32-bit state advanced by a
//! fixed odd increment and mixed into a float in `[0, 1)`. The output is a pure
//! function of the seed and the number of draws taken so far.

/// Increment added to the state before every draw.
const INCREMENT: u32 = 0x6D2B_79F5;

/// Normalizer mapping a `u32` into `[0, 1)`.
const TWO_POW_32: f64 = 4_294_967_296.0;

/// A reproducible stream of floats in `[0, 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomStream {
    seed: u32,
    state: u32,
    draws: u64,
}

impl RandomStream {
    /// Start a fresh stream for `seed`.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self {
            seed,
            state: seed,
            draws: 0,
        }
    }

    /// Seed this stream was created with.
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Number of values drawn since the stream was created or reset.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    /// Rewind to the first value of the seed.
    pub fn reset(&mut self) {
        self.state = self.seed;
        self.draws = 0;
    }

    /// Next float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        self.draws += 1;
        f64::from(t ^ (t >> 14)) / TWO_POW_32
    }

    /// Next float in `[lo, hi)`.
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Next float in `[-spread / 2, spread / 2)`, i.e. `(r - 0.5) * spread`.
    pub fn centered(&mut self, spread: f64) -> f64 {
        (self.next_f64() - 0.5) * spread
    }

    /// Next index in `0..n`. Returns 0 when `n` is 0 (still consuming a draw).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn index(&mut self, n: usize) -> usize {
        let r = self.next_f64();
        if n == 0 {
            return 0;
        }
        ((r * n as f64).floor() as usize).min(n - 1)
    }

    /// True when the next draw is greater than `threshold`.
    pub fn above(&mut self, threshold: f64) -> bool {
        self.next_f64() > threshold
    }
}

impl Iterator for RandomStream {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-15
    }

    #[test]
    fn golden_values_seed_42() {
        let mut stream = RandomStream::new(42);
        assert!(close(stream.next_f64(), 0.601_103_751_920_163_6));
        assert!(close(stream.next_f64(), 0.448_290_558_997_541_67));
        assert!(close(stream.next_f64(), 0.852_465_793_490_409_9));
    }

    #[test]
    fn golden_values_default_seed() {
        let mut stream = RandomStream::new(12345);
        assert!(close(stream.next_f64(), 0.979_728_267_760_947_3));
        assert!(close(stream.next_f64(), 0.306_752_264_499_664_3));
        assert!(close(stream.next_f64(), 0.484_205_421_525_985));
    }

    #[test]
    fn golden_values_seed_zero() {
        let mut stream = RandomStream::new(0);
        assert!(close(stream.next_f64(), 0.266_429_208_684_712_65));
        assert!(close(stream.next_f64(), 0.000_329_745_700_582_861_9));
        assert!(close(stream.next_f64(), 0.223_272_027_447_819_7));
    }

    #[test]
    fn reset_replays() {
        let mut stream = RandomStream::new(7);
        let first: Vec<f64> = stream.by_ref().take(10).collect();
        assert_eq!(stream.draws(), 10);
        stream.reset();
        assert_eq!(stream.draws(), 0);
        let second: Vec<f64> = stream.take(10).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn no_repeat_within_particle_budget() {
        let mut stream = RandomStream::new(12345);
        let mut values: Vec<u64> = (0..5000).map(|_| stream.next_f64().to_bits()).collect();
        values.sort_unstable();
        values.dedup();
        assert!(values.len() > 4990);
    }

    #[test]
    fn index_zero_consumes_draw() {
        let mut stream = RandomStream::new(1);
        assert_eq!(stream.index(0), 0);
        assert_eq!(stream.draws(), 1);
    }

    proptest! {
        #[test]
        fn values_in_unit_interval(seed in any::<u32>()) {
            let mut stream = RandomStream::new(seed);
            for _ in 0..64 {
                let v = stream.next_f64();
                prop_assert!((0.0..1.0).contains(&v));
            }
        }

        #[test]
        fn same_seed_same_sequence(seed in any::<u32>(), n in 1usize..256) {
            let a: Vec<f64> = RandomStream::new(seed).take(n).collect();
            let b: Vec<f64> = RandomStream::new(seed).take(n).collect();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn index_in_bounds(seed in any::<u32>(), n in 1usize..100) {
            let mut stream = RandomStream::new(seed);
            prop_assert!(stream.index(n) < n);
        }
    }
}
