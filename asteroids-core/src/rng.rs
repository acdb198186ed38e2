use core::f64::consts::TAU;

use rand::{rngs::StdRng, RngCore, SeedableRng};

/// Source of randomness handed to the simulation.
///
/// A session is built with two of these: a gameplay source whose draws must
/// be reproducible for replay verification, and a cosmetic source for draws
/// that never influence gameplay. Which source a call site uses is fixed in
/// code, never decided at runtime.
pub trait RandomSource: Send {
    fn next_u32(&mut self) -> u32;

    /// Uniform float in `[min, max]`.
    fn float(&mut self, min: f64, max: f64) -> f64 {
        let unit = f64::from(self.next_u32()) / f64::from(u32::MAX);
        min + unit * (max - min)
    }

    /// Uniform integer in `[min, max]`, both ends inclusive.
    fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1) as u64;
        (i64::from(min) + (u64::from(self.next_u32()) % span) as i64) as i32
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.float(0.0, 1.0) < probability
    }

    fn angle(&mut self) -> f64 {
        self.float(0.0, TAU)
    }

    fn sign(&mut self) -> f64 {
        if self.next_u32() & 1 == 0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Random index into a collection of `len` items.
    fn pick(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.next_u32() as usize % len)
    }
}

/// Xorshift32 generator. Same seed, same sequence, on every platform.
#[derive(Clone, Copy, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0xDEAD_BEEF } else { seed },
        }
    }

    /// Seeds from an externally supplied seed string (e.g. a score token).
    pub fn from_seed_str(seed: &str) -> Self {
        Self::new(seed_hash(seed))
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        self.state
    }
}

impl RandomSource for SeededRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.next()
    }
}

/// 32-bit FNV-1a over the seed bytes.
pub fn seed_hash(seed: &str) -> u32 {
    let mut hash = 0x811C_9DC5u32;
    for byte in seed.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Non-reproducible source backed by OS entropy. Cosmetic draws only.
#[derive(Clone, Debug)]
pub struct CosmeticRng {
    inner: StdRng,
}

impl CosmeticRng {
    pub fn new() -> Self {
        Self {
            inner: StdRng::from_os_rng(),
        }
    }
}

impl Default for CosmeticRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for CosmeticRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xorshift_matches_reference_step() {
        let mut rng = SeededRng::new(1);
        assert_eq!(rng.next(), 270_369);
        assert_eq!(rng.state(), 270_369);
    }

    #[test]
    fn zero_seed_is_replaced() {
        assert_eq!(SeededRng::new(0).state(), 0xDEAD_BEEF);
    }

    #[test]
    fn seed_hash_is_fnv1a() {
        assert_eq!(seed_hash(""), 0x811C_9DC5);
        assert_eq!(seed_hash("a"), 0xE40C_292C);
    }

    #[test]
    fn same_seed_string_same_sequence() {
        let mut a = SeededRng::from_seed_str("test-1");
        let mut b = SeededRng::from_seed_str("test-1");
        for _ in 0..256 {
            assert_eq!(a.next(), b.next());
        }
        let mut c = SeededRng::from_seed_str("test-2");
        assert_ne!(
            SeededRng::from_seed_str("test-1").next(),
            c.next(),
            "different seeds should diverge immediately"
        );
    }

    #[test]
    fn int_stays_inclusive() {
        let mut rng = SeededRng::new(0x1234_5678);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..2_000 {
            let value = rng.int(-2, 2);
            assert!((-2..=2).contains(&value));
            seen_min |= value == -2;
            seen_max |= value == 2;
        }
        assert!(seen_min && seen_max);
        assert_eq!(rng.int(5, 5), 5);
        assert_eq!(rng.int(7, 3), 7);
    }

    #[test]
    fn float_stays_in_range() {
        let mut rng = SeededRng::new(42);
        for _ in 0..2_000 {
            let value = rng.float(-3.5, 10.0);
            assert!((-3.5..=10.0).contains(&value));
        }
    }

    #[test]
    fn chance_tracks_probability() {
        let mut rng = SeededRng::new(0xC0FF_EE11);
        assert!((0..1_000).all(|_| !rng.chance(0.0)));
        let hits = (0..4_000).filter(|_| rng.chance(0.25)).count();
        assert!((800..1_200).contains(&hits), "hits={hits}");
    }

    #[test]
    fn pick_handles_empty() {
        let mut rng = SeededRng::new(7);
        assert_eq!(rng.pick(0), None);
        assert!(rng.pick(3).is_some_and(|index| index < 3));
    }

    #[test]
    fn cosmetic_source_produces_values() {
        let mut rng = CosmeticRng::new();
        let angle = rng.angle();
        assert!((0.0..=TAU).contains(&angle));
    }
}
