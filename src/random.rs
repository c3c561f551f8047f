use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Injectable randomness source. Generation code never reaches for an
/// ambient RNG directly, so every draw can be made deterministic under test.
pub trait RandomSource: Send {
    /// Uniform draw in [0, 1).
    fn unit(&mut self) -> f64;

    /// Uniform draw in [-1, 1).
    fn signed_unit(&mut self) -> f64 {
        self.unit() * 2.0 - 1.0
    }

    /// Uniform integer in [0, cap].
    fn volume(&mut self, cap: u64) -> u64 {
        (self.unit() * (cap as f64 + 1.0)) as u64
    }
}

/// Production source backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn unit(&mut self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Deterministic source seeded from a u64. Two instances with the same seed
/// produce identical draw sequences.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sequences_repeat() {
        let mut a = SeededRandom::new(7);
        let mut b = SeededRandom::new(7);
        for _ in 0..100 {
            assert_eq!(a.unit(), b.unit());
        }
    }

    #[test]
    fn seeded_sequences_diverge_across_seeds() {
        let mut a = SeededRandom::new(1);
        let mut b = SeededRandom::new(2);
        let same = (0..10).all(|_| a.unit() == b.unit());
        assert!(!same);
    }

    #[test]
    fn draws_stay_in_range() {
        let mut rng = SeededRandom::new(42);
        for _ in 0..1_000 {
            let u = rng.unit();
            assert!((0.0..1.0).contains(&u));
            let s = rng.signed_unit();
            assert!((-1.0..1.0).contains(&s));
            assert!(rng.volume(1_000_000) <= 1_000_000);
        }
    }
}
