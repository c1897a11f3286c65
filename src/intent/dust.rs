use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used when the operator does not configure one.
pub const DEFAULT_DUST_SEED: u64 = 42;

/// Seeded source of dust weights for tokens missing from an intent.
///
/// Two generators built from the same seed hand out the same sequence, which is
/// what makes fuzzed intents reproducible for a given operator.
#[derive(Debug, Clone)]
pub struct DustGenerator {
    seed: u64,
    rng: StdRng,
}

impl DustGenerator {
    pub fn seeded(seed: u64) -> Self {
        Self { seed, rng: StdRng::seed_from_u64(seed) }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Next dust weight: an integer in `[1, 10]` scaled by `10^-decimals`.
    pub fn next_weight(&mut self, decimals: u32) -> f64 {
        let units: u32 = self.rng.gen_range(1..=10);
        units as f64 / 10f64.powi(decimals as i32)
    }
}

impl Default for DustGenerator {
    fn default() -> Self {
        Self::seeded(DEFAULT_DUST_SEED)
    }
}
