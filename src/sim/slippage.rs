use rand::distributions::{Bernoulli, Distribution};
use rand::Rng;
use rand_distr::Normal;
use serde::Deserialize;

use super::{SimResult, SimulationError};

/// Per-epoch slippage: Gaussian noise plus rare Gaussian jumps, clipped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SlippageModel {
    pub base_mean: f64,
    pub base_std: f64,
    pub extreme_probability: f64,
    pub extreme_mean: f64,
    pub extreme_std: f64,
    pub clip_min: f64,
    pub clip_max: f64,
}

impl Default for SlippageModel {
    fn default() -> Self {
        Self {
            base_mean: 0.001,
            base_std: 0.0003,
            extreme_probability: 0.01,
            extreme_mean: 0.03,
            extreme_std: 0.02,
            clip_min: -0.001,
            clip_max: 0.001,
        }
    }
}

impl SlippageModel {
    /// Draw `epochs` slippage fractions (of TVL).
    ///
    /// Draws the full base series, then the jump indicators, then the jump
    /// sizes, so a given seed always yields the same path.
    pub fn series<R: Rng + ?Sized>(&self, epochs: usize, rng: &mut R) -> SimResult<Vec<f64>> {
        if self.clip_min > self.clip_max {
            return Err(SimulationError::InvalidParameter(format!(
                "clip_min {} above clip_max {}",
                self.clip_min, self.clip_max
            )));
        }

        // rand_distr only rejects a non-finite std_dev, not a negative one
        for (name, std) in [("base_std", self.base_std), ("extreme_std", self.extreme_std)] {
            if !(std >= 0.0) {
                return Err(SimulationError::InvalidParameter(format!(
                    "{} must be non-negative, got {}",
                    name, std
                )));
            }
        }

        let base = Normal::new(self.base_mean, self.base_std)
            .map_err(|e| SimulationError::InvalidParameter(format!("base slippage: {}", e)))?;
        let jump = Bernoulli::new(self.extreme_probability)
            .map_err(|e| SimulationError::InvalidParameter(format!("extreme probability: {}", e)))?;
        let extreme = Normal::new(self.extreme_mean, self.extreme_std)
            .map_err(|e| SimulationError::InvalidParameter(format!("extreme slippage: {}", e)))?;

        let base_draws: Vec<f64> = (0..epochs).map(|_| base.sample(rng)).collect();
        let jumps: Vec<bool> = (0..epochs).map(|_| jump.sample(rng)).collect();
        let extremes: Vec<f64> = (0..epochs).map(|_| extreme.sample(rng)).collect();

        Ok(base_draws
            .into_iter()
            .zip(jumps)
            .zip(extremes)
            .map(|((b, hit), e)| {
                let value = if hit { b + e } else { b };
                value.clamp(self.clip_min, self.clip_max)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn series_is_clipped_and_sized() {
        let model = SlippageModel::default();
        let series = model.series(1_000, &mut StdRng::seed_from_u64(42)).unwrap();

        assert_eq!(series.len(), 1_000);
        assert!(series.iter().all(|s| (-0.001..=0.001).contains(s)));
    }

    #[test]
    fn negative_std_is_rejected() {
        let model = SlippageModel { base_std: -1.0, ..SlippageModel::default() };
        let err = model.series(10, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidParameter(_)));
    }

    #[test]
    fn negative_extreme_std_is_rejected() {
        let model = SlippageModel { extreme_std: -0.02, ..SlippageModel::default() };
        match model.series(10, &mut StdRng::seed_from_u64(1)) {
            Err(SimulationError::InvalidParameter(msg)) => assert!(msg.contains("extreme_std")),
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn zero_std_is_a_constant_series() {
        let model = SlippageModel { base_std: 0.0, extreme_probability: 0.0, ..SlippageModel::default() };
        let series = model.series(5, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(series.iter().all(|s| *s == 0.001));
    }

    #[test]
    fn probability_outside_unit_interval_is_rejected() {
        let model = SlippageModel { extreme_probability: 1.5, ..SlippageModel::default() };
        assert!(model.series(10, &mut StdRng::seed_from_u64(1)).is_err());
    }
}
