//! Buffer/fee study: how a smoothed fee controller keeps the protocol buffer
//! solvent under noisy slippage, compared with a plain proportional fee.

pub mod controller;
pub mod report;
pub mod slippage;

pub use controller::{proportional_fee_rate, SmoothFeeController};
pub use report::{SimulationReport, SimulationSummary};
pub use slippage::SlippageModel;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::{info, instrument};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid simulation parameter: {0}")]
    InvalidParameter(String),
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimulationError>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub epochs: usize,
    pub tvl: f64,
    pub target_ratio: f64,
    pub seed: u64,
    pub max_fee_change: f64,
    pub smoothing_factor: f64,
    pub deadband: f64,
    pub gain: f64,
    pub slippage: SlippageModel,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            epochs: 365,
            tvl: 1_000_000.0,
            target_ratio: 0.005,
            seed: 42,
            max_fee_change: 0.0005,
            smoothing_factor: 0.1,
            deadband: 0.001,
            gain: 1.0,
            slippage: SlippageModel::default(),
        }
    }
}

impl SimulationConfig {
    fn controller(&self) -> SmoothFeeController {
        SmoothFeeController::new(
            self.tvl,
            self.target_ratio,
            self.max_fee_change,
            self.smoothing_factor,
            self.deadband,
            self.gain,
        )
    }
}

/// Simulate `config.epochs` batches starting from a buffer at target.
#[instrument(skip(config), fields(epochs = config.epochs, seed = config.seed))]
pub fn run(config: &SimulationConfig) -> SimResult<SimulationReport> {
    if !(config.tvl > 0.0) {
        return Err(SimulationError::InvalidParameter(format!("tvl must be positive, got {}", config.tvl)));
    }
    if !(0.0..=1.0).contains(&config.smoothing_factor) {
        return Err(SimulationError::InvalidParameter(format!(
            "smoothing_factor must be within [0, 1], got {}",
            config.smoothing_factor
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let slippage = config.slippage.series(config.epochs, &mut rng)?;
    let mut controller = config.controller();

    let mut buffer = Vec::with_capacity(config.epochs + 1);
    let mut smooth_rates = Vec::with_capacity(config.epochs);
    let mut proportional_rates = Vec::with_capacity(config.epochs);
    let mut fees = Vec::with_capacity(config.epochs);
    buffer.push(config.target_ratio * config.tvl);

    for &slip in &slippage {
        let current = *buffer.last().unwrap_or(&0.0);
        let rate = controller.fee_rate(current);
        let collected = rate * config.tvl;

        // Buffer floor is zero: an insolvent epoch clamps instead of going negative
        let next = (current + collected - slip * config.tvl).max(0.0);

        buffer.push(next);
        smooth_rates.push(rate);
        proportional_rates.push(proportional_fee_rate(current, config.tvl, config.target_ratio));
        fees.push(collected);
    }

    let report = SimulationReport {
        tvl: config.tvl,
        target_ratio: config.target_ratio,
        buffer,
        smooth_rates,
        proportional_rates,
        fees,
        slippage,
    };
    info!(
        final_buffer = report.final_buffer(),
        insolvent = report.insolvent_points(),
        "Buffer simulation finished"
    );
    Ok(report)
}
