use std::fmt;
use std::io::Write;

use itertools::izip;
use serde::Serialize;

use super::SimResult;

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub tvl: f64,
    pub target_ratio: f64,
    /// Buffer level before the first epoch and after each one (`epochs + 1` points).
    pub buffer: Vec<f64>,
    pub smooth_rates: Vec<f64>,
    pub proportional_rates: Vec<f64>,
    pub fees: Vec<f64>,
    pub slippage: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub smooth_volatility_pct: f64,
    pub proportional_volatility_pct: f64,
    pub max_smooth_change_pct: f64,
    pub max_proportional_change_pct: f64,
    pub mean_smooth_rate_pct: f64,
    pub mean_proportional_rate_pct: f64,
    pub final_buffer_ratio: f64,
    pub target_ratio: f64,
    pub insolvent_points: usize,
}

#[derive(Serialize)]
struct EpochRow {
    epoch: usize,
    slippage: f64,
    buffer_before: f64,
    buffer_after: f64,
    smooth_fee_rate: f64,
    proportional_fee_rate: f64,
    fees_collected: f64,
}

fn changes_pct(rates: &[f64]) -> Vec<f64> {
    rates.windows(2).map(|w| (w[1] - w[0]) * 100.0).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

// Population standard deviation
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

// Relative reduction in percent; None when the baseline is zero
fn reduction_pct(baseline: f64, improved: f64) -> Option<f64> {
    (baseline != 0.0).then(|| (baseline - improved) / baseline * 100.0)
}

impl SimulationReport {
    pub fn final_buffer(&self) -> f64 {
        self.buffer.last().copied().unwrap_or(0.0)
    }

    pub fn insolvent_points(&self) -> usize {
        self.buffer.iter().filter(|b| **b <= 0.0).count()
    }

    pub fn summary(&self) -> SimulationSummary {
        let smooth_changes = changes_pct(&self.smooth_rates);
        let proportional_changes = changes_pct(&self.proportional_rates);
        let to_pct = |rates: &[f64]| rates.iter().map(|r| r * 100.0).collect::<Vec<f64>>();

        SimulationSummary {
            smooth_volatility_pct: std_dev(&smooth_changes),
            proportional_volatility_pct: std_dev(&proportional_changes),
            max_smooth_change_pct: max_abs(&smooth_changes),
            max_proportional_change_pct: max_abs(&proportional_changes),
            mean_smooth_rate_pct: mean(&to_pct(&self.smooth_rates)),
            mean_proportional_rate_pct: mean(&to_pct(&self.proportional_rates)),
            final_buffer_ratio: self.final_buffer() / self.tvl,
            target_ratio: self.target_ratio,
            insolvent_points: self.insolvent_points(),
        }
    }

    /// One CSV row per epoch. Series of uneven length stop at the shortest.
    pub fn write_csv<W: Write>(&self, writer: W) -> SimResult<()> {
        let mut out = csv::Writer::from_writer(writer);
        let rows = izip!(
            &self.slippage,
            self.buffer.windows(2),
            &self.smooth_rates,
            &self.proportional_rates,
            &self.fees
        );
        for (epoch, (slippage, buffer, smooth, proportional, fees)) in rows.enumerate() {
            out.serialize(EpochRow {
                epoch,
                slippage: *slippage,
                buffer_before: buffer[0],
                buffer_after: buffer[1],
                smooth_fee_rate: *smooth,
                proportional_fee_rate: *proportional,
                fees_collected: *fees,
            })?;
        }
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "FEE SMOOTHNESS ANALYSIS")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Proportional fee volatility: {:.4}% per step", self.proportional_volatility_pct)?;
        writeln!(f, "Smooth fee volatility:       {:.4}% per step", self.smooth_volatility_pct)?;
        if let Some(r) = reduction_pct(self.proportional_volatility_pct, self.smooth_volatility_pct) {
            writeln!(f, "Volatility reduction:        {:.1}%", r)?;
        }
        writeln!(f, "\nMaximum fee rate change:")?;
        writeln!(f, "Proportional: {:.4}%", self.max_proportional_change_pct)?;
        writeln!(f, "Smooth:       {:.4}%", self.max_smooth_change_pct)?;
        if let Some(r) = reduction_pct(self.max_proportional_change_pct, self.max_smooth_change_pct) {
            writeln!(f, "Reduction:    {:.1}%", r)?;
        }
        writeln!(f, "\nAverage fee rates:")?;
        writeln!(f, "Proportional: {:.4}%", self.mean_proportional_rate_pct)?;
        writeln!(f, "Smooth:       {:.4}%", self.mean_smooth_rate_pct)?;
        writeln!(
            f,
            "\nFinal buffer/TVL ratio:  {:.4} ({:.2}%)",
            self.final_buffer_ratio,
            self.final_buffer_ratio * 100.0
        )?;
        writeln!(f, "Target buffer/TVL ratio: {:.4} ({:.2}%)", self.target_ratio, self.target_ratio * 100.0)?;
        writeln!(f, "Insolvent points:        {}", self.insolvent_points)?;
        write!(f, "{}", rule)
    }
}
