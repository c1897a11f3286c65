/// Fee controller that steers the buffer toward `target_ratio · tvl` while
/// keeping the fee path smooth.
///
/// Each step: deadband the ratio error, exponentially smooth it, scale by the
/// gain, clamp the move to `max_fee_change`, floor at zero.
#[derive(Debug, Clone)]
pub struct SmoothFeeController {
    tvl: f64,
    target_ratio: f64,
    max_fee_change: f64,
    smoothing_factor: f64,
    deadband: f64,
    gain: f64,
    previous_fee: f64,
    smoothed_error: f64,
}

impl SmoothFeeController {
    pub fn new(
        tvl: f64,
        target_ratio: f64,
        max_fee_change: f64,
        smoothing_factor: f64,
        deadband: f64,
        gain: f64,
    ) -> Self {
        Self {
            tvl,
            target_ratio,
            max_fee_change,
            smoothing_factor,
            deadband,
            gain,
            previous_fee: 0.0,
            smoothed_error: 0.0,
        }
    }

    pub fn previous_fee(&self) -> f64 {
        self.previous_fee
    }

    pub fn fee_rate(&mut self, buffer: f64) -> f64 {
        let mut error = self.target_ratio - buffer / self.tvl;
        if error.abs() < self.deadband {
            error = 0.0;
        }

        self.smoothed_error =
            self.smoothing_factor * error + (1.0 - self.smoothing_factor) * self.smoothed_error;

        let target_fee = self.gain * self.smoothed_error;
        let change = (target_fee - self.previous_fee).clamp(-self.max_fee_change, self.max_fee_change);
        let fee = (self.previous_fee + change).max(0.0);

        self.previous_fee = fee;
        fee
    }
}

/// Unsmoothed baseline: the raw ratio shortfall, floored at zero.
pub fn proportional_fee_rate(buffer: f64, tvl: f64, target_ratio: f64) -> f64 {
    (target_ratio - buffer / tvl).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TVL: f64 = 1_000_000.0;

    fn controller(max_fee_change: f64) -> SmoothFeeController {
        SmoothFeeController::new(TVL, 0.005, max_fee_change, 0.1, 0.001, 1.0)
    }

    #[test]
    fn empty_buffer_ramps_fee_gradually() {
        let mut c = controller(0.0005);
        let first = c.fee_rate(0.0);
        let second = c.fee_rate(0.0);

        assert!((first - 0.0005).abs() < 1e-12);
        assert!((second - 0.00095).abs() < 1e-12);
    }

    #[test]
    fn fee_moves_are_rate_limited() {
        let mut c = controller(0.0001);
        let mut last = 0.0;
        for _ in 0..50 {
            let fee = c.fee_rate(0.0);
            assert!(fee - last <= 0.0001 + 1e-15);
            last = fee;
        }
    }

    #[test]
    fn errors_inside_deadband_are_ignored() {
        let mut c = controller(0.0005);
        // ratio 0.0045, error 0.0005 < deadband
        assert_eq!(c.fee_rate(4_500.0), 0.0);
    }

    #[test]
    fn surplus_buffer_never_charges_negative_fees() {
        let mut c = controller(0.0005);
        for _ in 0..20 {
            assert!(c.fee_rate(100_000.0) >= 0.0);
        }
        assert_eq!(c.previous_fee(), 0.0);
    }

    #[test]
    fn proportional_rate_is_floored() {
        assert!((proportional_fee_rate(2_000.0, TVL, 0.005) - 0.003).abs() < 1e-12);
        assert_eq!(proportional_fee_rate(9_000.0, TVL, 0.005), 0.0);
    }
}
