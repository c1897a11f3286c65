//! Largest-remainder (Hamilton) rounding.
//!
//! Rounds non-negative reals to integers whose sum hits an exact target while
//! keeping every entry within one unit of its real value.

use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::intent::types::RoundingError;

/// Round `values` to integers summing exactly to `target_sum`.
///
/// When `target_sum` is `None` the target is the rounded sum of the inputs.
/// A shortfall goes to the largest fractional parts (ties to the earlier
/// entry); an excess comes off the smallest ones (ties to the later entry),
/// never below zero. Drift wider than the number of entries is spread over
/// several passes, so the sum is exact even when `f64` scaling was lossy.
pub fn round_with_fixed_sum(
    values: &[f64],
    target_sum: Option<u128>,
) -> Result<Vec<u128>, RoundingError> {
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(RoundingError::NonFinite { index, value });
        }
        if value < 0.0 {
            return Err(RoundingError::Negative { index, value });
        }
    }

    let target = target_sum.unwrap_or_else(|| values.iter().sum::<f64>().round() as u128);
    if values.is_empty() {
        return match target {
            0 => Ok(Vec::new()),
            target => Err(RoundingError::NoValues { target }),
        };
    }

    let mut rounded: Vec<u128> = values.iter().map(|v| v.floor() as u128).collect();
    let floored: u128 = rounded.iter().sum();

    // sort_by is stable, so equal fractions keep input order
    let mut ranking: Vec<usize> = (0..values.len()).collect();
    ranking.sort_by(|&a, &b| {
        let frac_a = OrderedFloat(values[a] - values[a].floor());
        let frac_b = OrderedFloat(values[b] - values[b].floor());
        frac_b.cmp(&frac_a)
    });

    if floored <= target {
        add_remainder(&mut rounded, &ranking, target - floored);
    } else {
        remove_excess(&mut rounded, &ranking, floored - target);
    }

    trace!(target, floored, "Distributed rounding remainder");
    Ok(rounded)
}

fn add_remainder(rounded: &mut [u128], ranking: &[usize], remainder: u128) {
    let len = rounded.len() as u128;
    let full_passes = remainder / len;
    if full_passes > 0 {
        debug!(remainder, passes = %full_passes, "Remainder exceeds entry count");
        for amount in rounded.iter_mut() {
            *amount += full_passes;
        }
    }
    for &index in ranking.iter().take((remainder % len) as usize) {
        rounded[index] += 1;
    }
}

fn remove_excess(rounded: &mut [u128], ranking: &[usize], mut excess: u128) {
    // sum(rounded) = target + excess > 0, so some entry is always positive
    while excess > 0 {
        let eligible: Vec<usize> =
            ranking.iter().rev().copied().filter(|&i| rounded[i] > 0).collect();
        let count = eligible.len() as u128;
        let lowest = eligible.iter().map(|&i| rounded[i]).min().unwrap_or(0);

        let per_entry = (excess / count).min(lowest);
        if per_entry > 0 {
            for &index in &eligible {
                rounded[index] -= per_entry;
            }
            excess -= per_entry * count;
        } else {
            // excess < count here
            for &index in eligible.iter().take(excess as usize) {
                rounded[index] -= 1;
            }
            excess = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn remainder_goes_to_largest_fraction() {
        let rounded = round_with_fixed_sum(&[33.3, 33.3, 33.4], Some(100)).unwrap();
        assert_eq!(rounded, vec![33, 33, 34]);
    }

    #[test]
    fn ties_break_by_input_order() {
        let rounded = round_with_fixed_sum(&[0.5, 0.5, 0.5, 0.5], Some(2)).unwrap();
        assert_eq!(rounded, vec![1, 1, 0, 0]);
    }

    #[test]
    fn integer_inputs_are_unchanged() {
        let rounded = round_with_fixed_sum(&[25.0, 75.0], Some(100)).unwrap();
        assert_eq!(rounded, vec![25, 75]);
    }

    #[test]
    fn target_defaults_to_rounded_sum() {
        let rounded = round_with_fixed_sum(&[1.2, 2.3, 3.5], None).unwrap();
        assert_eq!(rounded.iter().sum::<u128>(), 7);
        assert_eq!(rounded, vec![1, 2, 4]);
    }

    #[test]
    fn empty_input_with_zero_target() {
        assert_eq!(round_with_fixed_sum(&[], Some(0)).unwrap(), Vec::<u128>::new());
        assert_eq!(
            round_with_fixed_sum(&[], Some(3)),
            Err(RoundingError::NoValues { target: 3 })
        );
    }

    #[test]
    fn rejects_non_finite_and_negative_values() {
        assert!(matches!(
            round_with_fixed_sum(&[1.0, f64::NAN], Some(1)),
            Err(RoundingError::NonFinite { index: 1, .. })
        ));
        assert!(matches!(
            round_with_fixed_sum(&[-0.5, 1.5], Some(1)),
            Err(RoundingError::Negative { index: 0, .. })
        ));
    }

    #[test]
    fn excess_comes_off_smallest_fractions() {
        // floors 1 + 2 + 3 = 6, one too many; 2.1 has the smallest fraction
        let rounded = round_with_fixed_sum(&[1.9, 2.1, 3.5], Some(5)).unwrap();
        assert_eq!(rounded, vec![1, 1, 3]);
    }

    #[test]
    fn excess_ties_come_off_the_later_entry() {
        let rounded = round_with_fixed_sum(&[2.0, 2.0, 2.0], Some(5)).unwrap();
        assert_eq!(rounded, vec![2, 2, 1]);
    }

    #[test]
    fn wide_overshoot_is_spread_over_passes() {
        let rounded = round_with_fixed_sum(&[60.2, 50.1], Some(100)).unwrap();
        assert_eq!(rounded, vec![55, 45]);
    }

    #[test]
    fn wide_shortfall_is_spread_over_passes() {
        let rounded = round_with_fixed_sum(&[10.0, 10.0], Some(25)).unwrap();
        assert_eq!(rounded, vec![13, 12]);
    }

    #[test]
    fn excess_never_drives_an_entry_negative() {
        let rounded = round_with_fixed_sum(&[0.2, 5.0, 1.0], Some(2)).unwrap();
        assert_eq!(rounded.iter().sum::<u128>(), 2);
        assert_eq!(rounded[0], 0);
    }

    #[test]
    fn lossy_scaling_still_hits_the_target() {
        // 10^18 / 7 is not representable; every value floors to the same integer
        let values = vec![1e18 / 7.0; 7];
        let rounded = round_with_fixed_sum(&values, Some(10u128.pow(18))).unwrap();

        assert_eq!(rounded.iter().sum::<u128>(), 10u128.pow(18));
        let spread = rounded.iter().max().unwrap() - rounded.iter().min().unwrap();
        assert!(spread <= 1);
    }

    proptest! {
        #[test]
        fn sum_is_exact_and_error_below_one(
            raw in prop::collection::vec(0.001f64..1.0, 1..24),
            decimals in 0u32..=12,
        ) {
            let total: f64 = raw.iter().sum();
            let scale = 10f64.powi(decimals as i32);
            let values: Vec<f64> = raw.iter().map(|w| w / total * scale).collect();
            let target = 10u128.pow(decimals);

            let rounded = round_with_fixed_sum(&values, Some(target)).unwrap();

            prop_assert_eq!(rounded.iter().sum::<u128>(), target);
            for (r, v) in rounded.iter().zip(&values) {
                prop_assert!((*r as f64 - v).abs() < 1.0);
            }
        }

        #[test]
        fn any_target_is_hit_exactly(
            values in prop::collection::vec(0.0f64..1e6, 1..16),
            target in 0u128..10_000_000,
        ) {
            let rounded = round_with_fixed_sum(&values, Some(target)).unwrap();
            prop_assert_eq!(rounded.iter().sum::<u128>(), target);
        }
    }
}
