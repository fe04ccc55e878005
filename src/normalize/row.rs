/// Values strictly below this are folded into the period to their right.
pub const CONSOLIDATION_LIMIT: f64 = 30.0;

/// Positive period values are rounded up to the nearest multiple of this.
pub const ROUNDING_STEP: f64 = 10.0;

/// Total raw demand of a row, before any transformation.
pub fn raw_total(periods: &[f64]) -> f64 {
    periods.iter().sum()
}

/// Single left-to-right consolidation pass.
///
/// A value `0 < v < 30` is added to its right neighbor and the source cell is
/// zeroed. The scan reads the mutating sequence, so a sum created at `i + 1`
/// is re-evaluated when the scan reaches it, cascading small values rightward.
/// It never re-visits earlier positions, and the last column is only ever a
/// destination.
pub fn consolidate(periods: &mut [f64]) {
    if periods.len() < 2 {
        return;
    }
    for i in 0..periods.len() - 1 {
        let v = periods[i];
        if v > 0.0 && v < CONSOLIDATION_LIMIT {
            periods[i + 1] += v;
            periods[i] = 0.0;
        }
    }
}

/// Round every positive value up to the next multiple of [`ROUNDING_STEP`].
/// Zeroes (and anything non-positive) are left alone.
pub fn round_up(periods: &mut [f64]) {
    for v in periods.iter_mut() {
        if *v > 0.0 {
            *v = (*v / ROUNDING_STEP).ceil() * ROUNDING_STEP;
        }
    }
}

/// Consolidation followed by rounding, as a pure function over one row's
/// period values. The caller decides beforehand whether the row is preserved;
/// preserved rows never reach this function.
pub fn normalize_periods(periods: &[f64]) -> Vec<f64> {
    let mut out = periods.to_vec();
    consolidate(&mut out);
    round_up(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_value_moves_right_then_rounds() {
        // [5, 0, 40] -> consolidate [0, 5, 40] -> round [0, 10, 40]
        assert_eq!(normalize_periods(&[5.0, 0.0, 40.0]), vec![0.0, 10.0, 40.0]);
    }

    #[test]
    fn consolidated_sum_is_not_rescanned_backwards() {
        // [25, 8, 0]: 25 folds into position 1 making 33, which is over the
        // limit by the time the scan reaches it, so it stays put.
        assert_eq!(normalize_periods(&[25.0, 8.0, 0.0]), vec![0.0, 40.0, 0.0]);
    }

    #[test]
    fn cascade_carries_across_multiple_cells() {
        // 5 joins 20 making 25, which is still small and joins 35.
        let mut periods = vec![5.0, 20.0, 35.0];
        consolidate(&mut periods);
        assert_eq!(periods, vec![0.0, 0.0, 60.0]);
    }

    #[test]
    fn exactly_thirty_is_not_consolidated() {
        let mut periods = vec![30.0, 10.0];
        consolidate(&mut periods);
        assert_eq!(periods, vec![30.0, 10.0]);
    }

    #[test]
    fn zero_is_never_a_source() {
        let mut periods = vec![0.0, 0.0, 15.0];
        consolidate(&mut periods);
        assert_eq!(periods, vec![0.0, 0.0, 15.0]);
    }

    #[test]
    fn last_column_is_destination_only() {
        let mut periods = vec![40.0, 5.0];
        consolidate(&mut periods);
        // the trailing 5 has nothing to its right and stays
        assert_eq!(periods, vec![40.0, 5.0]);
    }

    #[test]
    fn consolidation_conserves_row_total() {
        let cases: Vec<Vec<f64>> = vec![
            vec![5.0, 0.0, 40.0],
            vec![25.0, 8.0, 0.0],
            vec![5.0, 20.0, 35.0],
            vec![29.0, 29.0, 29.0, 29.0],
            vec![1.0],
            vec![],
        ];
        for case in cases {
            let before: f64 = raw_total(&case);
            let mut after = case.clone();
            consolidate(&mut after);
            assert_eq!(raw_total(&after), before, "total changed for {case:?}");
        }
    }

    #[test]
    fn rounding_is_monotone_and_bounded() {
        for v in [0.1, 1.0, 9.0, 9.9, 10.0, 11.0, 25.0, 33.0, 99.0, 101.0] {
            let mut periods = vec![v];
            round_up(&mut periods);
            let r = periods[0];
            assert!(r >= v, "rounded {v} down to {r}");
            assert!(r < v + 10.0, "rounded {v} too far up to {r}");
            assert_eq!(r % 10.0, 0.0, "{r} is not a multiple of ten");
        }
    }

    #[test]
    fn rounding_is_idempotent_on_multiples_of_ten() {
        let mut periods = vec![10.0, 40.0, 120.0];
        round_up(&mut periods);
        assert_eq!(periods, vec![10.0, 40.0, 120.0]);
    }

    #[test]
    fn zero_and_negative_values_are_not_rounded() {
        let mut periods = vec![0.0, -5.0];
        round_up(&mut periods);
        assert_eq!(periods, vec![0.0, -5.0]);
    }

    #[test]
    fn single_cell_row_only_rounds() {
        assert_eq!(normalize_periods(&[7.0]), vec![10.0]);
    }
}
