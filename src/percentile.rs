use serde::{Deserialize, Serialize};

use crate::utils::AlignedSeries;

/// Trailing windows, in trading observations.
pub const WINDOW_1Y: usize = 250;
pub const WINDOW_2Y: usize = 500;

/// Percentile rank of the volatility value at each row, against a
/// one-year window, a two-year window, and all history to date.
///
/// Trailing ranks are undefined until the window fills; the all-history
/// rank is defined from the first row (where it is trivially 1.0).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PercentileAnnotations {
    pub pct_1y: Vec<Option<f64>>,
    pub pct_2y: Vec<Option<f64>>,
    pub pct_all: Vec<f64>,
}

/// Fractional rank of each value within its trailing window of `window`
/// observations, inclusive of the value itself: `count(window <= v) / window`.
/// Ties count inclusively, so a value's own slot always contributes at
/// least `1 / window`.
pub fn rolling_percentile(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    for (i, slot) in out.iter_mut().enumerate() {
        if i + 1 < window {
            continue;
        }
        let current = values[i];
        let at_or_below = values[i + 1 - window..=i]
            .iter()
            .filter(|v| **v <= current)
            .count();
        *slot = Some(at_or_below as f64 / window as f64);
    }

    out
}

/// Fractional rank of each value within all history up to and including
/// itself. Defined from the first observation.
pub fn expanding_percentile(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    for (i, current) in values.iter().enumerate() {
        let at_or_below = values[..=i].iter().filter(|v| **v <= *current).count();
        out.push(at_or_below as f64 / (i + 1) as f64);
    }
    out
}

/// Maximum over the trailing window of `window` observations, inclusive
/// of the current one. Undefined until the window fills.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    for (i, slot) in out.iter_mut().enumerate() {
        if i + 1 < window {
            continue;
        }
        let max = values[i + 1 - window..=i]
            .iter()
            .fold(f64::NEG_INFINITY, |acc, v| acc.max(*v));
        *slot = Some(max);
    }

    out
}

/// Fractional change from the value `period` observations earlier.
/// Undefined for the first `period` rows.
pub fn pct_change(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    for i in period..values.len() {
        let base = values[i - period];
        if base != 0.0 {
            out[i] = Some(values[i] / base - 1.0);
        }
    }

    out
}

/// Produce the three percentile series the peak detector and the report
/// consume.
pub fn annotate_volatility(series: &AlignedSeries) -> PercentileAnnotations {
    PercentileAnnotations {
        pct_1y: rolling_percentile(&series.volatility, WINDOW_1Y),
        pct_2y: rolling_percentile(&series.volatility, WINDOW_2Y),
        pct_all: expanding_percentile(&series.volatility),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rolling_rank_undefined_before_window_fills() {
        let ranks = rolling_percentile(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(ranks[0], None);
        assert_eq!(ranks[1], None);
        assert!(ranks[2].is_some());
    }

    #[test]
    fn rolling_rank_of_window_maximum_is_one() {
        let ranks = rolling_percentile(&[1.0, 2.0, 3.0], 3);
        assert_relative_eq!(ranks[2].unwrap(), 1.0);
    }

    #[test]
    fn rolling_rank_of_window_minimum_is_one_slot() {
        let ranks = rolling_percentile(&[3.0, 2.0, 1.0, 0.5], 4);
        // Own slot still counts: 1/4.
        assert_relative_eq!(ranks[3].unwrap(), 0.25);
    }

    #[test]
    fn ties_count_inclusively() {
        let ranks = rolling_percentile(&[5.0, 5.0, 5.0], 3);
        assert_relative_eq!(ranks[2].unwrap(), 1.0);
    }

    #[test]
    fn rolling_rank_stays_within_bounds() {
        let values: Vec<f64> = (0..40).map(|i| ((i * 7) % 13) as f64).collect();
        let window = 10;
        for rank in rolling_percentile(&values, window).into_iter().flatten() {
            assert!(rank >= 1.0 / window as f64);
            assert!(rank <= 1.0);
        }
    }

    #[test]
    fn rolling_rank_monotone_in_current_value() {
        // Same trailing window, larger current value => rank not smaller.
        let mut low = vec![4.0, 9.0, 2.0, 7.0, 3.0];
        let mut high = low.clone();
        low.push(5.0);
        high.push(8.0);
        let r_low = rolling_percentile(&low, 6)[5].unwrap();
        let r_high = rolling_percentile(&high, 6)[5].unwrap();
        assert!(r_high >= r_low);
    }

    #[test]
    fn expanding_rank_defined_from_first_row() {
        let ranks = expanding_percentile(&[7.0, 3.0, 9.0]);
        assert_relative_eq!(ranks[0], 1.0);
        assert_relative_eq!(ranks[1], 0.5);
        assert_relative_eq!(ranks[2], 1.0);
    }

    #[test]
    fn rolling_max_tracks_window() {
        let maxima = rolling_max(&[1.0, 5.0, 2.0, 3.0], 2);
        assert_eq!(maxima[0], None);
        assert_relative_eq!(maxima[1].unwrap(), 5.0);
        assert_relative_eq!(maxima[2].unwrap(), 5.0);
        assert_relative_eq!(maxima[3].unwrap(), 3.0);
    }

    #[test]
    fn pct_change_matches_ratio() {
        let changes = pct_change(&[100.0, 110.0, 99.0], 1);
        assert_eq!(changes[0], None);
        assert_relative_eq!(changes[1].unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(changes[2].unwrap(), -0.10, epsilon = 1e-12);
    }
}
