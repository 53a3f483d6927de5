use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Fixed percentile threshold for the extreme-regime flag.
pub const EXTREME_PERCENTILE: f64 = 0.95;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakFlag {
    pub is_local_peak: bool,
    pub is_extreme_peak: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeakParams {
    /// Symmetric look-around length, in observations.
    pub window: usize,
    /// All-history percentile a local peak must exceed.
    pub percentile_threshold: f64,
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            window: 20,
            percentile_threshold: 0.90,
        }
    }
}

impl PeakParams {
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_percentile_threshold(mut self, threshold: f64) -> Self {
        self.percentile_threshold = threshold;
        self
    }
}

/// Flag local volatility peaks and extreme-percentile rows.
///
/// A row is a local peak iff it has `window` observations on both sides,
/// strictly exceeds the maximum over the `window` rows before it and the
/// `window` rows after it, and its all-history percentile exceeds the
/// threshold. Exact ties with a window maximum never qualify, so plateaus
/// of equal extreme values produce no peak at all; that mirrors the
/// strict-inequality policy this detector is specified with.
///
/// The extreme flag is a pure percentile predicate and is set regardless
/// of local-peak status.
pub fn detect_peaks(volatility: &[f64], pct_all: &[f64], params: &PeakParams) -> Vec<PeakFlag> {
    let n = volatility.len();
    let mut flags = vec![PeakFlag::default(); n];

    for (flag, pct) in flags.iter_mut().zip(pct_all) {
        flag.is_extreme_peak = *pct > EXTREME_PERCENTILE;
    }

    let window = params.window;
    if window == 0 || n < 2 * window + 1 {
        return flags;
    }

    let before = window_max_before(volatility, window);
    let after = window_max_after(volatility, window);

    for i in window..n - window {
        if volatility[i] > before[i]
            && volatility[i] > after[i]
            && pct_all[i] > params.percentile_threshold
        {
            flags[i].is_local_peak = true;
        }
    }

    flags
}

/// `out[i]` = max of the `window` values strictly before `i`, for rows
/// with a full window; earlier rows hold negative infinity. Single pass
/// with a monotonic deque of candidate indices.
fn window_max_before(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NEG_INFINITY; n];
    let mut candidates: VecDeque<usize> = VecDeque::new();

    for i in 0..n {
        while let Some(&front) = candidates.front() {
            if front + window < i {
                candidates.pop_front();
            } else {
                break;
            }
        }
        if i >= window {
            if let Some(&front) = candidates.front() {
                out[i] = values[front];
            }
        }
        while let Some(&back) = candidates.back() {
            if values[back] <= values[i] {
                candidates.pop_back();
            } else {
                break;
            }
        }
        candidates.push_back(i);
    }

    out
}

/// Mirror of `window_max_before`: max of the `window` values strictly
/// after `i`.
fn window_max_after(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NEG_INFINITY; n];
    let mut candidates: VecDeque<usize> = VecDeque::new();

    for i in (0..n).rev() {
        while let Some(&front) = candidates.front() {
            if front > i + window {
                candidates.pop_front();
            } else {
                break;
            }
        }
        if i + window < n {
            if let Some(&front) = candidates.front() {
                out[i] = values[front];
            }
        }
        while let Some(&back) = candidates.back() {
            if values[back] <= values[i] {
                candidates.pop_back();
            } else {
                break;
            }
        }
        candidates.push_back(i);
    }

    out
}
