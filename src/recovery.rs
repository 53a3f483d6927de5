use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::peaks::PeakFlag;
use crate::utils::AlignedSeries;

/// Drawdown and recovery measurement for one detected volatility peak.
///
/// `recovery_date`/`recovery_days` are absent when the equity index did
/// not climb back to its pre-peak level within the recovery horizon; the
/// drawdown is still reported. A peak whose equity never dips below the
/// pre-peak level at all produces no record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub peak_date: NaiveDate,
    pub vix_at_peak: f64,
    pub trough_date: NaiveDate,
    /// Trough equity over peak equity minus one; never positive.
    pub drawdown: f64,
    pub recovery_date: Option<NaiveDate>,
    /// Calendar days from the peak to the first row at or above the
    /// pre-peak equity level.
    pub recovery_days: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecoveryParams {
    /// Observations scanned forward from the peak for the trough.
    pub trough_horizon: usize,
    /// Observations scanned forward from the trough for the recovery.
    pub recovery_horizon: usize,
}

impl Default for RecoveryParams {
    fn default() -> Self {
        Self {
            trough_horizon: 250,
            recovery_horizon: 750,
        }
    }
}

impl RecoveryParams {
    pub fn with_trough_horizon(mut self, horizon: usize) -> Self {
        self.trough_horizon = horizon;
        self
    }

    pub fn with_recovery_horizon(mut self, horizon: usize) -> Self {
        self.recovery_horizon = horizon;
        self
    }
}

/// Measure drawdown and recovery for every flagged local peak, in peak
/// order. Peaks are independent: each search window is anchored to its
/// own peak row and never clipped by a neighboring peak, so overlapping
/// windows are fine. The per-peak searches only read shared state and
/// the ordered collect keeps output identical to a sequential run.
pub fn analyze_recoveries(
    series: &AlignedSeries,
    flags: &[PeakFlag],
    params: &RecoveryParams,
) -> Vec<RecoveryRecord> {
    let peak_rows: Vec<usize> = flags
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_local_peak)
        .map(|(i, _)| i)
        .collect();

    peak_rows
        .par_iter()
        .filter_map(|&row| measure_from_peak(series, row, params))
        .collect()
}

fn measure_from_peak(
    series: &AlignedSeries,
    peak_row: usize,
    params: &RecoveryParams,
) -> Option<RecoveryRecord> {
    let equity_at_peak = series.equity[peak_row];

    // Trough: minimum equity within the horizon, first occurrence wins
    // on ties (strict improvement required to move the trough).
    let trough_end = (peak_row + params.trough_horizon).min(series.len());
    let mut trough_row = None;
    let mut trough_equity = equity_at_peak;
    for i in peak_row..trough_end {
        if series.equity[i] < trough_equity {
            trough_equity = series.equity[i];
            trough_row = Some(i);
        }
    }
    let trough_row = trough_row?;

    let drawdown = trough_equity / equity_at_peak - 1.0;

    // Recovery: earliest row at or above the pre-peak level, not the
    // maximum within the window.
    let recovery_end = (trough_row + params.recovery_horizon).min(series.len());
    let recovery_row = (trough_row..recovery_end).find(|&i| series.equity[i] >= equity_at_peak);

    Some(RecoveryRecord {
        peak_date: series.dates[peak_row],
        vix_at_peak: series.volatility[peak_row],
        trough_date: series.dates[trough_row],
        drawdown,
        recovery_date: recovery_row.map(|i| series.dates[i]),
        recovery_days: recovery_row
            .map(|i| (series.dates[i] - series.dates[peak_row]).num_days() as u32),
    })
}
