use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::bins::{aggregate_forward_returns, ReturnBinStats, VolBuckets};
use crate::peaks::{detect_peaks, PeakFlag, PeakParams};
use crate::percentile::{annotate_volatility, PercentileAnnotations};
use crate::recovery::{analyze_recoveries, RecoveryParams, RecoveryRecord};
use crate::utils::{AlignedSeries, DataError};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisParams {
    pub peak: PeakParams,
    pub recovery: RecoveryParams,
    pub buckets: VolBuckets,
}

impl AnalysisParams {
    pub fn with_peak(mut self, peak: PeakParams) -> Self {
        self.peak = peak;
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryParams) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_buckets(mut self, buckets: VolBuckets) -> Self {
        self.buckets = buckets;
        self
    }
}

/// Everything the engine derives from one aligned series. Each field is
/// produced by one stage from read-only inputs and never mutated after.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VixAnalysis {
    pub annotations: PercentileAnnotations,
    pub flags: Vec<PeakFlag>,
    pub recoveries: Vec<RecoveryRecord>,
    pub return_stats: BTreeMap<usize, Vec<(String, ReturnBinStats)>>,
}

/// Run the full pipeline: percentile annotation, peak detection,
/// recovery measurement, forward-return aggregation. Deterministic for
/// identical inputs and parameters.
pub fn analyze(series: &AlignedSeries, params: &AnalysisParams) -> Result<VixAnalysis, DataError> {
    if series.is_empty() {
        return Err(DataError::Empty);
    }

    let annotations = annotate_volatility(series);
    debug!("annotated {} rows with percentile ranks", series.len());

    let flags = detect_peaks(&series.volatility, &annotations.pct_all, &params.peak);
    let local = flags.iter().filter(|f| f.is_local_peak).count();
    let extreme = flags.iter().filter(|f| f.is_extreme_peak).count();
    info!("detected {local} local peaks, {extreme} extreme rows");

    let recoveries = analyze_recoveries(series, &flags, &params.recovery);
    debug!(
        "measured {} recovery records ({} unresolved)",
        recoveries.len(),
        recoveries.iter().filter(|r| r.recovery_date.is_none()).count()
    );

    let return_stats = aggregate_forward_returns(series, &params.buckets);

    Ok(VixAnalysis {
        annotations,
        flags,
        recoveries,
        return_stats,
    })
}
