mod analysis;
mod bins;
mod peaks;
mod percentile;
mod plots;
mod recovery;
mod reports;
mod utils;

pub use crate::analysis::{analyze, AnalysisParams, VixAnalysis};
pub use crate::bins::{aggregate_forward_returns, ReturnBinStats, VolBuckets};
pub use crate::peaks::{detect_peaks, PeakFlag, PeakParams, EXTREME_PERCENTILE};
pub use crate::percentile::{
    annotate_volatility, expanding_percentile, pct_change, rolling_max, rolling_percentile,
    PercentileAnnotations, WINDOW_1Y, WINDOW_2Y,
};
pub use crate::recovery::{analyze_recoveries, RecoveryParams, RecoveryRecord};
pub use crate::reports::{horizon_label, markdown, ReportError, ReportOptions};
pub use crate::utils::{AlignedSeries, DataError, PriceSeries, DEFAULT_HORIZONS};
