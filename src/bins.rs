use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utils::{AlignedSeries, DataError};

/// Ordered volatility-level buckets. Each bucket is half-open and
/// lower-inclusive; the last is unbounded above. Values below the first
/// edge fall in no bucket and are excluded from aggregation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VolBuckets {
    edges: Vec<f64>,
}

impl Default for VolBuckets {
    fn default() -> Self {
        Self {
            edges: vec![0.0, 20.0, 30.0, 40.0, 50.0],
        }
    }
}

impl VolBuckets {
    pub fn from_edges(edges: Vec<f64>) -> Result<Self, DataError> {
        let finite = edges.iter().all(|e| e.is_finite());
        let ascending = edges.windows(2).all(|w| w[0] < w[1]);
        if edges.is_empty() || !finite || !ascending {
            return Err(DataError::InvalidBucketEdges);
        }
        Ok(Self { edges })
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Bucket index for a volatility value, or `None` below the first edge.
    pub fn bucket_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || value < self.edges[0] {
            return None;
        }
        let above = self.edges.iter().filter(|e| **e <= value).count();
        Some(above - 1)
    }

    /// Human-readable label: `<20` for the first bucket, `20-30` for
    /// interior ones, `>50` for the unbounded last.
    pub fn label(&self, index: usize) -> String {
        let lo = fmt_edge(self.edges[index]);
        if index + 1 == self.edges.len() {
            format!(">{lo}")
        } else if index == 0 {
            format!("<{}", fmt_edge(self.edges[1]))
        } else {
            format!("{lo}-{}", fmt_edge(self.edges[index + 1]))
        }
    }
}

fn fmt_edge(edge: f64) -> String {
    if edge.fract() == 0.0 {
        format!("{}", edge as i64)
    } else {
        format!("{edge}")
    }
}

/// Distribution of one horizon's forward returns within one bucket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReturnBinStats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Fraction of returns strictly greater than zero.
    pub positive_fraction: f64,
    pub count: usize,
}

impl ReturnBinStats {
    fn from_returns(returns: &[f64]) -> Self {
        let n = returns.len();
        let mut sorted = returns.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Self {
            mean: sorted.iter().sum::<f64>() / n as f64,
            median,
            min: sorted[0],
            max: sorted[n - 1],
            positive_fraction: sorted.iter().filter(|r| **r > 0.0).count() as f64 / n as f64,
            count: n,
        }
    }
}

/// Aggregate forward returns per (horizon, volatility bucket).
///
/// Each row is assigned to exactly one bucket by its same-day volatility
/// value. Buckets with no observations are omitted rather than reported
/// as zero. Pure aggregation; peak flags play no part here.
pub fn aggregate_forward_returns(
    series: &AlignedSeries,
    buckets: &VolBuckets,
) -> BTreeMap<usize, Vec<(String, ReturnBinStats)>> {
    let assignment: Vec<Option<usize>> = series
        .volatility
        .iter()
        .map(|v| buckets.bucket_of(*v))
        .collect();

    let mut out = BTreeMap::new();
    for (k, &horizon) in series.horizons.iter().enumerate() {
        let mut per_bucket: Vec<Vec<f64>> = vec![Vec::new(); buckets.len()];
        for (i, bucket) in assignment.iter().enumerate() {
            if let Some(b) = bucket {
                per_bucket[*b].push(series.forward_returns[k][i]);
            }
        }

        let rows: Vec<(String, ReturnBinStats)> = per_bucket
            .iter()
            .enumerate()
            .filter(|(_, returns)| !returns.is_empty())
            .map(|(b, returns)| (buckets.label(b), ReturnBinStats::from_returns(returns)))
            .collect();
        out.insert(horizon, rows);
    }

    out
}
