use chrono::NaiveDate;
use thiserror::Error;

/// Forward-return horizons, in trading observations, matching the
/// 1m/3m/6m/1y/2y/3y/5y ladder used throughout the analysis.
pub const DEFAULT_HORIZONS: [usize; 7] = [20, 60, 120, 250, 500, 750, 1250];

#[derive(Debug, Error)]
pub enum DataError {
    #[error("time series is empty")]
    Empty,
    #[error("time series length mismatch: {dates} dates vs {values} values")]
    LengthMismatch { dates: usize, values: usize },
    #[error("duplicate date {date} in series")]
    DuplicateDate { date: NaiveDate },
    #[error("series row count mismatch: {left} vs {right}")]
    SeriesLengthMismatch { left: usize, right: usize },
    #[error("series dates diverge at row {index}: {left} vs {right}")]
    Misaligned {
        index: usize,
        left: NaiveDate,
        right: NaiveDate,
    },
    #[error("non-finite {column} value at row {index} ({date})")]
    NonFinite {
        column: &'static str,
        index: usize,
        date: NaiveDate,
    },
    #[error("forward-return horizons must be non-zero and strictly ascending")]
    InvalidHorizons,
    #[error("bucket edges must be finite, strictly ascending, and non-empty")]
    InvalidBucketEdges,
}

/// One observed daily series (a volatility index, an equity index).
#[derive(Clone, Debug)]
pub struct PriceSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
    pub name: Option<String>,
}

impl PriceSeries {
    pub fn new(
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
        name: Option<String>,
    ) -> Result<Self, DataError> {
        if dates.is_empty() || values.is_empty() {
            return Err(DataError::Empty);
        }

        if dates.len() != values.len() {
            return Err(DataError::LengthMismatch {
                dates: dates.len(),
                values: values.len(),
            });
        }

        let mut paired: Vec<(NaiveDate, f64)> = dates.into_iter().zip(values.into_iter()).collect();
        paired.sort_by_key(|(d, _)| *d);

        // A duplicated date would make the join key ambiguous downstream.
        for pair in paired.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(DataError::DuplicateDate { date: pair[0].0 });
            }
        }

        let (sorted_dates, sorted_values): (Vec<_>, Vec<_>) = paired.into_iter().unzip();

        Ok(Self {
            dates: sorted_dates,
            values: sorted_values,
            name,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Volatility and equity observations joined on a shared, strictly
/// increasing date index, with forward equity returns precomputed per
/// horizon and unresolved tail rows already dropped.
#[derive(Clone, Debug)]
pub struct AlignedSeries {
    pub dates: Vec<NaiveDate>,
    pub volatility: Vec<f64>,
    pub equity: Vec<f64>,
    /// Horizons in observations, strictly ascending.
    pub horizons: Vec<usize>,
    /// `forward_returns[k][i]` = equity return over `horizons[k]`
    /// observations starting at row `i`.
    pub forward_returns: Vec<Vec<f64>>,
    pub volatility_name: Option<String>,
    pub equity_name: Option<String>,
}

impl AlignedSeries {
    /// Join the two series on their date index and precompute forward
    /// returns. Fails on the first date divergence rather than silently
    /// reindexing; a reindex would shift every drawdown and recovery
    /// measurement downstream.
    pub fn align(
        volatility: &PriceSeries,
        equity: &PriceSeries,
        horizons: &[usize],
    ) -> Result<Self, DataError> {
        if volatility.is_empty() || equity.is_empty() {
            return Err(DataError::Empty);
        }

        let common = volatility.len().min(equity.len());
        for i in 0..common {
            if volatility.dates[i] != equity.dates[i] {
                return Err(DataError::Misaligned {
                    index: i,
                    left: volatility.dates[i],
                    right: equity.dates[i],
                });
            }
        }
        if volatility.len() != equity.len() {
            return Err(DataError::SeriesLengthMismatch {
                left: volatility.len(),
                right: equity.len(),
            });
        }

        check_finite("volatility", &volatility.values, &volatility.dates)?;
        check_finite("equity", &equity.values, &equity.dates)?;

        if !horizons.is_empty() {
            let ascending = horizons.windows(2).all(|w| w[0] < w[1]);
            if horizons[0] == 0 || !ascending {
                return Err(DataError::InvalidHorizons);
            }
        }

        let n = equity.len();
        let max_horizon = horizons.last().copied().unwrap_or(0);
        let rows = n.saturating_sub(max_horizon);
        if rows == 0 {
            return Err(DataError::Empty);
        }

        let mut forward_returns = Vec::with_capacity(horizons.len());
        for &h in horizons {
            let mut column = Vec::with_capacity(rows);
            for i in 0..rows {
                let fwd = equity.values[i + h] / equity.values[i] - 1.0;
                if !fwd.is_finite() {
                    return Err(DataError::NonFinite {
                        column: "forward_return",
                        index: i,
                        date: equity.dates[i],
                    });
                }
                column.push(fwd);
            }
            forward_returns.push(column);
        }

        Ok(Self {
            dates: equity.dates[..rows].to_vec(),
            volatility: volatility.values[..rows].to_vec(),
            equity: equity.values[..rows].to_vec(),
            horizons: horizons.to_vec(),
            forward_returns,
            volatility_name: volatility.name.clone(),
            equity_name: equity.name.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.dates.first(), self.dates.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        }
    }
}

fn check_finite(
    column: &'static str,
    values: &[f64],
    dates: &[NaiveDate],
) -> Result<(), DataError> {
    for (i, v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(DataError::NonFinite {
                column,
                index: i,
                date: dates[i],
            });
        }
    }
    Ok(())
}
