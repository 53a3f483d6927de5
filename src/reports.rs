use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::analysis::VixAnalysis;
use crate::percentile::{pct_change, rolling_max, WINDOW_1Y};
use crate::plots;
use crate::utils::{AlignedSeries, DataError};

const DEFAULT_TITLE: &str = "Volatility Peak Analysis";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct ReportOptions {
    pub title: String,
    pub output: Option<PathBuf>,
    /// When set, the SVG charts are rendered into this directory and
    /// referenced from the document.
    pub charts_dir: Option<PathBuf>,
    /// Horizon highlighted in the bucket-returns chart.
    pub chart_horizon: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            output: None,
            charts_dir: None,
            chart_horizon: 250,
        }
    }
}

impl ReportOptions {
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_output<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_charts_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.charts_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_chart_horizon(mut self, horizon: usize) -> Self {
        self.chart_horizon = horizon;
        self
    }
}

/// Render the Markdown report for a finished analysis, optionally
/// writing it (and the charts) to disk.
pub fn markdown(
    series: &AlignedSeries,
    analysis: &VixAnalysis,
    options: &ReportOptions,
) -> Result<String, ReportError> {
    if series.is_empty() {
        return Err(ReportError::Data(DataError::Empty));
    }

    let vol_label = series.volatility_name.as_deref().unwrap_or("Volatility");
    let equity_label = series.equity_name.as_deref().unwrap_or("Equity");

    let mut doc = String::new();
    doc.push_str(&format!("# {}\n\n", options.title));

    push_summary(&mut doc, series, analysis, vol_label);
    push_correlation(&mut doc, series, vol_label, equity_label);
    push_recovery(&mut doc, analysis, vol_label);
    push_forward_returns(&mut doc, analysis, vol_label);

    if let Some(dir) = &options.charts_dir {
        std::fs::create_dir_all(dir)?;
        write_charts(&mut doc, series, analysis, options, dir)?;
    }

    if let Some(path) = &options.output {
        std::fs::write(path, &doc)?;
    }

    Ok(doc)
}

fn push_summary(doc: &mut String, series: &AlignedSeries, analysis: &VixAnalysis, vol_label: &str) {
    doc.push_str("## 1. Summary\n");

    if let Some((start, end)) = series.date_range() {
        doc.push_str(&format!(
            "* Analysis period: {} to {}\n",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ));
    }

    let peak_count = analysis.flags.iter().filter(|f| f.is_local_peak).count();
    doc.push_str(&format!("* Identified {vol_label} peaks: {peak_count}\n"));

    if let Some((row, max)) = series
        .volatility
        .iter()
        .enumerate()
        // Strict comparison keeps the first occurrence on ties.
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, m)) if *v <= m => best,
            _ => Some((i, *v)),
        })
    {
        doc.push_str(&format!(
            "* Historical {vol_label} maximum: {max:.2} on {}\n",
            series.dates[row].format("%Y-%m-%d")
        ));
    }

    let one_year_highs = rolling_max(&series.volatility, WINDOW_1Y)
        .iter()
        .zip(&series.volatility)
        .filter(|(m, v)| **m == Some(**v))
        .count();
    doc.push_str(&format!(
        "* Days at a one-year {vol_label} high: {one_year_highs}\n"
    ));

    let sharpest_surge = pct_change(&series.volatility, 20)
        .into_iter()
        .flatten()
        .fold(f64::NEG_INFINITY, f64::max);
    if sharpest_surge.is_finite() {
        doc.push_str(&format!(
            "* Sharpest 20-day {vol_label} surge: {}\n",
            fmt_pct(sharpest_surge)
        ));
    }
    doc.push('\n');
}

fn push_correlation(doc: &mut String, series: &AlignedSeries, vol_label: &str, equity_label: &str) {
    doc.push_str(&format!("## 2. {vol_label} / {equity_label} correlation\n"));
    let corr = pearson(&series.volatility, &series.equity);
    doc.push_str(&format!(
        "* Correlation coefficient: {corr:.4}\n* A negative value means the equity index tends to fall as {vol_label} rises.\n\n"
    ));
}

fn push_recovery(doc: &mut String, analysis: &VixAnalysis, vol_label: &str) {
    if analysis.recoveries.is_empty() {
        return;
    }
    let records = &analysis.recoveries;

    doc.push_str(&format!("## 3. Market behavior after {vol_label} peaks\n"));

    let drawdowns: Vec<f64> = records.iter().map(|r| r.drawdown).collect();
    doc.push_str(&format!(
        "* Average maximum drawdown: {}\n",
        fmt_pct(mean(&drawdowns))
    ));

    let resolved: Vec<&crate::recovery::RecoveryRecord> = records
        .iter()
        .filter(|r| r.recovery_days.is_some())
        .collect();
    if !resolved.is_empty() {
        let days: Vec<f64> = resolved
            .iter()
            .filter_map(|r| r.recovery_days)
            .map(f64::from)
            .collect();
        doc.push_str(&format!("* Average recovery time: {:.0} days\n", mean(&days)));

        let vix: Vec<f64> = resolved.iter().map(|r| r.vix_at_peak).collect();
        doc.push_str(&format!(
            "* Peak {vol_label} vs recovery time correlation: {:.4}\n",
            pearson(&vix, &days)
        ));
    }

    let vix_all: Vec<f64> = records.iter().map(|r| r.vix_at_peak).collect();
    doc.push_str(&format!(
        "* Peak {vol_label} vs drawdown correlation: {:.4}\n",
        pearson(&vix_all, &drawdowns)
    ));

    let unresolved = records.len() - resolved.len();
    if unresolved > 0 {
        doc.push_str(&format!(
            "* Peaks not yet recovered within the horizon: {unresolved}\n"
        ));
    }
    doc.push('\n');

    doc.push_str("### Peak events\n");
    doc.push_str(&format!(
        "| Date | {vol_label} | Max drawdown | Recovery days |\n|------|------|--------------|---------------|\n"
    ));
    for record in records.iter() {
        let days = record
            .recovery_days
            .map(|d| d.to_string())
            .unwrap_or_else(|| "—".to_string());
        doc.push_str(&format!(
            "| {} | {:.2} | {} | {} |\n",
            record.peak_date.format("%Y-%m-%d"),
            record.vix_at_peak,
            fmt_pct(record.drawdown),
            days
        ));
    }
    doc.push('\n');
}

fn push_forward_returns(doc: &mut String, analysis: &VixAnalysis, vol_label: &str) {
    doc.push_str(&format!("## 4. Forward returns by {vol_label} level\n\n"));

    for (horizon, rows) in &analysis.return_stats {
        if rows.is_empty() {
            continue;
        }
        doc.push_str(&format!("### {} forward returns\n", horizon_label(*horizon)));
        doc.push_str(&format!(
            "| {vol_label} range | Mean | Median | Min | Max | Positive | Count |\n"
        ));
        doc.push_str("|-------|------|--------|-----|-----|----------|-------|\n");
        for (label, stats) in rows {
            doc.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                label,
                fmt_pct(stats.mean),
                fmt_pct(stats.median),
                fmt_pct(stats.min),
                fmt_pct(stats.max),
                fmt_pct(stats.positive_fraction),
                stats.count
            ));
        }
        doc.push('\n');
    }
}

fn write_charts(
    doc: &mut String,
    series: &AlignedSeries,
    analysis: &VixAnalysis,
    options: &ReportOptions,
    dir: &Path,
) -> Result<(), ReportError> {
    doc.push_str("## 5. Charts\n\n");

    let overview = plots::overview(series, &analysis.flags);
    std::fs::write(dir.join("overview.svg"), overview)?;
    doc.push_str("![Series overview](overview.svg)\n\n");

    if !analysis.recoveries.is_empty() {
        let scatter = plots::recovery_scatter(&analysis.recoveries);
        std::fs::write(dir.join("recovery.svg"), scatter)?;
        doc.push_str("![Peak recovery](recovery.svg)\n\n");
    }

    if let Some(rows) = analysis.return_stats.get(&options.chart_horizon) {
        if !rows.is_empty() {
            let bars = plots::bucket_returns(rows, &horizon_label(options.chart_horizon));
            std::fs::write(dir.join("forward_returns.svg"), bars)?;
            doc.push_str("![Forward returns](forward_returns.svg)\n\n");
        }
    }

    Ok(())
}

/// Friendly name for the standard horizon ladder; raw observation count
/// otherwise.
pub fn horizon_label(horizon: usize) -> String {
    match horizon {
        20 => "1-month".to_string(),
        60 => "3-month".to_string(),
        120 => "6-month".to_string(),
        250 => "1-year".to_string(),
        500 => "2-year".to_string(),
        750 => "3-year".to_string(),
        1250 => "5-year".to_string(),
        other => format!("{other}-observation"),
    }
}

fn fmt_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let xs = &xs[..n];
    let ys = &ys[..n];

    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        var_x += (x - mx) * (x - mx);
        var_y += (y - my) * (y - my);
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        cov / denom
    }
}
