use crate::bins::ReturnBinStats;
use crate::peaks::PeakFlag;
use crate::recovery::RecoveryRecord;
use crate::utils::AlignedSeries;

const WIDTH: f64 = 576.0;
const HEIGHT: f64 = 288.0;
const PADDING: f64 = 36.0;
const EQUITY_COLOR: &str = "#2e86c1";
const VOL_COLOR: &str = "#e74c3c";
const BAR_COLOR: &str = "#2e86c1";
const NEUTRAL_COLOR: &str = "#95a5a6";

fn svg_open() -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="10">"#
    )
}

fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values {
        if v.is_finite() {
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }
    }
    if !min_v.is_finite() || !max_v.is_finite() {
        return None;
    }
    if min_v == max_v {
        let adjust = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 }; // widen flat ranges
        min_v -= adjust;
        max_v += adjust;
    }
    Some((min_v, max_v))
}

fn scale_x(index: usize, count: usize) -> f64 {
    let plot = WIDTH - 2.0 * PADDING;
    if count < 2 {
        return PADDING + plot / 2.0;
    }
    PADDING + index as f64 / (count - 1) as f64 * plot
}

fn scale_y(value: f64, min_v: f64, max_v: f64) -> f64 {
    let plot = HEIGHT - 2.0 * PADDING;
    PADDING + plot - (value - min_v) / (max_v - min_v) * plot
}

fn polyline(points: &[(f64, f64)], color: &str) -> String {
    let coords: Vec<String> = points
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect();
    format!(
        r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="1.5"/>"#,
        coords.join(" ")
    )
}

/// Equity and volatility lines on twin vertical scales, with a dashed
/// marker at every detected local peak.
pub(crate) fn overview(series: &AlignedSeries, flags: &[PeakFlag]) -> String {
    let mut svg = svg_open();
    let n = series.len();

    let equity_extent = extent(series.equity.iter().copied());
    let vol_extent = extent(series.volatility.iter().copied());
    let (Some((eq_min, eq_max)), Some((vol_min, vol_max))) = (equity_extent, vol_extent) else {
        svg.push_str("</svg>");
        return svg;
    };

    for (i, flag) in flags.iter().enumerate().take(n) {
        if flag.is_local_peak {
            let x = scale_x(i, n);
            svg.push_str(&format!(
                r#"<line x1="{x:.1}" y1="{PADDING}" x2="{x:.1}" y2="{:.1}" stroke="{VOL_COLOR}" stroke-dasharray="3 3" opacity="0.4"/>"#,
                HEIGHT - PADDING
            ));
        }
    }

    let equity_points: Vec<(f64, f64)> = series
        .equity
        .iter()
        .enumerate()
        .map(|(i, v)| (scale_x(i, n), scale_y(*v, eq_min, eq_max)))
        .collect();
    svg.push_str(&polyline(&equity_points, EQUITY_COLOR));

    let vol_points: Vec<(f64, f64)> = series
        .volatility
        .iter()
        .enumerate()
        .map(|(i, v)| (scale_x(i, n), scale_y(*v, vol_min, vol_max)))
        .collect();
    svg.push_str(&polyline(&vol_points, VOL_COLOR));

    let equity_label = series.equity_name.as_deref().unwrap_or("Equity");
    let vol_label = series.volatility_name.as_deref().unwrap_or("Volatility");
    svg.push_str(&format!(
        r#"<text x="{PADDING}" y="{:.1}" fill="{EQUITY_COLOR}">{equity_label}</text>"#,
        PADDING - 8.0
    ));
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" fill="{VOL_COLOR}" text-anchor="end">{vol_label}</text>"#,
        WIDTH - PADDING,
        PADDING - 8.0
    ));

    svg.push_str("</svg>");
    svg
}

/// Peak volatility against maximum drawdown. Resolved recoveries are
/// filled, unresolved ones hollow.
pub(crate) fn recovery_scatter(records: &[RecoveryRecord]) -> String {
    let mut svg = svg_open();

    let x_extent = extent(records.iter().map(|r| r.vix_at_peak));
    let y_extent = extent(records.iter().map(|r| r.drawdown).chain([0.0]));
    let (Some((x_min, x_max)), Some((y_min, y_max))) = (x_extent, y_extent) else {
        svg.push_str("</svg>");
        return svg;
    };

    let zero_y = scale_y(0.0, y_min, y_max);
    svg.push_str(&format!(
        r#"<line x1="{PADDING}" y1="{zero_y:.1}" x2="{:.1}" y2="{zero_y:.1}" stroke="{NEUTRAL_COLOR}" opacity="0.5"/>"#,
        WIDTH - PADDING
    ));

    let plot = WIDTH - 2.0 * PADDING;
    for record in records {
        let x = PADDING + (record.vix_at_peak - x_min) / (x_max - x_min) * plot;
        let y = scale_y(record.drawdown, y_min, y_max);
        if record.recovery_date.is_some() {
            svg.push_str(&format!(
                r#"<circle cx="{x:.1}" cy="{y:.1}" r="4" fill="{VOL_COLOR}" opacity="0.7"/>"#
            ));
        } else {
            svg.push_str(&format!(
                r#"<circle cx="{x:.1}" cy="{y:.1}" r="4" fill="none" stroke="{VOL_COLOR}"/>"#
            ));
        }
    }

    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">Peak volatility vs drawdown</text>"#,
        WIDTH / 2.0,
        PADDING - 8.0
    ));

    svg.push_str("</svg>");
    svg
}

/// Mean forward return per volatility bucket for one horizon.
pub(crate) fn bucket_returns(rows: &[(String, ReturnBinStats)], horizon_label: &str) -> String {
    let mut svg = svg_open();

    let y_extent = extent(rows.iter().map(|(_, s)| s.mean).chain([0.0]));
    let Some((y_min, y_max)) = y_extent else {
        svg.push_str("</svg>");
        return svg;
    };

    if rows.is_empty() {
        svg.push_str("</svg>");
        return svg;
    }

    let zero_y = scale_y(0.0, y_min, y_max);
    svg.push_str(&format!(
        r#"<line x1="{PADDING}" y1="{zero_y:.1}" x2="{:.1}" y2="{zero_y:.1}" stroke="{NEUTRAL_COLOR}" opacity="0.5"/>"#,
        WIDTH - PADDING
    ));

    let plot = WIDTH - 2.0 * PADDING;
    let slot = plot / rows.len() as f64;
    let bar_width = slot * 0.6;

    for (i, (label, stats)) in rows.iter().enumerate() {
        let x = PADDING + i as f64 * slot + (slot - bar_width) / 2.0;
        let value_y = scale_y(stats.mean, y_min, y_max);
        let (top, height) = if stats.mean >= 0.0 {
            (value_y, zero_y - value_y)
        } else {
            (zero_y, value_y - zero_y)
        };
        svg.push_str(&format!(
            r#"<rect x="{x:.1}" y="{top:.1}" width="{bar_width:.1}" height="{height:.1}" fill="{BAR_COLOR}" opacity="0.7"/>"#
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{label}</text>"#,
            x + bar_width / 2.0,
            HEIGHT - PADDING + 12.0
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{:.1}%</text>"#,
            x + bar_width / 2.0,
            top - 4.0,
            stats.mean * 100.0
        ));
    }

    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">Mean {horizon_label} return by volatility level</text>"#,
        WIDTH / 2.0,
        PADDING - 8.0
    ));

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series() -> AlignedSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        AlignedSeries {
            dates: (0..5).map(|i| start + chrono::Days::new(i)).collect(),
            volatility: vec![10.0, 12.0, 40.0, 12.0, 11.0],
            equity: vec![100.0, 99.0, 90.0, 95.0, 100.0],
            horizons: Vec::new(),
            forward_returns: Vec::new(),
            volatility_name: Some("VIX".into()),
            equity_name: Some("SP500".into()),
        }
    }

    #[test]
    fn overview_draws_both_lines_and_peak_markers() {
        let mut flags = vec![PeakFlag::default(); 5];
        flags[2].is_local_peak = true;

        let svg = overview(&series(), &flags);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert_eq!(svg.matches("stroke-dasharray").count(), 1);
        assert!(svg.contains("VIX"));
        assert!(svg.contains("SP500"));
    }

    #[test]
    fn scatter_distinguishes_unresolved_records() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 16).unwrap();
        let records = vec![
            RecoveryRecord {
                peak_date: date,
                vix_at_peak: 82.7,
                trough_date: date + chrono::Days::new(7),
                drawdown: -0.25,
                recovery_date: Some(date + chrono::Days::new(150)),
                recovery_days: Some(150),
            },
            RecoveryRecord {
                peak_date: date + chrono::Days::new(300),
                vix_at_peak: 45.0,
                trough_date: date + chrono::Days::new(310),
                drawdown: -0.08,
                recovery_date: None,
                recovery_days: None,
            },
        ];

        let svg = recovery_scatter(&records);
        assert_eq!(svg.matches("<circle").count(), 2);
        assert_eq!(svg.matches(r#"fill="none""#).count(), 1);
    }

    #[test]
    fn bar_chart_renders_one_bar_per_bucket() {
        let rows = vec![
            (
                "<20".to_string(),
                ReturnBinStats {
                    mean: 0.05,
                    median: 0.04,
                    min: -0.1,
                    max: 0.2,
                    positive_fraction: 0.7,
                    count: 10,
                },
            ),
            (
                ">50".to_string(),
                ReturnBinStats {
                    mean: -0.02,
                    median: -0.01,
                    min: -0.3,
                    max: 0.1,
                    positive_fraction: 0.4,
                    count: 4,
                },
            ),
        ];

        let svg = bucket_returns(&rows, "1-year");
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains("Mean 1-year return by volatility level"));
    }

    #[test]
    fn empty_inputs_produce_empty_documents() {
        let svg = recovery_scatter(&[]);
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("<circle"));
    }
}
