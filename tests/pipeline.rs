use approx::assert_relative_eq;
use chrono::NaiveDate;
use vixstats::{
    analyze, AlignedSeries, AnalysisParams, PeakParams, PriceSeries, ReportOptions,
};

/// Consecutive calendar days with one three-day jump between rows 17
/// and 18, so calendar-day and row-count measurements disagree.
fn dates_with_weekend(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2022, 5, 2).unwrap();
    let mut dates = Vec::with_capacity(n);
    let mut offset = 0u64;
    for i in 0..n {
        dates.push(start + chrono::Days::new(offset));
        offset += if i == 17 { 3 } else { 1 };
    }
    dates
}

fn stress_scenario() -> AlignedSeries {
    let n = 30;
    let dates = dates_with_weekend(n);

    let mut vix = Vec::with_capacity(n);
    let mut spx = Vec::with_capacity(n);
    for i in 0..n {
        // Period-3 oscillation: its maxima tie within the peak window
        // and can never qualify as strict local maxima.
        vix.push(if i == 15 { 80.0 } else { 10.0 + (i % 3) as f64 * 0.2 });
        spx.push(match i {
            16 => 90.0,
            17 => 95.0,
            18 => 100.0,
            19..=29 => 105.0,
            _ => 100.0,
        });
    }

    let vix = PriceSeries::new(dates.clone(), vix, Some("VIX".into())).unwrap();
    let spx = PriceSeries::new(dates, spx, Some("SP500".into())).unwrap();
    AlignedSeries::align(&vix, &spx, &[5]).unwrap()
}

fn params() -> AnalysisParams {
    AnalysisParams::default().with_peak(PeakParams::default().with_window(3))
}

#[test]
fn spike_drawdown_and_calendar_recovery() {
    let series = stress_scenario();
    let analysis = analyze(&series, &params()).unwrap();

    let peaks: Vec<usize> = analysis
        .flags
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_local_peak)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(peaks, vec![15]);

    assert_eq!(analysis.recoveries.len(), 1);
    let record = &analysis.recoveries[0];
    assert_relative_eq!(record.drawdown, -0.10, epsilon = 1e-12);
    assert_eq!(record.trough_date, series.dates[16]);
    assert_eq!(record.recovery_date, Some(series.dates[18]));

    // Two of the three steps to recovery are single days, the third
    // spans the weekend: 1 + 1 + 3.
    assert_eq!(record.recovery_days, Some(5));
    assert_eq!(
        i64::from(record.recovery_days.unwrap()),
        (series.dates[18] - series.dates[15]).num_days()
    );
}

#[test]
fn recovery_level_is_the_pre_peak_equity() {
    let series = stress_scenario();
    let analysis = analyze(&series, &params()).unwrap();
    let record = &analysis.recoveries[0];

    let peak_row = 15;
    let recovery_row = 18;
    assert!(series.equity[recovery_row] >= series.equity[peak_row]);
    // Strictly below the pre-peak level everywhere between trough and
    // recovery (earliest crossing).
    for row in 16..recovery_row {
        assert!(series.equity[row] < series.equity[peak_row]);
    }
    assert!(record.drawdown <= 0.0);
}

#[test]
fn aggregation_splits_calm_and_stressed_rows() {
    let series = stress_scenario();
    let analysis = analyze(&series, &params()).unwrap();

    let rows = &analysis.return_stats[&5];
    let labels: Vec<&str> = rows.iter().map(|(label, _)| label.as_str()).collect();
    // Base regime sits below 20, the spike above 50; nothing in between.
    assert_eq!(labels, vec!["<20", ">50"]);

    let (_, calm) = &rows[0];
    let (_, stressed) = &rows[1];
    assert_eq!(calm.count + stressed.count, series.len());
    assert_eq!(stressed.count, 1);
    // The spike row's 5-observation forward return: 105 / 100 - 1.
    assert_relative_eq!(stressed.mean, 0.05, epsilon = 1e-12);
    assert_relative_eq!(stressed.median, stressed.mean);
}

#[test]
fn full_pipeline_is_deterministic() {
    let series = stress_scenario();
    let first = analyze(&series, &params()).unwrap();
    let second = analyze(&series, &params()).unwrap();

    assert_eq!(first.recoveries, second.recoveries);
    assert_eq!(first.return_stats, second.return_stats);
    assert_eq!(first.flags, second.flags);

    let options = ReportOptions::default().with_chart_horizon(5);
    let report_a = vixstats::markdown(&series, &first, &options).unwrap();
    let report_b = vixstats::markdown(&series, &second, &options).unwrap();
    assert_eq!(report_a, report_b);
}

#[test]
fn annotations_expose_the_expected_windows() {
    let series = stress_scenario();
    let analysis = analyze(&series, &params()).unwrap();

    let annotations = &analysis.annotations;
    assert_eq!(annotations.pct_all.len(), series.len());
    // 250/500-row windows never fill on a 25-row series.
    assert!(annotations.pct_1y.iter().all(Option::is_none));
    assert!(annotations.pct_2y.iter().all(Option::is_none));
    // The spike ranks highest in all history to date.
    assert_relative_eq!(annotations.pct_all[15], 1.0);
}
