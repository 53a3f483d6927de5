use chrono::NaiveDate;
use vixstats::{analyze, AlignedSeries, AnalysisParams, PriceSeries, ReportOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Build a synthetic daily volatility/equity pair for ~4 years with
    // two stress episodes.
    let start = NaiveDate::from_ymd_opt(2018, 1, 2).expect("valid date");
    let n = 1000;

    let mut dates = Vec::with_capacity(n);
    let mut vix = Vec::with_capacity(n);
    let mut spx = Vec::with_capacity(n);

    for i in 0..n {
        dates.push(start + chrono::Days::new(i as u64));

        // Calm base regime with a slow drift and two spikes.
        let base = 13.0 + ((i % 11) as f64) * 0.5;
        let stress = match i {
            300..=320 => 40.0 * (1.0 - (i as f64 - 310.0).abs() / 11.0),
            700..=730 => 55.0 * (1.0 - (i as f64 - 715.0).abs() / 16.0),
            _ => 0.0,
        };
        vix.push(base + stress);

        let trend = 2500.0_f64 * (1.0_f64 + 0.0002).powi(i as i32);
        let shock = match i {
            305..=360 => -0.12 * (1.0 - (i as f64 - 330.0).abs() / 30.0).max(0.0),
            705..=820 => -0.25 * (1.0 - (i as f64 - 760.0).abs() / 60.0).max(0.0),
            _ => 0.0,
        };
        spx.push(trend * (1.0 + shock));
    }

    let vix = PriceSeries::new(dates.clone(), vix, Some("VIX".to_string()))?;
    let spx = PriceSeries::new(dates, spx, Some("SP500".to_string()))?;

    let series = AlignedSeries::align(&vix, &spx, &[20, 60, 120, 250])?;
    let analysis = analyze(&series, &AnalysisParams::default())?;

    let options = ReportOptions::default()
        .with_title("Synthetic Volatility Peak Analysis")
        .with_charts_dir("report")
        .with_output("report/vix_analysis.md");

    let doc = vixstats::markdown(&series, &analysis, &options)?;

    println!(
        "Wrote report/vix_analysis.md ({} bytes) covering {} peaks",
        doc.len(),
        analysis.recoveries.len()
    );

    Ok(())
}
