use chrono::{Local, NaiveDate};
use market_forecast::metrics::ForecastMetrics;
use market_forecast::{
    analyze_symbol, AnalysisConfig, CsvHistorySource, ForecastReport, HistorySource,
    InMemoryHistorySource, PriceSeries,
};
use std::env;

/// Two years of synthetic closes: drift, a trend break and a weekly rhythm
fn synthetic_history(end: NaiveDate) -> Result<PriceSeries, Box<dyn std::error::Error>> {
    let days = 730;
    let start = end - chrono::Duration::days(days - 1);
    let values = (0..days)
        .map(|i| {
            let x = i as f64;
            let trend = if i < 500 { 120.0 + 0.12 * x } else { 180.0 - 0.05 * (x - 500.0) };
            trend + 1.5 * (x * 2.0 * std::f64::consts::PI / 7.0).sin() + 0.8 * (x * 0.37).cos()
        })
        .collect();
    Ok(PriceSeries::daily(start, values)?)
}

fn print_report(report: &ForecastReport) {
    let summary = report.summary();
    println!(
        "{} closed at {:.2} on {}",
        report.symbol().unwrap_or("series"),
        summary.latest_price,
        summary.latest_date
    );
    if let Some(pct) = summary.change_pct {
        println!("  day change: {:+.2}%", pct);
    }
    println!("  period range: {:.2} - {:.2}", summary.period_low, summary.period_high);

    let outlook = report.outlook();
    println!(
        "\nTarget {:.2} by {} ({:?}, {:+.2}%)",
        outlook.target_price,
        outlook.target_date,
        outlook.direction,
        outlook.expected_change_pct.unwrap_or(0.0)
    );

    println!("\nForecast (every 15th day):");
    for point in report.forecast().points().iter().step_by(15) {
        println!(
            "  {}  {:>9.2}  [{:.2}, {:.2}]",
            point.date, point.point_estimate, point.lower_bound, point.upper_bound
        );
    }

    let indicators = report.indicators();
    println!("\nIndicators:");
    for name in indicators.names() {
        match indicators.latest(name) {
            Some(value) => println!("  {:<8} {:.2}", name, value),
            None => println!("  {:<8} n/a", name),
        }
    }

    match report.backtest() {
        Some(backtest) => {
            let actual = backtest.held_out().values();
            println!(
                "\nReality check over the last {} observations:",
                backtest.held_out().len()
            );
            if let Ok(metrics) = ForecastMetrics::evaluate(&actual, backtest.predicted()) {
                print!("{}", metrics);
            }
            if let Some(grade) = backtest.accuracy_grade() {
                println!("  Grade:    {}", grade);
            }
        }
        None => println!("\nReality check skipped"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // reality_check [DATA_DIR SYMBOL]
    let args: Vec<String> = env::args().skip(1).collect();
    let end = Local::now().date_naive();
    let config = AnalysisConfig::default().with_horizon_days(90);

    let (source, symbol): (Box<dyn HistorySource>, String) = match args.as_slice() {
        [dir, symbol] => (Box::new(CsvHistorySource::new(dir)), symbol.clone()),
        _ => {
            println!("No data directory given, using synthetic history\n");
            let source = InMemoryHistorySource::new().with_series("DEMO", synthetic_history(end)?);
            (Box::new(source), "DEMO".to_string())
        }
    };

    let report = analyze_symbol(source.as_ref(), &symbol, end, &config)?;
    print_report(&report);

    if env::var("REALITY_CHECK_JSON").is_ok() {
        println!("\n{}", report.to_json()?);
    }

    Ok(())
}
