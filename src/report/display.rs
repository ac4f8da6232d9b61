//! Terminal summaries of the raw series, metrics and forecast

use crate::config::CriticalZone;
use crate::data::ObservationSeries;
use crate::forecast::ForecastTable;
use crate::models::ModelMetrics;
use colored::Colorize;

/// Print the first `n` observations
pub fn print_series_head(series: &ObservationSeries, n: usize) {
    println!("{:>8} {:>12}", "CSN".bold(), "EGT Margin".bold());
    for (i, obs) in series.iter().take(n).enumerate() {
        let csn = obs.csn.map_or_else(|| format!("[{}]", i), |c| c.to_string());
        println!("{:>8} {:>12.2}", csn, obs.egt_margin);
    }
    if series.len() > n {
        println!("{:>8} ({} rows total)", "...", series.len());
    }
}

/// Print the held-out metrics
pub fn print_metrics(metrics: &ModelMetrics) {
    println!("\n{}", "Test Set Metrics".bold());
    println!("{}", "-".repeat(30));
    println!("R²:    {:>12.4}", metrics.r2);
    println!("RMSE:  {:>12.4} °C", metrics.rmse);
    println!("MAE:   {:>12.4} °C", metrics.mae);
}

/// Print up to `max_rows` forecast rows, marking those inside the critical zone
pub fn print_forecast_table(table: &ForecastTable, zone: &CriticalZone, max_rows: usize) {
    println!("\n{:>8} {:>22}", "CSN".bold(), "Predicted EGT Margin".bold());
    for point in table.iter().take(max_rows) {
        let value = format!("{:>22.4}", point.predicted);
        if zone.contains(point.predicted) {
            println!("{:>8} {}", point.csn, value.red());
        } else {
            println!("{:>8} {}", point.csn, value);
        }
    }
    if table.len() > max_rows {
        println!("{:>8} ({} rows total)", "...", table.len());
    }
}

/// Print where the forecast first reaches the critical zone, if it does
pub fn print_zone_summary(table: &ForecastTable, zone: &CriticalZone) {
    match table.first_at_or_below(zone.upper) {
        Some(point) => println!(
            "\n{} forecast reaches {:.1} °C at CSN {} ({:.2} °C)",
            "Warning:".red().bold(),
            zone.upper,
            point.csn,
            point.predicted
        ),
        None => println!(
            "\n{} forecast stays above {:.1} °C through CSN {}",
            "OK:".green().bold(),
            zone.upper,
            table.rows().last().map_or(0, |p| p.csn)
        ),
    }
}
