//! Forecast export
//!
//! Delimited text for quick downloads and an `.xlsx` workbook with an
//! embedded line chart of the forecast against the critical zone.

use crate::config::CriticalZone;
use crate::error::Result;
use crate::forecast::ForecastTable;
use crate::models::ModelMetrics;
use rust_xlsxwriter::{
    Chart, ChartFormat, ChartLegendPosition, ChartLine, ChartLineDashType, ChartType, Color,
    Format, Workbook, Worksheet,
};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Sheet holding the forecast rows and chart
pub const FORECAST_SHEET: &str = "Forecast";

/// Sheet holding the test metrics
pub const PERFORMANCE_SHEET: &str = "Performance";

/// Top-left cell of the forecast chart, zero-based (E4)
const CHART_ANCHOR: (u32, u16) = (3, 4);

/// Write the forecast as CSV with a `CSN,Predicted EGT Margin` header
pub fn write_forecast_csv<W: Write>(table: &ForecastTable, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in table.iter() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Save the forecast as a CSV file
pub fn save_forecast_csv<P: AsRef<Path>>(table: &ForecastTable, path: P) -> Result<()> {
    let file = File::create(&path)?;
    write_forecast_csv(table, file)?;
    info!("Wrote {} forecast rows to {}", table.len(), path.as_ref().display());
    Ok(())
}

/// Save forecast, critical-zone limits, chart and metrics to an `.xlsx` file
pub fn save_workbook<P: AsRef<Path>>(
    table: &ForecastTable,
    metrics: &ModelMetrics,
    zone: &CriticalZone,
    path: P,
) -> Result<()> {
    let mut workbook = Workbook::new();
    workbook.push_worksheet(forecast_sheet(table, zone)?);
    workbook.push_worksheet(performance_sheet(metrics)?);
    workbook.save(path.as_ref())?;

    info!("Wrote forecast workbook to {}", path.as_ref().display());
    Ok(())
}

fn forecast_sheet(table: &ForecastTable, zone: &CriticalZone) -> Result<Worksheet> {
    let header = Format::new().set_bold();
    let mut sheet = Worksheet::new();
    sheet.set_name(FORECAST_SHEET)?;

    for (col, title) in ["CSN", "Predicted EGT Margin", "Lower Limit", "Upper Limit"]
        .iter()
        .enumerate()
    {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    sheet.set_column_width(1, 22)?;

    for (i, point) in table.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, point.csn as f64)?;
        sheet.write_number(row, 1, point.predicted)?;
        sheet.write_number(row, 2, zone.lower)?;
        sheet.write_number(row, 3, zone.upper)?;
    }

    if !table.is_empty() {
        let last = table.len() as u32;
        let mut chart = Chart::new(ChartType::Line);

        chart
            .add_series()
            .set_name("Predicted EGT Margin")
            .set_categories((FORECAST_SHEET, 1, 0, last, 0))
            .set_values((FORECAST_SHEET, 1, 1, last, 1))
            .set_format(ChartFormat::new().set_line(ChartLine::new().set_color(Color::Blue)));

        for (col, name) in [(2u16, "Lower Limit"), (3u16, "Upper Limit")] {
            chart
                .add_series()
                .set_name(name)
                .set_categories((FORECAST_SHEET, 1, 0, last, 0))
                .set_values((FORECAST_SHEET, 1, col, last, col))
                .set_format(
                    ChartFormat::new().set_line(
                        ChartLine::new()
                            .set_color(Color::Red)
                            .set_dash_type(ChartLineDashType::Dash),
                    ),
                );
        }

        let title = format!(
            "EGT Margin Forecast - Critical Zone [{} - {}]",
            zone.lower, zone.upper
        );
        chart.title().set_name(title.as_str());
        chart.x_axis().set_name("CSN");
        chart.y_axis().set_name("EGT Margin (°C)");
        chart.legend().set_position(ChartLegendPosition::Bottom);

        sheet.insert_chart(CHART_ANCHOR.0, CHART_ANCHOR.1, &chart)?;
    }

    Ok(sheet)
}

fn performance_sheet(metrics: &ModelMetrics) -> Result<Worksheet> {
    let header = Format::new().set_bold();
    let mut sheet = Worksheet::new();
    sheet.set_name(PERFORMANCE_SHEET)?;

    sheet.write_string_with_format(0, 0, "Metric", &header)?;
    sheet.write_string_with_format(0, 1, "Value", &header)?;
    sheet.set_column_width(0, 18)?;

    let rows = [
        ("Test R²", metrics.r2),
        ("Test RMSE (°C)", metrics.rmse),
        ("Test MAE (°C)", metrics.mae),
    ];
    for (i, (name, value)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *name)?;
        sheet.write_number(row, 1, *value)?;
    }

    Ok(sheet)
}
