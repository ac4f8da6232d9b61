//! Reporting module
//!
//! This module provides:
//! - CSV and spreadsheet export of the forecast
//! - Text charts with critical-zone guide lines
//! - Terminal summaries of data, metrics, and forecast

pub mod chart;
pub mod display;
pub mod export;

pub use chart::{render_chart, ChartSize};
pub use display::{print_forecast_table, print_metrics, print_series_head, print_zone_summary};
pub use export::{save_forecast_csv, save_workbook, write_forecast_csv};
