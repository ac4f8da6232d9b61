//! Integration tests for the EGT Margin forecasting pipeline

use egt_forecast::{
    train_and_predict, train_and_predict_with, DataLoader, ForecastConfig, ForecastError,
    Forecaster, InputFormat, ObservationSeries, StagedInput,
};
use rust_xlsxwriter::Workbook;
use std::fmt::Write as _;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn write_csv(path: &Path, with_csn: bool, values: &[f64]) {
    let mut text = String::new();
    if with_csn {
        text.push_str("CSN,EGT Margin\n");
        for (i, v) in values.iter().enumerate() {
            writeln!(text, "{},{}", i + 1, v).unwrap();
        }
    } else {
        text.push_str("EGT Margin\n");
        for v in values {
            writeln!(text, "{}", v).unwrap();
        }
    }
    std::fs::write(path, text).unwrap();
}

fn linear(n: usize) -> Vec<f64> {
    (1..=n).map(|v| v as f64).collect()
}

/// 250 linearly increasing values with CSN 1..250 forecast CSN 251..450
#[test]
fn test_end_to_end_linear_series() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("engine.csv");
    write_csv(&path, true, &linear(250));

    let (forecast, metrics) = train_and_predict(&path).unwrap();

    assert_eq!(forecast.len(), 200);
    assert_eq!(forecast.cycles(), (251..=450).collect::<Vec<i64>>());
    assert!(forecast.predictions().iter().all(|p| p.is_finite()));
    assert!(metrics.r2.is_finite());
    assert!(metrics.rmse >= 0.0);
    assert!(metrics.mae >= 0.0);
}

#[test]
fn test_ten_rows_is_malformed_input() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.csv");
    write_csv(&path, true, &linear(10));

    let err = train_and_predict(&path).unwrap_err();
    assert!(matches!(err, ForecastError::MalformedInput(_)), "got {err}");
}

#[test]
fn test_missing_csn_uses_fallback_counter() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no_csn.csv");
    let values: Vec<f64> = (0..120).map(|i| 45.0 - i as f64 * 0.1).collect();
    write_csv(&path, false, &values);

    let (forecast, _) = train_and_predict(&path).unwrap();
    assert_eq!(forecast.len(), 200);
    assert_eq!(forecast.rows()[0].csn, 22576);
    assert_eq!(forecast.rows()[199].csn, 22775);
}

/// Log sink shared between the subscriber and the test
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_missing_csn_warns_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no_csn.csv");
    write_csv(&path, false, &linear(80));

    let logs = LogBuffer::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();

    let config = ForecastConfig {
        horizon: 5,
        ..Default::default()
    };
    tracing::subscriber::with_default(subscriber, || {
        train_and_predict_with(&path, &config).unwrap();
    });

    let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert_eq!(text.lines().filter(|l| l.contains("WARN")).count(), 1, "{text}");
    assert!(text.contains("22576"));
}

#[test]
fn test_configured_fallback_and_horizon() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no_csn.csv");
    write_csv(&path, false, &linear(80));

    let config = ForecastConfig {
        horizon: 15,
        fallback_start_csn: 1000,
        ..Default::default()
    };
    let (forecast, _) = train_and_predict_with(&path, &config).unwrap();
    assert_eq!(forecast.cycles(), (1000..1015).collect::<Vec<i64>>());
}

#[test]
fn test_missing_file_is_io_error() {
    let err = train_and_predict("/nonexistent/engine.csv").unwrap_err();
    assert!(matches!(err, ForecastError::Io(_)));
}

#[test]
fn test_workbook_input() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("engine.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "CSN").unwrap();
    sheet.write_string(0, 1, "EGT Margin").unwrap();
    for i in 0..60u32 {
        sheet.write_number(i + 1, 0, 5000.0 + i as f64).unwrap();
        sheet.write_number(i + 1, 1, 40.0 - i as f64 * 0.2).unwrap();
    }
    workbook.save(&path).unwrap();

    let series = DataLoader::load_series(&path, &ForecastConfig::default()).unwrap();
    assert_eq!(series.len(), 60);
    assert_eq!(series.last_cycle(), Some(5059));
    assert_eq!(series.values()[1], 39.8);
}

#[test]
fn test_staged_stream_runs_and_cleans_up() {
    let mut text = String::from("CSN,EGT Margin\n");
    for i in 0..90 {
        writeln!(text, "{},{}", 300 + i, 35.0 + (i as f64 * 0.2).sin()).unwrap();
    }

    let staged = StagedInput::stage(text.as_bytes(), InputFormat::Csv).unwrap();
    let path = staged.path().to_path_buf();

    let config = ForecastConfig {
        horizon: 10,
        ..Default::default()
    };
    let series = staged.load_series(&config).unwrap();
    let outcome = Forecaster::with_config(config).unwrap().run(&series).unwrap();
    assert_eq!(outcome.table.rows()[0].csn, 390);

    drop(staged);
    assert!(!path.exists());
}

#[test]
fn test_staged_stream_cleans_up_after_failure() {
    let staged = StagedInput::stage("CSN,EGT Margin\n1,oops\n".as_bytes(), InputFormat::Csv).unwrap();
    let path = staged.path().to_path_buf();

    let result = staged.load_series(&ForecastConfig::default());
    assert!(matches!(result, Err(ForecastError::MalformedInput(_))));

    drop(staged);
    assert!(!path.exists());
}

#[test]
fn test_run_is_repeatable() {
    let values: Vec<f64> = (0..150).map(|i| 30.0 + (i as f64 * 0.15).cos() * 3.0).collect();
    let series = ObservationSeries::new(values);
    let config = ForecastConfig {
        horizon: 30,
        ..Default::default()
    };
    let forecaster = Forecaster::with_config(config).unwrap();

    let a = forecaster.run(&series).unwrap();
    let b = forecaster.run(&series).unwrap();
    assert_eq!(a.table, b.table);
    assert_eq!(a.metrics, b.metrics);
}
