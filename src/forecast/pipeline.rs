//! Forecasting pipeline
//!
//! raw series → lag frame → positional split → fit → held-out metrics →
//! recursive multi-step forecast.

use crate::config::ForecastConfig;
use crate::data::{DataLoader, Dataset, ObservationSeries};
use crate::error::{ForecastError, Result};
use crate::features::LagFeatureBuilder;
use crate::models::{GbmRegressor, ModelMetrics};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// One predicted cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(rename = "CSN")]
    pub csn: i64,
    #[serde(rename = "Predicted EGT Margin")]
    pub predicted: f64,
}

/// Ordered forecast with consecutive cycle counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    rows: Vec<ForecastPoint>,
}

impl ForecastTable {
    /// Pair predictions with counters `start_csn, start_csn + 1, ...`
    ///
    /// Fails when a counter would overflow `i64`.
    pub fn new(start_csn: i64, predictions: Vec<f64>) -> Result<Self> {
        let rows = predictions
            .into_iter()
            .enumerate()
            .map(|(i, predicted)| {
                let csn = i64::try_from(i)
                    .ok()
                    .and_then(|offset| start_csn.checked_add(offset))
                    .ok_or_else(|| {
                        ForecastError::MalformedInput(format!(
                            "forecast cycle counter overflows after CSN {}",
                            start_csn
                        ))
                    })?;
                Ok(ForecastPoint { csn, predicted })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows })
    }

    /// Forecast rows in cycle order
    pub fn rows(&self) -> &[ForecastPoint] {
        &self.rows
    }

    /// Get number of forecast rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the forecast has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over forecast rows in cycle order
    pub fn iter(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.rows.iter()
    }

    /// Cycle counters in order
    pub fn cycles(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.csn).collect()
    }

    /// Predicted values in order
    pub fn predictions(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.predicted).collect()
    }

    /// First forecast row whose prediction is at or below `threshold`
    pub fn first_at_or_below(&self, threshold: f64) -> Option<&ForecastPoint> {
        self.rows.iter().find(|r| r.predicted <= threshold)
    }
}

/// Everything one pipeline run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastOutcome {
    pub table: ForecastTable,
    pub metrics: ModelMetrics,
    /// Lag rows used for fitting
    pub train_rows: usize,
    /// Lag rows held out for metrics
    pub test_rows: usize,
    /// True when the first counter came from the configured fallback
    pub fallback_csn: bool,
}

/// Predict `horizon` steps past `history`, feeding each prediction back in
///
/// The rolling window starts as the last `builder.lags()` values of
/// `history` and only ever grows with predictions.
pub fn recursive_forecast(
    model: &GbmRegressor,
    builder: &LagFeatureBuilder,
    history: &[f64],
    horizon: usize,
) -> Result<Vec<f64>> {
    let lags = builder.lags();
    if history.len() < lags {
        return Err(ForecastError::MalformedInput(format!(
            "need {} values to seed the forecast window, got {}",
            lags,
            history.len()
        )));
    }

    let mut window: Vec<f64> = history[history.len() - lags..].to_vec();
    window.reserve(horizon);
    let mut predictions = Vec::with_capacity(horizon);

    for _ in 0..horizon {
        let features = builder.window(&window);
        let next = model.predict_one(&features)?;
        predictions.push(next);
        window.push(next);
    }

    Ok(predictions)
}

/// Lag-feature gradient boosting forecaster
#[derive(Debug, Clone)]
pub struct Forecaster {
    config: ForecastConfig,
    builder: LagFeatureBuilder,
}

impl Forecaster {
    /// Create a forecaster with the default configuration
    pub fn new() -> Self {
        let config = ForecastConfig::default();
        let builder = LagFeatureBuilder::with_lags(config.lags);
        Self { config, builder }
    }

    /// Create a forecaster from a validated configuration
    pub fn with_config(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        let builder = LagFeatureBuilder::with_lags(config.lags);
        Ok(Self { config, builder })
    }

    /// Get the configuration in use
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Build the lag frame for a series
    pub fn prepare(&self, series: &ObservationSeries) -> Result<Dataset> {
        self.builder.build(series.values())
    }

    /// Positional train/test split; both sides must be non-empty
    pub fn split(&self, dataset: &Dataset) -> Result<(Dataset, Dataset)> {
        let (train, test) = dataset.train_test_split(self.config.train_ratio);
        if train.is_empty() || test.is_empty() {
            return Err(ForecastError::DegenerateSplit {
                train: train.len(),
                test: test.len(),
            });
        }
        Ok((train, test))
    }

    /// Fit a fresh model on the training slice
    pub fn train(&self, train: &Dataset) -> Result<GbmRegressor> {
        let mut model = GbmRegressor::with_params(self.config.model.clone());
        model.fit(train)?;
        Ok(model)
    }

    /// Metrics of `model` on the held-out slice
    pub fn evaluate(&self, model: &GbmRegressor, test: &Dataset) -> Result<ModelMetrics> {
        Ok(model.evaluate(test)?)
    }

    /// First forecast cycle counter and whether it is the fallback value
    pub fn start_csn(&self, series: &ObservationSeries) -> Result<(i64, bool)> {
        match series.last_cycle() {
            Some(last) => last.checked_add(1).map(|start| (start, false)).ok_or_else(|| {
                ForecastError::MalformedInput(format!("last CSN {} has no successor", last))
            }),
            None => Ok((self.config.fallback_start_csn, true)),
        }
    }

    /// Recursive forecast from the tail of the raw series
    pub fn forecast(&self, model: &GbmRegressor, series: &ObservationSeries) -> Result<ForecastTable> {
        let (start, fallback) = self.start_csn(series)?;
        let history = series.tail(self.builder.lags());
        let predictions = recursive_forecast(model, &self.builder, history, self.config.horizon)?;
        if fallback {
            warn!(
                "input has no cycle counter; forecast starts at configured fallback CSN {}",
                start
            );
        }
        ForecastTable::new(start, predictions)
    }

    /// Run the whole pipeline on an in-memory series
    pub fn run(&self, series: &ObservationSeries) -> Result<ForecastOutcome> {
        let dataset = self.prepare(series)?;
        info!(
            "Built {} lag rows with {} features from {} measurements",
            dataset.len(),
            dataset.num_features(),
            series.len()
        );

        let (train, test) = self.split(&dataset)?;
        info!("Train set: {} rows, test set: {} rows", train.len(), test.len());

        let model = self.train(&train)?;
        let metrics = self.evaluate(&model, &test)?;
        info!(
            "Test metrics: R²={:.4}, RMSE={:.4}, MAE={:.4}",
            metrics.r2, metrics.rmse, metrics.mae
        );

        let table = self.forecast(&model, series)?;
        let fallback_csn = series.last_cycle().is_none();
        info!("Forecast {} cycles", table.len());

        Ok(ForecastOutcome {
            table,
            metrics,
            train_rows: train.len(),
            test_rows: test.len(),
            fallback_csn,
        })
    }
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a table from `source` and forecast with the default configuration
pub fn train_and_predict<P: AsRef<Path>>(source: P) -> Result<(ForecastTable, ModelMetrics)> {
    train_and_predict_with(source, &ForecastConfig::default())
}

/// Load a table from `source` and forecast with `config`
pub fn train_and_predict_with<P: AsRef<Path>>(
    source: P,
    config: &ForecastConfig,
) -> Result<(ForecastTable, ModelMetrics)> {
    let forecaster = Forecaster::with_config(config.clone())?;
    let series = DataLoader::load_series(source, config)?;
    let outcome = forecaster.run(&series)?;
    Ok((outcome.table, outcome.metrics))
}
