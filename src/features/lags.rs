//! Lag feature construction
//!
//! Turns a measurement series into a supervised frame: each row holds the
//! previous `lags` measurements, most recent first, and the current
//! measurement as target. The same layout is used at inference time by
//! [`LagFeatureBuilder::window`], so a model trained on [`build`] output can
//! be fed rolling windows directly.
//!
//! [`build`]: LagFeatureBuilder::build

use crate::config::DEFAULT_LAGS;
use crate::data::Dataset;
use crate::error::{ForecastError, Result};

/// Builds lagged feature rows from a time-ordered series
#[derive(Debug, Clone, Copy)]
pub struct LagFeatureBuilder {
    lags: usize,
}

impl LagFeatureBuilder {
    /// Create a builder with the default 30 lags
    pub fn new() -> Self {
        Self::with_lags(DEFAULT_LAGS)
    }

    /// Create a builder with a custom number of lags
    pub fn with_lags(lags: usize) -> Self {
        Self { lags }
    }

    /// Number of lagged values per row
    pub fn lags(&self) -> usize {
        self.lags
    }

    /// Feature names: `lag_1` (previous value) .. `lag_n`
    pub fn feature_names(&self) -> Vec<String> {
        (1..=self.lags).map(|lag| format!("lag_{}", lag)).collect()
    }

    /// Minimum number of measurements needed for one lag row
    pub fn min_observations(&self) -> usize {
        self.lags + 1
    }

    /// Build the lag frame for `values`
    ///
    /// Yields `values.len() - lags` rows; the first `lags` positions have no
    /// complete history and are dropped.
    pub fn build(&self, values: &[f64]) -> Result<Dataset> {
        if self.lags == 0 {
            return Err(ForecastError::Config("lags must be at least 1".to_string()));
        }
        if values.len() < self.min_observations() {
            return Err(ForecastError::MalformedInput(format!(
                "need at least {} measurements to build {} lag features, got {}",
                self.min_observations(),
                self.lags,
                values.len()
            )));
        }

        let mut dataset = Dataset::new(self.feature_names());
        for t in self.lags..values.len() {
            dataset.add_sample(self.window(&values[..t]), values[t], t);
        }

        Ok(dataset)
    }

    /// Feature vector predicting the value right after `history`
    ///
    /// Uses the last `lags` values, most recent first. `history` must hold at
    /// least `lags` values.
    pub fn window(&self, history: &[f64]) -> Vec<f64> {
        history.iter().rev().take(self.lags).copied().collect()
    }
}

impl Default for LagFeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}
