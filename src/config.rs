//! Configuration management
//!
//! All forecasting tunables live in [`ForecastConfig`]. Every field has a
//! documented default, so a config file only needs to list the values it
//! overrides.

use crate::error::{ForecastError, Result};
use crate::models::GbmParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of lagged measurements used as features
pub const DEFAULT_LAGS: usize = 30;

/// Default number of future cycles to forecast
pub const DEFAULT_HORIZON: usize = 200;

/// Default share of lag rows used for training
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

/// First forecast cycle counter when the input carries no CSN column
pub const DEFAULT_FALLBACK_START_CSN: i64 = 22576;

/// Name of the measurement column
pub const MEASUREMENT_COLUMN: &str = "EGT Margin";

/// Name of the cycle counter column
pub const CYCLE_COLUMN: &str = "CSN";

/// Reference band drawn on charts and exported workbooks, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalZone {
    /// Lower guide line
    pub lower: f64,
    /// Upper guide line
    pub upper: f64,
}

impl Default for CriticalZone {
    fn default() -> Self {
        Self {
            lower: 12.0,
            upper: 18.0,
        }
    }
}

impl CriticalZone {
    /// Whether a value falls inside the band (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Forecasting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of lagged values per feature row
    pub lags: usize,
    /// Number of future cycles to predict
    pub horizon: usize,
    /// Fraction of lag rows used for training (the rest is held out)
    pub train_ratio: f64,
    /// Forecast start counter used when the input has no cycle column
    pub fallback_start_csn: i64,
    /// Header of the measurement column
    pub measurement_column: String,
    /// Header of the optional cycle counter column
    pub cycle_column: String,
    /// Guide lines for charts and exports
    pub critical_zone: CriticalZone,
    /// Gradient boosting hyperparameters
    pub model: GbmParams,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lags: DEFAULT_LAGS,
            horizon: DEFAULT_HORIZON,
            train_ratio: DEFAULT_TRAIN_RATIO,
            fallback_start_csn: DEFAULT_FALLBACK_START_CSN,
            measurement_column: MEASUREMENT_COLUMN.to_string(),
            cycle_column: CYCLE_COLUMN.to_string(),
            critical_zone: CriticalZone::default(),
            model: GbmParams::default(),
        }
    }
}

impl ForecastConfig {
    /// Load configuration from a TOML file and validate it
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ForecastConfig =
            toml::from_str(&content).map_err(|e| ForecastError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ForecastError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that every value is usable by the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.lags == 0 {
            return Err(ForecastError::Config("lags must be at least 1".to_string()));
        }
        if self.horizon == 0 {
            return Err(ForecastError::Config("horizon must be at least 1".to_string()));
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(ForecastError::Config(format!(
                "train_ratio must be in (0, 1), got {}",
                self.train_ratio
            )));
        }
        if self.measurement_column.trim().is_empty() {
            return Err(ForecastError::Config(
                "measurement_column must not be empty".to_string(),
            ));
        }
        if self.critical_zone.lower > self.critical_zone.upper {
            return Err(ForecastError::Config(format!(
                "critical zone lower bound {} exceeds upper bound {}",
                self.critical_zone.lower, self.critical_zone.upper
            )));
        }
        self.model
            .validate()
            .map_err(|e| ForecastError::Config(e.to_string()))
    }
}
