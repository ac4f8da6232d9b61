//! EGT Margin forecasting with gradient boosting
//!
//! This library forecasts a turbine engine health indicator (exhaust-gas
//! temperature margin) from its own history. Each measurement is predicted
//! from the 30 measurements before it; a boosted tree ensemble is fitted on
//! the oldest 80% of those rows, scored on the newest 20%, and then rolled
//! forward 200 cycles, feeding every prediction back in as the newest lag.
//!
//! # Modules
//!
//! - [`config`] - Tunables and their defaults
//! - [`data`] - Table loading and data structures
//! - [`features`] - Lag feature construction
//! - [`models`] - Gradient Boosting Machine regressor and metrics
//! - [`forecast`] - End-to-end pipeline and recursive forecasting
//! - [`report`] - Export and terminal presentation
//!
//! # Example
//!
//! ```rust,no_run
//! use egt_forecast::train_and_predict;
//!
//! fn main() -> anyhow::Result<()> {
//!     let (forecast, metrics) = train_and_predict("engine_802970.xlsx")?;
//!
//!     println!("R²: {:.4}, RMSE: {:.4}, MAE: {:.4}", metrics.r2, metrics.rmse, metrics.mae);
//!     for point in forecast.iter().take(5) {
//!         println!("{} {:.2}", point.csn, point.predicted);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod forecast;
pub mod models;
pub mod report;

// Re-export commonly used items at the crate level
pub use config::{CriticalZone, ForecastConfig};
pub use data::{DataLoader, Dataset, InputFormat, Observation, ObservationSeries, StagedInput};
pub use error::{ForecastError, Result};
pub use features::LagFeatureBuilder;
pub use forecast::{
    train_and_predict, train_and_predict_with, ForecastOutcome, ForecastPoint, ForecastTable,
    Forecaster,
};
pub use models::{GbmParams, GbmRegressor, ModelError, ModelMetrics};
