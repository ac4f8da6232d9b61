//! Machine learning models module
//!
//! This module provides:
//! - Gradient Boosting Machine regressor
//! - Model training, prediction, and evaluation utilities

pub mod gbm;

pub use gbm::{GbmParams, GbmRegressor, ModelError, ModelMetrics};
