//! Feature engineering module
//!
//! This module provides lagged-measurement features for the forecasting
//! model.

pub mod lags;

pub use lags::LagFeatureBuilder;
