//! Forecasting module
//!
//! This module provides the end-to-end pipeline: lag features, positional
//! split, model fit, held-out metrics, and the recursive multi-step forecast.

pub mod pipeline;

pub use pipeline::{
    recursive_forecast, train_and_predict, train_and_predict_with, ForecastOutcome,
    ForecastPoint, ForecastTable, Forecaster,
};
