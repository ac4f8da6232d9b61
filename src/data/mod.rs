//! Data module for loading and representing engine measurements
//!
//! This module provides:
//! - Table loading from CSV and spreadsheet files
//! - Scoped staging of streamed input into temporary files
//! - Observation series and supervised dataset structures

pub mod loader;
pub mod types;

pub use loader::{DataLoader, InputFormat, RawTable, StagedInput};
pub use types::{Dataset, Observation, ObservationSeries};
