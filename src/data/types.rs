//! Data types for engine health measurements
//!
//! This module defines the core data structures used throughout the project.

use serde::{Deserialize, Serialize};

/// One row of the input table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Cycles since new, when the input carries a cycle column
    #[serde(rename = "CSN")]
    pub csn: Option<i64>,
    /// Exhaust-gas-temperature margin, in degrees
    #[serde(rename = "EGT Margin")]
    pub egt_margin: f64,
}

/// Time-ordered EGT Margin measurements with optional cycle counters
///
/// Row order is the time axis. When cycle counters are present there is
/// exactly one per measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSeries {
    values: Vec<f64>,
    cycles: Option<Vec<i64>>,
}

impl ObservationSeries {
    /// Create a series without cycle counters
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            cycles: None,
        }
    }

    /// Create a series with one cycle counter per measurement
    ///
    /// Returns `None` when the lengths differ.
    pub fn with_cycles(values: Vec<f64>, cycles: Vec<i64>) -> Option<Self> {
        if values.len() != cycles.len() {
            return None;
        }
        Some(Self {
            values,
            cycles: Some(cycles),
        })
    }

    /// Build a series from observations
    ///
    /// Cycle counters are kept only if every observation has one.
    pub fn from_observations(observations: &[Observation]) -> Self {
        let values = observations.iter().map(|o| o.egt_margin).collect();
        let cycles = observations.iter().map(|o| o.csn).collect::<Option<Vec<_>>>();
        Self { values, cycles }
    }

    /// Measurements in time order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Cycle counters, if the input had them
    pub fn cycles(&self) -> Option<&[i64]> {
        self.cycles.as_deref()
    }

    /// Whether the input carried a cycle column
    pub fn has_cycles(&self) -> bool {
        self.cycles.is_some()
    }

    /// Last observed cycle counter
    pub fn last_cycle(&self) -> Option<i64> {
        self.cycles.as_ref().and_then(|c| c.last().copied())
    }

    /// Get the number of measurements
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The last `n` measurements (fewer if the series is shorter)
    pub fn tail(&self, n: usize) -> &[f64] {
        &self.values[self.values.len().saturating_sub(n)..]
    }

    /// X-axis values for display
    ///
    /// Falls back to the 0-based row position when there is no cycle column.
    pub fn axis(&self) -> Vec<f64> {
        match &self.cycles {
            Some(cycles) => cycles.iter().map(|&c| c as f64).collect(),
            None => (0..self.values.len()).map(|i| i as f64).collect(),
        }
    }

    /// Row `i` as an observation
    pub fn get(&self, i: usize) -> Option<Observation> {
        let egt_margin = *self.values.get(i)?;
        let csn = self.cycles.as_ref().map(|c| c[i]);
        Some(Observation { csn, egt_margin })
    }

    /// Iterate over observations in time order
    pub fn iter(&self) -> impl Iterator<Item = Observation> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

/// Supervised-learning frame built from lagged measurements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Feature names
    pub feature_names: Vec<String>,
    /// Feature matrix (rows = samples, cols = features)
    pub features: Vec<Vec<f64>>,
    /// Target values
    pub targets: Vec<f64>,
    /// Position of each target in the source series
    pub positions: Vec<usize>,
}

impl Dataset {
    /// Create a new empty dataset
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            features: Vec::new(),
            targets: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Add a sample to the dataset
    pub fn add_sample(&mut self, features: Vec<f64>, target: f64, position: usize) {
        self.features.push(features);
        self.targets.push(target);
        self.positions.push(position);
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Get the number of features
    pub fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Index at which [`train_test_split`](Self::train_test_split) cuts
    pub fn split_index(&self, train_ratio: f64) -> usize {
        ((self.len() as f64 * train_ratio) as usize).min(self.len())
    }

    /// Rows `range` as a new dataset, order preserved
    pub fn slice(&self, range: std::ops::Range<usize>) -> Dataset {
        Dataset {
            feature_names: self.feature_names.clone(),
            features: self.features[range.clone()].to_vec(),
            targets: self.targets[range.clone()].to_vec(),
            positions: self.positions[range].to_vec(),
        }
    }

    /// Split the dataset into a training prefix and a test suffix
    ///
    /// Rows are never shuffled: the test set is always the tail.
    pub fn train_test_split(&self, train_ratio: f64) -> (Dataset, Dataset) {
        let split_idx = self.split_index(train_ratio);
        (self.slice(0..split_idx), self.slice(split_idx..self.len()))
    }
}
