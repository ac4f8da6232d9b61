//! Gradient Boosting Machine implementation
//!
//! Boosted regression trees with squared-error loss. The weak learners are
//! smartcore decision trees; this module owns the boosting loop, prediction,
//! and evaluation.

use crate::data::Dataset;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Errors that can occur with the model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Model not trained")]
    NotTrained,
}

/// GBM hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbmParams {
    /// Number of boosting iterations (trees)
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: u16,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples required in a leaf node
    pub min_samples_leaf: usize,
    /// Seed handed to every tree
    pub seed: u64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 3,
            learning_rate: 0.1,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

impl GbmParams {
    /// Check that the parameters describe a trainable ensemble
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParams("n_estimators must be at least 1".to_string()));
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidParams("max_depth must be at least 1".to_string()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ModelError::InvalidParams(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParams("min_samples_leaf must be at least 1".to_string()));
        }
        Ok(())
    }

    fn tree_parameters(&self) -> DecisionTreeRegressorParameters {
        DecisionTreeRegressorParameters {
            max_depth: Some(self.max_depth),
            min_samples_leaf: self.min_samples_leaf,
            min_samples_split: self.min_samples_split,
            seed: Some(self.seed),
        }
    }
}

/// Held-out regression metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Coefficient of determination
    pub r2: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
}

impl ModelMetrics {
    /// Calculate regression metrics
    ///
    /// A constant `y_true` has no variance to explain: R² is 1.0 for an exact
    /// fit and 0.0 otherwise.
    pub fn regression(y_true: &[f64], y_pred: &[f64]) -> Result<Self, ModelError> {
        let n = y_true.len();
        if n == 0 {
            return Err(ModelError::InvalidData("no samples to evaluate".to_string()));
        }
        if n != y_pred.len() {
            return Err(ModelError::InvalidData(format!(
                "{} targets but {} predictions",
                n,
                y_pred.len()
            )));
        }

        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum();

        let mae: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).abs())
            .sum::<f64>()
            / n as f64;

        let mean_true: f64 = y_true.iter().sum::<f64>() / n as f64;
        let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();

        let r2 = if ss_tot != 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            r2,
            rmse: (ss_res / n as f64).sqrt(),
            mae,
        })
    }
}

/// Fitted ensemble: a constant base score plus shrunken tree corrections
struct Ensemble {
    base_score: f64,
    trees: Vec<Tree>,
    n_features: usize,
}

/// Gradient Boosting Regressor
pub struct GbmRegressor {
    params: GbmParams,
    model: Option<Ensemble>,
    feature_names: Vec<String>,
}

impl GbmRegressor {
    /// Create a new GBM regressor with default parameters
    pub fn new() -> Self {
        Self::with_params(GbmParams::default())
    }

    /// Create a new GBM regressor with custom parameters
    pub fn with_params(params: GbmParams) -> Self {
        Self {
            params,
            model: None,
            feature_names: Vec::new(),
        }
    }

    /// Train the model on a dataset
    pub fn fit(&mut self, dataset: &Dataset) -> Result<(), ModelError> {
        if dataset.is_empty() {
            return Err(ModelError::InvalidData("Empty dataset".to_string()));
        }
        self.params.validate()?;

        let n_samples = dataset.len();
        let n_features = dataset.num_features();

        let x = DenseMatrix::from_2d_vec(&dataset.features).map_err(|e| {
            ModelError::InvalidData(format!("Failed to create feature matrix: {:?}", e))
        })?;
        let y = &dataset.targets;

        info!(
            "Training GBM regressor with {} samples and {} features",
            n_samples, n_features
        );
        info!("Parameters: {:?}", self.params);

        let base_score = y.iter().sum::<f64>() / n_samples as f64;
        let mut fitted = vec![base_score; n_samples];
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        for round in 0..self.params.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(fitted.iter()).map(|(t, f)| t - f).collect();

            let tree = Tree::fit(&x, &residuals, self.params.tree_parameters())
                .map_err(|e| ModelError::TrainingFailed(format!("round {}: {:?}", round, e)))?;
            let update = tree
                .predict(&x)
                .map_err(|e| ModelError::TrainingFailed(format!("round {}: {:?}", round, e)))?;

            for (f, u) in fitted.iter_mut().zip(update.iter()) {
                *f += self.params.learning_rate * u;
            }
            trees.push(tree);

            if (round + 1) % 25 == 0 {
                let train_mse = y
                    .iter()
                    .zip(fitted.iter())
                    .map(|(t, f)| (t - f).powi(2))
                    .sum::<f64>()
                    / n_samples as f64;
                debug!("Round {}: train MSE {:.6}", round + 1, train_mse);
            }
        }

        self.model = Some(Ensemble {
            base_score,
            trees,
            n_features,
        });
        self.feature_names = dataset.feature_names.clone();

        info!("Model training completed successfully");

        Ok(())
    }

    /// Make predictions on new data
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let model = self.model.as_ref().ok_or(ModelError::NotTrained)?;

        if features.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(row) = features.iter().find(|row| row.len() != model.n_features) {
            return Err(ModelError::PredictionFailed(format!(
                "expected {} features, got {}",
                model.n_features,
                row.len()
            )));
        }

        let rows = features.to_vec();
        let x = DenseMatrix::from_2d_vec(&rows).map_err(|e| {
            ModelError::PredictionFailed(format!("Failed to create feature matrix: {:?}", e))
        })?;

        let mut predictions = vec![model.base_score; features.len()];
        for tree in &model.trees {
            let update = tree
                .predict(&x)
                .map_err(|e| ModelError::PredictionFailed(format!("{:?}", e)))?;
            for (p, u) in predictions.iter_mut().zip(update.iter()) {
                *p += self.params.learning_rate * u;
            }
        }

        Ok(predictions)
    }

    /// Predict a single feature vector
    pub fn predict_one(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.predict(&[features.to_vec()])?
            .pop()
            .ok_or_else(|| ModelError::PredictionFailed("no prediction returned".to_string()))
    }

    /// Predict on a dataset
    pub fn predict_dataset(&self, dataset: &Dataset) -> Result<Vec<f64>, ModelError> {
        self.predict(&dataset.features)
    }

    /// Evaluate the model on a test dataset
    pub fn evaluate(&self, dataset: &Dataset) -> Result<ModelMetrics, ModelError> {
        let predictions = self.predict_dataset(dataset)?;
        ModelMetrics::regression(&dataset.targets, &predictions)
    }

    /// Names of the features seen during training
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.model.as_ref().map_or(0, |m| m.trees.len())
    }

    /// Check if the model is trained
    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }
}

impl Default for GbmRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GbmRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GbmRegressor")
            .field("params", &self.params)
            .field("trained", &self.is_trained())
            .field("n_trees", &self.n_trees())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_dataset(n: usize) -> Dataset {
        let mut dataset = Dataset::new(vec!["feature1".to_string(), "feature2".to_string()]);

        for i in 0..n {
            let x1 = i as f64;
            let x2 = (i as f64 * 0.5).sin();
            let target = x1 * 0.5 + x2 * 2.0 + 0.1;
            dataset.add_sample(vec![x1, x2], target, i);
        }

        dataset
    }

    #[test]
    fn test_gbm_regressor() {
        let dataset = create_test_dataset(200);
        let (train, test) = dataset.train_test_split(0.8);

        let mut model = GbmRegressor::new();
        model.fit(&train).unwrap();
        assert_eq!(model.n_trees(), 100);

        let metrics = model.evaluate(&test).unwrap();
        assert!(metrics.rmse.is_finite() && metrics.rmse >= 0.0);
        assert!(metrics.mae.is_finite() && metrics.mae >= 0.0);
        assert!(metrics.r2.is_finite());
    }

    #[test]
    fn test_fits_training_data() {
        let dataset = create_test_dataset(120);
        let mut model = GbmRegressor::new();
        model.fit(&dataset).unwrap();

        let metrics = model.evaluate(&dataset).unwrap();
        assert!(metrics.r2 > 0.9, "in-sample R² too low: {}", metrics.r2);
    }

    #[test]
    fn test_predictions_are_deterministic() {
        let dataset = create_test_dataset(100);

        let mut a = GbmRegressor::new();
        let mut b = GbmRegressor::new();
        a.fit(&dataset).unwrap();
        b.fit(&dataset).unwrap();

        let probe = vec![vec![12.5, 0.3], vec![80.0, -0.7]];
        assert_eq!(a.predict(&probe).unwrap(), b.predict(&probe).unwrap());
        assert_eq!(a.predict(&probe).unwrap(), a.predict(&probe).unwrap());
    }

    #[test]
    fn test_predict_requires_training() {
        let model = GbmRegressor::new();
        assert!(matches!(model.predict_one(&[1.0, 2.0]), Err(ModelError::NotTrained)));
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let mut model = GbmRegressor::new();
        model.fit(&create_test_dataset(50)).unwrap();
        assert!(matches!(
            model.predict_one(&[1.0, 2.0, 3.0]),
            Err(ModelError::PredictionFailed(_))
        ));
    }

    #[test]
    fn test_metrics_known_values() {
        let metrics = ModelMetrics::regression(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0, 6.0]).unwrap();
        // residuals: 0, 0, 0, -2; mean 2.5, ss_tot 5
        assert_relative_eq!(metrics.rmse, 1.0);
        assert_relative_eq!(metrics.mae, 0.5);
        assert_relative_eq!(metrics.r2, 1.0 - 4.0 / 5.0);
    }

    #[test]
    fn test_metrics_constant_target() {
        let exact = ModelMetrics::regression(&[5.0, 5.0], &[5.0, 5.0]).unwrap();
        assert_eq!(exact.r2, 1.0);
        let off = ModelMetrics::regression(&[5.0, 5.0], &[4.0, 6.0]).unwrap();
        assert_eq!(off.r2, 0.0);
    }

    #[test]
    fn test_metrics_empty() {
        assert!(ModelMetrics::regression(&[], &[]).is_err());
    }

    #[test]
    fn test_invalid_params() {
        let params = GbmParams {
            n_estimators: 0,
            ..Default::default()
        };
        let mut model = GbmRegressor::with_params(params);
        assert!(matches!(
            model.fit(&create_test_dataset(10)),
            Err(ModelError::InvalidParams(_))
        ));
    }
}
