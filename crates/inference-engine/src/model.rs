//! Regressor Interface

use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ModelError;

/// Slot a model occupies in the ensemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    DecisionTree,
    Knn,
    NeuralNetwork,
}

impl ModelKind {
    /// All slots in ensemble order
    pub const ALL: [ModelKind; 3] = [ModelKind::DecisionTree, ModelKind::Knn, ModelKind::NeuralNetwork];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::DecisionTree => "decision_tree",
            ModelKind::Knn => "knn",
            ModelKind::NeuralNetwork => "neural_network",
        }
    }

    /// Name shown to users
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::DecisionTree => "Decision Tree",
            ModelKind::Knn => "KNN",
            ModelKind::NeuralNetwork => "Neural Network",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fitted regressor mapping one feature row to a scalar.
///
/// Implementations are immutable after loading and shared across requests.
pub trait Regressor: Send + Sync {
    /// Number of input features the model was fit on
    fn n_features(&self) -> usize;

    /// Predict a single row
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;
}

/// Reject rows whose width differs from the model's
pub(crate) fn check_shape(expected: usize, features: &FeatureVector) -> Result<(), ModelError> {
    if features.len() != expected {
        return Err(ModelError::InvalidInputShape {
            expected,
            actual: features.len(),
        });
    }
    Ok(())
}

/// Regressor that always predicts the same value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantRegressor {
    pub value: f64,
    pub n_features: usize,
}

impl ConstantRegressor {
    pub fn new(value: f64, n_features: usize) -> Self {
        Self { value, n_features }
    }
}

impl Regressor for ConstantRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        check_shape(self.n_features, features)?;
        Ok(self.value)
    }
}
