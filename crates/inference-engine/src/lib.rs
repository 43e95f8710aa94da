//! Spend Inference Engine
//!
//! Loads the fitted model bundle once and averages a decision tree, a
//! nearest-neighbour regressor and a neural network over each encoded
//! profile.

mod artifact;
mod engine;
mod ensemble;
mod knn;
mod mlp;
mod model;
mod tree;

pub use artifact::{ArtifactBundle, ArtifactFormat};
pub use engine::{format_currency, Estimate, SpendEstimator};
pub use ensemble::{predict, predict_detailed, EnsemblePrediction, ModelContribution, ModelTriple};
pub use knn::{KNeighborsRegressor, NeighborWeights};
pub use mlp::{Activation, DenseLayer, MlpRegressor};
pub use model::{ConstantRegressor, ModelKind, Regressor};
pub use tree::{DecisionTreeRegressor, TreeNode};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a single regressor
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Invalid input shape: expected {expected} features, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Model produced a non-finite prediction: {0}")]
    NonFiniteOutput(f64),
    #[error("Malformed model: {0}")]
    Malformed(String),
}

/// Errors during ensemble inference
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("Prediction failed in {model} model: {source}")]
    PredictionFailed {
        model: ModelKind,
        #[source]
        source: ModelError,
    },
}

/// Errors loading the model artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Model artifact not found at {}: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Model artifact is corrupt: {0}")]
    Corrupt(String),
    #[error("Failed to encode model artifact: {0}")]
    Encode(String),
}
