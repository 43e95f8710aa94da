//! Ensemble Averaging

use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{ModelKind, Regressor};
use crate::InferenceError;

/// The three fitted regressors, loaded once and never mutated
pub struct ModelTriple {
    tree: Box<dyn Regressor>,
    knn: Box<dyn Regressor>,
    neural: Box<dyn Regressor>,
}

impl ModelTriple {
    /// Assemble the ensemble
    pub fn new(
        tree: impl Regressor + 'static,
        knn: impl Regressor + 'static,
        neural: impl Regressor + 'static,
    ) -> Self {
        Self {
            tree: Box::new(tree),
            knn: Box::new(knn),
            neural: Box::new(neural),
        }
    }

    /// Models in ensemble order
    pub fn members(&self) -> [(ModelKind, &dyn Regressor); 3] {
        [
            (ModelKind::DecisionTree, self.tree.as_ref()),
            (ModelKind::Knn, self.knn.as_ref()),
            (ModelKind::NeuralNetwork, self.neural.as_ref()),
        ]
    }
}

impl std::fmt::Debug for ModelTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let widths = self.members().map(|(_, m)| m.n_features());
        f.debug_struct("ModelTriple").field("n_features", &widths).finish()
    }
}

/// One model's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelContribution {
    pub model: ModelKind,
    pub prediction: f64,
}

/// Ensemble output with the per-model breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsemblePrediction {
    /// Unweighted mean of every contribution
    pub estimate: f64,
    pub contributions: Vec<ModelContribution>,
}

/// Run every model on the same row and average the results.
///
/// Any model failure fails the whole call; there are no partial results.
pub fn predict_detailed(
    features: &FeatureVector,
    models: &ModelTriple,
) -> Result<EnsemblePrediction, InferenceError> {
    let mut contributions = Vec::with_capacity(3);
    for (model, regressor) in models.members() {
        let prediction = regressor
            .predict(features)
            .map_err(|source| InferenceError::PredictionFailed { model, source })?;
        debug!(model = %model, prediction, "Model prediction");
        contributions.push(ModelContribution { model, prediction });
    }

    let sum: f64 = contributions.iter().map(|c| c.prediction).sum();
    let estimate = sum / contributions.len() as f64;

    Ok(EnsemblePrediction {
        estimate,
        contributions,
    })
}

/// Mean of the three model predictions
pub fn predict(features: &FeatureVector, models: &ModelTriple) -> Result<f64, InferenceError> {
    predict_detailed(features, models).map(|p| p.estimate)
}
