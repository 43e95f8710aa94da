//! Spend Estimator
//!
//! Immutable context holding everything loaded at startup. Each request
//! encodes a profile and runs the ensemble against it; nothing here is
//! mutated after construction.

use feature_engine::{FeatureEncoder, FeatureVector, MinMaxScaler, RawProfile, TrainingSchema};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::artifact::{check_widths, ArtifactBundle};
use crate::ensemble::{predict_detailed, EnsemblePrediction, ModelTriple};
use crate::{ArtifactError, InferenceError};

/// Format an amount as dollars with two decimals
pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Result of one estimate
#[derive(Debug, Clone, Serialize)]
pub struct Estimate {
    /// Encoded row the models saw
    pub features: FeatureVector,
    /// Ensemble output
    pub prediction: EnsemblePrediction,
    /// Encode-plus-predict time in microseconds
    pub latency_us: u64,
}

impl Estimate {
    /// Averaged spend
    pub fn amount(&self) -> f64 {
        self.prediction.estimate
    }

    /// Averaged spend formatted for display
    pub fn formatted(&self) -> String {
        format_currency(self.amount())
    }
}

/// Loaded encoder and models
#[derive(Debug)]
pub struct SpendEstimator {
    encoder: FeatureEncoder,
    models: ModelTriple,
}

impl SpendEstimator {
    /// Load the artifact bundle and build the estimator
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let (models, schema, scaler) = ArtifactBundle::load(path)?.into_parts();
        Self::new(models, schema, scaler)
    }

    /// Build from already-loaded parts.
    ///
    /// Only model widths are checked against the schema; models built by
    /// hand are not validated, and a malformed one fails at `estimate`.
    pub fn new(
        models: ModelTriple,
        schema: TrainingSchema,
        scaler: MinMaxScaler,
    ) -> Result<Self, ArtifactError> {
        check_widths(&models.members(), schema.len())?;
        let encoder =
            FeatureEncoder::new(schema, scaler).map_err(|e| ArtifactError::Corrupt(e.to_string()))?;

        info!(columns = encoder.schema().len(), "Spend estimator ready");
        Ok(Self { encoder, models })
    }

    /// Encode a profile into the training layout
    pub fn encode(&self, profile: &RawProfile) -> FeatureVector {
        self.encoder.encode(profile)
    }

    /// Encode a profile and average the three model predictions
    pub fn estimate(&self, profile: &RawProfile) -> Result<Estimate, InferenceError> {
        let start = Instant::now();

        let features = self.encoder.encode(profile);
        let prediction = predict_detailed(&features, &self.models)?;

        let latency_us = start.elapsed().as_micros() as u64;
        debug!(
            estimate = prediction.estimate,
            latency_us, "Estimate completed"
        );

        Ok(Estimate {
            features,
            prediction,
            latency_us,
        })
    }

    /// Training schema
    pub fn schema(&self) -> &TrainingSchema {
        self.encoder.schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::tests::bundle;
    use crate::knn::{KNeighborsRegressor, NeighborWeights};
    use crate::model::{ConstantRegressor, ModelKind};
    use crate::tree::{DecisionTreeRegressor, TreeNode};
    use crate::ModelError;
    use feature_engine::{GameGenre, Gender, PlayFrequency, Platform, AGE_COLUMN};

    fn profile() -> RawProfile {
        RawProfile {
            age: 30,
            gender: Gender::Other,
            genre: GameGenre::EpicActionRpg,
            platform: Platform::Other,
            frequency: PlayFrequency::Rarely,
        }
    }

    fn stub_estimator(schema: TrainingSchema) -> SpendEstimator {
        let width = schema.len();
        let models = ModelTriple::new(
            ConstantRegressor::new(15.0, width),
            ConstantRegressor::new(18.0, width),
            ConstantRegressor::new(21.0, width),
        );
        SpendEstimator::new(models, schema, MinMaxScaler::new(14.0, 90.0)).unwrap()
    }

    #[test]
    fn test_end_to_end_with_stub_models() {
        let estimator = stub_estimator(bundle().schema);
        let estimate = estimator.estimate(&profile()).unwrap();

        assert_eq!(estimate.amount(), 18.0);
        assert_eq!(estimate.formatted(), "$18.00");
        assert_eq!(estimate.features.len(), 4);
        assert_eq!(estimate.features.values[1..], [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_idempotent() {
        let (models, schema, scaler) = bundle().into_parts();
        let estimator = SpendEstimator::new(models, schema, scaler).unwrap();

        let first = estimator.estimate(&profile()).unwrap();
        let second = estimator.estimate(&profile()).unwrap();
        assert_eq!(first.features, second.features);
        assert_eq!(first.prediction, second.prediction);
    }

    #[test]
    fn test_real_models_average() {
        let (models, schema, scaler) = bundle().into_parts();
        let estimator = SpendEstimator::new(models, schema, scaler).unwrap();
        let estimate = estimator.estimate(&profile()).unwrap();

        let age = (30.0 - 14.0) / (90.0 - 14.0);
        assert_eq!(
            estimate.features.value_of(estimator.schema(), AGE_COLUMN),
            Some(age)
        );
        // tree: rarely -> 12; knn: nearest row is [0.2, 1, 1, 1] -> 20;
        // mlp: 10 * age - 5 + 25
        let mlp = 10.0 * age - 5.0 + 25.0;
        let expected = (12.0 + 20.0 + mlp) / 3.0;
        assert!((estimate.amount() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_width_mismatch_rejected_at_construction() {
        let models = ModelTriple::new(
            ConstantRegressor::new(1.0, 4),
            ConstantRegressor::new(1.0, 4),
            ConstantRegressor::new(1.0, 7),
        );
        let err = SpendEstimator::new(models, bundle().schema, MinMaxScaler::new(14.0, 90.0)).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(ref m) if m.contains("neural_network")));
    }

    struct Exploding;

    impl crate::Regressor for Exploding {
        fn n_features(&self) -> usize {
            4
        }

        fn predict(&self, _: &FeatureVector) -> Result<f64, ModelError> {
            Err(ModelError::NonFiniteOutput(f64::INFINITY))
        }
    }

    #[test]
    fn test_prediction_failure_surfaces_model() {
        let models = ModelTriple::new(
            ConstantRegressor::new(1.0, 4),
            ConstantRegressor::new(1.0, 4),
            Exploding,
        );
        let estimator =
            SpendEstimator::new(models, bundle().schema, MinMaxScaler::new(14.0, 90.0)).unwrap();
        let err = estimator.estimate(&profile()).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::PredictionFailed {
                model: ModelKind::NeuralNetwork,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_tree_fails_instead_of_panicking() {
        let tree = DecisionTreeRegressor {
            n_features: 4,
            nodes: vec![
                TreeNode::Split {
                    feature: 9,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: 1.0 },
                TreeNode::Leaf { value: 2.0 },
            ],
        };
        let models = ModelTriple::new(tree, ConstantRegressor::new(1.0, 4), ConstantRegressor::new(1.0, 4));
        let estimator =
            SpendEstimator::new(models, bundle().schema, MinMaxScaler::new(14.0, 90.0)).unwrap();

        let err = estimator.estimate(&profile()).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::PredictionFailed {
                model: ModelKind::DecisionTree,
                source: ModelError::Malformed(_),
            }
        ));
    }

    #[test]
    fn test_knn_missing_targets_fail_instead_of_panicking() {
        let knn = KNeighborsRegressor {
            n_neighbors: 2,
            weights: NeighborWeights::Uniform,
            p: 2.0,
            fit_x: vec![vec![0.0; 4], vec![1.0; 4]],
            fit_y: vec![10.0],
        };
        let models = ModelTriple::new(ConstantRegressor::new(1.0, 4), knn, ConstantRegressor::new(1.0, 4));
        let estimator =
            SpendEstimator::new(models, bundle().schema, MinMaxScaler::new(14.0, 90.0)).unwrap();

        let err = estimator.estimate(&profile()).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::PredictionFailed {
                model: ModelKind::Knn,
                source: ModelError::Malformed(_),
            }
        ));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(18.0), "$18.00");
        assert_eq!(format_currency(1234.567), "$1234.57");
        assert_eq!(format_currency(0.004), "$0.00");
    }
}
