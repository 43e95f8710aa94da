//! Model Artifact Loader
//!
//! The artifact is a single bundle laid out as a 5-element tuple:
//! `(tree, knn, neural network, training columns, age scaler)`.

use feature_engine::{FeatureEncoder, MinMaxScaler, TrainingSchema};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::ensemble::ModelTriple;
use crate::knn::KNeighborsRegressor;
use crate::mlp::MlpRegressor;
use crate::model::{ModelKind, Regressor};
use crate::tree::DecisionTreeRegressor;
use crate::ArtifactError;

/// Number of elements in the bundle tuple
const BUNDLE_ARITY: usize = 5;

type BundleTuple = (
    DecisionTreeRegressor,
    KNeighborsRegressor,
    MlpRegressor,
    TrainingSchema,
    MinMaxScaler,
);

/// On-disk encoding of the bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Postcard,
}

impl ArtifactFormat {
    /// Pick the format from the file extension; unknown extensions read as JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") | Some("postcard") => ArtifactFormat::Postcard,
            _ => ArtifactFormat::Json,
        }
    }
}

/// Deserialized model bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BundleTuple", into = "BundleTuple")]
pub struct ArtifactBundle {
    pub tree: DecisionTreeRegressor,
    pub knn: KNeighborsRegressor,
    pub neural: MlpRegressor,
    pub schema: TrainingSchema,
    pub scaler: MinMaxScaler,
}

impl From<BundleTuple> for ArtifactBundle {
    fn from((tree, knn, neural, schema, scaler): BundleTuple) -> Self {
        Self {
            tree,
            knn,
            neural,
            schema,
            scaler,
        }
    }
}

impl From<ArtifactBundle> for BundleTuple {
    fn from(bundle: ArtifactBundle) -> Self {
        (bundle.tree, bundle.knn, bundle.neural, bundle.schema, bundle.scaler)
    }
}

impl ArtifactBundle {
    /// Read and validate the bundle at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading model artifact");

        let bytes = std::fs::read(path).map_err(|source| ArtifactError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let bundle = Self::decode(&bytes, ArtifactFormat::from_path(path))?;
        bundle.validate()?;

        info!(
            columns = bundle.schema.len(),
            tree_depth = bundle.tree.depth(),
            tree_leaves = bundle.tree.leaf_count(),
            knn_rows = bundle.knn.fit_x.len(),
            knn_k = bundle.knn.n_neighbors,
            mlp_layers = bundle.neural.layers.len(),
            "Model artifact loaded"
        );
        Ok(bundle)
    }

    /// Decode bundle bytes without consistency checks
    pub fn decode(bytes: &[u8], format: ArtifactFormat) -> Result<Self, ArtifactError> {
        match format {
            ArtifactFormat::Json => {
                let value: serde_json::Value = serde_json::from_slice(bytes)
                    .map_err(|e| ArtifactError::Corrupt(format!("invalid JSON: {}", e)))?;
                match &value {
                    serde_json::Value::Array(items) if items.len() == BUNDLE_ARITY => {}
                    serde_json::Value::Array(items) => {
                        return Err(ArtifactError::Corrupt(format!(
                            "expected a {}-element bundle, found {} elements",
                            BUNDLE_ARITY,
                            items.len()
                        )))
                    }
                    _ => {
                        return Err(ArtifactError::Corrupt(format!(
                            "expected a {}-element bundle",
                            BUNDLE_ARITY
                        )))
                    }
                }
                serde_json::from_value(value).map_err(|e| ArtifactError::Corrupt(e.to_string()))
            }
            ArtifactFormat::Postcard => {
                let (bundle, rest) = postcard::take_from_bytes::<ArtifactBundle>(bytes)
                    .map_err(|e| ArtifactError::Corrupt(format!("invalid postcard bundle: {}", e)))?;
                if !rest.is_empty() {
                    return Err(ArtifactError::Corrupt(format!(
                        "{} trailing bytes after bundle",
                        rest.len()
                    )));
                }
                Ok(bundle)
            }
        }
    }

    /// Encode the bundle for writing to disk
    pub fn encode(&self, format: ArtifactFormat) -> Result<Vec<u8>, ArtifactError> {
        match format {
            ArtifactFormat::Json => {
                serde_json::to_vec_pretty(self).map_err(|e| ArtifactError::Encode(e.to_string()))
            }
            ArtifactFormat::Postcard => {
                postcard::to_allocvec(self).map_err(|e| ArtifactError::Encode(e.to_string()))
            }
        }
    }

    /// Check every part agrees with the training schema
    pub fn validate(&self) -> Result<(), ArtifactError> {
        self.tree.validate().map_err(|e| corrupt(ModelKind::DecisionTree, e))?;
        self.knn.validate().map_err(|e| corrupt(ModelKind::Knn, e))?;
        self.neural.validate().map_err(|e| corrupt(ModelKind::NeuralNetwork, e))?;

        FeatureEncoder::new(self.schema.clone(), self.scaler.clone())
            .map_err(|e| ArtifactError::Corrupt(e.to_string()))?;

        let widths: [(ModelKind, &dyn Regressor); 3] = [
            (ModelKind::DecisionTree, &self.tree),
            (ModelKind::Knn, &self.knn),
            (ModelKind::NeuralNetwork, &self.neural),
        ];
        check_widths(&widths, self.schema.len())?;

        debug!("Model artifact consistent with {} schema columns", self.schema.len());
        Ok(())
    }

    /// Split into the shared read-only parts
    pub fn into_parts(self) -> (ModelTriple, TrainingSchema, MinMaxScaler) {
        (
            ModelTriple::new(self.tree, self.knn, self.neural),
            self.schema,
            self.scaler,
        )
    }
}

fn corrupt(model: ModelKind, err: crate::ModelError) -> ArtifactError {
    ArtifactError::Corrupt(format!("{} model: {}", model, err))
}

/// Every model must take exactly one value per schema column
pub(crate) fn check_widths(
    models: &[(ModelKind, &dyn Regressor)],
    columns: usize,
) -> Result<(), ArtifactError> {
    for (kind, model) in models {
        if model.n_features() != columns {
            return Err(ArtifactError::Corrupt(format!(
                "{} model expects {} features but the schema has {} columns",
                kind,
                model.n_features(),
                columns
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::knn::NeighborWeights;
    use crate::mlp::{Activation, DenseLayer};
    use crate::tree::TreeNode;

    /// Small consistent bundle over a four-column schema
    pub(crate) fn bundle() -> ArtifactBundle {
        let schema = TrainingSchema::new(
            ["Edad", "Plataforma_Otras", "Sexo_Otro", "Consumidor_habitual_Rara vez"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();

        ArtifactBundle {
            tree: DecisionTreeRegressor {
                n_features: 4,
                nodes: vec![
                    TreeNode::Split {
                        feature: 3,
                        threshold: 0.5,
                        left: 1,
                        right: 2,
                    },
                    TreeNode::Leaf { value: 60.0 },
                    TreeNode::Leaf { value: 12.0 },
                ],
            },
            knn: KNeighborsRegressor {
                n_neighbors: 1,
                weights: NeighborWeights::Uniform,
                p: 2.0,
                fit_x: vec![vec![0.2, 1.0, 1.0, 1.0], vec![0.8, 0.0, 0.0, 0.0]],
                fit_y: vec![20.0, 80.0],
            },
            neural: MlpRegressor {
                activation: Activation::Relu,
                layers: vec![DenseLayer {
                    weights: vec![vec![10.0], vec![0.0], vec![0.0], vec![-5.0]],
                    biases: vec![25.0],
                }],
            },
            schema,
            scaler: MinMaxScaler::new(14.0, 90.0),
        }
    }

    fn write_temp(name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("spend-artifact-{}-{}", std::process::id(), name));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = ArtifactBundle::load("does/not/exist/spend-ensemble.json").unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { .. }));
        assert!(err.to_string().contains("does/not/exist"));
    }

    #[test]
    fn test_json_bundle_is_a_five_tuple() {
        let json = serde_json::to_value(bundle()).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(5));
        assert_eq!(json[3][0], "Edad");
    }

    #[test]
    fn test_load_json_and_postcard() {
        let original = bundle();
        let json = write_temp("ok.json", &original.encode(ArtifactFormat::Json).unwrap());
        let bin = write_temp("ok.bin", &original.encode(ArtifactFormat::Postcard).unwrap());

        assert_eq!(ArtifactBundle::load(&json).unwrap(), original);
        assert_eq!(ArtifactBundle::load(&bin).unwrap(), original);

        std::fs::remove_file(json).ok();
        std::fs::remove_file(bin).ok();
    }

    #[test]
    fn test_wrong_arity_is_corrupt() {
        let mut json = serde_json::to_value(bundle()).unwrap();
        json.as_array_mut().unwrap().pop();
        let bytes = serde_json::to_vec(&json).unwrap();

        let err = ArtifactBundle::decode(&bytes, ArtifactFormat::Json).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(ref m) if m.contains("found 4 elements")));

        let err = ArtifactBundle::decode(br#"{"tree": {}}"#, ArtifactFormat::Json).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(_)));

        let err = ArtifactBundle::decode(b"\x00\x01garbage", ArtifactFormat::Postcard).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(_)));
    }

    #[test]
    fn test_width_mismatch_is_corrupt() {
        let mut broken = bundle();
        broken.tree.n_features = 5;
        let err = broken.validate().unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(ref m) if m.contains("decision_tree")));
    }

    #[test]
    fn test_scaler_column_must_exist() {
        let mut broken = bundle();
        broken.scaler.column = "Ingresos".to_string();
        assert!(matches!(broken.validate(), Err(ArtifactError::Corrupt(_))));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ArtifactFormat::from_path(Path::new("m.bin")), ArtifactFormat::Postcard);
        assert_eq!(ArtifactFormat::from_path(Path::new("m.postcard")), ArtifactFormat::Postcard);
        assert_eq!(ArtifactFormat::from_path(Path::new("m.json")), ArtifactFormat::Json);
        assert_eq!(ArtifactFormat::from_path(Path::new("m.pkl")), ArtifactFormat::Json);
    }

    #[test]
    fn test_into_parts() {
        let (models, schema, scaler) = bundle().into_parts();
        assert_eq!(schema.len(), 4);
        assert_eq!(scaler.data_max, 90.0);
        assert!(models.members().iter().all(|(_, m)| m.n_features() == 4));
    }
}
