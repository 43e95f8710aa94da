//! Multilayer Perceptron Regressor

use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};

use crate::model::{check_shape, Regressor};
use crate::ModelError;

/// Hidden-layer activation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Identity,
    Logistic,
    Tanh,
    #[default]
    Relu,
}

impl Activation {
    fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Logistic => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
        }
    }
}

/// Fully connected layer; `weights[input][output]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.len()
    }

    fn outputs(&self) -> usize {
        self.biases.len()
    }

    fn forward(&self, input: &[f64]) -> Result<Vec<f64>, String> {
        if input.len() != self.inputs() {
            return Err(format!("takes {} values, got {}", self.inputs(), input.len()));
        }

        let mut out = self.biases.clone();
        for (x, row) in input.iter().zip(&self.weights) {
            if row.len() != out.len() {
                return Err(format!("weight row has {} columns, expected {}", row.len(), out.len()));
            }
            for (o, w) in out.iter_mut().zip(row) {
                *o += x * w;
            }
        }
        Ok(out)
    }
}

/// Feed-forward regressor with an identity output unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpRegressor {
    #[serde(default)]
    pub activation: Activation,
    pub layers: Vec<DenseLayer>,
}

impl MlpRegressor {
    /// Check the layer shapes chain and end in one output unit
    pub fn validate(&self) -> Result<(), ModelError> {
        let last = self
            .layers
            .last()
            .ok_or_else(|| ModelError::Malformed("network has no layers".to_string()))?;

        for (i, layer) in self.layers.iter().enumerate() {
            if layer.inputs() == 0 || layer.outputs() == 0 {
                return Err(ModelError::Malformed(format!("layer {} is empty", i)));
            }
            if let Some(row) = layer.weights.iter().position(|r| r.len() != layer.outputs()) {
                return Err(ModelError::Malformed(format!(
                    "layer {} weight row {} has {} columns, expected {}",
                    i,
                    row,
                    layer.weights[row].len(),
                    layer.outputs()
                )));
            }
            let finite = layer.biases.iter().chain(layer.weights.iter().flatten()).all(|v| v.is_finite());
            if !finite {
                return Err(ModelError::Malformed(format!("layer {} has non-finite parameters", i)));
            }
        }

        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].outputs() != pair[1].inputs() {
                return Err(ModelError::Malformed(format!(
                    "layer {} emits {} values but layer {} takes {}",
                    i,
                    pair[0].outputs(),
                    i + 1,
                    pair[1].inputs()
                )));
            }
        }

        if last.outputs() != 1 {
            return Err(ModelError::Malformed(format!(
                "output layer has {} units, expected 1",
                last.outputs()
            )));
        }
        Ok(())
    }
}

impl Regressor for MlpRegressor {
    fn n_features(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::inputs)
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        check_shape(self.n_features(), features)?;

        let hidden = self.layers.len().saturating_sub(1);
        let mut activations = features.values.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            activations = layer
                .forward(&activations)
                .map_err(|e| ModelError::Malformed(format!("layer {}: {}", i, e)))?;
            if i < hidden {
                for a in activations.iter_mut() {
                    *a = self.activation.apply(*a);
                }
            }
        }

        let prediction = match activations[..] {
            [value] => value,
            _ => {
                return Err(ModelError::Malformed(format!(
                    "network produced {} outputs, expected 1",
                    activations.len()
                )))
            }
        };
        if !prediction.is_finite() {
            return Err(ModelError::NonFiniteOutput(prediction));
        }
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2 inputs -> 2 hidden -> 1 output
    fn network(activation: Activation) -> MlpRegressor {
        MlpRegressor {
            activation,
            layers: vec![
                DenseLayer {
                    weights: vec![vec![1.0, -1.0], vec![2.0, 0.5]],
                    biases: vec![0.0, 1.0],
                },
                DenseLayer {
                    weights: vec![vec![3.0], vec![2.0]],
                    biases: vec![5.0],
                },
            ],
        }
    }

    #[test]
    fn test_relu_forward() {
        let mlp = network(Activation::Relu);
        assert!(mlp.validate().is_ok());
        // hidden = relu([1 + 4, -1 + 1 + 1]) = [5, 1]; out = 15 + 2 + 5
        let prediction = mlp.predict(&FeatureVector::new(vec![1.0, 2.0])).unwrap();
        assert!((prediction - 22.0).abs() < 1e-12);
    }

    #[test]
    fn test_relu_clips_negative_hidden() {
        let mlp = network(Activation::Relu);
        // hidden pre-activation = [-2, 3] -> [0, 3]; out = 0 + 6 + 5
        let prediction = mlp.predict(&FeatureVector::new(vec![-2.0, 0.0])).unwrap();
        assert!((prediction - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_identity_and_logistic() {
        let linear = network(Activation::Identity);
        // hidden = [-2, 3]; out = -6 + 6 + 5
        let prediction = linear.predict(&FeatureVector::new(vec![-2.0, 0.0])).unwrap();
        assert!((prediction - 5.0).abs() < 1e-12);

        let logistic = network(Activation::Logistic);
        let zero = logistic.predict(&FeatureVector::new(vec![0.0, -2.0])).unwrap();
        // hidden pre-activation = [-4, 0]
        let expected = 3.0 / (1.0 + 4f64.exp()) + 2.0 * 0.5 + 5.0;
        assert!((zero - expected).abs() < 1e-12);
    }

    #[test]
    fn test_validate_shapes() {
        let mut broken = network(Activation::Relu);
        broken.layers[1].weights.pop();
        assert!(matches!(broken.validate(), Err(ModelError::Malformed(_))));

        let mut wide = network(Activation::Relu);
        wide.layers[1].biases.push(0.0);
        for row in wide.layers[1].weights.iter_mut() {
            row.push(0.0);
        }
        assert!(wide.validate().is_err());

        let empty = MlpRegressor {
            activation: Activation::Relu,
            layers: Vec::new(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_unchained_layers_fail_prediction() {
        let mut broken = network(Activation::Relu);
        broken.layers[1].weights.pop();
        let err = broken.predict(&FeatureVector::new(vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(err, ModelError::Malformed(_)));

        let mut short_row = network(Activation::Relu);
        short_row.layers[0].weights[1].pop();
        let err = short_row.predict(&FeatureVector::new(vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(err, ModelError::Malformed(_)));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = network(Activation::Tanh)
            .predict(&FeatureVector::new(vec![1.0; 3]))
            .unwrap_err();
        assert_eq!(err, ModelError::InvalidInputShape { expected: 2, actual: 3 });
    }
}
