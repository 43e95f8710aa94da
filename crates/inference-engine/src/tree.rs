//! Decision Tree Regressor

use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};

use crate::model::{check_shape, Regressor};
use crate::ModelError;

/// One node of a fitted tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, otherwise `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal prediction
    Leaf { value: f64 },
}

/// Regression tree stored as a flat node list rooted at index 0.
///
/// Children always sit after their parent, so traversal terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

impl DecisionTreeRegressor {
    /// Check node references and feature indices
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Malformed("decision tree has no nodes".to_string()));
        }

        let count = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= self.n_features {
                        return Err(ModelError::Malformed(format!(
                            "node {} splits on feature {} of {}",
                            i, feature, self.n_features
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(ModelError::Malformed(format!("node {} has a NaN threshold", i)));
                    }
                    for child in [left, right] {
                        if child <= i || child >= count {
                            return Err(ModelError::Malformed(format!(
                                "node {} points to invalid child {}",
                                i, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ModelError::Malformed(format!("leaf {} has value {}", i, value)));
                    }
                }
            }
        }
        Ok(())
    }

    /// Longest root-to-leaf path, in edges
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], i: usize) -> usize {
            match nodes.get(i) {
                Some(TreeNode::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }
}

impl Regressor for DecisionTreeRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        check_shape(self.n_features, features)?;
        let x = features.as_slice();

        let mut i = 0;
        loop {
            match self.nodes.get(i) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = x.get(*feature).ok_or_else(|| {
                        ModelError::Malformed(format!(
                            "node {} splits on feature {} of {}",
                            i,
                            feature,
                            x.len()
                        ))
                    })?;
                    let next = if *value <= *threshold { *left } else { *right };
                    if next <= i {
                        return Err(ModelError::Malformed(format!("cycle at node {}", i)));
                    }
                    i = next;
                }
                None => return Err(ModelError::Malformed(format!("missing node {}", i))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> DecisionTreeRegressor {
        DecisionTreeRegressor {
            n_features: 2,
            nodes: vec![
                TreeNode::Split {
                    feature: 1,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: 10.0 },
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.25,
                    left: 3,
                    right: 4,
                },
                TreeNode::Leaf { value: 20.0 },
                TreeNode::Leaf { value: 40.0 },
            ],
        }
    }

    #[test]
    fn test_traversal() {
        let tree = stump();
        assert!(tree.validate().is_ok());
        assert_eq!(tree.predict(&FeatureVector::new(vec![0.9, 0.0])), Ok(10.0));
        // threshold is inclusive on the left
        assert_eq!(tree.predict(&FeatureVector::new(vec![0.9, 0.5])), Ok(10.0));
        assert_eq!(tree.predict(&FeatureVector::new(vec![0.25, 1.0])), Ok(20.0));
        assert_eq!(tree.predict(&FeatureVector::new(vec![0.3, 1.0])), Ok(40.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = stump().predict(&FeatureVector::new(vec![0.0; 3])).unwrap_err();
        assert_eq!(err, ModelError::InvalidInputShape { expected: 2, actual: 3 });
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let mut tree = stump();
        tree.nodes[2] = TreeNode::Split {
            feature: 0,
            threshold: 0.25,
            left: 0,
            right: 4,
        };
        assert!(matches!(tree.validate(), Err(ModelError::Malformed(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_feature() {
        let mut tree = stump();
        tree.n_features = 1;
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_unknown_feature_fails_prediction() {
        let mut tree = stump();
        tree.nodes[2] = TreeNode::Split {
            feature: 9,
            threshold: 0.25,
            left: 3,
            right: 4,
        };
        // left branch never reaches the bad split
        assert_eq!(tree.predict(&FeatureVector::new(vec![0.0, 0.0])), Ok(10.0));
        let err = tree.predict(&FeatureVector::new(vec![0.0, 1.0])).unwrap_err();
        assert!(matches!(err, ModelError::Malformed(_)));
    }

    #[test]
    fn test_shape_stats() {
        let tree = stump();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf_count(), 3);
    }

    #[test]
    fn test_node_json_layout() {
        let node: TreeNode = serde_json::from_str(r#"{"leaf": {"value": 3.5}}"#).unwrap();
        assert_eq!(node, TreeNode::Leaf { value: 3.5 });
    }
}
