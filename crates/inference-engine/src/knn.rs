//! K-Nearest Neighbours Regressor

use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};

use crate::model::{check_shape, Regressor};
use crate::ModelError;

/// How neighbour targets are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborWeights {
    /// Plain mean of the neighbours
    #[default]
    Uniform,
    /// Inverse-distance weighted mean
    Distance,
}

fn default_p() -> f64 {
    2.0
}

/// Brute-force nearest-neighbour regressor over the stored training rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNeighborsRegressor {
    /// Number of neighbours to average
    pub n_neighbors: usize,
    #[serde(default)]
    pub weights: NeighborWeights,
    /// Minkowski power (1 = manhattan, 2 = euclidean)
    #[serde(default = "default_p")]
    pub p: f64,
    /// Training rows
    pub fit_x: Vec<Vec<f64>>,
    /// Training targets, one per row
    pub fit_y: Vec<f64>,
}

impl KNeighborsRegressor {
    /// Check the stored training set is consistent
    pub fn validate(&self) -> Result<(), ModelError> {
        let samples = self.fit_x.len();
        if samples == 0 {
            return Err(ModelError::Malformed("knn has no training rows".to_string()));
        }
        if self.fit_y.len() != samples {
            return Err(ModelError::Malformed(format!(
                "knn has {} rows but {} targets",
                samples,
                self.fit_y.len()
            )));
        }
        if self.n_neighbors == 0 || self.n_neighbors > samples {
            return Err(ModelError::Malformed(format!(
                "knn n_neighbors={} with {} rows",
                self.n_neighbors, samples
            )));
        }
        if !(self.p.is_finite() && self.p >= 1.0) {
            return Err(ModelError::Malformed(format!("knn p={} must be >= 1", self.p)));
        }

        let width = self.fit_x[0].len();
        if let Some(row) = self.fit_x.iter().position(|r| r.len() != width) {
            return Err(ModelError::Malformed(format!(
                "knn row {} has {} features, expected {}",
                row,
                self.fit_x[row].len(),
                width
            )));
        }
        if !self.fit_y.iter().all(|y| y.is_finite()) {
            return Err(ModelError::Malformed("knn targets must be finite".to_string()));
        }
        Ok(())
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let diffs = a.iter().zip(b).map(|(x, y)| (x - y).abs());
        if self.p == 1.0 {
            diffs.sum()
        } else if self.p == 2.0 {
            diffs.map(|d| d * d).sum::<f64>().sqrt()
        } else {
            diffs.map(|d| d.powf(self.p)).sum::<f64>().powf(1.0 / self.p)
        }
    }

    fn target(&self, row: usize) -> Result<f64, ModelError> {
        self.fit_y.get(row).copied().ok_or_else(|| {
            ModelError::Malformed(format!(
                "knn row {} has no target ({} targets)",
                row,
                self.fit_y.len()
            ))
        })
    }

    fn mean_target(&self, rows: impl Iterator<Item = usize>) -> Result<f64, ModelError> {
        let (mut sum, mut n) = (0.0, 0usize);
        for row in rows {
            sum += self.target(row)?;
            n += 1;
        }
        Ok(sum / n as f64)
    }

    /// Indices and distances of the nearest rows, closest first.
    ///
    /// Equal distances keep training-row order.
    pub fn neighbors(&self, features: &FeatureVector) -> Result<Vec<(usize, f64)>, ModelError> {
        check_shape(self.n_features(), features)?;

        let x = features.as_slice();
        if let Some(row) = self.fit_x.iter().position(|r| r.len() != x.len()) {
            return Err(ModelError::Malformed(format!(
                "knn row {} has {} features, expected {}",
                row,
                self.fit_x[row].len(),
                x.len()
            )));
        }

        let mut distances: Vec<(usize, f64)> = self
            .fit_x
            .iter()
            .enumerate()
            .map(|(i, row)| (i, self.distance(x, row)))
            .collect();
        distances.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        distances.truncate(self.n_neighbors);
        Ok(distances)
    }
}

impl Regressor for KNeighborsRegressor {
    fn n_features(&self) -> usize {
        self.fit_x.first().map_or(0, Vec::len)
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let neighbors = self.neighbors(features)?;
        if neighbors.is_empty() {
            return Err(ModelError::Malformed("knn has no neighbours".to_string()));
        }

        let prediction = match self.weights {
            NeighborWeights::Uniform => self.mean_target(neighbors.iter().map(|(i, _)| *i))?,
            NeighborWeights::Distance => {
                if neighbors.iter().any(|(_, d)| *d == 0.0) {
                    // exact matches dominate
                    self.mean_target(neighbors.iter().filter(|(_, d)| *d == 0.0).map(|(i, _)| *i))?
                } else {
                    let (mut num, mut den) = (0.0, 0.0);
                    for (i, d) in &neighbors {
                        num += self.target(*i)? / d;
                        den += 1.0 / d;
                    }
                    num / den
                }
            }
        };

        if !prediction.is_finite() {
            return Err(ModelError::NonFiniteOutput(prediction));
        }
        Ok(prediction)
    }
}
