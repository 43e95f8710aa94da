//! Min-Max Scaling with Fitted Parameters

use serde::{Deserialize, Serialize};

use crate::profile::AGE_COLUMN;
use crate::FeatureError;

fn default_column() -> String {
    AGE_COLUMN.to_string()
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Min-max transform fitted at training time.
///
/// The stored min/max are never recomputed from incoming rows, so values
/// outside the training range extrapolate past the feature range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    /// Column the scaler was fitted on
    #[serde(default = "default_column")]
    pub column: String,
    /// Minimum seen during fitting
    pub data_min: f64,
    /// Maximum seen during fitting
    pub data_max: f64,
    /// Output range (default: [0, 1])
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
}

impl MinMaxScaler {
    /// Create a scaler for the age column with the default [0, 1] range
    pub fn new(data_min: f64, data_max: f64) -> Self {
        Self {
            column: default_column(),
            data_min,
            data_max,
            feature_range: default_feature_range(),
        }
    }

    /// Check the fitted parameters are usable
    pub fn validate(&self) -> Result<(), FeatureError> {
        let (lo, hi) = self.feature_range;
        let finite = [self.data_min, self.data_max, lo, hi].iter().all(|v| v.is_finite());
        if !finite || self.data_min > self.data_max || lo >= hi {
            return Err(FeatureError::InvalidScaler(format!(
                "min={} max={} range=({}, {})",
                self.data_min, self.data_max, lo, hi
            )));
        }
        Ok(())
    }

    /// Scale a single value.
    ///
    /// A zero data range is treated as 1, matching scikit-learn.
    pub fn transform(&self, value: f64) -> f64 {
        let (lo, hi) = self.feature_range;
        let mut range = self.data_max - self.data_min;
        if range == 0.0 {
            range = 1.0;
        }
        (value - self.data_min) / range * (hi - lo) + lo
    }
}
