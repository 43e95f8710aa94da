//! Feature Vector Assembly

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::profile::{RawProfile, AGE_COLUMN};
use crate::scaler::MinMaxScaler;
use crate::schema::TrainingSchema;
use crate::FeatureError;

/// Single-row feature vector for ML inference, in training-schema order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Raw feature values (one per schema column)
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// Wrap already-aligned values
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no features
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Feature values as a slice
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Value of a named column
    pub fn value_of(&self, schema: &TrainingSchema, column: &str) -> Option<f64> {
        schema.position(column).and_then(|i| self.values.get(i).copied())
    }

    /// `(column, value)` pairs in schema order
    pub fn named_values<'a>(
        &'a self,
        schema: &'a TrainingSchema,
    ) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Encodes raw profiles into the exact vector the models were fit on
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    schema: TrainingSchema,
    scaler: MinMaxScaler,
    /// Position of the scaled column, resolved once
    scaled_position: usize,
    /// Position of the raw age column, if the models use it
    age_position: Option<usize>,
}

impl FeatureEncoder {
    /// Create an encoder.
    ///
    /// Fails when the scaler is unusable or its column is not in the schema.
    pub fn new(schema: TrainingSchema, scaler: MinMaxScaler) -> Result<Self, FeatureError> {
        scaler.validate()?;
        let scaled_position = schema
            .position(&scaler.column)
            .ok_or_else(|| FeatureError::MissingColumn(scaler.column.clone()))?;
        let age_position = schema.position(AGE_COLUMN);

        Ok(Self {
            schema,
            scaler,
            scaled_position,
            age_position,
        })
    }

    /// Encode one profile.
    ///
    /// Indicators the schema does not know are dropped; schema columns not
    /// produced stay at 0. The scaler is applied to its column only.
    pub fn encode(&self, profile: &RawProfile) -> FeatureVector {
        let mut values = vec![0.0; self.schema.len()];

        if let Some(i) = self.age_position {
            values[i] = f64::from(profile.age);
        }

        for indicator in profile.indicators() {
            match self.schema.position(&indicator) {
                Some(i) => values[i] = 1.0,
                None => debug!(column = %indicator, "Indicator not in training schema, dropped"),
            }
        }

        values[self.scaled_position] = self.scaler.transform(values[self.scaled_position]);

        FeatureVector { values }
    }

    /// Training schema
    pub fn schema(&self) -> &TrainingSchema {
        &self.schema
    }
}
