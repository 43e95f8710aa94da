//! Feature Engineering Engine
//!
//! Turns a raw user profile into the exact feature vector the spend models
//! were trained on: one-hot indicators, min-max scaled age, and alignment
//! against the training schema.

mod features;
mod profile;
mod scaler;
mod schema;

pub use features::{FeatureEncoder, FeatureVector};
pub use profile::{
    Categorical, GameGenre, Gender, PlayFrequency, Platform, RawProfile, AGE_COLUMN,
};
pub use scaler::MinMaxScaler;
pub use schema::TrainingSchema;

use thiserror::Error;

/// Errors building the encoder or parsing categorical labels
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Unknown {field} value: {value:?}")]
    UnknownCategory { field: &'static str, value: String },
    #[error("Training schema has no columns")]
    EmptySchema,
    #[error("Duplicate column in training schema: {0}")]
    DuplicateColumn(String),
    #[error("Column {0:?} is missing from the training schema")]
    MissingColumn(String),
    #[error("Invalid scaler parameters: {0}")]
    InvalidScaler(String),
}
