//! Profile Validation
//!
//! Checks submitted form fields against the age bounds and the categorical
//! vocabularies before they reach the feature encoder.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ProfileForm, ValidationConfig, ValidationResult, Validator};
