//! Profile Validator for Range and Option Checking

use crate::error::ValidationError;
use feature_engine::{Categorical, GameGenre, Gender, PlayFrequency, Platform, RawProfile};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of fields in a submitted profile
const PROFILE_FIELDS: usize = 5;

/// Validation configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Accepted age range in years, inclusive
    pub age_range: (i64, i64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { age_range: (14, 120) }
    }
}

/// Profile fields exactly as submitted by the form or JSON client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
}

impl From<&RawProfile> for ProfileForm {
    fn from(profile: &RawProfile) -> Self {
        Self {
            age: Some(i64::from(profile.age)),
            gender: Some(profile.gender.label().to_string()),
            genre: Some(profile.genre.label().to_string()),
            platform: Some(profile.platform.label().to_string()),
            frequency: Some(profile.frequency.label().to_string()),
        }
    }
}

/// Result of validating every field of a form
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Validated profile, present only when there are no errors
    pub profile: Option<RawProfile>,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Whether all fields are valid
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validator for submitted profiles
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: i64,
        range: (i64, i64),
    ) -> Result<(), ValidationError> {
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate age
    pub fn validate_age(&self, age: Option<i64>) -> Result<u32, ValidationError> {
        let age = age.ok_or(ValidationError::MissingField("age"))?;
        self.validate_range("age", age, self.config.age_range)?;
        u32::try_from(age).map_err(|_| ValidationError::OutOfRange {
            field: "age",
            value: age,
            min: self.config.age_range.0,
            max: self.config.age_range.1,
        })
    }

    /// Validate one categorical field against its vocabulary
    pub fn validate_option<T: Categorical>(&self, value: Option<&str>) -> Result<T, ValidationError> {
        let value = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(ValidationError::MissingField(T::FIELD))?;
        T::from_label(value).map_err(|_| ValidationError::UnknownOption {
            field: T::FIELD,
            value: value.to_string(),
        })
    }

    /// Validate a form, stopping at the first error
    pub fn validate(&self, form: &ProfileForm) -> Result<RawProfile, ValidationError> {
        Ok(RawProfile {
            age: self.validate_age(form.age)?,
            gender: self.validate_option(form.gender.as_deref())?,
            genre: self.validate_option(form.genre.as_deref())?,
            platform: self.validate_option(form.platform.as_deref())?,
            frequency: self.validate_option(form.frequency.as_deref())?,
        })
    }

    /// Validate a form, collecting every field error
    pub fn validate_all(&self, form: &ProfileForm) -> ValidationResult {
        let mut errors = Vec::new();

        let age = self.validate_age(form.age).map_err(|e| errors.push(e)).ok();
        let gender = self
            .validate_option::<Gender>(form.gender.as_deref())
            .map_err(|e| errors.push(e))
            .ok();
        let genre = self
            .validate_option::<GameGenre>(form.genre.as_deref())
            .map_err(|e| errors.push(e))
            .ok();
        let platform = self
            .validate_option::<Platform>(form.platform.as_deref())
            .map_err(|e| errors.push(e))
            .ok();
        let frequency = self
            .validate_option::<PlayFrequency>(form.frequency.as_deref())
            .map_err(|e| errors.push(e))
            .ok();

        let profile = match (age, gender, genre, platform, frequency) {
            (Some(age), Some(gender), Some(genre), Some(platform), Some(frequency)) => {
                Some(RawProfile {
                    age,
                    gender,
                    genre,
                    platform,
                    frequency,
                })
            }
            _ => None,
        };

        if !errors.is_empty() {
            debug!("Profile rejected with {} field errors", errors.len());
        }

        ValidationResult {
            profile,
            errors,
            fields_checked: PROFILE_FIELDS,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
