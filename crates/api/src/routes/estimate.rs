//! Estimate Routes

use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use data_validator::{ProfileForm, ValidationError};
use feature_engine::{Categorical, GameGenre, Gender, PlayFrequency, Platform, RawProfile};
use inference_engine::{Estimate, InferenceError, ModelContribution};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

use super::page;
use crate::AppState;

/// Why an estimate could not be produced
#[derive(Debug)]
pub enum EstimateFailure {
    Invalid(Vec<ValidationError>),
    Failed(InferenceError),
}

impl EstimateFailure {
    /// Message shown to the user
    pub fn message(&self) -> String {
        match self {
            EstimateFailure::Invalid(errors) => {
                let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
                format!("Please check your answers: {}", details.join("; "))
            }
            EstimateFailure::Failed(e) => format!("An error occurred during the prediction: {}", e),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            EstimateFailure::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EstimateFailure::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            EstimateFailure::Invalid(_) => "invalid_profile",
            EstimateFailure::Failed(_) => "prediction_failed",
        }
    }
}

/// Validate, encode and predict one submission
pub fn run_estimate(
    state: &AppState,
    form: &ProfileForm,
) -> Result<(RawProfile, Estimate), EstimateFailure> {
    let validated = state.validator.validate_all(form);
    let profile = match validated.profile {
        Some(profile) if validated.is_valid() => profile,
        _ => {
            warn!(errors = validated.errors.len(), "Rejected profile submission");
            metrics::counter!("estimate_failures_total", "reason" => "invalid").increment(1);
            return Err(EstimateFailure::Invalid(validated.errors));
        }
    };

    match state.estimator.estimate(&profile) {
        Ok(estimate) => {
            state.estimates_served.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("estimates_total").increment(1);
            metrics::histogram!("estimate_latency_seconds").record(estimate.latency_us as f64 / 1e6);
            info!(
                estimate = estimate.amount(),
                latency_us = estimate.latency_us,
                "Estimate served"
            );
            Ok((profile, estimate))
        }
        Err(e) => {
            warn!(error = %e, "Estimate failed");
            metrics::counter!("estimate_failures_total", "reason" => "prediction").increment(1);
            Err(EstimateFailure::Failed(e))
        }
    }
}

/// Render the empty form
pub async fn get_form(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(page::render_form(state.validator.config().age_range))
}

/// Handle a form submission and render the result page
pub async fn post_form(
    State(state): State<Arc<AppState>>,
    form: Result<Form<ProfileForm>, FormRejection>,
) -> Response {
    let age_range = state.validator.config().age_range;

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!(error = %rejection, "Unreadable form submission");
            let message = format!("Could not read the form: {}", rejection.body_text());
            return (
                rejection.status(),
                Html(page::render_error(None, &message, age_range)),
            )
                .into_response();
        }
    };

    match run_estimate(&state, &form) {
        Ok((profile, estimate)) => {
            Html(page::render_estimate(
                &profile,
                &estimate,
                state.estimator.schema(),
                age_range,
            ))
            .into_response()
        }
        Err(failure) => (
            failure.status(),
            Html(page::render_error(Some(&form), &failure.message(), age_range)),
        )
            .into_response(),
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

/// One encoded column of the model input
#[derive(Debug, Serialize)]
pub struct NamedFeature {
    pub column: String,
    pub value: f64,
}

/// JSON estimate body
#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub estimate: f64,
    pub formatted: String,
    pub models: Vec<ModelContribution>,
    pub profile: ProfileForm,
    pub features: Vec<NamedFeature>,
    pub latency_us: u64,
}

/// JSON estimate endpoint
pub async fn post_json(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProfileForm>, JsonRejection>,
) -> Response {
    let form = match body {
        Ok(Json(form)) => form,
        Err(rejection) => {
            let error = ApiError {
                error: "invalid_json".to_string(),
                message: rejection.body_text(),
                fields: Vec::new(),
            };
            return (rejection.status(), Json(error)).into_response();
        }
    };

    match run_estimate(&state, &form) {
        Ok((profile, estimate)) => Json(EstimateResponse {
            estimate: estimate.amount(),
            formatted: estimate.formatted(),
            models: estimate.prediction.contributions.clone(),
            profile: ProfileForm::from(&profile),
            features: estimate
                .features
                .named_values(state.estimator.schema())
                .map(|(column, value)| NamedFeature {
                    column: column.to_string(),
                    value,
                })
                .collect(),
            latency_us: estimate.latency_us,
        })
        .into_response(),
        Err(failure) => {
            let fields = match &failure {
                EstimateFailure::Invalid(errors) => {
                    errors.iter().map(|e| e.field().to_string()).collect()
                }
                EstimateFailure::Failed(_) => Vec::new(),
            };
            let error = ApiError {
                error: failure.code().to_string(),
                message: failure.message(),
                fields,
            };
            (failure.status(), Json(error)).into_response()
        }
    }
}

/// Available options for every categorical field
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub age_range: (i64, i64),
    pub gender: Vec<&'static str>,
    pub genre: Vec<&'static str>,
    pub platform: Vec<&'static str>,
    pub frequency: Vec<&'static str>,
}

/// List the accepted values
pub async fn get_options(State(state): State<Arc<AppState>>) -> Json<OptionsResponse> {
    Json(OptionsResponse {
        age_range: state.validator.config().age_range,
        gender: Gender::labels(),
        genre: GameGenre::labels(),
        platform: Platform::labels(),
        frequency: PlayFrequency::labels(),
    })
}
