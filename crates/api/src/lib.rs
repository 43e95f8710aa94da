//! Gamer Spend Estimator Server
//!
//! Serves the profile form, renders spend estimates, and exposes the same
//! estimate as a JSON API.

use anyhow::Context;
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod routes;
mod settings;

pub use settings::{ArtifactSettings, LoggingSettings, ServerSettings, Settings, ValidationSettings};

use data_validator::{ValidationConfig, Validator};
use inference_engine::{ArtifactError, SpendEstimator};

/// Application state shared read-only across handlers
pub struct AppState {
    /// Loaded encoder and models
    pub estimator: SpendEstimator,
    /// Submission validator
    pub validator: Validator,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Successful estimates since startup
    pub estimates_served: AtomicU64,
    /// Prometheus renderer, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create application state around a loaded estimator
    pub fn new(estimator: SpendEstimator, validation: ValidationConfig) -> Self {
        Self {
            estimator,
            validator: Validator::new(validation),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            estimates_served: AtomicU64::new(0),
            metrics: None,
        }
    }

    /// Load the model artifact named in the settings
    pub fn load(settings: &Settings) -> Result<Self, ArtifactError> {
        let estimator = SpendEstimator::load(Path::new(&settings.artifact.path))?;
        Ok(Self::new(estimator, ValidationConfig::from(&settings.validation)))
    }

    /// Attach a Prometheus handle for `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub schema_columns: usize,
    pub estimates_served: u64,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::estimate::get_form))
        .route("/estimate", post(routes::estimate::post_form))
        .route("/api/v1/estimate", post(routes::estimate::post_json))
        .route("/api/v1/options", get(routes::estimate::get_options))
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        schema_columns: state.estimator.schema().len(),
        estimates_served: state.estimates_served.load(Ordering::Relaxed),
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if settings.format == "json" {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}

/// Load the artifact and run the server.
///
/// The artifact is loaded before binding; a missing or corrupt bundle
/// stops startup.
pub async fn run_server(settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::load(settings).context("Cannot serve estimates")?;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;
    let state = Arc::new(state.with_metrics(handle));
    let app = create_router(state);

    let addr = settings.server.addr();
    info!("Starting estimate server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
