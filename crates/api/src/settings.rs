//! Configuration management
//!
//! Loaded in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. `config/default.toml`
//! 3. `config/local.toml`
//! 4. Environment variables prefixed with `SPEND__`, e.g.
//!    `SPEND__ARTIFACT__PATH` -> `artifact.path`

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use data_validator::ValidationConfig;
use serde::Deserialize;
use std::path::Path;

/// Application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub artifact: ArtifactSettings,
    pub validation: ValidationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    /// `host:port` to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactSettings {
    /// Model bundle path, relative to the working directory
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationSettings {
    pub min_age: i64,
    pub max_age: i64,
}

impl From<&ValidationSettings> for ValidationConfig {
    fn from(settings: &ValidationSettings) -> Self {
        ValidationConfig {
            age_range: (settings.min_age, settings.max_age),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Log level or `EnvFilter` directive
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080_i64)?
        .set_default("artifact.path", "models/spend-ensemble.json")?
        .set_default("validation.min_age", 14_i64)?
        .set_default("validation.max_age", 120_i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "pretty")
}

fn environment() -> Environment {
    Environment::with_prefix("SPEND")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Load from `config/` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_dir("config")
    }

    /// Load from a custom config directory and the environment
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        defaults()?
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join("local")).required(false))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only
    pub fn defaults() -> Result<Self, ConfigError> {
        defaults()?.build()?.try_deserialize()
    }
}
