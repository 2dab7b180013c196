//! Plant Configuration Module
//!
//! Per-deployment configuration loaded from TOML, covering default KPI
//! thresholds, the HTTP server, the hosted records backend, and the
//! credential table.
//!
//! ## Loading Order
//!
//! 1. `SUIVI_CONFIG` environment variable (path to TOML file)
//! 2. `plant_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded `PlantConfig` is constructed once in `main` and passed down
//! explicitly. The KPI engine itself only ever sees `&Thresholds` as a
//! parameter — configuration is never read from ambient state.

pub mod defaults;
mod validation;

pub use validation::{check_unknown_keys, ValidationWarning};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::types::Thresholds;

/// Configuration errors. Validation carries one message per offending field.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("configuration validation failed: {0:?}")]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

/// Plant identification, shown in logs and the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantInfo {
    pub name: String,
    pub site: String,
}

impl Default for PlantInfo {
    fn default() -> Self {
        Self {
            name: "Conditionnement dattes".to_string(),
            site: "Atelier principal".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, e.g. "0.0.0.0:8080"
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::DEFAULT_SERVER_ADDR.to_string(),
        }
    }
}

/// Hosted records backend (REST) connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the hosted backend, e.g. "https://xyz.supabase.co"
    pub url: String,
    /// Service API key sent as `apikey` + bearer token
    pub api_key: String,
    /// Weigh-in table name
    pub weigh_table: String,
    /// Incident table name
    pub incident_table: String,
    /// Snapshot cache freshness window (seconds)
    pub cache_ttl_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            weigh_table: defaults::DEFAULT_WEIGH_TABLE.to_string(),
            incident_table: defaults::DEFAULT_INCIDENT_TABLE.to_string(),
            cache_ttl_secs: defaults::DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// One credential table row. The role string is parsed by `auth`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialEntry {
    pub username: String,
    pub password: String,
    pub role: String,
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one plant deployment.
///
/// Load with [`PlantConfig::load`], which follows the standard search order
/// and falls back to built-in defaults when no file is present.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlantConfig {
    /// Plant identification
    pub plant: PlantInfo,
    /// Default KPI thresholds handed to each new session
    pub thresholds: Thresholds,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Hosted backend connection
    pub backend: BackendConfig,
    /// Credential table (username/password/role)
    pub credentials: Vec<CredentialEntry>,
}

impl PlantConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SUIVI_CONFIG` environment variable
    /// 2. `./plant_config.toml`
    /// 3. Built-in defaults
    ///
    /// Returns the config plus any non-fatal warnings (unknown keys).
    pub fn load() -> (Self, Vec<ValidationWarning>) {
        if let Ok(path) = std::env::var("SUIVI_CONFIG") {
            match Self::load_from_file(Path::new(&path)) {
                Ok((config, warnings)) => {
                    info!(path = %path, "loaded config from SUIVI_CONFIG");
                    return (config, warnings);
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "SUIVI_CONFIG set but unusable, trying defaults");
                }
            }
        }

        let local = PathBuf::from("plant_config.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok((config, warnings)) => {
                    info!("loaded config from ./plant_config.toml");
                    return (config, warnings);
                }
                Err(e) => {
                    warn!(error = %e, "plant_config.toml present but unusable, using defaults");
                }
            }
        }

        info!("no config file found, using built-in defaults");
        (Self::default(), Vec::new())
    }

    /// Parse a specific TOML file, collecting unknown-key warnings before
    /// the typed deserialization.
    pub fn load_from_file(path: &Path) -> Result<(Self, Vec<ValidationWarning>), ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let value: toml::Value = toml::from_str(&raw)?;
        let warnings = check_unknown_keys(&value);
        for w in &warnings {
            warn!(field = %w.field, "{w}");
        }
        let config: Self = toml::from_str(&raw)?;
        Ok((config, warnings))
    }

    /// Write the config to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let rendered = toml::to_string_pretty(self)?;
        std::fs::write(path, rendered)?;
        Ok(())
    }

    /// Range-check thresholds and connection settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let Err(threshold_errors) = self.thresholds.validate() {
            errors.extend(threshold_errors);
        }
        if self.backend.cache_ttl_secs == 0 {
            errors.push("backend.cache_ttl_secs must be >= 1".to_string());
        }
        if self.server.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!("server.addr is not a valid socket address: {}", self.server.addr));
        }
        for entry in &self.credentials {
            if entry.username.is_empty() {
                errors.push("credentials entry with empty username".to_string());
            }
            if entry.password.is_empty() {
                errors.push(format!("credential '{}' has an empty password", entry.username));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}
