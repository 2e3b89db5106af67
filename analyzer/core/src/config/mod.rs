//! TOML Configuration File Support
//!
//! Configuration for the analysis client, read from
//! `$XDG_CONFIG_HOME/soilscope/config.toml` (typically
//! `~/.config/soilscope/config.toml`).
//!
//! # Configuration Priority
//!
//! Highest first:
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [endpoint]
//! url = "http://localhost:5000/analyze"
//! timeout_secs = 60
//! field_name = "file"
//! max_response_bytes = 1048576
//!
//! [upload]
//! max_file_size_bytes = 10485760
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::EndpointConfig;
use crate::upload::UploadLimits;

/// Environment variable for the endpoint URL
pub const ENV_ENDPOINT: &str = "SOILSCOPE_ENDPOINT";
/// Environment variable for the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "SOILSCOPE_TIMEOUT_SECS";
/// Environment variable for the upload size limit in bytes
pub const ENV_MAX_UPLOAD_BYTES: &str = "SOILSCOPE_MAX_UPLOAD_BYTES";
/// Environment variable for the response size limit in bytes
pub const ENV_MAX_RESPONSE_BYTES: &str = "SOILSCOPE_MAX_RESPONSE_BYTES";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the effective configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[endpoint]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointToml {
    /// Classification endpoint URL
    pub url: Option<String>,

    /// Whole-request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Multipart field carrying the image
    pub field_name: Option<String>,

    /// Largest response body accepted
    pub max_response_bytes: Option<usize>,
}

/// `[upload]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadToml {
    /// Largest image accepted for upload
    pub max_file_size_bytes: Option<u64>,
}

/// Root of the TOML file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilscopeToml {
    /// Endpoint settings
    pub endpoint: EndpointToml,

    /// Upload settings
    pub upload: UploadToml,
}

// =============================================================================
// Effective Configuration
// =============================================================================

/// Fully resolved configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Classification endpoint
    pub endpoint: EndpointConfig,

    /// Local upload limits
    pub upload: UploadLimits,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            upload: UploadLimits::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check that every value is usable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint.parsed_url()?;

        if self.endpoint.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "endpoint timeout must be at least 1 second".into(),
            ));
        }
        if self.endpoint.field_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "multipart field name must not be empty".into(),
            ));
        }
        if self.endpoint.max_response_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "max_response_bytes must be greater than zero".into(),
            ));
        }
        if self.upload.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_file_size_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/soilscope/config.toml` or
/// `~/.config/soilscope/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("soilscope").join("config.toml"))
}

/// Load configuration from the default file and the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting values fail validation. A missing file is not an error.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    load_config_with_overrides(path, &ConfigOverrides::default())
}

/// Load configuration with command-line overrides on top
///
/// Layers file, environment and `overrides` in that order and validates
/// once at the end, so a valid override rescues an invalid lower layer.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the merged values fail validation.
pub fn load_config_with_overrides(
    path: Option<PathBuf>,
    overrides: &ConfigOverrides,
) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: SoilscopeToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);
    overrides.apply(&mut config);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut AppConfig, toml: &SoilscopeToml) {
    if let Some(ref url) = toml.endpoint.url {
        config.endpoint.url = url.clone();
    }
    if let Some(secs) = toml.endpoint.timeout_secs {
        config.endpoint.timeout = Duration::from_secs(secs);
    }
    if let Some(ref field) = toml.endpoint.field_name {
        config.endpoint.field_name = field.clone();
    }
    if let Some(max) = toml.endpoint.max_response_bytes {
        config.endpoint.max_response_bytes = max;
    }
    if let Some(max) = toml.upload.max_file_size_bytes {
        config.upload.max_file_size = max;
    }
}

fn apply_env_config(config: &mut AppConfig) {
    if let Ok(url) = std::env::var(ENV_ENDPOINT) {
        if !url.trim().is_empty() {
            config.endpoint.url = url.trim().to_string();
            config.source = ConfigSource::Env;
        }
    }
    if let Some(secs) = env_number::<u64>(ENV_TIMEOUT_SECS) {
        config.endpoint.timeout = Duration::from_secs(secs);
        config.source = ConfigSource::Env;
    }
    if let Some(max) = env_number::<u64>(ENV_MAX_UPLOAD_BYTES) {
        config.upload.max_file_size = max;
        config.source = ConfigSource::Env;
    }
    if let Some(max) = env_number::<usize>(ENV_MAX_RESPONSE_BYTES) {
        config.endpoint.max_response_bytes = max;
        config.source = ConfigSource::Env;
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring non-numeric environment value");
            None
        }
    }
}

// =============================================================================
// CLI Overrides
// =============================================================================

/// Values given on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Endpoint URL override
    pub endpoint: Option<String>,

    /// Timeout override in seconds
    pub timeout_secs: Option<u64>,

    /// Upload size limit override
    pub max_file_size: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set endpoint override
    #[must_use]
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Set timeout override
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set upload size limit override
    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoint.is_none() && self.timeout_secs.is_none() && self.max_file_size.is_none()
    }

    /// Apply overrides to a configuration
    ///
    /// Call [`AppConfig::validate`] afterwards, or load through
    /// [`load_config_with_overrides`].
    pub fn apply(&self, config: &mut AppConfig) {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }
        if let Some(ref url) = self.endpoint {
            config.endpoint.url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.endpoint.timeout = Duration::from_secs(secs);
        }
        if let Some(max) = self.max_file_size {
            config.upload.max_file_size = max;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
