//! Configuration loader
//!
//! Loads [`ClientConfiguration`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! All are required:
//! - `SUBSCRIPTIONS_DISCOVERY_ENDPOINT`: OIDC discovery document URL
//! - `SUBSCRIPTIONS_API_ENDPOINT`: Business API base URL
//! - `SUBSCRIPTIONS_MERCHANT_CLIENT_ID`: Merchant OIDC client id
//! - `SUBSCRIPTIONS_MERCHANT_CLIENT_SECRET`: Merchant OIDC client secret
//! - `SUBSCRIPTIONS_MERCHANT_REFRESH_TOKEN`: Merchant refresh token
//! - `SUBSCRIPTIONS_PROVIDER_ID`: Provider id used in API paths
//! - `SUBSCRIPTIONS_APP_CLIENT_ID`: Application (gateway) client id
//! - `SUBSCRIPTIONS_APP_CLIENT_SECRET`: Application (gateway) client secret
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./subscriptions.json` or `./subscriptions.toml` (current working
//!    directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../subscriptions.json` or `../subscriptions.toml` (parent directory)
//! 4. Relative to executable location
//!
//! ## File Layout
//! ```toml
//! discovery_endpoint = "https://auth.provider.example/.well-known/openid-configuration"
//! api_endpoint = "https://api.provider.example"
//!
//! [merchant]
//! client_id = "..."
//! client_secret = "..."
//! refresh_token = "..."
//! provider_id = "..."
//!
//! [application]
//! client_id = "..."
//! client_secret = "..."
//! ```

use std::path::{Path, PathBuf};

use subscriptions_common::MerchantCredentials;
use thiserror::Error;
use url::Url;

use super::types::{ApplicationCredentials, ClientConfiguration};

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid URL in {key}: {source}")]
    InvalidUrl {
        key: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Config file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("No config file found in any of the standard locations")]
    NoConfigFile,

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML format: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON format: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns the file loading error if the environment is incomplete and no
/// usable file is found.
pub fn load() -> Result<ClientConfiguration, ConfigError> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// - [`ConfigError::MissingVar`] if any variable is unset
/// - [`ConfigError::InvalidUrl`] if an endpoint is not an absolute URL
pub fn load_from_env() -> Result<ClientConfiguration, ConfigError> {
    let discovery_endpoint = env_url("SUBSCRIPTIONS_DISCOVERY_ENDPOINT")?;
    let api_endpoint = env_url("SUBSCRIPTIONS_API_ENDPOINT")?;

    let merchant = MerchantCredentials::new(
        env_var("SUBSCRIPTIONS_MERCHANT_CLIENT_ID")?,
        env_var("SUBSCRIPTIONS_MERCHANT_CLIENT_SECRET")?,
        env_var("SUBSCRIPTIONS_MERCHANT_REFRESH_TOKEN")?,
        env_var("SUBSCRIPTIONS_PROVIDER_ID")?,
    );

    let application = ApplicationCredentials::new(
        env_var("SUBSCRIPTIONS_APP_CLIENT_ID")?,
        env_var("SUBSCRIPTIONS_APP_CLIENT_SECRET")?,
    );

    Ok(ClientConfiguration { discovery_endpoint, api_endpoint, merchant, application })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Format is detected by file extension.
///
/// # Errors
/// - [`ConfigError::FileNotFound`] if an explicit path does not exist
/// - [`ConfigError::NoConfigFile`] if probing finds nothing
/// - [`ConfigError::Read`] if the file cannot be read
/// - a format error if parsing fails or required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfiguration, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::FileNotFound(p));
            }
            p
        }
        None => probe_config_paths().ok_or(ConfigError::NoConfigFile)?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|source| ConfigError::Read { path: config_path.clone(), source })?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfiguration, ConfigError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => Ok(toml::from_str(contents)?),
        "json" => Ok(serde_json::from_str(contents)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
#[must_use]
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 6] = [
        "subscriptions.json",
        "subscriptions.toml",
        "config.json",
        "config.toml",
        "../subscriptions.json",
        "../subscriptions.toml",
    ];

    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(NAMES.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))
}

fn env_url(key: &str) -> Result<Url, ConfigError> {
    let raw = env_var(key)?;
    Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { key: key.to_string(), source })
}
