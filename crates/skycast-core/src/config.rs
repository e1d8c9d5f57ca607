use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Default upstream endpoint (Visual Crossing timeline API).
pub const DEFAULT_UPSTREAM_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

/// Environment variables read on top of the config file.
pub const ENV_API_KEY: &str = "weather_api";
pub const ENV_API_KEY_UPPER: &str = "WEATHER_API";
pub const ENV_BG_COLOR: &str = "BG_COLOR";
pub const ENV_BIND: &str = "SKYCAST_BIND";
pub const ENV_ARCHIVE_DIR: &str = "SKYCAST_ARCHIVE_DIR";
pub const ENV_CONFIG_PATH: &str = "SKYCAST_CONFIG";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line summary of all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the web server listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Background colour of the home page
    #[serde(default = "default_background_color")]
    pub background_color: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:9090".to_string()
}

fn default_background_color() -> String {
    "white".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            background_color: default_background_color(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the timeline API; the location is appended as a path segment
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. Usually supplied through the `weather_api` environment variable.
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt (0 = single attempt)
    #[serde(default)]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

impl UpstreamConfig {
    /// True once an API key has been supplied
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory holding archived raw responses
    #[serde(default = "default_archive_dir")]
    pub directory: PathBuf,
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("queries")
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            directory: default_archive_dir(),
        }
    }
}

impl Config {
    /// Load configuration from the config file (if any) and the process environment.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Read a TOML config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Apply environment overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_API_KEY).or_else(|| non_empty(ENV_API_KEY_UPPER)) {
            self.upstream.api_key = key;
        }
        if let Some(color) = non_empty(ENV_BG_COLOR) {
            self.server.background_color = color;
        }
        if let Some(bind) = non_empty(ENV_BIND) {
            self.server.bind_address = bind;
        }
        if let Some(dir) = non_empty(ENV_ARCHIVE_DIR) {
            self.archive.directory = PathBuf::from(dir);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.upstream.base_url, "upstream.base_url", &mut result);

        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            result.add_error(
                "server.bind_address",
                format!("Not a socket address: {}", self.server.bind_address),
            );
        }

        if self.upstream.timeout_secs == 0 {
            result.add_error("upstream.timeout_secs", "Timeout must be greater than 0");
        }

        if self.upstream.max_retries > 5 {
            result.add_warning(
                "upstream.max_retries",
                "More than 5 retries will hold requests open for a long time",
            );
        }

        if !self.upstream.has_api_key() {
            result.add_warning(
                "upstream.api_key",
                format!("No API key configured (set {ENV_API_KEY}); forecasts will fail"),
            );
        }

        if self.server.background_color.trim().is_empty() {
            result.add_warning("server.background_color", "Empty background colour");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn with_key() -> Config {
        let mut config = Config::default();
        config.upstream.api_key = "secret".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.background_color, "white");
        assert_eq!(config.server.bind_address, "127.0.0.1:9090");
        assert_eq!(config.archive.directory, PathBuf::from("queries"));
        assert_eq!(config.upstream.base_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.upstream.max_retries, 0);
    }

    #[test]
    fn test_valid_config_with_key() {
        let result = with_key().validate();
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_missing_api_key_is_warning() {
        let result = Config::default().validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "upstream.api_key"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = with_key();
        config.upstream.base_url = "ftp://example.com/timeline".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_invalid_bind_address() {
        let mut config = with_key();
        config.server.bind_address = "localhost".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "server.bind_address"));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = with_key();
        config.upstream.timeout_secs = 0;
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("weather_api", "abc123"),
            ("BG_COLOR", "lightblue"),
            ("SKYCAST_ARCHIVE_DIR", "/tmp/forecasts"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.upstream.api_key, "abc123");
        assert_eq!(config.server.background_color, "lightblue");
        assert_eq!(config.archive.directory, PathBuf::from("/tmp/forecasts"));
        assert_eq!(config.server.bind_address, "127.0.0.1:9090");
    }

    #[test]
    fn test_uppercase_key_and_blank_values() {
        let env: HashMap<&str, &str> = [("WEATHER_API", "upper"), ("BG_COLOR", "  ")]
            .into_iter()
            .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.upstream.api_key, "upper");
        assert_eq!(config.server.background_color, "white");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
background_color = "black"

[upstream]
timeout_secs = 3
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.background_color, "black");
        assert_eq!(config.server.bind_address, "127.0.0.1:9090");
        assert_eq!(config.upstream.timeout_secs, 3);
        assert_eq!(config.archive.directory, PathBuf::from("queries"));
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.background_color, "white");
    }

    #[test]
    fn test_load_from_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nbind_address = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_from_unreadable_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists but cannot be read as a file
        let err = Config::load_from(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert_eq!(
            err.user_message(),
            "Configuration file could not be read. Check its permissions."
        );
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
