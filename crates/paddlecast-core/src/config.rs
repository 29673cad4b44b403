use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

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

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Forecast retrieval settings
    #[serde(default)]
    pub forecast: ForecastConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Base URL of the upstream forecast API (`{base}/forecast`, `{base}/current`)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Upper bound on a single upstream call before falling back
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long a retrieved forecast stays fresh
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u32,

    /// Retries for transient upstream failures (timeouts, 5xx)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay; doubles per retry
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    /// Fixed seed for synthesized forecasts (snapshot testing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_seed: Option<u64>,
}

/// Environment variable that overrides `forecast.api_base_url`
pub const API_URL_ENV: &str = "PADDLECAST_API_URL";

fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl_minutes() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_initial_delay_ms() -> u64 {
    200
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_ttl_minutes: default_cache_ttl_minutes(),
            max_retries: default_max_retries(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            fallback_seed: None,
        }
    }
}

impl ForecastConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.cache_ttl_minutes) * 60)
    }

    fn apply_env_overrides(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            tracing::info!("Using forecast API from {}", API_URL_ENV);
            self.api_base_url = url;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("paddlecast");

        Self {
            config_dir,
            forecast: ForecastConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str::<Config>(&contents).context("Failed to parse config file")?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        config
            .forecast
            .apply_env_overrides(std::env::var(API_URL_ENV).ok());
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

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.forecast.api_base_url,
            "forecast.api_base_url",
            &mut result,
        );

        if self.forecast.request_timeout_secs == 0 {
            result.add_error(
                "forecast.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        } else if self.forecast.request_timeout_secs > 60 {
            result.add_warning(
                "forecast.request_timeout_secs",
                "Request timeout is over a minute; fallback will be slow to kick in",
            );
        }

        if self.forecast.cache_ttl_minutes == 0 {
            result.add_warning(
                "forecast.cache_ttl_minutes",
                "Forecast caching disabled (0 minutes)",
            );
        } else if self.forecast.cache_ttl_minutes > 1440 {
            result.add_warning(
                "forecast.cache_ttl_minutes",
                "Forecast cache lifetime is more than 24 hours",
            );
        }

        if self.forecast.max_retries > 5 {
            result.add_warning(
                "forecast.max_retries",
                "More than 5 retries may exceed the request timeout",
            );
        }

        result
    }

    /// Validate a URL field
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

                if let Some(port) = url.port() {
                    if port == 0 {
                        result.add_error(field_name, "Port cannot be 0");
                    }
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("paddlecast");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_url(url: &str) -> Config {
        let mut config = Config::default();
        config.forecast.api_base_url = url.to_string();
        config
    }

    #[test]
    fn test_valid_default_config() {
        let config = config_with_url("http://localhost:8080/api");
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_url() {
        let result = config_with_url("not-a-url").validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "forecast.api_base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let result = config_with_url("ftp://localhost:8080").validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let mut config = config_with_url("https://forecast.example.com");
        config.forecast.request_timeout_secs = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "forecast.request_timeout_secs"));
    }

    #[test]
    fn test_zero_ttl_is_warning() {
        let mut config = config_with_url("https://forecast.example.com");
        config.forecast.cache_ttl_minutes = 0;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "forecast.cache_ttl_minutes"));
    }

    #[test]
    fn test_durations() {
        let config = ForecastConfig {
            api_base_url: "https://forecast.example.com".to_string(),
            request_timeout_secs: 10,
            cache_ttl_minutes: 10,
            max_retries: 2,
            retry_initial_delay_ms: 200,
            fallback_seed: None,
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.cache_ttl(), Duration::from_secs(600));
    }

    #[test]
    fn test_missing_forecast_section_uses_defaults() {
        let config: Config = toml::from_str(r#"config_dir = "/tmp/paddlecast""#).unwrap();
        assert_eq!(config.forecast.request_timeout_secs, 10);
        assert_eq!(config.forecast.cache_ttl_minutes, 10);
        assert!(config.forecast.fallback_seed.is_none());
    }

    #[test]
    fn test_env_override_replaces_file_url() {
        let mut config = ForecastConfig::default();
        config.apply_env_overrides(Some("https://forecast.example.com/v2".to_string()));
        assert_eq!(config.api_base_url, "https://forecast.example.com/v2");

        config.apply_env_overrides(Some("  ".to_string()));
        config.apply_env_overrides(None);
        assert_eq!(config.api_base_url, "https://forecast.example.com/v2");
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
