//! Centralized error types for Paddlecast.
//!
//! This module provides a typed error hierarchy that:
//! - Separates caller mistakes from degraded upstream service
//! - Provides user-friendly messages suitable for display
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Forecast(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to reach the forecast service. Showing estimated conditions."
            }
            NetworkError::Timeout => {
                "The forecast service timed out. Showing estimated conditions."
            }
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The forecast service is having issues. Showing estimated conditions."
            }
            NetworkError::ServerError { .. } => {
                "The forecast request failed. Showing estimated conditions."
            }
            NetworkError::InvalidResponse(_) => {
                "The forecast service sent unusable data. Showing estimated conditions."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }

    /// Classify a failure from `Config::load_validated`.
    ///
    /// TOML syntax or type errors anywhere in the chain become `ParseError`;
    /// everything else (I/O, failed validation) is `Invalid`.
    pub fn from_load_error(err: &anyhow::Error) -> Self {
        let detail = format!("{:#}", err);
        if err.chain().any(|cause| cause.is::<toml::de::Error>()) {
            ConfigError::ParseError(detail)
        } else {
            ConfigError::Invalid(detail)
        }
    }
}

/// Forecast errors visible to callers.
///
/// Upstream failures never surface here; they are absorbed by the fallback
/// path and only show up as `source = fallback` on the result.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

impl ForecastError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ForecastError::InvalidCoordinate(_) => {
                "That location is not a valid latitude/longitude."
            }
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
