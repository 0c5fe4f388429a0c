//! Centralized error types for the Skycast application.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling at the application boundary
//! - Provides user-friendly messages suitable for display
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Fixed text shown for any failed weather aggregation.
pub const WEATHER_FAILURE_MESSAGE: &str = "failed to fetch weather data";

/// Top-level application error type.
///
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Location resolution failed; the message is shown verbatim.
    #[error("{0}")]
    Location(String),

    /// Weather aggregation failed; the cause is kept for logs only.
    #[error("Weather service error: {0}")]
    Weather(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Location(message) => message.clone(),
            AppError::Weather(_) => WEATHER_FAILURE_MESSAGE.to_string(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.".to_string(),
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
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::Other(anyhow::anyhow!("boom")),
            AppError::Config(ConfigError::Invalid("test".into())),
            AppError::Location("Geolocation is not supported".into()),
            AppError::Weather("HTTP 500".into()),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "{:?} has empty message", err);
        }
    }

    #[test]
    fn test_weather_error_hides_cause() {
        let app_err = AppError::Weather("HTTP error: 503".into());
        assert_eq!(app_err.user_message(), WEATHER_FAILURE_MESSAGE);
        assert!(app_err.to_string().contains("503"));
    }

    #[test]
    fn test_location_error_is_verbatim() {
        let app_err = AppError::Location("IP geolocation lookup failed".into());
        assert_eq!(app_err.user_message(), "IP geolocation lookup failed");
    }

    #[test]
    fn test_app_error_conversion() {
        let config_err = ConfigError::Invalid("weather.base_url: Invalid URL".into());
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::Config(ConfigError::Invalid(_))));
        assert_eq!(
            app_err.user_message(),
            "Invalid configuration. Check your settings."
        );
    }

    #[test]
    fn test_network_error_display() {
        let server = NetworkError::ServerError {
            status: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(server.to_string(), "Server error: 502 - bad gateway");
        assert_eq!(NetworkError::Timeout.to_string(), "Request timed out");
    }
}
