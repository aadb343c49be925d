//! Unified error handling for AmpFlow services
//!
//! One shared error type for the site bootstrap, the descriptor store and the
//! management tooling. Services do not define their own error enums; they add
//! context by wrapping messages into the variants below.

use thiserror::Error;

/// Result type alias using AmpError
pub type AmpResult<T> = Result<T, AmpError>;

/// Main error type for all AmpFlow services
#[derive(Debug, Error)]
pub enum AmpError {
    // ======================================
    // Configuration Errors
    // ======================================
    #[error("{0}")]
    Configuration(String),

    #[error("unknown {class} type: {device_type}")]
    UnknownDeviceType { class: String, device_type: String },

    #[error("missing loadpoints")]
    MissingLoadpoints,

    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    // ======================================
    // Device Errors
    // ======================================
    /// Driver construction or runtime failure (non-configuration)
    #[error("{0}")]
    Device(String),

    #[error("device already connected: {0}")]
    AlreadyBound(String),

    #[error("duplicate device name: {0}")]
    DuplicateDevice(String),

    // ======================================
    // Persistence Errors
    // ======================================
    #[error("device config not found: {0}")]
    DeviceNotFound(i64),

    #[error(transparent)]
    Sqlite(#[from] sqlx::Error),

    // ======================================
    // File & I/O Errors
    // ======================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    // ======================================
    // Catch-all for other errors
    // ======================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AmpError {
    /// Create a configuration error from a message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a device error from a message
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Whether this error stems from the configuration itself rather than a
    /// device that failed to come up.
    ///
    /// Configuration errors are always fatal; construction errors may be
    /// tolerated per device class (vehicles degrade, tariff slots go absent).
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::UnknownDeviceType { .. }
                | Self::MissingLoadpoints
                | Self::InvalidCurrency(_)
                | Self::DuplicateDevice(_)
        )
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(_)
            | Self::UnknownDeviceType { .. }
            | Self::MissingLoadpoints
            | Self::InvalidCurrency(_)
            | Self::Serialization(_) => 400,

            Self::DeviceNotFound(_) => 404,

            Self::DuplicateDevice(_) | Self::AlreadyBound(_) => 409,

            Self::Device(_) | Self::Sqlite(_) | Self::Io(_) | Self::Other(_) => 500,
        }
    }
}

// Conversion traits for common error types
impl From<serde_json::Error> for AmpError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AmpError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "axum-support")]
impl axum::response::IntoResponse for AmpError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::response::Json;
        use serde_json::json;

        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }

        (
            status,
            Json(json!({
                "error": self.to_string(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_config_error_classification() {
        assert!(AmpError::config("cannot create meter 1: missing name").is_config_error());
        assert!(AmpError::UnknownDeviceType {
            class: "meter".into(),
            device_type: "nope".into()
        }
        .is_config_error());
        assert!(AmpError::MissingLoadpoints.is_config_error());
        assert!(!AmpError::device("connection refused").is_config_error());
        assert!(!AmpError::DeviceNotFound(3).is_config_error());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AmpError::config("bad").status_code(), 400);
        assert_eq!(AmpError::DeviceNotFound(1).status_code(), 404);
        assert_eq!(AmpError::DuplicateDevice("lp1".into()).status_code(), 409);
        assert_eq!(AmpError::device("boom").status_code(), 500);
    }

    #[test]
    fn test_display_contains_context() {
        let err = AmpError::UnknownDeviceType {
            class: "charger".into(),
            device_type: "acme".into(),
        };
        assert_eq!(err.to_string(), "unknown charger type: acme");
    }
}
