//! Error types for the climate aggregator
//!
//! This module provides structured error handling with machine-readable
//! error codes and a JSON shape shared by every HTTP error response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for climate operations
pub type Result<T> = std::result::Result<T, ClimateError>;

/// Error types for climate aggregation, control and sensor simulation
#[derive(Error, Debug)]
pub enum ClimateError {
    /// Rejected client input (bad control command, malformed report)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown room or sensor handle
    #[error("Not found: {0}")]
    NotFound(String),

    /// A sensor report could not be delivered; the next tick retries
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection errors towards a remote aggregator
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Structured error code for machine-readable error handling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Connection errors (1000-1099)
    ConnectionLost,
    ExternalServiceError,

    // Configuration errors (1200-1299)
    ConfigurationInvalid,

    // Room errors (1300-1399)
    RoomNotFound,

    // Data errors (1400-1499)
    ParsingFailed,
    InvalidInput,
    IngestionFailed,

    // Internal errors (1900-1999)
    InternalError,
}

impl ErrorCode {
    /// Get numeric error code
    pub fn as_number(&self) -> u32 {
        match self {
            ErrorCode::ConnectionLost => 1003,
            ErrorCode::ExternalServiceError => 1004,
            ErrorCode::ConfigurationInvalid => 1202,
            ErrorCode::RoomNotFound => 1301,
            ErrorCode::ParsingFailed => 1401,
            ErrorCode::InvalidInput => 1402,
            ErrorCode::IngestionFailed => 1405,
            ErrorCode::InternalError => 1901,
        }
    }

    /// Get error category
    pub fn category(&self) -> &'static str {
        match self.as_number() {
            1000..=1099 => "connection",
            1200..=1299 => "configuration",
            1300..=1399 => "room",
            1400..=1499 => "data",
            1900..=1999 => "internal",
            _ => "unknown",
        }
    }
}

impl ClimateError {
    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an ingestion error
    pub fn ingestion<S: Into<String>>(msg: S) -> Self {
        Self::Ingestion(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Generic(anyhow::anyhow!(msg.into()))
    }

    /// Map the error to its structured code
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            ClimateError::InvalidInput(_) => ErrorCode::InvalidInput,
            ClimateError::NotFound(_) => ErrorCode::RoomNotFound,
            ClimateError::Ingestion(_) => ErrorCode::IngestionFailed,
            ClimateError::Config(_) => ErrorCode::ConfigurationInvalid,
            ClimateError::Connection(_) => ErrorCode::ConnectionLost,
            ClimateError::Http(_) => ErrorCode::ExternalServiceError,
            ClimateError::Json(_) => ErrorCode::ParsingFailed,
            ClimateError::Io(_) | ClimateError::Generic(_) => ErrorCode::InternalError,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClimateError::Ingestion(_) | ClimateError::Connection(_) | ClimateError::Http(_)
        )
    }

    /// HTTP status used when the error reaches a client
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClimateError::InvalidInput(_) | ClimateError::Json(_) => StatusCode::BAD_REQUEST,
            ClimateError::NotFound(_) => StatusCode::NOT_FOUND,
            ClimateError::Ingestion(_) | ClimateError::Connection(_) | ClimateError::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error formatting utilities
pub struct ErrorReporter;

impl ErrorReporter {
    /// Log an error with a severity matching its kind
    pub fn log_error(error: &ClimateError, component: &str, operation: &str) {
        let code = error.to_error_code();
        if error.is_retryable() || matches!(error, ClimateError::InvalidInput(_)) {
            tracing::warn!(
                error_code = code.as_number(),
                category = code.category(),
                component,
                operation,
                "Warning: {}",
                error
            );
        } else {
            tracing::error!(
                error_code = code.as_number(),
                category = code.category(),
                component,
                operation,
                "Error occurred: {}",
                error
            );
        }
    }

    /// Format error for API responses
    pub fn format_api_error(error: &ClimateError) -> serde_json::Value {
        let code = error.to_error_code();
        serde_json::json!({
            "error": {
                "code": code.as_number(),
                "category": code.category(),
                "message": error.to_string(),
                "retryable": error.is_retryable(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        })
    }
}

impl IntoResponse for ClimateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            ErrorReporter::log_error(&self, "http", "respond");
        }
        (status, Json(ErrorReporter::format_api_error(&self))).into_response()
    }
}
