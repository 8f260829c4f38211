//! Error types for the healthwatch client

use std::time::Duration;

/// Errors that can occur in the healthwatch client
///
/// The first four variants are the request failures a gateway call can settle
/// with. All of them are terminal for that call.
#[derive(Debug, thiserror::Error)]
pub enum HealthwatchError {
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HealthwatchError {
    /// Status code carried by an `HttpStatus` failure
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HealthwatchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, HealthwatchError::Timeout(_))
    }

    /// Short text suitable for a toast
    pub fn summary(&self) -> String {
        match self {
            HealthwatchError::HttpStatus { status, .. } => format!("HTTP {}", status),
            HealthwatchError::Timeout(_) => "Request timed out".to_string(),
            HealthwatchError::Transport(_) => "Backend unreachable".to_string(),
            HealthwatchError::Parse(_) => "Unexpected response from backend".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for healthwatch operations
pub type Result<T> = std::result::Result<T, HealthwatchError>;
