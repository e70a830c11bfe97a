//! Error types for gantry

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using GantryError
pub type Result<T> = std::result::Result<T, GantryError>;

/// Main error type for gantry operations
#[derive(Debug, Error)]
pub enum GantryError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Predictor evidence errors
    #[error(transparent)]
    Evidence(#[from] EvidenceError),

    /// Push log resolution errors
    #[error(transparent)]
    PushLog(#[from] PushLogError),

    /// Strategy registry and policy errors
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Shorthand for an [`ConfigError::InvalidValue`]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while fetching evidence from the predictor
#[derive(Debug, Error)]
pub enum EvidenceError {
    /// The predictor never reported the push as ready
    #[error("Timed out after {}s waiting for predictor results for {branch}@{rev}", elapsed.as_secs())]
    Timeout {
        branch: String,
        rev: String,
        elapsed: Duration,
    },

    /// A definitive (non-pending) failure from the predictor service
    #[error("Predictor request to {url} failed: {message}")]
    Http {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The predictor reply was not valid JSON
    #[error("Failed to decode predictor reply from {url}: {message}")]
    Decode { url: String, message: String },
}

impl EvidenceError {
    /// Whether this error is the bounded-wait timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors raised while resolving historical pushes
#[derive(Debug, Error)]
pub enum PushLogError {
    /// Request to the push log failed
    #[error("Push log request to {url} failed: {message}")]
    Http { url: String, message: String },

    /// The push log reply could not be decoded
    #[error("Failed to decode push log reply from {url}: {message}")]
    Decode { url: String, message: String },

    /// A push inside the requested range was not returned
    #[error("Push log is missing push {push_id} (requested {start}..={end})")]
    MissingPush { push_id: i64, start: i64, end: i64 },

    /// A push was returned without any changesets
    #[error("Push {0} has no changesets")]
    EmptyPush(i64),
}

/// Strategy registry and policy errors
#[derive(Debug, Error)]
pub enum StrategyError {
    /// A strategy with this name is already registered
    #[error("Strategy '{0}' is already registered")]
    Duplicate(String),

    /// No strategy registered under this name
    #[error("Unknown optimization strategy: {0}")]
    Unknown(String),

    /// No policy for this project and purpose
    #[error("No optimization policy for project '{project}' and purpose '{purpose}'")]
    NoPolicy { project: String, purpose: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_push() {
        let err = EvidenceError::Timeout {
            branch: "integration/autoland".to_string(),
            rev: "abcdef".to_string(),
            elapsed: Duration::from_secs(480),
        };
        let msg = err.to_string();
        assert!(msg.contains("integration/autoland@abcdef"));
        assert!(msg.contains("480s"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_nested_errors_are_transparent() {
        let err: GantryError = StrategyError::Unknown("nope".to_string()).into();
        assert_eq!(err.to_string(), "Unknown optimization strategy: nope");

        let err: GantryError =
            ConfigError::invalid("backstop.push_interval", "must be positive").into();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: backstop.push_interval - must be positive"
        );
    }
}
