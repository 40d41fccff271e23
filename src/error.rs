//! Error types for the extraction pipeline
//!
//! [`SiteFetchError`] covers a single failed API call and is always absorbed
//! at the site boundary. [`ConnectorError`] is what the pipeline surfaces to
//! its caller: conversion failures, split decoding, configuration problems.

use std::fmt;

use thiserror::Error;

/// Result alias for the typed pipeline operations
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Failure of one request against the reporting API.
///
/// Recoverable: it ends pagination for the site being fetched, never the split.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SiteFetchError {
    /// Connection, TLS or body transfer failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not finish within the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl SiteFetchError {
    /// Rate limiting, server errors, timeouts and transport hiccups are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => matches!(status, 429 | 500..=599),
            Self::Decode(_) => false,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let is_timeout = err.is_timeout();
        let is_decode = err.is_decode();
        // Strip the URL so endpoints do not end up in logs
        let message = err.without_url().to_string();
        match status {
            Some(status) => Self::Api { status, message },
            None if is_timeout => Self::Transport(format!("timeout: {message}")),
            None if is_decode => Self::Decode(message),
            None => Self::Transport(message),
        }
    }
}

/// One configuration problem together with the action that fixes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub message: String,
    pub correction: String,
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>, correction: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            correction: correction.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.message, self.correction)
    }
}

fn join_failures(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced by the partition / fetch / convert pipeline
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// The site registry could not be built from its source
    #[error("invalid site registry: {0}")]
    PartitionInput(String),

    /// The output schema asks for a logical type the converter does not implement
    #[error("Field type '{display_name}' of field '{field}' is not supported")]
    UnsupportedFieldType { field: String, display_name: String },

    /// A numeric conversion exceeded the range of its target type
    #[error("Field '{field}' has value that is too large: {value}")]
    FieldValueTooLarge { field: String, value: String },

    /// The value could not be parsed as the field's declared type
    #[error("Field '{field}' cannot convert '{value}' to {expected}")]
    InvalidFieldValue {
        field: String,
        value: String,
        expected: String,
    },

    /// A work split could not be encoded or decoded
    #[error("split serialization failed: {0}")]
    Serialization(String),

    /// The output schema description is malformed
    #[error("invalid output schema: {0}")]
    InvalidSchema(String),

    /// The fetch query violates an API bound
    #[error("invalid fetch query: {0}")]
    InvalidQuery(String),

    /// Configuration failed validation
    #[error("invalid configuration: {}", join_failures(.0))]
    InvalidConfig(Vec<ValidationFailure>),

    /// The site-listing call failed
    #[error("failed to list sites: {0}")]
    SiteListing(#[source] SiteFetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_err(status: u16) -> SiteFetchError {
        SiteFetchError::Api {
            status,
            message: "test".to_string(),
        }
    }

    #[test]
    fn test_rate_limit_and_server_errors_are_retryable() {
        assert!(api_err(429).is_retryable());
        assert!(api_err(500).is_retryable());
        assert!(api_err(503).is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        assert!(!api_err(400).is_retryable());
        assert!(!api_err(403).is_retryable());
        assert!(!api_err(404).is_retryable());
    }

    #[test]
    fn test_transport_and_timeout_are_retryable() {
        assert!(SiteFetchError::Transport("reset".into()).is_retryable());
        assert!(SiteFetchError::Timeout(std::time::Duration::from_secs(1)).is_retryable());
        assert!(!SiteFetchError::Decode("bad json".into()).is_retryable());
    }

    #[test]
    fn test_invalid_config_lists_every_failure() {
        let err = ConnectorError::InvalidConfig(vec![
            ValidationFailure::new("Missing client Id.", "Client Id must be set."),
            ValidationFailure::new("Missing client secret.", "Client secret must be set."),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("Missing client Id."));
        assert!(msg.contains("Missing client secret."));
    }

    #[test]
    fn test_unsupported_field_type_names_display_name() {
        let err = ConnectorError::UnsupportedFieldType {
            field: "ts".to_string(),
            display_name: "datetime".to_string(),
        };
        assert!(err.to_string().contains("'datetime'"));
    }
}
