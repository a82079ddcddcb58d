//! Error types for subdomain probing operations.
//!
//! This module provides structured error handling for the fatal failure
//! modes of a probing run: invalid input, configuration problems, and
//! probe infrastructure that could not be brought up. Per-host probe
//! failures are not errors; they are encoded in probe outcomes and
//! classified into statuses instead.

use std::time::Duration;

/// Comprehensive error type for all probing operations.
///
/// Covers everything that can abort a run or a pipeline, from malformed
/// input lines to network client construction failures.
#[derive(Debug, Clone)]
pub enum ProbeError {
    /// Input line could not be normalized into a probeable hostname
    InvalidDomain { domain: String, reason: String },

    /// Network-level failures (client construction, connection setup)
    Network {
        message: String,
        source: Option<String>,
    },

    /// Operation exceeded its allotted time
    Timeout { operation: String, duration: Duration },

    /// A probe could not be executed at all (e.g. missing system binary)
    Probe { host: String, message: String },

    /// Configuration errors (invalid values, malformed config files)
    Config { message: String },

    /// File system errors when reading input files
    File { path: String, message: String },

    /// Internal errors that shouldn't normally surface
    Internal { message: String },
}

impl ProbeError {
    /// Create an invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        ProbeError::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a network error without a source.
    pub fn network<M: Into<String>>(message: M) -> Self {
        ProbeError::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with an underlying cause.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        ProbeError::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        ProbeError::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a probe execution error.
    pub fn probe<H: Into<String>, M: Into<String>>(host: H, message: M) -> Self {
        ProbeError::Probe {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        ProbeError::Config {
            message: message.into(),
        }
    }

    /// Create a file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        ProbeError::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        ProbeError::Internal {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            ProbeError::Network { message, source } => match source {
                Some(src) => write!(f, "Network error: {} (caused by: {})", message, src),
                None => write!(f, "Network error: {}", message),
            },
            ProbeError::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout during {}: exceeded {:?}", operation, duration)
            }
            ProbeError::Probe { host, message } => {
                write!(f, "Probe failed for '{}': {}", host, message)
            }
            ProbeError::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            ProbeError::File { path, message } => {
                write!(f, "File error '{}': {}", path, message)
            }
            ProbeError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for ProbeError {}

// Convenient conversions from common error types

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::timeout(
                "HTTP request",
                Duration::from_secs(crate::types::DEFAULT_TIMEOUT_SECS),
            )
        } else if err.is_connect() {
            ProbeError::network_with_source("Connection failed", err.to_string())
        } else {
            ProbeError::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        ProbeError::internal(format!("I/O error: {}", err))
    }
}
