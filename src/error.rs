// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for autometer.
//!
//! This module provides strongly-typed errors for the code generator, the push
//! dispatcher and configuration loading, using `thiserror` for ergonomic error
//! definitions and `anyhow` for error propagation in the binary.

use thiserror::Error;

/// Errors that can occur while instrumenting a Go function.
///
/// Every variant is fatal to the generation of the current function only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("Unsupported type for parameter `{param}`: {detail}")]
    UnsupportedParameterShape { param: String, detail: String },

    #[error("Expecting a single named `error` return value, got {0} instead")]
    AmbiguousErrorReturn(usize),

    #[error("Function body has no statements: {0}")]
    MalformedFunctionBody(String),

    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Function has no body: {0}")]
    MissingBody(String),

    #[error("No autometrics runtime import found in the file")]
    MissingRuntimeImport,

    #[error("Parse error: {0}")]
    Parse(String),
}

impl GenerateError {
    /// Create an unsupported parameter shape error.
    pub fn unsupported(param: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnsupportedParameterShape {
            param: param.into(),
            detail: detail.into(),
        }
    }
}

/// Errors that can occur while delivering metrics to a push gateway.
///
/// These are logged by the dispatcher and never reach instrumented code.
#[derive(Error, Debug)]
pub enum PushError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Push cancelled")]
    Cancelled,

    #[error("Failed to encode metrics: {0}")]
    Encode(#[from] std::fmt::Error),
}

/// Errors that can occur when parsing trace or span identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

impl From<hex::FromHexError> for IdError {
    fn from(err: hex::FromHexError) -> Self {
        Self::InvalidHex(err.to_string())
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl ConfigError {
    /// Create an invalid value error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let err = GenerateError::unsupported("r", "pointer to slice_type");
        let display = err.to_string();
        assert!(display.contains("`r`"));
        assert!(display.contains("slice_type"));
    }

    #[test]
    fn test_ambiguous_display() {
        let err = GenerateError::AmbiguousErrorReturn(2);
        assert!(err.to_string().contains("got 2"));
    }

    #[test]
    fn test_config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_config_error_from_json() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{oops");
        let config_err: ConfigError = result.unwrap_err().into();
        assert!(matches!(config_err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_id_error_from_hex() {
        let err: IdError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, IdError::InvalidHex(_)));
    }
}
