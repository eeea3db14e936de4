// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Error types
//!
//! Profiled calls never produce errors of their own: the wrapper is
//! transparent to whatever the wrapped function returns or panics with.
//! The errors here cover report configuration and report export only.

use thiserror::Error;

/// Result type alias for configuration parsing
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for report export
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors raised while building a [`ReportConfig`](crate::ReportConfig)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Sort key is not one of the supported keys
    #[error("Unknown sort key '{0}' (expected one of: name, total, mean, calls, max)")]
    UnknownSortKey(String),

    /// Time unit is not one of the supported units
    #[error("Unknown time unit '{0}' (expected one of: s, ms, us, ns)")]
    UnknownTimeUnit(String),

    /// A numeric setting could not be parsed
    #[error("Invalid value '{value}' for setting '{key}'")]
    InvalidValue { key: String, value: String },

    /// A setting has the wrong JSON type
    #[error("Setting '{key}' must be a {expected}")]
    InvalidType { key: String, expected: &'static str },
}

/// Errors raised while exporting a [`StatsReport`](crate::StatsReport)
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report
    #[error("Failed to serialize profiling report: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::UnknownSortKey("speed".to_string());
        let msg = format!("{}", error);
        assert!(msg.contains("speed"));
        assert!(msg.contains("Unknown sort key"));

        let error = ConfigError::InvalidValue {
            key: "PROFILED_MIN_CALLS".to_string(),
            value: "many".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid value 'many' for setting 'PROFILED_MIN_CALLS'"
        );
    }
}
