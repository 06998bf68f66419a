// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration error types.
//!
//! ```text
//! ConfigError
//! ├── Parse              - syntax or type errors in a config file
//! ├── Validation         - semantically invalid values
//! ├── Io / FileNotFound  - reading the file failed
//! ├── InvalidNodeId      - a variable's node id does not parse
//! ├── DuplicateVariable  - two variables share a node id
//! ├── InvalidEnvVar      - an HDA_* override could not be parsed
//! ├── OutOfRange         - numeric value outside its allowed range
//! ├── UnsupportedFormat  - unknown file extension
//! └── Serialization      - serde failure without file context
//! ```

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse the configuration file.
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// Path to the file.
        path: PathBuf,
        /// Parser message.
        message: String,
        /// Line number, when the parser reports one.
        line: Option<usize>,
    },

    /// A value failed validation.
    #[error("Validation error for '{field}': {message}")]
    Validation {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// I/O error while reading the file.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file does not exist.
    #[error("Config file not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A variable node id could not be parsed.
    #[error("Invalid node id '{node_id}': {message}")]
    InvalidNodeId {
        /// The raw node id text.
        node_id: String,
        /// Parser message.
        message: String,
    },

    /// Two variables declare the same node id.
    #[error("Duplicate variable node id: {node_id}")]
    DuplicateVariable {
        /// The repeated node id.
        node_id: String,
    },

    /// Environment variable has an unusable value.
    #[error("Invalid environment variable '{name}': {message}")]
    InvalidEnvVar {
        /// Variable name.
        name: String,
        /// What was expected.
        message: String,
    },

    /// Numeric value out of its allowed range.
    #[error("Value out of range for '{field}': {value} (allowed: {min}..{max})")]
    OutOfRange {
        /// Field name.
        field: String,
        /// Offending value.
        value: String,
        /// Lower bound.
        min: String,
        /// Upper bound.
        max: String,
    },

    /// The file extension is not a supported format.
    #[error("Unsupported config format: {format}")]
    UnsupportedFormat {
        /// The extension that was seen.
        format: String,
    },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: None,
        }
    }

    /// Creates a parse error with a line number.
    pub fn parse_at_line(path: impl Into<PathBuf>, message: impl Into<String>, line: usize) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: Some(line),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a file-not-found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an invalid node id error.
    pub fn invalid_node_id(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Creates a duplicate variable error.
    pub fn duplicate_variable(node_id: impl Into<String>) -> Self {
        Self::DuplicateVariable {
            node_id: node_id.into(),
        }
    }

    /// Creates an invalid environment variable error.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an out-of-range error.
    pub fn out_of_range(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
    ) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns a short message suitable for printing to an operator.
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::Parse { path, message, line } => match line {
                Some(line) => format!(
                    "Could not parse {} (line {}): {}",
                    path.display(),
                    line,
                    message
                ),
                None => format!("Could not parse {}: {}", path.display(), message),
            },
            ConfigError::Validation { field, message } => {
                format!("Invalid setting {}: {}", field, message)
            }
            ConfigError::Io { path, .. } => format!("Could not read {}", path.display()),
            ConfigError::FileNotFound { path } => format!("No such file: {}", path.display()),
            ConfigError::InvalidNodeId { node_id, message } => {
                format!("Bad node id {}: {}", node_id, message)
            }
            ConfigError::DuplicateVariable { node_id } => {
                format!("Variable {} is declared more than once", node_id)
            }
            ConfigError::InvalidEnvVar { name, message } => {
                format!("Bad value in {}: {}", name, message)
            }
            ConfigError::OutOfRange { field, value, min, max } => {
                format!("{} = {} is outside {}..{}", field, value, min, max)
            }
            ConfigError::UnsupportedFormat { format } => {
                format!("Unsupported config format: {}", format)
            }
            ConfigError::Serialization { message } => format!("Malformed config: {}", message),
        }
    }

    /// Returns `true` if this error is related to file I/O.
    pub fn is_io_error(&self) -> bool {
        matches!(self, ConfigError::Io { .. } | ConfigError::FileNotFound { .. })
    }

    /// Returns the error type as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            ConfigError::Parse { .. } => "parse",
            ConfigError::Validation { .. } => "validation",
            ConfigError::Io { .. } => "io",
            ConfigError::FileNotFound { .. } => "file_not_found",
            ConfigError::InvalidNodeId { .. } => "invalid_node_id",
            ConfigError::DuplicateVariable { .. } => "duplicate_variable",
            ConfigError::InvalidEnvVar { .. } => "invalid_env_var",
            ConfigError::OutOfRange { .. } => "out_of_range",
            ConfigError::UnsupportedFormat { .. } => "unsupported_format",
            ConfigError::Serialization { .. } => "serialization",
        }
    }
}

/// A Result type with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
