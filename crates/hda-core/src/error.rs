// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for HDA.
//!
//! Protocol outcomes (an unsupported read, a stale continuation point) are
//! reported as [`StatusCode`]s inside results. The types here cover library
//! faults: misuse of the archive, lookups that miss, and text that fails to
//! parse.
//!
//! # Error Hierarchy
//!
//! ```text
//! HdaError (root)
//! ├── ArchiveError       - Ring buffer and binding operations
//! ├── ContinuationError  - Continuation point lookups
//! └── ParseError         - Node id and attribute parsing
//! ```
//!
//! # Examples
//!
//! ```
//! use hda_core::error::{ArchiveError, HdaError};
//! use hda_core::types::StatusCode;
//!
//! let error = ArchiveError::not_installed("ns=2;s=Pump.Speed");
//! assert_eq!(error.status_code(), StatusCode::BAD_NODE_ID_UNKNOWN);
//!
//! let hda_error: HdaError = error.into();
//! assert_eq!(hda_error.error_type(), "archive");
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::StatusCode;

// =============================================================================
// HdaError - Root Error Type
// =============================================================================

/// The root error type for HDA.
#[derive(Debug, Error)]
pub enum HdaError {
    /// Archive error.
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Continuation point error.
    #[error("Continuation point error: {0}")]
    Continuation(#[from] ContinuationError),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl HdaError {
    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            HdaError::Archive(e) => e.is_retryable(),
            HdaError::Continuation(e) => e.is_retryable(),
            HdaError::Parse(_) => false,
        }
    }

    /// Returns the error type as a string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            HdaError::Archive(_) => "archive",
            HdaError::Continuation(_) => "continuation",
            HdaError::Parse(_) => "parse",
        }
    }

    /// Returns the OPC UA status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HdaError::Archive(e) => e.status_code(),
            HdaError::Continuation(e) => e.status_code(),
            HdaError::Parse(e) => e.status_code(),
        }
    }
}

// =============================================================================
// ArchiveError
// =============================================================================

/// Errors raised by the online archive and the historizing binding.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A sample is older than the newest stored sample.
    #[error("Sample at {timestamp} is older than newest archived sample at {newest}")]
    OutOfOrder {
        /// Source timestamp of the rejected sample.
        timestamp: DateTime<Utc>,
        /// Source timestamp of the newest stored sample.
        newest: DateTime<Utc>,
    },

    /// The variable already carries a historizing binding.
    #[error("Variable '{node_id}' is already historized")]
    AlreadyInstalled {
        /// The variable's node id.
        node_id: String,
    },

    /// No historizing binding exists for the variable.
    #[error("Variable '{node_id}' is not historized")]
    NotInstalled {
        /// The variable's node id.
        node_id: String,
    },
}

impl ArchiveError {
    /// Creates an out of order error.
    pub fn out_of_order(timestamp: DateTime<Utc>, newest: DateTime<Utc>) -> Self {
        Self::OutOfOrder { timestamp, newest }
    }

    /// Creates an already installed error.
    pub fn already_installed(node_id: impl Into<String>) -> Self {
        Self::AlreadyInstalled {
            node_id: node_id.into(),
        }
    }

    /// Creates a not installed error.
    pub fn not_installed(node_id: impl Into<String>) -> Self {
        Self::NotInstalled {
            node_id: node_id.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns the OPC UA status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ArchiveError::OutOfOrder { .. } => StatusCode::BAD,
            ArchiveError::AlreadyInstalled { .. } => StatusCode::BAD,
            ArchiveError::NotInstalled { .. } => StatusCode::BAD_NODE_ID_UNKNOWN,
        }
    }
}

// =============================================================================
// ContinuationError
// =============================================================================

/// Errors raised when resolving a continuation point.
#[derive(Debug, Error)]
pub enum ContinuationError {
    /// The token is unknown to the session (never issued, consumed, evicted
    /// or owned by another session).
    #[error("Continuation point '{token}' not found")]
    NotFound {
        /// The presented token (base64).
        token: String,
    },

    /// The token was issued for a different node.
    #[error("Continuation point '{token}' belongs to '{expected}', not '{actual}'")]
    NodeMismatch {
        /// The presented token (base64).
        token: String,
        /// Node the token was issued for.
        expected: String,
        /// Node the token was presented with.
        actual: String,
    },
}

impl ContinuationError {
    /// Creates a not found error.
    pub fn not_found(token: impl Into<String>) -> Self {
        Self::NotFound {
            token: token.into(),
        }
    }

    /// Creates a node mismatch error.
    pub fn node_mismatch(
        token: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::NodeMismatch {
            token: token.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    ///
    /// A consumed token never comes back; the client must restart the read.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns the OPC UA status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_CONTINUATION_POINT_INVALID
    }
}

// =============================================================================
// ParseError
// =============================================================================

/// Errors raised when parsing identifiers.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The node id text is malformed.
    #[error("Invalid node id '{input}': {reason}")]
    InvalidNodeId {
        /// The input text.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The attribute id is outside 1..=22.
    #[error("Unknown attribute id: {value}")]
    UnknownAttributeId {
        /// The numeric attribute id.
        value: u32,
    },
}

impl ParseError {
    /// Creates an invalid node id error.
    pub fn invalid_node_id(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Returns the OPC UA status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ParseError::InvalidNodeId { .. } => StatusCode::BAD_NODE_ID_INVALID,
            ParseError::UnknownAttributeId { .. } => StatusCode::BAD_ATTRIBUTE_ID_INVALID,
        }
    }
}

/// A `Result` alias using [`HdaError`].
pub type HdaResult<T> = Result<T, HdaError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_error_display() {
        let error = ArchiveError::already_installed("ns=2;s=Tank.Level");
        assert_eq!(
            error.to_string(),
            "Variable 'ns=2;s=Tank.Level' is already historized"
        );
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_continuation_error_status() {
        let error = ContinuationError::not_found("AAAA");
        assert_eq!(error.status_code(), StatusCode::BAD_CONTINUATION_POINT_INVALID);

        let error = ContinuationError::node_mismatch("AAAA", "ns=2;i=1", "ns=2;i=2");
        assert_eq!(error.status_code(), StatusCode::BAD_CONTINUATION_POINT_INVALID);
    }

    #[test]
    fn test_parse_error_status() {
        let error = ParseError::invalid_node_id("bogus", "no identifier");
        assert_eq!(error.status_code(), StatusCode::BAD_NODE_ID_INVALID);
        assert_eq!(
            ParseError::UnknownAttributeId { value: 99 }.status_code(),
            StatusCode::BAD_ATTRIBUTE_ID_INVALID
        );
    }

    #[test]
    fn test_hda_error_conversion() {
        let error: HdaError = ArchiveError::not_installed("ns=2;i=7").into();
        assert_eq!(error.error_type(), "archive");
        assert_eq!(error.status_code(), StatusCode::BAD_NODE_ID_UNKNOWN);
        assert!(!error.is_retryable());

        let error: HdaError = ContinuationError::not_found("x").into();
        assert_eq!(error.error_type(), "continuation");
        assert!(error.to_string().starts_with("Continuation point error"));
    }
}
