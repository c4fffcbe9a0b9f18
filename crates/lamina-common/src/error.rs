//! Unified error types for the Lamina workspace.
//!
//! Resolution failures fall into three families: validation errors (the
//! configuration record violates a declared constraint), assembly invariant
//! errors (the graph would be internally inconsistent), and collaborator
//! errors (packaging failed). The remaining variants wrap lower-level
//! failures that surface through those families.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single violated constraint on the configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Dotted path of the offending field (e.g. `aliases.live.function_version`).
    pub field: String,
    /// Human-readable description of the violated rule.
    pub rule: String,
}

impl Violation {
    /// Creates a violation for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.rule)
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum LaminaError {
    /// The configuration record violates one or more declared constraints.
    #[error(
        "configuration is invalid ({} violation(s)): {}",
        violations.len(),
        join_violations(violations)
    )]
    Validation {
        /// Every violated constraint, in check order.
        violations: Vec<Violation>,
    },

    /// An internal consistency rule of the resource graph does not hold.
    #[error("assembly invariant violated: {message}")]
    Assembly {
        /// Description of the broken invariant.
        message: String,
    },

    /// The packaging collaborator failed.
    #[error("packaging failed: {message}")]
    Packaging {
        /// Description of the packaging failure.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration document could not be loaded.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl LaminaError {
    /// Returns `true` for errors caused by the packaging collaborator,
    /// including the I/O failures it surfaces.
    #[must_use]
    pub const fn is_collaborator(&self) -> bool {
        matches!(self, Self::Packaging { .. } | Self::Io { .. })
    }

    /// Returns the violations carried by a validation error, or an empty slice.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Validation { violations } => violations,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, LaminaError>;
