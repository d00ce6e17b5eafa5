//! Error types for kronika.
//!
//! The resolution and merge paths never fail a whole batch: bad records and
//! unresolved references are logged and skipped. The errors below surface
//! only from strict parsing helpers, configuration loading and source
//! payloads that cannot be decoded at all.

use thiserror::Error;

/// Validation errors that occur during input validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A date bound that is not a supported partial date.
    #[error("Invalid date '{input}': expected YYYY, YYYY-MM or YYYY-MM-DD")]
    InvalidDate {
        /// The rejected text.
        input: String,
    },

    /// An entity record with a blank name.
    #[error("Entity name cannot be empty")]
    EmptyEntityName,

    /// A type label outside the known entity kinds.
    #[error("Unknown entity kind: {value}")]
    UnknownEntityKind {
        /// The rejected label.
        value: String,
    },

    /// A resolver config value out of range.
    #[error("Invalid config field '{field}': {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Errors raised while reading entity sources or config files.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A source payload that is not valid JSON for entity records.
    #[error("Source '{source_name}' could not be decoded: {message}")]
    Decode {
        /// Name of the source.
        source_name: String,
        /// Decoder message.
        message: String,
    },

    /// A file that could not be read.
    #[error("I/O error on '{path}': {message}")]
    Io {
        /// The file path.
        path: String,
        /// Underlying I/O message.
        message: String,
    },
}

/// Top-level error type for kronika.
#[derive(Debug, Error)]
pub enum KronikaError {
    /// Invalid input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unreadable source or config.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// A broken internal invariant.
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl KronikaError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a source error.
    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for kronika operations.
pub type KronikaResult<T> = Result<T, KronikaError>;
