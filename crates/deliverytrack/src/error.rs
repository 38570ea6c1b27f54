//! Error types for deliverytrack.
//!
//! This module defines all error types used throughout the deliverytrack crate.
//! Domain outcomes (`NotFound`, `Validation`, ...) are kept distinct from
//! infrastructure failures so callers can translate them without string matching.

use std::path::PathBuf;
use thiserror::Error;

use crate::record::SectionKind;

/// The main error type for deliverytrack operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Record Errors ===
    /// No delivery record exists for the identifier.
    #[error("delivery not found: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// The generated identifier is already taken.
    #[error("duplicate delivery identifier: {id} (gave up after {attempts} attempts)")]
    DuplicateIdentifier {
        /// The last identifier that collided.
        id: String,
        /// How many identifiers were tried.
        attempts: u32,
    },

    /// Submitted section fields violate the section schema.
    #[error("invalid {section} details: {message}")]
    Validation {
        /// The section whose fields were rejected.
        section: SectionKind,
        /// Description of the violation.
        message: String,
    },

    /// An externally supplied identifier is malformed.
    #[error("invalid delivery identifier '{value}': {reason}")]
    InvalidIdentifier {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A section name outside the five known stations.
    #[error("unknown section '{name}' (expected onsite, warehouse, quality, logistics or finance)")]
    UnknownSection {
        /// The rejected name.
        name: String,
    },

    /// A station tried to write a section it does not own.
    #[error("{station} station cannot submit {submitted} details")]
    SectionMismatch {
        /// The section the station owns.
        station: SectionKind,
        /// The section carried by the submitted update.
        submitted: SectionKind,
    },

    /// A scanned payload could not be resolved to a delivery.
    #[error("unrecognized scan payload: {message}")]
    ScanPayload {
        /// Description of what went wrong.
        message: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored record could not be decoded.
    #[error("stored delivery {id} is corrupt: {message}")]
    CorruptRecord {
        /// Identifier of the damaged record.
        id: String,
        /// Description of what failed to decode.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for deliverytrack operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a not-found error for the given identifier.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a validation error for a section.
    #[must_use]
    pub fn validation(section: SectionKind, message: impl Into<String>) -> Self {
        Self::Validation {
            section,
            message: message.into(),
        }
    }

    /// Create a scan payload error.
    #[must_use]
    pub fn scan_payload(message: impl Into<String>) -> Self {
        Self::ScanPayload {
            message: message.into(),
        }
    }

    /// Create a corrupt record error.
    #[must_use]
    pub fn corrupt_record(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the delivery does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a rejection of caller-supplied input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidIdentifier { .. }
                | Self::UnknownSection { .. }
                | Self::SectionMismatch { .. }
                | Self::ScanPayload { .. }
        )
    }

    /// Check if this error is an identifier collision.
    #[must_use]
    pub fn is_duplicate_identifier(&self) -> bool {
        matches!(self, Self::DuplicateIdentifier { .. })
    }
}
