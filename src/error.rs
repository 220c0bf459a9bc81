//! Error types for Book Diary
//!
//! This module defines the single error type returned by the persistence core.
//! Variants are grouped by the three failure categories callers care about:
//!
//! ### Validation (detected before any store access)
//! - `MissingRequiredField` - a goal write without a type or creation date
//! - `InvalidInput` - malformed configuration or caller-supplied values
//!
//! ### Not found
//! - `RecordNotFound` - an update addressed a goal id that does not exist
//!
//! ### Store access
//! - `SqlxError` - the driver failed to open, execute or read (via `#[from]`)
//! - `NoRowsAffected` / `GeneratedKeyMissing` - an insert left the store inconsistent
//! - `InvalidData` - a stored row could not be mapped back to a record
//! - `IoError` - the database file or its directory could not be touched
//!
//! Lookups never use `RecordNotFound`; they return `Ok(None)` instead.

use thiserror::Error;

/// Result type alias using our DiaryError type
pub type Result<T> = std::result::Result<T, DiaryError>;

/// Main error type for the persistence core
#[derive(Error, Debug)]
pub enum DiaryError {
    // ===== Validation Errors =====

    /// Required field is missing on a record about to be written
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// Generic input validation error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ===== Lookup Errors =====

    /// Record addressed by id does not exist
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    // ===== Store Errors =====

    /// An insert statement completed without touching any row
    #[error("No rows affected: {0}")]
    NoRowsAffected(String),

    /// Insert succeeded but the store did not hand back a generated id
    #[error("Generated key missing: {0}")]
    GeneratedKeyMissing(String),

    /// Stored data could not be decoded (bad date text, unknown enum value)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Operation is not valid for the current storage target
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ===== External Library Errors =====

    /// Database driver error from sqlx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DiaryError {
    /// Create a RecordNotFound error with a resource name
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        DiaryError::RecordNotFound(resource.into())
    }

    /// Create a MissingRequiredField error with the field name
    pub fn missing_field<S: Into<String>>(field: S) -> Self {
        DiaryError::MissingRequiredField(field.into())
    }

    /// Create an InvalidInput error with a message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        DiaryError::InvalidInput(message.into())
    }

    /// Create an InvalidData error with a message
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        DiaryError::InvalidData(message.into())
    }

    /// Check if the error was raised before the store was touched
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            DiaryError::MissingRequiredField(_) | DiaryError::InvalidInput(_)
        )
    }

    /// Check if the error is a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiaryError::RecordNotFound(_))
    }

    /// Check if the error came from (or was detected while) talking to the store
    ///
    /// A goal update against an unknown id counts as an access failure as well
    /// as a not-found, since the statement ran and the store disagreed.
    pub fn is_access_error(&self) -> bool {
        matches!(
            self,
            DiaryError::RecordNotFound(_)
                | DiaryError::NoRowsAffected(_)
                | DiaryError::GeneratedKeyMissing(_)
                | DiaryError::InvalidData(_)
                | DiaryError::InvalidState(_)
                | DiaryError::SqlxError(_)
                | DiaryError::IoError(_)
        )
    }

    /// Get user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            DiaryError::MissingRequiredField(field) => {
                format!("Cannot save: the {} is required.", field)
            }
            DiaryError::RecordNotFound(what) => {
                format!("{} no longer exists. It may have been deleted.", what)
            }
            DiaryError::SqlxError(_) | DiaryError::IoError(_) => {
                format!("The reading diary database could not be accessed ({}).", self)
            }
            _ => self.to_string(),
        }
    }
}
