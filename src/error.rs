//! Custom error types for housetab
//!
//! This module defines the error hierarchy for the crate using thiserror
//! for ergonomic error definitions.
//!
//! Two states that look like errors are deliberately *not* errors:
//! encrypted-data-without-a-key and no-data-at-all are normal load outcomes
//! (see [`crate::storage::LoadOutcome`]). Everything here represents a real
//! failure.

use thiserror::Error;

/// The main error type for housetab operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Encryption-side failures (key setup, cipher errors)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Uniform decryption failure.
    ///
    /// Wrong passphrase, tampered ciphertext, and corrupted packages all
    /// collapse into this single variant so the error type cannot be used
    /// as a padding/validity oracle. The message hints at both causes for
    /// the user's benefit.
    #[error("Decryption failed: wrong passphrase or corrupted data")]
    DecryptionFailed,

    /// Remote store is unreachable or returned a server error
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// Remote store rejected the current access token
    #[error("Access token expired or rejected")]
    AuthExpired,

    /// Storage errors (local file layer)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Import errors (export documents, spreadsheet rows)
    #[error("Import error: {0}")]
    Import(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl LedgerError {
    /// Create a "not found" error for housemates
    pub fn housemate_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Housemate",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for bills
    pub fn bill_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Bill",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is the uniform decryption failure
    pub fn is_decryption_failed(&self) -> bool {
        matches!(self, Self::DecryptionFailed)
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for housetab operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = LedgerError::housemate_not_found("Alice");
        assert_eq!(err.to_string(), "Housemate not found: Alice");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_decryption_failed_is_uniform() {
        // The display string must not distinguish wrong password from
        // corruption beyond the combined hint.
        let err = LedgerError::DecryptionFailed;
        assert_eq!(
            err.to_string(),
            "Decryption failed: wrong passphrase or corrupted data"
        );
        assert!(err.is_decryption_failed());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let ledger_err: LedgerError = io_err.into();
        assert!(matches!(ledger_err, LedgerError::Io(_)));
    }
}
