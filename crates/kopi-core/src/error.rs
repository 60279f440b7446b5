//! # Error Types
//!
//! Domain-specific error types for kopi-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kopi-core errors (this file)                                          │
//! │  ├── CoreError        - Domain errors (missing product / transaction)  │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Stable discriminant the caller switches on     │
//! │                                                                         │
//! │  kopi-db errors (separate crate)                                       │
//! │  └── DbError          - Storage failures, carries an ErrorKind         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ErrorKind + message     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, ID, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error maps to exactly one [`ErrorKind`]

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// The stable, discriminable category of every failure the ledger reports.
///
/// ## Caller Mapping
/// ```text
/// ┌──────────────┬──────────────────────────────────────────┬───────────┐
/// │ Kind         │ Meaning                                  │ HTTP-ish  │
/// ├──────────────┼──────────────────────────────────────────┼───────────┤
/// │ VALIDATION   │ Caller-fixable input, nothing was written│ 400       │
/// │ NOT_FOUND    │ Missing, inactive or owned by someone else│ 404       │
/// │ STORAGE      │ Persistence failed, unit of work rolled  │ 503       │
/// │              │ back; retry the whole operation          │           │
/// │ CONFLICT     │ Uniqueness / optimistic locking          │ 409       │
/// └──────────────┴──────────────────────────────────────────┴───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Storage,
    Conflict,
}

impl ErrorKind {
    /// Whether retrying the same request unchanged can succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Storage)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found for this owner.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist
    /// - Product belongs to another user (existence is not revealed)
    /// - Product was soft-deleted
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Transaction cannot be found for this owner.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(i64),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the caller-facing category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_) | CoreError::TransactionNotFound(_) => {
                ErrorKind::NotFound
            }
            CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// They are always raised before any storage access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., malformed date, NaN price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
