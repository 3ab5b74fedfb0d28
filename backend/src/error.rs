//! Error taxonomy for the coupon service.
//!
//! Every fallible operation in the crate returns [`ServiceError`]. Batch
//! rejections (structural, row-level, row-limit, timeout) carry enough detail
//! for an operator to fix the uploaded file; storage and I/O failures are kept
//! for the log and replaced by a generic message at the HTTP boundary.

use std::fmt;
use thiserror::Error;

/// Why a single CSV row was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    Empty,
    TooLong { max: usize },
    InvalidCharacters,
    Duplicate { code: String },
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::Empty => write!(f, "Unique Code cannot be empty"),
            RowRejection::TooLong { max } => write!(f, "Unique Code exceeds {} chars", max),
            RowRejection::InvalidCharacters => write!(f, "Invalid characters"),
            RowRejection::Duplicate { code } => write!(f, "Duplicate '{}'", code),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Empty file, wrong header, or CSV that cannot be parsed.
    #[error("{0}")]
    Structural(String),

    /// First row that broke a rule. `row` counts the header as row 1.
    #[error("Row {row}: {reason}")]
    Validation { row: usize, reason: RowRejection },

    #[error("File contains too many rows. Maximum allowed: {max}")]
    RowLimitExceeded { max: usize },

    #[error("File processing timeout")]
    ParseTimeout,

    #[error("Coupon link config not found")]
    ConfigMissing,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Coupon code already verified")]
    AlreadyVerified,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Structural(_)
            | ServiceError::Validation { .. }
            | ServiceError::RowLimitExceeded { .. }
            | ServiceError::BadRequest(_) => 400,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::ParseTimeout => 408,
            ServiceError::AlreadyVerified => 409,
            ServiceError::ConfigMissing
            | ServiceError::Storage(_)
            | ServiceError::Io(_)
            | ServiceError::Internal(_) => 500,
        }
    }

    /// Message safe to hand to a client.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Storage(_) => "Database error".to_string(),
            ServiceError::Io(_) | ServiceError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// True for failures that should be logged at error level.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ServiceError::Storage(_) | ServiceError::Io(_) | ServiceError::Internal(_)
        )
    }
}
