//! Unified error types and result handling.
//!
//! Every mutating operation returns one of these variants so the (external)
//! UI layer can render a single human-readable message; `Validation` also
//! carries the offending field for inline form feedback. Authorization
//! failures deliberately carry no resource detail.

use rust_decimal::Decimal;
use thiserror::Error;

/// All errors the core operations can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// The principal's role (or ownership scope) does not allow the action
    #[error("Unauthorized")]
    Unauthorized,

    /// A caller-supplied value failed validation
    #[error("Invalid {field}: {message}")]
    Validation {
        /// The offending input field
        field: &'static str,
        /// Human-readable explanation
        message: String,
    },

    /// An account balance cannot cover a requested debit
    #[error("{account} has insufficient funds: has ${current}, needs ${required}")]
    InsufficientFunds {
        /// Display name of the participant whose funding fell short
        account: String,
        /// Balance at the time of the failed debit
        current: Decimal,
        /// Amount the debit needed
        required: Decimal,
    },

    /// The operation is not allowed in the resource's current lifecycle state
    #[error("{0}")]
    InvalidState(String),

    /// A referenced resource does not exist
    #[error("{what} not found")]
    NotFound {
        /// What kind of resource was missing
        what: &'static str,
    },

    /// The operation would duplicate an existing record
    #[error("{0}")]
    Conflict(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl Error {
    /// Shorthand for a validation failure on a named field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for an invalid lifecycle-state failure.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
