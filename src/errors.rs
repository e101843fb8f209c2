//! Unified error type for the back office.
//!
//! Every fallible operation returns [`Result`]. Callers that need to tell a
//! flaky collaborator apart from bad data use [`Error::class`].

use thiserror::Error;

/// Broad category of an [`Error`], used to decide how a failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A collaborator (registry, e-signature, mail) failed. Never fatal for
    /// the triggering operation.
    External,
    /// Missing or inconsistent data blocks the requested operation only.
    Validation,
    /// Template rendering failed; the renderer's message is exposed as-is.
    Document,
    /// Storage, IO or configuration failure.
    Internal,
}

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record looked up by id does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity name, e.g. `"unit"`
        entity: &'static str,
        /// Primary key that was looked up
        id: i64,
    },

    /// Money amount is negative, zero where not allowed, or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Input data is incomplete or inconsistent
    #[error("Invalid input: {message}")]
    Validation {
        /// Human-readable description
        message: String,
    },

    /// The summed floor area used as apportionment divisor is zero
    #[error("No valid apportionment basis: total floor area of building {building_id} is zero")]
    NoApportionmentBasis {
        /// Building of the billing period
        building_id: i64,
    },

    /// A new lease or vacancy conflicts with the unit's existing timeline
    #[error("Interval conflict on unit {unit_id}: {message}")]
    IntervalConflict {
        /// Unit whose timeline was touched
        unit_id: i64,
        /// What overlaps or is out of order
        message: String,
    },

    /// A collaborator call failed (network, non-success status, bad payload)
    #[error("{service} request failed: {message}")]
    External {
        /// Collaborator name, e.g. `"registry"`
        service: &'static str,
        /// Underlying failure
        message: String,
    },

    /// Document rendering failed
    #[error("Document generation failed: {message}")]
    Document {
        /// Renderer message
        message: String,
    },
}

impl Error {
    /// Classifies the error for the caller.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::External { .. } => ErrorClass::External,
            Self::NotFound { .. }
            | Self::InvalidAmount { .. }
            | Self::Validation { .. }
            | Self::NoApportionmentBasis { .. }
            | Self::IntervalConflict { .. } => ErrorClass::Validation,
            Self::Document { .. } => ErrorClass::Document,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Json(_) => ErrorClass::Internal,
        }
    }

    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::External`].
    pub fn external(service: &'static str, message: impl ToString) -> Self {
        Self::External {
            service,
            message: message.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
