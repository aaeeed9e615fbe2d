//! Error taxonomy for the data-access layer.
//!
//! # Responsibility
//! - Keep store-level causes (`StoreError`) apart from caller-facing outcomes
//!   (`DataError`).
//! - Let callers branch on "missing" vs "broken" without string matching.
//!
//! # Invariants
//! - `DataError::Transaction` always carries the original store cause.
//! - A rollback failure never replaces the error that triggered the rollback.

use rusqlite::ErrorCode;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;
pub type DataResult<T> = Result<T, DataError>;

/// Failure reported by the storage collaborator or by criteria translation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// The context factory was shut down before the context was requested.
    #[error("context factory is shut down")]
    Closed,
    /// A predicate reached translation with the wrong number of operands.
    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Returns whether SQLite rejected the statement on a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation
        )
    }
}

/// Outcome of a failed repository call.
#[derive(Debug, Error)]
pub enum DataError {
    /// A working context could not be acquired or bootstrapped.
    #[error("cannot acquire working context: {0}")]
    Connectivity(#[source] StoreError),

    /// Any failure after the unit of work started.
    #[error("transaction failed: {0}")]
    Transaction(#[from] StoreError),

    /// A single-result lookup matched zero rows.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// More rows matched than the operation allows.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// `update`/`delete` received an entity without an identifier.
    #[error("{entity} has no identifier")]
    MissingIdentifier { entity: String },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DataError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }

    /// Returns whether the underlying store rejected a write on a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        self.store_cause()
            .is_some_and(StoreError::is_constraint_violation)
    }

    /// Returns the store-level cause when this error wraps one.
    pub fn store_cause(&self) -> Option<&StoreError> {
        match self {
            Self::Connectivity(err) | Self::Transaction(err) => Some(err),
            _ => None,
        }
    }
}
