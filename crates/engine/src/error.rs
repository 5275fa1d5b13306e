//! The module contains the error the engine can throw.
//!
//! Callers usually only care about the [`ErrorKind`] of an error:
//!
//! - [`NotFound`] a lookup or delete target is absent.
//! - [`EditConflict`] a versioned record changed since it was read.
//! - [`InvalidInput`] the snapshots or filters handed to the engine are
//!   inconsistent.
//! - [`StorageFailure`] everything else (connectivity, timeouts, constraint
//!   violations).
//!
//!  [`NotFound`]: ErrorKind::NotFound
//!  [`EditConflict`]: ErrorKind::EditConflict
//!  [`InvalidInput`]: ErrorKind::InvalidInput
//!  [`StorageFailure`]: ErrorKind::StorageFailure
use std::time::Duration;

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Edit conflict: {0}")]
    EditConflict(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unit of work timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Coarse classification of an [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    EditConflict,
    InvalidInput,
    StorageFailure,
}

impl EngineError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::EditConflict(_) => ErrorKind::EditConflict,
            Self::InvalidAmount(_) | Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Timeout(_) | Self::Database(_) => ErrorKind::StorageFailure,
        }
    }

    pub(crate) fn not_found(what: &str) -> Self {
        Self::KeyNotFound(format!("{what} not exists"))
    }

    pub(crate) fn conflict(what: &str) -> Self {
        Self::EditConflict(format!("{what} was modified concurrently"))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::EditConflict(a), Self::EditConflict(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_collapse_into_one_kind() {
        let timeout = EngineError::Timeout(Duration::from_secs(5));
        let db = EngineError::Database(DbErr::Custom("boom".to_string()));

        assert_eq!(timeout.kind(), ErrorKind::StorageFailure);
        assert_eq!(db.kind(), ErrorKind::StorageFailure);
        assert_eq!(
            EngineError::not_found("account").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::conflict("statistic").kind(),
            ErrorKind::EditConflict
        );
    }
}
