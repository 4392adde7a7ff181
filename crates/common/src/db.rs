//! Shared database types for CodeJam
//!
//! This module provides common database-related types used across domain repositories.

use crate::error::Error;
use thiserror::Error;

/// Database-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),
}

impl RepositoryError {
    /// True when this error is a violation of the named unique constraint.
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(self, RepositoryError::UniqueViolation(name) if name == constraint)
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or_default().to_string();
                return RepositoryError::UniqueViolation(constraint);
            }
        }
        RepositoryError::Connection(err)
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Error::NotFound("Record not found".to_string()),
            RepositoryError::UniqueViolation(_) => {
                Error::Conflict("Record already exists".to_string())
            }
            RepositoryError::Connection(e) => Error::Database(e),
        }
    }
}
