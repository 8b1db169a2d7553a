//! Database module for the lifecheck server
//!
//! Contains the Postgres-backed user directory and its error type.

pub mod user;

pub use user::PostgresUserDirectory;

use thiserror::Error;

/// Errors raised while talking to the user database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection failed
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// SQL query execution failed
    #[error("Query error: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        Self::Query(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(e.to_string())
    }
}

impl From<StorageError> for lifecheck_core::LivenessError {
    fn from(e: StorageError) -> Self {
        Self::Directory(e.to_string())
    }
}
