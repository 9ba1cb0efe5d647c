//! Error types shared across the services

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Failures raised by the shared database layer
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Could not establish a connection to PostgreSQL
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// The environment does not describe a usable database
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
