//! Guild store error types.

use std::fmt;

/// Errors from reading the guild store.
#[derive(Debug)]
pub enum GuildStoreError {
    /// The database URL could not be parsed.
    InvalidUrl {
        /// Error details.
        details: String,
    },
    /// Failed to open the database.
    ConnectionFailed {
        /// Error details.
        details: String,
    },
    /// Applying the schema migrations failed.
    MigrationFailed {
        /// Error details.
        details: String,
    },
    /// Reading the guild table failed.
    QueryFailed {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for GuildStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { details } => {
                write!(f, "invalid guild database URL: {}", details)
            }
            Self::ConnectionFailed { details } => {
                write!(f, "failed to open guild database: {}", details)
            }
            Self::MigrationFailed { details } => {
                write!(f, "guild schema migration failed: {}", details)
            }
            Self::QueryFailed { details } => {
                write!(f, "guild query failed: {}", details)
            }
        }
    }
}

impl std::error::Error for GuildStoreError {}
