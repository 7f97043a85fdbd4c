//! Error types for entity synchronization.

use thiserror::Error;

/// Errors from synchronization and its configuration.
#[derive(Debug, Error)]
pub enum DbSyncError {
    /// The data map mutex was poisoned by a panicking synchronization.
    #[error("data map lock poisoned")]
    LockPoisoned,

    /// A table name pattern could not be compiled.
    #[error("invalid name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// The policy file is not valid TOML for [`MergeConfig`](crate::MergeConfig).
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for synchronization operations.
pub type DbSyncResult<T> = Result<T, DbSyncError>;
