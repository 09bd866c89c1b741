//! Custom error types for abfreq operations.

use thiserror::Error;

/// Result type alias for abfreq operations
pub type Result<T> = std::result::Result<T, AbfreqError>;

/// Error type for abfreq operations
#[derive(Error, Debug)]
pub enum AbfreqError {
    /// A query field failed validation before the scan started
    #[error("Invalid query '{parameter}': {reason}")]
    InvalidQuery {
        /// The query parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// The shard database directory is missing or unusable
    #[error("Database directory '{path}': {reason}")]
    InvalidDatabase {
        /// Path to the database directory
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// The output directory failed its pre-run checks
    #[error("Output directory '{path}': {reason}")]
    OutputDir {
        /// Path to the output directory
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// A shard could not be read or parsed; fatal for the whole run
    #[error("Invalid shard '{path}': {reason}")]
    ShardRead {
        /// Path to the shard file
        path: String,
        /// Explanation of the problem
        reason: String,
    },
}
