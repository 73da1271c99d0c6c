//! Error types for cidrmap.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for cidrmap operations.
///
/// `Config`, `Parse` and `Connection` are fatal and raised before any
/// resolution starts. `Persistence` is reported per row and never stops a run.
#[derive(Error, Debug)]
pub enum Error {
    /// CIDR table could not be opened or read
    #[error("cannot read CIDR file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CIDR table is not valid JSON or has the wrong shape
    #[error("invalid CIDR file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configured database is unreachable
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    /// A single row could not be written
    #[error("persistence error: {0}")]
    Persistence(String),

    /// IO error on input or output streams
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cidrmap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for a single CIDR table entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CidrParseError {
    /// Invalid CIDR notation
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
}
