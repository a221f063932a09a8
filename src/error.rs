//! Error taxonomy for symhound operations.

use thiserror::Error;

/// Main error type for symhound core operations.
#[derive(Error, Debug)]
pub enum SymhoundError {
    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("invalid range: start {start} > end {end}")]
    InvalidRange { start: i64, end: i64 },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("integrity error: {message}")]
    IntegrityError { message: String },

    #[error("backing object missing: {path}")]
    BackingStoreMissing { path: String },

    #[error("backing store unavailable: {message}")]
    BackingStoreUnavailable { message: String },

    #[error("resource exhausted: {message}")]
    ResourceExhausted { message: String },

    #[error("cancelled")]
    Cancelled,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] Box<bincode::ErrorKind>),
}

impl SymhoundError {
    /// Exit code for the ingestion CLI contract (spec §6).
    ///
    /// 0 success, 1 user error, 2 integrity error, 3 backing-store unavailable.
    pub fn exit_code(&self) -> std::process::ExitCode {
        use std::process::ExitCode;
        match self {
            Self::NotFound { .. }
            | Self::InvalidRange { .. }
            | Self::InvalidArgument { .. }
            | Self::Io(_) => ExitCode::from(1),
            Self::Conflict { .. } | Self::IntegrityError { .. } => ExitCode::from(2),
            Self::BackingStoreMissing { .. }
            | Self::BackingStoreUnavailable { .. }
            | Self::Sqlite(_) => ExitCode::from(3),
            Self::ResourceExhausted { .. } | Self::Cancelled | Self::Encoding(_) => {
                ExitCode::from(1)
            }
        }
    }
}

/// Result type alias for symhound core operations.
pub type Result<T> = std::result::Result<T, SymhoundError>;
