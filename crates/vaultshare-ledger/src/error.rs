//! Ledger error types

use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Version conflict: expected {expected}, record is at {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("A verification attempt is already pending for directory {0}")]
    AlreadyPending(String),

    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    #[error("Verifier unavailable: {0}")]
    VerifierUnavailable(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}
