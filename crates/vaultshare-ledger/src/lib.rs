//! vaultshare-ledger: Directory and access-control ledger
//!
//! Owns identity records and per-file directory records (owner, content
//! pointer, access policy, cooperator set, proof-verification status) and
//! the protocol for proof-gated status transitions. Every exposed
//! operation is linearizable: mutations commit through a version
//! compare-and-swap and append to the audit trail, so concurrent callers
//! get `VersionConflict` instead of lost updates.
//!
//! ## Features
//!
//! | Feature  | Description                    |
//! |----------|--------------------------------|
//! | (none)   | In-memory backends only        |
//! | `sqlite` | SQLite persistence             |
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vaultshare_ledger::{
//!     CredentialCommitment, DirectoryRegistry, IdentityRegistry,
//!     MemoryAuditLog, MemoryDirectoryStore, MemoryIdentityStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let identities = Arc::new(MemoryIdentityStore::new());
//!     let directories = Arc::new(MemoryDirectoryStore::new());
//!     let audit = Arc::new(MemoryAuditLog::new());
//!
//!     let registry = IdentityRegistry::new(identities.clone(), audit.clone());
//!     registry
//!         .register("alice", "Alice", CredentialCommitment::from_secret(b"pw"), "orgA")
//!         .await?;
//!
//!     let dirs = DirectoryRegistry::new(directories, identities, audit);
//!     let record = dirs.create_directory("f1", "alice", ["public".into()].into()).await?;
//!     dirs.update_content("f1", "alice", "Qm123", record.version).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod access;
mod audit;
mod directory;
mod error;
mod identity;
mod registry;
mod verification;

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-exports
pub use access::{authorize, can_fetch_content, DirectoryOp, PUBLIC_TAG};
pub use audit::{AuditEntry, AuditEvent, AuditLog, MemoryAuditLog};
pub use directory::{DirectoryRecord, DirectoryStore, VerificationStatus};
pub use error::{LedgerError, LedgerResult};
pub use identity::{CredentialCommitment, Identity, IdentityId, IdentityStore};
pub use registry::{DirectoryRegistry, IdentityRegistry};
pub use verification::{
    AttemptId, AttemptOutcome, AttemptStore, MockVerdict, MockVerifier, ProofDigest, ProofGate,
    ProofVerifier, VerificationAttempt, VerifyFault,
};

pub use memory::{MemoryAttemptStore, MemoryDirectoryStore, MemoryIdentityStore};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteAttemptStore, SqliteAuditLog, SqliteDirectoryStore, SqliteIdentityStore};
