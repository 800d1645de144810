use std::sync::Arc;
use std::time::Duration;

use vaultshare_ledger::{
    AttemptStore, AuditLog, DirectoryRegistry, DirectoryStore, IdentityRegistry, IdentityStore,
    MemoryAttemptStore, MemoryAuditLog, MemoryDirectoryStore, MemoryIdentityStore, MockVerifier,
    ProofGate, ProofVerifier, SqliteAttemptStore, SqliteAuditLog, SqliteDirectoryStore,
    SqliteIdentityStore,
};
use vaultshare_store::{ContentStore, InMemoryContentStore, LocalContentStore};

use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub identities: Arc<IdentityRegistry>,
    pub directories: Arc<DirectoryRegistry>,
    pub gate: Arc<ProofGate>,
    pub content: Arc<dyn ContentStore>,
    pub verifier_timeout: Duration,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Build content storage backend
        let content: Arc<dyn ContentStore> = match config.storage.backend.as_str() {
            "local" => {
                let path = config
                    .storage
                    .local_path
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("local storage requires local_path"))?;
                Arc::new(LocalContentStore::new(path).await?)
            }
            "memory" => Arc::new(InMemoryContentStore::new()),
            other => anyhow::bail!(
                "Unknown storage backend '{}'. Valid options: 'local', 'memory'",
                other
            ),
        };

        // Build ledger stores; the audit log follows the same backend so
        // history survives a restart whenever the records do
        let (identity_store, directory_store, attempt_store, audit): (
            Arc<dyn IdentityStore>,
            Arc<dyn DirectoryStore>,
            Arc<dyn AttemptStore>,
            Arc<dyn AuditLog>,
        ) = match config.ledger.backend.as_str() {
            "sqlite" => {
                let path = config
                    .ledger
                    .sqlite_path
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("sqlite ledger requires sqlite_path"))?;
                (
                    Arc::new(SqliteIdentityStore::open(path)?),
                    Arc::new(SqliteDirectoryStore::open(path)?),
                    Arc::new(SqliteAttemptStore::open(path)?),
                    Arc::new(SqliteAuditLog::open(path)?),
                )
            }
            "memory" => (
                Arc::new(MemoryIdentityStore::new()),
                Arc::new(MemoryDirectoryStore::new()),
                Arc::new(MemoryAttemptStore::new()),
                Arc::new(MemoryAuditLog::new()),
            ),
            other => anyhow::bail!(
                "Unknown ledger backend '{}'. Valid options: 'sqlite', 'memory'",
                other
            ),
        };

        // Never silently downgrade - fail hard if requested backend unknown
        let verifier: Arc<dyn ProofVerifier> = match config.verifier.backend.as_str() {
            "mock" => {
                tracing::warn!("Using mock accepting verifier - NOT FOR PRODUCTION USE");
                Arc::new(MockVerifier::accepting())
            }
            "mock-reject" => {
                tracing::warn!("Using mock rejecting verifier - NOT FOR PRODUCTION USE");
                Arc::new(MockVerifier::rejecting())
            }
            other => anyhow::bail!(
                "Unknown verifier backend '{}'. Valid options: 'mock', 'mock-reject'",
                other
            ),
        };

        let identities = Arc::new(IdentityRegistry::new(identity_store.clone(), audit.clone()));
        let directories = Arc::new(DirectoryRegistry::new(
            directory_store.clone(),
            identity_store.clone(),
            audit.clone(),
        ));
        let gate = Arc::new(ProofGate::new(
            directory_store,
            identity_store,
            attempt_store,
            verifier,
            audit,
            config.verifier.verification_key.clone().into_bytes(),
        ));

        Ok(Self {
            identities,
            directories,
            gate,
            content,
            verifier_timeout: Duration::from_secs(config.verifier.timeout_secs),
        })
    }
}
