//! Audit trail: ordered record of every accepted operation
//!
//! Stand-in for the ledger transport's durable append. Sequence numbers
//! are assigned by the log itself, under the same lock that stores the
//! entry, so the trail totally orders accepted intents.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LedgerResult;

/// One accepted operation, before the log assigns its sequence number
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Operation name, e.g. "grant_access"
    pub operation: String,
    /// Directory key or identity id the operation touched
    pub subject: String,
    pub actor: String,
    /// Record version after the operation, where applicable
    pub resulting_version: Option<u64>,
    pub detail: String,
}

impl AuditEvent {
    pub fn new(operation: &str, subject: &str, actor: &str) -> Self {
        Self {
            operation: operation.into(),
            subject: subject.into(),
            actor: actor.into(),
            resulting_version: None,
            detail: String::new(),
        }
    }

    pub fn version(mut self, version: u64) -> Self {
        self.resulting_version = Some(version);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// A committed audit entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the total order, starting at 1
    pub seq: u64,
    pub recorded_at: u64,
    #[serde(flatten)]
    pub event: AuditEvent,
}

/// Ordered, append-only operation log
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append an event, returning its sequence number
    async fn append(&self, event: AuditEvent) -> LedgerResult<u64>;

    /// All entries for one subject, in sequence order
    async fn entries_for(&self, subject: &str) -> LedgerResult<Vec<AuditEntry>>;

    /// Total number of committed entries
    async fn len(&self) -> LedgerResult<u64>;
}

/// In-memory audit log
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, event: AuditEvent) -> LedgerResult<u64> {
        let mut entries = self.entries.write().unwrap();
        let seq = entries.len() as u64 + 1;
        entries.push(AuditEntry {
            seq,
            recorded_at: Self::now(),
            event,
        });
        Ok(seq)
    }

    async fn entries_for(&self, subject: &str) -> LedgerResult<Vec<AuditEntry>> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.event.subject == subject)
            .cloned()
            .collect())
    }

    async fn len(&self) -> LedgerResult<u64> {
        Ok(self.entries.read().unwrap().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequence_is_dense() {
        let log = MemoryAuditLog::new();
        for i in 1..=5u64 {
            let seq = log
                .append(AuditEvent::new("create_directory", "f1", "alice"))
                .await
                .unwrap();
            assert_eq!(seq, i);
        }
        assert_eq!(log.len().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_entries_filtered_by_subject() {
        let log = MemoryAuditLog::new();
        log.append(AuditEvent::new("create_directory", "f1", "alice"))
            .await
            .unwrap();
        log.append(AuditEvent::new("create_directory", "f2", "bob"))
            .await
            .unwrap();
        log.append(AuditEvent::new("grant_access", "f1", "alice").version(2))
            .await
            .unwrap();

        let f1 = log.entries_for("f1").await.unwrap();
        assert_eq!(f1.len(), 2);
        assert!(f1.windows(2).all(|w| w[0].seq < w[1].seq));
    }
}
