//! In-memory verification-attempt store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{LedgerError, LedgerResult};
use crate::verification::{AttemptId, AttemptOutcome, AttemptStore, VerificationAttempt};

#[derive(Default)]
struct Inner {
    attempts: HashMap<AttemptId, VerificationAttempt>,
    next_id: AttemptId,
}

#[derive(Default)]
pub struct MemoryAttemptStore {
    inner: RwLock<Inner>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attempts ever recorded
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn insert(&self, mut attempt: VerificationAttempt) -> LedgerResult<VerificationAttempt> {
        let mut inner = self.inner.write().unwrap();

        // The pending check and the insert share one lock, so two racing
        // submissions cannot both open an attempt for the same key.
        let has_pending = inner.attempts.values().any(|a| {
            a.directory_key == attempt.directory_key && a.outcome == AttemptOutcome::Pending
        });
        if has_pending {
            return Err(LedgerError::AlreadyPending(attempt.directory_key));
        }

        inner.next_id += 1;
        attempt.id = inner.next_id;
        attempt.outcome = AttemptOutcome::Pending;
        inner.attempts.insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    async fn get(&self, id: AttemptId) -> LedgerResult<VerificationAttempt> {
        self.inner
            .read()
            .unwrap()
            .attempts
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("attempt {id}")))
    }

    async fn finalize(
        &self,
        id: AttemptId,
        outcome: AttemptOutcome,
    ) -> LedgerResult<(VerificationAttempt, bool)> {
        let mut inner = self.inner.write().unwrap();
        let attempt = inner
            .attempts
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("attempt {id}")))?;

        if attempt.outcome != AttemptOutcome::Pending {
            return Ok((attempt.clone(), false));
        }
        attempt.outcome = outcome;
        Ok((attempt.clone(), true))
    }

    async fn pending_for(&self, key: &str) -> LedgerResult<Option<VerificationAttempt>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .attempts
            .values()
            .find(|a| a.directory_key == key && a.outcome == AttemptOutcome::Pending)
            .cloned())
    }
}
