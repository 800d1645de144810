//! Proof-verification gate
//!
//! Ownership proofs are verified out-of-process: a submission creates a
//! `Pending` attempt, the slow external verifier runs without any record
//! lock held, and the verdict lands as one atomic transition on the
//! directory record.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::{AuditEvent, AuditLog};
use crate::directory::{DirectoryRecord, DirectoryStore, VerificationStatus};
use crate::error::{LedgerError, LedgerResult};
use crate::identity::{IdentityId, IdentityStore};

/// Store-assigned identifier of a verification attempt
pub type AttemptId = u64;

/// Outcome of one verification attempt; terminal once it leaves `Pending`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Pending,
    Valid,
    Invalid,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Pending => "pending",
            AttemptOutcome::Valid => "valid",
            AttemptOutcome::Invalid => "invalid",
        }
    }
}

/// Digest of a submitted proof plus its public inputs
///
/// Kept for audit correlation; the bytes themselves are never stored.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofDigest(#[serde(with = "digest_serde")] blake3::Hash);

impl ProofDigest {
    pub fn compute(proof: &[u8], public_inputs: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(proof);
        hasher.update(public_inputs);
        Self(hasher.finalize())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(blake3::Hash::from(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0.as_bytes()).into_string()
    }
}

impl fmt::Debug for ProofDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProofDigest({})", self.to_base58())
    }
}

mod digest_serde {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &blake3::Hash, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&bs58::encode(hash.as_bytes()).into_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<blake3::Hash, D::Error> {
        let text = String::deserialize(d)?;
        let bytes = bs58::decode(&text)
            .into_vec()
            .map_err(|e| D::Error::custom(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("digest must be 32 bytes"))?;
        Ok(blake3::Hash::from(arr))
    }
}

/// One submission of an ownership proof for a directory key
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationAttempt {
    pub id: AttemptId,
    pub directory_key: String,
    pub proof_digest: ProofDigest,
    pub submitted_by: IdentityId,
    /// Directory version observed at submission time
    pub submitted_at_version: u64,
    pub outcome: AttemptOutcome,
}

/// Durable table of verification attempts
///
/// Enforces the at-most-one-pending-per-key rule atomically: `insert`
/// fails with `AlreadyPending` while an earlier attempt for the same key
/// is still open.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Commit a new pending attempt, assigning its id
    async fn insert(&self, attempt: VerificationAttempt) -> LedgerResult<VerificationAttempt>;

    /// Fetch an attempt by id, `NotFound` if absent
    async fn get(&self, id: AttemptId) -> LedgerResult<VerificationAttempt>;

    /// Set the outcome iff the attempt is still pending
    ///
    /// Returns the stored attempt and whether this call finalized it; a
    /// finalized attempt is immutable, so re-finalizing is a no-op.
    async fn finalize(
        &self,
        id: AttemptId,
        outcome: AttemptOutcome,
    ) -> LedgerResult<(VerificationAttempt, bool)>;

    /// The open attempt for a key, if any
    async fn pending_for(&self, key: &str) -> LedgerResult<Option<VerificationAttempt>>;
}

/// Fault classes of the external verifier
#[derive(Debug, Error)]
pub enum VerifyFault {
    /// The proof could not be parsed; judged `Invalid`, not retried
    #[error("malformed proof: {0}")]
    Malformed(String),
    /// The verifier could not be reached; retryable, never an indictment
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// External zero-knowledge proof verifier
///
/// The circuit and curve math live behind this boundary; the gate only
/// consumes the verdict.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    async fn verify(
        &self,
        proof: &[u8],
        public_inputs: &[u8],
        verification_key: &[u8],
    ) -> Result<bool, VerifyFault>;
}

/// Canned verifier behavior for tests and the `mock` server backend
#[derive(Clone, Copy, Debug)]
pub enum MockVerdict {
    Accept,
    Reject,
    Malformed,
    Unavailable,
}

/// Mock verifier - NOT FOR PRODUCTION USE
pub struct MockVerifier {
    verdict: MockVerdict,
}

impl MockVerifier {
    pub fn new(verdict: MockVerdict) -> Self {
        Self { verdict }
    }

    pub fn accepting() -> Self {
        Self::new(MockVerdict::Accept)
    }

    pub fn rejecting() -> Self {
        Self::new(MockVerdict::Reject)
    }
}

#[async_trait]
impl ProofVerifier for MockVerifier {
    async fn verify(
        &self,
        _proof: &[u8],
        _public_inputs: &[u8],
        _verification_key: &[u8],
    ) -> Result<bool, VerifyFault> {
        match self.verdict {
            MockVerdict::Accept => Ok(true),
            MockVerdict::Reject => Ok(false),
            MockVerdict::Malformed => Err(VerifyFault::Malformed("mock".into())),
            MockVerdict::Unavailable => Err(VerifyFault::Unavailable("mock".into())),
        }
    }
}

/// The only path that can move a directory record into `Valid`/`Invalid`
pub struct ProofGate {
    directories: Arc<dyn DirectoryStore>,
    identities: Arc<dyn IdentityStore>,
    attempts: Arc<dyn AttemptStore>,
    verifier: Arc<dyn ProofVerifier>,
    audit: Arc<dyn AuditLog>,
    verification_key: Vec<u8>,
}

impl ProofGate {
    pub fn new(
        directories: Arc<dyn DirectoryStore>,
        identities: Arc<dyn IdentityStore>,
        attempts: Arc<dyn AttemptStore>,
        verifier: Arc<dyn ProofVerifier>,
        audit: Arc<dyn AuditLog>,
        verification_key: Vec<u8>,
    ) -> Self {
        Self {
            directories,
            identities,
            attempts,
            verifier,
            audit,
            verification_key,
        }
    }

    /// Open a verification attempt for `key`
    ///
    /// Rejects with `AlreadyPending` while an earlier attempt is open. An
    /// `Unset` record moves to `Pending`; terminal statuses stay untouched
    /// (a re-submission gets its own attempt, it does not reopen the
    /// record).
    pub async fn submit_proof(
        &self,
        key: &str,
        submitted_by: &str,
        proof: &[u8],
        public_inputs: &[u8],
    ) -> LedgerResult<VerificationAttempt> {
        let record = self.directories.get(key).await?;
        if !self.identities.exists(submitted_by).await? {
            return Err(LedgerError::UnknownIdentity(submitted_by.into()));
        }

        let attempt = self
            .attempts
            .insert(VerificationAttempt {
                id: 0, // assigned by the store
                directory_key: key.into(),
                proof_digest: ProofDigest::compute(proof, public_inputs),
                submitted_by: submitted_by.into(),
                submitted_at_version: record.version,
                outcome: AttemptOutcome::Pending,
            })
            .await?;

        if record.verification_status == VerificationStatus::Unset {
            self.transition_status(key, VerificationStatus::Pending, |s| {
                s == VerificationStatus::Unset
            })
            .await?;
        }

        self.audit
            .append(
                AuditEvent::new("submit_proof", key, submitted_by)
                    .detail(format!("digest {}", attempt.proof_digest.to_base58())),
            )
            .await?;

        tracing::debug!(key, attempt = attempt.id, "opened verification attempt");
        Ok(attempt)
    }

    /// Delegate a pending attempt to the external verifier
    ///
    /// Runs without holding any record lock, bounded by `timeout`. On a
    /// verdict the attempt is finalized; `Malformed` counts as a `false`
    /// verdict; `Unavailable` and timeout leave the attempt `Pending` so
    /// the caller can retry the delegation without re-submitting.
    pub async fn execute(
        &self,
        attempt_id: AttemptId,
        proof: &[u8],
        public_inputs: &[u8],
        timeout: Duration,
    ) -> LedgerResult<DirectoryRecord> {
        let attempt = self.attempts.get(attempt_id).await?;
        if attempt.outcome != AttemptOutcome::Pending {
            // Replayed delegation of a settled attempt is a no-op
            return self.directories.get(&attempt.directory_key).await;
        }
        if ProofDigest::compute(proof, public_inputs) != attempt.proof_digest {
            return Err(LedgerError::MalformedProof(
                "proof bytes do not match the submitted digest".into(),
            ));
        }

        let verdict = tokio::time::timeout(
            timeout,
            self.verifier
                .verify(proof, public_inputs, &self.verification_key),
        )
        .await;

        match verdict {
            Ok(Ok(valid)) => self.apply_verdict(attempt_id, valid).await,
            Ok(Err(VerifyFault::Malformed(reason))) => {
                tracing::warn!(attempt = attempt_id, %reason, "proof rejected as malformed");
                self.apply_verdict(attempt_id, false).await
            }
            Ok(Err(VerifyFault::Unavailable(reason))) => {
                Err(LedgerError::VerifierUnavailable(reason))
            }
            Err(_elapsed) => Err(LedgerError::VerifierUnavailable(format!(
                "no verdict within {timeout:?}"
            ))),
        }
    }

    /// Land a verdict as one atomic transition
    ///
    /// A `true` verdict sets the record `Valid` unless it already is; a
    /// `false` verdict sets `Invalid` unless the record is `Valid` -
    /// proven ownership is not un-proven by a later failed attempt.
    /// Re-applying to a finalized attempt is a no-op returning current
    /// state, per the ledger replay contract.
    pub async fn apply_verdict(
        &self,
        attempt_id: AttemptId,
        verdict: bool,
    ) -> LedgerResult<DirectoryRecord> {
        let outcome = if verdict {
            AttemptOutcome::Valid
        } else {
            AttemptOutcome::Invalid
        };
        let (attempt, newly_finalized) = self.attempts.finalize(attempt_id, outcome).await?;
        if !newly_finalized {
            return self.directories.get(&attempt.directory_key).await;
        }

        let key = attempt.directory_key.as_str();
        let record = if verdict {
            self.transition_status(key, VerificationStatus::Valid, |s| {
                s != VerificationStatus::Valid
            })
            .await?
        } else {
            self.transition_status(key, VerificationStatus::Invalid, |s| {
                !matches!(s, VerificationStatus::Valid | VerificationStatus::Invalid)
            })
            .await?
        };

        self.audit
            .append(
                AuditEvent::new("apply_verdict", key, &attempt.submitted_by)
                    .version(record.version)
                    .detail(format!("attempt {} -> {}", attempt.id, outcome.as_str())),
            )
            .await?;

        tracing::info!(
            key,
            attempt = attempt.id,
            outcome = outcome.as_str(),
            status = record.verification_status.as_str(),
            "verdict applied"
        );
        Ok(record)
    }

    /// CAS loop moving the record's status when `applies` holds
    ///
    /// Internal retries are fine here: the gate takes no expected version
    /// from its caller, only the status rule is observable.
    async fn transition_status(
        &self,
        key: &str,
        target: VerificationStatus,
        applies: impl Fn(VerificationStatus) -> bool,
    ) -> LedgerResult<DirectoryRecord> {
        loop {
            let record = self.directories.get(key).await?;
            if !applies(record.verification_status) {
                return Ok(record);
            }
            let mut updated = record.clone();
            updated.verification_status = target;
            updated.version = record.version + 1;
            match self
                .directories
                .compare_and_swap(record.version, updated.clone())
                .await
            {
                Ok(()) => return Ok(updated),
                Err(LedgerError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_deterministic() {
        let a = ProofDigest::compute(b"proof", b"inputs");
        let b = ProofDigest::compute(b"proof", b"inputs");
        assert_eq!(a, b);
        assert_ne!(a, ProofDigest::compute(b"proof", b"other"));
    }

    #[tokio::test]
    async fn test_mock_verifier_faults() {
        let unavailable = MockVerifier::new(MockVerdict::Unavailable);
        assert!(matches!(
            unavailable.verify(b"p", b"i", b"vk").await,
            Err(VerifyFault::Unavailable(_))
        ));

        let malformed = MockVerifier::new(MockVerdict::Malformed);
        assert!(matches!(
            malformed.verify(b"p", b"i", b"vk").await,
            Err(VerifyFault::Malformed(_))
        ));
    }
}
