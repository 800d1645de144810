//! Directory records: per-file ownership, access, and verification state

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LedgerResult;
use crate::identity::IdentityId;

/// Proof-verification state of a directory record
///
/// Transitions only along `Unset -> Pending -> {Valid, Invalid}`. `Valid`
/// is sticky: later failed attempts never downgrade it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Unset,
    Pending,
    Valid,
    Invalid,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Unset => "unset",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Valid => "valid",
            VerificationStatus::Invalid => "invalid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unset" => Some(VerificationStatus::Unset),
            "pending" => Some(VerificationStatus::Pending),
            "valid" => Some(VerificationStatus::Valid),
            "invalid" => Some(VerificationStatus::Invalid),
            _ => None,
        }
    }
}

/// Metadata record for one published file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Unique, immutable, caller-chosen key
    pub key: String,
    /// Immutable once set at creation
    pub owner: IdentityId,
    /// Content address of the current bytes, set by update_content
    pub content_address: Option<String>,
    /// Symbolic policy tags, e.g. "public" or group names
    pub access_policy: BTreeSet<String>,
    /// Explicit grantees; never contains the owner
    pub cooperators: BTreeSet<IdentityId>,
    pub verification_status: VerificationStatus,
    /// Strictly +1 per accepted mutation; optimistic-concurrency token
    pub version: u64,
}

impl DirectoryRecord {
    /// Fresh record as produced by create_directory
    pub fn new(key: String, owner: IdentityId, access_policy: BTreeSet<String>) -> Self {
        Self {
            key,
            owner,
            content_address: None,
            access_policy,
            cooperators: BTreeSet::new(),
            verification_status: VerificationStatus::Unset,
            version: 1,
        }
    }

    pub fn is_owner(&self, candidate: &str) -> bool {
        self.owner == candidate
    }

    pub fn is_cooperator(&self, candidate: &str) -> bool {
        self.cooperators.contains(candidate)
    }
}

/// Durable table of directory records
///
/// `compare_and_swap` is the single write primitive: it commits the full
/// replacement record iff the stored version still equals
/// `expected_version`, so a lost update can never slip through between a
/// read and a write. Implementations hold their own lock around the check
/// and the write.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Append a new record, `AlreadyExists` if the key is taken
    async fn insert(&self, record: DirectoryRecord) -> LedgerResult<()>;

    /// Fetch a record by key, `NotFound` if absent
    async fn get(&self, key: &str) -> LedgerResult<DirectoryRecord>;

    /// All records, ordered by key
    async fn list(&self) -> LedgerResult<Vec<DirectoryRecord>>;

    /// Replace the record iff its stored version equals `expected_version`
    ///
    /// The replacement carries the already-incremented version. Fails with
    /// `VersionConflict` on mismatch and `NotFound` if the key vanished.
    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: DirectoryRecord,
    ) -> LedgerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let rec = DirectoryRecord::new("f1".into(), "alice".into(), BTreeSet::new());
        assert_eq!(rec.version, 1);
        assert_eq!(rec.verification_status, VerificationStatus::Unset);
        assert!(rec.content_address.is_none());
        assert!(rec.cooperators.is_empty());
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for s in [
            VerificationStatus::Unset,
            VerificationStatus::Pending,
            VerificationStatus::Valid,
            VerificationStatus::Invalid,
        ] {
            assert_eq!(VerificationStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(VerificationStatus::parse("bogus"), None);
    }
}
