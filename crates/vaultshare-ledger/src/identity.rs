//! Identity records and the identity store contract

use std::fmt;

use async_trait::async_trait;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LedgerResult;

/// Unique, immutable identifier of a registered identity
pub type IdentityId = String;

/// One-way commitment to an identity's credential
///
/// Wraps a Blake3 hash of the secret; the secret itself never enters this
/// crate. Equality goes through `blake3::Hash`, which compares in constant
/// time.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CredentialCommitment(blake3::Hash);

impl CredentialCommitment {
    /// Commit to a secret by hashing it
    pub fn from_secret(secret: &[u8]) -> Self {
        Self(blake3::hash(secret))
    }

    /// Rehydrate a commitment from its raw 32 bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(blake3::Hash::from(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Encode as base58 (compact, readable)
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0.as_bytes()).into_string()
    }

    /// Decode from base58
    pub fn from_base58(s: &str) -> Option<Self> {
        let bytes = bs58::decode(s).into_vec().ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self::from_bytes(arr))
    }

    /// Constant-time comparison against a candidate commitment
    pub fn matches(&self, candidate: &CredentialCommitment) -> bool {
        self.0 == candidate.0
    }
}

impl fmt::Debug for CredentialCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Truncated on purpose: commitments should not be easy to scrape
        // out of debug logs in full.
        write!(f, "Commitment({}..)", &self.to_base58()[..8])
    }
}

impl Serialize for CredentialCommitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for CredentialCommitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base58(&s).ok_or_else(|| D::Error::custom("invalid credential commitment"))
    }
}

/// A registered identity
///
/// `id` and `credential_commitment` are immutable after registration;
/// `display_name` and `group_tag` may be changed by the holder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub display_name: String,
    pub credential_commitment: CredentialCommitment,
    /// Group/organization tag, matched against directory access policies
    pub group_tag: String,
}

/// Durable table of identity records
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Append a new identity
    ///
    /// Fails with `AlreadyExists` if the id is taken.
    async fn insert(&self, identity: Identity) -> LedgerResult<()>;

    /// Fetch an identity by id, `NotFound` if absent
    async fn get(&self, id: &str) -> LedgerResult<Identity>;

    /// Replace the mutable profile fields of an existing identity
    ///
    /// `id` and `credential_commitment` must already match the stored
    /// record; callers go through `IdentityRegistry::update_profile`.
    async fn update(&self, identity: Identity) -> LedgerResult<()>;

    /// Whether an identity with this id exists
    async fn exists(&self, id: &str) -> LedgerResult<bool> {
        match self.get(id).await {
            Ok(_) => Ok(true),
            Err(crate::error::LedgerError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
