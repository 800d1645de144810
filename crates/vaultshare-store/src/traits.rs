//! Content store trait and address type

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use blake3::Hash;

use crate::error::{ContentError, ContentResult};

/// Deterministic, content-derived identifier for stored bytes
///
/// Blake3 over the payload, so two identical payloads always yield the
/// same address. Rendered as base58 for ledger records and URLs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentAddress(blake3::Hash);

impl ContentAddress {
    /// Derive the address of a payload
    pub fn of(data: &[u8]) -> Self {
        Self(blake3::hash(data))
    }

    pub fn from_hash(hash: Hash) -> Self {
        Self(hash)
    }

    pub fn as_hash(&self) -> &Hash {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Encode as base58 (compact, readable)
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0.as_bytes()).into_string()
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl fmt::Debug for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentAddress({})", self.to_base58())
    }
}

impl FromStr for ContentAddress {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ContentError::InvalidAddress(s.into()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ContentError::InvalidAddress(s.into()))?;
        Ok(Self(Hash::from(arr)))
    }
}

/// Content-addressed blob storage
///
/// `put` derives the address from the bytes itself, so a stored blob can
/// never sit under the wrong address. Implementations SHOULD verify the
/// address again on retrieval.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a payload, returning its content address
    async fn put(&self, data: &[u8]) -> ContentResult<ContentAddress>;

    /// Retrieve a payload by address
    ///
    /// Returns `ContentError::NotFound` if nothing is stored there.
    async fn get(&self, address: &ContentAddress) -> ContentResult<Vec<u8>>;

    /// Check whether an address is populated
    async fn exists(&self, address: &ContentAddress) -> ContentResult<bool>;

    /// Delete a payload
    ///
    /// Returns `Ok(())` even if the payload didn't exist (idempotent).
    async fn delete(&self, address: &ContentAddress) -> ContentResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_deterministic() {
        let a = ContentAddress::of(b"same payload");
        let b = ContentAddress::of(b"same payload");
        assert_eq!(a, b);
        assert_ne!(a, ContentAddress::of(b"other payload"));
    }

    #[test]
    fn test_address_parse_roundtrip() {
        let addr = ContentAddress::of(b"payload");
        let parsed: ContentAddress = addr.to_base58().parse().unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_address_parse_garbage() {
        assert!(matches!(
            "not-base58-!!".parse::<ContentAddress>(),
            Err(ContentError::InvalidAddress(_))
        ));
        // Valid base58 but wrong length
        assert!(matches!(
            "3yZe7d".parse::<ContentAddress>(),
            Err(ContentError::InvalidAddress(_))
        ));
    }
}
