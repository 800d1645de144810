//! In-memory content store (for testing)

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{ContentError, ContentResult};
use crate::traits::{ContentAddress, ContentStore};

/// In-memory content store for unit tests
///
/// Thread-safe via `RwLock`. Not persistent — data lost on drop.
#[derive(Default)]
pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<ContentAddress, Vec<u8>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes stored
    pub fn total_size(&self) -> usize {
        self.blobs.read().unwrap().values().map(|v| v.len()).sum()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, data: &[u8]) -> ContentResult<ContentAddress> {
        let address = ContentAddress::of(data);
        self.blobs.write().unwrap().insert(address, data.to_vec());
        Ok(address)
    }

    async fn get(&self, address: &ContentAddress) -> ContentResult<Vec<u8>> {
        self.blobs
            .read()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(address.to_base58()))
    }

    async fn exists(&self, address: &ContentAddress) -> ContentResult<bool> {
        Ok(self.blobs.read().unwrap().contains_key(address))
    }

    async fn delete(&self, address: &ContentAddress) -> ContentResult<()> {
        self.blobs.write().unwrap().remove(address);
        Ok(())
    }
}
