//! Local filesystem content store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{ContentError, ContentResult};
use crate::traits::{ContentAddress, ContentStore};

/// Algorithm prefix for Blake3 addresses (enables future hash agility)
const HASH_ALG_PREFIX: &str = "b3";

/// Local filesystem content store
///
/// Stores blobs as files named by their base58 address with algorithm
/// prefix. Structure: `{root}/blobs/b3/{address_base58}`
pub struct LocalContentStore {
    root: PathBuf,
}

impl LocalContentStore {
    /// Create storage at the given root directory
    ///
    /// Creates the directory structure if it doesn't exist.
    pub async fn new(root: impl AsRef<Path>) -> ContentResult<Self> {
        let root = root.as_ref().to_path_buf();
        let blobs_dir = root.join("blobs").join(HASH_ALG_PREFIX);
        fs::create_dir_all(&blobs_dir).await?;
        Ok(Self { root })
    }

    fn blob_path(&self, address: &ContentAddress) -> PathBuf {
        self.root
            .join("blobs")
            .join(HASH_ALG_PREFIX)
            .join(address.to_base58())
    }
}

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn put(&self, data: &[u8]) -> ContentResult<ContentAddress> {
        let address = ContentAddress::of(data);
        let path = self.blob_path(&address);
        fs::write(&path, data).await?;
        Ok(address)
    }

    async fn get(&self, address: &ContentAddress) -> ContentResult<Vec<u8>> {
        let path = self.blob_path(address);
        match fs::read(&path).await {
            Ok(data) => {
                // Verify on read (defense in depth)
                let actual = ContentAddress::of(&data);
                if actual != *address {
                    return Err(ContentError::AddressMismatch {
                        expected: address.to_base58(),
                        actual: actual.to_base58(),
                    });
                }
                Ok(data)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ContentError::NotFound(address.to_base58()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, address: &ContentAddress) -> ContentResult<bool> {
        let path = self.blob_path(address);
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, address: &ContentAddress) -> ContentResult<()> {
        let path = self.blob_path(address);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
