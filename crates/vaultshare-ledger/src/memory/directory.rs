//! In-memory directory store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::directory::{DirectoryRecord, DirectoryStore};
use crate::error::{LedgerError, LedgerResult};

#[derive(Default)]
pub struct MemoryDirectoryStore {
    records: RwLock<HashMap<String, DirectoryRecord>>,
}

impl MemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of directory records
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectoryStore {
    async fn insert(&self, record: DirectoryRecord) -> LedgerResult<()> {
        let mut records = self.records.write().unwrap();
        if records.contains_key(&record.key) {
            return Err(LedgerError::AlreadyExists(format!(
                "directory {}",
                record.key
            )));
        }
        records.insert(record.key.clone(), record);
        Ok(())
    }

    async fn get(&self, key: &str) -> LedgerResult<DirectoryRecord> {
        self.records
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("directory {key}")))
    }

    async fn list(&self) -> LedgerResult<Vec<DirectoryRecord>> {
        let records = self.records.read().unwrap();
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(all)
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: DirectoryRecord,
    ) -> LedgerResult<()> {
        let mut records = self.records.write().unwrap();
        match records.get(&record.key) {
            Some(stored) if stored.version == expected_version => {
                records.insert(record.key.clone(), record);
                Ok(())
            }
            Some(stored) => Err(LedgerError::VersionConflict {
                expected: expected_version,
                actual: stored.version,
            }),
            None => Err(LedgerError::NotFound(format!("directory {}", record.key))),
        }
    }
}
