//! In-memory identity store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{LedgerError, LedgerResult};
use crate::identity::{Identity, IdentityStore};

#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: RwLock<HashMap<String, Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered identities
    pub fn len(&self) -> usize {
        self.identities.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn insert(&self, identity: Identity) -> LedgerResult<()> {
        let mut identities = self.identities.write().unwrap();
        if identities.contains_key(&identity.id) {
            return Err(LedgerError::AlreadyExists(format!(
                "identity {}",
                identity.id
            )));
        }
        identities.insert(identity.id.clone(), identity);
        Ok(())
    }

    async fn get(&self, id: &str) -> LedgerResult<Identity> {
        self.identities
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("identity {id}")))
    }

    async fn update(&self, identity: Identity) -> LedgerResult<()> {
        let mut identities = self.identities.write().unwrap();
        match identities.get_mut(&identity.id) {
            Some(existing) => {
                *existing = identity;
                Ok(())
            }
            None => Err(LedgerError::NotFound(format!("identity {}", identity.id))),
        }
    }
}
