//! Identity and directory registries
//!
//! Thin facades over the store traits: they authorize through the access
//! evaluator, commit state through version compare-and-swap, and append an
//! audit entry for every accepted mutation.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::access::{self, DirectoryOp};
use crate::audit::{AuditEntry, AuditEvent, AuditLog};
use crate::directory::{DirectoryRecord, DirectoryStore};
use crate::error::{LedgerError, LedgerResult};
use crate::identity::{CredentialCommitment, Identity, IdentityStore};

/// Registration and credential checks for identities
pub struct IdentityRegistry {
    store: Arc<dyn IdentityStore>,
    audit: Arc<dyn AuditLog>,
}

impl IdentityRegistry {
    pub fn new(store: Arc<dyn IdentityStore>, audit: Arc<dyn AuditLog>) -> Self {
        Self { store, audit }
    }

    /// Register a new identity, `AlreadyExists` if the id is taken
    pub async fn register(
        &self,
        id: &str,
        display_name: &str,
        credential_commitment: CredentialCommitment,
        group_tag: &str,
    ) -> LedgerResult<Identity> {
        let identity = Identity {
            id: id.into(),
            display_name: display_name.into(),
            credential_commitment,
            group_tag: group_tag.into(),
        };
        self.store.insert(identity.clone()).await?;
        self.audit
            .append(AuditEvent::new("register", id, id))
            .await?;
        tracing::info!(id, group = group_tag, "identity registered");
        Ok(identity)
    }

    pub async fn lookup(&self, id: &str) -> LedgerResult<Identity> {
        self.store.get(id).await
    }

    /// Constant-time credential check
    ///
    /// An unknown id yields `false` rather than `NotFound`, so the check
    /// is not an enumeration oracle. The stored commitment is never
    /// returned or logged.
    pub async fn verify_credential(
        &self,
        id: &str,
        candidate: &CredentialCommitment,
    ) -> LedgerResult<bool> {
        match self.store.get(id).await {
            Ok(identity) => Ok(identity.credential_commitment.matches(candidate)),
            Err(LedgerError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Update the holder-mutable profile fields
    ///
    /// Only the identity's own holder may change them; `id` and the
    /// credential commitment are immutable.
    pub async fn update_profile(
        &self,
        id: &str,
        actor: &str,
        display_name: Option<String>,
        group_tag: Option<String>,
    ) -> LedgerResult<Identity> {
        if actor != id {
            return Err(LedgerError::NotAuthorized(
                "only the holder may update a profile".into(),
            ));
        }
        let mut identity = self.store.get(id).await?;
        if let Some(name) = display_name {
            identity.display_name = name;
        }
        if let Some(tag) = group_tag {
            identity.group_tag = tag;
        }
        self.store.update(identity.clone()).await?;
        self.audit
            .append(AuditEvent::new("update_profile", id, actor))
            .await?;
        Ok(identity)
    }
}

/// Directory record lifecycle and access-control mutations
pub struct DirectoryRegistry {
    directories: Arc<dyn DirectoryStore>,
    identities: Arc<dyn IdentityStore>,
    audit: Arc<dyn AuditLog>,
}

impl DirectoryRegistry {
    pub fn new(
        directories: Arc<dyn DirectoryStore>,
        identities: Arc<dyn IdentityStore>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            directories,
            identities,
            audit,
        }
    }

    /// Publish a new directory record owned by `owner`
    pub async fn create_directory(
        &self,
        key: &str,
        owner: &str,
        access_policy: BTreeSet<String>,
    ) -> LedgerResult<DirectoryRecord> {
        if !self.identities.exists(owner).await? {
            return Err(LedgerError::UnknownIdentity(owner.into()));
        }
        let record = DirectoryRecord::new(key.into(), owner.into(), access_policy);
        self.directories.insert(record.clone()).await?;
        self.audit
            .append(AuditEvent::new("create_directory", key, owner).version(record.version))
            .await?;
        tracing::info!(key, owner, "directory created");
        Ok(record)
    }

    /// Point the record at re-uploaded content; owner-only
    pub async fn update_content(
        &self,
        key: &str,
        actor: &str,
        new_content_address: &str,
        expected_version: u64,
    ) -> LedgerResult<DirectoryRecord> {
        self.mutate(
            key,
            actor,
            DirectoryOp::UpdateContent,
            expected_version,
            new_content_address.to_string(),
            |record| {
                record.content_address = Some(new_content_address.into());
            },
        )
        .await
    }

    /// Replace the access-policy tag set; owner-only
    pub async fn update_policy(
        &self,
        key: &str,
        actor: &str,
        access_policy: BTreeSet<String>,
        expected_version: u64,
    ) -> LedgerResult<DirectoryRecord> {
        let detail = access_policy.iter().cloned().collect::<Vec<_>>().join(",");
        self.mutate(
            key,
            actor,
            DirectoryOp::UpdatePolicy,
            expected_version,
            detail,
            |record| {
                record.access_policy = access_policy.clone();
            },
        )
        .await
    }

    /// Add `grantee` to the cooperator set; owner-only
    ///
    /// Idempotent: granting an existing cooperator (or the owner, who has
    /// implicit rights) still bumps the version and is audited, so the
    /// audit trail totally orders intents.
    pub async fn grant_access(
        &self,
        key: &str,
        actor: &str,
        grantee: &str,
        expected_version: u64,
    ) -> LedgerResult<DirectoryRecord> {
        if !self.identities.exists(grantee).await? {
            return Err(LedgerError::UnknownIdentity(grantee.into()));
        }
        self.mutate(
            key,
            actor,
            DirectoryOp::GrantAccess,
            expected_version,
            grantee.to_string(),
            |record| {
                // The owner never enters the set; implicit rights suffice
                if record.owner != grantee {
                    record.cooperators.insert(grantee.into());
                }
            },
        )
        .await
    }

    /// Remove `target` from the cooperator set; owner-only
    ///
    /// Owner rights cannot be revoked this way; removing a non-member is
    /// a version-bumping no-op.
    pub async fn revoke_access(
        &self,
        key: &str,
        actor: &str,
        target: &str,
        expected_version: u64,
    ) -> LedgerResult<DirectoryRecord> {
        let record = self.directories.get(key).await?;
        if record.is_owner(target) {
            return Err(LedgerError::NotAuthorized(
                "owner rights cannot be revoked".into(),
            ));
        }
        self.mutate(
            key,
            actor,
            DirectoryOp::RevokeAccess,
            expected_version,
            target.to_string(),
            |record| {
                record.cooperators.remove(target);
            },
        )
        .await
    }

    /// Read a record; metadata is public, no authorization required
    pub async fn get_directory(&self, key: &str) -> LedgerResult<DirectoryRecord> {
        self.directories.get(key).await
    }

    /// All records ordered by key; metadata is public
    pub async fn list_directories(&self) -> LedgerResult<Vec<DirectoryRecord>> {
        self.directories.list().await
    }

    /// Audit trail of one record, `NotFound` if the key was never created
    pub async fn directory_history(&self, key: &str) -> LedgerResult<Vec<AuditEntry>> {
        self.directories.get(key).await?;
        self.audit.entries_for(key).await
    }

    /// Whether `candidate` is the record's owner
    pub async fn check_ownership(&self, key: &str, candidate: &str) -> LedgerResult<bool> {
        Ok(self.directories.get(key).await?.is_owner(candidate))
    }

    /// Authorize, apply, and audit one mutation as a single transition
    ///
    /// Checks run in a fixed order: existence, authorization, then the
    /// version CAS - `NotAuthorized` wins over `VersionConflict` so a
    /// non-owner cannot probe version numbers.
    async fn mutate(
        &self,
        key: &str,
        actor: &str,
        op: DirectoryOp,
        expected_version: u64,
        detail: String,
        apply: impl FnOnce(&mut DirectoryRecord),
    ) -> LedgerResult<DirectoryRecord> {
        let record = self.directories.get(key).await?;
        if !access::authorize(&record, actor, op) {
            return Err(LedgerError::NotAuthorized(format!(
                "{} requires ownership of {key}",
                op.as_str()
            )));
        }

        let mut updated = record.clone();
        apply(&mut updated);
        updated.version = expected_version + 1;

        self.directories
            .compare_and_swap(expected_version, updated.clone())
            .await?;
        self.audit
            .append(
                AuditEvent::new(op.as_str(), key, actor)
                    .version(updated.version)
                    .detail(detail),
            )
            .await?;
        tracing::debug!(key, actor, op = op.as_str(), version = updated.version, "mutation applied");
        Ok(updated)
    }
}
