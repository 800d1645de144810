//! Access-control evaluator: pure, deterministic authorization decisions
//!
//! Consulted before every directory mutation. No side effects, no clock,
//! no store access, so it is independently testable against fixture
//! records.

use crate::directory::DirectoryRecord;
use crate::identity::Identity;

/// Policy tag that opens content to everyone
pub const PUBLIC_TAG: &str = "public";

/// Directory operations subject to authorization
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectoryOp {
    /// Read record metadata
    Read,
    /// Point the record at new content bytes
    UpdateContent,
    /// Replace the access-policy tag set
    UpdatePolicy,
    /// Add a cooperator
    GrantAccess,
    /// Remove a cooperator
    RevokeAccess,
}

impl DirectoryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryOp::Read => "read",
            DirectoryOp::UpdateContent => "update_content",
            DirectoryOp::UpdatePolicy => "update_policy",
            DirectoryOp::GrantAccess => "grant_access",
            DirectoryOp::RevokeAccess => "revoke_access",
        }
    }
}

/// Whether `actor` may perform `op` on `record`
///
/// Mutations are owner-only acts; metadata reads are public by design
/// (confidentiality of bytes is the content layer's job, not the
/// record's).
pub fn authorize(record: &DirectoryRecord, actor: &str, op: DirectoryOp) -> bool {
    match op {
        DirectoryOp::Read => true,
        DirectoryOp::UpdateContent
        | DirectoryOp::UpdatePolicy
        | DirectoryOp::GrantAccess
        | DirectoryOp::RevokeAccess => record.is_owner(actor),
    }
}

/// Whether `actor` may fetch the content bytes behind `record`
///
/// Owner and cooperators always may; otherwise the record's policy tags
/// decide: `"public"` admits everyone, and a tag equal to the actor's
/// group admits the group.
pub fn can_fetch_content(record: &DirectoryRecord, actor: &Identity) -> bool {
    if record.is_owner(&actor.id) || record.is_cooperator(&actor.id) {
        return true;
    }
    if record.access_policy.contains(PUBLIC_TAG) {
        return true;
    }
    record.access_policy.contains(&actor.group_tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CredentialCommitment;
    use std::collections::BTreeSet;

    fn record(policy: &[&str]) -> DirectoryRecord {
        let mut rec = DirectoryRecord::new(
            "f1".into(),
            "alice".into(),
            policy.iter().map(|s| s.to_string()).collect(),
        );
        rec.cooperators.insert("bob".into());
        rec
    }

    fn ident(id: &str, group: &str) -> Identity {
        Identity {
            id: id.into(),
            display_name: id.into(),
            credential_commitment: CredentialCommitment::from_secret(id.as_bytes()),
            group_tag: group.into(),
        }
    }

    #[test]
    fn test_mutations_are_owner_only() {
        let rec = record(&[]);
        for op in [
            DirectoryOp::UpdateContent,
            DirectoryOp::UpdatePolicy,
            DirectoryOp::GrantAccess,
            DirectoryOp::RevokeAccess,
        ] {
            assert!(authorize(&rec, "alice", op));
            assert!(!authorize(&rec, "bob", op), "cooperator passed {op:?}");
            assert!(!authorize(&rec, "mallory", op));
        }
    }

    #[test]
    fn test_reads_are_public() {
        let rec = record(&[]);
        assert!(authorize(&rec, "mallory", DirectoryOp::Read));
    }

    #[test]
    fn test_fetch_owner_and_cooperator() {
        let rec = record(&[]);
        assert!(can_fetch_content(&rec, &ident("alice", "orgA")));
        assert!(can_fetch_content(&rec, &ident("bob", "orgB")));
        assert!(!can_fetch_content(&rec, &ident("mallory", "orgC")));
    }

    #[test]
    fn test_fetch_public_tag() {
        let rec = record(&["public"]);
        assert!(can_fetch_content(&rec, &ident("mallory", "orgC")));
    }

    #[test]
    fn test_fetch_group_tag() {
        let rec = record(&["orgB"]);
        assert!(can_fetch_content(&rec, &ident("carol", "orgB")));
        assert!(!can_fetch_content(&rec, &ident("mallory", "orgC")));
    }
}
