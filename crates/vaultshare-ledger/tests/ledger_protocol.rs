//! Integration tests: registries, access evaluator, and proof gate together

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use vaultshare_ledger::{
    AttemptOutcome, AuditLog, CredentialCommitment, DirectoryRegistry, IdentityRegistry,
    LedgerError, MemoryAttemptStore, MemoryAuditLog, MemoryDirectoryStore, MemoryIdentityStore,
    MockVerdict, MockVerifier, ProofGate, ProofVerifier, VerificationStatus,
};

struct Fixture {
    identities: IdentityRegistry,
    directories: DirectoryRegistry,
    gate: ProofGate,
    audit: Arc<MemoryAuditLog>,
}

fn fixture_with(verifier: Arc<dyn ProofVerifier>) -> Fixture {
    let identity_store = Arc::new(MemoryIdentityStore::new());
    let directory_store = Arc::new(MemoryDirectoryStore::new());
    let attempt_store = Arc::new(MemoryAttemptStore::new());
    let audit = Arc::new(MemoryAuditLog::new());

    Fixture {
        identities: IdentityRegistry::new(identity_store.clone(), audit.clone()),
        directories: DirectoryRegistry::new(
            directory_store.clone(),
            identity_store.clone(),
            audit.clone(),
        ),
        gate: ProofGate::new(
            directory_store,
            identity_store,
            attempt_store,
            verifier,
            audit.clone(),
            b"verification-key".to_vec(),
        ),
        audit,
    }
}

fn fixture() -> Fixture {
    fixture_with(Arc::new(MockVerifier::accepting()))
}

async fn register(fx: &Fixture, id: &str, group: &str) {
    fx.identities
        .register(id, id, CredentialCommitment::from_secret(id.as_bytes()), group)
        .await
        .unwrap();
}

fn policy(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|s| s.to_string()).collect()
}

// Scenario A: duplicate registration

#[tokio::test]
async fn test_register_twice_fails() {
    let fx = fixture();
    fx.identities
        .register("alice", "Alice", CredentialCommitment::from_secret(b"pw"), "orgA")
        .await
        .unwrap();

    let result = fx
        .identities
        .register("alice", "Alice 2", CredentialCommitment::from_secret(b"pw2"), "orgB")
        .await;
    assert!(matches!(result, Err(LedgerError::AlreadyExists(_))));

    // First registration untouched
    let stored = fx.identities.lookup("alice").await.unwrap();
    assert_eq!(stored.display_name, "Alice");
}

#[tokio::test]
async fn test_verify_credential() {
    let fx = fixture();
    fx.identities
        .register("alice", "Alice", CredentialCommitment::from_secret(b"pw"), "orgA")
        .await
        .unwrap();

    assert!(fx
        .identities
        .verify_credential("alice", &CredentialCommitment::from_secret(b"pw"))
        .await
        .unwrap());
    assert!(!fx
        .identities
        .verify_credential("alice", &CredentialCommitment::from_secret(b"wrong"))
        .await
        .unwrap());
    // Unknown id is indistinguishable from a wrong credential
    assert!(!fx
        .identities
        .verify_credential("nobody", &CredentialCommitment::from_secret(b"pw"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_update_profile_holder_only() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    register(&fx, "bob", "orgB").await;

    let result = fx
        .identities
        .update_profile("alice", "bob", Some("Mallory".into()), None)
        .await;
    assert!(matches!(result, Err(LedgerError::NotAuthorized(_))));

    let updated = fx
        .identities
        .update_profile("alice", "alice", Some("Alice L.".into()), Some("orgC".into()))
        .await
        .unwrap();
    assert_eq!(updated.display_name, "Alice L.");
    assert_eq!(updated.group_tag, "orgC");
}

// Scenario B: create, publish content, stale version

#[tokio::test]
async fn test_publish_and_version_conflict() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;

    let rec = fx
        .directories
        .create_directory("f1", "alice", policy(&["public"]))
        .await
        .unwrap();
    assert_eq!(rec.version, 1);
    assert_eq!(rec.verification_status, VerificationStatus::Unset);

    let rec = fx
        .directories
        .update_content("f1", "alice", "Qm123", 1)
        .await
        .unwrap();
    assert_eq!(rec.version, 2);
    assert_eq!(rec.content_address.as_deref(), Some("Qm123"));

    // Stale expected version: fail fast, nothing changes
    let result = fx.directories.update_content("f1", "alice", "QmXYZ", 1).await;
    assert!(matches!(
        result,
        Err(LedgerError::VersionConflict {
            expected: 1,
            actual: 2
        })
    ));
    let rec = fx.directories.get_directory("f1").await.unwrap();
    assert_eq!(rec.version, 2);
    assert_eq!(rec.content_address.as_deref(), Some("Qm123"));
}

#[tokio::test]
async fn test_create_requires_known_owner() {
    let fx = fixture();
    let result = fx
        .directories
        .create_directory("f1", "ghost", policy(&[]))
        .await;
    assert!(matches!(result, Err(LedgerError::UnknownIdentity(_))));
}

#[tokio::test]
async fn test_duplicate_key_rejected() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    register(&fx, "bob", "orgB").await;

    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();
    let result = fx.directories.create_directory("f1", "bob", policy(&[])).await;
    assert!(matches!(result, Err(LedgerError::AlreadyExists(_))));

    // Owner immutability: the original owner survives the collision
    assert!(fx.directories.check_ownership("f1", "alice").await.unwrap());
    assert!(!fx.directories.check_ownership("f1", "bob").await.unwrap());
}

// Scenario C: grants are owner-only

#[tokio::test]
async fn test_grant_and_cooperator_cannot_grant() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    register(&fx, "bob", "orgB").await;
    register(&fx, "carol", "orgC").await;

    fx.directories
        .create_directory("f1", "alice", policy(&["public"]))
        .await
        .unwrap();
    fx.directories
        .update_content("f1", "alice", "Qm123", 1)
        .await
        .unwrap();

    let rec = fx.directories.grant_access("f1", "alice", "bob", 2).await.unwrap();
    assert_eq!(rec.version, 3);
    assert!(rec.is_cooperator("bob"));

    // Bob is a cooperator, not the owner
    let result = fx.directories.grant_access("f1", "bob", "carol", 3).await;
    assert!(matches!(result, Err(LedgerError::NotAuthorized(_))));
    let rec = fx.directories.get_directory("f1").await.unwrap();
    assert_eq!(rec.version, 3);
    assert!(!rec.is_cooperator("carol"));
}

#[tokio::test]
async fn test_grant_unknown_identity() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();

    let result = fx.directories.grant_access("f1", "alice", "ghost", 1).await;
    assert!(matches!(result, Err(LedgerError::UnknownIdentity(_))));
}

#[tokio::test]
async fn test_grant_idempotent_still_bumps_version() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    register(&fx, "bob", "orgB").await;
    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();

    let rec = fx.directories.grant_access("f1", "alice", "bob", 1).await.unwrap();
    assert_eq!(rec.version, 2);
    let rec = fx.directories.grant_access("f1", "alice", "bob", 2).await.unwrap();
    assert_eq!(rec.version, 3);
    assert_eq!(rec.cooperators.len(), 1);

    // Both intents made the audit trail
    let entries = fx.audit.entries_for("f1").await.unwrap();
    let grants = entries
        .iter()
        .filter(|e| e.event.operation == "grant_access")
        .count();
    assert_eq!(grants, 2);
}

#[tokio::test]
async fn test_grant_owner_never_enters_cooperators() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();

    let rec = fx.directories.grant_access("f1", "alice", "alice", 1).await.unwrap();
    assert_eq!(rec.version, 2);
    assert!(rec.cooperators.is_empty());
}

#[tokio::test]
async fn test_revoke_access() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    register(&fx, "bob", "orgB").await;
    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();
    fx.directories.grant_access("f1", "alice", "bob", 1).await.unwrap();

    let rec = fx.directories.revoke_access("f1", "alice", "bob", 2).await.unwrap();
    assert_eq!(rec.version, 3);
    assert!(!rec.is_cooperator("bob"));

    // Revoking a non-member is a version-bumping no-op
    let rec = fx.directories.revoke_access("f1", "alice", "bob", 3).await.unwrap();
    assert_eq!(rec.version, 4);
}

#[tokio::test]
async fn test_owner_rights_cannot_be_revoked() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();

    let result = fx.directories.revoke_access("f1", "alice", "alice", 1).await;
    assert!(matches!(result, Err(LedgerError::NotAuthorized(_))));
    let rec = fx.directories.get_directory("f1").await.unwrap();
    assert_eq!(rec.version, 1);
}

#[tokio::test]
async fn test_update_policy_owner_only() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    register(&fx, "bob", "orgB").await;
    fx.directories
        .create_directory("f1", "alice", policy(&["public"]))
        .await
        .unwrap();

    let result = fx
        .directories
        .update_policy("f1", "bob", policy(&["orgB"]), 1)
        .await;
    assert!(matches!(result, Err(LedgerError::NotAuthorized(_))));

    let rec = fx
        .directories
        .update_policy("f1", "alice", policy(&["orgB"]), 1)
        .await
        .unwrap();
    assert_eq!(rec.version, 2);
    assert!(!rec.access_policy.contains("public"));
    assert!(rec.access_policy.contains("orgB"));
}

// Scenario D: proof gate

#[tokio::test]
async fn test_proof_lifecycle_and_stickiness() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    fx.directories
        .create_directory("f1", "alice", policy(&["public"]))
        .await
        .unwrap();

    // First submission opens an attempt and marks the record pending
    let attempt1 = fx
        .gate
        .submit_proof("f1", "alice", b"proofA", b"pubA")
        .await
        .unwrap();
    assert_eq!(attempt1.outcome, AttemptOutcome::Pending);
    let rec = fx.directories.get_directory("f1").await.unwrap();
    assert_eq!(rec.verification_status, VerificationStatus::Pending);

    // A second submission while pending is refused
    let result = fx.gate.submit_proof("f1", "alice", b"proofB", b"pubB").await;
    assert!(matches!(result, Err(LedgerError::AlreadyPending(_))));

    // Valid verdict lands on the record
    let rec = fx.gate.apply_verdict(attempt1.id, true).await.unwrap();
    assert_eq!(rec.verification_status, VerificationStatus::Valid);

    // A later failed attempt does not downgrade proven ownership
    let attempt2 = fx
        .gate
        .submit_proof("f1", "alice", b"proofB", b"pubB")
        .await
        .unwrap();
    let rec = fx.gate.apply_verdict(attempt2.id, false).await.unwrap();
    assert_eq!(rec.verification_status, VerificationStatus::Valid);
    assert_eq!(
        fx.gate
            .apply_verdict(attempt2.id, false)
            .await
            .unwrap()
            .verification_status,
        VerificationStatus::Valid
    );
}

#[tokio::test]
async fn test_invalid_then_valid_recovers() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();

    let attempt = fx
        .gate
        .submit_proof("f1", "alice", b"bad", b"pub")
        .await
        .unwrap();
    let rec = fx.gate.apply_verdict(attempt.id, false).await.unwrap();
    assert_eq!(rec.verification_status, VerificationStatus::Invalid);

    // Re-submission after a failure is allowed and can still prove ownership
    let attempt = fx
        .gate
        .submit_proof("f1", "alice", b"good", b"pub")
        .await
        .unwrap();
    let rec = fx.gate.apply_verdict(attempt.id, true).await.unwrap();
    assert_eq!(rec.verification_status, VerificationStatus::Valid);
}

#[tokio::test]
async fn test_execute_with_accepting_verifier() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();

    let attempt = fx
        .gate
        .submit_proof("f1", "alice", b"proof", b"pub")
        .await
        .unwrap();
    let rec = fx
        .gate
        .execute(attempt.id, b"proof", b"pub", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(rec.verification_status, VerificationStatus::Valid);
}

#[tokio::test]
async fn test_execute_malformed_counts_as_invalid() {
    let fx = fixture_with(Arc::new(MockVerifier::new(MockVerdict::Malformed)));
    register(&fx, "alice", "orgA").await;
    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();

    let attempt = fx
        .gate
        .submit_proof("f1", "alice", b"garbage", b"pub")
        .await
        .unwrap();
    let rec = fx
        .gate
        .execute(attempt.id, b"garbage", b"pub", Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(rec.verification_status, VerificationStatus::Invalid);
}

#[tokio::test]
async fn test_execute_unavailable_leaves_pending() {
    let fx = fixture_with(Arc::new(MockVerifier::new(MockVerdict::Unavailable)));
    register(&fx, "alice", "orgA").await;
    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();

    let attempt = fx
        .gate
        .submit_proof("f1", "alice", b"proof", b"pub")
        .await
        .unwrap();
    let result = fx
        .gate
        .execute(attempt.id, b"proof", b"pub", Duration::from_secs(5))
        .await;
    assert!(matches!(result, Err(LedgerError::VerifierUnavailable(_))));

    // A stalled verifier must not indict real ownership
    let rec = fx.directories.get_directory("f1").await.unwrap();
    assert_eq!(rec.verification_status, VerificationStatus::Pending);

    // The same attempt can be retried once the verifier is back
    let rec = fx.gate.apply_verdict(attempt.id, true).await.unwrap();
    assert_eq!(rec.verification_status, VerificationStatus::Valid);
}

#[tokio::test]
async fn test_execute_rejects_swapped_proof_bytes() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();

    let attempt = fx
        .gate
        .submit_proof("f1", "alice", b"proof", b"pub")
        .await
        .unwrap();
    let result = fx
        .gate
        .execute(attempt.id, b"other", b"pub", Duration::from_secs(5))
        .await;
    assert!(matches!(result, Err(LedgerError::MalformedProof(_))));
}

#[tokio::test]
async fn test_submit_proof_missing_directory() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;

    let result = fx.gate.submit_proof("ghost", "alice", b"p", b"i").await;
    assert!(matches!(result, Err(LedgerError::NotFound(_))));
}

// Cross-cutting properties

#[tokio::test]
async fn test_versions_are_dense_across_mixed_mutations() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    register(&fx, "bob", "orgB").await;

    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();
    let mut expected = 1u64;
    for (i, addr) in ["QmA", "QmB", "QmC"].iter().enumerate() {
        let rec = fx
            .directories
            .update_content("f1", "alice", addr, expected)
            .await
            .unwrap();
        expected += 1;
        assert_eq!(rec.version, expected, "mutation {i}");
    }
    let rec = fx
        .directories
        .grant_access("f1", "alice", "bob", expected)
        .await
        .unwrap();
    assert_eq!(rec.version, expected + 1);
}

#[tokio::test]
async fn test_concurrent_writers_no_lost_update() {
    let fx = Arc::new(fixture());
    register(&fx, "alice", "orgA").await;
    register(&fx, "bob", "orgB").await;
    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();

    // Two writers race on the same expected version; exactly one wins
    let a = {
        let fx = fx.clone();
        tokio::spawn(async move { fx.directories.update_content("f1", "alice", "QmA", 1).await })
    };
    let b = {
        let fx = fx.clone();
        tokio::spawn(async move { fx.directories.grant_access("f1", "alice", "bob", 1).await })
    };

    let outcomes = [a.await.unwrap(), b.await.unwrap()];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::VersionConflict { .. })))
        .count();
    assert_eq!(wins, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(fx.directories.get_directory("f1").await.unwrap().version, 2);
}

#[tokio::test]
async fn test_audit_trail_orders_accepted_operations() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    register(&fx, "bob", "orgB").await;

    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();
    fx.directories
        .update_content("f1", "alice", "Qm123", 1)
        .await
        .unwrap();
    fx.directories.grant_access("f1", "alice", "bob", 2).await.unwrap();

    // A rejected mutation leaves no trace
    let _ = fx.directories.update_content("f1", "bob", "QmEvil", 3).await;

    let entries = fx.audit.entries_for("f1").await.unwrap();
    let ops: Vec<&str> = entries.iter().map(|e| e.event.operation.as_str()).collect();
    assert_eq!(ops, ["create_directory", "update_content", "grant_access"]);
    assert!(entries.windows(2).all(|w| w[0].seq < w[1].seq));
}

#[tokio::test]
async fn test_list_directories_ordered_by_key() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;

    for key in ["f3", "f1", "f2"] {
        fx.directories
            .create_directory(key, "alice", policy(&[]))
            .await
            .unwrap();
    }

    let keys: Vec<String> = fx
        .directories
        .list_directories()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.key)
        .collect();
    assert_eq!(keys, ["f1", "f2", "f3"]);
}

#[tokio::test]
async fn test_directory_history_reads_like_the_audit_trail() {
    let fx = fixture();
    register(&fx, "alice", "orgA").await;
    register(&fx, "bob", "orgB").await;

    fx.directories
        .create_directory("f1", "alice", policy(&[]))
        .await
        .unwrap();
    fx.directories.grant_access("f1", "alice", "bob", 1).await.unwrap();

    let history = fx.directories.directory_history("f1").await.unwrap();
    let ops: Vec<&str> = history.iter().map(|e| e.event.operation.as_str()).collect();
    assert_eq!(ops, ["create_directory", "grant_access"]);

    // A key that was never created is an error, not an empty history
    let result = fx.directories.directory_history("ghost").await;
    assert!(matches!(result, Err(LedgerError::NotFound(_))));
}
