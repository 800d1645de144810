//! Local filesystem store integration tests

use vaultshare_store::{ContentAddress, ContentError, ContentStore, LocalContentStore};

#[tokio::test]
async fn test_local_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalContentStore::new(dir.path()).await.unwrap();

    let data = b"persistent payload";
    let address = store.put(data).await.unwrap();

    let retrieved = store.get(&address).await.unwrap();
    assert_eq!(retrieved, data);
    assert!(store.exists(&address).await.unwrap());
}

#[tokio::test]
async fn test_local_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let address = {
        let store = LocalContentStore::new(dir.path()).await.unwrap();
        store.put(b"durable bytes").await.unwrap()
    };

    let reopened = LocalContentStore::new(dir.path()).await.unwrap();
    let retrieved = reopened.get(&address).await.unwrap();
    assert_eq!(retrieved, b"durable bytes");
}

#[tokio::test]
async fn test_local_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalContentStore::new(dir.path()).await.unwrap();

    let result = store.get(&ContentAddress::of(b"never stored")).await;
    assert!(matches!(result, Err(ContentError::NotFound(_))));
}

#[tokio::test]
async fn test_local_detects_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalContentStore::new(dir.path()).await.unwrap();

    let address = store.put(b"original").await.unwrap();

    // Corrupt the blob behind the store's back
    let path = dir
        .path()
        .join("blobs")
        .join("b3")
        .join(address.to_base58());
    std::fs::write(&path, b"tampered").unwrap();

    let result = store.get(&address).await;
    assert!(matches!(result, Err(ContentError::AddressMismatch { .. })));
}

#[tokio::test]
async fn test_local_delete_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalContentStore::new(dir.path()).await.unwrap();

    let address = store.put(b"deleteme").await.unwrap();
    store.delete(&address).await.unwrap();
    assert!(!store.exists(&address).await.unwrap());

    // Delete again — still succeeds
    store.delete(&address).await.unwrap();
}
