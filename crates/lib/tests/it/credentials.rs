//! Tests for the credential store.

use keyward::credentials::{CredentialError, CredentialStore};

const KEY: &str = "auth_provider.local";

#[tokio::test]
async fn test_added_credentials_verify() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = CredentialStore::load(dir.path(), KEY)
        .await
        .expect("Failed to load store");
    assert!(store.is_empty());

    let pairs = [("alice", "correct horse"), ("bob", ""), ("Alice", "battery staple")];
    for (username, password) in pairs {
        store
            .add_credential(username, password)
            .expect("Failed to add credential");
    }

    for (username, password) in pairs {
        assert!(store.verify_credential(username, password).expect("Verify failed"));
        assert!(!store.verify_credential(username, "wrong").expect("Verify failed"));
    }

    // Usernames are case sensitive
    assert!(!store.verify_credential("alice", "battery staple").expect("Verify failed"));
    assert_eq!(store.usernames().collect::<Vec<_>>(), ["Alice", "alice", "bob"]);
}

#[tokio::test]
async fn test_duplicate_username_leaves_store_unchanged() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = CredentialStore::initialize_empty(dir.path(), KEY);
    store
        .add_credential("alice", "first")
        .expect("Failed to add credential");
    let before = store.snapshot().clone();

    let err = store.add_credential("alice", "second").unwrap_err();
    assert!(err.is_conflict());
    assert!(matches!(
        err,
        keyward::Error::Credential(CredentialError::DuplicateUsername { .. })
    ));

    assert_eq!(store.snapshot(), &before);
    assert!(store.verify_credential("alice", "first").expect("Verify failed"));
    assert!(!store.verify_credential("alice", "second").expect("Verify failed"));
}

#[tokio::test]
async fn test_unknown_username_is_not_found() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = CredentialStore::initialize_empty(dir.path(), KEY);
    let err = store.verify_credential("nobody", "pw").unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_empty_username_rejected() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = CredentialStore::initialize_empty(dir.path(), KEY);
    let err = store.add_credential("", "pw").unwrap_err();
    assert!(err.is_validation_error());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_save_then_load() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = CredentialStore::initialize_empty(dir.path(), KEY);
    store
        .add_credential("alice", "pw")
        .expect("Failed to add credential");
    store.save().await.expect("Failed to save");
    assert_eq!(store.path(), dir.path().join(KEY));

    let loaded = CredentialStore::load(dir.path(), KEY)
        .await
        .expect("Failed to load store");
    assert_eq!(loaded.snapshot(), store.snapshot());
    assert!(loaded.verify_credential("alice", "pw").expect("Verify failed"));
}

#[tokio::test]
async fn test_save_of_loaded_store_is_byte_identical() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = CredentialStore::initialize_empty(dir.path(), KEY);
    for username in ["carol", "alice", "bob"] {
        store
            .add_credential(username, "pw")
            .expect("Failed to add credential");
    }
    store.save().await.expect("Failed to save");
    let first = std::fs::read(store.path()).expect("Failed to read document");

    let loaded = CredentialStore::load(dir.path(), KEY)
        .await
        .expect("Failed to load store");
    loaded.save().await.expect("Failed to save");
    let second = std::fs::read(loaded.path()).expect("Failed to read document");

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_password_change_and_removal() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut store = CredentialStore::initialize_empty(dir.path(), KEY);
    store
        .add_credential("alice", "old")
        .expect("Failed to add credential");
    store.add_credential("bob", "pw").expect("Failed to add credential");

    store
        .change_password("alice", "new")
        .expect("Failed to change password");
    assert!(!store.verify_credential("alice", "old").expect("Verify failed"));
    assert!(store.verify_credential("alice", "new").expect("Verify failed"));

    store
        .remove_credential("alice")
        .expect("Failed to remove credential");
    assert_eq!(store.len(), 1);
    assert!(store.remove_credential("alice").unwrap_err().is_not_found());
    assert!(store.verify_credential("alice", "new").unwrap_err().is_not_found());
}
