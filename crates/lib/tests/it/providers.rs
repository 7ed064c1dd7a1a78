//! Tests for auth providers and their initialization order.

use keyward::{
    config::ProviderConfig,
    provider::{AuthProvider, LocalAuthProvider, ProviderError, load_auth_providers},
};

#[tokio::test]
async fn test_validate_rejects_unknown_users_and_wrong_passwords_alike() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut provider = LocalAuthProvider::new(None, dir.path());
    provider.initialize().await.expect("Failed to initialize");
    provider
        .add_credential("alice", "secret")
        .expect("Failed to add credential");

    let creds = provider
        .validate("alice", "secret")
        .expect("Valid credentials rejected");
    assert!(creds.is_from(&provider));

    let wrong_password = provider.validate("alice", "Secret").unwrap_err();
    let unknown_user = provider.validate("mallory", "secret").unwrap_err();
    assert!(wrong_password.is_invalid_credential());
    assert!(unknown_user.is_invalid_credential());
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

#[tokio::test]
async fn test_every_operation_before_initialize_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut provider = LocalAuthProvider::new(None, dir.path());
    assert!(!provider.is_initialized());

    let errors = [
        provider.validate("alice", "pw").unwrap_err(),
        provider.add_credential("alice", "pw").unwrap_err(),
        provider.remove_credential("alice").unwrap_err(),
        provider.change_password("alice", "pw").unwrap_err(),
        provider.save().await.unwrap_err(),
    ];
    for err in errors {
        assert!(err.is_initialization_error(), "{err}");
    }
    // Nothing was written
    assert!(!dir.path().join(provider.storage_key()).exists());
}

#[tokio::test]
async fn test_initialize_twice_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut provider = LocalAuthProvider::new(Some("ci".into()), dir.path());
    provider.initialize().await.expect("Failed to initialize");
    let err = provider.initialize().await.unwrap_err();
    assert!(matches!(
        err,
        keyward::Error::Provider(ProviderError::AlreadyInitialized { .. })
    ));
}

#[tokio::test]
async fn test_initialize_loads_saved_credentials() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut provider = LocalAuthProvider::new(Some("ci".into()), dir.path());
    provider.initialize().await.expect("Failed to initialize");
    provider
        .add_credential("alice", "secret")
        .expect("Failed to add credential");
    provider.save().await.expect("Failed to save");
    assert!(dir.path().join("auth_provider.local.ci").exists());

    let mut reloaded = LocalAuthProvider::new(Some("ci".into()), dir.path());
    reloaded.initialize().await.expect("Failed to initialize");
    assert!(reloaded.validate("alice", "secret").is_ok());

    // A provider without the id uses a different document
    let mut other = LocalAuthProvider::new(None, dir.path());
    other.initialize().await.expect("Failed to initialize");
    assert!(other.validate("alice", "secret").is_err());
}

#[test]
fn test_load_auth_providers_checks_configuration() {
    let dir = std::path::Path::new("/nonexistent");

    let providers = load_auth_providers(
        &[
            ProviderConfig::local(),
            ProviderConfig {
                provider_type: "local".into(),
                id: Some("ci".into()),
            },
        ],
        dir,
    )
    .expect("Failed to load providers");
    assert_eq!(
        providers.iter().map(|p| p.label()).collect::<Vec<_>>(),
        ["local", "local:ci"]
    );
    assert!(providers.iter().all(|p| !p.is_initialized()));

    let err = load_auth_providers(&[ProviderConfig::local(), ProviderConfig::local()], dir)
        .unwrap_err();
    assert!(matches!(
        err,
        keyward::Error::Provider(ProviderError::DuplicateProvider { .. })
    ));

    let err = load_auth_providers(
        &[ProviderConfig {
            provider_type: "ldap".into(),
            id: None,
        }],
        dir,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        keyward::Error::Provider(ProviderError::UnknownProviderType { .. })
    ));
}
