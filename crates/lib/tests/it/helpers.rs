use std::sync::Arc;

use keyward::{
    AuthConfig, AuthManager, FixedClock,
    constants::{GROUP_ID_ADMIN, LOCAL_PROVIDER_TYPE},
    identity::{User, UserUpdate},
};
use tempfile::TempDir;

// Re-export tokio test macro for convenience
pub use tokio;

/// A manager over a fresh temporary storage directory and a frozen clock.
///
/// The directory lives as long as the returned `TempDir`.
pub async fn test_manager() -> (TempDir, Arc<FixedClock>, AuthManager) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let clock = Arc::new(FixedClock::default());
    let manager = open_manager(&dir, clock.clone()).await;
    (dir, clock, manager)
}

/// Open a manager over an existing storage directory.
pub async fn open_manager(dir: &TempDir, clock: Arc<FixedClock>) -> AuthManager {
    AuthManager::open_with_clock(AuthConfig::new(dir.path()), clock)
        .await
        .expect("Failed to open auth manager")
}

/// Same as [`test_manager`] with the local provider initialized.
pub async fn test_manager_with_provider() -> (TempDir, Arc<FixedClock>, AuthManager) {
    let (dir, clock, mut manager) = test_manager().await;
    manager
        .initialize_providers()
        .await
        .expect("Failed to initialize providers");
    (dir, clock, manager)
}

/// Register `username`/`password` with the local provider and link it to a
/// new active admin user.
pub fn create_active_admin(manager: &mut AuthManager, username: &str, password: &str) -> User {
    let provider = manager
        .auth_provider_mut(LOCAL_PROVIDER_TYPE, None)
        .expect("Local provider missing");
    provider
        .add_credential(username, password)
        .expect("Failed to add credential");
    let credentials = provider.credentials_for(username);

    let user = manager
        .create_user(username, [GROUP_ID_ADMIN])
        .expect("Failed to create user");
    manager
        .link_credentials(user.id(), credentials)
        .expect("Failed to link credentials");
    manager
        .update_user(user.id(), UserUpdate::activate())
        .expect("Failed to activate user")
}

/// Random lowercase ASCII string, as used for throwaway service accounts.
pub fn random_lowercase(len: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..len).map(|_| char::from(rng.gen_range(b'a'..=b'z'))).collect()
}
