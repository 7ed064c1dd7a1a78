//! Tests for users, groups and credential linkage through the AuthManager.

use chrono::Duration;
use keyward::{
    Clock,
    constants::{GROUP_ID_ADMIN, GROUP_ID_READ_ONLY, GROUP_ID_USER},
    identity::UserUpdate,
    token::RefreshTokenOptions,
};

use crate::helpers::*;

#[tokio::test]
async fn test_builtin_groups_exist() {
    let (_dir, _clock, manager) = test_manager().await;
    let ids: Vec<_> = manager.directory().groups().map(|g| g.id.as_str()).collect();
    for id in [GROUP_ID_ADMIN, GROUP_ID_USER, GROUP_ID_READ_ONLY] {
        assert!(ids.contains(&id), "missing {id}");
    }
}

#[tokio::test]
async fn test_user_lifecycle() {
    let (_dir, clock, mut manager) = test_manager().await;

    let user = manager
        .create_user("Build bot", [GROUP_ID_USER])
        .expect("Failed to create user");
    assert!(!user.is_active());
    assert_eq!(user.created_at(), clock.now());
    assert_eq!(user.id().len(), 32);

    let user = manager
        .update_user(
            user.id(),
            UserUpdate::activate()
                .with_name("Deploy bot")
                .with_groups([GROUP_ID_ADMIN]),
        )
        .expect("Failed to update user");
    assert!(user.is_active());
    assert!(user.is_admin());
    assert!(!user.in_group(GROUP_ID_USER));
    assert_eq!(user.name(), "Deploy bot");
    assert_eq!(manager.directory().find_user(user.id()), Some(&user));
}

#[tokio::test]
async fn test_update_unknown_user_is_not_found() {
    let (_dir, _clock, mut manager) = test_manager().await;
    let err = manager
        .update_user("missing", UserUpdate::activate())
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.module(), "identity");
}

#[tokio::test]
async fn test_unknown_group_is_rejected() {
    let (_dir, _clock, mut manager) = test_manager().await;
    assert!(manager.create_user("x", ["superusers"]).unwrap_err().is_not_found());
    assert_eq!(manager.directory().users().count(), 0);
}

#[tokio::test]
async fn test_deactivation_is_terminal_and_revokes_tokens() {
    let (_dir, clock, mut manager) = test_manager_with_provider().await;
    let user = create_active_admin(&mut manager, "svc", "pw");
    let token = manager
        .create_refresh_token(
            user.id(),
            RefreshTokenOptions::long_lived("action-runner", Duration::hours(4)),
        )
        .expect("Failed to create refresh token");

    clock.advance(Duration::minutes(5));
    let user = manager
        .update_user(user.id(), UserUpdate::deactivate())
        .expect("Failed to deactivate user");
    assert_eq!(user.deactivated_at(), Some(clock.now()));

    let stored = manager
        .tokens()
        .find_token(token.id())
        .expect("Token missing");
    assert_eq!(stored.revoked_at(), Some(clock.now()));
    assert!(manager.login("svc", "pw").unwrap_err().is_inactive_user());

    let err = manager
        .update_user(user.id(), UserUpdate::activate())
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(err.is_inactive_user());
}

#[tokio::test]
async fn test_inactive_users_cannot_get_tokens() {
    let (_dir, _clock, mut manager) = test_manager().await;
    let user = manager
        .create_user("idle", Vec::<String>::new())
        .expect("Failed to create user");
    let err = manager
        .create_refresh_token(user.id(), RefreshTokenOptions::normal("web"))
        .unwrap_err();
    assert!(err.is_inactive_user());
    assert_eq!(manager.tokens().tokens().count(), 0);

    let err = manager
        .create_refresh_token("missing", RefreshTokenOptions::normal("web"))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_login_resolves_linked_user() {
    let (_dir, _clock, mut manager) = test_manager_with_provider().await;
    let alice = create_active_admin(&mut manager, "alice", "secret");
    create_active_admin(&mut manager, "bob", "hunter2");

    let user = manager.login("alice", "secret").expect("Login failed");
    assert_eq!(user.id(), alice.id());
    assert!(manager.login("alice", "hunter2").unwrap_err().is_invalid_credential());
    assert!(manager.login("carol", "secret").unwrap_err().is_invalid_credential());
}

#[tokio::test]
async fn test_credentials_link_to_one_user() {
    let (_dir, _clock, mut manager) = test_manager_with_provider().await;
    let alice = create_active_admin(&mut manager, "alice", "secret");
    let bob = manager
        .create_user("bob", Vec::<String>::new())
        .expect("Failed to create user");

    let creds = alice.credentials()[0].clone();
    let err = manager.link_credentials(bob.id(), creds.clone()).unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(
        manager
            .directory()
            .user_for_credentials(&creds)
            .map(|u| u.id()),
        Some(alice.id())
    );
}
