//! Tests for refresh token lifecycle and access token expiry.

use chrono::Duration;
use keyward::{
    Clock,
    token::{RefreshTokenOptions, TokenError, TokenState, TokenType},
};

use crate::helpers::*;

#[tokio::test]
async fn test_fresh_token_yields_access_token() {
    let (_dir, _clock, mut manager) = test_manager_with_provider().await;
    let user = create_active_admin(&mut manager, "svc", "pw");
    let token = manager
        .create_refresh_token(user.id(), RefreshTokenOptions::normal("web"))
        .expect("Failed to create refresh token");

    let access = manager
        .create_access_token(&token)
        .expect("Failed to create access token");
    assert!(!access.is_empty());

    let (owner, parent) = manager
        .validate_access_token(&access)
        .expect("Access token rejected");
    assert_eq!(owner.id(), user.id());
    assert_eq!(parent.id(), token.id());
}

#[tokio::test]
async fn test_revoked_token_stays_revoked() {
    let (_dir, clock, mut manager) = test_manager_with_provider().await;
    let user = create_active_admin(&mut manager, "svc", "pw");
    let token = manager
        .create_refresh_token(user.id(), RefreshTokenOptions::normal("web"))
        .expect("Failed to create refresh token");
    let access = manager
        .create_access_token(&token)
        .expect("Failed to create access token");

    manager
        .revoke_refresh_token(token.id())
        .expect("Failed to revoke");
    let revoked_at = manager
        .tokens()
        .find_token(token.id())
        .and_then(|t| t.revoked_at());
    assert_eq!(revoked_at, Some(clock.now()));

    for _ in 0..3 {
        let err = manager.create_access_token(&token).unwrap_err();
        assert!(err.is_revoked(), "{err}");
        clock.advance(Duration::minutes(1));
    }
    assert!(manager.validate_access_token(&access).unwrap_err().is_revoked());

    // Revoking again is a no-op and keeps the first timestamp
    manager
        .revoke_refresh_token(token.id())
        .expect("Second revoke failed");
    assert_eq!(
        manager
            .tokens()
            .find_token(token.id())
            .and_then(|t| t.revoked_at()),
        revoked_at
    );
    assert_eq!(
        manager.tokens().find_token(token.id()).map(|t| t.state(clock.now())),
        Some(TokenState::Revoked)
    );
}

#[tokio::test]
async fn test_revoke_unknown_token_is_not_found() {
    let (_dir, _clock, mut manager) = test_manager().await;
    let err = manager.revoke_refresh_token("missing").unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_long_lived_access_token_expiry_is_exact() {
    let (_dir, _clock, mut manager) = test_manager_with_provider().await;
    let user = create_active_admin(&mut manager, "svc", "pw");
    let token = manager
        .create_refresh_token(
            user.id(),
            RefreshTokenOptions::long_lived("action-runner", Duration::hours(4)),
        )
        .expect("Failed to create refresh token");
    assert_eq!(token.token_type(), TokenType::LongLivedAccessToken);
    assert_eq!(token.expires_at(), None);

    let access = manager
        .create_access_token(&token)
        .expect("Failed to create access token");
    let claims = manager
        .tokens()
        .access_token_claims(&access)
        .expect("Failed to decode access token");
    assert_eq!(claims.refresh_token_id(), token.id());
    assert_eq!(claims.expires_at(), token.created_at() + Duration::hours(4));
}

#[tokio::test]
async fn test_expiry_is_exact_with_sub_second_clock() {
    let (_dir, clock, mut manager) = test_manager_with_provider().await;
    let user = create_active_admin(&mut manager, "svc", "pw");
    clock.advance(Duration::milliseconds(700));

    let token = manager
        .create_refresh_token(
            user.id(),
            RefreshTokenOptions::long_lived("action-runner", Duration::hours(4)),
        )
        .expect("Failed to create refresh token");
    let access = manager
        .create_access_token(&token)
        .expect("Failed to create access token");
    let claims = manager
        .tokens()
        .access_token_claims(&access)
        .expect("Failed to decode access token");
    assert_eq!(claims.expires_at(), token.created_at() + Duration::hours(4));
    assert!(token.created_at() <= clock.now());
}

#[tokio::test]
async fn test_fractional_access_lifetime_rejected() {
    let (_dir, _clock, mut manager) = test_manager_with_provider().await;
    let user = create_active_admin(&mut manager, "svc", "pw");

    for lifetime in [Duration::milliseconds(500), Duration::milliseconds(1500)] {
        let err = manager
            .create_refresh_token(
                user.id(),
                RefreshTokenOptions::long_lived("action-runner", lifetime),
            )
            .unwrap_err();
        assert!(err.is_validation_error(), "{err}");
    }
    assert_eq!(manager.tokens().tokens_for_user(user.id()).count(), 0);

    // A whole-second lifetime still works right after issue
    let token = manager
        .create_refresh_token(
            user.id(),
            RefreshTokenOptions::long_lived("action-runner", Duration::seconds(1)),
        )
        .expect("Failed to create refresh token");
    let access = manager
        .create_access_token(&token)
        .expect("Failed to create access token");
    assert!(manager.validate_access_token(&access).is_ok());
}

#[tokio::test]
async fn test_access_token_expiry_boundary() {
    let (_dir, clock, mut manager) = test_manager_with_provider().await;
    let user = create_active_admin(&mut manager, "svc", "pw");
    let token = manager
        .create_refresh_token(
            user.id(),
            RefreshTokenOptions::long_lived("action-runner", Duration::hours(4)),
        )
        .expect("Failed to create refresh token");
    let access = manager
        .create_access_token(&token)
        .expect("Failed to create access token");

    clock.advance(Duration::hours(4) - Duration::seconds(1));
    assert!(manager.validate_access_token(&access).is_ok());

    clock.advance(Duration::seconds(1));
    let err = manager.validate_access_token(&access).unwrap_err();
    assert!(err.is_expired(), "{err}");
}

#[tokio::test]
async fn test_refresh_token_expiry_boundary() {
    let (_dir, clock, mut manager) = test_manager_with_provider().await;
    let user = create_active_admin(&mut manager, "svc", "pw");
    let token = manager
        .create_refresh_token(
            user.id(),
            RefreshTokenOptions::normal("web").with_expires_in(Duration::seconds(60)),
        )
        .expect("Failed to create refresh token");
    assert_eq!(token.expires_at(), Some(clock.now() + Duration::seconds(60)));

    // expires_at is one second away
    clock.advance(Duration::seconds(59));
    assert!(manager.create_access_token(&token).is_ok());
    assert_eq!(token.state(clock.now()), TokenState::Active);

    // expires_at is exactly now
    clock.advance(Duration::seconds(1));
    let err = manager.create_access_token(&token).unwrap_err();
    assert!(err.is_expired(), "{err}");
    assert_eq!(token.state(clock.now()), TokenState::Expired);

    assert_eq!(manager.purge_expired_tokens(), 1);
    assert!(manager.create_access_token(&token).unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_long_lived_token_validation() {
    let (_dir, _clock, mut manager) = test_manager_with_provider().await;
    let user = create_active_admin(&mut manager, "svc", "pw");

    let mut options = RefreshTokenOptions::long_lived("action-runner", Duration::hours(4));
    options.access_token_expiration = None;
    let err = manager.create_refresh_token(user.id(), options).unwrap_err();
    assert!(matches!(
        err,
        keyward::Error::Token(TokenError::MissingAccessTokenExpiration)
    ));

    let err = manager
        .create_refresh_token(user.id(), RefreshTokenOptions::long_lived("  ", Duration::hours(4)))
        .unwrap_err();
    assert!(matches!(err, keyward::Error::Token(TokenError::MissingClientName)));

    manager
        .create_refresh_token(
            user.id(),
            RefreshTokenOptions::long_lived("action-runner", Duration::hours(4)),
        )
        .expect("Failed to create refresh token");
    let err = manager
        .create_refresh_token(
            user.id(),
            RefreshTokenOptions::long_lived("action-runner", Duration::hours(1)),
        )
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(manager.tokens().tokens_for_user(user.id()).count(), 1);
}

#[tokio::test]
async fn test_forged_and_foreign_tokens_rejected() {
    let (_dir, _clock, mut manager) = test_manager_with_provider().await;
    let user = create_active_admin(&mut manager, "svc", "pw");
    let token = manager
        .create_refresh_token(user.id(), RefreshTokenOptions::normal("web"))
        .expect("Failed to create refresh token");
    let access = manager
        .create_access_token(&token)
        .expect("Failed to create access token");

    // A second manager has its own signing key
    let (_other_dir, _other_clock, other) = test_manager().await;
    assert!(other.validate_access_token(&access).unwrap_err().is_token_rejection());

    let tampered = format!("x{}", &access[1..]);
    assert!(manager.validate_access_token(&tampered).is_err());
    assert!(manager.validate_access_token("not-a-token").unwrap_err().is_token_rejection());
}
