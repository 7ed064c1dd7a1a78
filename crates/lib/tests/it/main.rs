/*! Integration tests for Keyward.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - credentials: Tests for the CredentialStore and password hashing
 * - providers: Tests for AuthProvider construction and initialization order
 * - identity: Tests for the IdentityDirectory through the AuthManager
 * - tokens: Tests for refresh token lifecycle and access token expiry
 * - persistence: Tests for flushing, reloading and document compatibility
 * - scenario: The end-to-end service account bootstrap flow
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("keyward=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod credentials;
mod helpers;
mod identity;
mod providers;
mod tokens;
