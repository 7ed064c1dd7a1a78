//! Create token command - registers a random admin account and mints a
//! long-lived access token for it.

use chrono::Duration;
use keyward::{
    AuthConfig, AuthManager,
    constants::{GROUP_ID_ADMIN, LOCAL_PROVIDER_TYPE},
    identity::UserUpdate,
    token::RefreshTokenOptions,
};
use rand::Rng;

use crate::cli::CreateTokenArgs;
use crate::output::OutputFormat;

/// Length of the generated username and password
const ACCOUNT_FIELD_LENGTH: usize = 32;

/// Run the create-token command
pub async fn run(
    args: &CreateTokenArgs,
    config: AuthConfig,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut manager = AuthManager::open(config).await?;

    let username = random_lowercase(ACCOUNT_FIELD_LENGTH);
    let password = random_lowercase(ACCOUNT_FIELD_LENGTH);

    let provider = manager.auth_provider_mut(LOCAL_PROVIDER_TYPE, None)?;
    provider.initialize().await?;
    provider.add_credential(&username, &password)?;
    let credentials = provider.credentials_for(&username);

    let user = manager.create_user(username.as_str(), [GROUP_ID_ADMIN])?;
    manager.update_user(user.id(), UserUpdate::activate())?;
    manager.link_credentials(user.id(), credentials)?;

    let options = RefreshTokenOptions::long_lived(
        args.client_name.as_str(),
        Duration::hours(i64::from(args.access_token_hours)),
    );
    let refresh_token = manager.create_refresh_token(user.id(), options)?;
    let access_token = manager.create_access_token(&refresh_token)?;

    manager.flush_all().await?;
    tracing::info!(user_id = %user.id(), token_id = %refresh_token.id(), "Created service account token");

    match format {
        OutputFormat::Human => println!("{access_token}"),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "user_id": user.id(),
                "refresh_token_id": refresh_token.id(),
                "client_name": refresh_token.client_name(),
                "access_token": access_token,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}

fn random_lowercase(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| char::from(rng.gen_range(b'a'..=b'z'))).collect()
}
