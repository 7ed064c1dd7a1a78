//! Verify token command - checks an access token against the stored state.

use keyward::{AuthConfig, AuthManager};

use crate::cli::VerifyTokenArgs;
use crate::output::OutputFormat;

/// Run the verify-token command
pub async fn run(
    args: &VerifyTokenArgs,
    config: AuthConfig,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let manager = AuthManager::open(config).await?;

    let (user, refresh_token) = match manager.validate_access_token(args.token.trim()) {
        Ok(found) => found,
        Err(e) if e.is_token_rejection() || e.is_inactive_user() => {
            eprintln!("invalid: {e}");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Human => {
            println!("valid");
            println!("User:        {} ({})", user.name(), user.id());
            println!("Client:      {}", refresh_token.client_name());
            println!("Token ID:    {}", refresh_token.id());
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "valid": true,
                "user_id": user.id(),
                "user_name": user.name(),
                "client_name": refresh_token.client_name(),
                "refresh_token_id": refresh_token.id(),
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}
