use clap::Parser;
use keyward::AuthConfig;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the command result
    let directive = if cli.quiet {
        "keyward=error"
    } else {
        "keyward=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => AuthConfig::from_file(path).await?,
        None => AuthConfig::for_config_dir(&cli.config_dir),
    };
    tracing::debug!(storage_dir = %config.storage_dir.display(), "Using storage directory");

    let format = OutputFormat::from_json_flag(cli.json);
    match &cli.command {
        Commands::CreateToken(args) => commands::create_token::run(args, config, format).await,
        Commands::VerifyToken(args) => commands::verify_token::run(args, config, format).await,
    }
}
