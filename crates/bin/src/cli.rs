//! CLI argument definitions for the Keyward binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Keyward credential and token tool
#[derive(Parser, Debug)]
#[command(name = "keyward")]
#[command(about = "Keyward: service account credentials and long-lived access tokens")]
#[command(version)]
pub struct Cli {
    /// Configuration directory. State is stored in its `.storage` subdirectory.
    #[arg(short = 'C', long, default_value = ".", env = "KEYWARD_CONFIG_DIR")]
    pub config_dir: PathBuf,

    /// JSON configuration file. Overrides --config-dir.
    #[arg(long, env = "KEYWARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an admin service account and print a long-lived access token
    CreateToken(CreateTokenArgs),
    /// Check an access token against the stored state
    VerifyToken(VerifyTokenArgs),
}

/// Arguments for the create-token command
#[derive(clap::Args, Debug)]
pub struct CreateTokenArgs {
    /// Client name recorded on the refresh token
    #[arg(long, default_value = "action-runner")]
    pub client_name: String,

    /// Lifetime of the access token, in hours
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
    pub access_token_hours: u32,
}

/// Arguments for the verify-token command
#[derive(clap::Args, Debug)]
pub struct VerifyTokenArgs {
    /// The access token to check
    pub token: String,
}
