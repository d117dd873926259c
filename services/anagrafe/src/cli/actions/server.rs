//! Server action: assemble the immutable configuration and run the API.

use anyhow::{Context, Result};
use secrecy::SecretString;

use crate::api;
use crate::api::handlers::auth::{AuthConfig, BootstrapAdmin};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub token_secret: SecretString,
    pub token_algorithm: String,
    pub token_lifetime_minutes: i64,
    pub cors_origin: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Execute the server action.
///
/// # Errors
///
/// Returns an error if the token configuration is invalid or the server
/// fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(args.token_secret)
        .with_token_algorithm(args.token_algorithm)
        .with_token_lifetime_minutes(args.token_lifetime_minutes)
        .with_cors_origin(args.cors_origin);

    api::new(args.port, args.dsn, auth_config, args.bootstrap_admin)
        .await
        .context("Failed to start the API server")
}
