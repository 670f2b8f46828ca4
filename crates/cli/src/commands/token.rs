//! Access token commands.
//!
//! # Environment Variables
//!
//! Reads the same configuration as the API server (`TRATTORIA_JWT_SECRET`,
//! `TRATTORIA_TOKEN_TTL_SECS`, ...), so issued tokens verify there.

use thiserror::Error;

use trattoria_api::auth::{TokenError, TokenService};
use trattoria_api::config::{ApiConfig, ConfigError};
use trattoria_api::db::{AccountRepository, AccountStore, RepositoryError};
use trattoria_core::{Email, EmailError};

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("No account with email: {0}")]
    UnknownAccount(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Print a fresh access token for `email` to stdout.
pub async fn issue(email: &str) -> Result<(), IssueError> {
    let config = ApiConfig::from_env()?;
    let email = Email::parse(email)?;

    let pool = connect().await?;
    let account = AccountRepository::new(pool)
        .find_by_email(&email)
        .await?
        .ok_or_else(|| IssueError::UnknownAccount(email.to_string()))?;

    let token = TokenService::new(&config.jwt_secret, config.token_ttl).issue(&account.email)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}
