//! Account management commands.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use trattoria_api::db::AccountRepository;
use trattoria_api::services::AccountService;
use trattoria_api::services::accounts::AuthError;

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create an account with a password, as `POST /auth/register` would.
pub async fn create(email: &str, name: &str, password: &str) -> Result<(), AccountError> {
    let pool = connect().await?;
    let accounts = AccountRepository::new(pool);

    let account = AccountService::new(&accounts)
        .register(name, email, password, &CancellationToken::new())
        .await?;

    tracing::info!(account_id = %account.id, email = %account.email, "Account created");
    Ok(())
}
