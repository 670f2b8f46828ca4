//! Account registration and password login.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use trattoria_core::{Email, EmailError};

use super::{ServiceError, cancellable, guarded};
use crate::db::{AccountStore, RepositoryError};
use crate::models::{Account, NewAccount};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors from registration and login.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("name is required")]
    MissingName,

    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// Wrong password or unknown email. The two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account already exists")]
    AccountExists,

    #[error("password hashing error")]
    PasswordHash,

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Password-based account operations.
pub struct AccountService<'a> {
    accounts: &'a dyn AccountStore,
}

impl<'a> AccountService<'a> {
    #[must_use]
    pub const fn new(accounts: &'a dyn AccountStore) -> Self {
        Self { accounts }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmail`, `MissingName` or `WeakPassword` for bad input
    /// and `AccountExists` if the email is taken.
    #[instrument(skip(self, name, password, cancel))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<Account, AuthError> {
        let email = Email::parse(email)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        validate_password(password)?;

        let account = NewAccount {
            email,
            name: name.to_owned(),
            password_hash: hash_password(password)?,
        };

        let created = match cancellable(cancel, self.accounts.insert(&account))
            .await
            .map_err(AuthError::Service)?
        {
            Ok(created) => created,
            Err(RepositoryError::Conflict(_)) => return Err(AuthError::AccountExists),
            Err(other) => return Err(ServiceError::from(other).into()),
        };

        info!(account_id = %created.id, "account registered");
        Ok(created)
    }

    /// Check an email and password pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for a malformed email, an unknown account
    /// or a wrong password.
    #[instrument(skip(self, email, password, cancel))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<Account, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let account = guarded(cancel, self.accounts.find_by_email(&email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &account.password_hash)?;
        info!(account_id = %account.id, "account logged in");
        Ok(account)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let service = AccountService::new(&store);

        let account = service
            .register("  Ivan  ", "Ivan@Example.com", "password123", &cancel)
            .await
            .unwrap();
        assert_eq!(account.name, "Ivan");
        assert_eq!(account.email.as_str(), "ivan@example.com");
        assert_ne!(account.password_hash, "password123");

        let logged_in = service
            .login("ivan@example.com", "password123", &cancel)
            .await
            .unwrap();
        assert_eq!(logged_in.id, account.id);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let service = AccountService::new(&store);

        assert!(matches!(
            service.register("Ivan", "not-an-email", "password123", &cancel).await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            service.register("  ", "ivan@example.com", "password123", &cancel).await,
            Err(AuthError::MissingName)
        ));
        assert!(matches!(
            service.register("Ivan", "ivan@example.com", "short", &cancel).await,
            Err(AuthError::WeakPassword)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let service = AccountService::new(&store);
        service
            .register("Ivan", "ivan@example.com", "password123", &cancel)
            .await
            .unwrap();

        assert!(matches!(
            service.register("Other", "IVAN@example.com", "password456", &cancel).await,
            Err(AuthError::AccountExists)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let service = AccountService::new(&store);
        service
            .register("Ivan", "ivan@example.com", "password123", &cancel)
            .await
            .unwrap();

        for (email, password) in [
            ("ivan@example.com", "wrong-password"),
            ("nobody@example.com", "password123"),
            ("garbage", "password123"),
        ] {
            let err = service.login(email, password, &cancel).await.unwrap_err();
            assert_eq!(err.to_string(), "invalid credentials");
        }
    }
}
