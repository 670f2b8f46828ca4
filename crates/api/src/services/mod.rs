//! Business logic.
//!
//! Services are short-lived views over the stores, built per request from
//! [`AppState`](crate::state::AppState). Every operation takes the request's
//! [`CancellationToken`]; each store round-trip is raced against it and an
//! abandoned request stops at the next store call with
//! [`ServiceError::Cancelled`].
//!
//! - [`catalogue`] - create, read, list, patch, rename, and delete catalogue items
//! - [`uniqueness`] - slug allocation with conflict-driven retry
//! - [`ownership`] - caller resolution and address ownership checks
//! - [`addresses`] - ownership-scoped address mutations
//! - [`admin`] - filtered, paginated listings for operators
//! - [`accounts`] - registration and password login

pub mod accounts;
pub mod addresses;
pub mod admin;
pub mod catalogue;
pub mod ownership;
pub mod uniqueness;

use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use trattoria_core::MergeError;

use crate::db::RepositoryError;
use crate::models::ValidationError;

pub use accounts::AccountService;
pub use addresses::AddressService;
pub use admin::AdminQueries;
pub use catalogue::CatalogueService;
pub use ownership::{Caller, OwnershipGuard};
pub use uniqueness::SlugResolver;

/// Errors returned by service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed a domain rule. Safe to show to the client.
    #[error("{0}")]
    Validation(String),

    /// The addressed record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The caller does not own the addressed record.
    #[error("forbidden")]
    Forbidden,

    /// A concurrent writer claimed a unique value first.
    #[error("{0}")]
    Conflict(String),

    /// The store failed.
    #[error("store unavailable")]
    Unavailable(#[source] RepositoryError),

    /// The request was abandoned before the operation finished.
    #[error("request cancelled")]
    Cancelled,
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("record not found".to_owned()),
            RepositoryError::Conflict(key) => Self::Conflict(format!("{key} already exists")),
            other @ (RepositoryError::Database(_) | RepositoryError::DataCorruption(_)) => {
                Self::Unavailable(other)
            }
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.0)
    }
}

impl From<MergeError> for ServiceError {
    fn from(err: MergeError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Race a store call against cancellation.
///
/// The token is polled first, so an already-cancelled request never starts
/// the call. On cancellation the in-flight future is dropped.
///
/// # Errors
///
/// Returns [`ServiceError::Cancelled`] if the token fires first.
pub async fn cancellable<F>(cancel: &CancellationToken, call: F) -> Result<F::Output, ServiceError>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ServiceError::Cancelled),
        output = call => Ok(output),
    }
}

/// [`cancellable`] for calls whose store errors need no special handling.
///
/// # Errors
///
/// Returns [`ServiceError::Cancelled`] on cancellation and the mapped
/// [`RepositoryError`] otherwise.
pub async fn guarded<T, F>(cancel: &CancellationToken, call: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    Ok(cancellable(cancel, call).await??)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::UniqueKey;

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = cancellable(&cancel, async { 1 }).await;
        assert!(matches!(result, Err(ServiceError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellation_drops_slow_call() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let slow = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, RepositoryError>(())
        };
        assert!(matches!(guarded(&cancel, slow).await, Err(ServiceError::Cancelled)));
    }

    #[tokio::test]
    async fn test_guarded_maps_store_errors() {
        let cancel = CancellationToken::new();

        let conflict = guarded(&cancel, async {
            Err::<(), _>(RepositoryError::Conflict(UniqueKey::Name))
        })
        .await;
        assert!(matches!(conflict, Err(ServiceError::Conflict(msg)) if msg == "name already exists"));

        let down = guarded(&cancel, async {
            Err::<(), _>(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        })
        .await;
        assert!(matches!(down, Err(ServiceError::Unavailable(_))));

        let ok = guarded(&cancel, async { Ok::<_, RepositoryError>(7) }).await.unwrap();
        assert_eq!(ok, 7);
    }
}
