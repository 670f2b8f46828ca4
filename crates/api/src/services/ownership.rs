//! Caller identity and address ownership.
//!
//! Access tokens carry an email. It is resolved to an account id once per
//! request, by the authentication extractor; every later check compares ids.

use tokio_util::sync::CancellationToken;

use trattoria_core::{AccountId, Email};

use super::{ServiceError, guarded};
use crate::db::AccountStore;
use crate::models::Address;

/// The authenticated account behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub account_id: AccountId,
    pub email: Email,
}

/// Resolves callers and checks that they own what they touch.
pub struct OwnershipGuard<'a> {
    accounts: &'a dyn AccountStore,
}

impl<'a> OwnershipGuard<'a> {
    #[must_use]
    pub const fn new(accounts: &'a dyn AccountStore) -> Self {
        Self { accounts }
    }

    /// Look up the account behind a verified token subject.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account has this email.
    pub async fn resolve(
        &self,
        email: &Email,
        cancel: &CancellationToken,
    ) -> Result<Caller, ServiceError> {
        let account = guarded(cancel, self.accounts.find_by_email(email))
            .await?
            .ok_or_else(|| ServiceError::NotFound("account not found".to_owned()))?;

        Ok(Caller {
            account_id: account.id,
            email: account.email,
        })
    }

    /// Allow the call only when `caller` owns `address`.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` otherwise.
    pub fn authorize(caller: &Caller, address: &Address) -> Result<(), ServiceError> {
        if address.account_id == caller.account_id {
            Ok(())
        } else {
            Err(ServiceError::Forbidden)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use trattoria_core::AddressId;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewAccount;

    fn address_owned_by(owner: i32) -> Address {
        let now = Utc::now();
        Address {
            id: AddressId::new(7),
            account_id: AccountId::new(owner),
            label: "home".to_owned(),
            apartment: String::new(),
            floor: String::new(),
            entrance: String::new(),
            street: "Lenina 10".to_owned(),
            city: "Moscow".to_owned(),
            phone: "+7".to_owned(),
            comment: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn caller(id: i32) -> Caller {
        Caller {
            account_id: AccountId::new(id),
            email: Email::parse("someone@example.com").unwrap(),
        }
    }

    #[test]
    fn test_authorize_compares_ids() {
        let address = address_owned_by(1);
        assert!(OwnershipGuard::authorize(&caller(1), &address).is_ok());
        assert!(matches!(
            OwnershipGuard::authorize(&caller(2), &address),
            Err(ServiceError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_resolve() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let email = Email::parse("ivan@example.com").unwrap();
        let account = AccountStore::insert(
            &store,
            &NewAccount {
                email: email.clone(),
                name: "Ivan".to_owned(),
                password_hash: String::new(),
            },
        )
        .await
        .unwrap();

        let guard = OwnershipGuard::new(&store);
        let resolved = guard.resolve(&email, &cancel).await.unwrap();
        assert_eq!(resolved.account_id, account.id);

        let stranger = Email::parse("nobody@example.com").unwrap();
        assert!(matches!(
            guard.resolve(&stranger, &cancel).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
