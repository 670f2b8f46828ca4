//! Address mutation service.
//!
//! Every mutation fetches the record first: a missing id is `NotFound` for
//! any caller, and only then is ownership checked.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use trattoria_core::{AddressId, merge};

use super::{Caller, OwnershipGuard, ServiceError, cancellable, guarded};
use crate::db::{AddressStore, RepositoryError};
use crate::models::{Address, AddressPatch, CreateAddress};

/// Ownership-scoped address operations.
pub struct AddressService<'a> {
    addresses: &'a dyn AddressStore,
}

impl<'a> AddressService<'a> {
    #[must_use]
    pub const fn new(addresses: &'a dyn AddressStore) -> Self {
        Self { addresses }
    }

    /// Add an address owned by `caller`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing required fields and `NotFound` if the
    /// account vanished before the insert.
    #[instrument(skip(self, payload, cancel), fields(account_id = %caller.account_id))]
    pub async fn create(
        &self,
        caller: &Caller,
        payload: CreateAddress,
        cancel: &CancellationToken,
    ) -> Result<Address, ServiceError> {
        let address = payload.validate(caller.account_id)?;

        let created = match cancellable(cancel, self.addresses.insert(&address)).await? {
            Ok(created) => created,
            Err(RepositoryError::NotFound) => {
                return Err(ServiceError::NotFound("account not found".to_owned()));
            }
            Err(other) => return Err(other.into()),
        };

        info!(address_id = %created.id, "address created");
        Ok(created)
    }

    /// Every address the caller owns, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` or `Cancelled` on store failure.
    pub async fn list_for_caller(
        &self,
        caller: &Caller,
        cancel: &CancellationToken,
    ) -> Result<Vec<Address>, ServiceError> {
        guarded(cancel, self.addresses.list_by_owner(caller.account_id)).await
    }

    /// Apply a partial update to one of the caller's addresses.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Forbidden`, or `Validation` for an empty patch.
    #[instrument(skip(self, patch, cancel), fields(account_id = %caller.account_id))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: AddressId,
        patch: AddressPatch,
        cancel: &CancellationToken,
    ) -> Result<Address, ServiceError> {
        let existing = self.owned(caller, id, cancel).await?;
        let merged = merge(existing, patch)?;

        let updated = match cancellable(cancel, self.addresses.update(&merged)).await? {
            Ok(updated) => updated,
            Err(RepositoryError::NotFound) => return Err(address_not_found()),
            Err(other) => return Err(other.into()),
        };

        info!(address_id = %id, "address updated");
        Ok(updated)
    }

    /// Remove one of the caller's addresses.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Forbidden`.
    #[instrument(skip(self, cancel), fields(account_id = %caller.account_id))]
    pub async fn delete(
        &self,
        caller: &Caller,
        id: AddressId,
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError> {
        self.owned(caller, id, cancel).await?;

        if guarded(cancel, self.addresses.delete_by_id(id)).await? == 0 {
            return Err(address_not_found());
        }
        info!(address_id = %id, "address deleted");
        Ok(())
    }

    async fn owned(
        &self,
        caller: &Caller,
        id: AddressId,
        cancel: &CancellationToken,
    ) -> Result<Address, ServiceError> {
        let address = guarded(cancel, self.addresses.find_by_id(id))
            .await?
            .ok_or_else(address_not_found)?;
        OwnershipGuard::authorize(caller, &address)?;
        Ok(address)
    }
}

fn address_not_found() -> ServiceError {
    ServiceError::NotFound("address not found".to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use trattoria_core::{Email, Patch};

    use super::*;
    use crate::db::{AccountStore, MemoryStore};
    use crate::models::NewAccount;

    async fn register(store: &MemoryStore, email: &str) -> Caller {
        let email = Email::parse(email).unwrap();
        let account = AccountStore::insert(
            store,
            &NewAccount {
                email: email.clone(),
                name: "Test".to_owned(),
                password_hash: String::new(),
            },
        )
        .await
        .unwrap();
        Caller {
            account_id: account.id,
            email,
        }
    }

    fn home() -> CreateAddress {
        CreateAddress {
            label: "home".to_owned(),
            street: "Lenina 10".to_owned(),
            city: "Moscow".to_owned(),
            phone: "+7 800 555 35 55".to_owned(),
            comment: "Call first".to_owned(),
            ..CreateAddress::default()
        }
    }

    #[tokio::test]
    async fn test_owner_can_update_and_delete() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let alice = register(&store, "alice@example.com").await;
        let service = AddressService::new(&store);

        let created = service.create(&alice, home(), &cancel).await.unwrap();
        assert_eq!(created.account_id, alice.account_id);

        let patch = AddressPatch {
            city: Patch::Set("Saint-Petersburg".to_owned()),
            comment: Patch::Set(String::new()),
            ..AddressPatch::default()
        };
        let updated = service.update(&alice, created.id, patch, &cancel).await.unwrap();
        assert_eq!(updated.city, "Saint-Petersburg");
        assert_eq!(updated.street, "Lenina 10");
        assert!(updated.comment.is_empty());

        service.delete(&alice, created.id, &cancel).await.unwrap();
        assert!(service.list_for_caller(&alice, &cancel).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_caller_is_forbidden() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let alice = register(&store, "alice@example.com").await;
        let bob = register(&store, "bob@example.com").await;
        let service = AddressService::new(&store);
        let created = service.create(&alice, home(), &cancel).await.unwrap();

        let patch = AddressPatch {
            label: Patch::Set("work".to_owned()),
            ..AddressPatch::default()
        };
        assert!(matches!(
            service.update(&bob, created.id, patch, &cancel).await,
            Err(ServiceError::Forbidden)
        ));
        assert!(matches!(
            service.delete(&bob, created.id, &cancel).await,
            Err(ServiceError::Forbidden)
        ));

        let untouched = AddressStore::find_by_id(&store, created.id).await.unwrap().unwrap();
        assert_eq!(untouched.label, "home");
    }

    #[tokio::test]
    async fn test_missing_address_is_not_found_for_anyone() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let alice = register(&store, "alice@example.com").await;
        let service = AddressService::new(&store);

        let patch = AddressPatch {
            label: Patch::Set("work".to_owned()),
            ..AddressPatch::default()
        };
        assert!(matches!(
            service.update(&alice, AddressId::new(999), patch, &cancel).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(&alice, AddressId::new(999), &cancel).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_patch_rejected() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let alice = register(&store, "alice@example.com").await;
        let service = AddressService::new(&store);
        let created = service.create(&alice, home(), &cancel).await.unwrap();

        assert!(matches!(
            service.update(&alice, created.id, AddressPatch::default(), &cancel).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_after_account_removed() {
        let store = Arc::new(MemoryStore::new());
        let cancel = CancellationToken::new();
        let alice = register(&store, "alice@example.com").await;
        store.delete_account(alice.account_id).await;

        let result = AddressService::new(store.as_ref())
            .create(&alice, home(), &cancel)
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_only_returns_own_addresses() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let alice = register(&store, "alice@example.com").await;
        let bob = register(&store, "bob@example.com").await;
        let service = AddressService::new(&store);
        service.create(&alice, home(), &cancel).await.unwrap();
        service.create(&bob, home(), &cancel).await.unwrap();

        let mine = service.list_for_caller(&alice, &cancel).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].account_id, alice.account_id);
    }
}
