//! Operator listings over addresses and accounts.
//!
//! No ownership restriction applies here; the routes are behind the admin
//! token. Blank query values are treated as absent filters.

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use trattoria_core::{AccountId, Page, PageRequest};

use super::{ServiceError, guarded};
use crate::db::{AccountStore, AddressStore};
use crate::models::{Account, AccountFilter, AccountSort, Address, AddressFilter};

/// Largest page of users an operator may request.
pub const MAX_USER_PAGE_SIZE: u32 = 100;

/// Largest address page an admin listing returns.
pub const MAX_ADDRESS_PAGE_SIZE: u32 = 1_000;

/// Query string of `GET /admin/addresses`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddressQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub user_id: Option<i32>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub phone: Option<String>,
    pub label: Option<String>,
}

impl AddressQuery {
    fn filter(&self) -> AddressFilter {
        AddressFilter {
            owner: self.user_id.map(AccountId::new),
            city: non_blank(self.city.as_deref()),
            street: non_blank(self.street.as_deref()),
            phone: non_blank(self.phone.as_deref()),
            label: non_blank(self.label.as_deref()),
        }
    }
}

/// Query string of `GET /admin/users`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub sort: Option<String>,
}

impl UserQuery {
    fn filter(&self) -> AccountFilter {
        AccountFilter {
            name: non_blank(self.name.as_deref()),
            email: non_blank(self.email.as_deref()),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Read-only admin queries.
pub struct AdminQueries<'a> {
    addresses: &'a dyn AddressStore,
    accounts: &'a dyn AccountStore,
}

impl<'a> AdminQueries<'a> {
    #[must_use]
    pub const fn new(addresses: &'a dyn AddressStore, accounts: &'a dyn AccountStore) -> Self {
        Self {
            addresses,
            accounts,
        }
    }

    /// Filtered page of addresses across all accounts.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` or `Cancelled` on store failure.
    #[instrument(skip(self, cancel))]
    pub async fn list_addresses(
        &self,
        query: &AddressQuery,
        cancel: &CancellationToken,
    ) -> Result<Page<Address>, ServiceError> {
        let filter = query.filter();
        let request = PageRequest::from_query(query.page, query.limit, MAX_ADDRESS_PAGE_SIZE);

        let total = guarded(cancel, self.addresses.count(&filter)).await?;
        let items = guarded(
            cancel,
            self.addresses
                .list_filtered(&filter, request.limit(), request.offset()),
        )
        .await?;

        Ok(Page::new(items, total, request))
    }

    /// Filtered, sorted page of accounts.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` or `Cancelled` on store failure.
    #[instrument(skip(self, cancel))]
    pub async fn list_users(
        &self,
        query: &UserQuery,
        cancel: &CancellationToken,
    ) -> Result<Page<Account>, ServiceError> {
        let filter = query.filter();
        let sort = AccountSort::from_query(query.sort.as_deref());
        let request = PageRequest::from_query(query.page, query.limit, MAX_USER_PAGE_SIZE);

        let total = guarded(cancel, self.accounts.count(&filter)).await?;
        let items = guarded(
            cancel,
            self.accounts
                .list_filtered(&filter, sort, request.limit(), request.offset()),
        )
        .await?;

        Ok(Page::new(items, total, request))
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no account has this id.
    pub async fn get_user(
        &self,
        id: AccountId,
        cancel: &CancellationToken,
    ) -> Result<Account, ServiceError> {
        guarded(cancel, self.accounts.find_by_id(id))
            .await?
            .ok_or_else(|| ServiceError::NotFound("user not found".to_owned()))
    }

    /// Accounts whose email contains `fragment`, ordered by email.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank fragment.
    pub async fn search_users(
        &self,
        fragment: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Account>, ServiceError> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Err(ServiceError::Validation(
                "email query parameter is required".to_owned(),
            ));
        }
        guarded(cancel, self.accounts.search_by_email(fragment)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use trattoria_core::Email;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{CreateAddress, NewAccount};

    async fn account(store: &MemoryStore, name: &str, email: &str) -> Account {
        AccountStore::insert(
            store,
            &NewAccount {
                email: Email::parse(email).unwrap(),
                name: name.to_owned(),
                password_hash: String::new(),
            },
        )
        .await
        .unwrap()
    }

    async fn address(store: &MemoryStore, owner: AccountId, city: &str, label: &str) {
        let new = CreateAddress {
            label: label.to_owned(),
            street: "Lenina 10".to_owned(),
            city: city.to_owned(),
            phone: "+7 999 000 00 00".to_owned(),
            ..CreateAddress::default()
        }
        .validate(owner)
        .unwrap();
        AddressStore::insert(store, &new).await.unwrap();
    }

    #[tokio::test]
    async fn test_address_pages() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let owner = account(&store, "Ivan", "ivan@example.com").await;
        for _ in 0..23 {
            address(&store, owner.id, "Moscow", "home").await;
        }
        let admin = AdminQueries::new(&store, &store);

        let first = admin
            .list_addresses(&AddressQuery::default(), &cancel)
            .await
            .unwrap();
        assert_eq!(first.total, 23);
        assert_eq!(first.page_size, 10);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items.len(), 10);

        let last = admin
            .list_addresses(
                &AddressQuery {
                    page: Some(3),
                    ..AddressQuery::default()
                },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(last.items.len(), 3);
    }

    #[tokio::test]
    async fn test_huge_address_page_is_empty() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let owner = account(&store, "Ivan", "ivan@example.com").await;
        address(&store, owner.id, "Moscow", "home").await;
        let admin = AdminQueries::new(&store, &store);

        let page = admin
            .list_addresses(
                &AddressQuery {
                    page: Some(4_294_967_295),
                    limit: Some(4_294_967_295),
                    ..AddressQuery::default()
                },
                &cancel,
            )
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
        assert_eq!(page.page, u32::MAX);
        assert_eq!(page.page_size, MAX_ADDRESS_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_page_zero_is_first_page() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let owner = account(&store, "Ivan", "ivan@example.com").await;
        address(&store, owner.id, "Moscow", "home").await;
        let admin = AdminQueries::new(&store, &store);

        let page = admin
            .list_addresses(
                &AddressQuery {
                    page: Some(0),
                    limit: Some(0),
                    ..AddressQuery::default()
                },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_listing_has_no_pages() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let page = AdminQueries::new(&store, &store)
            .list_addresses(&AddressQuery::default(), &cancel)
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn test_address_filters() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let ivan = account(&store, "Ivan", "ivan@example.com").await;
        let olga = account(&store, "Olga", "olga@example.com").await;
        address(&store, ivan.id, "Moscow", "home").await;
        address(&store, ivan.id, "Kazan", "work").await;
        address(&store, olga.id, "Moscow", "home").await;
        let admin = AdminQueries::new(&store, &store);

        let query = AddressQuery {
            city: Some("mosc".to_owned()),
            label: Some("home".to_owned()),
            user_id: Some(ivan.id.as_i32()),
            street: Some("   ".to_owned()),
            ..AddressQuery::default()
        };
        let page = admin.list_addresses(&query, &cancel).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].account_id, ivan.id);
    }

    #[tokio::test]
    async fn test_user_listing_sort_and_cap() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        account(&store, "Boris", "boris@example.com").await;
        account(&store, "Anna", "anna@example.com").await;
        account(&store, "Vera", "vera@example.com").await;
        let admin = AdminQueries::new(&store, &store);

        let page = admin
            .list_users(
                &UserQuery {
                    sort: Some("name".to_owned()),
                    limit: Some(1000),
                    ..UserQuery::default()
                },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(page.page_size, MAX_USER_PAGE_SIZE);
        let names: Vec<_> = page.items.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Anna", "Boris", "Vera"]);

        let filtered = admin
            .list_users(
                &UserQuery {
                    email: Some("VERA".to_owned()),
                    ..UserQuery::default()
                },
                &cancel,
            )
            .await
            .unwrap();
        assert_eq!(filtered.total, 1);
    }

    #[tokio::test]
    async fn test_get_and_search_users() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let ivan = account(&store, "Ivan", "ivan@example.com").await;
        account(&store, "Ilya", "ilya@example.org").await;
        let admin = AdminQueries::new(&store, &store);

        assert_eq!(admin.get_user(ivan.id, &cancel).await.unwrap().name, "Ivan");
        assert!(matches!(
            admin.get_user(AccountId::new(999), &cancel).await,
            Err(ServiceError::NotFound(_))
        ));

        let found = admin.search_users("example", &cancel).await.unwrap();
        let emails: Vec<_> = found.iter().map(|a| a.email.as_str()).collect();
        assert_eq!(emails, ["ilya@example.org", "ivan@example.com"]);

        assert!(matches!(
            admin.search_users("  ", &cancel).await,
            Err(ServiceError::Validation(_))
        ));
    }
}
