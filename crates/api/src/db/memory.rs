//! Process-local store.
//!
//! Backs `TRATTORIA_STORE=memory` runs and the test suites. It enforces the
//! same uniqueness and foreign key rules as the `PostgreSQL` schema, so
//! services behave identically against either backend.
//!
//! A few fault hooks let tests reproduce conditions that are hard to trigger
//! against a real database: a concurrent writer claiming a slug or name
//! between the pre-check and the write, an unreachable store, and slow
//! round-trips.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use trattoria_core::{AccountId, AddressId, Email, ProductId};

use super::{AccountStore, AddressStore, ProductStore, RepositoryError, UniqueKey};
use crate::models::{
    Account, AccountFilter, AccountSort, Address, AddressFilter, NewAccount, NewAddress,
    NewProduct, Product,
};

#[derive(Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    addresses: BTreeMap<AddressId, Address>,
    accounts: BTreeMap<AccountId, Account>,
    next_product: i32,
    next_address: i32,
    next_account: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// In-memory implementation of every store trait.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    slug_races: AtomicU32,
    name_races: AtomicU32,
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` product writes (insert or update) fail with a
    /// slug conflict, as if another writer had claimed the slug first.
    pub fn inject_slug_races(&self, count: u32) {
        self.slug_races.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` product writes fail with a name conflict.
    /// Slug races are consumed first.
    pub fn inject_name_races(&self, count: u32) {
        self.name_races.store(count, Ordering::SeqCst);
    }

    /// Make every call fail as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Remove an account and, like `ON DELETE CASCADE`, its addresses.
    pub async fn delete_account(&self, id: AccountId) -> bool {
        let mut tables = self.tables.write().await;
        tables.addresses.retain(|_, address| address.account_id != id);
        tables.accounts.remove(&id).is_some()
    }

    async fn enter(&self) -> Result<(), RepositoryError> {
        let millis = self.latency_ms.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn take_race(&self) -> Option<UniqueKey> {
        let take = |counter: &AtomicU32| {
            counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        };
        if take(&self.slug_races) {
            Some(UniqueKey::Slug)
        } else if take(&self.name_races) {
            Some(UniqueKey::Name)
        } else {
            None
        }
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|needle| haystack.to_lowercase().contains(&needle.to_lowercase()))
}

fn page<T: Clone>(rows: Vec<&T>, limit: i64, offset: i64) -> Vec<T> {
    let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).cloned().collect()
}

fn newest_first<T>(rows: &mut [&T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, i32)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn address_matches(address: &Address, filter: &AddressFilter) -> bool {
    filter.owner.is_none_or(|owner| address.account_id == owner)
        && contains_ci(&address.city, filter.city.as_deref())
        && contains_ci(&address.street, filter.street.as_deref())
        && contains_ci(&address.phone, filter.phone.as_deref())
        && filter.label.as_deref().is_none_or(|label| address.label == label)
}

fn account_matches(account: &Account, filter: &AccountFilter) -> bool {
    contains_ci(&account.name, filter.name.as_deref())
        && contains_ci(account.email.as_str(), filter.email.as_deref())
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn exists_by_slug(&self, slug: &str) -> Result<bool, RepositoryError> {
        self.enter().await?;
        let tables = self.tables.read().await;
        Ok(tables.products.values().any(|p| p.slug == slug))
    }

    async fn exists_by_name(
        &self,
        name: &str,
        excluding: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        self.enter().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .any(|p| p.name == name && Some(p.id) != excluding))
    }

    async fn insert(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        self.enter().await?;
        if let Some(key) = self.take_race() {
            return Err(RepositoryError::Conflict(key));
        }

        let mut tables = self.tables.write().await;
        if tables.products.values().any(|p| p.slug == product.slug) {
            return Err(RepositoryError::Conflict(UniqueKey::Slug));
        }
        if tables.products.values().any(|p| p.name == product.name) {
            return Err(RepositoryError::Conflict(UniqueKey::Name));
        }

        let now = Utc::now();
        let id = ProductId::new(next_id(&mut tables.next_product));
        let created = Product {
            id,
            slug: product.slug.clone(),
            name: product.name.clone(),
            kind: product.kind.clone(),
            tags: product.tags.clone(),
            price: product.price,
            ingredients: product.ingredients.clone(),
            image: product.image.clone(),
            rating: product.rating,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        self.enter().await?;
        let tables = self.tables.read().await;
        Ok(tables.products.values().find(|p| p.slug == slug).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Product>, RepositoryError> {
        self.enter().await?;
        let tables = self.tables.read().await;
        let mut rows: Vec<&Product> = tables.products.values().collect();
        newest_first(&mut rows, |p| (p.created_at, p.id.as_i32()));
        Ok(page(rows, limit, offset))
    }

    async fn update(&self, product: &Product) -> Result<Product, RepositoryError> {
        self.enter().await?;
        if let Some(key) = self.take_race() {
            return Err(RepositoryError::Conflict(key));
        }
        let mut tables = self.tables.write().await;
        let others = || tables.products.values().filter(|p| p.id != product.id);
        if others().any(|p| p.slug == product.slug) {
            return Err(RepositoryError::Conflict(UniqueKey::Slug));
        }
        if others().any(|p| p.name == product.name) {
            return Err(RepositoryError::Conflict(UniqueKey::Name));
        }

        let stored = tables
            .products
            .get_mut(&product.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = Product {
            id: stored.id,
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..product.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<u64, RepositoryError> {
        self.enter().await?;
        let mut tables = self.tables.write().await;
        let before = tables.products.len();
        tables.products.retain(|_, p| p.slug != slug);
        Ok((before - tables.products.len()) as u64)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.enter().await
    }
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn insert(&self, address: &NewAddress) -> Result<Address, RepositoryError> {
        self.enter().await?;
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&address.account_id) {
            return Err(RepositoryError::NotFound);
        }

        let now = Utc::now();
        let id = AddressId::new(next_id(&mut tables.next_address));
        let created = Address {
            id,
            account_id: address.account_id,
            label: address.label.clone(),
            apartment: address.apartment.clone(),
            floor: address.floor.clone(),
            entrance: address.entrance.clone(),
            street: address.street.clone(),
            city: address.city.clone(),
            phone: address.phone.clone(),
            comment: address.comment.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.addresses.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        self.enter().await?;
        Ok(self.tables.read().await.addresses.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner: AccountId) -> Result<Vec<Address>, RepositoryError> {
        self.enter().await?;
        let tables = self.tables.read().await;
        let mut rows: Vec<&Address> = tables
            .addresses
            .values()
            .filter(|a| a.account_id == owner)
            .collect();
        newest_first(&mut rows, |a| (a.created_at, a.id.as_i32()));
        Ok(rows.into_iter().cloned().collect())
    }

    async fn update(&self, address: &Address) -> Result<Address, RepositoryError> {
        self.enter().await?;
        let mut tables = self.tables.write().await;
        let stored = tables
            .addresses
            .get_mut(&address.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = Address {
            id: stored.id,
            account_id: stored.account_id,
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..address.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_by_id(&self, id: AddressId) -> Result<u64, RepositoryError> {
        self.enter().await?;
        let removed = self.tables.write().await.addresses.remove(&id);
        Ok(u64::from(removed.is_some()))
    }

    async fn list_filtered(
        &self,
        filter: &AddressFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Address>, RepositoryError> {
        self.enter().await?;
        let tables = self.tables.read().await;
        let mut rows: Vec<&Address> = tables
            .addresses
            .values()
            .filter(|a| address_matches(a, filter))
            .collect();
        newest_first(&mut rows, |a| (a.created_at, a.id.as_i32()));
        Ok(page(rows, limit, offset))
    }

    async fn count(&self, filter: &AddressFilter) -> Result<u64, RepositoryError> {
        self.enter().await?;
        let tables = self.tables.read().await;
        let count = tables
            .addresses
            .values()
            .filter(|a| address_matches(a, filter))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        self.enter().await?;
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| &a.email == email).cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        self.enter().await?;
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn insert(&self, account: &NewAccount) -> Result<Account, RepositoryError> {
        self.enter().await?;
        let mut tables = self.tables.write().await;
        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(RepositoryError::Conflict(UniqueKey::Email));
        }

        let now = Utc::now();
        let id = AccountId::new(next_id(&mut tables.next_account));
        let created = Account {
            id,
            email: account.email.clone(),
            name: account.name.clone(),
            password_hash: account.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.accounts.insert(id, created.clone());
        Ok(created)
    }

    async fn list_filtered(
        &self,
        filter: &AccountFilter,
        sort: AccountSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, RepositoryError> {
        self.enter().await?;
        let tables = self.tables.read().await;
        let mut rows: Vec<&Account> = tables
            .accounts
            .values()
            .filter(|a| account_matches(a, filter))
            .collect();
        rows.sort_by(|a, b| match sort {
            AccountSort::NameAsc => (&a.name, a.id).cmp(&(&b.name, b.id)),
            AccountSort::NameDesc => (&b.name, b.id).cmp(&(&a.name, a.id)),
            AccountSort::EmailAsc => (a.email.as_str(), a.id).cmp(&(b.email.as_str(), b.id)),
            AccountSort::EmailDesc => (b.email.as_str(), b.id).cmp(&(a.email.as_str(), a.id)),
            AccountSort::CreatedAtAsc => (a.created_at, a.id).cmp(&(b.created_at, b.id)),
            AccountSort::CreatedAtDesc => (b.created_at, b.id).cmp(&(a.created_at, a.id)),
        });
        Ok(page(rows, limit, offset))
    }

    async fn count(&self, filter: &AccountFilter) -> Result<u64, RepositoryError> {
        self.enter().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .filter(|a| account_matches(a, filter))
            .count() as u64)
    }

    async fn search_by_email(&self, fragment: &str) -> Result<Vec<Account>, RepositoryError> {
        self.enter().await?;
        let tables = self.tables.read().await;
        let mut rows: Vec<&Account> = tables
            .accounts
            .values()
            .filter(|a| contains_ci(a.email.as_str(), Some(fragment)))
            .collect();
        rows.sort_by(|a, b| a.email.as_str().cmp(b.email.as_str()));
        Ok(rows.into_iter().cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use trattoria_core::{Price, Rating};

    use super::*;

    fn new_product(slug: &str, name: &str) -> NewProduct {
        NewProduct {
            slug: slug.to_owned(),
            name: name.to_owned(),
            kind: "pizza".to_owned(),
            tags: Vec::new(),
            price: Price::new(499).unwrap(),
            ingredients: Vec::new(),
            image: String::new(),
            rating: Rating::new(4.5).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_product_uniqueness() {
        let store = MemoryStore::new();
        ProductStore::insert(&store, &new_product("margarita", "Margarita"))
            .await
            .unwrap();

        let slug_clash = ProductStore::insert(&store, &new_product("margarita", "Other")).await;
        assert!(matches!(slug_clash, Err(RepositoryError::Conflict(UniqueKey::Slug))));

        let name_clash = ProductStore::insert(&store, &new_product("other", "Margarita")).await;
        assert!(matches!(name_clash, Err(RepositoryError::Conflict(UniqueKey::Name))));
    }

    #[tokio::test]
    async fn test_update_keeps_identity_and_checks_others() {
        let store = MemoryStore::new();
        let first = ProductStore::insert(&store, &new_product("a", "A")).await.unwrap();
        ProductStore::insert(&store, &new_product("b", "B")).await.unwrap();

        let mut renamed = first.clone();
        renamed.slug = "b".to_owned();
        assert!(matches!(
            ProductStore::update(&store, &renamed).await,
            Err(RepositoryError::Conflict(UniqueKey::Slug))
        ));

        renamed.slug = "a-2".to_owned();
        let updated = ProductStore::update(&store, &renamed).await.unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.created_at, first.created_at);
        assert_eq!(updated.slug, "a-2");
    }

    #[tokio::test]
    async fn test_injected_slug_races_are_consumed() {
        let store = MemoryStore::new();
        store.inject_slug_races(1);
        assert!(ProductStore::insert(&store, &new_product("x", "X")).await.is_err());
        assert!(ProductStore::insert(&store, &new_product("x", "X")).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_races_hit_updates() {
        let store = MemoryStore::new();
        let product = ProductStore::insert(&store, &new_product("x", "X")).await.unwrap();

        store.inject_slug_races(1);
        store.inject_name_races(1);
        assert!(matches!(
            ProductStore::update(&store, &product).await,
            Err(RepositoryError::Conflict(UniqueKey::Slug))
        ));
        assert!(matches!(
            ProductStore::update(&store, &product).await,
            Err(RepositoryError::Conflict(UniqueKey::Name))
        ));
        assert!(ProductStore::update(&store, &product).await.is_ok());
    }

    #[tokio::test]
    async fn test_address_requires_existing_account() {
        let store = MemoryStore::new();
        let orphan = NewAddress {
            account_id: AccountId::new(42),
            label: "home".to_owned(),
            apartment: String::new(),
            floor: String::new(),
            entrance: String::new(),
            street: "Lenina 10".to_owned(),
            city: "Moscow".to_owned(),
            phone: "+7".to_owned(),
            comment: String::new(),
        };
        assert!(matches!(
            AddressStore::insert(&store, &orphan).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            ProductStore::exists_by_slug(&store, "x").await,
            Err(RepositoryError::Database(_))
        ));
        store.set_unavailable(false);
        assert!(!ProductStore::exists_by_slug(&store, "x").await.unwrap());
    }
}
