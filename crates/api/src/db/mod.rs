//! Persistence layer.
//!
//! # Tables
//!
//! - `account` - Registered accounts (email UNIQUE as `account_email_key`)
//! - `product` - Catalogue items (slug and name UNIQUE as `product_slug_key`
//!   and `product_name_key`)
//! - `address` - Delivery addresses (`account_id` references `account`)
//!
//! # Stores
//!
//! Services talk to the [`ProductStore`], [`AddressStore`], and
//! [`AccountStore`] traits. Two implementations exist: the `PostgreSQL`
//! repositories in this module and the process-local [`MemoryStore`]. Both
//! report uniqueness violations as [`RepositoryError::Conflict`] and a missing
//! parent row as [`RepositoryError::NotFound`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p trattoria-cli -- migrate
//! ```

pub mod accounts;
pub mod addresses;
pub mod memory;
pub mod products;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use trattoria_core::{AccountId, AddressId, Email, ProductId};

use crate::models::{
    Account, AccountFilter, AccountSort, Address, AddressFilter, NewAccount, NewAddress,
    NewProduct, Product,
};

pub use accounts::AccountRepository;
pub use addresses::AddressRepository;
pub use memory::MemoryStore;
pub use products::ProductRepository;

/// Unique constraint that a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    /// `product.slug`
    Slug,
    /// `product.name`
    Name,
    /// `account.email`
    Email,
}

impl UniqueKey {
    /// Map a `PostgreSQL` constraint name to the key it guards.
    #[must_use]
    pub fn from_constraint(name: &str) -> Option<Self> {
        match name {
            "product_slug_key" => Some(Self::Slug),
            "product_name_key" => Some(Self::Name),
            "account_email_key" => Some(Self::Email),
            _ => None,
        }
    }
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Slug => "slug",
            Self::Name => "name",
            Self::Email => "email",
        })
    }
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity (or a referenced parent) was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation.
    #[error("{0} already exists")]
    Conflict(UniqueKey),
}

/// Classify a failed write.
///
/// Unique violations on a known constraint become [`RepositoryError::Conflict`];
/// foreign key violations become [`RepositoryError::NotFound`].
pub(crate) fn classify_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation()
            && let Some(key) = db_err.constraint().and_then(UniqueKey::from_constraint)
        {
            return RepositoryError::Conflict(key);
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}

/// Catalogue persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Whether any item uses `slug`.
    async fn exists_by_slug(&self, slug: &str) -> Result<bool, RepositoryError>;

    /// Whether any item other than `excluding` uses `name`.
    async fn exists_by_name(
        &self,
        name: &str,
        excluding: Option<ProductId>,
    ) -> Result<bool, RepositoryError>;

    /// Insert a new item. Fails with `Conflict(Slug | Name)` on a collision.
    async fn insert(&self, product: &NewProduct) -> Result<Product, RepositoryError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError>;

    /// Newest first, ties broken by id descending.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Product>, RepositoryError>;

    /// Overwrite every mutable column of the row with `product.id`.
    ///
    /// Returns `NotFound` if the row is gone and `Conflict` on a collision.
    async fn update(&self, product: &Product) -> Result<Product, RepositoryError>;

    /// Returns the number of rows removed.
    async fn delete_by_slug(&self, slug: &str) -> Result<u64, RepositoryError>;

    /// Round-trip to the backing store.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Address persistence.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Returns `NotFound` when the owning account does not exist.
    async fn insert(&self, address: &NewAddress) -> Result<Address, RepositoryError>;

    async fn find_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError>;

    /// Newest first.
    async fn list_by_owner(&self, owner: AccountId) -> Result<Vec<Address>, RepositoryError>;

    /// Overwrite every mutable column. Returns `NotFound` if the row is gone.
    async fn update(&self, address: &Address) -> Result<Address, RepositoryError>;

    /// Returns the number of rows removed.
    async fn delete_by_id(&self, id: AddressId) -> Result<u64, RepositoryError>;

    /// Newest first.
    async fn list_filtered(
        &self,
        filter: &AddressFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Address>, RepositoryError>;

    async fn count(&self, filter: &AddressFilter) -> Result<u64, RepositoryError>;
}

/// Account persistence.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;

    /// Fails with `Conflict(Email)` when the email is taken.
    async fn insert(&self, account: &NewAccount) -> Result<Account, RepositoryError>;

    async fn list_filtered(
        &self,
        filter: &AccountFilter,
        sort: AccountSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, RepositoryError>;

    async fn count(&self, filter: &AccountFilter) -> Result<u64, RepositoryError>;

    /// Case-insensitive substring match, ordered by email ascending.
    async fn search_by_email(&self, fragment: &str) -> Result<Vec<Account>, RepositoryError>;
}

/// The three stores a running service uses.
#[derive(Clone)]
pub struct Stores {
    pub products: Arc<dyn ProductStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub accounts: Arc<dyn AccountStore>,
}

impl Stores {
    /// Repositories sharing one `PostgreSQL` pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            products: Arc::new(ProductRepository::new(pool.clone())),
            addresses: Arc::new(AddressRepository::new(pool.clone())),
            accounts: Arc::new(AccountRepository::new(pool.clone())),
        }
    }

    /// All three stores backed by one [`MemoryStore`].
    #[must_use]
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            products: store.clone(),
            addresses: store.clone(),
            accounts: store,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Convert a row count returned by `COUNT(*)`.
pub(crate) fn count_from_db(count: i64) -> Result<u64, RepositoryError> {
    u64::try_from(count)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative row count: {count}")))
}
