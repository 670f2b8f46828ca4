//! Account repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use trattoria_core::{AccountId, Email};

use super::{AccountStore, RepositoryError, classify_write_error, count_from_db};
use crate::models::{Account, AccountFilter, AccountSort, NewAccount};

const ACCOUNT_COLUMNS: &str = "id, email, name, password_hash, created_at, updated_at";

/// Parameters: `$1` name fragment, `$2` email fragment.
const FILTER_CLAUSE: &str = r"
    ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
    AND ($2::text IS NULL OR email ILIKE '%' || $2 || '%')
";

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: AccountId,
    email: String,
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            name: row.name,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for account database operations.
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE email = $1");
        let row: Option<AccountRow> = sqlx::query_as(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Account::try_from).transpose()
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = $1");
        let row: Option<AccountRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Account::try_from).transpose()
    }

    async fn insert(&self, account: &NewAccount) -> Result<Account, RepositoryError> {
        let sql = format!(
            "INSERT INTO account (email, name, password_hash) VALUES ($1, $2, $3) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row: AccountRow = sqlx::query_as(&sql)
            .bind(account.email.as_str())
            .bind(&account.name)
            .bind(&account.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(classify_write_error)?;
        row.try_into()
    }

    async fn list_filtered(
        &self,
        filter: &AccountFilter,
        sort: AccountSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, RepositoryError> {
        // `order_by` only yields fixed column lists, never user input.
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE {FILTER_CLAUSE} \
             ORDER BY {} LIMIT $3 OFFSET $4",
            sort.order_by()
        );
        let rows: Vec<AccountRow> = sqlx::query_as(&sql)
            .bind(filter.name.as_deref())
            .bind(filter.email.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Account::try_from).collect()
    }

    async fn count(&self, filter: &AccountFilter) -> Result<u64, RepositoryError> {
        let sql = format!("SELECT COUNT(*) FROM account WHERE {FILTER_CLAUSE}");
        let row: (i64,) = sqlx::query_as(&sql)
            .bind(filter.name.as_deref())
            .bind(filter.email.as_deref())
            .fetch_one(&self.pool)
            .await?;
        count_from_db(row.0)
    }

    async fn search_by_email(&self, fragment: &str) -> Result<Vec<Account>, RepositoryError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE email ILIKE '%' || $1 || '%' \
             ORDER BY email ASC"
        );
        let rows: Vec<AccountRow> = sqlx::query_as(&sql)
            .bind(fragment)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Account::try_from).collect()
    }
}
