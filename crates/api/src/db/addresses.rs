//! Address repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use trattoria_core::{AccountId, AddressId};

use super::{AddressStore, RepositoryError, classify_write_error, count_from_db};
use crate::models::{Address, AddressFilter, NewAddress};

const ADDRESS_COLUMNS: &str = "id, account_id, label, apartment, floor, entrance, street, city, \
                               phone, comment, created_at, updated_at";

/// Shared `WHERE` clause for the filtered listing and its count.
///
/// Parameters: `$1` owner, `$2` city, `$3` street, `$4` phone, `$5` label.
const FILTER_CLAUSE: &str = r"
    ($1::int IS NULL OR account_id = $1)
    AND ($2::text IS NULL OR city ILIKE '%' || $2 || '%')
    AND ($3::text IS NULL OR street ILIKE '%' || $3 || '%')
    AND ($4::text IS NULL OR phone ILIKE '%' || $4 || '%')
    AND ($5::text IS NULL OR label = $5)
";

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    account_id: AccountId,
    label: String,
    apartment: String,
    floor: String,
    entrance: String,
    street: String,
    city: String,
    phone: String,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            account_id: row.account_id,
            label: row.label,
            apartment: row.apartment,
            floor: row.floor,
            entrance: row.entrance,
            street: row.street,
            city: row.city,
            phone: row.phone,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for address database operations.
#[derive(Clone)]
pub struct AddressRepository {
    pool: PgPool,
}

impl AddressRepository {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressStore for AddressRepository {
    async fn insert(&self, address: &NewAddress) -> Result<Address, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO address
                (account_id, label, apartment, floor, entrance, street, city, phone, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ADDRESS_COLUMNS}
            "
        );
        let row: AddressRow = sqlx::query_as(&sql)
            .bind(address.account_id)
            .bind(&address.label)
            .bind(&address.apartment)
            .bind(&address.floor)
            .bind(&address.entrance)
            .bind(&address.street)
            .bind(&address.city)
            .bind(&address.phone)
            .bind(&address.comment)
            .fetch_one(&self.pool)
            .await
            .map_err(classify_write_error)?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM address WHERE id = $1");
        let row: Option<AddressRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Address::from))
    }

    async fn list_by_owner(&self, owner: AccountId) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM address WHERE account_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<AddressRow> = sqlx::query_as(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Address::from).collect())
    }

    async fn update(&self, address: &Address) -> Result<Address, RepositoryError> {
        let sql = format!(
            r"
            UPDATE address
            SET label = $2, apartment = $3, floor = $4, entrance = $5, street = $6,
                city = $7, phone = $8, comment = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {ADDRESS_COLUMNS}
            "
        );
        let row: Option<AddressRow> = sqlx::query_as(&sql)
            .bind(address.id)
            .bind(&address.label)
            .bind(&address.apartment)
            .bind(&address.floor)
            .bind(&address.entrance)
            .bind(&address.street)
            .bind(&address.city)
            .bind(&address.phone)
            .bind(&address.comment)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Address::from).ok_or(RepositoryError::NotFound)
    }

    async fn delete_by_id(&self, id: AddressId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM address WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_filtered(
        &self,
        filter: &AddressFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM address WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id DESC LIMIT $6 OFFSET $7"
        );
        let rows: Vec<AddressRow> = sqlx::query_as(&sql)
            .bind(filter.owner)
            .bind(filter.city.as_deref())
            .bind(filter.street.as_deref())
            .bind(filter.phone.as_deref())
            .bind(filter.label.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Address::from).collect())
    }

    async fn count(&self, filter: &AddressFilter) -> Result<u64, RepositoryError> {
        let sql = format!("SELECT COUNT(*) FROM address WHERE {FILTER_CLAUSE}");
        let row: (i64,) = sqlx::query_as(&sql)
            .bind(filter.owner)
            .bind(filter.city.as_deref())
            .bind(filter.street.as_deref())
            .bind(filter.phone.as_deref())
            .bind(filter.label.as_deref())
            .fetch_one(&self.pool)
            .await?;
        count_from_db(row.0)
    }
}
