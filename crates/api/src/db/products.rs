//! Product repository for database operations.
//!
//! Queries are checked at runtime (`query_as`) so the crate builds without a
//! live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use trattoria_core::{Price, ProductId, Rating};

use super::{ProductStore, RepositoryError, classify_write_error};
use crate::models::{NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, slug, name, kind, tags, price, ingredients, image, rating, \
                               created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    slug: String,
    name: String,
    kind: String,
    tags: Vec<String>,
    price: i32,
    ingredients: Vec<String>,
    image: String,
    rating: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(i64::from(row.price)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;
        let rating = Rating::new(row.rating).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            kind: row.kind,
            tags: row.tags,
            price,
            ingredients: row.ingredients,
            image: row.image,
            rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for catalogue database operations.
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn exists_by_slug(&self, slug: &str) -> Result<bool, RepositoryError> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM product WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn exists_by_name(
        &self,
        name: &str,
        excluding: Option<ProductId>,
    ) -> Result<bool, RepositoryError> {
        let row: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS(
                SELECT 1 FROM product
                WHERE name = $1 AND ($2::int IS NULL OR id <> $2)
            )
            ",
        )
        .bind(name)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    #[instrument(skip(self, product), fields(slug = %product.slug))]
    async fn insert(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO product (slug, name, kind, tags, price, ingredients, image, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        let row: ProductRow = sqlx::query_as(&sql)
            .bind(&product.slug)
            .bind(&product.name)
            .bind(&product.kind)
            .bind(&product.tags)
            .bind(product.price.minor_units())
            .bind(&product.ingredients)
            .bind(&product.image)
            .bind(product.rating.value())
            .fetch_one(&self.pool)
            .await
            .map_err(classify_write_error)?;

        row.try_into()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE slug = $1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM product
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id, slug = %product.slug))]
    async fn update(&self, product: &Product) -> Result<Product, RepositoryError> {
        let sql = format!(
            r"
            UPDATE product
            SET slug = $2, name = $3, kind = $4, tags = $5, price = $6,
                ingredients = $7, image = $8, rating = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        );
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(product.id)
            .bind(&product.slug)
            .bind(&product.name)
            .bind(&product.kind)
            .bind(&product.tags)
            .bind(product.price.minor_units())
            .bind(&product.ingredients)
            .bind(&product.image)
            .bind(product.rating.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify_write_error)?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
