//! Catalogue mutation service.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use trattoria_core::{PatchSet, merge, slugify};

use super::{ServiceError, SlugResolver, cancellable, guarded};
use crate::db::{ProductStore, RepositoryError, UniqueKey};
use crate::models::{CreateProduct, Product, ProductPatch};

/// Page size when a listing leaves `limit` out or sends 0.
pub const DEFAULT_LIST_LIMIT: i64 = 20;
/// Largest page a listing returns.
pub const MAX_LIST_LIMIT: i64 = 100;

/// Catalogue operations keyed by slug.
pub struct CatalogueService<'a> {
    products: &'a dyn ProductStore,
}

impl<'a> CatalogueService<'a> {
    /// Create a new catalogue service.
    #[must_use]
    pub const fn new(products: &'a dyn ProductStore) -> Self {
        Self { products }
    }

    /// Validate and insert a new item under a freshly allocated slug.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for invalid fields or a name already in use, and
    /// `Conflict` when a concurrent writer wins the name or every slug attempt.
    #[instrument(skip(self, payload, cancel), fields(name = %payload.name))]
    pub async fn create(
        &self,
        payload: CreateProduct,
        cancel: &CancellationToken,
    ) -> Result<Product, ServiceError> {
        let product = payload.validate()?;

        if guarded(cancel, self.products.exists_by_name(&product.name, None)).await? {
            return Err(ServiceError::Validation(
                "product with this name already exists".to_owned(),
            ));
        }

        let base = slugify(&product.name);
        let created = SlugResolver::new(self.products)
            .insert(&base, product, cancel)
            .await?;

        info!(product_id = %created.id, slug = %created.slug, "product created");
        Ok(created)
    }

    /// Fetch an item by slug.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no item has this slug.
    pub async fn retrieve(
        &self,
        slug: &str,
        cancel: &CancellationToken,
    ) -> Result<Product, ServiceError> {
        guarded(cancel, self.products.find_by_slug(slug))
            .await?
            .ok_or_else(product_not_found)
    }

    /// Newest items first.
    ///
    /// A missing or zero `limit` means [`DEFAULT_LIST_LIMIT`]; larger limits
    /// are capped at [`MAX_LIST_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns `Validation` for negative bounds.
    pub async fn list(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Product>, ServiceError> {
        let (limit, offset) = list_bounds(limit, offset)?;
        guarded(cancel, self.products.list(limit, offset)).await
    }

    /// Apply a partial update to the item at `slug`.
    ///
    /// The slug never changes here; see [`Self::change_slug`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown slug, `Validation` for an empty patch,
    /// invalid fields, or a name used by another item, and `Conflict` when a
    /// concurrent writer claims the name first.
    #[instrument(skip(self, patch, cancel))]
    pub async fn update(
        &self,
        slug: &str,
        patch: ProductPatch,
        cancel: &CancellationToken,
    ) -> Result<Product, ServiceError> {
        let existing = self.retrieve(slug, cancel).await?;
        let changes = patch.validate()?;

        if let Some(name) = changes.name.as_set()
            && *name != existing.name
            && guarded(cancel, self.products.exists_by_name(name, Some(existing.id))).await?
        {
            return Err(ServiceError::Validation(
                "product with this name already exists".to_owned(),
            ));
        }

        let fields = changes.present_fields();
        let merged = merge(existing, changes)?;

        let updated = match cancellable(cancel, self.products.update(&merged)).await? {
            Ok(updated) => updated,
            Err(RepositoryError::NotFound) => return Err(product_not_found()),
            Err(RepositoryError::Conflict(UniqueKey::Name)) => {
                return Err(ServiceError::Conflict(
                    "product with this name already exists".to_owned(),
                ));
            }
            Err(other) => return Err(other.into()),
        };

        info!(product_id = %updated.id, fields, "product updated");
        Ok(updated)
    }

    /// Move the item at `current_slug` to the canonical slug of `seed`.
    ///
    /// The seed is always re-slugified. Identity and creation time are kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown slug, `Validation` for a blank seed
    /// or a slug used by another item, and `Conflict` when a concurrent writer
    /// claims the slug first.
    #[instrument(skip(self, cancel))]
    pub async fn change_slug(
        &self,
        current_slug: &str,
        seed: &str,
        cancel: &CancellationToken,
    ) -> Result<Product, ServiceError> {
        if seed.trim().is_empty() {
            return Err(ServiceError::Validation("slug is required".to_owned()));
        }

        let mut product = self.retrieve(current_slug, cancel).await?;
        let next = slugify(seed);
        if next == product.slug {
            return Ok(product);
        }

        if guarded(cancel, self.products.exists_by_slug(&next)).await? {
            return Err(ServiceError::Validation(format!("slug '{next}' is already in use")));
        }

        product.slug = next;
        let updated = match cancellable(cancel, self.products.update(&product)).await? {
            Ok(updated) => updated,
            Err(RepositoryError::NotFound) => return Err(product_not_found()),
            Err(RepositoryError::Conflict(UniqueKey::Slug)) => {
                return Err(ServiceError::Conflict(format!(
                    "slug '{}' was taken concurrently",
                    product.slug
                )));
            }
            Err(other) => return Err(other.into()),
        };

        info!(product_id = %updated.id, from = current_slug, to = %updated.slug, "product slug changed");
        Ok(updated)
    }

    /// Remove the item at `slug`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing was deleted.
    #[instrument(skip(self, cancel))]
    pub async fn delete(&self, slug: &str, cancel: &CancellationToken) -> Result<(), ServiceError> {
        let removed = guarded(cancel, self.products.delete_by_slug(slug)).await?;
        if removed == 0 {
            return Err(product_not_found());
        }
        info!(slug, "product deleted");
        Ok(())
    }
}

fn product_not_found() -> ServiceError {
    ServiceError::NotFound("product not found".to_owned())
}

/// Normalize listing bounds.
fn list_bounds(limit: Option<i64>, offset: Option<i64>) -> Result<(i64, i64), ServiceError> {
    let limit = limit.unwrap_or(0);
    let offset = offset.unwrap_or(0);
    if limit < 0 || offset < 0 {
        return Err(ServiceError::Validation(
            "limit and offset must not be negative".to_owned(),
        ));
    }
    let limit = if limit == 0 {
        DEFAULT_LIST_LIMIT
    } else {
        limit.min(MAX_LIST_LIMIT)
    };
    Ok((limit, offset))
}
