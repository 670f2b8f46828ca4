//! Slug allocation.
//!
//! The existence check and the insert are separate round-trips, so another
//! writer can claim a candidate in between. The resolver therefore owns the
//! insert: the `UNIQUE(slug)` constraint is the source of truth, and a slug
//! conflict at insert time sends it back for a fresh suffixed candidate.
//!
//! Candidates are `base`, then `base-xxxxxxxx` with 8 random lowercase hex
//! characters. A suffix is always appended to the base, never to a previous
//! candidate.

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use trattoria_core::with_suffix;

use super::{ServiceError, cancellable, guarded};
use crate::db::{ProductStore, RepositoryError, UniqueKey};
use crate::models::{NewProduct, Product};

/// Insert attempts before a persistent slug race is reported as a conflict.
pub const MAX_INSERT_ATTEMPTS: u32 = 5;

/// Eight lowercase hex characters.
#[must_use]
pub fn random_suffix() -> String {
    format!("{:08x}", rand::rng().random::<u32>())
}

/// Produces slugs that are unique against a [`ProductStore`].
pub struct SlugResolver<'a> {
    products: &'a dyn ProductStore,
    suffixes: Box<dyn FnMut() -> String + Send + 'a>,
}

impl<'a> SlugResolver<'a> {
    /// Resolver drawing random suffixes.
    #[must_use]
    pub fn new(products: &'a dyn ProductStore) -> Self {
        Self::with_suffixes(products, random_suffix)
    }

    /// Resolver drawing suffixes from `suffixes`.
    #[must_use]
    pub fn with_suffixes(
        products: &'a dyn ProductStore,
        suffixes: impl FnMut() -> String + Send + 'a,
    ) -> Self {
        Self {
            products,
            suffixes: Box::new(suffixes),
        }
    }

    /// First free candidate for `base`, which is tried as-is first.
    ///
    /// Taken candidates are skipped without bound; only a store error or
    /// cancellation stops the search.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unavailable`] or [`ServiceError::Cancelled`].
    pub async fn unique_slug(
        &mut self,
        base: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError> {
        if !guarded(cancel, self.products.exists_by_slug(base)).await? {
            return Ok(base.to_owned());
        }
        self.suffixed_slug(base, cancel).await
    }

    async fn suffixed_slug(
        &mut self,
        base: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError> {
        loop {
            let candidate = with_suffix(base, &(self.suffixes)());
            if !guarded(cancel, self.products.exists_by_slug(&candidate)).await? {
                return Ok(candidate);
            }
            debug!(%candidate, "slug candidate taken");
        }
    }

    /// Insert `product` under a unique slug derived from `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Conflict`] if the name was claimed concurrently
    /// or if every one of [`MAX_INSERT_ATTEMPTS`] inserts lost a slug race.
    #[instrument(skip(self, product, cancel), fields(name = %product.name))]
    pub async fn insert(
        &mut self,
        base: &str,
        mut product: NewProduct,
        cancel: &CancellationToken,
    ) -> Result<Product, ServiceError> {
        product.slug = self.unique_slug(base, cancel).await?;

        for attempt in 1..=MAX_INSERT_ATTEMPTS {
            match cancellable(cancel, self.products.insert(&product)).await? {
                Ok(created) => return Ok(created),
                Err(RepositoryError::Conflict(UniqueKey::Slug)) => {
                    warn!(attempt, slug = %product.slug, "slug claimed concurrently, retrying");
                    if attempt < MAX_INSERT_ATTEMPTS {
                        product.slug = self.suffixed_slug(base, cancel).await?;
                    }
                }
                Err(RepositoryError::Conflict(UniqueKey::Name)) => {
                    return Err(ServiceError::Conflict(
                        "product with this name already exists".to_owned(),
                    ));
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(ServiceError::Conflict(format!(
            "could not allocate a unique slug for '{base}'"
        )))
    }
}
