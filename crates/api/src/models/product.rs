//! Catalogue item types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use trattoria_core::{Merge, Patch, PatchSet, Price, ProductId, Rating};

use super::{ValidationError, require_text};

/// Longest accepted category label, in characters.
pub const MAX_KIND_LENGTH: usize = 64;

/// A catalogue item (domain type).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    /// Store-assigned identity; never changes.
    pub id: ProductId,
    /// Unique external identity, changed only through an explicit rename.
    pub slug: String,
    /// Unique display name.
    pub name: String,
    /// Category label (e.g. "pizza").
    #[serde(rename = "type")]
    pub kind: String,
    pub tags: Vec<String>,
    pub price: Price,
    pub ingredients: Vec<String>,
    /// Absolute image URL, or empty.
    pub image: String,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated catalogue item ready to be inserted under `slug`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub slug: String,
    pub name: String,
    pub kind: String,
    pub tags: Vec<String>,
    pub price: Price,
    pub ingredients: Vec<String>,
    pub image: String,
    pub rating: Rating,
}

/// `POST /products` body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: i64,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: f64,
}

impl CreateProduct {
    /// Validate the payload. The returned value carries an empty slug; the
    /// uniqueness resolver fills it in.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first invalid field.
    pub fn validate(self) -> Result<NewProduct, ValidationError> {
        require_text("name", &self.name)?;
        validate_kind(&self.kind)?;
        validate_tags(&self.tags)?;
        validate_image(&self.image)?;
        let price = parse_price(self.price)?;
        let rating = parse_rating(self.rating)?;

        Ok(NewProduct {
            slug: String::new(),
            name: self.name.trim().to_owned(),
            kind: self.kind,
            tags: self.tags,
            price,
            ingredients: self.ingredients,
            image: self.image,
            rating,
        })
    }
}

/// `PATCH /products/{slug}` body. Omitted fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub name: Patch<String>,
    #[serde(rename = "type")]
    pub kind: Patch<String>,
    pub tags: Patch<Vec<String>>,
    pub price: Patch<i64>,
    pub ingredients: Patch<Vec<String>>,
    pub image: Patch<String>,
    pub rating: Patch<f64>,
}

impl ProductPatch {
    /// Validate every supplied field.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first invalid field.
    pub fn validate(self) -> Result<ProductChanges, ValidationError> {
        let name = self.name.try_map(|name| {
            require_text("name", &name)?;
            Ok::<_, ValidationError>(name.trim().to_owned())
        })?;
        let kind = self.kind.try_map(|kind| validate_kind(&kind).map(|()| kind))?;
        let tags = self.tags.try_map(|tags| validate_tags(&tags).map(|()| tags))?;
        let image = self.image.try_map(|image| validate_image(&image).map(|()| image))?;

        Ok(ProductChanges {
            name,
            kind,
            tags,
            price: self.price.try_map(parse_price)?,
            ingredients: self.ingredients,
            image,
            rating: self.rating.try_map(parse_rating)?,
        })
    }
}

/// A validated [`ProductPatch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Patch<String>,
    pub kind: Patch<String>,
    pub tags: Patch<Vec<String>>,
    pub price: Patch<Price>,
    pub ingredients: Patch<Vec<String>>,
    pub image: Patch<String>,
    pub rating: Patch<Rating>,
}

impl PatchSet for ProductChanges {
    fn present_fields(&self) -> usize {
        [
            self.name.is_set(),
            self.kind.is_set(),
            self.tags.is_set(),
            self.price.is_set(),
            self.ingredients.is_set(),
            self.image.is_set(),
            self.rating.is_set(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

impl Merge<ProductChanges> for Product {
    fn apply(&mut self, patch: ProductChanges) {
        patch.name.apply_to(&mut self.name);
        patch.kind.apply_to(&mut self.kind);
        patch.tags.apply_to(&mut self.tags);
        patch.price.apply_to(&mut self.price);
        patch.ingredients.apply_to(&mut self.ingredients);
        patch.image.apply_to(&mut self.image);
        patch.rating.apply_to(&mut self.rating);
    }
}

fn validate_kind(kind: &str) -> Result<(), ValidationError> {
    if kind.chars().count() > MAX_KIND_LENGTH {
        return Err(ValidationError::new(format!(
            "type must be at most {MAX_KIND_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(ValidationError::new("tags cannot contain empty values"));
    }
    Ok(())
}

fn validate_image(image: &str) -> Result<(), ValidationError> {
    if image.is_empty() {
        return Ok(());
    }
    match Url::parse(image) {
        Ok(url) if !url.cannot_be_a_base() && url.has_host() => Ok(()),
        _ => Err(ValidationError::new("image must be an absolute URL")),
    }
}

fn parse_price(price: i64) -> Result<Price, ValidationError> {
    Price::new(price).map_err(|e| ValidationError::new(e.to_string()))
}

fn parse_rating(rating: f64) -> Result<Rating, ValidationError> {
    Rating::new(rating).map_err(|e| ValidationError::new(e.to_string()))
}
