//! Catalogue prices in currency minor units.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    /// Zero or negative amount.
    #[error("price must be > 0 (got {0})")]
    NotPositive(i64),
    /// Amount does not fit the storage column.
    #[error("price is too large")]
    Overflow,
}

/// A strictly positive price expressed in minor units (e.g. kopecks, cents).
///
/// Stored as a 32-bit integer to match the `product.price` column.
///
/// ```
/// use trattoria_core::Price;
///
/// assert_eq!(Price::new(499).unwrap().minor_units(), 499);
/// assert!(Price::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Price(i32);

impl Price {
    /// Create a price from minor units.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotPositive`] for zero or negative amounts and
    /// [`PriceError::Overflow`] when the amount exceeds `i32::MAX`.
    pub fn new(minor_units: i64) -> Result<Self, PriceError> {
        if minor_units <= 0 {
            return Err(PriceError::NotPositive(minor_units));
        }
        i32::try_from(minor_units)
            .map(Self)
            .map_err(|_| PriceError::Overflow)
    }

    /// The amount in minor units.
    #[must_use]
    pub const fn minor_units(self) -> i32 {
        self.0
    }
}

impl TryFrom<i64> for Price {
    type Error = PriceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        Self::from(price.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
