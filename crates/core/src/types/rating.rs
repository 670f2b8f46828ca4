//! Bounded catalogue rating.

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum RatingError {
    /// Value outside `[0, 5]` or not a number.
    #[error("rating must be between 0 and 5 (got {0})")]
    OutOfRange(f64),
}

/// A rating in the closed interval `[0, 5]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(f64);

impl Rating {
    /// Lowest allowed rating.
    pub const MIN: f64 = 0.0;
    /// Highest allowed rating.
    pub const MAX: f64 = 5.0;

    /// Create a rating.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] for NaN or values outside `[0, 5]`.
    pub fn new(value: f64) -> Result<Self, RatingError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RatingError::OutOfRange(value))
        }
    }

    /// The raw value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Rating {
    type Error = RatingError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Rating::new(0.0).is_ok());
        assert!(Rating::new(5.0).is_ok());
        assert!(Rating::new(4.5).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_and_nan() {
        assert!(Rating::new(-0.1).is_err());
        assert!(Rating::new(5.01).is_err());
        assert!(Rating::new(f64::NAN).is_err());
        assert!(Rating::new(f64::INFINITY).is_err());
    }
}
