//! Partial updates.
//!
//! A patch document carries one [`Patch<T>`] per mutable field. Fields left
//! out of the request body deserialize to [`Patch::Absent`] and leave the
//! stored value alone; fields that are present, including `""`, `0`, and
//! `[]`, deserialize to [`Patch::Set`] and overwrite it.
//!
//! Patch structs use `#[serde(default)]` so that omitted keys fall back to
//! `Absent`:
//!
//! ```
//! use serde::Deserialize;
//! use trattoria_core::{Patch, PatchSet};
//!
//! #[derive(Deserialize, Default)]
//! #[serde(default)]
//! struct Rename {
//!     name: Patch<String>,
//!     comment: Patch<String>,
//! }
//!
//! impl PatchSet for Rename {
//!     fn present_fields(&self) -> usize {
//!         usize::from(self.name.is_set()) + usize::from(self.comment.is_set())
//!     }
//! }
//!
//! let patch: Rename = serde_json::from_str(r#"{"comment": ""}"#).unwrap();
//! assert!(patch.name.is_absent());
//! assert_eq!(patch.comment.as_set().map(String::as_str), Some(""));
//! assert_eq!(patch.present_fields(), 1);
//! ```

use serde::{Deserialize, Deserializer};

/// One field of a partial update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Field was not supplied; keep the stored value.
    #[default]
    Absent,
    /// Field was supplied; overwrite the stored value.
    Set(T),
}

impl<T> Patch<T> {
    /// Whether the field was supplied.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Whether the field was left out.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Borrow the supplied value, if any.
    #[must_use]
    pub const fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Overwrite `target` when the field was supplied.
    pub fn apply_to(self, target: &mut T) {
        if let Self::Set(value) = self {
            *target = value;
        }
    }

    /// Convert the supplied value, keeping `Absent` as is.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Patch<U>, E> {
        match self {
            Self::Set(value) => f(value).map(Patch::Set),
            Self::Absent => Ok(Patch::Absent),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Set)
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the key is present; omitted keys use `Default`.
        T::deserialize(deserializer).map(Self::Set)
    }
}

/// A patch document made of [`Patch`] fields.
pub trait PatchSet {
    /// Number of fields in the [`Patch::Set`] state.
    fn present_fields(&self) -> usize;

    /// `true` when no field was supplied.
    fn is_empty(&self) -> bool {
        self.present_fields() == 0
    }
}

/// A record that can absorb a patch document of type `P`.
pub trait Merge<P: PatchSet> {
    /// Overwrite every field that `patch` sets.
    fn apply(&mut self, patch: P);
}

/// Errors produced by [`merge`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeError {
    /// The patch did not set a single field.
    #[error("at least one field required")]
    EmptyPatch,
}

/// Merge `patch` onto `existing`, returning the updated record.
///
/// # Errors
///
/// Returns [`MergeError::EmptyPatch`] when `patch` sets no fields. Emptiness
/// counts supplied fields, so `{"comment": ""}` is a valid one-field patch.
pub fn merge<R, P>(mut existing: R, patch: P) -> Result<R, MergeError>
where
    R: Merge<P>,
    P: PatchSet,
{
    if patch.is_empty() {
        return Err(MergeError::EmptyPatch);
    }
    existing.apply(patch);
    Ok(existing)
}
