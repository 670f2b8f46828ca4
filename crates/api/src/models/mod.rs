//! Domain models for the API.
//!
//! These types represent validated domain objects separate from database row
//! types. Request payloads live next to the record they create or patch and
//! are turned into validated values before any store call.

pub mod account;
pub mod address;
pub mod product;

pub use account::{Account, AccountFilter, AccountSort, NewAccount, UserResponse};
pub use address::{
    Address, AddressFilter, AddressPatch, AddressResponse, CreateAddress, NewAddress,
};
pub use product::{CreateProduct, NewProduct, Product, ProductChanges, ProductPatch};

/// A request payload failed domain validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Reject a blank required text field.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("{field} is required")));
    }
    Ok(())
}
