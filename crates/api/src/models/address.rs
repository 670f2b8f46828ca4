//! Delivery address types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use trattoria_core::{AccountId, AddressId, Merge, Patch, PatchSet};

use super::{ValidationError, require_text};

/// A delivery address owned by one account (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub id: AddressId,
    /// Owning account; set at creation and never reassigned.
    pub account_id: AccountId,
    /// Free-form tag such as "home" or "work".
    pub label: String,
    pub apartment: String,
    pub floor: String,
    pub entrance: String,
    pub street: String,
    pub city: String,
    pub phone: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated address ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub account_id: AccountId,
    pub label: String,
    pub apartment: String,
    pub floor: String,
    pub entrance: String,
    pub street: String,
    pub city: String,
    pub phone: String,
    pub comment: String,
}

/// `POST /user/address` body.
///
/// Every field defaults to empty so that a missing required field is reported
/// by [`CreateAddress::validate`] rather than as a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateAddress {
    pub label: String,
    pub apartment: String,
    pub floor: String,
    pub entrance: String,
    pub street: String,
    pub city: String,
    pub phone: String,
    pub comment: String,
}

impl CreateAddress {
    /// Validate the payload and attach it to `owner`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when label, street, city, or phone is blank.
    pub fn validate(self, owner: AccountId) -> Result<NewAddress, ValidationError> {
        require_text("label", &self.label)?;
        require_text("street", &self.street)?;
        require_text("city", &self.city)?;
        require_text("phone", &self.phone)?;

        Ok(NewAddress {
            account_id: owner,
            label: self.label,
            apartment: self.apartment,
            floor: self.floor,
            entrance: self.entrance,
            street: self.street,
            city: self.city,
            phone: self.phone,
            comment: self.comment,
        })
    }
}

/// `PATCH /user/address/{id}` body. Supplied empty strings clear a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddressPatch {
    pub label: Patch<String>,
    pub apartment: Patch<String>,
    pub floor: Patch<String>,
    pub entrance: Patch<String>,
    pub street: Patch<String>,
    pub city: Patch<String>,
    pub phone: Patch<String>,
    pub comment: Patch<String>,
}

impl PatchSet for AddressPatch {
    fn present_fields(&self) -> usize {
        [
            &self.label,
            &self.apartment,
            &self.floor,
            &self.entrance,
            &self.street,
            &self.city,
            &self.phone,
            &self.comment,
        ]
        .into_iter()
        .filter(|field| field.is_set())
        .count()
    }
}

impl Merge<AddressPatch> for Address {
    fn apply(&mut self, patch: AddressPatch) {
        patch.label.apply_to(&mut self.label);
        patch.apartment.apply_to(&mut self.apartment);
        patch.floor.apply_to(&mut self.floor);
        patch.entrance.apply_to(&mut self.entrance);
        patch.street.apply_to(&mut self.street);
        patch.city.apply_to(&mut self.city);
        patch.phone.apply_to(&mut self.phone);
        patch.comment.apply_to(&mut self.comment);
    }
}

/// Filters for the administrative address listing.
///
/// Text filters on city, street, and phone match case-insensitive
/// substrings; `label` and `owner` match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFilter {
    pub owner: Option<AccountId>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub phone: Option<String>,
    pub label: Option<String>,
}

/// Wire shape of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressResponse {
    pub id: AddressId,
    pub user_id: AccountId,
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub apartment: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub floor: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entrance: String,
    pub street: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl From<Address> for AddressResponse {
    fn from(address: Address) -> Self {
        Self {
            id: address.id,
            user_id: address.account_id,
            label: address.label,
            apartment: address.apartment,
            floor: address.floor,
            entrance: address.entrance,
            street: address.street,
            city: address.city,
            phone: address.phone,
            comment: address.comment,
            created_at: address.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn address() -> Address {
        let created = Utc.with_ymd_and_hms(2025, 10, 7, 12, 0, 0).unwrap();
        Address {
            id: AddressId::new(7),
            account_id: AccountId::new(1),
            label: "home".to_owned(),
            apartment: "277".to_owned(),
            floor: "3".to_owned(),
            entrance: "1".to_owned(),
            street: "Lenina 10".to_owned(),
            city: "Moscow".to_owned(),
            phone: "+7 800 555 35 55".to_owned(),
            comment: "Call first".to_owned(),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_create_requires_fields() {
        let missing_phone = CreateAddress {
            label: "home".to_owned(),
            street: "Lenina 10".to_owned(),
            city: "Moscow".to_owned(),
            ..CreateAddress::default()
        };
        let err = missing_phone.validate(AccountId::new(1)).unwrap_err();
        assert_eq!(err.0, "phone is required");
    }

    #[test]
    fn test_patch_clears_with_empty_string() {
        let patch: AddressPatch = serde_json::from_str(r#"{"comment": ""}"#).unwrap();
        assert_eq!(patch.present_fields(), 1);

        let merged = trattoria_core::merge(address(), patch).unwrap();
        assert!(merged.comment.is_empty());
        assert_eq!(merged.street, "Lenina 10");
        assert_eq!(merged.account_id, AccountId::new(1));
    }

    #[test]
    fn test_response_shape() {
        let mut record = address();
        record.floor.clear();

        let json = serde_json::to_value(AddressResponse::from(record)).unwrap();
        assert_eq!(json["user_id"], 1);
        assert_eq!(json["created_at"], "2025-10-07T12:00:00Z");
        assert!(json.get("floor").is_none());
    }
}
