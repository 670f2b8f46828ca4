//! Account domain types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use trattoria_core::{AccountId, Email};

/// A registered account (domain type).
///
/// Accounts are created on registration and are never mutated by the
/// catalogue or address services. `Debug` is implemented by hand so the
/// password hash never reaches a log line.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    /// Unique, normalized; carried as the `sub` claim of access tokens.
    pub email: Email,
    pub name: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// An account ready to be inserted.
#[derive(Clone)]
pub struct NewAccount {
    pub email: Email,
    pub name: String,
    pub password_hash: String,
}

/// Filters for the administrative user listing (case-insensitive substrings).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Sort order for the administrative user listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountSort {
    NameAsc,
    NameDesc,
    EmailAsc,
    EmailDesc,
    CreatedAtAsc,
    #[default]
    CreatedAtDesc,
}

impl AccountSort {
    /// Parse a `sort` query value. Unknown or missing keys use the default.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("name") => Self::NameAsc,
            Some("name_desc") => Self::NameDesc,
            Some("email") => Self::EmailAsc,
            Some("email_desc") => Self::EmailDesc,
            Some("created_at") => Self::CreatedAtAsc,
            _ => Self::CreatedAtDesc,
        }
    }

    /// `ORDER BY` clause. Ties are broken by id so pages are stable.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::NameAsc => "name ASC, id ASC",
            Self::NameDesc => "name DESC, id DESC",
            Self::EmailAsc => "email ASC, id ASC",
            Self::EmailDesc => "email DESC, id DESC",
            Self::CreatedAtAsc => "created_at ASC, id ASC",
            Self::CreatedAtDesc => "created_at DESC, id DESC",
        }
    }
}

/// Wire shape of an account. Never includes credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: AccountId,
    pub email: String,
    pub name: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl From<Account> for UserResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email.into_inner(),
            name: account.name,
            created_at: account.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
