//! Bearer credentials.
//!
//! Two kinds of bearer are accepted: HS256 access tokens naming an account
//! by email, and the static operator token guarding admin routes.

mod token;

pub use token::{Claims, TokenError, TokenService};

const AUTHORIZATION_BEARER_PREFIX: &str = "Bearer ";

/// Maximum bearer token length (8 KiB).
pub const MAX_TOKEN_LENGTH: usize = 8192;

/// Pull the token out of an `Authorization: Bearer ...` header value.
///
/// Returns `None` for a missing header, another scheme, an empty token or an
/// oversized one.
#[must_use]
pub fn extract_bearer_token(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix(AUTHORIZATION_BEARER_PREFIX)?.trim();
    if token.is_empty() || token.len() > MAX_TOKEN_LENGTH {
        return None;
    }
    Some(token)
}

/// Compare two strings without short-circuiting on the first difference.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(Some("Basic abc")), None);
        assert_eq!(extract_bearer_token(Some("Bearer ")), None);
        assert_eq!(extract_bearer_token(None), None);

        let oversized = format!("Bearer {}", "a".repeat(MAX_TOKEN_LENGTH + 1));
        assert_eq!(extract_bearer_token(Some(&oversized)), None);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("secret", "secret"));
        assert!(!constant_time_compare("secret", "secreT"));
        assert!(!constant_time_compare("secret", "secret2"));
        assert!(constant_time_compare("", ""));
    }
}
