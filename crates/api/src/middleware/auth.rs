//! Authentication extractors.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use secrecy::ExposeSecret;

use super::RequestCancellation;
use crate::auth::{constant_time_compare, extract_bearer_token};
use crate::error::{AppError, set_sentry_user};
use crate::services::{Caller, OwnershipGuard, ServiceError};
use crate::state::AppState;

fn bearer(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    extract_bearer_token(header)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))
}

/// Extractor that requires a valid access token for an existing account.
///
/// The token subject is resolved to an account id here, once per request.
///
/// ```rust,ignore
/// async fn handler(RequireCaller(caller): RequireCaller) -> String {
///     caller.email.to_string()
/// }
/// ```
pub struct RequireCaller(pub Caller);

impl FromRequestParts<AppState> for RequireCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let email = state.tokens().verify(bearer(parts)?)?;
        let RequestCancellation(cancel) = parts
            .extensions
            .get::<RequestCancellation>()
            .cloned()
            .unwrap_or_default();

        let caller = match OwnershipGuard::new(state.accounts())
            .resolve(&email, &cancel)
            .await
        {
            Ok(caller) => caller,
            Err(ServiceError::NotFound(_)) => {
                return Err(AppError::Unauthorized("unknown account".to_owned()));
            }
            Err(other) => return Err(other.into()),
        };

        set_sentry_user(&caller.account_id, Some(caller.email.as_str()));
        Ok(Self(caller))
    }
}

/// Extractor that requires the operator bearer token.
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer(parts)?;
        if constant_time_compare(token, state.config().admin_token.expose_secret()) {
            Ok(Self)
        } else {
            Err(AppError::Unauthorized("invalid admin token".to_owned()))
        }
    }
}
