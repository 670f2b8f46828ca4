//! Per-request cancellation.
//!
//! Each request gets a [`CancellationToken`] that fires when the configured
//! deadline elapses or when the request future is dropped (client gone).
//! Services race every store call against it.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// The current request's cancellation token.
///
/// Outside the deadline middleware (unit tests of single handlers) a fresh,
/// never-cancelled token is returned.
#[derive(Debug, Clone, Default)]
pub struct RequestCancellation(pub CancellationToken);

impl<S> FromRequestParts<S> for RequestCancellation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_default())
    }
}

pub async fn deadline_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = CancellationToken::new();
    let _cancel_on_drop = token.clone().drop_guard();
    request
        .extensions_mut()
        .insert(RequestCancellation(token.clone()));

    let timeout = state.config().request_timeout;
    let deadline = tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::debug!(?timeout, "request deadline elapsed");
        token.cancel();
    });

    let response = next.run(request).await;
    deadline.abort();
    response
}
