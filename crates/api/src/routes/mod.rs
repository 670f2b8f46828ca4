//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Store readiness
//!
//! # Auth
//! POST   /auth/register             - Create account, returns token
//! POST   /auth/login                - Password login, returns token
//!
//! # Catalogue (reads public, writes require admin token)
//! GET    /products?limit&offset     - Newest first
//! POST   /products                  - Create (201)
//! GET    /products/{slug}           - Detail
//! PATCH  /products/{slug}           - Partial update
//! DELETE /products/{slug}           - Delete (204)
//! POST   /products/{slug}/change    - Change slug
//!
//! # Addresses (require access token)
//! GET    /user/address              - Caller's addresses
//! POST   /user/address              - Create (201)
//! PATCH  /user/address/{id}         - Partial update
//! DELETE /user/address/{id}         - Delete (204)
//!
//! # Admin (require admin token)
//! GET    /admin/addresses           - Filtered, paginated addresses
//! GET    /admin/users               - Filtered, sorted, paginated users
//! GET    /admin/users/search?email= - Email substring search
//! GET    /admin/users/{id}          - User detail
//! ```

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// All API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{slug}",
            get(products::retrieve)
                .patch(products::update)
                .delete(products::delete),
        )
        .route("/products/{slug}/change", post(products::change_slug))
        .route("/user/address", get(addresses::list).post(addresses::create))
        .route(
            "/user/address/{id}",
            patch(addresses::update).delete(addresses::delete),
        )
        .route("/admin/addresses", get(admin::addresses))
        .route("/admin/users", get(admin::users))
        .route("/admin/users/search", get(admin::search_users))
        .route("/admin/users/{id}", get(admin::user))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.products().ping().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
