//! Integration test harness for Trattoria.
//!
//! [`TestContext`] builds the full API router (every middleware layer
//! included) over a fresh in-memory store and drives it with
//! `tower::ServiceExt::oneshot`, so no server or database is needed.
//!
//! Tests that need `PostgreSQL` are `#[ignore]`d; run them with
//! `TRATTORIA_DATABASE_URL` set and `cargo test -- --ignored`.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use trattoria_api::config::ApiConfig;
use trattoria_api::db::{MemoryStore, Stores};
use trattoria_api::state::AppState;

pub const ADMIN_TOKEN: &str = "test-admin-token-7f3a9c1e5b2d8f4a6c0e";
const JWT_SECRET: &str = "test-jwt-secret-2b7e151628aed2a6abf7158809cf4f3c";

/// A router over a private in-memory store.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub config: ApiConfig,
    router: Router,
}

/// Status and parsed JSON body (`Value::Null` for empty bodies).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ApiConfig::in_memory(
            SecretString::from(JWT_SECRET),
            SecretString::from(ADMIN_TOKEN),
        ))
    }

    #[must_use]
    pub fn with_config(config: ApiConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config.clone(), Stores::memory(store.clone()));
        Self {
            store,
            config,
            router: trattoria_api::app(state),
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, bearer, None).await
    }

    pub async fn post(&self, uri: &str, bearer: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, bearer, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, bearer: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, bearer, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, bearer: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, bearer, None).await
    }

    /// Register an account and return its access token.
    pub async fn register(&self, name: &str, email: &str) -> String {
        let response = self
            .post(
                "/auth/register",
                None,
                serde_json::json!({ "name": name, "email": email, "password": "password123" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["token"].as_str().unwrap().to_owned()
    }

    /// Create a product through the admin API and return its JSON.
    pub async fn create_product(&self, body: Value) -> Value {
        let response = self.post("/products", Some(ADMIN_TOKEN), body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
