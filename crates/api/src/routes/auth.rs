//! Registration and login handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::RequestCancellation;
use crate::services::AccountService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let Json(body) = payload?;
    let account = AccountService::new(state.accounts())
        .register(&body.name, &body.email, &body.password, &cancel)
        .await?;
    let token = state.tokens().issue(&account.email)?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

pub async fn login(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>> {
    let Json(body) = payload?;
    let account = AccountService::new(state.accounts())
        .login(&body.email, &body.password, &cancel)
        .await?;
    let token = state.tokens().issue(&account.email)?;
    Ok(Json(TokenResponse { token }))
}
