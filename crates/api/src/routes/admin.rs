//! Operator route handlers. All require the admin token.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use serde::{Deserialize, Serialize};

use trattoria_core::{AccountId, Page};

use crate::error::Result;
use crate::middleware::{RequestCancellation, RequireAdmin};
use crate::models::{AddressResponse, UserResponse};
use crate::services::AdminQueries;
use crate::services::admin::{AddressQuery, UserQuery};
use crate::state::AppState;

/// Response of `GET /admin/addresses`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminAddressesResponse {
    pub addresses: Vec<AddressResponse>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl From<Page<AddressResponse>> for AdminAddressesResponse {
    fn from(page: Page<AddressResponse>) -> Self {
        Self {
            addresses: page.items,
            total: page.total,
            page: page.page,
            limit: page.page_size,
            total_pages: page.total_pages,
        }
    }
}

/// Response of `GET /admin/users`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl From<Page<UserResponse>> for UserListResponse {
    fn from(page: Page<UserResponse>) -> Self {
        Self {
            users: page.items,
            total: page.total,
            page: page.page,
            limit: page.page_size,
            total_pages: page.total_pages,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub email: String,
}

fn queries(state: &AppState) -> AdminQueries<'_> {
    AdminQueries::new(state.addresses(), state.accounts())
}

pub async fn addresses(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RequestCancellation(cancel): RequestCancellation,
    query: std::result::Result<Query<AddressQuery>, QueryRejection>,
) -> Result<Json<AdminAddressesResponse>> {
    let Query(query) = query?;
    let page = queries(&state).list_addresses(&query, &cancel).await?;
    Ok(Json(page.map(AddressResponse::from).into()))
}

pub async fn users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RequestCancellation(cancel): RequestCancellation,
    query: std::result::Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserListResponse>> {
    let Query(query) = query?;
    let page = queries(&state).list_users(&query, &cancel).await?;
    Ok(Json(page.map(UserResponse::from).into()))
}

pub async fn user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RequestCancellation(cancel): RequestCancellation,
    id: std::result::Result<Path<AccountId>, PathRejection>,
) -> Result<Json<UserResponse>> {
    let Path(id) = id?;
    let account = queries(&state).get_user(id, &cancel).await?;
    Ok(Json(account.into()))
}

pub async fn search_users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RequestCancellation(cancel): RequestCancellation,
    query: std::result::Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<UserResponse>>> {
    let Query(query) = query?;
    let accounts = queries(&state).search_users(&query.email, &cancel).await?;
    Ok(Json(accounts.into_iter().map(UserResponse::from).collect()))
}
