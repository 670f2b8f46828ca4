//! Catalogue route handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::{RequestCancellation, RequireAdmin};
use crate::models::{CreateProduct, Product, ProductPatch};
use crate::services::CatalogueService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Body of `POST /products/{slug}/change`.
#[derive(Debug, Deserialize)]
pub struct ChangeSlug {
    pub slug: String,
}

pub async fn list(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>> {
    let Query(query) = query?;
    let products = CatalogueService::new(state.products())
        .list(query.limit, query.offset, &cancel)
        .await?;
    Ok(Json(products))
}

pub async fn retrieve(
    State(state): State<AppState>,
    RequestCancellation(cancel): RequestCancellation,
    Path(slug): Path<String>,
) -> Result<Json<Product>> {
    let product = CatalogueService::new(state.products())
        .retrieve(&slug, &cancel)
        .await?;
    Ok(Json(product))
}

pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RequestCancellation(cancel): RequestCancellation,
    payload: std::result::Result<Json<CreateProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>)> {
    let Json(payload) = payload?;
    let product = CatalogueService::new(state.products())
        .create(payload, &cancel)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RequestCancellation(cancel): RequestCancellation,
    Path(slug): Path<String>,
    payload: std::result::Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<Product>> {
    let Json(patch) = payload?;
    let product = CatalogueService::new(state.products())
        .update(&slug, patch, &cancel)
        .await?;
    Ok(Json(product))
}

pub async fn change_slug(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RequestCancellation(cancel): RequestCancellation,
    Path(slug): Path<String>,
    payload: std::result::Result<Json<ChangeSlug>, JsonRejection>,
) -> Result<Json<Product>> {
    let Json(body) = payload?;
    let product = CatalogueService::new(state.products())
        .change_slug(&slug, &body.slug, &cancel)
        .await?;
    Ok(Json(product))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    RequestCancellation(cancel): RequestCancellation,
    Path(slug): Path<String>,
) -> Result<StatusCode> {
    CatalogueService::new(state.products())
        .delete(&slug, &cancel)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
