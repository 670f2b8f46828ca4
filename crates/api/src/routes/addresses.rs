//! Address route handlers. All require an access token.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use trattoria_core::AddressId;

use crate::error::Result;
use crate::middleware::{RequestCancellation, RequireCaller};
use crate::models::{AddressPatch, AddressResponse, CreateAddress};
use crate::services::AddressService;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    RequestCancellation(cancel): RequestCancellation,
) -> Result<Json<Vec<AddressResponse>>> {
    let addresses = AddressService::new(state.addresses())
        .list_for_caller(&caller, &cancel)
        .await?;
    Ok(Json(addresses.into_iter().map(AddressResponse::from).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    RequestCancellation(cancel): RequestCancellation,
    payload: std::result::Result<Json<CreateAddress>, JsonRejection>,
) -> Result<(StatusCode, Json<AddressResponse>)> {
    let Json(payload) = payload?;
    let address = AddressService::new(state.addresses())
        .create(&caller, payload, &cancel)
        .await?;
    Ok((StatusCode::CREATED, Json(address.into())))
}

pub async fn update(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    RequestCancellation(cancel): RequestCancellation,
    id: std::result::Result<Path<AddressId>, PathRejection>,
    payload: std::result::Result<Json<AddressPatch>, JsonRejection>,
) -> Result<Json<AddressResponse>> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    let address = AddressService::new(state.addresses())
        .update(&caller, id, patch, &cancel)
        .await?;
    Ok(Json(address.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    RequireCaller(caller): RequireCaller,
    RequestCancellation(cancel): RequestCancellation,
    id: std::result::Result<Path<AddressId>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = id?;
    AddressService::new(state.addresses())
        .delete(&caller, id, &cancel)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
