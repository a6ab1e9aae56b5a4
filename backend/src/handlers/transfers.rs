//! HTTP handlers for transfer orders

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{LocationKey, NewTransferOrder, TransferOrder};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListTransfersQuery {
    pub location: Option<LocationKey>,
}

/// Who is moving the order along, and optionally why
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    #[validate(length(min = 1, max = 100, message = "is required"))]
    pub actor: String,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub reason: Option<String>,
}

pub async fn list_transfers(
    State(state): State<AppState>,
    Query(query): Query<ListTransfersQuery>,
) -> AppResult<Json<Vec<TransferOrder>>> {
    let orders = state.transfers().list(query.location.as_ref()).await?;
    Ok(Json(orders))
}

pub async fn create_transfer(
    State(state): State<AppState>,
    Json(input): Json<NewTransferOrder>,
) -> AppResult<(StatusCode, Json<TransferOrder>)> {
    let order = state.transfers().create(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TransferOrder>> {
    Ok(Json(state.transfers().get(id).await?))
}

pub async fn approve_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<TransitionRequest>,
) -> AppResult<Json<TransferOrder>> {
    input.validate()?;
    Ok(Json(state.transfers().approve(id, &input.actor).await?))
}

pub async fn reject_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<TransitionRequest>,
) -> AppResult<Json<TransferOrder>> {
    input.validate()?;
    Ok(Json(state.transfers().reject(id, &input.actor, input.reason).await?))
}

pub async fn dispatch_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<TransitionRequest>,
) -> AppResult<Json<TransferOrder>> {
    input.validate()?;
    Ok(Json(state.transfers().dispatch(id, &input.actor).await?))
}

pub async fn deliver_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<TransitionRequest>,
) -> AppResult<Json<TransferOrder>> {
    input.validate()?;
    Ok(Json(state.transfers().deliver(id, &input.actor).await?))
}

pub async fn cancel_transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<TransitionRequest>,
) -> AppResult<Json<TransferOrder>> {
    input.validate()?;
    Ok(Json(state.transfers().cancel(id, &input.actor, input.reason).await?))
}
