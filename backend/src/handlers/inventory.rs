//! HTTP handlers for location inventory endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{InventoryRecord, InventorySummary, LocationKey, NewInventoryRecord, StockThresholds};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub delta: Decimal,
    #[validate(length(min = 1, max = 500, message = "is required"))]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: Decimal,
}

/// Allocate an item to a location
pub async fn create_record(
    State(state): State<AppState>,
    Json(input): Json<NewInventoryRecord>,
) -> AppResult<(StatusCode, Json<InventoryRecord>)> {
    let record = state.inventory().create_record(input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<InventoryRecord>> {
    Ok(Json(state.inventory().get_record(id).await?))
}

pub async fn list_location_records(
    State(state): State<AppState>,
    Path(location): Path<LocationKey>,
) -> AppResult<Json<Vec<InventoryRecord>>> {
    Ok(Json(state.inventory().list_records(&location).await?))
}

pub async fn get_location_summary(
    State(state): State<AppState>,
    Path(location): Path<LocationKey>,
) -> AppResult<Json<InventorySummary>> {
    Ok(Json(state.inventory().get_summary(&location).await?))
}

pub async fn adjust_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AdjustStockRequest>,
) -> AppResult<Json<InventoryRecord>> {
    input.validate()?;
    let record = state
        .inventory()
        .adjust_stock(id, input.delta, &input.reason)
        .await?;
    Ok(Json(record))
}

pub async fn reserve_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<QuantityRequest>,
) -> AppResult<Json<InventoryRecord>> {
    Ok(Json(state.inventory().reserve(id, input.quantity).await?))
}

pub async fn release_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<QuantityRequest>,
) -> AppResult<Json<InventoryRecord>> {
    Ok(Json(state.inventory().release(id, input.quantity).await?))
}

pub async fn update_record_thresholds(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(thresholds): Json<StockThresholds>,
) -> AppResult<Json<InventoryRecord>> {
    Ok(Json(state.inventory().update_thresholds(id, thresholds).await?))
}
