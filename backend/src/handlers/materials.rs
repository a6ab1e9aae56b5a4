//! HTTP handlers for the material catalogue

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{LocationKey, LocationStocks, Material, NewMaterial, StockThresholds, Unit};
use validator::Validate;

use crate::error::AppResult;
use crate::store::MaterialFilter;
use crate::AppState;

/// Query parameters for listing materials
#[derive(Debug, Deserialize)]
pub struct ListMaterialsQuery {
    #[serde(default)]
    pub include_inactive: bool,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterialRequest {
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    /// Free text; normalized to a canonical unit
    pub unit: Option<String>,
    #[serde(default)]
    pub unit_price: Decimal,
    pub supplier: Option<String>,
    #[serde(default)]
    pub location_stocks: LocationStocks,
    pub thresholds: Option<StockThresholds>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustLocationRequest {
    pub location: LocationKey,
    pub delta: Decimal,
    #[validate(length(min = 1, message = "is required"))]
    pub reason: String,
}

pub async fn list_materials(
    State(state): State<AppState>,
    Query(query): Query<ListMaterialsQuery>,
) -> AppResult<Json<Vec<Material>>> {
    let filter = MaterialFilter {
        include_inactive: query.include_inactive,
        category: query.category,
    };
    let materials = state.materials().list(&filter).await?;
    Ok(Json(materials))
}

pub async fn create_material(
    State(state): State<AppState>,
    Json(input): Json<CreateMaterialRequest>,
) -> AppResult<(StatusCode, Json<Material>)> {
    input.validate()?;
    let unit: Unit = state.reconciler.units().normalize(input.unit.as_deref());
    let material = state
        .materials()
        .create(NewMaterial {
            code: input.code,
            name: input.name,
            category: input.category,
            sub_category: input.sub_category,
            unit,
            unit_price: input.unit_price,
            supplier: input.supplier,
            location_stocks: input.location_stocks,
            thresholds: input.thresholds,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn get_material(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<Material>> {
    Ok(Json(state.materials().get(&code).await?))
}

/// Manual stock correction at one location
pub async fn adjust_material_stock(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<AdjustLocationRequest>,
) -> AppResult<Json<Material>> {
    input.validate()?;
    let material = state
        .materials()
        .adjust_location(&code, &input.location, input.delta, &input.reason)
        .await?;
    Ok(Json(material))
}

pub async fn update_material_thresholds(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(thresholds): Json<StockThresholds>,
) -> AppResult<Json<Material>> {
    Ok(Json(state.materials().update_thresholds(&code, thresholds).await?))
}

pub async fn deactivate_material(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<Material>> {
    Ok(Json(state.materials().deactivate(&code).await?))
}
