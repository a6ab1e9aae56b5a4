//! HTTP handlers for inventory sync

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use shared::ExternalItem;

use crate::error::AppResult;
use crate::external::ZohoInventoryClient;
use crate::services::{SyncReport, SyncRun};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSyncRequest {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    pub items: Vec<ExternalItem>,
    #[serde(default)]
    pub dry_run: bool,
}

/// Pull items from Zoho Inventory and reconcile them. A run that failed to
/// fetch is returned with 502 so callers can tell it apart from a completed
/// run with item errors.
pub async fn run_sync(
    State(state): State<AppState>,
    Json(input): Json<RunSyncRequest>,
) -> AppResult<(StatusCode, Json<SyncRun>)> {
    let source = ZohoInventoryClient::new(state.config.zoho.clone())?;
    let run = state.sync().run(&source, input.dry_run).await?;
    let status = if run.is_completed() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(run)))
}

/// Reconcile a batch supplied in the request body
pub async fn reconcile_batch(
    State(state): State<AppState>,
    Json(input): Json<ReconcileRequest>,
) -> AppResult<Json<SyncReport>> {
    let report = state.sync().reconcile_batch(&input.items, input.dry_run).await;
    Ok(Json(report))
}
