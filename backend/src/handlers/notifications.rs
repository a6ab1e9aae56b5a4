//! HTTP handlers for location notifications

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{LocationKey, NewNotification, Notification, NotificationType};
use uuid::Uuid;

use crate::error::AppResult;
use crate::AppState;

/// Query parameters for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub location: LocationKey,
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub location: LocationKey,
}

/// Number of notifications affected by a bulk operation
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state
        .notifications()
        .list_for_location(&query.location, query.notification_type, query.limit)
        .await?;
    Ok(Json(notifications))
}

pub async fn create_notification(
    State(state): State<AppState>,
    Json(input): Json<NewNotification>,
) -> AppResult<(StatusCode, Json<Notification>)> {
    let notification = state.notifications().notify(input).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// Mark notification as read
pub async fn mark_as_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    Ok(Json(state.notifications().mark_read(id).await?))
}

pub async fn mark_all_as_read(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<CountResponse>> {
    let count = state.notifications().mark_all_read(&query.location).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn clear_notifications(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> AppResult<Json<CountResponse>> {
    let count = state.notifications().clear_all(&query.location).await?;
    Ok(Json(CountResponse { count }))
}
