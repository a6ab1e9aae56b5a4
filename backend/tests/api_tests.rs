//! HTTP API tests
//!
//! Drives the router in-process against the memory store:
//! - Health and error envelopes
//! - Material catalogue endpoints
//! - Batch reconciliation and notifications over HTTP

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use kitchen_erp_backend::{create_app, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    create_app(AppState::in_memory(Config::for_memory()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

// ============================================================================
// Health
// ============================================================================

#[cfg(test)]
mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_memory_storage() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["storage"], "memory");
    }
}

// ============================================================================
// Materials
// ============================================================================

#[cfg(test)]
mod material_tests {
    use super::*;

    fn flour() -> Value {
        json!({
            "code": "rm-flour",
            "name": "Flour",
            "unit": "Kilograms",
            "unitPrice": "1.5",
            "locationStocks": { "central_kitchen": "12" }
        })
    }

    #[tokio::test]
    async fn test_create_and_fetch_material() {
        let app = app();
        let (status, created) = send(&app, "POST", "/api/v1/materials", Some(flour())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["code"], "RM-FLOUR");
        assert_eq!(created["unit"], "kg");

        let (status, fetched) = send(&app, "GET", "/api/v1/materials/rm-flour", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let app = app();
        send(&app, "POST", "/api/v1/materials", Some(flour())).await;
        let (status, body) = send(&app, "POST", "/api/v1/materials", Some(flour())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "DUPLICATE_ENTRY");
    }

    #[tokio::test]
    async fn test_unknown_material_is_not_found() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/v1/materials/NOPE", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_adjust_unknown_location_is_rejected() {
        let app = app();
        send(&app, "POST", "/api/v1/materials", Some(flour())).await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/materials/RM-FLOUR/adjust",
            Some(json!({ "location": "moon_base", "delta": "1", "reason": "count" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "location");
    }

    #[tokio::test]
    async fn test_deactivated_material_leaves_default_listing() {
        let app = app();
        send(&app, "POST", "/api/v1/materials", Some(flour())).await;
        let (status, _) = send(&app, "POST", "/api/v1/materials/RM-FLOUR/deactivate", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, active) = send(&app, "GET", "/api/v1/materials", None).await;
        assert_eq!(active.as_array().map(Vec::len), Some(0));
        let (_, all) = send(&app, "GET", "/api/v1/materials?include_inactive=true", None).await;
        assert_eq!(all.as_array().map(Vec::len), Some(1));
    }
}

// ============================================================================
// Sync and notifications
// ============================================================================

#[cfg(test)]
mod workflow_tests {
    use super::*;

    #[tokio::test]
    async fn test_reconcile_batch_over_http() {
        let app = app();
        let batch = json!({
            "items": [
                { "sku": "A1", "name": "Flour", "unit": "kg",
                  "locations": [{ "location": "Central", "quantity": "10" }] },
                { "name": "No key" }
            ]
        });

        let (status, report) = send(&app, "POST", "/api/v1/sync/reconcile", Some(batch)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["added"], 1);
        assert_eq!(report["withoutKey"], 1);

        let (_, material) = send(&app, "GET", "/api/v1/materials/A1", None).await;
        assert_eq!(material["status"], "Low Stock");
    }

    #[tokio::test]
    async fn test_notification_validation_envelope() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/notifications",
            Some(json!({ "title": "t", "message": "m", "notificationType": "system" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["field"], "targetLocation");
    }

    #[tokio::test]
    async fn test_notification_read_flow() {
        let app = app();
        let (status, created) = send(
            &app,
            "POST",
            "/api/v1/notifications",
            Some(json!({
                "title": "Delivery",
                "message": "Truck arrived",
                "notificationType": "system",
                "targetLocation": "mall_360"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let id = created["id"].as_str().unwrap().to_string();
        let (status, read) = send(&app, "PUT", &format!("/api/v1/notifications/{}/read", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(read["read"], true);

        let (_, count) = send(&app, "DELETE", "/api/v1/notifications?location=mall_360", None).await;
        assert_eq!(count["count"], 1);
    }
}
