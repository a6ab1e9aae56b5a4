//! Route definitions for the kitchen ERP API

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/materials", material_routes())
        .nest("/inventory", inventory_routes())
        .nest("/transfers", transfer_routes())
        .nest("/notifications", notification_routes())
        .nest("/sync", sync_routes())
}

/// Material catalogue routes
fn material_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_materials).post(handlers::create_material))
        .route("/:code", get(handlers::get_material))
        .route("/:code/adjust", post(handlers::adjust_material_stock))
        .route("/:code/thresholds", put(handlers::update_material_thresholds))
        .route("/:code/deactivate", post(handlers::deactivate_material))
}

/// Location inventory routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/records", post(handlers::create_record))
        .route("/records/:id", get(handlers::get_record))
        .route("/records/:id/adjust", post(handlers::adjust_record))
        .route("/records/:id/reserve", post(handlers::reserve_stock))
        .route("/records/:id/release", post(handlers::release_stock))
        .route("/records/:id/thresholds", put(handlers::update_record_thresholds))
        .route("/locations/:location", get(handlers::list_location_records))
        .route("/locations/:location/summary", get(handlers::get_location_summary))
}

/// Transfer order routes
fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_transfers).post(handlers::create_transfer))
        .route("/:id", get(handlers::get_transfer))
        .route("/:id/approve", post(handlers::approve_transfer))
        .route("/:id/reject", post(handlers::reject_transfer))
        .route("/:id/dispatch", post(handlers::dispatch_transfer))
        .route("/:id/deliver", post(handlers::deliver_transfer))
        .route("/:id/cancel", post(handlers::cancel_transfer))
}

/// Notification routes; bulk operations take `?location=`
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_notifications)
                .post(handlers::create_notification)
                .delete(handlers::clear_notifications),
        )
        .route("/read-all", put(handlers::mark_all_as_read))
        .route("/:id/read", put(handlers::mark_as_read))
}

/// Sync routes
fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/run", post(handlers::run_sync))
        .route("/reconcile", post(handlers::reconcile_batch))
}
