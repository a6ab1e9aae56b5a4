//! Kitchen ERP backend
//!
//! Inventory reconciliation, location stock, transfer orders and
//! notifications for a central kitchen and its outlets.

use std::sync::Arc;

use axum::{routing::get, Router};
use shared::Reconciler;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::{
    InventoryEvents, InventoryService, MaterialService, NotificationService, SyncService,
    TransferService,
};
use store::Stores;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub config: Arc<Config>,
    pub reconciler: Arc<Reconciler>,
    /// Present when running against PostgreSQL
    pub db: Option<sqlx::PgPool>,
}

impl AppState {
    pub fn new(stores: Stores, config: Config, db: Option<sqlx::PgPool>) -> Self {
        let reconciler = Arc::new(config.inventory.reconciler());
        Self {
            stores,
            config: Arc::new(config),
            reconciler,
            db,
        }
    }

    /// In-memory state, used by tests and the memory storage backend
    pub fn in_memory(config: Config) -> Self {
        Self::new(Stores::memory(), config, None)
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(
            self.stores.notifications.clone(),
            self.config.notifications.clone(),
        )
    }

    /// Event sink backed by the notification service
    pub fn events(&self) -> Arc<dyn InventoryEvents> {
        Arc::new(self.notifications())
    }

    pub fn materials(&self) -> MaterialService {
        MaterialService::new(
            self.stores.materials.clone(),
            self.reconciler.locations().clone(),
            self.config.inventory.thresholds(),
        )
    }

    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(
            self.stores.inventory.clone(),
            self.events(),
            self.config.inventory.thresholds(),
        )
    }

    pub fn transfers(&self) -> TransferService {
        TransferService::new(self.stores.transfers.clone(), self.inventory(), self.events())
    }

    pub fn sync(&self) -> SyncService {
        SyncService::new(
            self.stores.materials.clone(),
            self.reconciler.clone(),
            self.events(),
        )
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Kitchen ERP API v1"
}

/// Initialize tracing. `RUST_LOG` overrides `default_filter`;
/// `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let json = std::env::var("LOG_FORMAT").map_or(false, |f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Connect to PostgreSQL, or use the memory store, per configuration
pub async fn build_state(config: Config) -> anyhow::Result<AppState> {
    use crate::config::StorageBackend;
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data will not survive a restart");
            Ok(AppState::in_memory(config))
        }
        StorageBackend::Postgres => {
            if config.database.url.is_empty() {
                return Err(AppError::Configuration("database.url is required".to_string()).into());
            }
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;
            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            Ok(AppState::new(Stores::postgres(db_pool.clone()), config, Some(db_pool)))
        }
    }
}
