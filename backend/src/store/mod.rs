//! Persistence traits for materials, inventory records, transfer orders and
//! notifications, with PostgreSQL and in-memory implementations

use std::sync::Arc;

use async_trait::async_trait;
use shared::{InventoryRecord, LocationKey, Material, Notification, NotificationType, TransferOrder};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Filter for material listings
#[derive(Debug, Clone, Default)]
pub struct MaterialFilter {
    pub include_inactive: bool,
    pub category: Option<String>,
}

#[async_trait]
pub trait MaterialStore: Send + Sync {
    async fn find_material(&self, code: &str) -> AppResult<Option<Material>>;

    async fn list_materials(&self, filter: &MaterialFilter) -> AppResult<Vec<Material>>;

    /// Fails with `DuplicateEntry("code")` when the code is taken
    async fn insert_material(&self, material: &Material) -> AppResult<()>;

    /// Fails with `NotFound` when no material has this code
    async fn update_material(&self, material: &Material) -> AppResult<()>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn find_record(&self, id: Uuid) -> AppResult<Option<InventoryRecord>>;

    async fn find_record_for_item(
        &self,
        location: &LocationKey,
        item_code: &str,
    ) -> AppResult<Option<InventoryRecord>>;

    async fn list_records(&self, location: &LocationKey) -> AppResult<Vec<InventoryRecord>>;

    /// Fails with `DuplicateEntry("itemCode")` when the location already
    /// holds a record for the item
    async fn insert_record(&self, record: &InventoryRecord) -> AppResult<()>;

    async fn update_record(&self, record: &InventoryRecord) -> AppResult<()>;
}

#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn find_transfer(&self, id: Uuid) -> AppResult<Option<TransferOrder>>;

    /// Orders sent from or to `location` (all orders when `None`), newest first
    async fn list_transfers(&self, location: Option<&LocationKey>) -> AppResult<Vec<TransferOrder>>;

    async fn insert_transfer(&self, order: &TransferOrder) -> AppResult<()>;

    async fn update_transfer(&self, order: &TransferOrder) -> AppResult<()>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> AppResult<()>;

    async fn find_notification(&self, id: Uuid) -> AppResult<Option<Notification>>;

    /// Newest first, at most `limit` entries
    async fn list_notifications(
        &self,
        location: &LocationKey,
        notification_type: Option<NotificationType>,
        limit: i64,
    ) -> AppResult<Vec<Notification>>;

    /// Sets the read flag; returns false when no such notification exists
    async fn mark_read(&self, id: Uuid) -> AppResult<bool>;

    /// Number of notifications that moved from unread to read
    async fn mark_all_read(&self, location: &LocationKey) -> AppResult<u64>;

    /// Number of notifications deleted
    async fn clear_notifications(&self, location: &LocationKey) -> AppResult<u64>;
}

/// Handles to every store the services use
#[derive(Clone)]
pub struct Stores {
    pub materials: Arc<dyn MaterialStore>,
    pub inventory: Arc<dyn InventoryStore>,
    pub transfers: Arc<dyn TransferStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    /// All four stores backed by one implementation
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: MaterialStore + InventoryStore + TransferStore + NotificationStore + 'static,
    {
        Self {
            materials: backend.clone(),
            inventory: backend.clone(),
            transfers: backend.clone(),
            notifications: backend,
        }
    }

    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::from_backend(Arc::new(PgStore::new(pool)))
    }
}
