//! Post-commit inventory events
//!
//! Stock, transfer and sync operations report what happened through
//! [`InventoryEvents`] after their own writes succeed. Delivery is best
//! effort: [`emit`] logs a failed publish and never hands the error back to
//! the operation that raised the event.

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::{LocationKey, StockStatus, TransferOrder, TransferStatus};

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub enum InventoryEvent {
    /// A location's stock of an item entered Low Stock or Out of Stock
    StockAlert {
        location: LocationKey,
        item_code: String,
        item_name: String,
        status: StockStatus,
        current_stock: Decimal,
    },
    /// A new transfer order awaits the destination's approval
    TransferRequested { order: TransferOrder },
    /// A transfer order moved to `order.status`
    TransferStatusChanged {
        order: TransferOrder,
        previous: TransferStatus,
        actor: String,
    },
    /// A sync run finished and persisted its changes
    SyncCompleted {
        location: LocationKey,
        added: u64,
        updated: u64,
        errors: u64,
    },
}

impl InventoryEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            InventoryEvent::StockAlert { .. } => "stock_alert",
            InventoryEvent::TransferRequested { .. } => "transfer_requested",
            InventoryEvent::TransferStatusChanged { .. } => "transfer_status_changed",
            InventoryEvent::SyncCompleted { .. } => "sync_completed",
        }
    }
}

#[async_trait]
pub trait InventoryEvents: Send + Sync {
    async fn publish(&self, event: &InventoryEvent) -> AppResult<()>;
}

/// Publish `event`, logging and swallowing any failure
pub async fn emit(events: &dyn InventoryEvents, event: InventoryEvent) {
    if let Err(e) = events.publish(&event).await {
        tracing::warn!(event = event.kind(), error = %e, "Notification for inventory event dropped");
    }
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

#[async_trait]
impl InventoryEvents for NoopEvents {
    async fn publish(&self, _event: &InventoryEvent) -> AppResult<()> {
        Ok(())
    }
}
