//! Business logic services for the kitchen ERP

pub mod events;
pub mod inventory;
pub mod material;
pub mod notification;
pub mod sync;
pub mod transfer;

pub use events::{emit, InventoryEvent, InventoryEvents, NoopEvents};
pub use inventory::InventoryService;
pub use material::MaterialService;
pub use notification::NotificationService;
pub use sync::{SyncPhase, SyncReport, SyncRun, SyncService};
pub use transfer::TransferService;
