//! Domain models for the kitchen ERP

pub mod inventory;
pub mod material;
pub mod notification;
pub mod stock_status;
pub mod transfer;

pub use inventory::*;
pub use material::*;
pub use notification::*;
pub use stock_status::*;
pub use transfer::*;
