//! HTTP request handlers

pub mod health;
pub mod inventory;
pub mod materials;
pub mod notifications;
pub mod sync;
pub mod transfers;

pub use health::*;
pub use inventory::*;
pub use materials::*;
pub use notifications::*;
pub use sync::*;
pub use transfers::*;
