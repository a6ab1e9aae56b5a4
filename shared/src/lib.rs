//! Shared domain types and pure inventory logic for the kitchen ERP
//!
//! Everything in this crate is free of I/O: unit and location normalization,
//! stock status derivation, additive reconciliation of external item records,
//! inventory derivations and summaries, the transfer-order state machine and
//! notification validation. The backend persists and serves these types.

pub mod error;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use normalize::*;
pub use reconcile::*;
pub use types::*;
pub use validation::*;
