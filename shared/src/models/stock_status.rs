//! Categorical stock status derived from stock thresholds

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock status of a material or inventory record.
///
/// Always derived through [`derive_status`]; callers never set it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
    #[serde(rename = "Overstock")]
    Overstock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::Overstock => "Overstock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "In Stock" => Some(StockStatus::InStock),
            "Low Stock" => Some(StockStatus::LowStock),
            "Out of Stock" => Some(StockStatus::OutOfStock),
            "Overstock" => Some(StockStatus::Overstock),
            _ => None,
        }
    }

    /// True for the statuses that warrant a replenishment alert
    pub fn needs_attention(&self) -> bool {
        matches!(self, StockStatus::LowStock | StockStatus::OutOfStock)
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the status from current stock and the min/max thresholds.
///
/// Low side is inclusive (`current == minimum` is Low Stock), high side is
/// exclusive (`current == maximum` is In Stock). Zero (or less) is always
/// Out of Stock regardless of the minimum.
pub fn derive_status(current: Decimal, minimum: Decimal, maximum: Decimal) -> StockStatus {
    if current <= Decimal::ZERO {
        StockStatus::OutOfStock
    } else if current <= minimum {
        StockStatus::LowStock
    } else if current > maximum {
        StockStatus::Overstock
    } else {
        StockStatus::InStock
    }
}

/// Number of records in each status bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub in_stock: u64,
    pub low_stock: u64,
    pub out_of_stock: u64,
    pub overstock: u64,
}

impl StatusCounts {
    pub fn record(&mut self, status: StockStatus) {
        match status {
            StockStatus::InStock => self.in_stock += 1,
            StockStatus::LowStock => self.low_stock += 1,
            StockStatus::OutOfStock => self.out_of_stock += 1,
            StockStatus::Overstock => self.overstock += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.in_stock + self.low_stock + self.out_of_stock + self.overstock
    }
}
