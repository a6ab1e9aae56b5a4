//! Location-scoped inventory records and read-side summaries

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stock_status::{derive_status, StatusCounts, StockStatus};
use super::material::StockThresholds;
use crate::error::{DomainError, DomainResult};
use crate::types::LocationKey;
use crate::validation::{non_negative, positive};

/// Kind of item an inventory record tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    RawMaterial,
    FinishedGood,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::RawMaterial => "raw_material",
            ItemKind::FinishedGood => "finished_good",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "raw_material" => Some(ItemKind::RawMaterial),
            "finished_good" => Some(ItemKind::FinishedGood),
            _ => None,
        }
    }
}

/// A location's stock of one material or finished good.
///
/// `available_stock`, `total_value` and `status` are derived; every mutation
/// goes through a method that recomputes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub id: Uuid,
    pub location: LocationKey,
    pub item_kind: ItemKind,
    pub item_code: String,
    pub item_name: String,
    pub current_stock: Decimal,
    pub reserved_stock: Decimal,
    pub available_stock: Decimal,
    pub minimum_stock: Decimal,
    pub maximum_stock: Decimal,
    pub reorder_point: Decimal,
    pub unit_price: Decimal,
    pub total_value: Decimal,
    pub status: StockStatus,
    pub last_updated: DateTime<Utc>,
}

/// Input for allocating stock of an item to a location
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryRecord {
    pub location: LocationKey,
    pub item_kind: ItemKind,
    pub item_code: String,
    pub item_name: String,
    #[serde(default)]
    pub current_stock: Decimal,
    #[serde(default)]
    pub reserved_stock: Decimal,
    #[serde(default)]
    pub unit_price: Decimal,
    pub thresholds: Option<StockThresholds>,
}

/// `max(0, current - reserved)`
pub fn available_stock(current: Decimal, reserved: Decimal) -> Decimal {
    (current - reserved).max(Decimal::ZERO)
}

/// `current * unit_price`
pub fn total_value(current: Decimal, unit_price: Decimal) -> Decimal {
    current * unit_price
}

impl InventoryRecord {
    pub fn create(
        input: NewInventoryRecord,
        defaults: StockThresholds,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if input.location.is_empty() {
            return Err(DomainError::validation("location", "is required"));
        }
        let item_code = super::material::canonical_code(&input.item_code)
            .ok_or_else(|| DomainError::validation("itemCode", "is required"))?;
        non_negative("currentStock", input.current_stock)?;
        non_negative("reservedStock", input.reserved_stock)?;
        non_negative("unitPrice", input.unit_price)?;
        let thresholds = input.thresholds.unwrap_or(defaults);
        thresholds.validate()?;

        let mut record = InventoryRecord {
            id: Uuid::new_v4(),
            location: input.location,
            item_kind: input.item_kind,
            item_code,
            item_name: input.item_name,
            current_stock: input.current_stock,
            reserved_stock: input.reserved_stock,
            available_stock: Decimal::ZERO,
            minimum_stock: thresholds.minimum,
            maximum_stock: thresholds.maximum,
            reorder_point: thresholds.reorder_point,
            unit_price: input.unit_price,
            total_value: Decimal::ZERO,
            status: StockStatus::OutOfStock,
            last_updated: now,
        };
        record.recompute();
        Ok(record)
    }

    /// Re-derive available stock, total value and status. Any value a
    /// caller placed in those fields is overwritten.
    pub fn recompute(&mut self) {
        self.available_stock = available_stock(self.current_stock, self.reserved_stock);
        self.total_value = total_value(self.current_stock, self.unit_price);
        self.status = derive_status(self.current_stock, self.minimum_stock, self.maximum_stock);
    }

    /// Apply a signed stock delta. The result may not go below zero.
    pub fn adjust_stock(&mut self, delta: Decimal, now: DateTime<Utc>) -> DomainResult<()> {
        let next = self.current_stock + delta;
        if next < Decimal::ZERO {
            return Err(DomainError::InsufficientStock(format!(
                "{} at {} has {}, cannot remove {}",
                self.item_code, self.location, self.current_stock, -delta
            )));
        }
        self.current_stock = next;
        self.touch(now);
        Ok(())
    }

    /// Reserve stock against available quantity
    pub fn reserve(&mut self, quantity: Decimal, now: DateTime<Utc>) -> DomainResult<()> {
        positive("quantity", quantity)?;
        if quantity > self.available_stock {
            return Err(DomainError::InsufficientStock(format!(
                "{} at {} has {} available, cannot reserve {}",
                self.item_code, self.location, self.available_stock, quantity
            )));
        }
        self.reserved_stock += quantity;
        self.touch(now);
        Ok(())
    }

    /// Release previously reserved stock; releasing more than is reserved
    /// clears the reservation.
    pub fn release(&mut self, quantity: Decimal, now: DateTime<Utc>) -> DomainResult<()> {
        positive("quantity", quantity)?;
        self.reserved_stock = (self.reserved_stock - quantity).max(Decimal::ZERO);
        self.touch(now);
        Ok(())
    }

    pub fn set_unit_price(&mut self, unit_price: Decimal, now: DateTime<Utc>) -> DomainResult<()> {
        non_negative("unitPrice", unit_price)?;
        self.unit_price = unit_price;
        self.touch(now);
        Ok(())
    }

    pub fn set_thresholds(&mut self, thresholds: StockThresholds, now: DateTime<Utc>) -> DomainResult<()> {
        thresholds.validate()?;
        self.minimum_stock = thresholds.minimum;
        self.maximum_stock = thresholds.maximum;
        self.reorder_point = thresholds.reorder_point;
        self.touch(now);
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.recompute();
        self.last_updated = now;
    }
}

/// Aggregate view of one location's inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub location: LocationKey,
    pub total_items: u64,
    pub total_value: Decimal,
    pub status_counts: StatusCounts,
}

/// Reduce a location's records to a summary. Records scoped to other
/// locations are ignored. Pure: no record is modified.
pub fn summarize<'a>(
    location: &LocationKey,
    records: impl IntoIterator<Item = &'a InventoryRecord>,
) -> InventorySummary {
    let mut summary = InventorySummary {
        location: location.clone(),
        total_items: 0,
        total_value: Decimal::ZERO,
        status_counts: StatusCounts::default(),
    };

    for record in records.into_iter().filter(|r| &r.location == location) {
        summary.total_items += 1;
        summary.total_value += total_value(record.current_stock, record.unit_price);
        summary.status_counts.record(derive_status(
            record.current_stock,
            record.minimum_stock,
            record.maximum_stock,
        ));
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn record(current: i64, reserved: i64, min: i64, max: i64) -> InventoryRecord {
        InventoryRecord::create(
            NewInventoryRecord {
                location: LocationKey::new("mall_360"),
                item_kind: ItemKind::FinishedGood,
                item_code: "fg-burger".to_string(),
                item_name: "Burger Patty".to_string(),
                current_stock: d(current),
                reserved_stock: d(reserved),
                unit_price: d(3),
                thresholds: Some(StockThresholds {
                    minimum: d(min),
                    maximum: d(max),
                    reorder_point: d(min),
                }),
            },
            StockThresholds::default(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_record_is_out_of_stock_with_zero_value() {
        let r = record(0, 0, 5, 50);
        assert_eq!(r.status, StockStatus::OutOfStock);
        assert_eq!(r.available_stock, d(0));
        assert_eq!(r.total_value, d(0));
        assert_eq!(r.item_code, "FG-BURGER");
    }

    #[test]
    fn recompute_overwrites_caller_supplied_derived_fields() {
        let mut r = record(10, 2, 5, 50);
        r.available_stock = d(999);
        r.total_value = d(-1);
        r.status = StockStatus::Overstock;
        r.recompute();
        assert_eq!(r.available_stock, d(8));
        assert_eq!(r.total_value, d(30));
        assert_eq!(r.status, StockStatus::InStock);
    }

    #[test]
    fn adjust_rejects_negative_result() {
        let mut r = record(4, 0, 5, 50);
        assert_eq!(r.status, StockStatus::LowStock);
        let err = r.adjust_stock(d(-5), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock(_)));
        r.adjust_stock(d(-4), Utc::now()).unwrap();
        assert_eq!(r.status, StockStatus::OutOfStock);
    }

    #[test]
    fn reserve_and_release() {
        let mut r = record(10, 0, 1, 50);
        r.reserve(d(6), Utc::now()).unwrap();
        assert_eq!(r.available_stock, d(4));
        assert!(r.reserve(d(5), Utc::now()).is_err());
        r.release(d(10), Utc::now()).unwrap();
        assert_eq!(r.reserved_stock, d(0));
        assert_eq!(r.available_stock, d(10));
    }

    #[test]
    fn summary_counts_each_bucket() {
        let records = vec![
            record(0, 0, 5, 50),
            record(5, 0, 5, 50),
            record(20, 0, 5, 50),
            record(51, 0, 5, 50),
            record(30, 0, 5, 50),
        ];
        let summary = summarize(&LocationKey::new("mall_360"), &records);
        assert_eq!(summary.total_items, 5);
        assert_eq!(summary.total_value, d((5 + 20 + 51 + 30) * 3));
        assert_eq!(summary.status_counts.out_of_stock, 1);
        assert_eq!(summary.status_counts.low_stock, 1);
        assert_eq!(summary.status_counts.in_stock, 2);
        assert_eq!(summary.status_counts.overstock, 1);

        let other = summarize(&LocationKey::new("kuwait_city"), &records);
        assert_eq!(other.total_items, 0);
        assert_eq!(other.total_value, d(0));
    }

    proptest! {
        #[test]
        fn prop_available_never_negative(current in 0i64..10_000, reserved in 0i64..20_000) {
            let available = available_stock(d(current), d(reserved));
            prop_assert!(available >= Decimal::ZERO);
            if current < reserved {
                prop_assert_eq!(available, Decimal::ZERO);
            } else {
                prop_assert_eq!(available, d(current - reserved));
            }
        }

        #[test]
        fn prop_summary_is_repeatable(stocks in proptest::collection::vec(0i64..200, 0..20)) {
            let records: Vec<_> = stocks.iter().map(|s| record(*s, 0, 5, 100)).collect();
            let location = LocationKey::new("mall_360");
            prop_assert_eq!(summarize(&location, &records), summarize(&location, &records));
        }
    }
}
