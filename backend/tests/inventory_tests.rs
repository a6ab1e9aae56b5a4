//! Inventory service tests
//!
//! Tests for location-scoped stock records including:
//! - Derived fields on creation and after every mutation
//! - Reservations against available stock
//! - Location summaries
//! - Low / out-of-stock notifications

use kitchen_erp_backend::error::AppError;
use kitchen_erp_backend::{AppState, Config};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    summarize, InventoryRecord, ItemKind, LocationKey, NewInventoryRecord, NotificationType,
    StockStatus, StockThresholds,
};
use uuid::Uuid;

fn d(n: i64) -> Decimal {
    Decimal::from(n)
}

fn mall() -> LocationKey {
    LocationKey::new("mall_360")
}

fn new_record(code: &str, current: i64, min: i64, max: i64) -> NewInventoryRecord {
    NewInventoryRecord {
        location: mall(),
        item_kind: ItemKind::RawMaterial,
        item_code: code.to_string(),
        item_name: format!("Item {}", code),
        current_stock: d(current),
        reserved_stock: Decimal::ZERO,
        unit_price: d(4),
        thresholds: Some(StockThresholds {
            minimum: d(min),
            maximum: d(max),
            reorder_point: d(min),
        }),
    }
}

fn state() -> AppState {
    AppState::in_memory(Config::for_memory())
}

// ============================================================================
// Records
// ============================================================================

#[cfg(test)]
mod record_tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_record_is_out_of_stock() {
        let state = state();
        let record = state
            .inventory()
            .create_record(new_record("RM-1", 0, 5, 50))
            .await
            .unwrap();

        assert_eq!(record.status, StockStatus::OutOfStock);
        assert_eq!(record.available_stock, Decimal::ZERO);
        assert_eq!(record.total_value, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_duplicate_item_at_location_is_rejected() {
        let state = state();
        let inventory = state.inventory();
        inventory.create_record(new_record("RM-1", 10, 5, 50)).await.unwrap();

        let result = inventory.create_record(new_record("rm-1", 3, 5, 50)).await;
        assert!(matches!(result, Err(AppError::DuplicateEntry(_))));
    }

    #[tokio::test]
    async fn test_unknown_record_is_not_found() {
        let state = state();
        let result = state.inventory().get_record(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = state
            .inventory()
            .adjust_stock(Uuid::new_v4(), d(1), "count")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

// ============================================================================
// Stock movements
// ============================================================================

#[cfg(test)]
mod adjustment_tests {
    use super::*;

    #[tokio::test]
    async fn test_adjust_recomputes_derived_fields() {
        let state = state();
        let inventory = state.inventory();
        let record = inventory.create_record(new_record("RM-1", 20, 5, 50)).await.unwrap();

        let record = inventory.adjust_stock(record.id, d(-12), "prep").await.unwrap();
        assert_eq!(record.current_stock, d(8));
        assert_eq!(record.available_stock, d(8));
        assert_eq!(record.total_value, d(32));
        assert_eq!(record.status, StockStatus::InStock);

        // Landing exactly on the minimum is low
        let record = inventory.adjust_stock(record.id, d(-3), "prep").await.unwrap();
        assert_eq!(record.current_stock, d(5));
        assert_eq!(record.total_value, d(20));
        assert_eq!(record.status, StockStatus::LowStock);

        let stored = inventory.get_record(record.id).await.unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn test_adjust_below_zero_is_rejected() {
        let state = state();
        let inventory = state.inventory();
        let record = inventory.create_record(new_record("RM-1", 3, 5, 50)).await.unwrap();

        let result = inventory.adjust_stock(record.id, d(-4), "waste").await;
        assert!(matches!(result, Err(AppError::InsufficientStock(_))));
        assert_eq!(inventory.get_record(record.id).await.unwrap().current_stock, d(3));
    }

    #[tokio::test]
    async fn test_zero_delta_is_rejected() {
        let state = state();
        let inventory = state.inventory();
        let record = inventory.create_record(new_record("RM-1", 3, 5, 50)).await.unwrap();

        let result = inventory.adjust_stock(record.id, Decimal::ZERO, "noop").await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_reserve_and_release() {
        let state = state();
        let inventory = state.inventory();
        let record = inventory.create_record(new_record("RM-1", 20, 5, 50)).await.unwrap();

        let record = inventory.reserve(record.id, d(15)).await.unwrap();
        assert_eq!(record.reserved_stock, d(15));
        assert_eq!(record.available_stock, d(5));

        let over = inventory.reserve(record.id, d(6)).await;
        assert!(matches!(over, Err(AppError::InsufficientStock(_))));

        let record = inventory.release(record.id, d(100)).await.unwrap();
        assert_eq!(record.reserved_stock, Decimal::ZERO);
        assert_eq!(record.available_stock, d(20));
    }

    #[tokio::test]
    async fn test_threshold_change_rederives_status() {
        let state = state();
        let inventory = state.inventory();
        let record = inventory.create_record(new_record("RM-1", 20, 5, 50)).await.unwrap();
        assert_eq!(record.status, StockStatus::InStock);

        let record = inventory
            .update_thresholds(
                record.id,
                StockThresholds {
                    minimum: d(1),
                    maximum: d(10),
                    reorder_point: d(2),
                },
            )
            .await
            .unwrap();
        assert_eq!(record.status, StockStatus::Overstock);
    }
}

// ============================================================================
// Alerts
// ============================================================================

#[cfg(test)]
mod alert_tests {
    use super::*;

    #[tokio::test]
    async fn test_falling_to_low_stock_notifies_location() {
        let state = state();
        let inventory = state.inventory();
        let record = inventory.create_record(new_record("RM-1", 20, 5, 50)).await.unwrap();

        inventory.adjust_stock(record.id, d(-16), "service").await.unwrap();
        // Still low: no second alert
        inventory.adjust_stock(record.id, d(-1), "service").await.unwrap();

        let notes = state
            .notifications()
            .list_for_location(&mall(), Some(NotificationType::LowStock), None)
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert!(!notes[0].read);
    }

    #[tokio::test]
    async fn test_running_out_sends_urgent_alert() {
        let state = state();
        let inventory = state.inventory();
        let record = inventory.create_record(new_record("RM-1", 8, 5, 50)).await.unwrap();

        inventory.adjust_stock(record.id, d(-8), "service").await.unwrap();

        let notes = state
            .notifications()
            .list_for_location(&mall(), Some(NotificationType::OutOfStock), None)
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].priority.as_str(), "urgent");
    }
}

// ============================================================================
// Summaries
// ============================================================================

#[cfg(test)]
mod summary_tests {
    use super::*;

    #[tokio::test]
    async fn test_summary_counts_and_values() {
        let state = state();
        let inventory = state.inventory();
        inventory.create_record(new_record("RM-1", 0, 5, 50)).await.unwrap();
        inventory.create_record(new_record("RM-2", 5, 5, 50)).await.unwrap();
        inventory.create_record(new_record("RM-3", 60, 5, 50)).await.unwrap();

        let summary = inventory.get_summary(&mall()).await.unwrap();
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.total_value, d(260));
        assert_eq!(summary.status_counts.out_of_stock, 1);
        assert_eq!(summary.status_counts.low_stock, 1);
        assert_eq!(summary.status_counts.overstock, 1);
        assert_eq!(summary.status_counts.in_stock, 0);
    }

    #[tokio::test]
    async fn test_summary_is_a_pure_read() {
        let state = state();
        let inventory = state.inventory();
        let record = inventory.create_record(new_record("RM-1", 10, 5, 50)).await.unwrap();

        let first = inventory.get_summary(&mall()).await.unwrap();
        let second = inventory.get_summary(&mall()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inventory.get_record(record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_summary_of_empty_location() {
        let state = state();
        let summary = state
            .inventory()
            .get_summary(&LocationKey::new("vibes_complex"))
            .await
            .unwrap();
        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.total_value, Decimal::ZERO);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;
    use chrono::Utc;

    fn build(current: i64, reserved: i64, price: i64) -> InventoryRecord {
        let mut input = new_record("P-1", current, 5, 50);
        input.reserved_stock = d(reserved);
        input.unit_price = d(price);
        InventoryRecord::create(input, StockThresholds::default(), Utc::now()).unwrap()
    }

    proptest! {
        /// Summary total equals the sum of current * price over records
        #[test]
        fn prop_summary_value_is_sum_of_records(
            rows in proptest::collection::vec((0i64..500, 0i64..100, 0i64..50), 0..20)
        ) {
            let records: Vec<_> = rows.iter().map(|(c, r, p)| build(*c, *r, *p)).collect();
            let summary = summarize(&mall(), &records);

            let expected: Decimal = rows.iter().map(|(c, _, p)| d(c * p)).sum();
            prop_assert_eq!(summary.total_value, expected);
            prop_assert_eq!(summary.total_items, records.len() as u64);
            prop_assert_eq!(summary.status_counts.total(), records.len() as u64);
        }

        /// Available stock is never negative and never exceeds current stock
        #[test]
        fn prop_available_is_bounded(current in 0i64..1000, reserved in 0i64..1000) {
            let record = build(current, reserved, 1);
            prop_assert!(record.available_stock >= Decimal::ZERO);
            prop_assert!(record.available_stock <= record.current_stock);
        }
    }
}
