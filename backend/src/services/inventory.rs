//! Inventory service for location-scoped stock records
//!
//! Handles:
//! - Allocating an item to a location
//! - Stock adjustments, reservations and threshold changes
//! - Per-location summaries
//! - Low / out-of-stock alerts when a record's status changes

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use shared::{
    summarize, InventoryRecord, InventorySummary, LocationKey, NewInventoryRecord, StockStatus,
    StockThresholds, TransferLine,
};
use uuid::Uuid;

use super::events::{emit, InventoryEvent, InventoryEvents};
use crate::error::{AppError, AppResult};
use crate::store::InventoryStore;

/// Inventory service for stock tracking
#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
    events: Arc<dyn InventoryEvents>,
    defaults: StockThresholds,
}

impl InventoryService {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        events: Arc<dyn InventoryEvents>,
        defaults: StockThresholds,
    ) -> Self {
        Self {
            store,
            events,
            defaults,
        }
    }

    // ========================================================================
    // Records
    // ========================================================================

    pub async fn create_record(&self, input: NewInventoryRecord) -> AppResult<InventoryRecord> {
        let record = InventoryRecord::create(input, self.defaults, Utc::now())?;
        self.store.insert_record(&record).await?;

        tracing::info!(
            location = %record.location,
            item = %record.item_code,
            stock = %record.current_stock,
            "Inventory record created"
        );
        self.alert_on_change(None, &record).await;
        Ok(record)
    }

    pub async fn get_record(&self, id: Uuid) -> AppResult<InventoryRecord> {
        self.store
            .find_record(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory record".to_string()))
    }

    pub async fn list_records(&self, location: &LocationKey) -> AppResult<Vec<InventoryRecord>> {
        self.store.list_records(location).await
    }

    /// Aggregate view of one location; pure read
    pub async fn get_summary(&self, location: &LocationKey) -> AppResult<InventorySummary> {
        let records = self.store.list_records(location).await?;
        Ok(summarize(location, &records))
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Apply a signed delta to a record's current stock
    pub async fn adjust_stock(
        &self,
        id: Uuid,
        delta: Decimal,
        reason: &str,
    ) -> AppResult<InventoryRecord> {
        if delta.is_zero() {
            return Err(AppError::validation("delta", "must not be zero"));
        }
        let mut record = self.get_record(id).await?;
        let previous = record.status;
        record.adjust_stock(delta, Utc::now())?;
        self.store.update_record(&record).await?;

        tracing::info!(
            location = %record.location,
            item = %record.item_code,
            delta = %delta,
            stock = %record.current_stock,
            reason,
            "Stock adjusted"
        );
        self.alert_on_change(Some(previous), &record).await;
        Ok(record)
    }

    pub async fn reserve(&self, id: Uuid, quantity: Decimal) -> AppResult<InventoryRecord> {
        let mut record = self.get_record(id).await?;
        record.reserve(quantity, Utc::now())?;
        self.store.update_record(&record).await?;
        Ok(record)
    }

    pub async fn release(&self, id: Uuid, quantity: Decimal) -> AppResult<InventoryRecord> {
        let mut record = self.get_record(id).await?;
        record.release(quantity, Utc::now())?;
        self.store.update_record(&record).await?;
        Ok(record)
    }

    pub async fn update_thresholds(
        &self,
        id: Uuid,
        thresholds: StockThresholds,
    ) -> AppResult<InventoryRecord> {
        let mut record = self.get_record(id).await?;
        let previous = record.status;
        record.set_thresholds(thresholds, Utc::now())?;
        self.store.update_record(&record).await?;
        self.alert_on_change(Some(previous), &record).await;
        Ok(record)
    }

    // ========================================================================
    // Transfer movements
    // ========================================================================

    /// Check that `location` can release every line. Lines sharing an item
    /// are checked against their combined quantity, and reserved stock is
    /// never available.
    pub async fn ensure_available(&self, location: &LocationKey, lines: &[TransferLine]) -> AppResult<()> {
        let mut needed: Vec<(String, Decimal)> = Vec::new();
        for line in lines {
            match needed.iter_mut().find(|(code, _)| *code == line.item_code) {
                Some((_, quantity)) => *quantity += line.quantity,
                None => needed.push((line.item_code.clone(), line.quantity)),
            }
        }

        for (code, quantity) in needed {
            let available = self
                .store
                .find_record_for_item(location, &code)
                .await?
                .map(|r| r.available_stock)
                .unwrap_or(Decimal::ZERO);
            if available < quantity {
                return Err(AppError::InsufficientStock(format!(
                    "{} has {} of {} available, transfer needs {}",
                    location, available, code, quantity
                )));
            }
        }
        Ok(())
    }

    /// Remove a transfer line's quantity from `location`
    pub async fn withdraw(&self, location: &LocationKey, line: &TransferLine) -> AppResult<InventoryRecord> {
        let record = self
            .store
            .find_record_for_item(location, &line.item_code)
            .await?
            .ok_or_else(|| {
                AppError::InsufficientStock(format!("{} holds no {}", location, line.item_code))
            })?;
        self.adjust_stock(record.id, -line.quantity, "transfer dispatch")
            .await
    }

    /// Add a transfer line's quantity to `location`, allocating the item on
    /// first receipt
    pub async fn receive(
        &self,
        location: &LocationKey,
        line: &TransferLine,
        reason: &str,
    ) -> AppResult<InventoryRecord> {
        match self
            .store
            .find_record_for_item(location, &line.item_code)
            .await?
        {
            Some(record) => self.adjust_stock(record.id, line.quantity, reason).await,
            None => {
                self.create_record(NewInventoryRecord {
                    location: location.clone(),
                    item_kind: line.item_kind,
                    item_code: line.item_code.clone(),
                    item_name: line.item_name.clone(),
                    current_stock: line.quantity,
                    reserved_stock: Decimal::ZERO,
                    unit_price: line.unit_price,
                    thresholds: None,
                })
                .await
            }
        }
    }

    async fn alert_on_change(&self, previous: Option<StockStatus>, record: &InventoryRecord) {
        if !record.status.needs_attention() || previous == Some(record.status) {
            return;
        }
        emit(
            self.events.as_ref(),
            InventoryEvent::StockAlert {
                location: record.location.clone(),
                item_code: record.item_code.clone(),
                item_name: record.item_name.clone(),
                status: record.status,
                current_stock: record.current_stock,
            },
        )
        .await;
    }
}
