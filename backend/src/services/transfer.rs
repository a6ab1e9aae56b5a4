//! Transfer order workflow between locations
//!
//! Stock leaves the source on dispatch and reaches the destination on
//! delivery. Cancelling an order that is already in transit returns its
//! stock to the source.

use std::sync::Arc;

use chrono::Utc;
use shared::{LocationKey, NewTransferOrder, TransferOrder, TransferStatus};
use uuid::Uuid;

use super::events::{emit, InventoryEvent, InventoryEvents};
use super::inventory::InventoryService;
use crate::error::{AppError, AppResult};
use crate::store::TransferStore;

#[derive(Clone)]
pub struct TransferService {
    store: Arc<dyn TransferStore>,
    inventory: InventoryService,
    events: Arc<dyn InventoryEvents>,
}

impl TransferService {
    pub fn new(
        store: Arc<dyn TransferStore>,
        inventory: InventoryService,
        events: Arc<dyn InventoryEvents>,
    ) -> Self {
        Self {
            store,
            inventory,
            events,
        }
    }

    pub async fn create(&self, input: NewTransferOrder) -> AppResult<TransferOrder> {
        let order = TransferOrder::create(input, Utc::now())?;
        self.store.insert_transfer(&order).await?;

        tracing::info!(
            order = %order.order_number,
            from = %order.from_location,
            to = %order.to_location,
            lines = order.items.len(),
            total = %order.total_value,
            "Transfer order created"
        );
        emit(
            self.events.as_ref(),
            InventoryEvent::TransferRequested {
                order: order.clone(),
            },
        )
        .await;
        Ok(order)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<TransferOrder> {
        self.store
            .find_transfer(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transfer order".to_string()))
    }

    pub async fn list(&self, location: Option<&LocationKey>) -> AppResult<Vec<TransferOrder>> {
        self.store.list_transfers(location).await
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    pub async fn approve(&self, id: Uuid, actor: &str) -> AppResult<TransferOrder> {
        self.advance(id, TransferStatus::Approved, actor, None).await
    }

    /// Destination declines the request
    pub async fn reject(&self, id: Uuid, actor: &str, reason: Option<String>) -> AppResult<TransferOrder> {
        let order = self.get(id).await?;
        if order.status != TransferStatus::Pending {
            return Err(AppError::InvalidStateTransition(format!(
                "only pending orders can be rejected, {} is {}",
                order.order_number, order.status
            )));
        }
        self.advance(id, TransferStatus::Cancelled, actor, reason).await
    }

    pub async fn dispatch(&self, id: Uuid, actor: &str) -> AppResult<TransferOrder> {
        self.advance(id, TransferStatus::InTransit, actor, None).await
    }

    pub async fn deliver(&self, id: Uuid, actor: &str) -> AppResult<TransferOrder> {
        self.advance(id, TransferStatus::Delivered, actor, None).await
    }

    pub async fn cancel(&self, id: Uuid, actor: &str, reason: Option<String>) -> AppResult<TransferOrder> {
        self.advance(id, TransferStatus::Cancelled, actor, reason).await
    }

    /// Validate the transition, move stock, persist, then notify.
    ///
    /// Withdrawals happen before the order is saved, credits after it.
    async fn advance(
        &self,
        id: Uuid,
        next: TransferStatus,
        actor: &str,
        reason: Option<String>,
    ) -> AppResult<TransferOrder> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(AppError::validation("actor", "is required"));
        }

        let mut order = self.get(id).await?;
        let previous = order.status;
        order.transition(next, actor, reason, Utc::now())?;

        if next == TransferStatus::InTransit {
            self.inventory
                .ensure_available(&order.from_location, &order.items)
                .await?;
            for line in &order.items {
                self.inventory.withdraw(&order.from_location, line).await?;
            }
        }

        self.store.update_transfer(&order).await?;

        tracing::info!(
            order = %order.order_number,
            from = previous.as_str(),
            to = next.as_str(),
            actor,
            "Transfer order status changed"
        );

        let credit = match next {
            TransferStatus::Delivered => Some((&order.to_location, "transfer delivery")),
            TransferStatus::Cancelled if previous == TransferStatus::InTransit => {
                Some((&order.from_location, "transfer cancelled in transit"))
            }
            _ => None,
        };
        let outcome = match credit {
            Some((location, reason)) => self.credit_lines(&order, location, reason).await,
            None => Ok(()),
        };

        emit(
            self.events.as_ref(),
            InventoryEvent::TransferStatusChanged {
                order: order.clone(),
                previous,
                actor: actor.to_string(),
            },
        )
        .await;
        outcome.map(|_| order)
    }

    /// Credit every line to `location`. A failed line does not stop the
    /// rest; failures are logged and reported together.
    async fn credit_lines(&self, order: &TransferOrder, location: &LocationKey, reason: &str) -> AppResult<()> {
        let mut failed = Vec::new();
        for line in &order.items {
            if let Err(e) = self.inventory.receive(location, line, reason).await {
                tracing::error!(
                    order = %order.order_number,
                    location = %location,
                    item = %line.item_code,
                    quantity = %line.quantity,
                    error = %e,
                    "Transfer line was not credited"
                );
                failed.push(format!("{} x {}", line.item_code, line.quantity));
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(AppError::Persistence(format!(
                "{} is {} but {} was not credited to {}",
                order.order_number,
                order.status,
                failed.join(", "),
                location
            )))
        }
    }
}
