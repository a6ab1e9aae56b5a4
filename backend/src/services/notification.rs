//! Notification service: location-addressed in-app notifications
//!
//! Supports:
//! - Creating notifications from explicit requests or inventory events
//! - Listing by target location, newest first, optionally by type
//! - Marking one or all as read, and clearing a location's notifications

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    clamp_limit, LocationKey, NewNotification, Notification, NotificationPriority,
    NotificationType, StockStatus, TransferStatus,
};
use uuid::Uuid;

use super::events::{InventoryEvent, InventoryEvents};
use crate::config::NotificationConfig;
use crate::error::{AppError, AppResult};
use crate::store::NotificationStore;

/// Notification service for managing notifications
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    limits: NotificationConfig,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>, limits: NotificationConfig) -> Self {
        Self { store, limits }
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Validate and persist a notification. Nothing is stored when a
    /// required field is missing.
    pub async fn notify(&self, input: NewNotification) -> AppResult<Notification> {
        let notification = Notification::create(input, Utc::now())?;
        self.store.insert_notification(&notification).await?;

        tracing::debug!(
            id = %notification.id,
            target = %notification.target_location,
            kind = notification.notification_type.as_str(),
            "Notification created"
        );
        Ok(notification)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn list_for_location(
        &self,
        location: &LocationKey,
        notification_type: Option<NotificationType>,
        limit: Option<i64>,
    ) -> AppResult<Vec<Notification>> {
        let limit = clamp_limit(limit, self.limits.default_limit, self.limits.max_limit);
        self.store
            .list_notifications(location, notification_type, limit)
            .await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Notification> {
        self.store
            .find_notification(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification".to_string()))
    }

    // ========================================================================
    // Read state
    // ========================================================================

    /// Mark one notification as read. Marking an already-read notification
    /// succeeds and leaves it read.
    pub async fn mark_read(&self, id: Uuid) -> AppResult<Notification> {
        if !self.store.mark_read(id).await? {
            return Err(AppError::NotFound("Notification".to_string()));
        }
        self.get(id).await
    }

    /// Returns the number of notifications that were unread
    pub async fn mark_all_read(&self, location: &LocationKey) -> AppResult<u64> {
        let count = self.store.mark_all_read(location).await?;
        tracing::debug!(location = %location, count, "Notifications marked read");
        Ok(count)
    }

    /// Delete every notification addressed to `location`
    pub async fn clear_all(&self, location: &LocationKey) -> AppResult<u64> {
        let count = self.store.clear_notifications(location).await?;
        tracing::info!(location = %location, count, "Notifications cleared");
        Ok(count)
    }
}

/// Notifications produced for one event
fn notifications_for(event: &InventoryEvent) -> Vec<NewNotification> {
    match event {
        InventoryEvent::StockAlert {
            location,
            item_code,
            item_name,
            status,
            current_stock,
        } => {
            let (kind, priority) = match status {
                StockStatus::OutOfStock => (NotificationType::OutOfStock, NotificationPriority::Urgent),
                _ => (NotificationType::LowStock, NotificationPriority::High),
            };
            vec![NewNotification::new(
                kind,
                location.clone(),
                format!("{}: {}", status, item_name),
                format!("{} ({}) is down to {}", item_name, item_code, current_stock),
            )
            .with_priority(priority)]
        }

        InventoryEvent::TransferRequested { order } => vec![NewNotification::new(
            NotificationType::TransferRequest,
            order.to_location.clone(),
            format!("Transfer request {}", order.order_number),
            format!(
                "{} requested a transfer of {} item(s) from {}",
                order.requested_by,
                order.items.len(),
                order.from_location
            ),
        )
        .from_location(order.from_location.as_str())
        .for_transfer(order.id)],

        InventoryEvent::TransferStatusChanged {
            order,
            previous,
            actor,
        } => {
            let number = &order.order_number;
            let outgoing = |kind, title: String, message: String| {
                NewNotification::new(kind, order.from_location.clone(), title, message)
                    .from_location(order.to_location.as_str())
                    .for_transfer(order.id)
            };
            let incoming = |kind, title: String, message: String| {
                NewNotification::new(kind, order.to_location.clone(), title, message)
                    .from_location(order.from_location.as_str())
                    .for_transfer(order.id)
            };

            match order.status {
                TransferStatus::Approved => vec![outgoing(
                    NotificationType::TransferApproved,
                    format!("Transfer {} approved", number),
                    format!("{} approved the transfer", actor),
                )],
                TransferStatus::InTransit => vec![incoming(
                    NotificationType::TransferDispatched,
                    format!("Transfer {} dispatched", number),
                    format!("{} item(s) are on the way", order.items.len()),
                )],
                TransferStatus::Delivered => vec![outgoing(
                    NotificationType::TransferDelivered,
                    format!("Transfer {} delivered", number),
                    format!("{} confirmed receipt", actor),
                )],
                TransferStatus::Cancelled => {
                    let message = format!("{} cancelled the transfer (was {})", actor, previous);
                    vec![
                        outgoing(
                            NotificationType::TransferCancelled,
                            format!("Transfer {} cancelled", number),
                            message.clone(),
                        ),
                        incoming(
                            NotificationType::TransferCancelled,
                            format!("Transfer {} cancelled", number),
                            message,
                        )
                        .with_priority(NotificationPriority::High),
                    ]
                }
                TransferStatus::Pending => Vec::new(),
            }
        }

        InventoryEvent::SyncCompleted {
            location,
            added,
            updated,
            errors,
        } => {
            let priority = if *errors > 0 {
                NotificationPriority::High
            } else {
                NotificationPriority::Low
            };
            vec![NewNotification::new(
                NotificationType::SyncCompleted,
                location.clone(),
                "Inventory sync completed",
                format!("{} added, {} updated, {} failed", added, updated, errors),
            )
            .with_priority(priority)]
        }
    }
}

#[async_trait]
impl InventoryEvents for NotificationService {
    /// Every notification for the event is attempted; the first failure is
    /// returned after the rest have been tried.
    async fn publish(&self, event: &InventoryEvent) -> AppResult<()> {
        let mut first_error = None;
        for input in notifications_for(event) {
            if let Err(e) = self.notify(input).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn stock_alert_priority_follows_status() {
        let event = InventoryEvent::StockAlert {
            location: LocationKey::new("mall_360"),
            item_code: "FL-001".into(),
            item_name: "Flour".into(),
            status: StockStatus::OutOfStock,
            current_stock: Decimal::ZERO,
        };
        let out = notifications_for(&event);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].notification_type, Some(NotificationType::OutOfStock));
        assert_eq!(out[0].priority, Some(NotificationPriority::Urgent));
        assert_eq!(out[0].target_location, Some(LocationKey::new("mall_360")));
    }

    #[test]
    fn sync_summary_message() {
        let event = InventoryEvent::SyncCompleted {
            location: LocationKey::new("central_kitchen"),
            added: 3,
            updated: 2,
            errors: 0,
        };
        let out = notifications_for(&event);
        assert_eq!(out[0].message.as_deref(), Some("3 added, 2 updated, 0 failed"));
        assert_eq!(out[0].priority, Some(NotificationPriority::Low));
    }
}
