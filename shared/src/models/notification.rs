//! Notification models addressed to stocking locations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::types::LocationKey;
use crate::validation::required_text;

/// Source location recorded when the creator does not name one
pub const SYSTEM_SOURCE: &str = "System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TransferRequest,
    TransferApproved,
    TransferDispatched,
    TransferDelivered,
    TransferCancelled,
    LowStock,
    OutOfStock,
    StockAdjustment,
    SyncCompleted,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::TransferRequest => "transfer_request",
            NotificationType::TransferApproved => "transfer_approved",
            NotificationType::TransferDispatched => "transfer_dispatched",
            NotificationType::TransferDelivered => "transfer_delivered",
            NotificationType::TransferCancelled => "transfer_cancelled",
            NotificationType::LowStock => "low_stock",
            NotificationType::OutOfStock => "out_of_stock",
            NotificationType::StockAdjustment => "stock_adjustment",
            NotificationType::SyncCompleted => "sync_completed",
            NotificationType::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "transfer_request" => Some(NotificationType::TransferRequest),
            "transfer_approved" => Some(NotificationType::TransferApproved),
            "transfer_dispatched" => Some(NotificationType::TransferDispatched),
            "transfer_delivered" => Some(NotificationType::TransferDelivered),
            "transfer_cancelled" => Some(NotificationType::TransferCancelled),
            "low_stock" => Some(NotificationType::LowStock),
            "out_of_stock" => Some(NotificationType::OutOfStock),
            "stock_adjustment" => Some(NotificationType::StockAdjustment),
            "sync_completed" => Some(NotificationType::SyncCompleted),
            "system" => Some(NotificationType::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
            NotificationPriority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(NotificationPriority::Low),
            "normal" => Some(NotificationPriority::Normal),
            "high" => Some(NotificationPriority::High),
            "urgent" => Some(NotificationPriority::Urgent),
            _ => None,
        }
    }
}

/// A persisted notification. `read` only ever moves from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub target_location: LocationKey,
    pub source_location: String,
    pub transfer_order_id: Option<Uuid>,
    pub priority: NotificationPriority,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Loosely-populated request to create a notification
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub title: Option<String>,
    pub message: Option<String>,
    pub notification_type: Option<NotificationType>,
    pub target_location: Option<LocationKey>,
    pub source_location: Option<String>,
    pub transfer_order_id: Option<Uuid>,
    pub priority: Option<NotificationPriority>,
}

impl NewNotification {
    pub fn new(
        notification_type: NotificationType,
        target_location: LocationKey,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            message: Some(message.into()),
            notification_type: Some(notification_type),
            target_location: Some(target_location),
            ..Default::default()
        }
    }

    pub fn from_location(mut self, source: impl Into<String>) -> Self {
        self.source_location = Some(source.into());
        self
    }

    pub fn for_transfer(mut self, transfer_order_id: Uuid) -> Self {
        self.transfer_order_id = Some(transfer_order_id);
        self
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = Some(priority);
        self
    }
}

impl Notification {
    /// Validate a request and build an unread notification with a fresh id.
    /// Title, message, type and target location are required.
    pub fn create(input: NewNotification, now: DateTime<Utc>) -> DomainResult<Self> {
        let title = required_text("title", input.title)?;
        let message = required_text("message", input.message)?;
        let notification_type = input
            .notification_type
            .ok_or_else(|| DomainError::validation("type", "is required"))?;
        let target_location = input
            .target_location
            .filter(|l| !l.is_empty())
            .ok_or_else(|| DomainError::validation("targetLocation", "is required"))?;
        let source_location = input
            .source_location
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| SYSTEM_SOURCE.to_string());

        Ok(Notification {
            id: Uuid::new_v4(),
            title,
            message,
            notification_type,
            target_location,
            source_location,
            transfer_order_id: input.transfer_order_id,
            priority: input.priority.unwrap_or_default(),
            read: false,
            created_at: now,
        })
    }
}
