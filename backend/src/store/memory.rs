//! Non-durable store backed by `tokio::sync::RwLock` maps

use std::collections::HashMap;

use async_trait::async_trait;
use shared::{InventoryRecord, LocationKey, Material, Notification, NotificationType, TransferOrder};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{InventoryStore, MaterialFilter, MaterialStore, NotificationStore, TransferStore};
use crate::error::{AppError, AppResult};

#[derive(Default)]
pub struct MemoryStore {
    materials: RwLock<HashMap<String, Material>>,
    records: RwLock<HashMap<Uuid, InventoryRecord>>,
    transfers: RwLock<HashMap<Uuid, TransferOrder>>,
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MaterialStore for MemoryStore {
    async fn find_material(&self, code: &str) -> AppResult<Option<Material>> {
        Ok(self.materials.read().await.get(code).cloned())
    }

    async fn list_materials(&self, filter: &MaterialFilter) -> AppResult<Vec<Material>> {
        let materials = self.materials.read().await;
        let mut result: Vec<Material> = materials
            .values()
            .filter(|m| filter.include_inactive || m.is_active)
            .filter(|m| match &filter.category {
                Some(category) => m.category.as_deref() == Some(category.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(result)
    }

    async fn insert_material(&self, material: &Material) -> AppResult<()> {
        let mut materials = self.materials.write().await;
        if materials.contains_key(&material.code) {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }
        materials.insert(material.code.clone(), material.clone());
        Ok(())
    }

    async fn update_material(&self, material: &Material) -> AppResult<()> {
        let mut materials = self.materials.write().await;
        match materials.get_mut(&material.code) {
            Some(existing) => {
                *existing = material.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Material {}", material.code))),
        }
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn find_record(&self, id: Uuid) -> AppResult<Option<InventoryRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_record_for_item(
        &self,
        location: &LocationKey,
        item_code: &str,
    ) -> AppResult<Option<InventoryRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| &r.location == location && r.item_code == item_code)
            .cloned())
    }

    async fn list_records(&self, location: &LocationKey) -> AppResult<Vec<InventoryRecord>> {
        let mut result: Vec<InventoryRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| &r.location == location)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.item_code.cmp(&b.item_code));
        Ok(result)
    }

    async fn insert_record(&self, record: &InventoryRecord) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records
            .values()
            .any(|r| r.location == record.location && r.item_code == record.item_code)
        {
            return Err(AppError::DuplicateEntry("itemCode".to_string()));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn update_record(&self, record: &InventoryRecord) -> AppResult<()> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Inventory record".to_string())),
        }
    }
}

#[async_trait]
impl TransferStore for MemoryStore {
    async fn find_transfer(&self, id: Uuid) -> AppResult<Option<TransferOrder>> {
        Ok(self.transfers.read().await.get(&id).cloned())
    }

    async fn list_transfers(&self, location: Option<&LocationKey>) -> AppResult<Vec<TransferOrder>> {
        let mut result: Vec<TransferOrder> = self
            .transfers
            .read()
            .await
            .values()
            .filter(|t| match location {
                Some(loc) => &t.from_location == loc || &t.to_location == loc,
                None => true,
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn insert_transfer(&self, order: &TransferOrder) -> AppResult<()> {
        self.transfers.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_transfer(&self, order: &TransferOrder) -> AppResult<()> {
        let mut transfers = self.transfers.write().await;
        match transfers.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Transfer order".to_string())),
        }
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> AppResult<()> {
        self.notifications.write().await.push(notification.clone());
        Ok(())
    }

    async fn find_notification(&self, id: Uuid) -> AppResult<Option<Notification>> {
        Ok(self
            .notifications
            .read()
            .await
            .iter()
            .find(|n| n.id == id)
            .cloned())
    }

    async fn list_notifications(
        &self,
        location: &LocationKey,
        notification_type: Option<NotificationType>,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        // Insertion order breaks ties between equal timestamps
        let mut result: Vec<(usize, Notification)> = notifications
            .iter()
            .enumerate()
            .filter(|(_, n)| &n.target_location == location)
            .filter(|(_, n)| notification_type.map_or(true, |t| n.notification_type == t))
            .map(|(i, n)| (i, n.clone()))
            .collect();
        result.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
        Ok(result
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(_, n)| n)
            .collect())
    }

    async fn mark_read(&self, id: Uuid) -> AppResult<bool> {
        let mut notifications = self.notifications.write().await;
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, location: &LocationKey) -> AppResult<u64> {
        let mut notifications = self.notifications.write().await;
        let mut count = 0;
        for n in notifications
            .iter_mut()
            .filter(|n| &n.target_location == location && !n.read)
        {
            n.read = true;
            count += 1;
        }
        Ok(count)
    }

    async fn clear_notifications(&self, location: &LocationKey) -> AppResult<u64> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| &n.target_location != location);
        Ok((before - notifications.len()) as u64)
    }
}
