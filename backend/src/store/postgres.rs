//! PostgreSQL store
//!
//! Enumerations are stored as their snake_case names; per-location stock,
//! transfer lines and status history are JSONB documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    InventoryRecord, ItemKind, LocationKey, LocationStocks, Material, Notification,
    NotificationPriority, NotificationType, StockStatus, SyncStatus, TransferOrder, TransferStatus,
    Unit,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{InventoryStore, MaterialFilter, MaterialStore, NotificationStore, TransferStore};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Map a unique-constraint violation to `DuplicateEntry(field)`
fn unique_violation(err: sqlx::Error, field: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::DuplicateEntry(field.to_string())
        }
        _ => AppError::DatabaseError(err),
    }
}

fn decode<T>(column: &str, value: &str, parsed: Option<T>) -> AppResult<T> {
    parsed.ok_or_else(|| AppError::Persistence(format!("unexpected {} value '{}'", column, value)))
}

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(column: &str, value: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Persistence(format!("malformed {}: {}", column, e)))
}

// ============================================================================
// Materials
// ============================================================================

#[derive(FromRow)]
struct MaterialRow {
    id: Uuid,
    code: String,
    name: String,
    category: Option<String>,
    sub_category: Option<String>,
    unit: String,
    unit_price: Decimal,
    supplier: Option<String>,
    current_stock: Decimal,
    location_stocks: serde_json::Value,
    minimum_stock: Decimal,
    maximum_stock: Decimal,
    reorder_point: Decimal,
    status: String,
    is_active: bool,
    external_id: Option<String>,
    last_synced_at: Option<DateTime<Utc>>,
    sync_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MaterialRow> for Material {
    type Error = AppError;

    /// The NUMERIC column rounds to four places while the JSONB map keeps
    /// exact quantities, so the total is re-derived from the map.
    fn try_from(row: MaterialRow) -> AppResult<Self> {
        let location_stocks: LocationStocks = from_json("location_stocks", row.location_stocks)?;
        let mut material = Material {
            id: row.id,
            unit: decode("unit", &row.unit, Unit::from_canonical(&row.unit))?,
            status: decode("status", &row.status, StockStatus::parse(&row.status))?,
            sync_status: decode(
                "sync_status",
                &row.sync_status,
                SyncStatus::parse(&row.sync_status),
            )?,
            code: row.code,
            name: row.name,
            category: row.category,
            sub_category: row.sub_category,
            unit_price: row.unit_price,
            supplier: row.supplier,
            current_stock: row.current_stock,
            location_stocks,
            minimum_stock: row.minimum_stock,
            maximum_stock: row.maximum_stock,
            reorder_point: row.reorder_point,
            is_active: row.is_active,
            external_id: row.external_id,
            last_synced_at: row.last_synced_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        material.recompute();
        Ok(material)
    }
}

#[async_trait]
impl MaterialStore for PgStore {
    async fn find_material(&self, code: &str) -> AppResult<Option<Material>> {
        let row = sqlx::query_as::<_, MaterialRow>("SELECT * FROM materials WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.db)
            .await?;
        row.map(Material::try_from).transpose()
    }

    async fn list_materials(&self, filter: &MaterialFilter) -> AppResult<Vec<Material>> {
        let rows = sqlx::query_as::<_, MaterialRow>(
            r#"
            SELECT * FROM materials
            WHERE ($1 OR is_active)
              AND ($2::TEXT IS NULL OR category = $2)
            ORDER BY code
            "#,
        )
        .bind(filter.include_inactive)
        .bind(filter.category.as_deref())
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Material::try_from).collect()
    }

    async fn insert_material(&self, m: &Material) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO materials (
                id, code, name, category, sub_category, unit, unit_price, supplier,
                current_stock, location_stocks, minimum_stock, maximum_stock, reorder_point,
                status, is_active, external_id, last_synced_at, sync_status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(m.id)
        .bind(&m.code)
        .bind(&m.name)
        .bind(&m.category)
        .bind(&m.sub_category)
        .bind(m.unit.as_str())
        .bind(m.unit_price)
        .bind(&m.supplier)
        .bind(m.current_stock)
        .bind(to_json(&m.location_stocks)?)
        .bind(m.minimum_stock)
        .bind(m.maximum_stock)
        .bind(m.reorder_point)
        .bind(m.status.as_str())
        .bind(m.is_active)
        .bind(&m.external_id)
        .bind(m.last_synced_at)
        .bind(m.sync_status.as_str())
        .bind(m.created_at)
        .bind(m.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| unique_violation(e, "code"))?;
        Ok(())
    }

    async fn update_material(&self, m: &Material) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE materials SET
                name = $2, category = $3, sub_category = $4, unit = $5, unit_price = $6,
                supplier = $7, current_stock = $8, location_stocks = $9, minimum_stock = $10,
                maximum_stock = $11, reorder_point = $12, status = $13, is_active = $14,
                external_id = $15, last_synced_at = $16, sync_status = $17, updated_at = $18
            WHERE code = $1
            "#,
        )
        .bind(&m.code)
        .bind(&m.name)
        .bind(&m.category)
        .bind(&m.sub_category)
        .bind(m.unit.as_str())
        .bind(m.unit_price)
        .bind(&m.supplier)
        .bind(m.current_stock)
        .bind(to_json(&m.location_stocks)?)
        .bind(m.minimum_stock)
        .bind(m.maximum_stock)
        .bind(m.reorder_point)
        .bind(m.status.as_str())
        .bind(m.is_active)
        .bind(&m.external_id)
        .bind(m.last_synced_at)
        .bind(m.sync_status.as_str())
        .bind(m.updated_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Material {}", m.code)));
        }
        Ok(())
    }
}

// ============================================================================
// Inventory records
// ============================================================================

#[derive(FromRow)]
struct InventoryRow {
    id: Uuid,
    location: String,
    item_kind: String,
    item_code: String,
    item_name: String,
    current_stock: Decimal,
    reserved_stock: Decimal,
    minimum_stock: Decimal,
    maximum_stock: Decimal,
    reorder_point: Decimal,
    unit_price: Decimal,
    last_updated: DateTime<Utc>,
}

impl TryFrom<InventoryRow> for InventoryRecord {
    type Error = AppError;

    fn try_from(row: InventoryRow) -> AppResult<Self> {
        let mut record = InventoryRecord {
            id: row.id,
            location: LocationKey::new(&row.location),
            item_kind: decode("item_kind", &row.item_kind, ItemKind::parse(&row.item_kind))?,
            item_code: row.item_code,
            item_name: row.item_name,
            current_stock: row.current_stock,
            reserved_stock: row.reserved_stock,
            available_stock: Decimal::ZERO,
            minimum_stock: row.minimum_stock,
            maximum_stock: row.maximum_stock,
            reorder_point: row.reorder_point,
            unit_price: row.unit_price,
            total_value: Decimal::ZERO,
            status: StockStatus::OutOfStock,
            last_updated: row.last_updated,
        };
        // Derived columns are stored for reporting but re-derived on load
        record.recompute();
        Ok(record)
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn find_record(&self, id: Uuid) -> AppResult<Option<InventoryRecord>> {
        let row = sqlx::query_as::<_, InventoryRow>("SELECT * FROM inventory_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.map(InventoryRecord::try_from).transpose()
    }

    async fn find_record_for_item(
        &self,
        location: &LocationKey,
        item_code: &str,
    ) -> AppResult<Option<InventoryRecord>> {
        let row = sqlx::query_as::<_, InventoryRow>(
            "SELECT * FROM inventory_records WHERE location = $1 AND item_code = $2",
        )
        .bind(location.as_str())
        .bind(item_code)
        .fetch_optional(&self.db)
        .await?;
        row.map(InventoryRecord::try_from).transpose()
    }

    async fn list_records(&self, location: &LocationKey) -> AppResult<Vec<InventoryRecord>> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            "SELECT * FROM inventory_records WHERE location = $1 ORDER BY item_code",
        )
        .bind(location.as_str())
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(InventoryRecord::try_from).collect()
    }

    async fn insert_record(&self, r: &InventoryRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_records (
                id, location, item_kind, item_code, item_name, current_stock, reserved_stock,
                available_stock, minimum_stock, maximum_stock, reorder_point, unit_price,
                total_value, status, last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(r.id)
        .bind(r.location.as_str())
        .bind(r.item_kind.as_str())
        .bind(&r.item_code)
        .bind(&r.item_name)
        .bind(r.current_stock)
        .bind(r.reserved_stock)
        .bind(r.available_stock)
        .bind(r.minimum_stock)
        .bind(r.maximum_stock)
        .bind(r.reorder_point)
        .bind(r.unit_price)
        .bind(r.total_value)
        .bind(r.status.as_str())
        .bind(r.last_updated)
        .execute(&self.db)
        .await
        .map_err(|e| unique_violation(e, "itemCode"))?;
        Ok(())
    }

    async fn update_record(&self, r: &InventoryRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_records SET
                item_name = $2, current_stock = $3, reserved_stock = $4, available_stock = $5,
                minimum_stock = $6, maximum_stock = $7, reorder_point = $8, unit_price = $9,
                total_value = $10, status = $11, last_updated = $12
            WHERE id = $1
            "#,
        )
        .bind(r.id)
        .bind(&r.item_name)
        .bind(r.current_stock)
        .bind(r.reserved_stock)
        .bind(r.available_stock)
        .bind(r.minimum_stock)
        .bind(r.maximum_stock)
        .bind(r.reorder_point)
        .bind(r.unit_price)
        .bind(r.total_value)
        .bind(r.status.as_str())
        .bind(r.last_updated)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory record".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Transfer orders
// ============================================================================

#[derive(FromRow)]
struct TransferRow {
    id: Uuid,
    order_number: String,
    from_location: String,
    to_location: String,
    items: serde_json::Value,
    total_value: Decimal,
    status: String,
    requested_by: String,
    notes: Option<String>,
    history: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransferRow> for TransferOrder {
    type Error = AppError;

    fn try_from(row: TransferRow) -> AppResult<Self> {
        Ok(TransferOrder {
            id: row.id,
            order_number: row.order_number,
            from_location: LocationKey::new(&row.from_location),
            to_location: LocationKey::new(&row.to_location),
            items: from_json("items", row.items)?,
            total_value: row.total_value,
            status: decode("status", &row.status, TransferStatus::parse(&row.status))?,
            requested_by: row.requested_by,
            notes: row.notes,
            history: from_json("history", row.history)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl TransferStore for PgStore {
    async fn find_transfer(&self, id: Uuid) -> AppResult<Option<TransferOrder>> {
        let row = sqlx::query_as::<_, TransferRow>("SELECT * FROM transfer_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.map(TransferOrder::try_from).transpose()
    }

    async fn list_transfers(&self, location: Option<&LocationKey>) -> AppResult<Vec<TransferOrder>> {
        let rows = sqlx::query_as::<_, TransferRow>(
            r#"
            SELECT * FROM transfer_orders
            WHERE $1::TEXT IS NULL OR from_location = $1 OR to_location = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(location.map(LocationKey::as_str))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(TransferOrder::try_from).collect()
    }

    async fn insert_transfer(&self, t: &TransferOrder) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transfer_orders (
                id, order_number, from_location, to_location, items, total_value, status,
                requested_by, notes, history, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(t.id)
        .bind(&t.order_number)
        .bind(t.from_location.as_str())
        .bind(t.to_location.as_str())
        .bind(to_json(&t.items)?)
        .bind(t.total_value)
        .bind(t.status.as_str())
        .bind(&t.requested_by)
        .bind(&t.notes)
        .bind(to_json(&t.history)?)
        .bind(t.created_at)
        .bind(t.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| unique_violation(e, "orderNumber"))?;
        Ok(())
    }

    async fn update_transfer(&self, t: &TransferOrder) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE transfer_orders SET status = $2, history = $3, notes = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(t.id)
        .bind(t.status.as_str())
        .bind(to_json(&t.history)?)
        .bind(&t.notes)
        .bind(t.updated_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Transfer order".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(FromRow)]
struct NotificationRow {
    id: Uuid,
    title: String,
    message: String,
    notification_type: String,
    target_location: String,
    source_location: String,
    transfer_order_id: Option<Uuid>,
    priority: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> AppResult<Self> {
        Ok(Notification {
            id: row.id,
            notification_type: decode(
                "notification_type",
                &row.notification_type,
                NotificationType::parse(&row.notification_type),
            )?,
            priority: decode(
                "priority",
                &row.priority,
                NotificationPriority::parse(&row.priority),
            )?,
            title: row.title,
            message: row.message,
            target_location: LocationKey::new(&row.target_location),
            source_location: row.source_location,
            transfer_order_id: row.transfer_order_id,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, n: &Notification) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, title, message, notification_type, target_location, source_location,
                transfer_order_id, priority, read, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(n.id)
        .bind(&n.title)
        .bind(&n.message)
        .bind(n.notification_type.as_str())
        .bind(n.target_location.as_str())
        .bind(&n.source_location)
        .bind(n.transfer_order_id)
        .bind(n.priority.as_str())
        .bind(n.read)
        .bind(n.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_notification(&self, id: Uuid) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.map(Notification::try_from).transpose()
    }

    async fn list_notifications(
        &self,
        location: &LocationKey,
        notification_type: Option<NotificationType>,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT * FROM notifications
            WHERE target_location = $1
              AND ($2::TEXT IS NULL OR notification_type = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(location.as_str())
        .bind(notification_type.map(|t| t.as_str()))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_read(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, location: &LocationKey) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE target_location = $1 AND NOT read",
        )
        .bind(location.as_str())
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn clear_notifications(&self, location: &LocationKey) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE target_location = $1")
            .bind(location.as_str())
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn material_row(current_stock: Decimal, location_stocks: serde_json::Value) -> MaterialRow {
        let now = Utc::now();
        MaterialRow {
            id: Uuid::new_v4(),
            code: "RM-1".to_string(),
            name: "Saffron".to_string(),
            category: None,
            sub_category: None,
            unit: "g".to_string(),
            unit_price: Decimal::ONE,
            supplier: None,
            current_stock,
            location_stocks,
            minimum_stock: Decimal::from(10),
            maximum_stock: Decimal::from(1000),
            reorder_point: Decimal::from(20),
            status: "In Stock".to_string(),
            is_active: true,
            external_id: None,
            last_synced_at: None,
            sync_status: "synced".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn material_total_follows_location_map() {
        // Column rounded to scale 4, map holds the exact quantity
        let row = material_row(
            Decimal::new(32346, 4),
            json!({ "central_kitchen": "1.23456", "mall_360": "2" }),
        );

        let material = Material::try_from(row).unwrap();
        assert_eq!(material.current_stock, Decimal::new(323456, 5));
        assert_eq!(material.current_stock, material.location_stocks.total());
        assert_eq!(material.status, StockStatus::LowStock);
    }

    #[test]
    fn unknown_status_is_a_persistence_error() {
        let mut row = material_row(Decimal::ZERO, json!({}));
        row.status = "Sold Out".to_string();
        assert!(matches!(Material::try_from(row), Err(AppError::Persistence(_))));
    }
}
