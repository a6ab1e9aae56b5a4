//! Raw-material (stock-keeping unit) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stock_status::{derive_status, StockStatus};
use crate::error::{DomainError, DomainResult};
use crate::types::{LocationKey, LocationStocks, Unit};

/// A stock-keeping unit tracked across all locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    /// Canonical uppercase code, unique across materials
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub unit: Unit,
    pub unit_price: Decimal,
    pub supplier: Option<String>,
    /// Always the sum of `location_stocks`
    pub current_stock: Decimal,
    pub location_stocks: LocationStocks,
    pub minimum_stock: Decimal,
    pub maximum_stock: Decimal,
    pub reorder_point: Decimal,
    pub status: StockStatus,
    pub is_active: bool,
    /// Correlation id in the external inventory system
    pub external_id: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub sync_status: SyncStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Synchronization state relative to the external inventory system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Unsynced,
    Synced,
    Updated,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Unsynced => "unsynced",
            SyncStatus::Synced => "synced",
            SyncStatus::Updated => "updated",
            SyncStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unsynced" => Some(SyncStatus::Unsynced),
            "synced" => Some(SyncStatus::Synced),
            "updated" => Some(SyncStatus::Updated),
            "failed" => Some(SyncStatus::Failed),
            _ => None,
        }
    }
}

/// Thresholds applied to materials created without explicit values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockThresholds {
    pub minimum: Decimal,
    pub maximum: Decimal,
    pub reorder_point: Decimal,
}

impl Default for StockThresholds {
    fn default() -> Self {
        Self {
            minimum: Decimal::from(10),
            maximum: Decimal::from(1000),
            reorder_point: Decimal::from(20),
        }
    }
}

impl StockThresholds {
    pub fn validate(&self) -> DomainResult<()> {
        if self.minimum < Decimal::ZERO {
            return Err(DomainError::validation("minimumStock", "must not be negative"));
        }
        if self.maximum < self.minimum {
            return Err(DomainError::validation(
                "maximumStock",
                "must not be below the minimum stock",
            ));
        }
        if self.reorder_point < Decimal::ZERO {
            return Err(DomainError::validation("reorderPoint", "must not be negative"));
        }
        Ok(())
    }
}

/// Descriptive fields of a manually created material
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterial {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub unit: Unit,
    #[serde(default)]
    pub unit_price: Decimal,
    pub supplier: Option<String>,
    #[serde(default)]
    pub location_stocks: LocationStocks,
    pub thresholds: Option<StockThresholds>,
}

impl Material {
    /// Create a material from manual input. Stock totals and status are
    /// derived from the supplied per-location quantities.
    pub fn create(
        input: NewMaterial,
        defaults: StockThresholds,
        locations: &[LocationKey],
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let code = canonical_code(&input.code)
            .ok_or_else(|| DomainError::validation("code", "is required"))?;
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("name", "is required"));
        }
        if input.unit_price < Decimal::ZERO {
            return Err(DomainError::validation("unitPrice", "must not be negative"));
        }
        if input.location_stocks.iter().any(|(_, q)| *q < Decimal::ZERO) {
            return Err(DomainError::validation("locationStocks", "quantities must not be negative"));
        }
        let thresholds = input.thresholds.unwrap_or(defaults);
        thresholds.validate()?;

        let mut location_stocks = input.location_stocks;
        location_stocks.ensure_locations(locations);

        let mut material = Material {
            id: Uuid::new_v4(),
            code,
            name: input.name.trim().to_string(),
            category: input.category,
            sub_category: input.sub_category,
            unit: input.unit,
            unit_price: input.unit_price,
            supplier: input.supplier,
            current_stock: Decimal::ZERO,
            location_stocks,
            minimum_stock: thresholds.minimum,
            maximum_stock: thresholds.maximum,
            reorder_point: thresholds.reorder_point,
            status: StockStatus::OutOfStock,
            is_active: true,
            external_id: None,
            last_synced_at: None,
            sync_status: SyncStatus::Unsynced,
            created_at: now,
            updated_at: now,
        };
        material.recompute();
        Ok(material)
    }

    /// Recompute the total from the per-location map and re-derive the status
    pub fn recompute(&mut self) {
        self.current_stock = self.location_stocks.total();
        self.status = derive_status(self.current_stock, self.minimum_stock, self.maximum_stock);
    }

    /// Manually adjust the stock held at one location by `delta`
    pub fn adjust_location(
        &mut self,
        location: LocationKey,
        delta: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let next = self.location_stocks.get(&location) + delta;
        if next < Decimal::ZERO {
            return Err(DomainError::InsufficientStock(format!(
                "{} holds {} {} of {}, cannot remove {}",
                location,
                self.location_stocks.get(&location),
                self.unit,
                self.code,
                -delta
            )));
        }
        self.location_stocks.set(location, next);
        self.recompute();
        self.updated_at = now;
        Ok(())
    }

    pub fn update_thresholds(&mut self, thresholds: StockThresholds, now: DateTime<Utc>) -> DomainResult<()> {
        thresholds.validate()?;
        self.minimum_stock = thresholds.minimum;
        self.maximum_stock = thresholds.maximum;
        self.reorder_point = thresholds.reorder_point;
        self.recompute();
        self.updated_at = now;
        Ok(())
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }

    /// True once stock has fallen to or below the reorder point
    pub fn needs_reorder(&self) -> bool {
        self.current_stock <= self.reorder_point
    }
}

/// Canonical form of a material code: trimmed and uppercased.
/// Returns `None` for blank input.
pub fn canonical_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn new_material(stocks: LocationStocks) -> NewMaterial {
        NewMaterial {
            code: " fl-001 ".to_string(),
            name: "Flour".to_string(),
            category: Some("Dry Goods".to_string()),
            sub_category: None,
            unit: Unit::Kg,
            unit_price: d(2),
            supplier: None,
            location_stocks: stocks,
            thresholds: None,
        }
    }

    #[test]
    fn create_canonicalises_code_and_derives_totals() {
        let mut stocks = LocationStocks::new();
        stocks.add(LocationKey::new("central_kitchen"), d(40));
        stocks.add(LocationKey::new("mall_360"), d(5));
        let locations = [LocationKey::new("central_kitchen"), LocationKey::new("kuwait_city")];

        let material =
            Material::create(new_material(stocks), StockThresholds::default(), &locations, Utc::now())
                .unwrap();

        assert_eq!(material.code, "FL-001");
        assert_eq!(material.current_stock, d(45));
        assert_eq!(material.location_stocks.get(&LocationKey::new("kuwait_city")), d(0));
        assert_eq!(material.location_stocks.len(), 3);
        assert_eq!(material.status, StockStatus::InStock);
        assert_eq!(material.sync_status, SyncStatus::Unsynced);
    }

    #[test]
    fn create_rejects_blank_code_and_negative_price() {
        let mut input = new_material(LocationStocks::new());
        input.code = "   ".to_string();
        let err = Material::create(input, StockThresholds::default(), &[], Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "code"));

        let mut input = new_material(LocationStocks::new());
        input.unit_price = d(-1);
        assert!(Material::create(input, StockThresholds::default(), &[], Utc::now()).is_err());
    }

    #[test]
    fn adjust_location_keeps_total_in_sync() {
        let mut material =
            Material::create(new_material(LocationStocks::new()), StockThresholds::default(), &[], Utc::now())
                .unwrap();
        let central = LocationKey::new("central_kitchen");

        material.adjust_location(central.clone(), d(25), Utc::now()).unwrap();
        material.adjust_location(central.clone(), d(-5), Utc::now()).unwrap();

        assert_eq!(material.current_stock, d(20));
        assert_eq!(material.current_stock, material.location_stocks.total());
        assert!(material.needs_reorder());

        let err = material.adjust_location(central, d(-21), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock(_)));
        assert_eq!(material.current_stock, d(20));
    }

    #[test]
    fn thresholds_must_be_ordered() {
        let bad = StockThresholds {
            minimum: d(50),
            maximum: d(10),
            reorder_point: d(0),
        };
        assert!(bad.validate().is_err());
        assert!(StockThresholds::default().validate().is_ok());
    }
}
