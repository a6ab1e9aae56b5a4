//! Stock reconciliation: merging an external item record into a material
//!
//! Descriptive fields (name, category, unit, supplier, price) are taken from
//! the external record as authoritative. Stock is cumulative: every reported
//! location quantity is added to what the material already holds there, and
//! the total is always recomputed from the per-location map.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::material::{canonical_code, Material, StockThresholds, SyncStatus};
use crate::models::stock_status::StockStatus;
use crate::normalize::{LocationDirectory, LocationResolution, UnitNormalizer};
use crate::types::{LocationKey, LocationStocks};

/// An item record as reported by the external inventory system
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalItem {
    /// Id of the record in the external system
    pub external_id: Option<String>,
    /// Correlation key; items without one are never reconciled
    pub sku: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub supplier: Option<String>,
    /// Aggregate quantity, used only when `locations` is empty
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub locations: Vec<ExternalLocationStock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLocationStock {
    pub location: String,
    pub quantity: Decimal,
}

impl ExternalItem {
    /// Canonical correlation key, `None` when the SKU is missing or blank
    pub fn correlation_key(&self) -> Option<String> {
        self.sku.as_deref().and_then(canonical_code)
    }
}

/// Stock quantity reported under an unrecognized location name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldedLocation {
    pub external_name: String,
    pub folded_into: LocationKey,
    pub quantity: Decimal,
}

/// External stock mapped onto canonical locations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedStock {
    pub stocks: LocationStocks,
    pub folded: Vec<FoldedLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    Created,
    Updated,
}

/// Result of reconciling one external item
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub material: Material,
    pub action: ReconcileAction,
    pub folded: Vec<FoldedLocation>,
    pub previous_status: Option<StockStatus>,
}

/// Applies unit/location normalization and additive stock merging
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    units: UnitNormalizer,
    locations: LocationDirectory,
    defaults: StockThresholds,
}

impl Reconciler {
    pub fn new(units: UnitNormalizer, locations: LocationDirectory, defaults: StockThresholds) -> Self {
        Self {
            units,
            locations,
            defaults,
        }
    }

    pub fn locations(&self) -> &LocationDirectory {
        &self.locations
    }

    pub fn units(&self) -> &UnitNormalizer {
        &self.units
    }

    pub fn defaults(&self) -> StockThresholds {
        self.defaults
    }

    /// Map the item's reported stock onto canonical locations.
    ///
    /// Quantities reported under the same canonical key (including every
    /// folded location) are summed. An item without a location breakdown
    /// books its aggregate quantity to the fallback location.
    pub fn map_stock(&self, item: &ExternalItem) -> DomainResult<MappedStock> {
        let mut mapped = MappedStock::default();

        if item.locations.is_empty() {
            let quantity = item.quantity.unwrap_or(Decimal::ZERO);
            if quantity < Decimal::ZERO {
                return Err(DomainError::validation("quantity", "must not be negative"));
            }
            mapped.stocks.add(self.locations.fallback().clone(), quantity);
            return Ok(mapped);
        }

        for line in &item.locations {
            if line.quantity < Decimal::ZERO {
                return Err(DomainError::validation(
                    format!("locations[{}].quantity", line.location),
                    "must not be negative",
                ));
            }
            match self.locations.resolve(&line.location) {
                LocationResolution::Known(key) => mapped.stocks.add(key, line.quantity),
                LocationResolution::Folded { key, external_name } => {
                    mapped.stocks.add(key.clone(), line.quantity);
                    mapped.folded.push(FoldedLocation {
                        external_name,
                        folded_into: key,
                        quantity: line.quantity,
                    });
                }
            }
        }

        Ok(mapped)
    }

    /// Merge `item` into `existing`, or build a new material when there is none.
    pub fn reconcile(
        &self,
        existing: Option<Material>,
        item: &ExternalItem,
        now: DateTime<Utc>,
    ) -> DomainResult<Reconciliation> {
        let code = item
            .correlation_key()
            .ok_or(DomainError::MissingCorrelationKey)?;
        if let Some(price) = item.unit_price {
            if price < Decimal::ZERO {
                return Err(DomainError::validation("unitPrice", "must not be negative"));
            }
        }
        let mapped = self.map_stock(item)?;

        match existing {
            None => Ok(Reconciliation {
                material: self.create_material(code, item, mapped.stocks, now)?,
                action: ReconcileAction::Created,
                folded: mapped.folded,
                previous_status: None,
            }),
            Some(material) => {
                if material.code != code {
                    return Err(DomainError::validation(
                        "code",
                        format!("external key {} does not match material {}", code, material.code),
                    ));
                }
                let previous_status = Some(material.status);
                Ok(Reconciliation {
                    material: self.merge_material(material, item, &mapped.stocks, now),
                    action: ReconcileAction::Updated,
                    folded: mapped.folded,
                    previous_status,
                })
            }
        }
    }

    fn create_material(
        &self,
        code: String,
        item: &ExternalItem,
        mut stocks: LocationStocks,
        now: DateTime<Utc>,
    ) -> DomainResult<Material> {
        let name = item.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name", "is required"));
        }
        stocks.ensure_locations(self.locations.locations());

        let mut material = Material {
            id: Uuid::new_v4(),
            code,
            name: name.to_string(),
            category: non_blank(&item.category),
            sub_category: non_blank(&item.sub_category),
            unit: self.units.normalize(item.unit.as_deref()),
            unit_price: item.unit_price.unwrap_or(Decimal::ZERO),
            supplier: non_blank(&item.supplier),
            current_stock: Decimal::ZERO,
            location_stocks: stocks,
            minimum_stock: self.defaults.minimum,
            maximum_stock: self.defaults.maximum,
            reorder_point: self.defaults.reorder_point,
            status: StockStatus::OutOfStock,
            is_active: true,
            external_id: non_blank(&item.external_id),
            last_synced_at: Some(now),
            sync_status: SyncStatus::Synced,
            created_at: now,
            updated_at: now,
        };
        material.recompute();
        Ok(material)
    }

    fn merge_material(
        &self,
        mut material: Material,
        item: &ExternalItem,
        incoming: &LocationStocks,
        now: DateTime<Utc>,
    ) -> Material {
        let name = item.name.trim();
        if !name.is_empty() {
            material.name = name.to_string();
        }
        if let Some(category) = non_blank(&item.category) {
            material.category = Some(category);
        }
        if let Some(sub_category) = non_blank(&item.sub_category) {
            material.sub_category = Some(sub_category);
        }
        if let Some(supplier) = non_blank(&item.supplier) {
            material.supplier = Some(supplier);
        }
        if let Some(external_id) = non_blank(&item.external_id) {
            material.external_id = Some(external_id);
        }
        material.unit = self.units.normalize(item.unit.as_deref());
        if let Some(price) = item.unit_price {
            material.unit_price = price;
        }

        material.location_stocks.merge_additive(incoming);
        material
            .location_stocks
            .ensure_locations(self.locations.locations());
        material.recompute();

        material.last_synced_at = Some(now);
        material.sync_status = SyncStatus::Updated;
        material.updated_at = now;
        material
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Unit;
    use proptest::prelude::*;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn item(sku: Option<&str>, locations: &[(&str, i64)]) -> ExternalItem {
        ExternalItem {
            external_id: Some("4600000001".into()),
            sku: sku.map(str::to_string),
            name: "Flour".into(),
            category: Some("Dry Goods".into()),
            unit: Some("Kgs".into()),
            unit_price: Some(d(2)),
            locations: locations
                .iter()
                .map(|(l, q)| ExternalLocationStock {
                    location: l.to_string(),
                    quantity: d(*q),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn central() -> LocationKey {
        LocationKey::new("central_kitchen")
    }

    #[test]
    fn first_sync_creates_material_at_minimum_boundary() {
        let reconciler = Reconciler::default();
        let result = reconciler
            .reconcile(None, &item(Some("a1"), &[("Central", 10)]), Utc::now())
            .unwrap();

        let m = result.material;
        assert_eq!(result.action, ReconcileAction::Created);
        assert_eq!(m.code, "A1");
        assert_eq!(m.unit, Unit::Kg);
        assert_eq!(m.location_stocks.get(&central()), d(10));
        assert_eq!(m.location_stocks.len(), reconciler.locations().locations().len());
        assert_eq!(m.current_stock, d(10));
        assert_eq!(m.status, StockStatus::LowStock);
        assert_eq!(m.sync_status, SyncStatus::Synced);
    }

    #[test]
    fn second_sync_adds_to_existing_stock() {
        let reconciler = Reconciler::default();
        let first = reconciler
            .reconcile(None, &item(Some("A1"), &[("Central", 10)]), Utc::now())
            .unwrap();
        let second = reconciler
            .reconcile(Some(first.material), &item(Some("A1"), &[("Central", 5)]), Utc::now())
            .unwrap();

        assert_eq!(second.action, ReconcileAction::Updated);
        assert_eq!(second.previous_status, Some(StockStatus::LowStock));
        assert_eq!(second.material.location_stocks.get(&central()), d(15));
        assert_eq!(second.material.current_stock, d(15));
        assert_eq!(second.material.sync_status, SyncStatus::Updated);
    }

    #[test]
    fn unknown_locations_fold_into_fallback() {
        let reconciler = Reconciler::default();
        let result = reconciler
            .reconcile(
                None,
                &item(Some("B2"), &[("Central", 3), ("Pop-up Stall", 4), ("Old Depot", 1)]),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(result.material.location_stocks.get(&central()), d(8));
        assert_eq!(result.material.current_stock, d(8));
        assert_eq!(result.folded.len(), 2);
        assert_eq!(result.folded[0].external_name, "Pop-up Stall");
        assert_eq!(result.folded[0].folded_into, central());
    }

    #[test]
    fn aggregate_quantity_goes_to_fallback() {
        let reconciler = Reconciler::default();
        let mut ext = item(Some("C3"), &[]);
        ext.quantity = Some(d(42));
        let result = reconciler.reconcile(None, &ext, Utc::now()).unwrap();
        assert_eq!(result.material.location_stocks.get(&central()), d(42));
        assert!(result.folded.is_empty());

        let merged = reconciler
            .reconcile(Some(result.material), &ext, Utc::now())
            .unwrap();
        assert_eq!(merged.material.current_stock, d(84));
    }

    #[test]
    fn missing_or_blank_key_is_rejected() {
        let reconciler = Reconciler::default();
        for sku in [None, Some(""), Some("   ")] {
            let err = reconciler
                .reconcile(None, &item(sku, &[("Central", 1)]), Utc::now())
                .unwrap_err();
            assert_eq!(err, DomainError::MissingCorrelationKey);
        }
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let reconciler = Reconciler::default();
        let err = reconciler
            .reconcile(None, &item(Some("N1"), &[("Central", -3)]), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn descriptive_fields_are_overwritten() {
        let reconciler = Reconciler::default();
        let first = reconciler
            .reconcile(None, &item(Some("D4"), &[("Central", 1)]), Utc::now())
            .unwrap();
        let mut update = item(Some("d4"), &[]);
        update.name = "Bread Flour".into();
        update.unit = Some("bag-of-stuff".into());
        update.unit_price = Some(d(3));
        let merged = reconciler
            .reconcile(Some(first.material), &update, Utc::now())
            .unwrap();

        assert_eq!(merged.material.name, "Bread Flour");
        assert_eq!(merged.material.unit, reconciler.units().default_unit());
        assert_eq!(merged.material.unit_price, d(3));
        assert_eq!(merged.material.current_stock, d(1));
    }

    #[test]
    fn mismatched_existing_material_is_rejected() {
        let reconciler = Reconciler::default();
        let other = reconciler
            .reconcile(None, &item(Some("X1"), &[]), Utc::now())
            .unwrap()
            .material;
        assert!(reconciler
            .reconcile(Some(other), &item(Some("Y1"), &[]), Utc::now())
            .is_err());
    }

    fn location_name() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("Central"),
            Just("Kuwait City"),
            Just("360 Mall"),
            Just("Vibes"),
            Just("Unknown Branch"),
        ]
    }

    proptest! {
        /// Conservation: after any sequence of merges the total equals the
        /// sum of the location map and equals everything ever reported.
        #[test]
        fn prop_stock_is_conserved(
            batches in proptest::collection::vec(
                proptest::collection::vec((location_name(), 0i64..500), 0..5),
                1..8,
            )
        ) {
            let reconciler = Reconciler::default();
            let mut material: Option<Material> = None;
            let mut reported = Decimal::ZERO;

            for batch in batches {
                let lines: Vec<(&str, i64)> = batch.clone();
                let ext = item(Some("P1"), &lines);
                reported += lines.iter().map(|(_, q)| d(*q)).sum::<Decimal>();
                let result = reconciler.reconcile(material.take(), &ext, Utc::now()).unwrap();
                prop_assert_eq!(result.material.current_stock, result.material.location_stocks.total());
                material = Some(result.material);
            }

            prop_assert_eq!(material.unwrap().current_stock, reported);
        }

        /// Additivity: q1 then q2 at one location yields previous + q1 + q2
        #[test]
        fn prop_merges_are_additive(start in 0i64..1000, q1 in 0i64..1000, q2 in 0i64..1000) {
            let reconciler = Reconciler::default();
            let base = reconciler
                .reconcile(None, &item(Some("Q1"), &[("Kuwait City", start)]), Utc::now())
                .unwrap()
                .material;
            let once = reconciler
                .reconcile(Some(base), &item(Some("Q1"), &[("Kuwait City", q1)]), Utc::now())
                .unwrap()
                .material;
            let twice = reconciler
                .reconcile(Some(once), &item(Some("Q1"), &[("Kuwait City", q2)]), Utc::now())
                .unwrap()
                .material;

            prop_assert_eq!(
                twice.location_stocks.get(&LocationKey::new("kuwait_city")),
                d(start + q1 + q2)
            );
        }
    }
}
