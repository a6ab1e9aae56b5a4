//! Material service: manual maintenance of the material catalogue

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use shared::{canonical_code, LocationDirectory, LocationKey, Material, NewMaterial, StockThresholds};

use crate::error::{AppError, AppResult};
use crate::store::{MaterialFilter, MaterialStore};

#[derive(Clone)]
pub struct MaterialService {
    store: Arc<dyn MaterialStore>,
    locations: LocationDirectory,
    defaults: StockThresholds,
}

impl MaterialService {
    pub fn new(
        store: Arc<dyn MaterialStore>,
        locations: LocationDirectory,
        defaults: StockThresholds,
    ) -> Self {
        Self {
            store,
            locations,
            defaults,
        }
    }

    fn known_location(&self, location: &LocationKey) -> AppResult<()> {
        if !self.locations.contains(location) {
            return Err(AppError::validation(
                "location",
                format!("unknown location {}", location),
            ));
        }
        Ok(())
    }

    /// Create a material. A taken code is reported as `DuplicateEntry`.
    pub async fn create(&self, input: NewMaterial) -> AppResult<Material> {
        for (location, _) in input.location_stocks.iter() {
            self.known_location(location)?;
        }
        let material = Material::create(input, self.defaults, self.locations.locations(), Utc::now())?;
        self.store.insert_material(&material).await?;

        tracing::info!(code = %material.code, stock = %material.current_stock, "Material created");
        Ok(material)
    }

    pub async fn get(&self, code: &str) -> AppResult<Material> {
        let code = canonical_code(code).ok_or_else(|| AppError::validation("code", "is required"))?;
        self.store
            .find_material(&code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Material {}", code)))
    }

    pub async fn list(&self, filter: &MaterialFilter) -> AppResult<Vec<Material>> {
        self.store.list_materials(filter).await
    }

    /// Adjust the stock held at one location; the total is recomputed
    pub async fn adjust_location(
        &self,
        code: &str,
        location: &LocationKey,
        delta: Decimal,
        reason: &str,
    ) -> AppResult<Material> {
        self.known_location(location)?;
        if delta.is_zero() {
            return Err(AppError::validation("delta", "must not be zero"));
        }
        let mut material = self.get(code).await?;
        material.adjust_location(location.clone(), delta, Utc::now())?;
        self.store.update_material(&material).await?;

        tracing::info!(
            code = %material.code,
            location = %location,
            delta = %delta,
            total = %material.current_stock,
            reason,
            "Material stock adjusted"
        );
        Ok(material)
    }

    pub async fn update_thresholds(&self, code: &str, thresholds: StockThresholds) -> AppResult<Material> {
        let mut material = self.get(code).await?;
        material.update_thresholds(thresholds, Utc::now())?;
        self.store.update_material(&material).await?;
        Ok(material)
    }

    /// Soft delete: the material stays addressable by code
    pub async fn deactivate(&self, code: &str) -> AppResult<Material> {
        let mut material = self.get(code).await?;
        if material.is_active {
            material.deactivate(Utc::now());
            self.store.update_material(&material).await?;
            tracing::info!(code = %material.code, "Material deactivated");
        }
        Ok(material)
    }
}
