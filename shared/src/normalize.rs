//! Unit-of-measure and location normalization for external item records
//!
//! External systems spell units and locations however their users typed them.
//! Both normalizers are total: an unknown unit falls back to a configured
//! default, and an unknown location is folded into the fallback location so
//! that no reported stock is ever dropped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{LocationKey, Unit};

/// Maps free-text external units onto [`Unit`]
#[derive(Debug, Clone)]
pub struct UnitNormalizer {
    default_unit: Unit,
}

impl UnitNormalizer {
    pub fn new(default_unit: Unit) -> Self {
        Self { default_unit }
    }

    pub fn default_unit(&self) -> Unit {
        self.default_unit
    }

    /// Normalize an external unit string. `None`, blank and unrecognized
    /// spellings all resolve to the default unit.
    pub fn normalize(&self, raw: Option<&str>) -> Unit {
        raw.and_then(lookup_unit).unwrap_or(self.default_unit)
    }
}

impl Default for UnitNormalizer {
    fn default() -> Self {
        Self::new(Unit::Pcs)
    }
}

fn lookup_unit(raw: &str) -> Option<Unit> {
    let cleaned: String = raw
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    let unit = match cleaned.as_str() {
        "kg" | "kgs" | "kilo" | "kilos" | "kilogram" | "kilograms" => Unit::Kg,
        "g" | "gm" | "gms" | "gr" | "gram" | "grams" => Unit::G,
        "l" | "lt" | "ltr" | "ltrs" | "liter" | "liters" | "litre" | "litres" => Unit::L,
        "ml" | "mls" | "milliliter" | "millilitre" | "milliliters" | "millilitres" => Unit::Ml,
        "pc" | "pcs" | "piece" | "pieces" | "nos" | "no" | "unit" | "units" | "each" | "ea" => {
            Unit::Pcs
        }
        "box" | "boxes" | "bx" | "ctn" | "carton" | "cartons" => Unit::Box,
        "pack" | "packs" | "pkt" | "pkts" | "packet" | "packets" | "pk" => Unit::Pack,
        "btl" | "btls" | "bottle" | "bottles" => Unit::Bottle,
        "can" | "cans" | "tin" | "tins" => Unit::Can,
        "dz" | "doz" | "dozen" | "dozens" => Unit::Dozen,
        "tray" | "trays" => Unit::Tray,
        _ => return None,
    };
    Some(unit)
}

/// A canonical location and the external names that refer to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationEntry {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Outcome of resolving one external location name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationResolution {
    Known(LocationKey),
    /// Unrecognized name folded into the fallback location
    Folded {
        key: LocationKey,
        external_name: String,
    },
}

impl LocationResolution {
    pub fn key(&self) -> &LocationKey {
        match self {
            LocationResolution::Known(key) => key,
            LocationResolution::Folded { key, .. } => key,
        }
    }

    pub fn is_folded(&self) -> bool {
        matches!(self, LocationResolution::Folded { .. })
    }
}

/// Directory of canonical stocking locations
#[derive(Debug, Clone)]
pub struct LocationDirectory {
    fallback: LocationKey,
    known: Vec<LocationKey>,
    by_name: HashMap<String, LocationKey>,
}

impl LocationDirectory {
    /// Build a directory. The fallback key is always part of the known set,
    /// even when no entry declares it.
    pub fn new(fallback: &str, entries: &[LocationEntry]) -> Self {
        let fallback = LocationKey::new(fallback);
        let mut known = vec![fallback.clone()];
        let mut by_name = HashMap::new();
        by_name.insert(name_token(fallback.as_str()), fallback.clone());

        for entry in entries {
            let key = LocationKey::new(&entry.key);
            if !known.contains(&key) {
                known.push(key.clone());
            }
            by_name.insert(name_token(&entry.key), key.clone());
            by_name.insert(name_token(&entry.name), key.clone());
            for alias in &entry.aliases {
                by_name.insert(name_token(alias), key.clone());
            }
        }

        Self {
            fallback,
            known,
            by_name,
        }
    }

    pub fn fallback(&self) -> &LocationKey {
        &self.fallback
    }

    /// Canonical keys in declaration order, fallback first
    pub fn locations(&self) -> &[LocationKey] {
        &self.known
    }

    pub fn contains(&self, key: &LocationKey) -> bool {
        self.known.contains(key)
    }

    /// Resolve an external location name. Unknown or blank names are folded
    /// into the fallback location.
    pub fn resolve(&self, external_name: &str) -> LocationResolution {
        match self.by_name.get(&name_token(external_name)) {
            Some(key) => LocationResolution::Known(key.clone()),
            None => LocationResolution::Folded {
                key: self.fallback.clone(),
                external_name: external_name.to_string(),
            },
        }
    }
}

impl Default for LocationDirectory {
    fn default() -> Self {
        Self::new("central_kitchen", &default_locations())
    }
}

/// Locations used when configuration does not declare any
pub fn default_locations() -> Vec<LocationEntry> {
    let entry = |key: &str, name: &str, aliases: &[&str]| LocationEntry {
        key: key.to_string(),
        name: name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    };

    vec![
        entry(
            "central_kitchen",
            "Central Kitchen",
            &["Central", "CK", "Main Warehouse", "Primary Warehouse"],
        ),
        entry("kuwait_city", "Kuwait City", &["KC", "City Outlet"]),
        entry("mall_360", "360 Mall", &["Mall 360", "360"]),
        entry("vibes_complex", "Vibes Complex", &["Vibes"]),
        entry("taiba_hospital", "Taiba Hospital", &["Taiba"]),
    ]
}

// Names compare case-, space- and punctuation-insensitively.
fn name_token(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
