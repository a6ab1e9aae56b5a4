//! Common types used across the ERP

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical identifier of a stocking location (central kitchen or outlet)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LocationKey(String);

impl LocationKey {
    /// Build a key from any display name: trimmed, lowercased, whitespace and
    /// dashes folded into underscores.
    pub fn new(raw: &str) -> Self {
        let key = raw
            .trim()
            .chars()
            .map(|c| {
                if c.is_whitespace() || c == '-' {
                    '_'
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect();
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LocationKey {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<LocationKey> for String {
    fn from(value: LocationKey) -> Self {
        value.0
    }
}

/// Stock quantity per location.
///
/// An open map rather than a fixed set of fields, so adding an outlet never
/// changes the shape of a material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationStocks(BTreeMap<LocationKey, Decimal>);

impl LocationStocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity held at `location`, zero when the location is absent
    pub fn get(&self, location: &LocationKey) -> Decimal {
        self.0.get(location).copied().unwrap_or(Decimal::ZERO)
    }

    /// Add `quantity` to whatever is already held at `location`
    pub fn add(&mut self, location: LocationKey, quantity: Decimal) {
        *self.0.entry(location).or_insert(Decimal::ZERO) += quantity;
    }

    pub fn set(&mut self, location: LocationKey, quantity: Decimal) {
        self.0.insert(location, quantity);
    }

    /// Ensure every key in `locations` is present, inserting zero for missing ones
    pub fn ensure_locations<'a>(&mut self, locations: impl IntoIterator<Item = &'a LocationKey>) {
        for location in locations {
            self.0.entry(location.clone()).or_insert(Decimal::ZERO);
        }
    }

    /// Merge `other` into `self` by adding quantities location by location
    pub fn merge_additive(&mut self, other: &LocationStocks) {
        for (location, quantity) in other.iter() {
            self.add(location.clone(), *quantity);
        }
    }

    pub fn total(&self) -> Decimal {
        self.0.values().copied().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LocationKey, &Decimal)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(LocationKey, Decimal)> for LocationStocks {
    fn from_iter<T: IntoIterator<Item = (LocationKey, Decimal)>>(iter: T) -> Self {
        let mut stocks = LocationStocks::new();
        for (location, quantity) in iter {
            stocks.add(location, quantity);
        }
        stocks
    }
}

/// Canonical unit of measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Kg,
    G,
    L,
    Ml,
    Pcs,
    Box,
    Pack,
    Bottle,
    Can,
    Dozen,
    Tray,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::G => "g",
            Unit::L => "l",
            Unit::Ml => "ml",
            Unit::Pcs => "pcs",
            Unit::Box => "box",
            Unit::Pack => "pack",
            Unit::Bottle => "bottle",
            Unit::Can => "can",
            Unit::Dozen => "dozen",
            Unit::Tray => "tray",
        }
    }

    /// Parse a canonical unit name; external spellings go through
    /// [`crate::normalize::UnitNormalizer`] instead.
    pub fn from_canonical(s: &str) -> Option<Self> {
        match s {
            "kg" => Some(Unit::Kg),
            "g" => Some(Unit::G),
            "l" => Some(Unit::L),
            "ml" => Some(Unit::Ml),
            "pcs" => Some(Unit::Pcs),
            "box" => Some(Unit::Box),
            "pack" => Some(Unit::Pack),
            "bottle" => Some(Unit::Bottle),
            "can" => Some(Unit::Can),
            "dozen" => Some(Unit::Dozen),
            "tray" => Some(Unit::Tray),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn location_key_is_canonicalised() {
        assert_eq!(LocationKey::new("  Central Kitchen ").as_str(), "central_kitchen");
        assert_eq!(LocationKey::new("Mall-360").as_str(), "mall_360");
    }

    #[test]
    fn location_key_deserializes_canonically() {
        let key: LocationKey = serde_json::from_str("\"Kuwait City\"").unwrap();
        assert_eq!(key.as_str(), "kuwait_city");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"kuwait_city\"");
    }

    #[test]
    fn location_stocks_add_is_cumulative() {
        let mut stocks = LocationStocks::new();
        let central = LocationKey::new("central");
        stocks.add(central.clone(), dec("10"));
        stocks.add(central.clone(), dec("2.5"));
        assert_eq!(stocks.get(&central), dec("12.5"));
        assert_eq!(stocks.get(&LocationKey::new("elsewhere")), Decimal::ZERO);
        assert_eq!(stocks.total(), dec("12.5"));
    }

    #[test]
    fn from_iter_sums_duplicate_keys() {
        let stocks: LocationStocks = vec![
            (LocationKey::new("central"), dec("4")),
            (LocationKey::new("central"), dec("6")),
            (LocationKey::new("mall"), dec("1")),
        ]
        .into_iter()
        .collect();

        assert_eq!(stocks.len(), 2);
        assert_eq!(stocks.get(&LocationKey::new("central")), dec("10"));
        assert_eq!(stocks.total(), dec("11"));
    }

    #[test]
    fn unit_round_trips_through_canonical_name() {
        for unit in [Unit::Kg, Unit::Ml, Unit::Pcs, Unit::Tray] {
            assert_eq!(Unit::from_canonical(unit.as_str()), Some(unit));
        }
        assert_eq!(Unit::from_canonical("kilogram"), None);
    }
}
