//! Item source reading an exported item sheet
//!
//! Columns: `sku,name,category,sub_category,unit,rate,supplier,location,quantity`.
//! Rows sharing a SKU become one item with several location lines. Rows
//! without a SKU are passed through individually so the sync run can count
//! them as skipped. Location-less quantities of a SKU that also has located
//! rows are booked as a line under the fallback location.

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{canonical_code, ExternalItem, ExternalLocationStock};

use super::ItemSource;
use crate::error::{AppError, AppResult};

const STEP_READ: &str = "read_csv";

#[derive(Debug, Deserialize)]
struct CsvRow {
    sku: Option<String>,
    #[serde(default)]
    name: String,
    category: Option<String>,
    sub_category: Option<String>,
    unit: Option<String>,
    rate: Option<String>,
    supplier: Option<String>,
    location: Option<String>,
    quantity: Option<String>,
}

/// Reads items from a CSV file on every fetch
#[derive(Debug, Clone)]
pub struct CsvItemSource {
    path: PathBuf,
    fallback_location: String,
}

impl CsvItemSource {
    pub fn new(path: impl Into<PathBuf>, fallback_location: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fallback_location: fallback_location.into(),
        }
    }
}

#[async_trait]
impl ItemSource for CsvItemSource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch_items(&self) -> AppResult<Vec<ExternalItem>> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            AppError::external(STEP_READ, format!("{}: {}", self.path.display(), e))
        })?;
        parse_items(raw.as_slice(), &self.fallback_location)
    }
}

fn parse_decimal(line: usize, column: &str, value: Option<String>) -> AppResult<Option<Decimal>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => Decimal::from_str(v).map(Some).map_err(|_| {
            AppError::external(STEP_READ, format!("line {}: {} '{}' is not a number", line, column, v))
        }),
    }
}

/// Parse CSV content into external items, grouping rows by SKU in order of
/// first appearance
pub fn parse_items<R: Read>(input: R, fallback_location: &str) -> AppResult<Vec<ExternalItem>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut items: Vec<ExternalItem> = Vec::new();
    let mut by_code: HashMap<String, usize> = HashMap::new();

    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row = row.map_err(|e| AppError::external(STEP_READ, format!("line {}: {}", line, e)))?;
        let quantity = parse_decimal(line, "quantity", row.quantity)?;
        let rate = parse_decimal(line, "rate", row.rate)?;
        let location = row.location.filter(|l| !l.trim().is_empty());

        let slot = match row.sku.as_deref().and_then(canonical_code) {
            Some(code) => match by_code.get(&code) {
                Some(&slot) => Some(slot),
                None => {
                    by_code.insert(code, items.len());
                    None
                }
            },
            None => None,
        };

        let item = match slot {
            Some(slot) => &mut items[slot],
            None => {
                items.push(ExternalItem {
                    external_id: None,
                    sku: row.sku.clone(),
                    name: row.name.clone(),
                    category: row.category.clone(),
                    sub_category: row.sub_category.clone(),
                    unit: row.unit.clone(),
                    unit_price: rate,
                    supplier: row.supplier.clone(),
                    quantity: None,
                    locations: Vec::new(),
                });
                let last = items.len() - 1;
                &mut items[last]
            }
        };

        match (location, quantity) {
            (Some(location), quantity) => item.locations.push(ExternalLocationStock {
                location,
                quantity: quantity.unwrap_or_default(),
            }),
            (None, Some(quantity)) => {
                item.quantity = Some(item.quantity.unwrap_or_default() + quantity);
            }
            (None, None) => {}
        }
    }

    // An aggregate quantity is ignored once an item has location lines
    for item in items.iter_mut().filter(|i| !i.locations.is_empty()) {
        if let Some(quantity) = item.quantity.take() {
            item.locations.push(ExternalLocationStock {
                location: fallback_location.to_string(),
                quantity,
            });
        }
    }

    Ok(items)
}
