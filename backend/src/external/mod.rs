//! External item sources feeding the sync orchestrator

use async_trait::async_trait;
use shared::ExternalItem;

use crate::error::AppResult;

pub mod csv_source;
pub mod zoho;

pub use csv_source::CsvItemSource;
pub use zoho::ZohoInventoryClient;

/// A source of external item records. A failed fetch must not return a
/// partial batch.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn fetch_items(&self) -> AppResult<Vec<ExternalItem>>;
}

/// A batch already held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticItemSource {
    items: Vec<ExternalItem>,
}

impl StaticItemSource {
    pub fn new(items: Vec<ExternalItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl ItemSource for StaticItemSource {
    fn name(&self) -> &str {
        "batch"
    }

    async fn fetch_items(&self) -> AppResult<Vec<ExternalItem>> {
        Ok(self.items.clone())
    }
}
