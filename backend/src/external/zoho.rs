//! Zoho Inventory client
//!
//! Exchanges the configured refresh token for an access token, then pages
//! through `GET /items` until the API reports no further pages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{ExternalItem, ExternalLocationStock};

use super::ItemSource;
use crate::config::ZohoConfig;
use crate::error::{AppError, AppResult};

pub const STEP_AUTHENTICATE: &str = "authenticate";
pub const STEP_FETCH_ITEMS: &str = "fetch_items";

/// Upper bound on pages fetched in one run
const MAX_PAGES: u32 = 500;

/// Zoho Inventory API client
#[derive(Clone)]
pub struct ZohoInventoryClient {
    client: Client,
    config: ZohoConfig,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    items: Vec<ZohoItem>,
    page_context: Option<PageContext>,
}

#[derive(Debug, Deserialize)]
struct PageContext {
    #[serde(default)]
    has_more_page: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ZohoItem {
    item_id: Option<String>,
    sku: Option<String>,
    #[serde(default)]
    name: String,
    category_name: Option<String>,
    unit: Option<String>,
    rate: Option<Decimal>,
    vendor_name: Option<String>,
    stock_on_hand: Option<Decimal>,
    #[serde(default)]
    locations: Vec<ZohoLocation>,
    #[serde(default)]
    warehouses: Vec<ZohoWarehouse>,
}

#[derive(Debug, Deserialize)]
struct ZohoLocation {
    location_name: String,
    location_stock_on_hand: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ZohoWarehouse {
    warehouse_name: String,
    warehouse_stock_on_hand: Option<Decimal>,
}

impl From<ZohoItem> for ExternalItem {
    fn from(item: ZohoItem) -> Self {
        // Newer organisations report `locations`, older ones `warehouses`
        let locations: Vec<ExternalLocationStock> = if !item.locations.is_empty() {
            item.locations
                .into_iter()
                .map(|l| ExternalLocationStock {
                    location: l.location_name,
                    quantity: l.location_stock_on_hand.unwrap_or_default(),
                })
                .collect()
        } else {
            item.warehouses
                .into_iter()
                .map(|w| ExternalLocationStock {
                    location: w.warehouse_name,
                    quantity: w.warehouse_stock_on_hand.unwrap_or_default(),
                })
                .collect()
        };

        ExternalItem {
            external_id: item.item_id,
            sku: item.sku,
            name: item.name,
            category: item.category_name,
            sub_category: None,
            unit: item.unit,
            unit_price: item.rate,
            supplier: item.vendor_name,
            quantity: item.stock_on_hand,
            locations,
        }
    }
}

impl ZohoInventoryClient {
    pub fn new(config: ZohoConfig) -> AppResult<Self> {
        if !config.is_configured() {
            return Err(AppError::Configuration(
                "zoho organization_id, client_id, client_secret and refresh_token are required"
                    .to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Exchange the refresh token for a short-lived access token
    async fn access_token(&self) -> AppResult<String> {
        let url = format!("{}/oauth/v2/token", self.config.accounts_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .query(&[
                ("refresh_token", self.config.refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::external(STEP_AUTHENTICATE, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external(
                STEP_AUTHENTICATE,
                format!("{} - {}", status, body),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::external(STEP_AUTHENTICATE, format!("unreadable token response: {}", e))
        })?;

        match (token.access_token, token.error) {
            (Some(access_token), _) if !access_token.is_empty() => Ok(access_token),
            (_, Some(error)) => Err(AppError::external(STEP_AUTHENTICATE, error)),
            _ => Err(AppError::external(STEP_AUTHENTICATE, "no access token returned")),
        }
    }

    async fn fetch_page(&self, token: &str, page: u32) -> AppResult<ItemsResponse> {
        let url = format!("{}/items", self.config.api_base.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Zoho-oauthtoken {}", token))
            .query(&[
                ("organization_id", self.config.organization_id.clone()),
                ("page", page.to_string()),
                ("per_page", self.config.per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::external(STEP_FETCH_ITEMS, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external(
                STEP_FETCH_ITEMS,
                format!("page {}: {} - {}", page, status, body),
            ));
        }

        let data: ItemsResponse = response.json().await.map_err(|e| {
            AppError::external(STEP_FETCH_ITEMS, format!("unreadable page {}: {}", page, e))
        })?;

        if data.code != 0 {
            return Err(AppError::external(
                STEP_FETCH_ITEMS,
                format!("page {}: code {} {}", page, data.code, data.message),
            ));
        }
        Ok(data)
    }
}

#[async_trait]
impl ItemSource for ZohoInventoryClient {
    fn name(&self) -> &str {
        "zoho"
    }

    async fn fetch_items(&self) -> AppResult<Vec<ExternalItem>> {
        let token = self.access_token().await?;
        tracing::debug!("Zoho access token obtained");

        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let data = self.fetch_page(&token, page).await?;
            let count = data.items.len();
            items.extend(data.items.into_iter().map(ExternalItem::from));
            tracing::debug!(page, count, "Fetched Zoho items page");

            let has_more = data.page_context.map_or(false, |p| p.has_more_page);
            if !has_more {
                break;
            }
            if page >= MAX_PAGES {
                return Err(AppError::external(
                    STEP_FETCH_ITEMS,
                    format!("more than {} pages reported", MAX_PAGES),
                ));
            }
            page += 1;
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_with_locations() {
        let raw = r#"{
            "item_id": "4600000001",
            "sku": "FL-001",
            "name": "Flour",
            "category_name": "Dry Goods",
            "unit": "Kgs",
            "rate": 2.5,
            "stock_on_hand": 12,
            "locations": [
                {"location_name": "Central Kitchen", "location_stock_on_hand": 10},
                {"location_name": "360 Mall", "location_stock_on_hand": 2}
            ]
        }"#;
        let item: ExternalItem = serde_json::from_str::<ZohoItem>(raw).unwrap().into();
        assert_eq!(item.sku.as_deref(), Some("FL-001"));
        assert_eq!(item.external_id.as_deref(), Some("4600000001"));
        assert_eq!(item.locations.len(), 2);
        assert_eq!(item.locations[1].location, "360 Mall");
        assert_eq!(item.locations[1].quantity, Decimal::from(2));
        assert_eq!(item.unit_price, Some(Decimal::new(25, 1)));
    }

    #[test]
    fn warehouses_used_when_locations_absent() {
        let raw = r#"{
            "item_id": "1",
            "sku": "",
            "name": "Salt",
            "warehouses": [{"warehouse_name": "Main Warehouse", "warehouse_stock_on_hand": 4}]
        }"#;
        let item: ExternalItem = serde_json::from_str::<ZohoItem>(raw).unwrap().into();
        assert_eq!(item.locations.len(), 1);
        assert_eq!(item.locations[0].location, "Main Warehouse");
        assert!(item.correlation_key().is_none());
    }

    #[test]
    fn unconfigured_client_is_rejected() {
        let config = crate::config::Config::for_memory().zoho;
        assert!(matches!(
            ZohoInventoryClient::new(config),
            Err(AppError::Configuration(_))
        ));
    }
}
