//! Configuration management for the kitchen ERP backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with ERP__ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{LocationDirectory, LocationEntry, Reconciler, StockThresholds, Unit, UnitNormalizer};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Which store backs the services
    pub storage: StorageConfig,

    /// Zoho Inventory item source
    pub zoho: ZohoConfig,

    /// Units, locations and default thresholds
    pub inventory: InventoryConfig,

    /// Notification listing limits
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Non-durable, for local development and tests
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZohoConfig {
    /// OAuth accounts server
    pub accounts_url: String,

    /// Inventory API base URL
    pub api_base: String,

    #[serde(default)]
    pub organization_id: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub refresh_token: String,

    /// Items requested per page
    pub per_page: u32,

    /// Timeout applied to every request, in seconds
    pub timeout_secs: u64,
}

impl ZohoConfig {
    pub fn is_configured(&self) -> bool {
        !self.organization_id.is_empty()
            && !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.refresh_token.is_empty()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Unit used when an external unit is not recognized
    pub default_unit: Unit,

    /// Location that absorbs stock reported under unknown location names
    pub fallback_location: String,

    pub default_minimum_stock: Decimal,
    pub default_maximum_stock: Decimal,
    pub default_reorder_point: Decimal,

    /// Canonical locations and their external aliases
    #[serde(default = "shared::default_locations")]
    pub locations: Vec<LocationEntry>,
}

impl InventoryConfig {
    pub fn thresholds(&self) -> StockThresholds {
        StockThresholds {
            minimum: self.default_minimum_stock,
            maximum: self.default_maximum_stock,
            reorder_point: self.default_reorder_point,
        }
    }

    pub fn location_directory(&self) -> LocationDirectory {
        LocationDirectory::new(&self.fallback_location, &self.locations)
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            UnitNormalizer::new(self.default_unit),
            self.location_directory(),
            self.thresholds(),
        )
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        let thresholds = StockThresholds::default();
        Self {
            default_unit: Unit::Pcs,
            fallback_location: "central_kitchen".to_string(),
            default_minimum_stock: thresholds.minimum,
            default_maximum_stock: thresholds.maximum,
            default_reorder_point: thresholds.reorder_point,
            locations: shared::default_locations(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Page size when the caller does not ask for one
    pub default_limit: i64,

    /// Upper bound on any requested page size
    pub max_limit: i64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 200,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("ERP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("storage.backend", "postgres")?
            .set_default("zoho.accounts_url", "https://accounts.zoho.com")?
            .set_default("zoho.api_base", "https://www.zohoapis.com/inventory/v1")?
            .set_default("zoho.per_page", 200)?
            .set_default("zoho.timeout_secs", 30)?
            .set_default("inventory.default_unit", "pcs")?
            .set_default("inventory.fallback_location", "central_kitchen")?
            .set_default("inventory.default_minimum_stock", "10")?
            .set_default("inventory.default_maximum_stock", "1000")?
            .set_default("inventory.default_reorder_point", "20")?
            .set_default("notifications.default_limit", 50)?
            .set_default("notifications.max_limit", 200)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (ERP_ prefix)
            .add_source(
                Environment::with_prefix("ERP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Configuration for tests and in-process tooling: memory store, no
    /// external source credentials.
    pub fn for_memory() -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
                min_connections: 1,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
            },
            zoho: ZohoConfig {
                accounts_url: "https://accounts.zoho.com".to_string(),
                api_base: "https://www.zohoapis.com/inventory/v1".to_string(),
                organization_id: String::new(),
                client_id: String::new(),
                client_secret: String::new(),
                refresh_token: String::new(),
                per_page: 200,
                timeout_secs: 30,
            },
            inventory: InventoryConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
