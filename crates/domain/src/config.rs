//! Configuration structures
//!
//! Warehouse coordinates, local-store settings, and the per-resource table
//! map used to build fully-qualified table references. Loading (environment
//! variables, config files) lives in `fleetpdm-infra`; validation of the
//! warehouse credentials happens at connection-build time, not at load
//! time, so an incomplete configuration is representable here.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DB_POOL_SIZE, DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_STATEMENT_TIMEOUT_SECS,
    DEFAULT_TOKEN_TIMEOUT_SECS,
};
use crate::errors::{FleetPdmError, Result};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub warehouse: WarehouseConfig,
    pub database: DatabaseConfig,
}

/// Local SQLite store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,

    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Remote warehouse coordinates and tuning
///
/// The four credential/endpoint fields (`client_id`, `client_secret`,
/// `server_hostname`, `http_path`) default to empty strings and are checked
/// by [`WarehouseConfig::validate`] when a connection is first built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// OAuth client id for the client-credentials exchange
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret. Never logged in cleartext.
    #[serde(default)]
    pub client_secret: String,

    /// Warehouse hostname, with or without a scheme prefix
    #[serde(default)]
    pub server_hostname: String,

    /// HTTP path of the SQL endpoint on the warehouse
    #[serde(default)]
    pub http_path: String,

    /// Catalog component of fully-qualified table references
    pub catalog: String,

    /// Schema component of fully-qualified table references
    pub schema: String,

    /// Per-resource table names
    #[serde(default)]
    pub tables: TableMap,

    #[serde(default = "default_token_timeout")]
    pub token_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_secs: i64,
}

/// Table names for each domain resource, qualified at query-build time as
/// `catalog.schema.table`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMap {
    #[serde(default = "default_work_orders_table")]
    pub work_orders: String,
    #[serde(default = "default_parts_table")]
    pub parts: String,
    #[serde(default = "default_ship_status_table")]
    pub ship_status: String,
    #[serde(default = "default_requisitions_table")]
    pub parts_requisitions: String,
}

impl Default for TableMap {
    fn default() -> Self {
        Self {
            work_orders: default_work_orders_table(),
            parts: default_parts_table(),
            ship_status: default_ship_status_table(),
            parts_requisitions: default_requisitions_table(),
        }
    }
}

impl WarehouseConfig {
    /// Check that every field required to open a warehouse connection is
    /// present.
    ///
    /// # Errors
    /// Returns [`FleetPdmError::ConfigurationIncomplete`] naming the missing
    /// fields, sorted, so callers and logs see a deterministic list.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.client_id.is_empty() {
            missing.push("client_id".to_string());
        }
        if self.client_secret.is_empty() {
            missing.push("client_secret".to_string());
        }
        if self.http_path.is_empty() {
            missing.push("http_path".to_string());
        }
        if self.server_hostname.is_empty() {
            missing.push("server_hostname".to_string());
        }
        if missing.is_empty() {
            Ok(())
        } else {
            missing.sort();
            Err(FleetPdmError::ConfigurationIncomplete { missing })
        }
    }

    /// Base URL of the warehouse. A bare hostname gets an `https://`
    /// prefix; an explicit scheme (used by tests against local fixtures) is
    /// kept as-is.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.server_hostname.starts_with("http://")
            || self.server_hostname.starts_with("https://")
        {
            self.server_hostname.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.server_hostname.trim_end_matches('/'))
        }
    }

    /// Token endpoint for the client-credentials exchange.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/oidc/v1/token", self.base_url())
    }

    /// Fully-qualified reference for a table name in the configured
    /// catalog and schema.
    #[must_use]
    pub fn table_reference(&self, table: &str) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, table)
    }

    /// Whether a client secret is configured. Used for redacted logging;
    /// the secret itself must never reach a log line.
    #[must_use]
    pub fn client_secret_set(&self) -> bool {
        !self.client_secret.is_empty()
    }
}

fn default_pool_size() -> u32 {
    DEFAULT_DB_POOL_SIZE
}

fn default_token_timeout() -> u64 {
    DEFAULT_TOKEN_TIMEOUT_SECS
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_statement_timeout() -> u64 {
    DEFAULT_STATEMENT_TIMEOUT_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY_MS
}

fn default_health_check_interval() -> i64 {
    DEFAULT_HEALTH_CHECK_INTERVAL_SECS
}

fn default_work_orders_table() -> String {
    "work_orders".to_string()
}

fn default_parts_table() -> String {
    "parts".to_string()
}

fn default_ship_status_table() -> String {
    "ship_status".to_string()
}

fn default_requisitions_table() -> String {
    "parts_requisitions".to_string()
}
