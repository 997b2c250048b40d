//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Warehouse credentials are deliberately *optional* at load time: the
//! connection manager validates them when the first connection is built,
//! so an instance can start against the local store alone.
//!
//! ## Environment Variables
//! - `FLEETPDM_DB_PATH`: local store file path (required)
//! - `FLEETPDM_DB_POOL_SIZE`: connection pool size
//! - `FLEETPDM_WAREHOUSE_CATALOG` / `FLEETPDM_WAREHOUSE_SCHEMA`: the single
//!   catalog/schema pair used by every query (required)
//! - `FLEETPDM_WAREHOUSE_CLIENT_ID` / `FLEETPDM_WAREHOUSE_CLIENT_SECRET`
//! - `FLEETPDM_WAREHOUSE_HOST` / `FLEETPDM_WAREHOUSE_HTTP_PATH`
//! - `FLEETPDM_WAREHOUSE_MAX_ATTEMPTS`: remote retry budget
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `fleetpdm.{json,toml}` in the
//! working directory, two parent levels, and next to the executable.

use std::path::{Path, PathBuf};

use fleetpdm_domain::constants::{DEFAULT_DB_POOL_SIZE, DEFAULT_MAX_ATTEMPTS};
use fleetpdm_domain::{
    Config, DatabaseConfig, FleetPdmError, Result, TableMap, WarehouseConfig,
};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `FleetPdmError::Config` if configuration cannot be loaded from
/// either source, the file format is invalid, or required fields are
/// missing.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(env_error) => {
            tracing::debug!(error = ?env_error, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `FleetPdmError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("FLEETPDM_DB_PATH")?;
    let pool_size = env_u32("FLEETPDM_DB_POOL_SIZE", DEFAULT_DB_POOL_SIZE)?;

    let catalog = env_var("FLEETPDM_WAREHOUSE_CATALOG")?;
    let schema = env_var("FLEETPDM_WAREHOUSE_SCHEMA")?;

    let mut warehouse = WarehouseConfig {
        client_id: env_optional("FLEETPDM_WAREHOUSE_CLIENT_ID"),
        client_secret: env_optional("FLEETPDM_WAREHOUSE_CLIENT_SECRET"),
        server_hostname: env_optional("FLEETPDM_WAREHOUSE_HOST"),
        http_path: env_optional("FLEETPDM_WAREHOUSE_HTTP_PATH"),
        catalog,
        schema,
        tables: TableMap::default(),
        ..default_warehouse_tuning()
    };
    warehouse.max_attempts = env_u32("FLEETPDM_WAREHOUSE_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;

    Ok(Config {
        warehouse,
        database: DatabaseConfig { path: db_path, pool_size },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `FleetPdmError::Config` if the file is missing, no candidate is
/// found, or parsing fails.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FleetPdmError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FleetPdmError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FleetPdmError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format detected by extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FleetPdmError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FleetPdmError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(FleetPdmError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files, first hit wins.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for prefix in ["", "../", "../../"] {
            for name in ["config", "fleetpdm"] {
                candidates.push(cwd.join(format!("{prefix}{name}.json")));
                candidates.push(cwd.join(format!("{prefix}{name}.toml")));
            }
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            for name in ["config", "fleetpdm"] {
                candidates.push(exe_dir.join(format!("{name}.json")));
                candidates.push(exe_dir.join(format!("{name}.toml")));
            }
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn default_warehouse_tuning() -> WarehouseConfig {
    use fleetpdm_domain::constants::{
        DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
        DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_STATEMENT_TIMEOUT_SECS, DEFAULT_TOKEN_TIMEOUT_SECS,
    };

    WarehouseConfig {
        client_id: String::new(),
        client_secret: String::new(),
        server_hostname: String::new(),
        http_path: String::new(),
        catalog: String::new(),
        schema: String::new(),
        tables: TableMap::default(),
        token_timeout_secs: DEFAULT_TOKEN_TIMEOUT_SECS,
        connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        statement_timeout_secs: DEFAULT_STATEMENT_TIMEOUT_SECS,
        max_attempts: DEFAULT_MAX_ATTEMPTS,
        retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        health_check_interval_secs: DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
    }
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        FleetPdmError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Optional environment variable, empty string when unset.
fn env_optional(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

/// Parse a u32 from an environment variable with a default.
fn env_u32(key: &str, default: u32) -> Result<u32> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u32>()
            .map_err(|e| FleetPdmError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}
