//! Application wiring
//!
//! Assembles the reconciliation layer once at process start: local store,
//! warehouse stack, health monitor, and the data gateway. Everything is
//! held by a single [`FleetPdm`] value and threaded through constructors;
//! there is no module-level mutable state.

use std::sync::Arc;

use fleetpdm_core::{FleetDataGateway, LocalRepositories, RemoteWarehouse};
use fleetpdm_domain::{Config, Result};
use tracing::info;

use crate::database::{
    DbManager, SqlitePartRepository, SqliteRequisitionRepository, SqliteShipStatusRepository,
    SqliteWorkOrderRepository,
};
use crate::warehouse::{
    ConnectionManager, HealthMonitor, TokenProvider, WarehouseExecutor, WarehouseHttpClient,
};

/// The assembled reconciliation layer.
pub struct FleetPdm {
    pub gateway: FleetDataGateway,
    pub health: Arc<HealthMonitor>,
    pub db: Arc<DbManager>,
}

/// Build the full stack from configuration.
///
/// Runs local-store migrations before returning. Does not contact the
/// warehouse: the first remote read (or health probe) triggers the token
/// exchange and connection build lazily.
///
/// # Errors
/// Local-store or client-construction failures; an incomplete warehouse
/// configuration is *not* an error here, it surfaces per-read as a
/// fallback reason.
pub async fn bootstrap(config: Config) -> Result<FleetPdm> {
    let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
    db.run_migrations()?;

    let tokens = Arc::new(TokenProvider::new(config.warehouse.clone())?);
    let transport = Arc::new(WarehouseHttpClient::new(&config.warehouse)?);
    let connections =
        Arc::new(ConnectionManager::new(transport.clone(), tokens.clone(), config.warehouse.clone())?);
    let executor: Arc<dyn RemoteWarehouse> =
        Arc::new(WarehouseExecutor::new(transport, connections, &config.warehouse)?);

    let health = Arc::new(HealthMonitor::new(
        executor.clone(),
        tokens,
        config.warehouse.health_check_interval_secs,
    ));

    let local = LocalRepositories {
        work_orders: Arc::new(SqliteWorkOrderRepository::new(db.clone())),
        parts: Arc::new(SqlitePartRepository::new(db.clone())),
        ship_status: Arc::new(SqliteShipStatusRepository::new(db.clone())),
        parts_requisitions: Arc::new(SqliteRequisitionRepository::new(db.clone())),
    };

    let gateway = FleetDataGateway::new(executor, local, health.clone(), &config.warehouse);

    info!(db_path = %config.database.path, "fleetpdm data gateway assembled");
    Ok(FleetPdm { gateway, health, db })
}
