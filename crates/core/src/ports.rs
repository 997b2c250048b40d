//! Port interfaces implemented by `fleetpdm-infra`

use async_trait::async_trait;
use fleetpdm_domain::{
    FallbackReason, Part, PartFilter, PartsRequisition, QueryRequest, RequisitionFilter, Result,
    Row, ShipStatus, ShipStatusFilter, WorkOrder, WorkOrderFilter,
};

/// Executes parameterized statements against the remote warehouse.
///
/// Implementations own the whole remote pipeline: token lifecycle,
/// connection reuse, per-call session scopes, and retry policy. Rows come
/// back verbatim; mapping to domain shapes happens in the coordinator.
#[async_trait]
pub trait RemoteWarehouse: Send + Sync {
    async fn execute_query(&self, request: &QueryRequest) -> Result<Vec<Row>>;
}

/// Local-store access for work orders.
#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    async fn list(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>>;
    async fn insert(&self, record: &WorkOrder) -> Result<()>;
}

/// Local-store access for spare parts.
#[async_trait]
pub trait PartRepository: Send + Sync {
    async fn list(&self, filter: &PartFilter) -> Result<Vec<Part>>;
    async fn insert(&self, record: &Part) -> Result<()>;
}

/// Local-store access for ship readiness records.
#[async_trait]
pub trait ShipStatusRepository: Send + Sync {
    async fn list(&self, filter: &ShipStatusFilter) -> Result<Vec<ShipStatus>>;
    async fn insert(&self, record: &ShipStatus) -> Result<()>;
}

/// Local-store access for parts requisitions.
#[async_trait]
pub trait RequisitionRepository: Send + Sync {
    async fn list(&self, filter: &RequisitionFilter) -> Result<Vec<PartsRequisition>>;
    async fn insert(&self, record: &PartsRequisition) -> Result<()>;
}

/// Failure/success bookkeeping consumed by the health tracker.
///
/// Synchronous on purpose: implementations keep the state behind a std
/// lock so the coordinator never awaits on diagnostics.
pub trait DiagnosticsSink: Send + Sync {
    /// A remote read failed and the local store served the request.
    fn record_remote_failure(&self, reason: &FallbackReason);

    /// A remote read succeeded; resets the consecutive-failure count.
    fn record_remote_success(&self);
}
