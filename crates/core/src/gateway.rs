//! Fallback coordinator
//!
//! One read operation per domain resource. Each read builds a
//! parameterized request against the configured `catalog.schema.table`
//! reference, attempts the remote warehouse, and on any remote failure
//! serves the equivalent filtered query from the local store, tagging the
//! response with the fallback reason. Only a simultaneous remote-and-local
//! failure is surfaced to the caller.

use std::future::Future;
use std::sync::Arc;

use fleetpdm_domain::{
    FallbackEnvelope, FallbackReason, FleetPdmError, Part, PartFilter, PartsRequisition,
    QueryRequest, RequisitionFilter, Result, ShipStatus, ShipStatusFilter, WarehouseConfig,
    WorkOrder, WorkOrderFilter,
};
use tracing::{debug, warn};

use crate::ports::{
    DiagnosticsSink, PartRepository, RemoteWarehouse, RequisitionRepository,
    ShipStatusRepository, WorkOrderRepository,
};
use crate::query::TableQuery;
use crate::rows::{map_rows, FromRow};

/// The local repositories backing the fallback tier.
#[derive(Clone)]
pub struct LocalRepositories {
    pub work_orders: Arc<dyn WorkOrderRepository>,
    pub parts: Arc<dyn PartRepository>,
    pub ship_status: Arc<dyn ShipStatusRepository>,
    pub parts_requisitions: Arc<dyn RequisitionRepository>,
}

/// Fully-qualified table references, resolved once at construction.
#[derive(Debug, Clone)]
struct TableRefs {
    work_orders: String,
    parts: String,
    ship_status: String,
    parts_requisitions: String,
}

/// The data gateway every domain read goes through.
///
/// Built once at process start and shared; owns no global state beyond
/// what its injected ports carry.
pub struct FleetDataGateway {
    remote: Arc<dyn RemoteWarehouse>,
    local: LocalRepositories,
    diagnostics: Arc<dyn DiagnosticsSink>,
    tables: TableRefs,
}

impl FleetDataGateway {
    pub fn new(
        remote: Arc<dyn RemoteWarehouse>,
        local: LocalRepositories,
        diagnostics: Arc<dyn DiagnosticsSink>,
        config: &WarehouseConfig,
    ) -> Self {
        let tables = TableRefs {
            work_orders: config.table_reference(&config.tables.work_orders),
            parts: config.table_reference(&config.tables.parts),
            ship_status: config.table_reference(&config.tables.ship_status),
            parts_requisitions: config.table_reference(&config.tables.parts_requisitions),
        };
        Self { remote, local, diagnostics, tables }
    }

    /// List work orders, preferring the remote warehouse.
    pub async fn get_work_orders(
        &self,
        filter: &WorkOrderFilter,
    ) -> Result<FallbackEnvelope<Vec<WorkOrder>>> {
        let request = self.work_orders_query(filter);
        let repository = self.local.work_orders.clone();
        let filter = filter.clone();
        self.read_with_fallback("work_orders", request, move || async move {
            repository.list(&filter).await
        })
        .await
    }

    /// List spare parts, preferring the remote warehouse.
    pub async fn get_parts(&self, filter: &PartFilter) -> Result<FallbackEnvelope<Vec<Part>>> {
        let request = self.parts_query(filter);
        let repository = self.local.parts.clone();
        let filter = filter.clone();
        self.read_with_fallback("parts", request, move || async move {
            repository.list(&filter).await
        })
        .await
    }

    /// List ship readiness records, preferring the remote warehouse.
    pub async fn get_ship_status(
        &self,
        filter: &ShipStatusFilter,
    ) -> Result<FallbackEnvelope<Vec<ShipStatus>>> {
        let request = self.ship_status_query(filter);
        let repository = self.local.ship_status.clone();
        let filter = filter.clone();
        self.read_with_fallback("ship_status", request, move || async move {
            repository.list(&filter).await
        })
        .await
    }

    /// List parts requisitions, preferring the remote warehouse.
    pub async fn get_parts_requisitions(
        &self,
        filter: &RequisitionFilter,
    ) -> Result<FallbackEnvelope<Vec<PartsRequisition>>> {
        let request = self.requisitions_query(filter);
        let repository = self.local.parts_requisitions.clone();
        let filter = filter.clone();
        self.read_with_fallback("parts_requisitions", request, move || async move {
            repository.list(&filter).await
        })
        .await
    }

    /// Remote-first read with local fallback.
    ///
    /// Remote failures (including row-decode failures) are demoted to a
    /// fallback decision; a failure of the fallback path itself is
    /// terminal.
    async fn read_with_fallback<T, L, Fut>(
        &self,
        resource: &'static str,
        request: QueryRequest,
        local: L,
    ) -> Result<FallbackEnvelope<Vec<T>>>
    where
        T: FromRow,
        L: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let remote_outcome = match self.remote.execute_query(&request).await {
            Ok(rows) => map_rows::<T>(&rows),
            Err(error) => Err(error),
        };

        let remote_error = match remote_outcome {
            Ok(data) => {
                debug!(resource, rows = data.len(), "served from remote warehouse");
                self.diagnostics.record_remote_success();
                return Ok(FallbackEnvelope::remote(data));
            }
            Err(error) => error,
        };

        let reason = FallbackReason::from_error(&remote_error, request.statement.as_str());
        warn!(
            resource,
            code = %reason.code,
            error = %remote_error,
            "remote read failed, serving local fallback"
        );
        self.diagnostics.record_remote_failure(&reason);

        match local().await {
            Ok(data) => Ok(FallbackEnvelope::local(data, reason)),
            Err(local_error) => Err(FleetPdmError::DataUnavailable {
                remote: remote_error.to_string(),
                local: local_error.to_string(),
            }),
        }
    }

    fn work_orders_query(&self, filter: &WorkOrderFilter) -> QueryRequest {
        let mut query = TableQuery::new(&self.tables.work_orders)
            .filter_eq_opt("status", filter.status.clone())
            .filter_eq_opt("priority", filter.priority.clone())
            .filter_eq_opt("ship", filter.ship.clone())
            .filter_eq_opt("homeport", filter.homeport.clone());
        if let Some(needle) = &filter.search {
            query = query.search(&["ship", "failure_mode", "wo"], needle);
        }
        query.order_by("wo").limit(filter.limit).offset(filter.offset).build()
    }

    fn parts_query(&self, filter: &PartFilter) -> QueryRequest {
        let mut query = TableQuery::new(&self.tables.parts)
            .filter_eq_opt("category", filter.category.clone())
            .filter_eq_opt("condition", filter.condition.clone())
            .filter_eq_opt("system", filter.system.clone());
        if let Some(needle) = &filter.search {
            query = query.search(&["name", "id", "supplier", "location"], needle);
        }
        query.order_by("id").limit(filter.limit).offset(filter.offset).build()
    }

    fn ship_status_query(&self, filter: &ShipStatusFilter) -> QueryRequest {
        TableQuery::new(&self.tables.ship_status)
            .filter_eq_opt("homeport", filter.homeport.clone())
            .filter_eq_opt("ship_class", filter.ship_class.clone())
            .filter_eq_opt("status", filter.status.clone())
            .order_by("ship")
            .limit(filter.limit)
            .offset(filter.offset)
            .build()
    }

    fn requisitions_query(&self, filter: &RequisitionFilter) -> QueryRequest {
        TableQuery::new(&self.tables.parts_requisitions)
            .filter_eq_opt("status", filter.status.clone())
            .filter_eq_opt("priority", filter.priority.clone())
            .filter_eq_opt("ship", filter.ship.clone())
            .filter_eq_opt("work_order_id", filter.work_order_id.clone())
            .order_by("id")
            .limit(filter.limit)
            .offset(filter.offset)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use fleetpdm_domain::{DataSource, Row, TableMap};

    use super::*;

    fn test_config() -> WarehouseConfig {
        WarehouseConfig {
            client_id: "svc".into(),
            client_secret: "secret".into(),
            server_hostname: "warehouse.example.com".into(),
            http_path: "/sql/1.0/warehouses/abc".into(),
            catalog: "fleet".into(),
            schema: "maintenance".into(),
            tables: TableMap::default(),
            token_timeout_secs: 30,
            connect_timeout_secs: 30,
            statement_timeout_secs: 60,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            health_check_interval_secs: 60,
        }
    }

    fn part_row(id: &str, category: &str) -> Row {
        let value = serde_json::json!({
            "id": id,
            "name": "Turbine Blade Set",
            "system": "LM2500",
            "category": category,
            "stock_level": 12,
            "min_stock": 4,
            "max_stock": 40,
            "location": "NB Norfolk Warehouse 3",
            "condition": "New",
            "lead_time": "6 weeks",
            "supplier": "GE Marine",
            "cost": 18500.0,
            "last_updated": "2024-01-15T10:00:00Z",
        });
        match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn local_part(id: &str) -> Part {
        Part {
            id: id.into(),
            name: "Fuel Injector Assembly".into(),
            system: "LM2500".into(),
            category: "Hot Section".into(),
            stock_level: 3,
            min_stock: 2,
            max_stock: 10,
            location: "San Diego Depot".into(),
            condition: "Refurbished".into(),
            lead_time: "2 weeks".into(),
            supplier: "GE Marine".into(),
            cost: 4200.0,
            last_updated: Utc::now(),
        }
    }

    enum RemoteBehavior {
        Rows(Vec<Row>),
        Fail(FleetPdmError),
    }

    struct MockRemote {
        behavior: RemoteBehavior,
        calls: AtomicUsize,
        last_request: Mutex<Option<QueryRequest>>,
    }

    impl MockRemote {
        fn rows(rows: Vec<Row>) -> Self {
            Self {
                behavior: RemoteBehavior::Rows(rows),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn failing(error: FleetPdmError) -> Self {
            Self {
                behavior: RemoteBehavior::Fail(error),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl RemoteWarehouse for MockRemote {
        async fn execute_query(&self, request: &QueryRequest) -> Result<Vec<Row>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            match &self.behavior {
                RemoteBehavior::Rows(rows) => Ok(rows.clone()),
                RemoteBehavior::Fail(error) => Err(error.clone()),
            }
        }
    }

    #[derive(Default)]
    struct StubStore {
        parts: Vec<Part>,
        fail: bool,
    }

    #[async_trait]
    impl WorkOrderRepository for StubStore {
        async fn list(&self, _filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>> {
            if self.fail {
                return Err(FleetPdmError::Database("disk I/O error".into()));
            }
            Ok(vec![])
        }

        async fn insert(&self, _record: &WorkOrder) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl PartRepository for StubStore {
        async fn list(&self, _filter: &PartFilter) -> Result<Vec<Part>> {
            if self.fail {
                return Err(FleetPdmError::Database("disk I/O error".into()));
            }
            Ok(self.parts.clone())
        }

        async fn insert(&self, _record: &Part) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl ShipStatusRepository for StubStore {
        async fn list(&self, _filter: &ShipStatusFilter) -> Result<Vec<ShipStatus>> {
            if self.fail {
                return Err(FleetPdmError::Database("disk I/O error".into()));
            }
            Ok(vec![])
        }

        async fn insert(&self, _record: &ShipStatus) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl RequisitionRepository for StubStore {
        async fn list(&self, _filter: &RequisitionFilter) -> Result<Vec<PartsRequisition>> {
            if self.fail {
                return Err(FleetPdmError::Database("disk I/O error".into()));
            }
            Ok(vec![])
        }

        async fn insert(&self, _record: &PartsRequisition) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        failures: Mutex<Vec<FallbackReason>>,
        successes: AtomicUsize,
    }

    impl DiagnosticsSink for RecordingSink {
        fn record_remote_failure(&self, reason: &FallbackReason) {
            self.failures.lock().unwrap().push(reason.clone());
        }

        fn record_remote_success(&self) {
            self.successes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn gateway_with(
        remote: Arc<MockRemote>,
        store: Arc<StubStore>,
        sink: Arc<RecordingSink>,
    ) -> FleetDataGateway {
        let local = LocalRepositories {
            work_orders: store.clone(),
            parts: store.clone(),
            ship_status: store.clone(),
            parts_requisitions: store,
        };
        FleetDataGateway::new(remote, local, sink, &test_config())
    }

    #[tokio::test]
    async fn remote_success_yields_remote_envelope_without_reason() {
        let remote = Arc::new(MockRemote::rows(vec![
            part_row("P-1001", "Hot Section"),
            part_row("P-1002", "Hot Section"),
        ]));
        let sink = Arc::new(RecordingSink::default());
        let gateway = gateway_with(remote.clone(), Arc::new(StubStore::default()), sink.clone());

        let filter = PartFilter { category: Some("Hot Section".into()), ..Default::default() };
        let envelope = gateway.get_parts(&filter).await.unwrap();

        assert_eq!(envelope.source, DataSource::Remote);
        assert!(envelope.fallback_reason.is_none());
        assert_eq!(envelope.data.len(), 2);
        assert!(envelope.data.iter().all(|part| part.category == "Hot Section"));
        assert_eq!(sink.successes.load(Ordering::SeqCst), 1);
        assert!(sink.failures.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn remote_query_binds_filter_as_parameter() {
        let remote = Arc::new(MockRemote::rows(vec![]));
        let gateway = gateway_with(
            remote.clone(),
            Arc::new(StubStore::default()),
            Arc::new(RecordingSink::default()),
        );

        let filter = PartFilter { category: Some("Hot Section".into()), ..Default::default() };
        gateway.get_parts(&filter).await.unwrap();

        let request = remote.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(
            request.statement,
            "SELECT * FROM fleet.maintenance.parts WHERE category = :p0 ORDER BY id"
        );
        assert_eq!(request.parameters.len(), 1);
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_local_with_reason() {
        let remote = Arc::new(MockRemote::failing(FleetPdmError::QueryExecutionFailed {
            code: "TABLE_OR_VIEW_NOT_FOUND".into(),
            message: "Table 'fleet.maintenance.parts' not found".into(),
        }));
        let store = Arc::new(StubStore { parts: vec![local_part("P-2001")], fail: false });
        let sink = Arc::new(RecordingSink::default());
        let gateway = gateway_with(remote, store, sink.clone());

        let envelope = gateway.get_parts(&PartFilter::default()).await.unwrap();

        assert_eq!(envelope.source, DataSource::Local);
        let reason = envelope.fallback_reason.unwrap();
        assert_eq!(reason.code, "TABLE_OR_VIEW_NOT_FOUND");
        assert!(reason.query.contains("fleet.maintenance.parts"));
        assert_eq!(envelope.data[0].id, "P-2001");

        let failures = sink.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].code, "TABLE_OR_VIEW_NOT_FOUND");
    }

    #[tokio::test]
    async fn row_decode_failure_also_falls_back() {
        let mut bad_row = part_row("P-1001", "Hot Section");
        bad_row.remove("cost");
        let remote = Arc::new(MockRemote::rows(vec![bad_row]));
        let store = Arc::new(StubStore { parts: vec![local_part("P-2001")], fail: false });
        let gateway = gateway_with(remote, store, Arc::new(RecordingSink::default()));

        let envelope = gateway.get_parts(&PartFilter::default()).await.unwrap();

        assert_eq!(envelope.source, DataSource::Local);
        assert_eq!(envelope.fallback_reason.unwrap().code, "ROW_DECODE_FAILED");
    }

    #[tokio::test]
    async fn simultaneous_failure_is_data_unavailable() {
        let remote = Arc::new(MockRemote::failing(FleetPdmError::ConnectionFailed(
            "connection refused".into(),
        )));
        let store = Arc::new(StubStore { parts: vec![], fail: true });
        let gateway = gateway_with(remote, store, Arc::new(RecordingSink::default()));

        let err = gateway.get_parts(&PartFilter::default()).await.unwrap_err();
        match err {
            FleetPdmError::DataUnavailable { remote, local } => {
                assert!(remote.contains("connection refused"));
                assert!(local.contains("disk I/O error"));
            }
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn every_resource_keeps_the_tagging_invariant() {
        // Remote down for all four resources; every envelope must be
        // local-tagged with a reason.
        let remote = Arc::new(MockRemote::failing(FleetPdmError::ConnectionTimeout {
            timeout_secs: 30,
        }));
        let store = Arc::new(StubStore::default());
        let gateway = gateway_with(remote, store, Arc::new(RecordingSink::default()));

        let orders = gateway.get_work_orders(&WorkOrderFilter::default()).await.unwrap();
        let ships = gateway.get_ship_status(&ShipStatusFilter::default()).await.unwrap();
        let requisitions =
            gateway.get_parts_requisitions(&RequisitionFilter::default()).await.unwrap();

        for (source, reason) in [
            (orders.source, orders.fallback_reason.is_some()),
            (ships.source, ships.fallback_reason.is_some()),
            (requisitions.source, requisitions.fallback_reason.is_some()),
        ] {
            assert_eq!(source, DataSource::Local);
            assert!(reason);
        }
    }

    #[tokio::test]
    async fn search_filter_reaches_the_statement() {
        let remote = Arc::new(MockRemote::rows(vec![]));
        let gateway = gateway_with(
            remote.clone(),
            Arc::new(StubStore::default()),
            Arc::new(RecordingSink::default()),
        );

        let filter = WorkOrderFilter {
            search: Some("Bainbridge".into()),
            limit: Some(25),
            ..Default::default()
        };
        gateway.get_work_orders(&filter).await.unwrap();

        let request = remote.last_request.lock().unwrap().clone().unwrap();
        assert!(request
            .statement
            .contains("(ship LIKE :p0 OR failure_mode LIKE :p0 OR wo LIKE :p0)"));
        assert!(request.statement.ends_with("ORDER BY wo LIMIT 25"));
    }
}
