//! Demo fixture data for the local store
//!
//! A handful of representative rows per table, used by tests and demo
//! environments so the fallback tier has something to serve before the
//! first sync from the warehouse.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use fleetpdm_core::{
    PartRepository, RequisitionRepository, ShipStatusRepository, WorkOrderRepository,
};
use fleetpdm_domain::{Part, PartsRequisition, Result, ShipStatus, WorkOrder};

use super::manager::DbManager;
use super::parts::SqlitePartRepository;
use super::requisitions::SqliteRequisitionRepository;
use super::ship_status::SqliteShipStatusRepository;
use super::work_orders::SqliteWorkOrderRepository;

/// Insert the demo rows into every table.
pub async fn seed_demo_data(db: Arc<DbManager>) -> Result<()> {
    let work_orders = SqliteWorkOrderRepository::new(db.clone());
    for record in demo_work_orders() {
        work_orders.insert(&record).await?;
    }

    let parts = SqlitePartRepository::new(db.clone());
    for record in demo_parts() {
        parts.insert(&record).await?;
    }

    let ships = SqliteShipStatusRepository::new(db.clone());
    for record in demo_ship_status() {
        ships.insert(&record).await?;
    }

    let requisitions = SqliteRequisitionRepository::new(db);
    for record in demo_requisitions() {
        requisitions.insert(&record).await?;
    }

    Ok(())
}

pub fn demo_work_orders() -> Vec<WorkOrder> {
    let stamp = |y, m, d, h| Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single().unwrap_or_default();
    vec![
        WorkOrder {
            wo: "ED569313".into(),
            ship: "USS Bainbridge (DDG-96)".into(),
            homeport: "NB Norfolk".into(),
            failure_mode: "Vibration – Hot Section".into(),
            gte: "LM2500".into(),
            priority: "Routine".into(),
            status: "Submitted".into(),
            eta_days: 8,
            symptoms: Some("Excessive vibration detected during operation".into()),
            recommended_action: Some("Inspect hot section components for wear".into()),
            parts_required: Some("Turbine Blade Set".into()),
            sla_category: Some("Priority".into()),
            created_at: stamp(2024, 1, 15, 10),
            updated_at: stamp(2024, 1, 15, 10),
        },
        WorkOrder {
            wo: "39A8CA7E".into(),
            ship: "USS Arleigh Burke (DDG-51)".into(),
            homeport: "NB Norfolk".into(),
            failure_mode: "Oil Pressure – Low".into(),
            gte: "LM2500".into(),
            priority: "Urgent".into(),
            status: "In Progress".into(),
            eta_days: 5,
            symptoms: Some("Oil pressure dropping below normal operating range".into()),
            recommended_action: Some("Replace main oil pump and check filter".into()),
            parts_required: Some("Main Oil Pump, Oil Filter Cartridge".into()),
            sla_category: Some("Urgent".into()),
            created_at: stamp(2024, 1, 14, 10),
            updated_at: stamp(2024, 1, 14, 10),
        },
        WorkOrder {
            wo: "CASREP001".into(),
            ship: "USS Cole (DDG-67)".into(),
            homeport: "NB Norfolk".into(),
            failure_mode: "Temperature – High EGT".into(),
            gte: "LM2500".into(),
            priority: "CASREP".into(),
            status: "Submitted".into(),
            eta_days: 2,
            symptoms: Some("Exhaust gas temperature exceeding limits".into()),
            recommended_action: Some("Emergency shutdown and immediate inspection".into()),
            parts_required: Some("Temperature Sensor".into()),
            sla_category: Some("Critical".into()),
            created_at: stamp(2024, 1, 15, 13),
            updated_at: stamp(2024, 1, 15, 13),
        },
    ]
}

pub fn demo_parts() -> Vec<Part> {
    let stamp = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).single().unwrap_or_default();
    vec![
        Part {
            id: "P-1001".into(),
            name: "Turbine Blade Set".into(),
            system: "LM2500".into(),
            category: "Hot Section".into(),
            stock_level: 12,
            min_stock: 4,
            max_stock: 40,
            location: "NB Norfolk Warehouse 3".into(),
            condition: "New".into(),
            lead_time: "6 weeks".into(),
            supplier: "GE Marine".into(),
            cost: 18500.0,
            last_updated: stamp,
        },
        Part {
            id: "P-1002".into(),
            name: "Main Oil Pump".into(),
            system: "LM2500".into(),
            category: "Lube Oil".into(),
            stock_level: 5,
            min_stock: 2,
            max_stock: 12,
            location: "NB Norfolk Warehouse 1".into(),
            condition: "New".into(),
            lead_time: "3 weeks".into(),
            supplier: "GE Marine".into(),
            cost: 7400.0,
            last_updated: stamp,
        },
        Part {
            id: "P-1003".into(),
            name: "Fuel Injector Assembly".into(),
            system: "LM2500".into(),
            category: "Fuel System".into(),
            stock_level: 8,
            min_stock: 3,
            max_stock: 20,
            location: "San Diego Depot".into(),
            condition: "Refurbished".into(),
            lead_time: "2 weeks".into(),
            supplier: "Collins Aerospace".into(),
            cost: 4200.0,
            last_updated: stamp,
        },
        Part {
            id: "P-1004".into(),
            name: "Temperature Sensor".into(),
            system: "LM2500".into(),
            category: "Hot Section".into(),
            stock_level: 24,
            min_stock: 10,
            max_stock: 60,
            location: "Pearl Harbor Annex".into(),
            condition: "New".into(),
            lead_time: "1 week".into(),
            supplier: "Honeywell".into(),
            cost: 650.0,
            last_updated: stamp,
        },
    ]
}

pub fn demo_ship_status() -> Vec<ShipStatus> {
    let stamp = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).single().unwrap_or_default();
    vec![
        ShipStatus {
            ship: "USS Arleigh Burke (DDG-51)".into(),
            designation: "DDG-51".into(),
            homeport: "NB Norfolk".into(),
            ship_class: "DDG".into(),
            status: "Operational".into(),
            gte_count: 4,
            operational_gte: 4,
            casrep_gte: 0,
            last_updated: stamp,
        },
        ShipStatus {
            ship: "USS Cole (DDG-67)".into(),
            designation: "DDG-67".into(),
            homeport: "NB Norfolk".into(),
            ship_class: "DDG".into(),
            status: "Degraded".into(),
            gte_count: 4,
            operational_gte: 3,
            casrep_gte: 1,
            last_updated: stamp,
        },
        ShipStatus {
            ship: "USS Milius (DDG-69)".into(),
            designation: "DDG-69".into(),
            homeport: "San Diego".into(),
            ship_class: "DDG".into(),
            status: "Operational".into(),
            gte_count: 4,
            operational_gte: 4,
            casrep_gte: 0,
            last_updated: stamp,
        },
    ]
}

pub fn demo_requisitions() -> Vec<PartsRequisition> {
    let stamp = |d, h| Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).single().unwrap_or_default();
    vec![
        PartsRequisition {
            id: "REQ-2024-001".into(),
            part_id: "P-1001".into(),
            part_name: "Turbine Blade Set".into(),
            work_order_id: Some("ED569313".into()),
            ship: "USS Bainbridge (DDG-96)".into(),
            quantity: 1,
            priority: "Routine".into(),
            status: "Pending".into(),
            requested_by: "GSM1 Okafor".into(),
            requested_at: stamp(15, 11),
            updated_at: stamp(15, 11),
        },
        PartsRequisition {
            id: "REQ-2024-002".into(),
            part_id: "P-1002".into(),
            part_name: "Main Oil Pump".into(),
            work_order_id: Some("39A8CA7E".into()),
            ship: "USS Arleigh Burke (DDG-51)".into(),
            quantity: 1,
            priority: "Urgent".into(),
            status: "Approved".into(),
            requested_by: "GSM2 Delgado".into(),
            requested_at: stamp(14, 12),
            updated_at: stamp(15, 9),
        },
        PartsRequisition {
            id: "REQ-2024-003".into(),
            part_id: "P-1004".into(),
            part_name: "Temperature Sensor".into(),
            work_order_id: Some("CASREP001".into()),
            ship: "USS Cole (DDG-67)".into(),
            quantity: 2,
            priority: "CASREP".into(),
            status: "Shipped".into(),
            requested_by: "GSCS Tran".into(),
            requested_at: stamp(15, 14),
            updated_at: stamp(16, 8),
        },
    ]
}

#[cfg(test)]
mod tests {
    use fleetpdm_domain::{PartFilter, RequisitionFilter, ShipStatusFilter, WorkOrderFilter};
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn seeds_every_table() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db = Arc::new(DbManager::new(temp_dir.path().join("test.db"), 2).expect("manager"));
        db.run_migrations().expect("migrations");

        seed_demo_data(db.clone()).await.expect("seeded");

        let work_orders = SqliteWorkOrderRepository::new(db.clone());
        assert_eq!(work_orders.list(&WorkOrderFilter::default()).await.unwrap().len(), 3);

        let parts = SqlitePartRepository::new(db.clone());
        assert_eq!(parts.list(&PartFilter::default()).await.unwrap().len(), 4);

        let ships = SqliteShipStatusRepository::new(db.clone());
        assert_eq!(ships.list(&ShipStatusFilter::default()).await.unwrap().len(), 3);

        let requisitions = SqliteRequisitionRepository::new(db);
        assert_eq!(requisitions.list(&RequisitionFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db = Arc::new(DbManager::new(temp_dir.path().join("test.db"), 2).expect("manager"));
        db.run_migrations().expect("migrations");

        seed_demo_data(db.clone()).await.expect("first seed");
        seed_demo_data(db.clone()).await.expect("second seed");

        let parts = SqlitePartRepository::new(db);
        assert_eq!(parts.list(&PartFilter::default()).await.unwrap().len(), 4);
    }
}
