//! SQLite repository for parts requisitions

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use fleetpdm_core::RequisitionRepository;
use fleetpdm_domain::{FleetPdmError, PartsRequisition, RequisitionFilter, Result};
use rusqlite::params;

use super::manager::{map_sql_error, DbManager};

const SELECT_COLUMNS: &str = "id, part_id, part_name, work_order_id, ship, quantity, priority, \
                              status, requested_by, requested_at, updated_at";

/// SQLite implementation of `RequisitionRepository`
pub struct SqliteRequisitionRepository {
    db: Arc<DbManager>,
}

impl SqliteRequisitionRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn build_list_query(filter: &RequisitionFilter) -> (String, Vec<String>) {
    let mut predicates = Vec::new();
    let mut values = Vec::new();

    for (column, value) in [
        ("status", &filter.status),
        ("priority", &filter.priority),
        ("ship", &filter.ship),
        ("work_order_id", &filter.work_order_id),
    ] {
        if let Some(value) = value {
            values.push(value.clone());
            predicates.push(format!("{column} = ?{}", values.len()));
        }
    }

    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM parts_requisitions");
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    sql.push_str(" ORDER BY id");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = filter.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    (sql, values)
}

#[async_trait]
impl RequisitionRepository for SqliteRequisitionRepository {
    async fn list(&self, filter: &RequisitionFilter) -> Result<Vec<PartsRequisition>> {
        let db = self.db.clone();
        let (sql, values) = build_list_query(filter);
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;

            let requisitions = stmt
                .query_map(rusqlite::params_from_iter(values.iter()), |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, i64>(9)?,
                        row.get::<_, i64>(10)?,
                    ))
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?
                .into_iter()
                .filter_map(
                    |(
                        id,
                        part_id,
                        part_name,
                        work_order_id,
                        ship,
                        quantity,
                        priority,
                        status,
                        requested_by,
                        requested_at,
                        updated_at,
                    )| {
                        Some(PartsRequisition {
                            id,
                            part_id,
                            part_name,
                            work_order_id,
                            ship,
                            quantity,
                            priority,
                            status,
                            requested_by,
                            requested_at: DateTime::from_timestamp(requested_at, 0)?,
                            updated_at: DateTime::from_timestamp(updated_at, 0)?,
                        })
                    },
                )
                .collect();

            Ok(requisitions)
        })
        .await
        .map_err(|e| FleetPdmError::Database(e.to_string()))?
    }

    async fn insert(&self, record: &PartsRequisition) -> Result<()> {
        let db = self.db.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR REPLACE INTO parts_requisitions \
                 (id, part_id, part_name, work_order_id, ship, quantity, priority, status, \
                  requested_by, requested_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id,
                    record.part_id,
                    record.part_name,
                    record.work_order_id,
                    record.ship,
                    record.quantity,
                    record.priority,
                    record.status,
                    record.requested_by,
                    record.requested_at.timestamp(),
                    record.updated_at.timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(|e| FleetPdmError::Database(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;

    fn repository() -> (TempDir, SqliteRequisitionRepository) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let manager =
            Arc::new(DbManager::new(temp_dir.path().join("test.db"), 2).expect("manager"));
        manager.run_migrations().expect("migrations");
        (temp_dir, SqliteRequisitionRepository::new(manager))
    }

    fn requisition(id: &str, status: &str, work_order_id: Option<&str>) -> PartsRequisition {
        PartsRequisition {
            id: id.into(),
            part_id: "P-1001".into(),
            part_name: "Turbine Blade Set".into(),
            work_order_id: work_order_id.map(Into::into),
            ship: "USS Cole (DDG-67)".into(),
            quantity: 2,
            priority: "Urgent".into(),
            status: status.into(),
            requested_by: "ET1 Ramirez".into(),
            requested_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn filters_by_status() {
        let (_guard, repo) = repository();
        repo.insert(&requisition("REQ-001", "Pending", Some("WO-1"))).await.unwrap();
        repo.insert(&requisition("REQ-002", "Approved", None)).await.unwrap();

        let filter = RequisitionFilter { status: Some("Pending".into()), ..Default::default() };
        let matching = repo.list(&filter).await.unwrap();

        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, "REQ-001");
    }

    #[tokio::test]
    async fn filters_by_work_order_link() {
        let (_guard, repo) = repository();
        repo.insert(&requisition("REQ-001", "Pending", Some("WO-1"))).await.unwrap();
        repo.insert(&requisition("REQ-002", "Pending", Some("WO-2"))).await.unwrap();
        repo.insert(&requisition("REQ-003", "Pending", None)).await.unwrap();

        let filter =
            RequisitionFilter { work_order_id: Some("WO-2".into()), ..Default::default() };
        let matching = repo.list(&filter).await.unwrap();

        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, "REQ-002");
    }

    #[tokio::test]
    async fn preserves_optional_work_order_link() {
        let (_guard, repo) = repository();
        repo.insert(&requisition("REQ-003", "Pending", None)).await.unwrap();

        let all = repo.list(&RequisitionFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].work_order_id.is_none());
    }
}
