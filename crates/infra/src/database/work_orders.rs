//! SQLite repository for work orders

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use fleetpdm_core::WorkOrderRepository;
use fleetpdm_domain::{FleetPdmError, Result, WorkOrder, WorkOrderFilter};
use rusqlite::params;

use super::manager::{map_sql_error, DbManager};

const SELECT_COLUMNS: &str = "wo, ship, homeport, failure_mode, gte, priority, status, \
                              eta_days, symptoms, recommended_action, parts_required, \
                              sla_category, created_at, updated_at";

/// SQLite implementation of `WorkOrderRepository`
pub struct SqliteWorkOrderRepository {
    db: Arc<DbManager>,
}

impl SqliteWorkOrderRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

/// Build the filtered SELECT. Filter values bind as positional
/// parameters; limit/offset are validated integers rendered inline.
fn build_list_query(filter: &WorkOrderFilter) -> (String, Vec<String>) {
    let mut predicates = Vec::new();
    let mut values = Vec::new();

    for (column, value) in [
        ("status", &filter.status),
        ("priority", &filter.priority),
        ("ship", &filter.ship),
        ("homeport", &filter.homeport),
    ] {
        if let Some(value) = value {
            values.push(value.clone());
            predicates.push(format!("{column} = ?{}", values.len()));
        }
    }

    if let Some(needle) = &filter.search {
        values.push(format!("%{needle}%"));
        let n = values.len();
        predicates.push(format!("(ship LIKE ?{n} OR failure_mode LIKE ?{n} OR wo LIKE ?{n})"));
    }

    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM work_orders");
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    sql.push_str(" ORDER BY wo");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = filter.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    (sql, values)
}

#[async_trait]
impl WorkOrderRepository for SqliteWorkOrderRepository {
    async fn list(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>> {
        let db = self.db.clone();
        let (sql, values) = build_list_query(filter);
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;

            let orders = stmt
                .query_map(rusqlite::params_from_iter(values.iter()), |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, i64>(7)?,
                        row.get::<_, Option<String>>(8)?,
                        row.get::<_, Option<String>>(9)?,
                        row.get::<_, Option<String>>(10)?,
                        row.get::<_, Option<String>>(11)?,
                        row.get::<_, i64>(12)?,
                        row.get::<_, i64>(13)?,
                    ))
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?
                .into_iter()
                .filter_map(
                    |(
                        wo,
                        ship,
                        homeport,
                        failure_mode,
                        gte,
                        priority,
                        status,
                        eta_days,
                        symptoms,
                        recommended_action,
                        parts_required,
                        sla_category,
                        created_at,
                        updated_at,
                    )| {
                        Some(WorkOrder {
                            wo,
                            ship,
                            homeport,
                            failure_mode,
                            gte,
                            priority,
                            status,
                            eta_days,
                            symptoms,
                            recommended_action,
                            parts_required,
                            sla_category,
                            created_at: DateTime::from_timestamp(created_at, 0)?,
                            updated_at: DateTime::from_timestamp(updated_at, 0)?,
                        })
                    },
                )
                .collect();

            Ok(orders)
        })
        .await
        .map_err(|e| FleetPdmError::Database(e.to_string()))?
    }

    async fn insert(&self, record: &WorkOrder) -> Result<()> {
        let db = self.db.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR REPLACE INTO work_orders \
                 (wo, ship, homeport, failure_mode, gte, priority, status, eta_days, \
                  symptoms, recommended_action, parts_required, sla_category, \
                  created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    record.wo,
                    record.ship,
                    record.homeport,
                    record.failure_mode,
                    record.gte,
                    record.priority,
                    record.status,
                    record.eta_days,
                    record.symptoms,
                    record.recommended_action,
                    record.parts_required,
                    record.sla_category,
                    record.created_at.timestamp(),
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

    fn repository() -> (TempDir, SqliteWorkOrderRepository) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let manager =
            Arc::new(DbManager::new(temp_dir.path().join("test.db"), 2).expect("manager"));
        manager.run_migrations().expect("migrations");
        (temp_dir, SqliteWorkOrderRepository::new(manager))
    }

    fn order(wo: &str, ship: &str, status: &str, priority: &str) -> WorkOrder {
        WorkOrder {
            wo: wo.into(),
            ship: ship.into(),
            homeport: "NB Norfolk".into(),
            failure_mode: "Oil Pressure – Low".into(),
            gte: "LM2500".into(),
            priority: priority.into(),
            status: status.into(),
            eta_days: 5,
            symptoms: Some("Oil pressure dropping below normal operating range".into()),
            recommended_action: None,
            parts_required: Some("Main Oil Pump".into()),
            sla_category: Some("Urgent".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn inserts_and_lists_work_orders() {
        let (_guard, repo) = repository();
        repo.insert(&order("WO-1", "USS Cole (DDG-67)", "Submitted", "CASREP")).await.unwrap();
        repo.insert(&order("WO-2", "USS Mitscher (DDG-57)", "In Progress", "Urgent"))
            .await
            .unwrap();

        let all = repo.list(&WorkOrderFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        // Deterministic ordering by work-order number
        assert_eq!(all[0].wo, "WO-1");
    }

    #[tokio::test]
    async fn filters_by_status_and_priority() {
        let (_guard, repo) = repository();
        repo.insert(&order("WO-1", "USS Cole (DDG-67)", "Submitted", "CASREP")).await.unwrap();
        repo.insert(&order("WO-2", "USS Mitscher (DDG-57)", "In Progress", "Urgent"))
            .await
            .unwrap();

        let filter = WorkOrderFilter { status: Some("In Progress".into()), ..Default::default() };
        let matching = repo.list(&filter).await.unwrap();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].wo, "WO-2");

        let filter = WorkOrderFilter {
            status: Some("In Progress".into()),
            priority: Some("CASREP".into()),
            ..Default::default()
        };
        assert!(repo.list(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_matches_ship_failure_mode_and_number() {
        let (_guard, repo) = repository();
        repo.insert(&order("WO-1", "USS Cole (DDG-67)", "Submitted", "CASREP")).await.unwrap();
        repo.insert(&order("WO-2", "USS Mitscher (DDG-57)", "In Progress", "Urgent"))
            .await
            .unwrap();

        let filter = WorkOrderFilter { search: Some("Mitscher".into()), ..Default::default() };
        let matching = repo.list(&filter).await.unwrap();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].ship, "USS Mitscher (DDG-57)");
    }

    #[tokio::test]
    async fn limit_and_offset_page_results() {
        let (_guard, repo) = repository();
        for n in 0..5 {
            repo.insert(&order(&format!("WO-{n}"), "USS Cole (DDG-67)", "Submitted", "Routine"))
                .await
                .unwrap();
        }

        let filter =
            WorkOrderFilter { limit: Some(2), offset: Some(2), ..Default::default() };
        let page = repo.list(&filter).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].wo, "WO-2");
    }

    #[tokio::test]
    async fn insert_is_an_upsert_on_the_work_order_number() {
        let (_guard, repo) = repository();
        repo.insert(&order("WO-1", "USS Cole (DDG-67)", "Submitted", "Routine")).await.unwrap();
        repo.insert(&order("WO-1", "USS Cole (DDG-67)", "Completed", "Routine")).await.unwrap();

        let all = repo.list(&WorkOrderFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, "Completed");
    }
}
