//! SQLite repository for ship readiness records

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use fleetpdm_core::ShipStatusRepository;
use fleetpdm_domain::{FleetPdmError, Result, ShipStatus, ShipStatusFilter};
use rusqlite::params;

use super::manager::{map_sql_error, DbManager};

const SELECT_COLUMNS: &str = "ship, designation, homeport, ship_class, status, gte_count, \
                              operational_gte, casrep_gte, last_updated";

/// SQLite implementation of `ShipStatusRepository`
pub struct SqliteShipStatusRepository {
    db: Arc<DbManager>,
}

impl SqliteShipStatusRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn build_list_query(filter: &ShipStatusFilter) -> (String, Vec<String>) {
    let mut predicates = Vec::new();
    let mut values = Vec::new();

    for (column, value) in [
        ("homeport", &filter.homeport),
        ("ship_class", &filter.ship_class),
        ("status", &filter.status),
    ] {
        if let Some(value) = value {
            values.push(value.clone());
            predicates.push(format!("{column} = ?{}", values.len()));
        }
    }

    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM ship_status");
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    sql.push_str(" ORDER BY ship");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = filter.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    (sql, values)
}

#[async_trait]
impl ShipStatusRepository for SqliteShipStatusRepository {
    async fn list(&self, filter: &ShipStatusFilter) -> Result<Vec<ShipStatus>> {
        let db = self.db.clone();
        let (sql, values) = build_list_query(filter);
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;

            let ships = stmt
                .query_map(rusqlite::params_from_iter(values.iter()), |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                        row.get::<_, i64>(8)?,
                    ))
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?
                .into_iter()
                .filter_map(
                    |(
                        ship,
                        designation,
                        homeport,
                        ship_class,
                        status,
                        gte_count,
                        operational_gte,
                        casrep_gte,
                        last_updated,
                    )| {
                        Some(ShipStatus {
                            ship,
                            designation,
                            homeport,
                            ship_class,
                            status,
                            gte_count,
                            operational_gte,
                            casrep_gte,
                            last_updated: DateTime::from_timestamp(last_updated, 0)?,
                        })
                    },
                )
                .collect();

            Ok(ships)
        })
        .await
        .map_err(|e| FleetPdmError::Database(e.to_string()))?
    }

    async fn insert(&self, record: &ShipStatus) -> Result<()> {
        let db = self.db.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR REPLACE INTO ship_status \
                 (ship, designation, homeport, ship_class, status, gte_count, \
                  operational_gte, casrep_gte, last_updated) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.ship,
                    record.designation,
                    record.homeport,
                    record.ship_class,
                    record.status,
                    record.gte_count,
                    record.operational_gte,
                    record.casrep_gte,
                    record.last_updated.timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(|e| FleetPdmError::Database(e.to_string()))?
    }
}
