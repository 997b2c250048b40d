//! SQLite repository for spare parts

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use fleetpdm_core::PartRepository;
use fleetpdm_domain::{FleetPdmError, Part, PartFilter, Result};
use rusqlite::params;

use super::manager::{map_sql_error, DbManager};

const SELECT_COLUMNS: &str = "id, name, system, category, stock_level, min_stock, max_stock, \
                              location, condition, lead_time, supplier, cost, last_updated";

/// SQLite implementation of `PartRepository`
pub struct SqlitePartRepository {
    db: Arc<DbManager>,
}

impl SqlitePartRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn build_list_query(filter: &PartFilter) -> (String, Vec<String>) {
    let mut predicates = Vec::new();
    let mut values = Vec::new();

    for (column, value) in [
        ("category", &filter.category),
        ("condition", &filter.condition),
        ("system", &filter.system),
    ] {
        if let Some(value) = value {
            values.push(value.clone());
            predicates.push(format!("{column} = ?{}", values.len()));
        }
    }

    if let Some(needle) = &filter.search {
        values.push(format!("%{needle}%"));
        let n = values.len();
        predicates.push(format!(
            "(name LIKE ?{n} OR id LIKE ?{n} OR supplier LIKE ?{n} OR location LIKE ?{n})"
        ));
    }

    let mut sql = format!("SELECT {SELECT_COLUMNS} FROM parts");
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
impl PartRepository for SqlitePartRepository {
    async fn list(&self, filter: &PartFilter) -> Result<Vec<Part>> {
        let db = self.db.clone();
        let (sql, values) = build_list_query(filter);
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;

            let parts = stmt
                .query_map(rusqlite::params_from_iter(values.iter()), |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                        row.get::<_, String>(10)?,
                        row.get::<_, f64>(11)?,
                        row.get::<_, i64>(12)?,
                    ))
                })
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?
                .into_iter()
                .filter_map(
                    |(
                        id,
                        name,
                        system,
                        category,
                        stock_level,
                        min_stock,
                        max_stock,
                        location,
                        condition,
                        lead_time,
                        supplier,
                        cost,
                        last_updated,
                    )| {
                        Some(Part {
                            id,
                            name,
                            system,
                            category,
                            stock_level,
                            min_stock,
                            max_stock,
                            location,
                            condition,
                            lead_time,
                            supplier,
                            cost,
                            last_updated: DateTime::from_timestamp(last_updated, 0)?,
                        })
                    },
                )
                .collect();

            Ok(parts)
        })
        .await
        .map_err(|e| FleetPdmError::Database(e.to_string()))?
    }

    async fn insert(&self, record: &Part) -> Result<()> {
        let db = self.db.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR REPLACE INTO parts \
                 (id, name, system, category, stock_level, min_stock, max_stock, location, \
                  condition, lead_time, supplier, cost, last_updated) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    record.id,
                    record.name,
                    record.system,
                    record.category,
                    record.stock_level,
                    record.min_stock,
                    record.max_stock,
                    record.location,
                    record.condition,
                    record.lead_time,
                    record.supplier,
                    record.cost,
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
