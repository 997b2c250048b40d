//! Row-to-record mapping for the remote path
//!
//! The execution layer returns warehouse rows verbatim as column→value
//! maps; these helpers decode them into domain records. A decode failure
//! is reported as a statement-phase error so the coordinator treats it
//! like any other remote failure and falls back to the local store.

use chrono::{DateTime, Utc};
use fleetpdm_domain::{
    FleetPdmError, Part, PartsRequisition, Result, Row, ShipStatus, WorkOrder,
};

/// Decode one warehouse row into a domain record.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self>;
}

/// Decode a full result set, failing on the first bad row.
pub fn map_rows<T: FromRow>(rows: &[Row]) -> Result<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}

impl FromRow for WorkOrder {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            wo: text(row, "wo")?,
            ship: text(row, "ship")?,
            homeport: text(row, "homeport")?,
            failure_mode: text(row, "failure_mode")?,
            gte: text(row, "gte")?,
            priority: text(row, "priority")?,
            status: text(row, "status")?,
            eta_days: integer(row, "eta_days")?,
            symptoms: opt_text(row, "symptoms"),
            recommended_action: opt_text(row, "recommended_action"),
            parts_required: opt_text(row, "parts_required"),
            sla_category: opt_text(row, "sla_category"),
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}

impl FromRow for Part {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: text(row, "id")?,
            name: text(row, "name")?,
            system: text(row, "system")?,
            category: text(row, "category")?,
            stock_level: integer(row, "stock_level")?,
            min_stock: integer(row, "min_stock")?,
            max_stock: integer(row, "max_stock")?,
            location: text(row, "location")?,
            condition: text(row, "condition")?,
            lead_time: text(row, "lead_time")?,
            supplier: text(row, "supplier")?,
            cost: real(row, "cost")?,
            last_updated: timestamp(row, "last_updated")?,
        })
    }
}

impl FromRow for ShipStatus {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            ship: text(row, "ship")?,
            designation: text(row, "designation")?,
            homeport: text(row, "homeport")?,
            ship_class: text(row, "ship_class")?,
            status: text(row, "status")?,
            gte_count: integer(row, "gte_count")?,
            operational_gte: integer(row, "operational_gte")?,
            casrep_gte: integer(row, "casrep_gte")?,
            last_updated: timestamp(row, "last_updated")?,
        })
    }
}

impl FromRow for PartsRequisition {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: text(row, "id")?,
            part_id: text(row, "part_id")?,
            part_name: text(row, "part_name")?,
            work_order_id: opt_text(row, "work_order_id"),
            ship: text(row, "ship")?,
            quantity: integer(row, "quantity")?,
            priority: text(row, "priority")?,
            status: text(row, "status")?,
            requested_by: text(row, "requested_by")?,
            requested_at: timestamp(row, "requested_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}

fn decode_error(column: &str, detail: impl std::fmt::Display) -> FleetPdmError {
    FleetPdmError::QueryExecutionFailed {
        code: "ROW_DECODE_FAILED".into(),
        message: format!("column '{column}': {detail}"),
    }
}

fn text(row: &Row, column: &str) -> Result<String> {
    match row.get(column) {
        Some(serde_json::Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(decode_error(column, format!("expected text, got {other}"))),
        None => Err(decode_error(column, "missing")),
    }
}

fn opt_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column) {
        Some(serde_json::Value::String(value)) => Some(value.clone()),
        _ => None,
    }
}

fn integer(row: &Row, column: &str) -> Result<i64> {
    match row.get(column) {
        Some(serde_json::Value::Number(value)) => value
            .as_i64()
            .ok_or_else(|| decode_error(column, format!("expected integer, got {value}"))),
        // Warehouses frequently type numeric columns as strings on the wire
        Some(serde_json::Value::String(value)) => value
            .parse::<i64>()
            .map_err(|e| decode_error(column, e)),
        Some(other) => Err(decode_error(column, format!("expected integer, got {other}"))),
        None => Err(decode_error(column, "missing")),
    }
}

fn real(row: &Row, column: &str) -> Result<f64> {
    match row.get(column) {
        Some(serde_json::Value::Number(value)) => value
            .as_f64()
            .ok_or_else(|| decode_error(column, format!("expected real, got {value}"))),
        Some(serde_json::Value::String(value)) => value
            .parse::<f64>()
            .map_err(|e| decode_error(column, e)),
        Some(other) => Err(decode_error(column, format!("expected real, got {other}"))),
        None => Err(decode_error(column, "missing")),
    }
}

fn timestamp(row: &Row, column: &str) -> Result<DateTime<Utc>> {
    match row.get(column) {
        Some(serde_json::Value::String(value)) => DateTime::parse_from_rfc3339(value)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|e| decode_error(column, e)),
        Some(serde_json::Value::Number(value)) => value
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| decode_error(column, format!("invalid epoch timestamp {value}"))),
        Some(other) => Err(decode_error(column, format!("expected timestamp, got {other}"))),
        None => Err(decode_error(column, "missing")),
    }
}
