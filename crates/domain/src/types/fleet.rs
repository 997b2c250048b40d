//! Fleet maintenance record types and read filters
//!
//! Field shapes follow the maintenance backend's models: work orders
//! against gas-turbine engines, spare-parts inventory, per-ship readiness,
//! and parts requisitions. The same shapes are produced by the remote
//! warehouse path and the local store so fallback envelopes are
//! source-agnostic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A maintenance work order against a ship's gas-turbine engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    /// Work-order number (primary key)
    pub wo: String,
    pub ship: String,
    pub homeport: String,
    /// Failure mode, e.g. "Vibration – Hot Section"
    pub failure_mode: String,
    /// Engine model, e.g. "LM2500"
    pub gte: String,
    pub priority: String,
    pub status: String,
    /// Estimated days to completion
    pub eta_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sla_category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A spare part in inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: String,
    pub name: String,
    /// Engine system the part belongs to
    pub system: String,
    pub category: String,
    pub stock_level: i64,
    pub min_stock: i64,
    pub max_stock: i64,
    pub location: String,
    pub condition: String,
    pub lead_time: String,
    pub supplier: String,
    pub cost: f64,
    pub last_updated: DateTime<Utc>,
}

/// Readiness summary for one ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipStatus {
    pub ship: String,
    /// Hull designation, e.g. "DDG-51"
    pub designation: String,
    pub homeport: String,
    pub ship_class: String,
    pub status: String,
    /// Installed gas-turbine engines
    pub gte_count: i64,
    pub operational_gte: i64,
    /// Engines under casualty report
    pub casrep_gte: i64,
    pub last_updated: DateTime<Utc>,
}

/// A requisition for spare parts, optionally tied to a work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartsRequisition {
    pub id: String,
    pub part_id: String,
    pub part_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_order_id: Option<String>,
    pub ship: String,
    pub quantity: i64,
    pub priority: String,
    pub status: String,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for work-order reads. `search` matches ship, failure mode, and
/// work-order number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub ship: Option<String>,
    pub homeport: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Filter for parts reads. `search` matches name, id, supplier, and
/// location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartFilter {
    pub category: Option<String>,
    pub condition: Option<String>,
    pub system: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Filter for ship-status reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipStatusFilter {
    pub homeport: Option<String>,
    pub ship_class: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Filter for parts-requisition reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub ship: Option<String>,
    pub work_order_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_order_serializes_camel_case() {
        let order = WorkOrder {
            wo: "ED569313".into(),
            ship: "USS Bainbridge (DDG-96)".into(),
            homeport: "NB Norfolk".into(),
            failure_mode: "Vibration – Hot Section".into(),
            gte: "LM2500".into(),
            priority: "Routine".into(),
            status: "Submitted".into(),
            eta_days: 8,
            symptoms: None,
            recommended_action: None,
            parts_required: Some("Turbine Blade Set".into()),
            sla_category: Some("Priority".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["failureMode"], "Vibration – Hot Section");
        assert_eq!(json["etaDays"], 8);
        assert!(json.get("symptoms").is_none());
    }

    #[test]
    fn default_filters_are_empty() {
        let filter = PartFilter::default();
        assert!(filter.category.is_none());
        assert!(filter.limit.is_none());
    }
}
