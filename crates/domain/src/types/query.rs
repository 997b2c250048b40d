//! Query-request value types
//!
//! A [`QueryRequest`] is an immutable statement plus bound parameters,
//! produced by the query builder in `fleetpdm-core` and executed verbatim
//! by the warehouse execution layer. Values are carried as
//! [`ScalarValue`]s so requests are comparable in tests and serialize
//! directly onto the warehouse statement API.

use serde::{Deserialize, Serialize};

/// Row shape shared by the remote and local paths: column name → scalar.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A scalar bound to a statement parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    Null,
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A named parameter bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementParameter {
    pub name: String,
    pub value: ScalarValue,
}

/// An immutable parameterized statement.
///
/// Never mutated after construction; filter values travel exclusively as
/// bound parameters, never interpolated into the statement text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub statement: String,
    pub parameters: Vec<StatementParameter>,
}

impl QueryRequest {
    /// A statement with no parameters, used for probes like `SELECT 1`.
    #[must_use]
    pub fn bare(statement: impl Into<String>) -> Self {
        Self { statement: statement.into(), parameters: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_values_serialize_untagged() {
        let json = serde_json::to_string(&ScalarValue::Text("Hot Section".into())).unwrap();
        assert_eq!(json, "\"Hot Section\"");
        let json = serde_json::to_string(&ScalarValue::Integer(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn requests_with_same_shape_are_equal() {
        let a = QueryRequest {
            statement: "SELECT * FROM parts WHERE category = :p0".into(),
            parameters: vec![StatementParameter {
                name: "p0".into(),
                value: "Hot Section".into(),
            }],
        };
        assert_eq!(a, a.clone());
        assert_ne!(a, QueryRequest::bare("SELECT 1"));
    }
}
