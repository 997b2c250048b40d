//! Parameterized SELECT builder
//!
//! Builds immutable [`QueryRequest`] values from filter parameters. Filter
//! values are always bound as named parameters (`:p0`, `:p1`, …); only
//! code-controlled identifiers (table references, column names) appear in
//! the statement text. Predicates are conjuncted with `AND`, `search`
//! expands to an OR group of `LIKE` matches, and every query carries an
//! explicit ordering column so repeated reads are deterministic.

use fleetpdm_domain::{QueryRequest, ScalarValue, StatementParameter};

/// Builder for a single-table SELECT.
#[derive(Debug, Clone)]
pub struct TableQuery {
    table: String,
    predicates: Vec<String>,
    parameters: Vec<StatementParameter>,
    order_by: Option<&'static str>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl TableQuery {
    /// Start a query against a fully-qualified table reference.
    #[must_use]
    pub fn new(table_reference: impl Into<String>) -> Self {
        Self {
            table: table_reference.into(),
            predicates: Vec::new(),
            parameters: Vec::new(),
            order_by: None,
            limit: None,
            offset: None,
        }
    }

    /// Add an equality predicate on `column`.
    #[must_use]
    pub fn filter_eq(mut self, column: &'static str, value: impl Into<ScalarValue>) -> Self {
        let name = self.bind(value.into());
        self.predicates.push(format!("{column} = :{name}"));
        self
    }

    /// Add an equality predicate only when a filter value is present.
    #[must_use]
    pub fn filter_eq_opt<V>(self, column: &'static str, value: Option<V>) -> Self
    where
        V: Into<ScalarValue>,
    {
        match value {
            Some(value) => self.filter_eq(column, value),
            None => self,
        }
    }

    /// Add an OR group of `LIKE` predicates over `columns`, all bound to
    /// the same `%needle%` parameter.
    #[must_use]
    pub fn search(mut self, columns: &[&'static str], needle: &str) -> Self {
        if columns.is_empty() {
            return self;
        }
        let name = self.bind(ScalarValue::Text(format!("%{needle}%")));
        let group = columns
            .iter()
            .map(|column| format!("{column} LIKE :{name}"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.predicates.push(format!("({group})"));
        self
    }

    /// Set the deterministic ordering column.
    #[must_use]
    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order_by = Some(column);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: Option<u32>) -> Self {
        self.offset = offset;
        self
    }

    /// Finish the builder into an immutable request.
    #[must_use]
    pub fn build(self) -> QueryRequest {
        let mut statement = format!("SELECT * FROM {}", self.table);
        if !self.predicates.is_empty() {
            statement.push_str(" WHERE ");
            statement.push_str(&self.predicates.join(" AND "));
        }
        if let Some(column) = self.order_by {
            statement.push_str(" ORDER BY ");
            statement.push_str(column);
        }
        if let Some(limit) = self.limit {
            statement.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            statement.push_str(&format!(" OFFSET {offset}"));
        }
        QueryRequest { statement, parameters: self.parameters }
    }

    fn bind(&mut self, value: ScalarValue) -> String {
        let name = format!("p{}", self.parameters.len());
        self.parameters.push(StatementParameter { name: name.clone(), value });
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_query_selects_everything() {
        let request = TableQuery::new("fleet.maintenance.parts").build();
        assert_eq!(request.statement, "SELECT * FROM fleet.maintenance.parts");
        assert!(request.parameters.is_empty());
    }

    #[test]
    fn predicates_conjunct_with_and() {
        let request = TableQuery::new("fleet.maintenance.work_orders")
            .filter_eq("status", "In Progress")
            .filter_eq("priority", "Urgent")
            .order_by("wo")
            .build();

        assert_eq!(
            request.statement,
            "SELECT * FROM fleet.maintenance.work_orders \
             WHERE status = :p0 AND priority = :p1 ORDER BY wo"
        );
        assert_eq!(request.parameters[0].value, ScalarValue::Text("In Progress".into()));
        assert_eq!(request.parameters[1].value, ScalarValue::Text("Urgent".into()));
    }

    #[test]
    fn optional_filters_are_skipped_when_absent() {
        let request = TableQuery::new("t")
            .filter_eq_opt("status", None::<String>)
            .filter_eq_opt("category", Some("Hot Section"))
            .build();

        assert_eq!(request.statement, "SELECT * FROM t WHERE category = :p0");
        assert_eq!(request.parameters.len(), 1);
    }

    #[test]
    fn search_expands_to_like_group_with_shared_parameter() {
        let request = TableQuery::new("t")
            .search(&["name", "id", "supplier"], "turbine")
            .build();

        assert_eq!(
            request.statement,
            "SELECT * FROM t WHERE (name LIKE :p0 OR id LIKE :p0 OR supplier LIKE :p0)"
        );
        assert_eq!(request.parameters[0].value, ScalarValue::Text("%turbine%".into()));
    }

    #[test]
    fn search_value_is_bound_not_interpolated() {
        // A hostile needle stays inside a parameter; the statement text
        // never contains it.
        let needle = "'; DROP TABLE parts; --";
        let request = TableQuery::new("t").search(&["name"], needle).build();

        assert!(!request.statement.contains("DROP TABLE"));
        assert_eq!(
            request.parameters[0].value,
            ScalarValue::Text(format!("%{needle}%"))
        );
    }

    #[test]
    fn limit_and_offset_render_after_ordering() {
        let request = TableQuery::new("t")
            .order_by("id")
            .limit(Some(50))
            .offset(Some(100))
            .build();

        assert_eq!(request.statement, "SELECT * FROM t ORDER BY id LIMIT 50 OFFSET 100");
    }

    #[test]
    fn identical_filters_build_identical_requests() {
        let build = || {
            TableQuery::new("t")
                .filter_eq("status", "Submitted")
                .search(&["ship", "wo"], "Bainbridge")
                .order_by("wo")
                .limit(Some(10))
                .build()
        };
        assert_eq!(build(), build());
    }
}
