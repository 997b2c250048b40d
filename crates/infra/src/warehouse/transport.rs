//! Warehouse HTTP wire client
//!
//! JSON-over-HTTP client for the warehouse's token-authenticated
//! session/statement API. The reconciliation layer only consumes four
//! primitives: open a session, execute a statement with bound parameters,
//! fetch all result chunks, and close the session. Error classification
//! follows the phase: session open/close failures are connection-phase,
//! statement and fetch failures are statement-phase and preserve the
//! warehouse-native error code when one is returned.

use std::time::Duration;

use fleetpdm_domain::{
    FleetPdmError, QueryRequest, Result, Row, StatementParameter, WarehouseConfig,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Statement wait budget passed to the warehouse; results come back inline
/// when the statement finishes inside it.
const STATEMENT_WAIT_TIMEOUT: &str = "30s";

/// A completed statement with its result coordinates.
#[derive(Debug)]
pub struct StatementOutcome {
    pub statement_id: String,
    columns: Vec<String>,
    first_chunk: Option<ResultChunk>,
}

#[derive(Debug, Serialize)]
struct OpenSessionRequest<'a> {
    http_path: &'a str,
    catalog: &'a str,
    schema: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenSessionResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct ExecuteStatementRequest<'a> {
    session_id: &'a str,
    statement: &'a str,
    parameters: &'a [StatementParameter],
    wait_timeout: &'a str,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    statement_id: String,
    status: StatementStatus,
    manifest: Option<ResultManifest>,
    result: Option<ResultChunk>,
}

#[derive(Debug, Deserialize)]
struct StatementStatus {
    state: String,
    error: Option<StatementErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StatementErrorDetail {
    error_code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultManifest {
    schema: ResultSchema,
}

#[derive(Debug, Deserialize)]
struct ResultSchema {
    columns: Vec<ColumnInfo>,
}

#[derive(Debug, Deserialize)]
struct ColumnInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ResultChunk {
    data_array: Option<Vec<Vec<serde_json::Value>>>,
    next_chunk_index: Option<u64>,
}

/// Thin HTTP client over the warehouse API.
pub struct WarehouseHttpClient {
    http: Client,
    base_url: String,
    http_path: String,
    catalog: String,
    schema: String,
}

impl WarehouseHttpClient {
    /// # Errors
    /// Returns `Config` if the HTTP client cannot be constructed.
    pub fn new(config: &WarehouseConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.statement_timeout_secs))
            .build()
            .map_err(|e| FleetPdmError::Config(format!("failed to build warehouse client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url(),
            http_path: config.http_path.clone(),
            catalog: config.catalog.clone(),
            schema: config.schema.clone(),
        })
    }

    /// Open a session bound to the configured endpoint, catalog, and
    /// schema.
    ///
    /// # Errors
    /// `ConnectionFailed` when the warehouse refuses or the transport
    /// fails.
    pub async fn open_session(&self, access_token: &str) -> Result<String> {
        let body = OpenSessionRequest {
            http_path: &self.http_path,
            catalog: &self.catalog,
            schema: &self.schema,
        };
        let response = self
            .http
            .post(format!("{}/api/2.0/sql/sessions", self.base_url))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| FleetPdmError::ConnectionFailed(format!("open session: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FleetPdmError::ConnectionFailed(format!(
                "open session: HTTP {status}: {body}"
            )));
        }

        let payload: OpenSessionResponse = response
            .json()
            .await
            .map_err(|e| FleetPdmError::ConnectionFailed(format!("open session: {e}")))?;

        debug!(session_id = %payload.session_id, "warehouse session opened");
        Ok(payload.session_id)
    }

    /// Close a session.
    ///
    /// # Errors
    /// `SessionCleanupFailed`; callers log this rather than propagate it
    /// in place of a primary error.
    pub async fn close_session(&self, access_token: &str, session_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/api/2.0/sql/sessions/{session_id}", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| FleetPdmError::SessionCleanupFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FleetPdmError::SessionCleanupFailed(format!(
                "close session {session_id}: HTTP {status}"
            )));
        }
        debug!(session_id, "warehouse session closed");
        Ok(())
    }

    /// Execute a parameterized statement inside a session.
    ///
    /// # Errors
    /// `QueryExecutionFailed` carrying the warehouse error code when the
    /// statement reached the warehouse, or a transport description when it
    /// did not.
    pub async fn execute_statement(
        &self,
        access_token: &str,
        session_id: &str,
        request: &QueryRequest,
    ) -> Result<StatementOutcome> {
        let body = ExecuteStatementRequest {
            session_id,
            statement: &request.statement,
            parameters: &request.parameters,
            wait_timeout: STATEMENT_WAIT_TIMEOUT,
        };
        let response = self
            .http
            .post(format!("{}/api/2.0/sql/statements", self.base_url))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_statement_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FleetPdmError::QueryExecutionFailed {
                code: format!("HTTP_{}", status.as_u16()),
                message: body,
            });
        }

        let payload: StatementResponse =
            response.json().await.map_err(|e| FleetPdmError::QueryExecutionFailed {
                code: "MALFORMED_RESPONSE".into(),
                message: e.to_string(),
            })?;

        if payload.status.state != "SUCCEEDED" {
            let detail = payload.status.error;
            let code = detail
                .as_ref()
                .and_then(|error| error.error_code.clone())
                .unwrap_or_else(|| format!("STATEMENT_{}", payload.status.state));
            let message = detail
                .and_then(|error| error.message)
                .unwrap_or_else(|| "statement did not succeed".to_string());
            return Err(FleetPdmError::QueryExecutionFailed { code, message });
        }

        let columns = payload
            .manifest
            .map(|manifest| {
                manifest.schema.columns.into_iter().map(|column| column.name).collect()
            })
            .unwrap_or_default();

        debug!(statement_id = %payload.statement_id, "statement succeeded");
        Ok(StatementOutcome {
            statement_id: payload.statement_id,
            columns,
            first_chunk: payload.result,
        })
    }

    /// Collect every row of a completed statement, following result chunks
    /// until the warehouse reports no more.
    ///
    /// # Errors
    /// `QueryExecutionFailed` when a chunk fetch fails or the result shape
    /// does not match the manifest.
    pub async fn fetch_all(
        &self,
        access_token: &str,
        outcome: StatementOutcome,
    ) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        let mut chunk = outcome.first_chunk;

        while let Some(current) = chunk.take() {
            append_rows(&mut rows, &outcome.columns, current.data_array)?;
            if let Some(index) = current.next_chunk_index {
                chunk = Some(
                    self.fetch_chunk(access_token, &outcome.statement_id, index).await?,
                );
            }
        }

        Ok(rows)
    }

    async fn fetch_chunk(
        &self,
        access_token: &str,
        statement_id: &str,
        index: u64,
    ) -> Result<ResultChunk> {
        let response = self
            .http
            .get(format!(
                "{}/api/2.0/sql/statements/{statement_id}/result/chunks/{index}",
                self.base_url
            ))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| FleetPdmError::QueryExecutionFailed {
                code: "FETCH_FAILED".into(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FleetPdmError::QueryExecutionFailed {
                code: "FETCH_FAILED".into(),
                message: format!("chunk {index}: HTTP {status}: {body}"),
            });
        }

        response.json().await.map_err(|e| FleetPdmError::QueryExecutionFailed {
            code: "MALFORMED_RESPONSE".into(),
            message: format!("chunk {index}: {e}"),
        })
    }
}

fn transport_statement_error(error: reqwest::Error) -> FleetPdmError {
    let code = if error.is_timeout() { "STATEMENT_TIMEOUT" } else { "TRANSPORT_ERROR" };
    FleetPdmError::QueryExecutionFailed { code: code.into(), message: error.to_string() }
}

fn append_rows(
    rows: &mut Vec<Row>,
    columns: &[String],
    data_array: Option<Vec<Vec<serde_json::Value>>>,
) -> Result<()> {
    for values in data_array.unwrap_or_default() {
        if values.len() != columns.len() {
            return Err(FleetPdmError::QueryExecutionFailed {
                code: "MALFORMED_RESPONSE".into(),
                message: format!(
                    "row has {} values but manifest declares {} columns",
                    values.len(),
                    columns.len()
                ),
            });
        }
        let mut row = Row::new();
        for (column, value) in columns.iter().zip(values) {
            row.insert(column.clone(), value);
        }
        rows.push(row);
    }
    Ok(())
}
