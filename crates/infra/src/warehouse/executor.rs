//! Query execution layer
//!
//! Implements the `RemoteWarehouse` port. Each attempt runs the full
//! pipeline (live connection, fresh per-call session scope, statement
//! execution, fetch-all) and the session scope is closed on every exit
//! path. A close failure is logged as cleanup noise and never masks the
//! primary result. The whole pipeline is wrapped by the retry executor
//! under the operation name `execute_query`.

use std::sync::Arc;

use async_trait::async_trait;
use fleetpdm_core::RemoteWarehouse;
use fleetpdm_domain::{QueryRequest, Result, Row, WarehouseConfig};
use tracing::warn;

use super::connection::ConnectionManager;
use super::retry::RetryExecutor;
use super::transport::WarehouseHttpClient;

/// Remote query executor with guaranteed session cleanup.
pub struct WarehouseExecutor {
    transport: Arc<WarehouseHttpClient>,
    connections: Arc<ConnectionManager>,
    retry: RetryExecutor,
}

impl WarehouseExecutor {
    /// # Errors
    /// Returns `Config` when the retry settings are invalid.
    pub fn new(
        transport: Arc<WarehouseHttpClient>,
        connections: Arc<ConnectionManager>,
        config: &WarehouseConfig,
    ) -> Result<Self> {
        let retry = RetryExecutor::from_config(config)?;
        Ok(Self { transport, connections, retry })
    }

    async fn execute_once(&self, request: &QueryRequest) -> Result<Vec<Row>> {
        let connection = self.connections.get_connection().await?;
        let access_token = connection.credential.access_token;

        // Per-call session scope: opened fresh for this statement and
        // closed on every exit path below, including caller cancellation
        // (the guard closes from a detached task if this future is
        // dropped mid-query).
        let session_id = match self.transport.open_session(&access_token).await {
            Ok(session_id) => session_id,
            Err(open_error) => {
                // The cached connection is suspect; force a rebuild on the
                // next acquisition (which may be this call's retry).
                self.connections.mark_unhealthy().await;
                return Err(open_error);
            }
        };
        let mut scope = SessionScopeGuard {
            transport: self.transport.clone(),
            access_token: access_token.clone(),
            session_id: session_id.clone(),
            armed: true,
        };

        let outcome = match self
            .transport
            .execute_statement(&access_token, &session_id, request)
            .await
        {
            Ok(outcome) => self.transport.fetch_all(&access_token, outcome).await,
            Err(execute_error) => Err(execute_error),
        };

        scope.armed = false;
        if let Err(cleanup_error) =
            self.transport.close_session(&access_token, &session_id).await
        {
            // Secondary failure: the statement result, success or error,
            // is what callers see.
            warn!(
                session_id = %session_id,
                error = %cleanup_error,
                "session cleanup failed"
            );
        }

        outcome
    }
}

/// Closes an orphaned session scope when the owning future is cancelled.
struct SessionScopeGuard {
    transport: Arc<WarehouseHttpClient>,
    access_token: String,
    session_id: String,
    armed: bool,
}

impl Drop for SessionScopeGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let transport = self.transport.clone();
        let access_token = std::mem::take(&mut self.access_token);
        let session_id = std::mem::take(&mut self.session_id);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(cleanup_error) =
                    transport.close_session(&access_token, &session_id).await
                {
                    warn!(
                        session_id = %session_id,
                        error = %cleanup_error,
                        "session cleanup after cancellation failed"
                    );
                }
            });
        }
    }
}

#[async_trait]
impl RemoteWarehouse for WarehouseExecutor {
    async fn execute_query(&self, request: &QueryRequest) -> Result<Vec<Row>> {
        self.retry.execute("execute_query", || self.execute_once(request)).await
    }
}
