//! Warehouse connection manager
//!
//! Owns the single cached warehouse session. A cached connection is reused
//! only while its status is healthy and its credential is still outside
//! the refresh buffer; otherwise the stale session is closed (close
//! failures are logged, never propagated) and a new one is built under the
//! retry executor. The whole rebuild happens while holding the state lock,
//! so concurrent callers observing staleness trigger exactly one token
//! exchange and one session open.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fleetpdm_domain::constants::TOKEN_REFRESH_BUFFER_SECS;
use fleetpdm_domain::{
    ConnectionStatus, Credential, FleetPdmError, Result, WarehouseConfig,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::auth::TokenProvider;
use super::retry::RetryExecutor;
use super::transport::WarehouseHttpClient;

/// A live warehouse session paired with the credential that opened it.
#[derive(Debug, Clone)]
pub struct WarehouseConnection {
    pub session_id: String,
    pub credential: Credential,
    pub status: ConnectionStatus,
    pub last_health_check: chrono::DateTime<chrono::Utc>,
}

impl WarehouseConnection {
    /// A connection is reusable while healthy and while its credential is
    /// outside the refresh buffer.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.status == ConnectionStatus::Healthy
            && self.credential.is_valid(TOKEN_REFRESH_BUFFER_SECS)
    }
}

/// Lazily builds and caches the warehouse connection.
pub struct ConnectionManager {
    transport: Arc<WarehouseHttpClient>,
    tokens: Arc<TokenProvider>,
    retry: RetryExecutor,
    config: WarehouseConfig,
    state: Mutex<Option<WarehouseConnection>>,
}

impl ConnectionManager {
    /// # Errors
    /// Returns `Config` when the retry settings are invalid.
    pub fn new(
        transport: Arc<WarehouseHttpClient>,
        tokens: Arc<TokenProvider>,
        config: WarehouseConfig,
    ) -> Result<Self> {
        let retry = RetryExecutor::from_config(&config)?;
        Ok(Self { transport, tokens, retry, config, state: Mutex::new(None) })
    }

    /// Return a live connection, rebuilding if the cached one is stale.
    ///
    /// # Errors
    /// `ConfigurationIncomplete` without any network activity when
    /// required settings are missing; otherwise whatever the credential or
    /// connect phase raised after the retry budget.
    pub async fn get_connection(&self) -> Result<WarehouseConnection> {
        // Fail fast before any I/O; this check is never retried.
        self.config.validate()?;

        let mut state = self.state.lock().await;

        if let Some(connection) = state.as_ref() {
            if connection.is_usable() {
                return Ok(connection.clone());
            }
        }

        if let Some(stale) = state.take() {
            info!(session_id = %stale.session_id, "closing stale warehouse session");
            if let Err(close_error) = self
                .transport
                .close_session(&stale.credential.access_token, &stale.session_id)
                .await
            {
                warn!(error = %close_error, "failed to close stale warehouse session");
            }
        }

        let connection =
            self.retry.execute("open_connection", || self.build_connection()).await?;
        *state = Some(connection.clone());
        Ok(connection)
    }

    /// Flag the cached connection so the next acquisition closes and
    /// rebuilds it. Called by the execution layer when a per-call session
    /// open fails against a supposedly healthy connection.
    pub async fn mark_unhealthy(&self) {
        let mut state = self.state.lock().await;
        if let Some(connection) = state.as_mut() {
            warn!(session_id = %connection.session_id, "marking warehouse connection unhealthy");
            connection.status = ConnectionStatus::Unhealthy;
        }
    }

    /// Close the cached session, if any. Close failures are logged.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if let Some(connection) = state.take() {
            if let Err(close_error) = self
                .transport
                .close_session(&connection.credential.access_token, &connection.session_id)
                .await
            {
                warn!(error = %close_error, "failed to close warehouse session");
            }
        }
    }

    async fn build_connection(&self) -> Result<WarehouseConnection> {
        let credential = self.tokens.get_access_token(false).await?;

        let connect_timeout = Duration::from_secs(self.config.connect_timeout_secs);
        let session_id = match tokio::time::timeout(
            connect_timeout,
            self.transport.open_session(&credential.access_token),
        )
        .await
        {
            Err(_) => {
                return Err(FleetPdmError::ConnectionTimeout {
                    timeout_secs: self.config.connect_timeout_secs,
                });
            }
            Ok(result) => result?,
        };

        info!(session_id = %session_id, "warehouse connection established");
        Ok(WarehouseConnection {
            session_id,
            credential,
            status: ConnectionStatus::Healthy,
            last_health_check: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use fleetpdm_domain::TableMap;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_config(base_url: &str) -> WarehouseConfig {
        WarehouseConfig {
            client_id: "svc-fleetpdm".into(),
            client_secret: "s3cret".into(),
            server_hostname: base_url.into(),
            http_path: "/sql/1.0/warehouses/abc".into(),
            catalog: "fleet".into(),
            schema: "maintenance".into(),
            tables: TableMap::default(),
            token_timeout_secs: 5,
            connect_timeout_secs: 5,
            statement_timeout_secs: 5,
            max_attempts: 2,
            retry_base_delay_ms: 10,
            health_check_interval_secs: 60,
        }
    }

    fn manager_for(config: WarehouseConfig) -> ConnectionManager {
        let transport = Arc::new(WarehouseHttpClient::new(&config).unwrap());
        let tokens = Arc::new(TokenProvider::new(config.clone()).unwrap());
        ConnectionManager::new(transport, tokens, config).unwrap()
    }

    async fn mount_token_endpoint(server: &MockServer, expires_in: i64, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/oidc/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-1",
                "token_type": "Bearer",
                "expires_in": expires_in,
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn missing_config_fails_fast_with_zero_network_calls() {
        let server = MockServer::start().await;
        let mut config = test_config(&server.uri());
        config.client_secret = String::new();
        let manager = manager_for(config);

        let err = manager.get_connection().await.unwrap_err();

        match err {
            FleetPdmError::ConfigurationIncomplete { missing } => {
                assert_eq!(missing, vec!["client_secret"]);
            }
            other => panic!("expected ConfigurationIncomplete, got {other:?}"),
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn caches_the_connection_while_credential_is_fresh() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 3600, 1).await;
        Mock::given(method("POST"))
            .and(path("/api/2.0/sql/sessions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "session_id": "s-1" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(test_config(&server.uri()));

        let first = manager.get_connection().await.unwrap();
        let second = manager.get_connection().await.unwrap();

        assert_eq!(first.session_id, "s-1");
        assert_eq!(second.session_id, "s-1");
        assert_eq!(first.status, ConnectionStatus::Healthy);
    }

    #[tokio::test]
    async fn stale_credential_closes_session_and_refreshes_once() {
        let server = MockServer::start().await;
        // Valid now, stale (inside the 300s refresh buffer) one second
        // from now.
        mount_token_endpoint(&server, TOKEN_REFRESH_BUFFER_SECS + 1, 2).await;
        Mock::given(method("POST"))
            .and(path("/api/2.0/sql/sessions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "session_id": "s-1" })),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/api/2\.0/sql/sessions/.+$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(test_config(&server.uri()));

        manager.get_connection().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;
        manager.get_connection().await.unwrap();
    }

    #[tokio::test]
    async fn connect_failure_exhausts_retries_then_propagates() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 3600, 1).await;
        Mock::given(method("POST"))
            .and(path("/api/2.0/sql/sessions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("warehouse starting"))
            .expect(2)
            .mount(&server)
            .await;

        let manager = manager_for(test_config(&server.uri()));
        let err = manager.get_connection().await.unwrap_err();

        assert!(matches!(err, FleetPdmError::ConnectionFailed(_)));
    }

    #[tokio::test]
    async fn unhealthy_connection_is_rebuilt_on_next_acquisition() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 3600, 1).await;
        Mock::given(method("POST"))
            .and(path("/api/2.0/sql/sessions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "session_id": "s-1" })),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/api/2\.0/sql/sessions/.+$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(test_config(&server.uri()));
        manager.get_connection().await.unwrap();

        manager.mark_unhealthy().await;
        manager.get_connection().await.unwrap();
    }

    #[tokio::test]
    async fn explicit_close_tears_down_the_cached_session() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 3600, 1).await;
        Mock::given(method("POST"))
            .and(path("/api/2.0/sql/sessions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "session_id": "s-1" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/2.0/sql/sessions/s-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(test_config(&server.uri()));
        manager.get_connection().await.unwrap();
        manager.close().await;
    }
}
