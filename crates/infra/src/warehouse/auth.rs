//! Warehouse credential provider
//!
//! Obtains access tokens via a machine-to-machine client-credentials
//! exchange and caches the result in process memory. A cached token is
//! reused until it comes within the refresh buffer of its expiry; any
//! exchange failure clears the cache so a partially-valid credential is
//! never retained. Tokens are never persisted.

use std::time::Duration;

use fleetpdm_domain::constants::{DEFAULT_TOKEN_EXPIRES_IN_SECS, TOKEN_REFRESH_BUFFER_SECS};
use fleetpdm_domain::{Credential, FleetPdmError, Result, TokenStatus, WarehouseConfig};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Token response from the identity endpoint (RFC 6749 §4.4).
#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Caching credential provider for the warehouse identity endpoint.
pub struct TokenProvider {
    http: Client,
    config: WarehouseConfig,
    cached: RwLock<Option<Credential>>,
}

impl TokenProvider {
    /// # Errors
    /// Returns `Config` if the HTTP client cannot be constructed.
    pub fn new(config: WarehouseConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.token_timeout_secs))
            .build()
            .map_err(|e| FleetPdmError::Config(format!("failed to build token client: {e}")))?;
        Ok(Self { http, config, cached: RwLock::new(None) })
    }

    /// Return a valid access token, refreshing if needed.
    ///
    /// With `force_refresh = false` a cached credential still outside the
    /// refresh buffer is returned without I/O. With `force_refresh = true`
    /// a new exchange always happens, even when the cache is valid.
    ///
    /// # Errors
    /// `TokenTimeout`, `TokenRequestFailed`, or `TokenMalformedResponse`
    /// depending on how the exchange failed.
    pub async fn get_access_token(&self, force_refresh: bool) -> Result<Credential> {
        if !force_refresh {
            let cached = self.cached.read().await;
            if let Some(credential) = cached.as_ref() {
                if credential.is_valid(TOKEN_REFRESH_BUFFER_SECS) {
                    debug!("serving cached warehouse access token");
                    return Ok(credential.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;

        // Another task may have refreshed while this one waited for the
        // write lock.
        if !force_refresh {
            if let Some(credential) = cached.as_ref() {
                if credential.is_valid(TOKEN_REFRESH_BUFFER_SECS) {
                    return Ok(credential.clone());
                }
            }
        }

        match self.exchange().await {
            Ok(credential) => {
                info!(
                    expires_in_minutes = credential.expires_in_minutes(),
                    "warehouse access token refreshed"
                );
                *cached = Some(credential.clone());
                Ok(credential)
            }
            Err(exchange_error) => {
                *cached = None;
                error!(
                    operation = "token_exchange",
                    error = %exchange_error,
                    client_id = %self.config.client_id,
                    server_hostname = %self.config.server_hostname,
                    client_secret_set = self.config.client_secret_set(),
                    "token exchange failed"
                );
                Err(exchange_error)
            }
        }
    }

    /// Drop the cached credential so the next call performs an exchange.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    /// Credential-lifecycle snapshot for diagnostics. Never triggers I/O.
    pub async fn token_status(&self) -> TokenStatus {
        let cached = self.cached.read().await;
        match cached.as_ref() {
            Some(credential) => TokenStatus {
                has_token: true,
                expires_at: Some(credential.expires_at),
                is_valid: credential.is_valid(0),
                expires_in_minutes: Some(credential.expires_in_minutes()),
            },
            None => TokenStatus::absent(),
        }
    }

    async fn exchange(&self) -> Result<Credential> {
        let timeout_secs = self.config.token_timeout_secs;
        let request = self
            .http
            .post(self.config.token_url())
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", "all-apis")]);

        let response = match tokio::time::timeout(Duration::from_secs(timeout_secs), request.send())
            .await
        {
            Err(_) => return Err(FleetPdmError::TokenTimeout { timeout_secs }),
            Ok(Err(send_error)) if send_error.is_timeout() => {
                return Err(FleetPdmError::TokenTimeout { timeout_secs });
            }
            Ok(Err(send_error)) => {
                return Err(FleetPdmError::TokenRequestFailed(send_error.to_string()));
            }
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FleetPdmError::TokenRequestFailed(format!("HTTP {status}: {body}")));
        }

        let payload: TokenExchangeResponse = response
            .json()
            .await
            .map_err(|e| FleetPdmError::TokenMalformedResponse(e.to_string()))?;

        let access_token = payload.access_token.filter(|token| !token.is_empty()).ok_or_else(
            || FleetPdmError::TokenMalformedResponse("response missing access_token field".into()),
        )?;

        Ok(Credential::new(
            access_token,
            payload.expires_in.unwrap_or(DEFAULT_TOKEN_EXPIRES_IN_SECS),
        ))
    }
}
