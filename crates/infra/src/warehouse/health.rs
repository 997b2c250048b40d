//! Health & diagnostics tracker
//!
//! Maintains the last-known warehouse status and the last remote error,
//! throttles repeated probes while the connection is healthy, and derives
//! operator-facing recommendations from error text and probe latency.
//! Also the `DiagnosticsSink` the fallback coordinator reports into.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use fleetpdm_core::{DiagnosticsSink, RemoteWarehouse};
use fleetpdm_domain::constants::{
    SLOW_PROBE_THRESHOLD_MS, TOKEN_EXPIRY_ADVISORY_MINUTES, VERY_SLOW_PROBE_THRESHOLD_MS,
};
use fleetpdm_domain::{
    ConnectionStatus, FallbackReason, HealthDiagnostics, QueryRequest, TokenStatus,
};
use tracing::{debug, warn};

use super::auth::TokenProvider;

const PROBE_STATEMENT: &str = "SELECT 1";

#[derive(Debug, Default)]
struct HealthState {
    status: Option<ConnectionStatus>,
    last_check: Option<DateTime<Utc>>,
    last_snapshot: Option<HealthDiagnostics>,
    last_error: Option<FallbackReason>,
    consecutive_failures: u64,
}

/// Tracks warehouse health and remote-failure bookkeeping.
pub struct HealthMonitor {
    remote: Arc<dyn RemoteWarehouse>,
    tokens: Arc<TokenProvider>,
    interval_secs: i64,
    state: RwLock<HealthState>,
}

impl HealthMonitor {
    pub fn new(
        remote: Arc<dyn RemoteWarehouse>,
        tokens: Arc<TokenProvider>,
        interval_secs: i64,
    ) -> Self {
        Self { remote, tokens, interval_secs, state: RwLock::new(HealthState::default()) }
    }

    /// Current health, probing the warehouse at most once per interval
    /// while the last probe was healthy and the token is still valid.
    pub async fn check_health(&self) -> HealthDiagnostics {
        let token_status = self.tokens.token_status().await;

        if let Some(snapshot) = self.cached_snapshot(&token_status) {
            debug!("serving cached health snapshot");
            return snapshot;
        }

        let started = Instant::now();
        let probe = self.remote.execute_query(&QueryRequest::bare(PROBE_STATEMENT)).await;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let mut recommendations = Vec::new();
        let (status, probe_error) = match probe {
            Ok(_) => {
                if response_time_ms > SLOW_PROBE_THRESHOLD_MS {
                    recommendations.push(
                        "Probe latency is high; check network connectivity and warehouse status"
                            .to_string(),
                    );
                }
                if response_time_ms > VERY_SLOW_PROBE_THRESHOLD_MS {
                    recommendations.push(
                        "Warehouse responded very slowly; it may be cold-starting or overloaded"
                            .to_string(),
                    );
                }
                (ConnectionStatus::Healthy, None)
            }
            Err(probe_failure) => {
                warn!(error = %probe_failure, "warehouse health probe failed");
                recommendations.extend(recommendations_for(&probe_failure.to_string()));
                (
                    ConnectionStatus::Unhealthy,
                    Some(FallbackReason::from_error(&probe_failure, PROBE_STATEMENT)),
                )
            }
        };

        // Token advisory is independent of the probe outcome.
        if let Some(minutes) = token_status.expires_in_minutes {
            if token_status.has_token && minutes < TOKEN_EXPIRY_ADVISORY_MINUTES {
                recommendations.push(format!(
                    "Access token expires in {minutes} minutes; a refresh will happen on the \
                     next remote call"
                ));
            }
        }

        let snapshot = HealthDiagnostics {
            status,
            timestamp: Utc::now(),
            response_time_ms: Some(response_time_ms),
            cached: false,
            last_error: probe_error.clone(),
            recommendations,
        };

        if let Ok(mut state) = self.state.write() {
            state.status = Some(status);
            state.last_check = Some(snapshot.timestamp);
            state.last_snapshot = Some(snapshot.clone());
            if let Some(reason) = probe_error {
                state.last_error = Some(reason);
                state.consecutive_failures += 1;
            } else {
                state.consecutive_failures = 0;
            }
        }

        snapshot
    }

    /// Credential-lifecycle view, probe-free.
    pub async fn token_status(&self) -> TokenStatus {
        self.tokens.token_status().await
    }

    /// The most recent remote error recorded by a probe or a fallback.
    pub fn last_error(&self) -> Option<FallbackReason> {
        self.state.read().ok().and_then(|state| state.last_error.clone())
    }

    /// Remote failures since the last success.
    pub fn consecutive_failures(&self) -> u64 {
        self.state.read().map(|state| state.consecutive_failures).unwrap_or(0)
    }

    fn cached_snapshot(&self, token_status: &TokenStatus) -> Option<HealthDiagnostics> {
        let state = self.state.read().ok()?;
        let last_check = state.last_check?;
        let snapshot = state.last_snapshot.as_ref()?;

        let fresh = Utc::now() - last_check
            < ChronoDuration::seconds(self.interval_secs);
        let healthy = state.status == Some(ConnectionStatus::Healthy);

        if fresh && healthy && token_status.is_valid {
            let mut cached = snapshot.clone();
            cached.cached = true;
            return Some(cached);
        }
        None
    }
}

impl DiagnosticsSink for HealthMonitor {
    fn record_remote_failure(&self, reason: &FallbackReason) {
        if let Ok(mut state) = self.state.write() {
            state.status = Some(ConnectionStatus::Unhealthy);
            state.last_error = Some(reason.clone());
            state.consecutive_failures += 1;
        }
    }

    fn record_remote_success(&self) {
        if let Ok(mut state) = self.state.write() {
            state.status = Some(ConnectionStatus::Healthy);
            state.consecutive_failures = 0;
        }
    }
}

/// Match known failure classes in the error text to operator guidance.
fn recommendations_for(error_text: &str) -> Vec<String> {
    let lowered = error_text.to_lowercase();
    let mut recommendations = Vec::new();

    if lowered.contains("timeout") {
        recommendations.push(
            "Request timed out; check network connectivity to the warehouse".to_string(),
        );
    }
    if lowered.contains("token") || lowered.contains("auth") {
        recommendations.push(
            "Credential problem; verify the configured client id and secret".to_string(),
        );
    }
    if lowered.contains("environment") || lowered.contains("configuration") {
        recommendations.push(
            "Configuration problem; verify the warehouse hostname and HTTP path settings"
                .to_string(),
        );
    }
    if recommendations.is_empty() {
        recommendations
            .push("Check warehouse service status; reads are served from the local store until \
                   it recovers"
                .to_string());
    }

    recommendations
}
