//! Warehouse credential and health types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::envelope::FallbackReason;

/// A cached access token from the client-credentials exchange.
///
/// Lives only in process memory; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Create a credential expiring `expires_in_secs` from now.
    #[must_use]
    pub fn new(access_token: String, expires_in_secs: i64) -> Self {
        Self { access_token, expires_at: Utc::now() + Duration::seconds(expires_in_secs) }
    }

    /// Whether the token is still usable, treating anything within
    /// `buffer_secs` of expiry as already stale.
    #[must_use]
    pub fn is_valid(&self, buffer_secs: i64) -> bool {
        Utc::now() + Duration::seconds(buffer_secs) < self.expires_at
    }

    /// Whole minutes until expiry; negative once expired.
    #[must_use]
    pub fn expires_in_minutes(&self) -> i64 {
        (self.expires_at - Utc::now()).num_minutes()
    }
}

/// Last-known state of the warehouse connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No probe has completed yet
    Unknown,
    /// Last probe or query succeeded
    Healthy,
    /// Last probe or query failed
    Unhealthy,
}

/// Snapshot returned by the health tracker.
///
/// `recommendations` are advisory strings for operators; callers must not
/// parse them programmatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDiagnostics {
    pub status: ConnectionStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// True when this snapshot was served from the throttle cache without
    /// a remote probe
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<FallbackReason>,
    pub recommendations: Vec<String>,
}

/// Credential-lifecycle view exposed alongside health diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub has_token: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_minutes: Option<i64>,
}

impl TokenStatus {
    /// Status when no credential has been cached yet.
    #[must_use]
    pub fn absent() -> Self {
        Self { has_token: false, expires_at: None, is_valid: false, expires_in_minutes: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_credential_is_valid_within_buffer() {
        let credential = Credential::new("token".into(), 3600);
        assert!(credential.is_valid(300));
        assert!(credential.expires_in_minutes() >= 59);
    }

    #[test]
    fn credential_inside_buffer_counts_as_stale() {
        // Expires in 60s, buffer is 300s: already due for refresh
        let credential = Credential::new("token".into(), 60);
        assert!(!credential.is_valid(300));
        // But with no buffer it is still nominally live
        assert!(credential.is_valid(0));
    }

    #[test]
    fn expired_credential_reports_negative_minutes() {
        let credential = Credential::new("token".into(), -120);
        assert!(!credential.is_valid(0));
        assert!(credential.expires_in_minutes() < 0);
    }

    #[test]
    fn absent_token_status_is_invalid() {
        let status = TokenStatus::absent();
        assert!(!status.has_token);
        assert!(!status.is_valid);
    }
}
