//! Fallback envelope types
//!
//! Every domain read returns a [`FallbackEnvelope`] so downstream callers
//! never special-case on which source answered. The invariant (a local
//! response always carries a reason, a remote response never does) is
//! enforced by construction: the only public constructors are
//! [`FallbackEnvelope::remote`] and [`FallbackEnvelope::local`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::FleetPdmError;

/// Which data source served a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Remote,
    Local,
}

/// Why a read was served from the local store.
///
/// Also reused as the `last_error` detail in health diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackReason {
    /// Stable error code (see [`FleetPdmError::error_code`])
    pub code: String,
    /// Human-readable failure description
    pub message: String,
    /// The statement that failed, for diagnostics
    pub query: String,
    pub timestamp: DateTime<Utc>,
}

impl FallbackReason {
    /// Capture a remote failure against the statement that triggered it.
    #[must_use]
    pub fn from_error(error: &FleetPdmError, query: impl Into<String>) -> Self {
        Self {
            code: error.error_code(),
            message: error.to_string(),
            query: query.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The wrapper returned to every domain caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackEnvelope<T> {
    pub data: T,
    pub source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
}

impl<T> FallbackEnvelope<T> {
    /// Wrap data served by the remote warehouse.
    #[must_use]
    pub fn remote(data: T) -> Self {
        Self { data, source: DataSource::Remote, fallback_reason: None }
    }

    /// Wrap data served by the local store after a remote failure.
    #[must_use]
    pub fn local(data: T, reason: FallbackReason) -> Self {
        Self { data, source: DataSource::Local, fallback_reason: Some(reason) }
    }

    /// Whether this response came from the fallback tier.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_envelope_carries_no_reason() {
        let envelope = FallbackEnvelope::remote(vec![1, 2, 3]);
        assert_eq!(envelope.source, DataSource::Remote);
        assert!(envelope.fallback_reason.is_none());
        assert!(!envelope.is_fallback());
    }

    #[test]
    fn local_envelope_always_carries_a_reason() {
        let error = FleetPdmError::ConnectionFailed("connection refused".into());
        let reason = FallbackReason::from_error(&error, "SELECT * FROM parts");
        let envelope = FallbackEnvelope::local(Vec::<i32>::new(), reason.clone());

        assert_eq!(envelope.source, DataSource::Local);
        assert_eq!(envelope.fallback_reason, Some(reason));
        assert!(envelope.is_fallback());
    }

    #[test]
    fn reason_captures_code_and_query() {
        let error = FleetPdmError::QueryExecutionFailed {
            code: "TABLE_OR_VIEW_NOT_FOUND".into(),
            message: "no such table".into(),
        };
        let reason = FallbackReason::from_error(&error, "SELECT * FROM fleet.maintenance.parts");
        assert_eq!(reason.code, "TABLE_OR_VIEW_NOT_FOUND");
        assert!(reason.query.contains("fleet.maintenance.parts"));
    }

    #[test]
    fn envelope_serializes_without_null_reason() {
        let envelope = FallbackEnvelope::remote(Vec::<i32>::new());
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["source"], "remote");
        assert!(json.get("fallbackReason").is_none());
    }
}
