//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for FleetPdM
///
/// The variants mirror the phases of a remote read: configuration,
/// credential exchange, warehouse connection, statement execution, and
/// the terminal case where both data sources failed.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum FleetPdmError {
    /// Required warehouse configuration fields are absent. Fatal, never
    /// retried.
    #[error("warehouse configuration incomplete: missing {missing:?}")]
    ConfigurationIncomplete { missing: Vec<String> },

    /// The identity endpoint did not answer within the configured timeout.
    #[error("token request timed out after {timeout_secs}s")]
    TokenTimeout { timeout_secs: u64 },

    /// The identity endpoint answered with a non-success status or the
    /// request could not be sent.
    #[error("token request failed: {0}")]
    TokenRequestFailed(String),

    /// The identity endpoint answered 2xx but the payload was not a usable
    /// token response.
    #[error("token response malformed: {0}")]
    TokenMalformedResponse(String),

    /// Opening a warehouse session did not complete within the connect
    /// timeout.
    #[error("warehouse connect timed out after {timeout_secs}s")]
    ConnectionTimeout { timeout_secs: u64 },

    /// Opening or closing a warehouse session failed.
    #[error("warehouse connection failed: {0}")]
    ConnectionFailed(String),

    /// Statement execution or row fetch failed. `code` preserves the
    /// warehouse-native error code when one was returned (for example
    /// `TABLE_OR_VIEW_NOT_FOUND`).
    #[error("query execution failed ({code}): {message}")]
    QueryExecutionFailed { code: String, message: String },

    /// A per-query session scope could not be closed. Secondary: logged by
    /// the execution layer, never propagated in place of the primary error.
    #[error("session cleanup failed: {0}")]
    SessionCleanupFailed(String),

    /// Both the remote warehouse and the local store failed. Fatal,
    /// surfaced to the caller.
    #[error("data unavailable: remote: {remote}; local: {local}")]
    DataUnavailable { remote: String, local: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for FleetPdM operations
pub type Result<T> = std::result::Result<T, FleetPdmError>;

impl FleetPdmError {
    /// Stable machine-readable code for this error, used in fallback
    /// reasons and diagnostics. Warehouse-native statement codes pass
    /// through unchanged.
    #[must_use]
    pub fn error_code(&self) -> String {
        match self {
            Self::ConfigurationIncomplete { .. } => "CONFIGURATION_INCOMPLETE".into(),
            Self::TokenTimeout { .. } => "TOKEN_TIMEOUT".into(),
            Self::TokenRequestFailed(_) => "TOKEN_REQUEST_FAILED".into(),
            Self::TokenMalformedResponse(_) => "TOKEN_MALFORMED_RESPONSE".into(),
            Self::ConnectionTimeout { .. } => "CONNECTION_TIMEOUT".into(),
            Self::ConnectionFailed(_) => "CONNECTION_FAILED".into(),
            Self::QueryExecutionFailed { code, .. } => code.clone(),
            Self::SessionCleanupFailed(_) => "SESSION_CLEANUP_FAILED".into(),
            Self::DataUnavailable { .. } => "DATA_UNAVAILABLE".into(),
            Self::Database(_) => "DATABASE_ERROR".into(),
            Self::Config(_) => "CONFIG_ERROR".into(),
        }
    }

    /// Returns true if the retry executor may re-attempt an operation that
    /// failed with this error.
    ///
    /// Credential, connection, and statement phases are transient;
    /// configuration gaps and exhausted fallbacks are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TokenTimeout { .. }
                | Self::TokenRequestFailed(_)
                | Self::TokenMalformedResponse(_)
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionFailed(_)
                | Self::QueryExecutionFailed { .. }
        )
    }
}
