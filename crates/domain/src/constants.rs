//! Domain-wide constants
//!
//! Defaults for timeouts, retry policy, and credential lifecycle. These are
//! the fallback values used when the corresponding `WarehouseConfig` fields
//! are not set explicitly.

/// Refresh a cached access token this many seconds before its expiry.
pub const TOKEN_REFRESH_BUFFER_SECS: i64 = 300;

/// Token lifetime assumed when the identity endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_EXPIRES_IN_SECS: i64 = 3600;

/// Timeout for the client-credentials token exchange.
pub const DEFAULT_TOKEN_TIMEOUT_SECS: u64 = 30;

/// Timeout for opening a warehouse session.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Timeout for statement execution and result fetch.
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

/// Total attempts (initial try + retries) for remote operations.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff between retry attempts.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Ceiling applied to computed backoff delays.
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

/// Minimum age of a healthy diagnostics snapshot before a new remote probe
/// is issued.
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: i64 = 60;

/// Probe durations above this are flagged for connectivity review.
pub const SLOW_PROBE_THRESHOLD_MS: u64 = 5_000;

/// Probe durations above this suggest a cold or overloaded warehouse.
pub const VERY_SLOW_PROBE_THRESHOLD_MS: u64 = 10_000;

/// Tokens expiring within this many minutes produce an advisory
/// recommendation in health diagnostics.
pub const TOKEN_EXPIRY_ADVISORY_MINUTES: i64 = 15;

/// Default connection-pool size for the local store.
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;
