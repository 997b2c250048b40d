//! Remote warehouse stack
//!
//! Everything needed to run a parameterized statement against the remote
//! SQL warehouse: credential lifecycle (`auth`), the HTTP wire client
//! (`transport`), cached-session management (`connection`), bounded
//! retries (`retry`), the execution layer implementing the
//! `RemoteWarehouse` port (`executor`), and health tracking (`health`).

pub mod auth;
pub mod connection;
pub mod executor;
pub mod health;
pub mod retry;
pub mod transport;

pub use auth::TokenProvider;
pub use connection::{ConnectionManager, WarehouseConnection};
pub use executor::WarehouseExecutor;
pub use health::HealthMonitor;
pub use retry::RetryExecutor;
pub use transport::WarehouseHttpClient;
