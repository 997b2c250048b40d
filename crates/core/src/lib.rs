//! # FleetPdM Core
//!
//! Business logic of the data-source reconciliation layer, written against
//! ports.
//!
//! This crate contains:
//! - Port traits for the remote warehouse, the local repositories, and
//!   diagnostics bookkeeping
//! - The parameterized query builder
//! - Row-to-record mapping shared by the remote path
//! - The fallback coordinator ([`gateway::FleetDataGateway`])
//!
//! ## Architecture
//! - Depends only on `fleetpdm-domain`
//! - No I/O; adapters live in `fleetpdm-infra`

pub mod gateway;
pub mod ports;
pub mod query;
pub mod rows;

// Re-export commonly used items
pub use gateway::{FleetDataGateway, LocalRepositories};
pub use ports::*;
pub use query::TableQuery;
pub use rows::{map_rows, FromRow};
