//! Local SQLite store
//!
//! The fallback tier: a pooled SQLite database with one repository per
//! domain resource. Repositories return the same record shapes as the
//! remote path so fallback envelopes are source-agnostic.

pub mod manager;
pub mod parts;
pub mod requisitions;
pub mod seed;
pub mod ship_status;
pub mod work_orders;

pub use manager::DbManager;
pub use parts::SqlitePartRepository;
pub use requisitions::SqliteRequisitionRepository;
pub use ship_status::SqliteShipStatusRepository;
pub use work_orders::SqliteWorkOrderRepository;
