//! Database layer - connection manager and booking store
//!
//! # Design Principles
//!
//! - One pool per process, owned by a [`ConnectionManager`] - no global state
//! - At most one connection attempt in flight
//! - Rely on DB constraints for field checks - no check-then-insert

pub mod manager;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use manager::{AcquireError, ConnectionManager};
pub use memory::{MemoryConnector, MemoryStore};
pub use pool::{create_pool, Connector, PgConnector};
pub use repos::{BookingRepo, BookingStore, DbError, StoreHandle};
