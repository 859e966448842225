//! Repository implementations for database access
//!
//! [`BookingStore`] is the seam between the writer and the storage engine.
//! A [`StoreHandle`] is what the connection manager memoizes.

pub mod bookings;

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{Booking, NewBooking};

pub use bookings::{BookingRepo, DbError};

/// Shared handle to a live booking store
pub type StoreHandle = Arc<dyn BookingStore>;

/// Persistence operations for bookings.
///
/// Implementations must enforce non-empty `event_id`, `slug` and `email`
/// and must not enforce uniqueness.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert one booking, returning the stored record.
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, DbError>;

    /// All bookings for an event, oldest first.
    async fn find_by_event(&self, event_id: &str) -> Result<Vec<Booking>, DbError>;

    /// Total number of stored bookings.
    async fn count(&self) -> Result<i64, DbError>;

    /// Release underlying connections.
    async fn close(&self) {}
}
