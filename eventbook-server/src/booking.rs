//! Booking writer - persist one booking per submission
//!
//! [`BookingWriter::create`] returns the structured outcome.
//! [`BookingWriter::submit`] flattens it to `{ success }` for the widget.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::db::ConnectionManager;
use crate::error::BookingResult;
use crate::models::{Booking, NewBooking};

/// Boolean view of a booking attempt, as returned to the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
}

/// Writes bookings through a shared [`ConnectionManager`].
#[derive(Debug, Clone)]
pub struct BookingWriter {
    connections: Arc<ConnectionManager>,
}

impl BookingWriter {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Acquire a connection and insert the booking. No retry.
    pub async fn create(&self, booking: &NewBooking) -> BookingResult<Booking> {
        let store = self.connections.acquire().await?;
        let record = store.insert(booking).await?;

        tracing::info!(
            booking_id = %record.id,
            event_id = %record.event_id,
            slug = %record.slug,
            "Booking created"
        );
        Ok(record)
    }

    /// Like [`create`](Self::create), with the failure reduced to `success: false`.
    pub async fn submit(&self, booking: &NewBooking) -> SubmissionResult {
        match self.create(booking).await {
            Ok(_) => SubmissionResult { success: true },
            Err(e) => {
                tracing::error!(
                    kind = %e.kind(),
                    error = %e,
                    event_id = %booking.event_id,
                    slug = %booking.slug,
                    "Booking failed"
                );
                SubmissionResult { success: false }
            }
        }
    }
}
