//! eventbook-server: booking write path for the event widget
//!
//! A visitor submits an email for an event; the booking is persisted through
//! a single shared, lazily established database connection.
//!
//! - [`db::ConnectionManager`] - de-duplicated connection establishment
//! - [`booking::BookingWriter`] - one insert per submission
//! - [`form::BookingForm`] - submission state for the widget
//! - [`analytics`] - best-effort event capture
//! - [`http`] - axum server exposing the widget and the submit action

pub mod analytics;
pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod http;
pub mod models;

#[cfg(test)]
pub(crate) mod testing;

pub use booking::{BookingWriter, SubmissionResult};
pub use error::{BookingError, BookingErrorKind};
pub use models::{Booking, NewBooking};
