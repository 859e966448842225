//! Booking records
//!
//! Field contents are not validated here. Non-empty `event_id`, `slug` and
//! `email` are enforced by the store's constraints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A booking request as submitted by the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub event_id: String,
    pub slug: String,
    pub email: String,
}

impl NewBooking {
    pub fn new(
        event_id: impl Into<String>,
        slug: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            slug: slug.into(),
            email: email.into(),
        }
    }
}

/// Persisted booking. Identity and creation time are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub event_id: String,
    pub slug: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
