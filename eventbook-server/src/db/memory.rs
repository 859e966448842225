//! In-memory booking store for local development (`serve --memory`)
//!
//! Mirrors the Postgres table's constraints so the widget behaves the same
//! without a database. Data lives for the life of the process.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::pool::Connector;
use super::repos::{BookingStore, DbError, StoreHandle};
use crate::models::{Booking, NewBooking};

/// Process-local booking store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    bookings: Arc<RwLock<Vec<Booking>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Characters stripped before the emptiness check, as in the table's
/// `btrim(x, E' \t\r\n')` constraints
const BLANK_CHARS: [char; 4] = [' ', '\t', '\r', '\n'];

fn check_not_empty(value: &str, constraint: &str) -> Result<(), DbError> {
    if value.trim_matches(BLANK_CHARS).is_empty() {
        return Err(DbError::Constraint {
            constraint: constraint.to_owned(),
        });
    }
    Ok(())
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, DbError> {
        check_not_empty(&booking.event_id, "bookings_event_id_not_empty")?;
        check_not_empty(&booking.slug, "bookings_slug_not_empty")?;
        check_not_empty(&booking.email, "bookings_email_not_empty")?;

        let record = Booking {
            id: Uuid::new_v4(),
            event_id: booking.event_id.clone(),
            slug: booking.slug.clone(),
            email: booking.email.clone(),
            created_at: Utc::now(),
        };
        self.bookings.write().await.push(record.clone());
        Ok(record)
    }

    async fn find_by_event(&self, event_id: &str) -> Result<Vec<Booking>, DbError> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .iter()
            .filter(|b| b.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, DbError> {
        Ok(self.bookings.read().await.len() as i64)
    }
}

/// Connector that hands out one shared [`MemoryStore`].
///
/// The connection string is accepted but not interpreted.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: MemoryStore,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _uri: &str) -> Result<StoreHandle, sqlx::Error> {
        Ok(Arc::new(self.store.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_identity_and_timestamp() {
        let store = MemoryStore::new();
        let booking = store
            .insert(&NewBooking::new("evt1", "spring-fest", "a@example.com"))
            .await
            .unwrap();

        assert_eq!(booking.event_id, "evt1");
        assert_eq!(store.find_by_event("evt1").await.unwrap(), vec![booking]);
        assert!(store.find_by_event("evt2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_fields_violate_constraints() {
        let store = MemoryStore::new();

        let err = store
            .insert(&NewBooking::new("evt1", "  ", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Constraint { ref constraint } if constraint == "bookings_slug_not_empty"
        ));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn blank_check_matches_table_constraint() {
        let store = MemoryStore::new();

        for blank in ["", " ", "\t", " \r\n "] {
            let err = store
                .insert(&NewBooking::new("evt1", "spring-fest", blank))
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::Constraint { .. }), "{blank:?} accepted");
        }

        // Not in the constraint's character set, so Postgres keeps it too
        store
            .insert(&NewBooking::new("evt1", "spring-fest", "\u{00a0}"))
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn connector_shares_one_store() {
        let connector = MemoryConnector::default();
        let handle = connector.connect("memory://").await.unwrap();
        handle
            .insert(&NewBooking::new("evt1", "spring-fest", "a@example.com"))
            .await
            .unwrap();

        assert_eq!(connector.store().count().await.unwrap(), 1);
    }
}
