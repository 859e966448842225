//! Booking repository
//!
//! - insert: plain INSERT ... RETURNING (no ON CONFLICT, duplicates are allowed)
//! - find_by_event: indexed lookup on event_id

use async_trait::async_trait;
use sqlx::PgPool;

use super::BookingStore;
use crate::models::{Booking, NewBooking};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("constraint violated: {constraint}")]
    Constraint { constraint: String },
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_check_violation() => Self::Constraint {
                constraint: db.constraint().unwrap_or("unknown").to_owned(),
            },
            _ => Self::Sqlx(e),
        }
    }
}

/// Booking repository
pub struct BookingRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> BookingRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a booking. Identity and `created_at` come from column defaults.
    #[tracing::instrument(name = "Insert booking", skip(self, booking), fields(event_id = %booking.event_id))]
    pub async fn insert(&self, booking: &NewBooking) -> Result<Booking, DbError> {
        let row = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (event_id, slug, email)
            VALUES ($1, $2, $3)
            RETURNING id, event_id, slug, email, created_at
            "#,
        )
        .bind(&booking.event_id)
        .bind(&booking.slug)
        .bind(&booking.email)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Bookings for one event, oldest first.
    pub async fn find_by_event(&self, event_id: &str) -> Result<Vec<Booking>, DbError> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, event_id, slug, email, created_at
            FROM bookings
            WHERE event_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl BookingStore for PgPool {
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, DbError> {
        BookingRepo::new(self).insert(booking).await
    }

    async fn find_by_event(&self, event_id: &str) -> Result<Vec<Booking>, DbError> {
        BookingRepo::new(self).find_by_event(event_id).await
    }

    async fn count(&self) -> Result<i64, DbError> {
        BookingRepo::new(self).count().await
    }

    async fn close(&self) {
        PgPool::close(self).await;
    }
}
