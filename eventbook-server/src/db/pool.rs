//! Connection establishment
//!
//! [`Connector`] produces a live [`StoreHandle`] from a connection string.
//! The connection manager calls it at most once per in-flight attempt.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::migrations;
use super::repos::StoreHandle;

/// Establishes a connection to a booking store.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, uri: &str) -> Result<StoreHandle, sqlx::Error>;
}

/// Create a PostgreSQL connection pool.
///
/// The pool connects eagerly: a handle is returned only after one
/// connection has been opened, so no write is ever queued behind a
/// connection that does not exist yet.
///
/// # Errors
///
/// Returns an error if the connection fails.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/eventbook", 5).await?;
/// ```
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Postgres-backed connector. Runs migrations before handing out the pool.
#[derive(Debug, Clone)]
pub struct PgConnector {
    max_connections: u32,
}

impl PgConnector {
    pub fn new(max_connections: u32) -> Self {
        Self { max_connections }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, uri: &str) -> Result<StoreHandle, sqlx::Error> {
        let pool = create_pool(uri, self.max_connections).await?;
        migrations::run(&pool).await?;
        tracing::info!(max_connections = self.max_connections, "Connected to database");
        Ok(Arc::new(pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p eventbook-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url, 2).await.expect("pool creation failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pg_connector_migrates_before_returning() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let store = PgConnector::new(2).connect(&url).await.expect("connect failed");

        // bookings table exists once the handle is live
        store.count().await.expect("count failed");
        store.close().await;
    }
}
