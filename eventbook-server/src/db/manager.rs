//! Connection manager - one live store handle per process
//!
//! Owned by the composition root and passed to every writer. Two slots are
//! memoized behind one lock:
//!
//! - `live`: the established handle, returned without further work
//! - `in_flight`: the pending attempt, shared by every caller that arrives
//!   before it settles
//!
//! Both slots are checked and set inside the same critical section, before
//! any await, so concurrent callers always converge on a single attempt.
//! A failed attempt clears `in_flight`; the next caller starts a new one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use super::pool::Connector;
use super::repos::StoreHandle;
use crate::config::DatabaseConfig;

/// Why a store handle could not be acquired
#[derive(Debug, Clone, thiserror::Error)]
pub enum AcquireError {
    /// No connection string configured. Not retried automatically.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("connection error: {0}")]
    Connection(Arc<sqlx::Error>),

    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),
}

const MISSING_URI_MESSAGE: &str =
    "no connection string configured; set DATABASE_URL (or MONGODB_URI) in the environment or .env";

type Attempt = Shared<BoxFuture<'static, Result<StoreHandle, AcquireError>>>;

#[derive(Default)]
struct Slots {
    live: Option<StoreHandle>,
    in_flight: Option<Attempt>,
}

/// Lazily connects and memoizes a single store handle.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    uri: Option<String>,
    connect_timeout: Option<Duration>,
    slots: Mutex<Slots>,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("configured", &self.uri.is_some())
            .field("connect_timeout", &self.connect_timeout)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Create a manager. A missing `uri` is reported on the first [`acquire`](Self::acquire).
    pub fn new(connector: Arc<dyn Connector>, uri: Option<String>) -> Self {
        Self {
            connector,
            uri,
            connect_timeout: None,
            slots: Mutex::new(Slots::default()),
        }
    }

    pub fn from_config(connector: Arc<dyn Connector>, config: &DatabaseConfig) -> Self {
        let manager = Self::new(connector, config.url.clone());
        match config.connect_timeout {
            Some(limit) => manager.with_connect_timeout(limit),
            None => manager,
        }
    }

    /// Bound each connection attempt. Without this, an attempt may wait forever.
    pub fn with_connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = Some(limit);
        self
    }

    /// Return the live handle, joining or starting a connection attempt if needed.
    pub async fn acquire(&self) -> Result<StoreHandle, AcquireError> {
        let attempt = {
            let mut slots = self.slots.lock().await;

            if let Some(live) = &slots.live {
                return Ok(Arc::clone(live));
            }

            match &slots.in_flight {
                Some(attempt) => attempt.clone(),
                None => {
                    let uri = self.uri.clone().ok_or_else(|| {
                        AcquireError::Configuration(MISSING_URI_MESSAGE.to_string())
                    })?;
                    let attempt = self.start_attempt(uri);
                    slots.in_flight = Some(attempt.clone());
                    attempt
                }
            }
        };

        let result = attempt.clone().await;

        let mut slots = self.slots.lock().await;
        let owns_slot = slots
            .in_flight
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&attempt));

        if owns_slot {
            slots.in_flight = None;
            match &result {
                Ok(handle) => {
                    tracing::info!("Database connection established");
                    slots.live = Some(Arc::clone(handle));
                }
                Err(e) => tracing::warn!(error = %e, "Database connection failed"),
            }
        }

        result
    }

    /// Close and forget the live handle. The next [`acquire`](Self::acquire) reconnects.
    ///
    /// An attempt already in flight is left to settle.
    pub async fn reset(&self) {
        let live = self.slots.lock().await.live.take();
        if let Some(handle) = live {
            tracing::info!("Resetting database connection");
            handle.close().await;
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.slots.lock().await.live.is_some()
    }

    fn start_attempt(&self, uri: String) -> Attempt {
        let connector = Arc::clone(&self.connector);
        let connect_timeout = self.connect_timeout;

        tracing::info!("Establishing database connection");
        async move {
            let connect = connector.connect(&uri);
            let result = match connect_timeout {
                Some(limit) => tokio::time::timeout(limit, connect)
                    .await
                    .map_err(|_| AcquireError::Timeout(limit))?,
                None => connect.await,
            };
            result.map_err(|e| AcquireError::Connection(Arc::new(e)))
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedConnector;
    use tokio::sync::Semaphore;

    fn manager(connector: &Arc<ScriptedConnector>) -> ConnectionManager {
        ConnectionManager::new(connector.clone(), Some("memory://test".into()))
    }

    #[tokio::test]
    async fn live_handle_is_reused() {
        let connector = Arc::new(ScriptedConnector::new());
        let manager = manager(&connector);

        let first = manager.acquire().await.unwrap();
        let second = manager.acquire().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connector.attempts(), 1);
        assert!(manager.is_connected().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_attempt() {
        let gate = Arc::new(Semaphore::new(0));
        let connector = Arc::new(ScriptedConnector::new().with_gate(gate.clone()));
        let manager = Arc::new(manager(&connector));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.acquire().await })
            })
            .collect();

        // Let every task reach the pending attempt before it resolves
        tokio::time::sleep(Duration::from_millis(50)).await;
        gate.add_permits(1);

        let mut acquired = Vec::new();
        for handle in handles {
            acquired.push(handle.await.expect("task panicked").unwrap());
        }

        assert_eq!(connector.attempts(), 1);
        assert!(acquired.iter().all(|h| Arc::ptr_eq(h, &acquired[0])));
    }

    #[tokio::test]
    async fn waiters_receive_the_shared_failure() {
        let gate = Arc::new(Semaphore::new(0));
        let connector = Arc::new(ScriptedConnector::failing(1).with_gate(gate.clone()));
        let manager = manager(&connector);

        let (a, b, ()) = tokio::join!(manager.acquire(), manager.acquire(), async {
            tokio::task::yield_now().await;
            gate.add_permits(1);
        });

        assert!(matches!(a, Err(AcquireError::Connection(_))));
        assert!(matches!(b, Err(AcquireError::Connection(_))));
        assert_eq!(connector.attempts(), 1);
    }

    #[tokio::test]
    async fn failed_attempt_is_retried_on_next_call() {
        let connector = Arc::new(ScriptedConnector::failing(1));
        let manager = manager(&connector);

        assert!(matches!(
            manager.acquire().await,
            Err(AcquireError::Connection(_))
        ));
        assert!(!manager.is_connected().await);

        manager.acquire().await.unwrap();
        assert_eq!(connector.attempts(), 2);
        assert!(manager.is_connected().await);
    }

    #[tokio::test]
    async fn missing_uri_is_a_configuration_error() {
        let connector = Arc::new(ScriptedConnector::new());
        let manager = ConnectionManager::new(connector.clone(), None);

        let err = manager.acquire().await.err().unwrap();
        assert!(matches!(err, AcquireError::Configuration(_)));
        let message = err.to_string();
        assert!(message.contains("DATABASE_URL") && message.contains("MONGODB_URI"));
        // Not cached as an attempt; reported again on every call
        assert!(matches!(
            manager.acquire().await,
            Err(AcquireError::Configuration(_))
        ));
        assert_eq!(connector.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_attempt_times_out_and_clears() {
        let gate = Arc::new(Semaphore::new(0));
        let connector = Arc::new(ScriptedConnector::new().with_gate(gate.clone()));
        let manager = manager(&connector).with_connect_timeout(Duration::from_secs(5));

        let result = manager.acquire().await;
        assert!(matches!(result, Err(AcquireError::Timeout(d)) if d == Duration::from_secs(5)));

        gate.add_permits(1);
        manager.acquire().await.unwrap();
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sub_second_timeout_is_displayed_exactly() {
        let gate = Arc::new(Semaphore::new(0));
        let connector = Arc::new(ScriptedConnector::new().with_gate(gate));
        let manager = manager(&connector).with_connect_timeout(Duration::from_millis(250));

        let err = manager.acquire().await.err().unwrap();
        assert_eq!(err.to_string(), "connection attempt timed out after 250ms");
    }

    #[tokio::test]
    async fn reset_forces_reconnect() {
        let connector = Arc::new(ScriptedConnector::new());
        let manager = manager(&connector);

        let first = manager.acquire().await.unwrap();
        manager.reset().await;
        assert!(!manager.is_connected().await);

        let second = manager.acquire().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(connector.attempts(), 2);
    }

    #[test]
    fn from_config_applies_timeout() {
        let connector: Arc<dyn Connector> = Arc::new(ScriptedConnector::new());
        let config = DatabaseConfig {
            connect_timeout: Some(Duration::from_secs(3)),
            ..DatabaseConfig::with_url("memory://test")
        };
        let manager = ConnectionManager::from_config(connector, &config);
        assert_eq!(manager.connect_timeout, Some(Duration::from_secs(3)));
    }
}
