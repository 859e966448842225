//! Test doubles shared across unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::analytics::{Analytics, AnalyticsEvent};
use crate::booking::BookingWriter;
use crate::db::{ConnectionManager, Connector, MemoryStore, StoreHandle};

/// Connector that counts attempts, can fail a fixed number of times, and
/// can be held open until a gate permit is released.
#[derive(Default)]
pub(crate) struct ScriptedConnector {
    store: MemoryStore,
    attempts: AtomicUsize,
    failures: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` attempts
    pub(crate) fn failing(n: usize) -> Self {
        Self {
            failures: AtomicUsize::new(n),
            ..Self::default()
        }
    }

    /// Block each attempt until `gate` has a permit. Permits are returned,
    /// so one `add_permits(1)` opens the gate for good.
    pub(crate) fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn store(&self) -> &MemoryStore {
        &self.store
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _uri: &str) -> Result<StoreHandle, sqlx::Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.map_err(|_| sqlx::Error::PoolClosed)?;
        }

        let should_fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(sqlx::Error::PoolTimedOut);
        }

        Ok(Arc::new(self.store.clone()))
    }
}

/// Analytics sink that keeps every captured event
#[derive(Default)]
pub(crate) struct RecordingAnalytics {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl RecordingAnalytics {
    pub(crate) fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Analytics for RecordingAnalytics {
    fn capture(&self, event: AnalyticsEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Writer backed by a fresh scripted connector
pub(crate) fn writer_with(
    connector: &Arc<ScriptedConnector>,
    uri: Option<&str>,
) -> BookingWriter {
    let manager = ConnectionManager::new(connector.clone(), uri.map(str::to_owned));
    BookingWriter::new(Arc::new(manager))
}
