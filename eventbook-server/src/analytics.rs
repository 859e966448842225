//! Best-effort analytics side channel
//!
//! `capture` never blocks and never fails the caller. Events are either
//! logged ([`TracingAnalytics`]) or queued for delivery to PostHog
//! ([`PosthogAnalytics`]); delivery failures are logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::AnalyticsConfig;
use crate::models::NewBooking;

/// Captured when a booking succeeds
pub const EVENT_BOOKED: &str = "event_booked";

/// PostHog's event name for captured exceptions
pub const EVENT_EXCEPTION: &str = "$exception";

/// Shared analytics sink
pub type SharedAnalytics = Arc<dyn Analytics>;

/// One analytics event
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsEvent {
    pub name: String,
    pub distinct_id: String,
    pub properties: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    /// `event_booked` with the booking's identifiers
    pub fn booked(booking: &NewBooking) -> Self {
        Self {
            name: EVENT_BOOKED.to_string(),
            distinct_id: booking.email.clone(),
            properties: booking_properties(booking),
            timestamp: Utc::now(),
        }
    }

    /// An exception event carrying `message` plus the booking's identifiers
    pub fn exception(message: &str, booking: &NewBooking) -> Self {
        let mut properties = booking_properties(booking);
        properties.insert("$exception_message".into(), json!(message));
        Self {
            name: EVENT_EXCEPTION.to_string(),
            distinct_id: booking.email.clone(),
            properties,
            timestamp: Utc::now(),
        }
    }

    pub fn is_exception(&self) -> bool {
        self.name == EVENT_EXCEPTION
    }
}

fn booking_properties(booking: &NewBooking) -> Map<String, Value> {
    let mut props = Map::new();
    props.insert("eventId".into(), json!(booking.event_id));
    props.insert("slug".into(), json!(booking.slug));
    props.insert("email".into(), json!(booking.email));
    props
}

/// Fire-and-forget event sink
pub trait Analytics: Send + Sync {
    fn capture(&self, event: AnalyticsEvent);
}

/// Writes events to the log. Used when no PostHog key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl Analytics for TracingAnalytics {
    fn capture(&self, event: AnalyticsEvent) {
        let properties = Value::Object(event.properties);
        if event.name == EVENT_EXCEPTION {
            tracing::warn!(event = %event.name, %properties, "analytics");
        } else {
            tracing::info!(event = %event.name, %properties, "analytics");
        }
    }
}

/// Queues events for a background worker that posts them to PostHog.
#[derive(Debug, Clone)]
pub struct PosthogAnalytics {
    tx: mpsc::UnboundedSender<AnalyticsEvent>,
}

impl PosthogAnalytics {
    /// Start the delivery worker. Must be called inside a Tokio runtime.
    ///
    /// The worker exits once every `PosthogAnalytics` clone is dropped.
    pub fn spawn(config: AnalyticsConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(deliver(reqwest::Client::new(), config, rx));
        (Self { tx }, handle)
    }
}

impl Analytics for PosthogAnalytics {
    fn capture(&self, event: AnalyticsEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::warn!(event = %e.0.name, "Analytics worker stopped, event dropped");
        }
    }
}

/// Wait up to `limit` for the delivery worker to flush its queue.
///
/// The worker only finishes once every sender is dropped, so call this after
/// the server (and its state) has shut down. Returns `false` if events may
/// have been lost.
pub async fn drain(worker: JoinHandle<()>, limit: Duration) -> bool {
    match tokio::time::timeout(limit, worker).await {
        Ok(Ok(())) => {
            tracing::debug!("Analytics queue drained");
            true
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Analytics worker failed");
            false
        }
        Err(_) => {
            tracing::warn!(?limit, "Analytics queue not drained before shutdown");
            false
        }
    }
}

/// PostHog `/capture/` request body
#[derive(Serialize)]
struct CapturePayload<'a> {
    api_key: &'a str,
    event: &'a str,
    distinct_id: &'a str,
    properties: &'a Map<String, Value>,
    timestamp: String,
}

async fn deliver(
    client: reqwest::Client,
    config: AnalyticsConfig,
    mut rx: mpsc::UnboundedReceiver<AnalyticsEvent>,
) {
    let url = config.capture_url();

    while let Some(event) = rx.recv().await {
        let payload = CapturePayload {
            api_key: &config.api_key,
            event: &event.name,
            distinct_id: &event.distinct_id,
            properties: &event.properties,
            timestamp: event.timestamp.to_rfc3339(),
        };

        let result = client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        match result {
            Ok(_) => tracing::debug!(event = %event.name, "Analytics event delivered"),
            Err(e) => tracing::warn!(event = %event.name, error = %e, "Analytics delivery failed"),
        }
    }

    tracing::debug!("Analytics worker shutting down");
}
