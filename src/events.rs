//! Delivery of [`MatriculeGenerated`] events.
//!
//! Hooks publish after the write that stored the identifier has succeeded.
//! Publishing never fails the request: sinks log and drop what they cannot
//! deliver.

use std::fmt;
use std::sync::Arc;

use registrar_models::MatriculeGenerated;
use tokio::sync::broadcast;
use tracing::{debug, info};

pub trait EventSink: Send + Sync + fmt::Debug {
    fn publish(&self, event: &MatriculeGenerated);
}

/// Writes one audit log line per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &MatriculeGenerated) {
        info!(
            target: "registrar::audit",
            event = MatriculeGenerated::NAME,
            identifier = %event.identifier,
            kind = event.kind.as_str(),
            subject_id = %event.subject_id,
            role = %event.role,
            registration_number = ?event.registration_number,
            "Identifier generated"
        );
    }
}

/// Fans events out to live subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<MatriculeGenerated>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatriculeGenerated> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for BroadcastEventSink {
    fn publish(&self, event: &MatriculeGenerated) {
        if self.sender.send(event.clone()).is_err() {
            debug!(identifier = %event.identifier, "No event subscribers");
        }
    }
}

/// Publishes every event to each of its sinks in order.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: &MatriculeGenerated) {
        for sink in &self.sinks {
            sink.publish(event);
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use recording::RecordingEventSink;

#[cfg(any(test, feature = "test-utils"))]
mod recording {
    use std::sync::{Mutex, PoisonError};

    use registrar_models::MatriculeGenerated;

    use super::EventSink;

    /// Keeps every published event for later assertions.
    #[derive(Debug, Default)]
    pub struct RecordingEventSink {
        events: Mutex<Vec<MatriculeGenerated>>,
    }

    impl RecordingEventSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<MatriculeGenerated> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl EventSink for RecordingEventSink {
        fn publish(&self, event: &MatriculeGenerated) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_broadcast_sink_delivers_to_subscribers() {
        let sink = BroadcastEventSink::new(8);
        let mut rx = sink.subscribe();

        let event = MatriculeGenerated::for_student("REG-TG-2026-001", Uuid::new_v4());
        sink.publish(&event);

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn test_broadcast_without_subscribers_does_not_panic() {
        BroadcastEventSink::default()
            .publish(&MatriculeGenerated::for_user("ADM26001", Uuid::new_v4(), "administrateur"));
    }

    #[test]
    fn test_event_bus_fans_out() {
        let first = Arc::new(RecordingEventSink::new());
        let second = Arc::new(RecordingEventSink::new());
        let bus = EventBus::new()
            .with_sink(first.clone())
            .with_sink(second.clone())
            .with_sink(Arc::new(TracingEventSink));

        bus.publish(&MatriculeGenerated::for_user("SEC26001", Uuid::new_v4(), "secrétariat"));

        assert_eq!(first.events().len(), 1);
        assert_eq!(second.events().len(), 1);
    }
}
