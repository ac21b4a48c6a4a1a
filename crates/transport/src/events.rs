//! Observer notifications emitted by a transport.
//!
//! Events are fire-and-forget: emitting never blocks and never fails, even
//! with no subscriber. A subscriber that falls more than
//! [`EVENT_CAPACITY`] events behind sees `RecvError::Lagged`.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::DeliveryError;

pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A delivery attempt failed.
    Error(Arc<DeliveryError>),
    /// A delivery attempt completed, whatever its outcome.
    Logged,
}

impl TransportEvent {
    /// Notification name: `"error"` or `"logged"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Error(_) => "error",
            Self::Logged => "logged",
        }
    }

    pub fn error(&self) -> Option<&DeliveryError> {
        match self {
            Self::Error(e) => Some(e),
            Self::Logged => None,
        }
    }
}

/// Broadcast side of the observer list.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TransportEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: TransportEvent) {
        // No receivers is not an error.
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
