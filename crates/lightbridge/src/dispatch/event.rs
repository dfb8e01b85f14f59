//! Inbound events and the queue that carries them from the transport to the
//! dispatcher.

use strum::EnumString;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

/// Capacity of the transport→dispatcher queue
///
/// Events arriving while the queue is full are dropped with a warning; see
/// [`offer_event`].
pub const EVENT_QUEUE_CAPACITY: usize = 100;

pub type EventSender = mpsc::Sender<InboundEvent>;
pub type EventReceiver = mpsc::Receiver<InboundEvent>;

/// Create the bounded queue between the transport and the dispatcher
pub fn event_queue() -> (EventSender, EventReceiver) {
    mpsc::channel(EVENT_QUEUE_CAPACITY)
}

/// Queue an event for the dispatcher without waiting
///
/// The MQTT event loop must keep polling while the dispatcher is busy, since
/// that same loop sends the dispatcher's publishes. A full queue therefore drops
/// the event instead of blocking. Returns false once the dispatcher is gone.
pub fn offer_event(events: &EventSender, event: InboundEvent) -> bool {
    match events.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            warn!(
                "Event queue full, dropping {} -> {}",
                event.topic,
                String::from_utf8_lossy(&event.payload)
            );
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

/// A message received on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundEvent {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Gesture reported by a switch in its action payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SwitchAction {
    /// Single press, toggles the mapped light
    Single,
}

impl SwitchAction {
    /// Decode an action payload; `None` for unknown gestures and non-UTF-8 data
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        std::str::from_utf8(payload).ok()?.parse().ok()
    }
}
