//! Pool events broadcast to API subscribers and tests

use crate::scheduler::PassReport;
use giftpool_types::{GiftId, PersonId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Event sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSource {
    /// Periodic reconciliation
    Reconciler,
    /// First contact of a person
    Onboarding,
    /// Claim handling
    Claims,
    /// Operator actions through the API
    Api,
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSeverity {
    Info,
    Warning,
    Error,
}

/// Giftpool events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PoolEvent {
    /// A person was registered and received their first offers
    PersonOnboarded { person: PersonId },

    /// An offer message was sent
    NotificationCreated { person: PersonId, gift: GiftId },

    /// An offer message was withdrawn
    NotificationDeleted { person: PersonId, gift: GiftId },

    /// A message was switched to its claimed presentation
    NotificationFulfilled { person: PersonId, gift: GiftId },

    /// A channel operation failed and will be retried on a later tick
    NotificationFailed {
        person: PersonId,
        gift: GiftId,
        reason: String,
    },

    /// A claim was recorded
    ClaimRecorded {
        person: PersonId,
        gift: GiftId,
        count: u32,
    },

    /// A claim hit a capacity bound
    ClaimRejected {
        person: PersonId,
        gift: GiftId,
        reason: String,
    },

    /// The catalog was reloaded from the store
    CatalogReloaded { gifts: usize, rules: usize },

    /// A reconciliation pass finished
    PassCompleted { report: PassReport },

    /// A reconciliation pass hit its timeout
    PassTimedOut,
}

/// Envelope wrapping all pool events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Event source
    pub source: EventSource,

    /// Event severity
    pub severity: EventSeverity,

    /// The actual event
    pub event: PoolEvent,
}

impl PoolEventEnvelope {
    /// Create a new event envelope
    pub fn new(event: PoolEvent, source: EventSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            source,
            severity: Self::infer_severity(&event),
            event,
        }
    }

    fn infer_severity(event: &PoolEvent) -> EventSeverity {
        match event {
            PoolEvent::NotificationFailed { .. } => EventSeverity::Error,
            PoolEvent::ClaimRejected { .. } | PoolEvent::PassTimedOut => EventSeverity::Warning,
            PoolEvent::PassCompleted { report } if report.failed > 0 => EventSeverity::Warning,
            _ => EventSeverity::Info,
        }
    }
}

/// Sending half of the event bus.
///
/// Emitting never fails; events sent while nobody listens are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PoolEventEnvelope>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn emit(&self, event: PoolEvent, source: EventSource) {
        let _ = self.tx.send(PoolEventEnvelope::new(event, source));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PoolEventEnvelope> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_inference() {
        let failed = PoolEventEnvelope::new(
            PoolEvent::NotificationFailed {
                person: PersonId::new("7"),
                gift: GiftId::new("kettle"),
                reason: "timeout".to_string(),
            },
            EventSource::Reconciler,
        );
        assert_eq!(failed.severity, EventSeverity::Error);

        let clean = PoolEventEnvelope::new(
            PoolEvent::PassCompleted {
                report: PassReport::default(),
            },
            EventSource::Reconciler,
        );
        assert_eq!(clean.severity, EventSeverity::Info);
    }

    #[tokio::test]
    async fn test_subscribers_receive_emitted_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(
            PoolEvent::PersonOnboarded {
                person: PersonId::new("7"),
            },
            EventSource::Onboarding,
        );

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.source, EventSource::Onboarding);
        assert!(matches!(envelope.event, PoolEvent::PersonOnboarded { .. }));
    }
}
