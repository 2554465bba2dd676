use serde::{Deserialize, Serialize};

use crate::constants::CHANNEL;
use crate::types::EventFields;

/// Who produced an event: the visit (process lifetime) and the visitor (user).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Random identifier for the current visit.
    #[serde(rename = "tracking_visit_id")]
    pub visit_id: String,
    /// Configured user token.
    #[serde(rename = "tracking_visitor_id")]
    pub visitor_id: String,
}

impl Actor {
    /// Build an actor from a visit id and a visitor (user) token.
    pub fn new(visit_id: impl Into<String>, visitor_id: impl Into<String>) -> Self {
        Self {
            visit_id: visit_id.into(),
            visitor_id: visitor_id.into(),
        }
    }
}

/// One tracked event as stored locally and sent to the collector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Visit and visitor identity.
    pub actor: Actor,
    /// Always [`CHANNEL`].
    pub channel: String,
    /// Field records; a single entry for every event produced today.
    pub event_params: Vec<EventFields>,
}

impl EventEnvelope {
    /// Wrap a single field record for `actor` on the standard channel.
    pub fn single(actor: Actor, fields: EventFields) -> Self {
        Self {
            actor,
            channel: CHANNEL.to_string(),
            event_params: vec![fields],
        }
    }

    /// The first (and normally only) field record.
    pub fn fields(&self) -> Option<&EventFields> {
        self.event_params.first()
    }
}

/// The POST body sent in one flush.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    /// Events being delivered.
    pub events: Vec<EventEnvelope>,
}

impl EventBatch {
    /// Number of events in the batch.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
