//! Event wire types.
//!
//! The structures here are serialized verbatim into the collector POST body,
//! so every serde key is part of the wire contract:
//!
//! ```json
//! {"events": [{"actor": {...}, "channel": "mobile", "event_params": [{...}]}]}
//! ```

mod envelope;
mod error_info;
mod fields;
mod kind;

pub use envelope::{Actor, EventBatch, EventEnvelope};
pub use error_info::ErrorInfo;
pub use fields::EventFields;
pub use kind::EventKind;
