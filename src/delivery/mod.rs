//! # Delivery acknowledgment.
//!
//! One broker delivery becomes exactly one `ack` or `nack` and exactly one
//! terminal counter:
//!
//! ```text
//! InboundMessage ─► Decoder ─► Envelope ─► Router ─► DeliveryOutcome ─► AckDecision
//!                     │                      │
//!                     └── DecodeError ───────┴── RouteError
//! ```
//!
//! Classification happens once, in [`DeliveryOutcome::from_route`]; nothing
//! downstream re-classifies.

mod decode;
mod engine;
mod message;
mod outcome;
mod route;

pub use decode::{DecodeError, Decoder, Envelope, JsonDecoder};
pub use engine::{AckEngine, AckReply, DEFAULT_METRIC_TAGS, MessageReceiver};
pub use message::{COMMON_FORMAT_ATTRIBUTE, FormatVersion, InboundMessage};
pub use outcome::{
    ACK_COUNTER, AUTOACK_COUNTER, AckAction, AckCounter, AckDecision, DeliveryOutcome,
    NACK_COUNTER, RECEIVE_COUNTER,
};
pub use route::{DeliveryContext, RouteError, Router};
