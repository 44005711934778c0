//! Real-time transport - wire schema and the dispatcher that feeds the registry

pub mod dispatcher;
pub mod events;

pub use dispatcher::{Dispatcher, Outbox};
pub use events::{decode_inbound, encode_outbound, InboundEvent, OutboundEvent, PlayerId};
