//! Broker-facing half of the bridge: the connection supervisor, the
//! publish reliability queue, and inbound control-message routing.
//!
//! The supervisor owns the `rumqttc` event loop on a background task and
//! shares exactly two things with the scan loop: a "session usable" flag
//! (consumed through [`MessageSink::is_connected`]) and the control
//! handler it feeds with parsed inbound commands. Outbound buffering lives
//! exclusively in [`Publisher`]; the supervisor never queues messages.

#![allow(async_fn_in_trait)]

pub mod control;
pub mod error;
pub mod publisher;
pub mod supervisor;
pub mod testing;

pub use control::{ControlCommand, ControlHandler, ControlTopics, WriteRequest};
pub use error::MqttError;
pub use publisher::{MessageSink, OutboundMessage, Publisher};
pub use supervisor::{BrokerSettings, MqttSink, SessionState, Supervisor};
