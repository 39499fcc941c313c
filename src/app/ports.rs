//! Port traits — the boundary between the control core and the transport.
//!
//! The broker client (MQTT on target, a mock in tests) implements
//! [`TransportPort`]; the controller and the device capabilities consume it
//! as `&mut dyn TransportPort` and never touch the network stack directly.

use log::{debug, warn};

use crate::error::TransportError;

/// One message received from the broker, already decoded to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Command topic the message arrived on.
    pub topic: String,
    /// Verb text, e.g. `on:30` or `timeout_get`.
    pub payload: String,
}

/// Message-broker client seam.
///
/// `try_recv` must be non-blocking: it returns messages the client has
/// already buffered and `None` once the buffer is drained. `publish` is
/// expected to be reliable (QoS >= 1 on MQTT).
pub trait TransportPort {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError>;
    fn try_recv(&mut self) -> Option<InboundMessage>;
}

/// Publish `payload` to `<origin>/status`.
///
/// Publish failures are logged and swallowed: a flaky broker connection
/// must not take down the control loop, and the client will re-query.
pub fn publish_status(transport: &mut dyn TransportPort, origin: &str, payload: &str) {
    let status_topic = format!("{origin}/status");
    debug!("<== [{payload}] to [{status_topic}]");
    if let Err(e) = transport.publish(&status_topic, payload) {
        warn!("status publish to {status_topic} failed: {e}");
    }
}
