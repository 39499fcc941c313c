//! Placeholder for hardware that is wired but not yet supported.

use crate::app::ports::{TransportPort, publish_status};

#[derive(Debug)]
pub struct Inert;

impl Inert {
    /// Every inbound command gets the same answer; autonomous polls are
    /// silent no-ops.
    pub fn reject(&self, topic: &str, transport: &mut dyn TransportPort) {
        publish_status(transport, topic, "ERROR: not implemented");
    }
}
