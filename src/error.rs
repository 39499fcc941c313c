//! Per-subsystem error types for the Gardlink firmware.
//!
//! Startup failures funnel into [`InitError`] and reach `main` through
//! `anyhow`. Runtime command handling never uses these — malformed input
//! is converted into `ERROR:` status publications instead (see
//! [`crate::app::verbs`]).

use core::fmt;

use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Startup errors (fatal — abort before entering the run loop)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// Two links share the same topic.
    DuplicateTopic(String),
    /// GPIO or bus setup failed for a link.
    Hw(HwInitError),
    /// A sensor link's device did not come up healthy.
    Sensor(SensorError),
    /// An actuator group exceeds the fixed membership bound.
    GroupFull(u8),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTopic(t) => write!(f, "duplicate link topic '{t}'"),
            Self::Hw(e) => write!(f, "hardware setup failed: {e}"),
            Self::Sensor(e) => write!(f, "sensor init failed: {e}"),
            Self::GroupFull(id) => write!(f, "too many members in group {id}"),
        }
    }
}

impl From<HwInitError> for InitError {
    fn from(e: HwInitError) -> Self {
        Self::Hw(e)
    }
}

impl From<SensorError> for InitError {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The broker refused or dropped a publish.
    PublishFailed,
    /// The client lost its connection to the broker.
    Disconnected,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublishFailed => write!(f, "publish failed"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C transaction returned an error code.
    BusError(i32),
    /// The device did not acknowledge its address.
    NotResponding,
    /// Conversion produced a physically implausible value.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusError(rc) => write!(f, "I2C bus error (rc={rc})"),
            Self::NotResponding => write!(f, "device not responding"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl std::error::Error for InitError {}
impl std::error::Error for TransportError {}
impl std::error::Error for SensorError {}
