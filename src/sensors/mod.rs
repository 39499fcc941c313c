//! Environmental sensor capability.
//!
//! The control core only sees [`EnvSensor`]: a forced or cached read
//! producing a text value. Register-level decoding lives in the per-chip
//! modules and never leaks upward.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SensorError;

pub mod gy21p;

/// Supported sensor chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    /// GY-21P combo breakout: SI7021 (temperature/humidity) + BMP280
    /// (pressure).
    #[serde(rename = "GY-21P")]
    Gy21p,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gy21p => write!(f, "GY-21P"),
        }
    }
}

/// Read capability the polled-sensor link consumes.
///
/// `read(true)` performs a fresh measurement (this may block for the
/// chip's bounded settling time — see the chip module docs); `read(false)`
/// returns the last cached value.
pub trait EnvSensor {
    fn kind(&self) -> SensorKind;
    fn read(&mut self, force: bool) -> Result<String, SensorError>;
}

/// Construct and health-check the sensor for a link.
///
/// Errors here are fatal to startup: a configured sensor that does not
/// respond keeps the controller out of the run loop.
pub fn build(kind: SensorKind, scl: u8, sda: u8) -> Result<Box<dyn EnvSensor>, SensorError> {
    match kind {
        SensorKind::Gy21p => Ok(Box::new(gy21p::Gy21p::new(scl, sda)?)),
    }
}
