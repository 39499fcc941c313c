//! Polled I2C environmental sensor link.
//!
//! Owns the poll-timeout gate and publication; register-level work lives
//! behind [`EnvSensor`]. A failing read is non-fatal: the tick skips
//! publication and the next tick retries.

use log::warn;

use crate::app::TickMs;
use crate::app::ports::{TransportPort, publish_status};
use crate::error::SensorError;
use crate::sensors::{self, EnvSensor, SensorKind};

pub struct PolledSensor {
    sensor: Box<dyn EnvSensor>,
    poll_timeout: i32,
    last_read_at: TickMs,
}

impl core::fmt::Debug for PolledSensor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PolledSensor")
            .field("kind", &self.sensor.kind())
            .field("poll_timeout", &self.poll_timeout)
            .field("last_read_at", &self.last_read_at)
            .finish()
    }
}

impl PolledSensor {
    /// Build and health-check the chip driver for this link.
    pub fn init(
        kind: SensorKind,
        scl: u8,
        sda: u8,
        poll_timeout_secs: i32,
        now: TickMs,
    ) -> Result<Self, SensorError> {
        Ok(Self {
            sensor: sensors::build(kind, scl, sda)?,
            poll_timeout: normalize(poll_timeout_secs),
            last_read_at: now,
        })
    }

    pub fn kind(&self) -> SensorKind {
        self.sensor.kind()
    }

    pub fn poll_timeout(&self) -> i32 {
        self.poll_timeout
    }

    /// Autonomous tick: forced read + publish once the poll timeout
    /// elapses. On failure the read clock is left alone, so the next tick
    /// retries immediately instead of waiting a full period without data.
    pub fn poll(&mut self, topic: &str, now: TickMs, transport: &mut dyn TransportPort) {
        if self.poll_timeout == -1
            || now.secs_since(self.last_read_at) < self.poll_timeout as u32
        {
            return;
        }
        match self.sensor.read(true) {
            Ok(value) => {
                self.last_read_at = now;
                publish_status(transport, topic, &value);
            }
            Err(e) => warn!("{topic}: sensor read failed: {e}"),
        }
    }

    /// `?` — unconditional forced read; a failure is reported to the
    /// status topic instead of being swallowed, since someone asked.
    pub fn query(&mut self, topic: &str, now: TickMs, transport: &mut dyn TransportPort) {
        match self.sensor.read(true) {
            Ok(value) => {
                self.last_read_at = now;
                publish_status(transport, topic, &value);
            }
            Err(e) => {
                warn!("{topic}: sensor read failed: {e}");
                publish_status(transport, topic, "ERROR: sensor read failed");
            }
        }
    }

    pub fn timeout_get(&self, topic: &str, transport: &mut dyn TransportPort) {
        publish_status(transport, topic, &format!("{}", self.poll_timeout));
    }

    pub fn timeout_set(
        &mut self,
        topic: &str,
        secs: i32,
        now: TickMs,
        transport: &mut dyn TransportPort,
    ) {
        self.poll_timeout = normalize(secs);
        self.last_read_at = now;
        publish_status(transport, topic, &format!("{}", self.poll_timeout));
    }
}

fn normalize(secs: i32) -> i32 {
    if secs < 0 { -1 } else { secs }
}
