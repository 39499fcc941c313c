//! Monotonic time source for the control loop.
//!
//! On ESP-IDF the microsecond timer backs both the 32-bit millisecond
//! tick counter (which wraps; see [`crate::app::TickMs`]) and the 64-bit
//! uptime. On the host, `std::time::Instant` since construction.

use crate::app::{Now, TickMs};

#[cfg(not(target_os = "espidf"))]
use std::time::Instant;

pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    started: Instant,
}

impl MonotonicClock {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {}
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    #[cfg(target_os = "espidf")]
    pub fn now(&self) -> Now {
        // SAFETY: esp_timer_get_time reads the monotonic system timer.
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() } as u64;
        Now {
            ticks: TickMs((us / 1_000) as u32),
            uptime_secs: us / 1_000_000,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn now(&self) -> Now {
        let elapsed = self.started.elapsed();
        Now {
            ticks: TickMs(elapsed.as_millis() as u32),
            uptime_secs: elapsed.as_secs(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
