//! Application core — dispatch, verbs, and the cooperative control loop.
//!
//! ```text
//!  TransportPort ──▶ ┌──────────────────────────┐ ──▶ TransportPort
//!  (inbound msgs)    │        Controller        │     (status topics)
//!                    │  registry · groups · kat │
//!                    └──────────────────────────┘
//! ```
//!
//! The controller owns every link's runtime state plus the group table and
//! heartbeat bookkeeping; the outer loop hands it a time snapshot and the
//! transport each iteration. No module globals.

pub mod controller;
pub mod ports;
pub mod verbs;

// ---------------------------------------------------------------------------
// Monotonic time
// ---------------------------------------------------------------------------

/// A monotonic millisecond instant from a 32-bit tick counter.
///
/// The counter wraps roughly every 49.7 days; all elapsed-time math uses
/// `wrapping_sub`, which stays correct across a single wrap. Never compare
/// two raw instants with `<`/`>` — only differences are meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickMs(pub u32);

impl TickMs {
    /// Milliseconds elapsed since `earlier` (wrap-safe).
    pub fn millis_since(self, earlier: TickMs) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Whole seconds elapsed since `earlier` (wrap-safe).
    pub fn secs_since(self, earlier: TickMs) -> u32 {
        self.millis_since(earlier) / 1000
    }
}

/// Per-iteration time snapshot handed to the controller by the outer loop.
///
/// `uptime_secs` is tracked separately from the tick counter so the system
/// status and heartbeat report true uptime even after the 32-bit tick
/// counter wraps.
#[derive(Debug, Clone, Copy)]
pub struct Now {
    pub ticks: TickMs,
    pub uptime_secs: u64,
}

// ---------------------------------------------------------------------------
// Loop continuation signal
// ---------------------------------------------------------------------------

/// Returned by [`controller::Controller::tick`]; tells the outer loop
/// whether to keep scheduling or perform a hardware reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// A `reset` system verb was processed; `GOING RESET` has been
    /// published and no further messages or polls will run.
    Reset,
}
