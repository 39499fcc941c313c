//! Gardlink firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod devices;
pub mod error;
pub mod pins;

// Dual-target modules: real peripherals on ESP-IDF, in-memory simulation
// with injection hooks on the host.
pub mod adapters;
pub mod drivers;
pub mod sensors;
