//! Outer-ring adapters: concrete clock, broker and network plumbing
//! behind the core's seams.

pub mod time;

#[cfg(target_os = "espidf")]
pub mod mqtt;
#[cfg(target_os = "espidf")]
pub mod wifi;
