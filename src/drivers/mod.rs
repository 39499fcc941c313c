//! Low-level peripheral access.

pub mod hw_init;
