//! Adapter implementations of the planning ports.

pub mod memory;
