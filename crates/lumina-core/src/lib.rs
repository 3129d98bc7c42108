//! Lumina Core
//!
//! Shared utilities for the Lumina font crates: hash collections, logging setup,
//! profiling scopes and math types.

pub mod alloc;
pub mod logging;
pub mod math;
pub mod profiling;
