//! Utils Module - Shared Utilities
//!
//! Response cache, constants tables and telemetry counters used across
//! the whole application.

pub mod cache;
pub mod constants;
pub mod telemetry;

pub use cache::*;
pub use constants::*;
pub use telemetry::*;
