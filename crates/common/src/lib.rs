//! Reelsmith Common Utilities
//!
//! Shared infrastructure for all Reelsmith crates:
//! - Error types and result aliases
//! - Frame clock for converting between seconds and whole frames
//! - Tracing/logging initialization
//! - Configuration loading (output profile, caption and compose settings)

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
