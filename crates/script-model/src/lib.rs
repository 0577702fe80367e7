//! Reelsmith Script Model
//!
//! Defines the data contracts read by the composition engine:
//! - **Script:** Top-level document (title, narration, music, scenes, results)
//! - **Scene:** One narrated segment with its visual source and scripted duration
//! - **WordTimestamp:** Time-aligned words for word-synced captions
//! - **Layout:** Slug and output-directory derivation for finished artifacts
//!
//! Scripts are written by upstream tools, so every struct keeps unknown keys
//! and writes them back untouched.

pub mod layout;
pub mod script;

pub use layout::*;
pub use script::*;
