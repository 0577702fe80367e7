//! Reelsmith Captions
//!
//! Caption tracks for short-form video:
//! - **Cues:** Scene-level timing from scaled scene durations, or word-synced
//!   chunks from narration word timestamps
//! - **Styles:** ASS styles for each caption mode
//! - **Subtitles:** SRT and ASS output rendered from one cue list, so both
//!   files agree on every boundary

pub mod cues;
pub mod style;
pub mod subtitles;

pub use cues::*;
pub use style::*;
pub use subtitles::*;
