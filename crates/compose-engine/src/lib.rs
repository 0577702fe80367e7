//! Reelsmith Compose Engine
//!
//! Offline pipeline that turns a script document plus its narration,
//! music, and per-scene assets into one vertical short-form video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! narration.mp3 ── probe ──► scale scripted durations
//!                                   │
//! scene images ── Ken Burns ──┐     │
//!                             ├── clip-NNN.mp4 (canonical frame, fps, codec)
//! scene videos ── normalize ──┘     │
//!                                   ▼
//!                            Concat (stream copy)
//!                                   │
//! narration + music ────────► Audio Mix (AAC)
//!                                   │
//! script.json ── captions ──► .srt / .ass
//!                                   │
//!                                   ├── Subtitle Burn (optional)
//!                                   ▼
//!                              <slug>.mp4
//! ```
//!
//! Every media transform runs through the [`MediaTransform`] seam; the
//! shipped backend shells out to ffmpeg and ffprobe.

pub mod burn;
pub mod clip;
pub mod concat;
pub mod ffmpeg;
pub mod kenburns;
pub mod mix;
pub mod pipeline;
pub mod scratch;
pub mod timing;
pub mod transform;

pub use ffmpeg::FfmpegBackend;
pub use kenburns::KenBurnsMotion;
pub use pipeline::*;
pub use timing::{SceneTiming, TimelinePlan};
pub use transform::{MediaTransform, MusicBed, TransformOp};
