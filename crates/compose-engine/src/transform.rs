//! The media-transform seam.
//!
//! The pipeline only decides *what* to transcode; a [`MediaTransform`]
//! decides *how*. Tests drive the pipeline with a recording fake.

use std::path::{Path, PathBuf};

use reelsmith_common::error::ReelResult;

use crate::kenburns::KenBurnsMotion;

/// Background music and the gain applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicBed {
    pub path: PathBuf,
    pub volume: f64,
}

/// One media operation with all of its inputs resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOp {
    /// Animate a still image into a clip of exactly `frames` frames.
    KenBurns {
        image: PathBuf,
        motion: KenBurnsMotion,
        frames: u64,
        output: PathBuf,
    },

    /// Reproject a video clip onto the canonical frame and conform it to
    /// exactly `frames` frames, holding the last frame if the source is short.
    NormalizeClip {
        input: PathBuf,
        frames: u64,
        output: PathBuf,
    },

    /// Stream-copy the clips named in a concat list file.
    Concat { list_file: PathBuf, output: PathBuf },

    /// Mux narration (and optionally music) onto a silent video.
    MixAudio {
        video: PathBuf,
        narration: PathBuf,
        narration_volume: f64,
        music: Option<MusicBed>,
        output: PathBuf,
    },

    /// Burn an ASS subtitle file into the picture.
    BurnSubtitles {
        video: PathBuf,
        subtitles: PathBuf,
        output: PathBuf,
    },
}

impl TransformOp {
    /// File this operation writes.
    pub fn output(&self) -> &Path {
        match self {
            TransformOp::KenBurns { output, .. }
            | TransformOp::NormalizeClip { output, .. }
            | TransformOp::Concat { output, .. }
            | TransformOp::MixAudio { output, .. }
            | TransformOp::BurnSubtitles { output, .. } => output,
        }
    }

    /// Short stage name used in errors and logs.
    pub fn stage(&self) -> &'static str {
        match self {
            TransformOp::KenBurns { .. } => "ken-burns",
            TransformOp::NormalizeClip { .. } => "normalize",
            TransformOp::Concat { .. } => "concat",
            TransformOp::MixAudio { .. } => "audio mix",
            TransformOp::BurnSubtitles { .. } => "subtitle burn",
        }
    }
}

/// Trait for media backends (ffmpeg, test fakes, ...).
pub trait MediaTransform: Send {
    /// Run one operation to completion.
    fn apply(&mut self, op: &TransformOp) -> ReelResult<()>;

    /// Measured duration of a media file in seconds.
    fn probe_duration(&mut self, path: &Path) -> ReelResult<f64>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_and_stage() {
        let op = TransformOp::Concat {
            list_file: PathBuf::from("/s/concat.txt"),
            output: PathBuf::from("/s/combined.mp4"),
        };
        assert_eq!(op.output(), Path::new("/s/combined.mp4"));
        assert_eq!(op.stage(), "concat");

        let op = TransformOp::BurnSubtitles {
            video: PathBuf::from("a.mp4"),
            subtitles: PathBuf::from("a.ass"),
            output: PathBuf::from("b.mp4"),
        };
        assert_eq!(op.stage(), "subtitle burn");
    }
}
