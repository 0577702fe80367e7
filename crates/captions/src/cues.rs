//! Caption cue construction.
//!
//! Two strategies produce the same [`CaptionCue`] list:
//! - scene-level: one cue per narrated scene, timed by a running offset over
//!   the scaled scene durations
//! - word-synced: fixed-size chunks of narration word timestamps

use reelsmith_script_model::WordTimestamp;
use serde::Serialize;

/// Which timing strategy produced a caption track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionMode {
    /// Timed from scaled scene durations.
    SceneLevel,
    /// Timed from narration word timestamps.
    WordSynced,
}

impl CaptionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionMode::SceneLevel => "scene-level",
            CaptionMode::WordSynced => "word-synced",
        }
    }
}

/// A single caption with timing in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionCue {
    /// Start time in seconds.
    pub start_secs: f64,
    /// End time in seconds.
    pub end_secs: f64,
    /// Display lines, top to bottom.
    pub lines: Vec<String>,
}

impl CaptionCue {
    /// Text with line breaks flattened to spaces.
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

/// A scene as seen by the scene-level strategy.
#[derive(Debug, Clone, Copy)]
pub struct NarratedSpan<'a> {
    /// Narration for the scene, if any.
    pub text: Option<&'a str>,
    /// Scaled scene duration in seconds.
    pub duration_secs: f64,
}

/// A complete caption track.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub mode: CaptionMode,
    pub cues: Vec<CaptionCue>,
}

impl CaptionTrack {
    /// Word-synced track when timestamps exist, scene-level otherwise.
    pub fn build(
        words: Option<&[WordTimestamp]>,
        spans: &[NarratedSpan<'_>],
        total_secs: f64,
        words_per_chunk: usize,
        wrap_threshold_chars: usize,
    ) -> Self {
        match words.filter(|w| !w.is_empty()) {
            Some(words) => Self {
                mode: CaptionMode::WordSynced,
                cues: word_synced_cues(words, words_per_chunk),
            },
            None => Self {
                mode: CaptionMode::SceneLevel,
                cues: scene_level_cues(spans, total_secs, wrap_threshold_chars),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// One cue per scene with narration, timed by a running offset.
///
/// Scenes without narration advance the offset without emitting a cue.
/// Cue boundaries are clamped to `total_secs`.
pub fn scene_level_cues(
    spans: &[NarratedSpan<'_>],
    total_secs: f64,
    wrap_threshold_chars: usize,
) -> Vec<CaptionCue> {
    let total = total_secs.max(0.0);
    let mut cues = Vec::new();
    let mut offset = 0.0f64;

    for span in spans {
        let start = offset.min(total);
        offset += span.duration_secs.max(0.0);
        let end = offset.min(total);

        let Some(text) = span.text.map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        if end <= start {
            continue;
        }

        cues.push(CaptionCue {
            start_secs: start,
            end_secs: end,
            lines: wrap_at_midpoint(text, wrap_threshold_chars),
        });
    }

    cues
}

/// Group words into chunks of `words_per_chunk`.
///
/// A chunk starts at its first word's start and ends at its last word's end.
pub fn word_synced_cues(words: &[WordTimestamp], words_per_chunk: usize) -> Vec<CaptionCue> {
    words
        .chunks(words_per_chunk.max(1))
        .filter_map(|chunk| {
            let first = chunk.first()?;
            let last = chunk.last()?;
            let text = chunk
                .iter()
                .map(|w| w.word.trim())
                .collect::<Vec<_>>()
                .join(" ");
            Some(CaptionCue {
                start_secs: first.start,
                end_secs: last.end,
                lines: vec![text],
            })
        })
        .collect()
}

/// Split text longer than `threshold` characters into two lines at the
/// middle word boundary.
pub fn wrap_at_midpoint(text: &str, threshold: usize) -> Vec<String> {
    if text.chars().count() <= threshold {
        return vec![text.to_string()];
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let mid = words.len() / 2;
    if mid == 0 {
        return vec![text.to_string()];
    }

    vec![words[..mid].join(" "), words[mid..].join(" ")]
}
