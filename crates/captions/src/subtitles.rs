//! Subtitle generation in SRT and ASS formats.
//!
//! Both formats are rendered from the same cue list and share one rounding
//! step, so a cue boundary never differs between the two files by more than
//! the ASS centisecond truncation.

use std::path::{Path, PathBuf};

use reelsmith_common::error::ReelResult;

use crate::cues::{CaptionCue, CaptionTrack};
use crate::style::AssStyle;

/// A cue boundary rounded to whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timecode {
    pub millis: u64,
}

impl Timecode {
    pub fn from_secs(secs: f64) -> Self {
        let millis = if secs.is_finite() && secs > 0.0 {
            (secs * 1000.0).round() as u64
        } else {
            0
        };
        Self { millis }
    }

    /// `HH:MM:SS,mmm`
    pub fn srt(&self) -> String {
        let hours = self.millis / 3_600_000;
        let minutes = (self.millis % 3_600_000) / 60_000;
        let seconds = (self.millis % 60_000) / 1000;
        let millis = self.millis % 1000;
        format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
    }

    /// `H:MM:SS.cc`
    pub fn ass(&self) -> String {
        let hours = self.millis / 3_600_000;
        let minutes = (self.millis % 3_600_000) / 60_000;
        let seconds = (self.millis % 60_000) / 1000;
        let centis = (self.millis % 1000) / 10;
        format!("{hours}:{minutes:02}:{seconds:02}.{centis:02}")
    }
}

/// Generate SRT subtitle content.
pub fn generate_srt(cues: &[CaptionCue]) -> String {
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            Timecode::from_secs(cue.start_secs).srt(),
            Timecode::from_secs(cue.end_secs).srt(),
        ));
        output.push_str(&cue.lines.join("\n"));
        output.push_str("\n\n");
    }

    output
}

/// Generate ASS subtitle content for a `width`x`height` frame.
pub fn generate_ass(cues: &[CaptionCue], style: &AssStyle, width: u32, height: u32) -> String {
    let mut output = String::new();

    output.push_str("[Script Info]\n");
    output.push_str("Title: Reelsmith captions\n");
    output.push_str("ScriptType: v4.00+\n");
    output.push_str(&format!("PlayResX: {width}\n"));
    output.push_str(&format!("PlayResY: {height}\n"));
    output.push_str("WrapStyle: 0\n\n");

    output.push_str("[V4+ Styles]\n");
    output.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    output.push_str(&style.style_line());
    output.push_str("\n\n");

    output.push_str("[Events]\n");
    output.push_str(
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
    );
    for cue in cues {
        let text = cue
            .lines
            .iter()
            .map(|line| escape_ass_text(line))
            .collect::<Vec<_>>()
            .join("\\N");
        output.push_str(&format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
            Timecode::from_secs(cue.start_secs).ass(),
            Timecode::from_secs(cue.end_secs).ass(),
            text,
        ));
    }

    output
}

/// Word joiner placed after a backslash so `\N`, `\n` and `\h` in the
/// narration render literally instead of as line breaks or hard spaces.
const BACKSLASH_GUARD: char = '\u{2060}';

/// Neutralize ASS markup in caption text.
///
/// Braces open override blocks and have no escape, so `{` and `}` are
/// rewritten as `(` and `)`. Backslashes are kept, followed by a word joiner.
fn escape_ass_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '{' => escaped.push('('),
            '}' => escaped.push(')'),
            '\\' => {
                escaped.push('\\');
                escaped.push(BACKSLASH_GUARD);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Paths of a written caption pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionFiles {
    pub srt: PathBuf,
    pub ass: PathBuf,
}

/// Write the track as both SRT and ASS.
pub fn save_captions(
    track: &CaptionTrack,
    srt_path: &Path,
    ass_path: &Path,
    width: u32,
    height: u32,
) -> ReelResult<CaptionFiles> {
    let style = AssStyle::for_mode(track.mode);

    std::fs::write(srt_path, generate_srt(&track.cues))?;
    std::fs::write(ass_path, generate_ass(&track.cues, &style, width, height))?;

    tracing::debug!(
        cues = track.cues.len(),
        mode = track.mode.as_str(),
        srt = %srt_path.display(),
        ass = %ass_path.display(),
        "Wrote caption files"
    );

    Ok(CaptionFiles {
        srt: srt_path.to_path_buf(),
        ass: ass_path.to_path_buf(),
    })
}
