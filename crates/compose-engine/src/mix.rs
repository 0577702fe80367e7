//! Audio mixing decisions.

use std::path::PathBuf;

use serde::Serialize;

use crate::transform::MusicBed;

/// Which audio tracks end up in the final video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    NarrationOnly,
    NarrationWithMusic,
}

impl AudioMode {
    pub fn label(&self) -> &'static str {
        match self {
            AudioMode::NarrationOnly => "narration",
            AudioMode::NarrationWithMusic => "narration + music",
        }
    }
}

/// Music bed to mix, or `None` for narration-only.
///
/// A missing file or `--no-music` both mean narration-only; neither is an
/// error.
pub fn select_music(music: Option<PathBuf>, no_music: bool, volume: f64) -> Option<MusicBed> {
    if no_music {
        return None;
    }
    music.map(|path| MusicBed { path, volume })
}

/// `-filter_complex` graph mixing narration (input 1) with music (input 2).
///
/// Narration governs the length; input normalization is disabled so the
/// volumes are the effective gains.
pub fn mix_filter(narration_volume: f64, music_volume: f64) -> String {
    format!(
        "[1:a]volume={narration_volume}[narr];\
         [2:a]volume={music_volume}[music];\
         [narr][music]amix=inputs=2:duration=first:normalize=0,\
         aformat=channel_layouts=stereo[aout]"
    )
}
