//! Concat demuxer list files.

use std::path::{Path, PathBuf};

use reelsmith_common::error::ReelResult;

/// Escape a path for a single-quoted concat list entry.
pub fn escape_list_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

/// Concat list with one `file '<path>'` line per clip, in order.
pub fn concat_list(clips: &[PathBuf]) -> String {
    clips
        .iter()
        .map(|clip| format!("file '{}'\n", escape_list_path(clip)))
        .collect()
}

/// Write the concat list for `clips` to `list_file`.
///
/// Relative clip paths are made absolute so the list does not depend on
/// where ffmpeg resolves it from.
pub fn write_concat_list(clips: &[PathBuf], list_file: &Path) -> ReelResult<()> {
    let cwd = std::env::current_dir()?;
    let absolute: Vec<PathBuf> = clips
        .iter()
        .map(|clip| {
            if clip.is_absolute() {
                clip.clone()
            } else {
                cwd.join(clip)
            }
        })
        .collect();
    std::fs::write(list_file, concat_list(&absolute))?;
    Ok(())
}
