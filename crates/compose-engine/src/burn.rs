//! Subtitle burn-in filter construction.

use std::path::Path;

/// Escape a path for use inside a single-quoted filtergraph argument.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\'', "'\\''")
        .replace(':', "\\:")
}

/// `-vf` value that composites an ASS file onto the picture.
pub fn ass_filter(subtitles: &Path) -> String {
    format!("ass='{}'", escape_filter_path(subtitles))
}
