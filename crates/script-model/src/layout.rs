//! Output naming and directory layout.
//!
//! Scripts live under an `INPUT` tree and finished artifacts under the
//! mirrored `OUTPUT` tree:
//!
//! ```text
//! content/INPUT/octopus/script.json
//! content/OUTPUT/octopus/video/why-octopuses-are-weird.mp4
//! content/OUTPUT/octopus/video/why-octopuses-are-weird.srt
//! content/OUTPUT/octopus/video/why-octopuses-are-weird.ass
//! ```

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Maximum slug length in characters.
pub const MAX_SLUG_CHARS: usize = 60;

/// Slug used when a title yields no usable characters.
pub const FALLBACK_SLUG: &str = "short";

/// Convert a title into a filename-safe slug.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_dash = false;

    for ch in lowered.chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        } else if ch.is_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        }
    }

    let truncated: String = slug.chars().take(MAX_SLUG_CHARS).collect();
    let trimmed = truncated.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Where a script's finished artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Output root mirrored from the script's directory.
    pub root: PathBuf,

    /// Directory holding the final video and captions.
    pub video_dir: PathBuf,

    /// Filename stem shared by every artifact.
    pub slug: String,
}

impl OutputLayout {
    /// Derive the layout for a script path and title.
    pub fn for_script(script_path: &Path, title: &str) -> std::io::Result<Self> {
        let absolute = if script_path.is_absolute() {
            script_path.to_path_buf()
        } else {
            std::env::current_dir()?.join(script_path)
        };
        let script_dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        let root = mirror_output_dir(&script_dir);
        Ok(Self {
            video_dir: root.join("video"),
            root,
            slug: slugify(title),
        })
    }

    /// Final video path.
    pub fn final_video(&self) -> PathBuf {
        self.video_dir.join(format!("{}.mp4", self.slug))
    }

    /// SRT caption path.
    pub fn srt_path(&self) -> PathBuf {
        self.video_dir.join(format!("{}.srt", self.slug))
    }

    /// ASS caption path.
    pub fn ass_path(&self) -> PathBuf {
        self.video_dir.join(format!("{}.ass", self.slug))
    }
}

/// Map a script directory to its output directory.
///
/// The first `INPUT` component that has something after it becomes
/// `OUTPUT`; otherwise the output is `<parent>/OUTPUT/<dir-name>`.
pub fn mirror_output_dir(script_dir: &Path) -> PathBuf {
    let components: Vec<Component<'_>> = script_dir.components().collect();
    let input_idx = components
        .iter()
        .take(components.len().saturating_sub(1))
        .position(|c| c.as_os_str() == OsStr::new("INPUT"));

    if let Some(idx) = input_idx {
        let mut out = PathBuf::new();
        for (i, component) in components.iter().enumerate() {
            if i == idx {
                out.push("OUTPUT");
            } else {
                out.push(component.as_os_str());
            }
        }
        return out;
    }

    let name = script_dir
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    let parent = script_dir.parent().unwrap_or(script_dir);
    parent.join("OUTPUT").join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify_basic_title() {
        assert_eq!(slugify("Why Octopuses Are Weird!"), "why-octopuses-are-weird");
        assert_eq!(slugify("  AI -- in   2025?  "), "ai-in-2025");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn test_slugify_falls_back_when_empty() {
        assert_eq!(slugify("!!!"), FALLBACK_SLUG);
        assert_eq!(slugify(""), FALLBACK_SLUG);
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "word ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.chars().count() <= MAX_SLUG_CHARS);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_mirror_replaces_input_segment() {
        assert_eq!(
            mirror_output_dir(Path::new("/work/INPUT/octopus")),
            PathBuf::from("/work/OUTPUT/octopus")
        );
        assert_eq!(
            mirror_output_dir(Path::new("/work/INPUT/a/INPUT/b")),
            PathBuf::from("/work/OUTPUT/a/INPUT/b")
        );
    }

    #[test]
    fn test_mirror_without_input_segment_uses_sibling() {
        assert_eq!(
            mirror_output_dir(Path::new("/work/octopus")),
            PathBuf::from("/work/OUTPUT/octopus")
        );
        assert_eq!(
            mirror_output_dir(Path::new("/work/INPUT")),
            PathBuf::from("/work/OUTPUT/INPUT")
        );
    }

    #[test]
    fn test_layout_paths_share_slug() {
        let layout =
            OutputLayout::for_script(Path::new("/w/INPUT/x/script.json"), "Hello World").unwrap();
        assert_eq!(layout.video_dir, PathBuf::from("/w/OUTPUT/x/video"));
        assert_eq!(layout.final_video(), PathBuf::from("/w/OUTPUT/x/video/hello-world.mp4"));
        assert_eq!(layout.srt_path(), PathBuf::from("/w/OUTPUT/x/video/hello-world.srt"));
        assert_eq!(layout.ass_path(), PathBuf::from("/w/OUTPUT/x/video/hello-world.ass"));
    }

    proptest! {
        #[test]
        fn prop_slug_is_filename_safe(title in ".{0,120}") {
            let slug = slugify(&title);
            prop_assert!(!slug.is_empty());
            prop_assert!(slug.chars().count() <= MAX_SLUG_CHARS);
            prop_assert!(!slug.contains('/'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        }
    }
}
