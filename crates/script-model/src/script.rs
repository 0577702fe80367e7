//! Script document types.
//!
//! A script is the JSON document that ties together narration, music, and
//! the ordered scenes of one short video. Upstream tools fill in asset
//! paths; the composer reads it once and writes back `outputVideo` and
//! `actualDuration` after a successful run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scripted scene length used when a scene carries no `duration`.
pub const DEFAULT_SCENE_DURATION_SECS: f64 = 5.0;

/// Top-level script file (`script.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Video title; also the source of the output slug.
    pub title: String,

    /// Editorial style (e.g. `educational`, `hype`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Intended length in seconds, as authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_duration: Option<f64>,

    /// Authored orientation (`portrait` for shorts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,

    /// Mixing configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<MixConfig>,

    /// Full narration block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<Narration>,

    /// Legacy top-level narration audio path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,

    /// Legacy top-level word timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_timestamps: Option<Vec<WordTimestamp>>,

    /// Background music track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_path: Option<PathBuf>,

    /// Ordered scenes.
    pub scenes: Vec<Scene>,

    /// Whether captions should be burned in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<bool>,

    /// Final video written by the last successful composition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_video: Option<PathBuf>,

    /// Measured duration of `output_video` in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_duration: Option<f64>,

    /// Keys this model does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Audio mixing levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixConfig {
    /// Narration gain multiplier.
    #[serde(default = "default_narration_volume")]
    pub narration_volume: f64,

    /// Music gain multiplier.
    #[serde(default = "default_music_volume")]
    pub music_volume: f64,

    /// Prompt the music track was generated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_prompt: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            narration_volume: default_narration_volume(),
            music_volume: default_music_volume(),
            music_prompt: None,
            extra: Map::new(),
        }
    }
}

fn default_narration_volume() -> f64 {
    1.0
}

fn default_music_volume() -> f64 {
    0.15
}

/// Narration block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narration {
    /// Full narration text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Synthesized narration audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,

    /// Word-level timing aligned to `audio_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_timestamps: Option<Vec<WordTimestamp>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One spoken word with its timing in the narration audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    pub word: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WordTimestamp {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
            extra: Map::new(),
        }
    }
}

/// A single scene of the script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// 1-based position in the video.
    pub scene_number: u32,

    /// Scripted length in seconds (an estimate before narration exists).
    #[serde(default = "default_scene_duration")]
    pub duration: f64,

    /// Upstream visual tag (`web`, `generate`, `video`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_type: Option<String>,

    /// Legacy visual tag consulted when `visual_type` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<PathBuf>,

    /// Narration spoken over this scene; only used for scene-level captions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_scene_duration() -> f64 {
    DEFAULT_SCENE_DURATION_SECS
}

/// Canonical visual source of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualType {
    /// A still image animated with pan/zoom motion.
    StaticImage,
    /// A pre-generated video clip.
    VideoClip,
}

impl VisualType {
    /// Canonicalize an upstream tag. Anything that is not a video tag is
    /// treated as a still image.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "video" | "video-clip" | "video_clip" | "videoclip" => VisualType::VideoClip,
            _ => VisualType::StaticImage,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualType::StaticImage => "static-image",
            VisualType::VideoClip => "video-clip",
        }
    }
}

impl std::fmt::Display for VisualType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Scene {
    /// Create a static-image scene with the default duration.
    pub fn new(scene_number: u32) -> Self {
        Self {
            scene_number,
            duration: DEFAULT_SCENE_DURATION_SECS,
            visual_type: None,
            image_source: None,
            image_path: None,
            video_path: None,
            narration: None,
            extra: Map::new(),
        }
    }

    /// Canonical visual type from `visualType`, then `imageSource`.
    pub fn visual_kind(&self) -> VisualType {
        self.visual_type
            .as_deref()
            .or(self.image_source.as_deref())
            .map(VisualType::from_tag)
            .unwrap_or(VisualType::StaticImage)
    }

    /// Trimmed narration text, if any.
    pub fn narration_text(&self) -> Option<&str> {
        self.narration
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

impl Script {
    /// Create an empty script with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            style: None,
            target_duration: None,
            orientation: Some("portrait".to_string()),
            config: None,
            narration: None,
            audio_path: None,
            word_timestamps: None,
            music_path: None,
            scenes: vec![],
            subtitles: None,
            output_video: None,
            actual_duration: None,
            extra: Map::new(),
        }
    }

    /// Scenes sorted by `scene_number`; ties keep document order.
    pub fn ordered_scenes(&self) -> Vec<&Scene> {
        let mut scenes: Vec<&Scene> = self.scenes.iter().collect();
        scenes.sort_by_key(|scene| scene.scene_number);
        scenes
    }

    /// Mixing levels, defaulted when the document has no `config`.
    pub fn mix_config(&self) -> MixConfig {
        self.config.clone().unwrap_or_default()
    }

    /// Narration audio path as written in the document.
    ///
    /// `narration.audioPath` wins over the legacy top-level `audioPath`.
    pub fn narration_audio_path(&self) -> Option<&Path> {
        self.narration
            .as_ref()
            .and_then(|n| n.audio_path.as_deref())
            .or(self.audio_path.as_deref())
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Word timestamps, nested location first. Empty lists count as absent.
    pub fn word_timestamps(&self) -> Option<&[WordTimestamp]> {
        self.narration
            .as_ref()
            .and_then(|n| n.word_timestamps.as_deref())
            .filter(|words| !words.is_empty())
            .or_else(|| {
                self.word_timestamps
                    .as_deref()
                    .filter(|words| !words.is_empty())
            })
    }

    /// Music path as written in the document.
    pub fn music_path(&self) -> Option<&Path> {
        self.music_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Whether the document asks for burned-in captions.
    pub fn subtitles_requested(&self) -> bool {
        self.subtitles.unwrap_or(false)
    }

    /// Sum of scripted scene durations.
    pub fn scripted_total_secs(&self) -> f64 {
        self.scenes.iter().map(|scene| scene.duration).sum()
    }

    /// Full narration text: `narration.text`, or the scene narrations joined.
    pub fn narration_text(&self) -> String {
        if let Some(text) = self
            .narration
            .as_ref()
            .and_then(|n| n.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
        {
            return text.to_string();
        }

        self.ordered_scenes()
            .into_iter()
            .filter_map(Scene::narration_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Estimated narration length from word count at the given speaking rate.
    pub fn estimated_narration_secs(&self, words_per_second: f64) -> f64 {
        if words_per_second <= 0.0 {
            return 0.0;
        }
        self.narration_text().split_whitespace().count() as f64 / words_per_second
    }

    /// Record the result of a successful composition.
    pub fn record_result(&mut self, output_video: PathBuf, actual_duration: f64) {
        self.output_video = Some(output_video);
        self.actual_duration = Some(actual_duration);
    }
}

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Composition cannot succeed.
    Blocking,
    /// Composition proceeds in a degraded or surprising way.
    Warning,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptIssue {
    pub severity: IssueSeverity,
    pub message: String,
}

impl ScriptIssue {
    fn blocking(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Blocking,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == IssueSeverity::Blocking
    }
}

impl std::fmt::Display for ScriptIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            IssueSeverity::Blocking => write!(f, "[error] {}", self.message),
            IssueSeverity::Warning => write!(f, "[warn] {}", self.message),
        }
    }
}

/// A script together with the file it was read from.
#[derive(Debug, Clone)]
pub struct LoadedScript {
    /// Path of the script document.
    pub path: PathBuf,

    /// Parsed document.
    pub script: Script,
}

impl LoadedScript {
    /// Load a script document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref().to_path_buf();
        let json = std::fs::read_to_string(&path).map_err(|e| ScriptError::IoError {
            path: path.clone(),
            source: e,
        })?;
        let script: Script =
            serde_json::from_str(&json).map_err(|e| ScriptError::ParseError {
                path: path.clone(),
                source: e,
            })?;
        Ok(Self { path, script })
    }

    /// Write the document back atomically (temp file, then rename).
    pub fn save(&self) -> Result<(), ScriptError> {
        let json =
            serde_json::to_string_pretty(&self.script).map_err(|e| ScriptError::ParseError {
                path: self.path.clone(),
                source: e,
            })?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        std::fs::write(&tmp_path, json + "\n").map_err(|e| ScriptError::IoError {
            path: tmp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| ScriptError::IoError {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Directory containing the script document.
    pub fn base_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Resolve an asset path: as written if it exists (or is absolute),
    /// otherwise relative to the script's directory.
    pub fn resolve_asset(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            return path.to_path_buf();
        }
        let candidate = self.base_dir().join(path);
        if candidate.exists() {
            candidate
        } else {
            path.to_path_buf()
        }
    }

    /// Resolved asset path, only if the file exists.
    pub fn existing_asset(&self, path: Option<&Path>) -> Option<PathBuf> {
        path.filter(|p| !p.as_os_str().is_empty())
            .map(|p| self.resolve_asset(p))
            .filter(|p| p.is_file())
    }

    /// Narration audio on disk.
    pub fn narration_audio(&self) -> Option<PathBuf> {
        self.existing_asset(self.script.narration_audio_path())
    }

    /// Music track on disk.
    pub fn music(&self) -> Option<PathBuf> {
        self.existing_asset(self.script.music_path())
    }

    /// Check structure and referenced assets.
    pub fn validate(&self) -> Vec<ScriptIssue> {
        let script = &self.script;
        let mut issues = vec![];

        if script.title.trim().is_empty() {
            issues.push(ScriptIssue::warning("Title is empty; output will be named 'short'"));
        }

        if script.scenes.is_empty() {
            issues.push(ScriptIssue::blocking("Script has no scenes"));
        }

        let ordered = script.ordered_scenes();
        for (idx, scene) in ordered.iter().enumerate() {
            let expected = idx as u32 + 1;
            if scene.scene_number != expected {
                issues.push(ScriptIssue::warning(format!(
                    "Scene numbering is not contiguous: expected {expected}, found {}",
                    scene.scene_number
                )));
                break;
            }
        }

        for scene in &ordered {
            if !scene.duration.is_finite() || scene.duration <= 0.0 {
                issues.push(ScriptIssue::warning(format!(
                    "Scene {} has non-positive duration {}",
                    scene.scene_number, scene.duration
                )));
            }
        }

        if !script.scenes.is_empty() && script.scripted_total_secs() <= 0.0 {
            issues.push(ScriptIssue::warning(
                "Scripted durations sum to zero; scenes will not be rescaled",
            ));
        }

        let mut renderable = 0usize;
        for scene in &ordered {
            let has_image = self.existing_asset(scene.image_path.as_deref()).is_some();
            let has_video = self.existing_asset(scene.video_path.as_deref()).is_some();
            match scene.visual_kind() {
                VisualType::VideoClip if !has_video && has_image => {
                    issues.push(ScriptIssue::warning(format!(
                        "Scene {} video missing; still image will be animated instead",
                        scene.scene_number
                    )));
                }
                _ => {}
            }
            if has_image || (has_video && scene.visual_kind() == VisualType::VideoClip) {
                renderable += 1;
            } else {
                issues.push(ScriptIssue::warning(format!(
                    "Scene {} has no usable {} asset and will be skipped",
                    scene.scene_number,
                    scene.visual_kind()
                )));
            }
        }
        if !script.scenes.is_empty() && renderable == 0 {
            issues.push(ScriptIssue::blocking("No scene has a usable asset"));
        }

        match script.narration_audio_path() {
            None => issues.push(ScriptIssue::blocking("Narration audio path is not set")),
            Some(path) if self.narration_audio().is_none() => {
                issues.push(ScriptIssue::blocking(format!(
                    "Narration audio missing: {}",
                    path.display()
                )));
            }
            Some(_) => {}
        }

        if let Some(path) = script.music_path() {
            if self.music().is_none() {
                issues.push(ScriptIssue::warning(format!(
                    "Music missing: {}; narration will play alone",
                    path.display()
                )));
            }
        }

        if let Some(words) = script.word_timestamps() {
            if let Some(message) = word_timeline_problem(words) {
                issues.push(ScriptIssue::warning(message));
            }
        }

        issues
    }
}

/// First ordering problem in a word timeline, if any.
pub fn word_timeline_problem(words: &[WordTimestamp]) -> Option<String> {
    for (idx, word) in words.iter().enumerate() {
        if word.end < word.start {
            return Some(format!(
                "Word {idx} ('{}') ends before it starts ({:.3} < {:.3})",
                word.word, word.end, word.start
            ));
        }
        if let Some(prev) = idx.checked_sub(1).map(|i| &words[i]) {
            if word.start + 1e-6 < prev.end {
                return Some(format!(
                    "Word {idx} ('{}') overlaps the previous word ({:.3} < {:.3})",
                    word.word, word.start, prev.end
                ));
            }
        }
    }
    None
}

/// Errors that can occur when reading or writing scripts.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}
