//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Canonical output profile every clip is normalized to.
    pub profile: OutputProfile,

    /// Caption generation parameters.
    pub captions: CaptionSettings,

    /// Job-level composition behavior.
    pub compose: ComposeSettings,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Canonical frame and encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputProfile {
    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// ffmpeg video encoder name.
    pub video_codec: String,

    /// Pixel format passed to the encoder.
    pub pixel_format: String,

    /// x264 preset.
    pub preset: String,

    /// Constant rate factor.
    pub crf: u32,

    /// AAC bitrate for the mixed audio track.
    pub audio_bitrate_kbps: u32,
}

/// Caption chunking and wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Words per word-synced caption chunk.
    pub words_per_chunk: usize,

    /// Scene-level captions longer than this (in characters) are wrapped
    /// onto two lines.
    pub wrap_threshold_chars: usize,
}

/// Job-level composition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeSettings {
    /// Minimum number of scenes that must render for the job to continue.
    pub min_rendered_scenes: usize,

    /// Keep the scratch directory after a successful job.
    pub keep_scratch: bool,

    /// Speaking rate used to estimate narration length from word counts.
    pub words_per_second: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelsmith=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for OutputProfile {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 25,
            video_codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            preset: "medium".to_string(),
            crf: 23,
            audio_bitrate_kbps: 192,
        }
    }
}

impl OutputProfile {
    /// Whether the frame is taller than it is wide.
    pub fn is_vertical(&self) -> bool {
        self.height > self.width
    }

    /// Human-readable aspect label, e.g. `9:16 vertical`.
    pub fn aspect_label(&self) -> String {
        let divisor = gcd(self.width, self.height).max(1);
        let orientation = if self.is_vertical() {
            "vertical"
        } else if self.width == self.height {
            "square"
        } else {
            "horizontal"
        };
        format!(
            "{}:{} {orientation}",
            self.width / divisor,
            self.height / divisor
        )
    }

    /// Check the profile is usable before any media work starts.
    pub fn validate(&self) -> Result<(), crate::error::ReelError> {
        if self.width == 0 || self.height == 0 {
            return Err(crate::error::ReelError::Config {
                message: format!("invalid output size {}x{}", self.width, self.height),
            });
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(crate::error::ReelError::Config {
                message: format!(
                    "output size {}x{} must be even for {}",
                    self.width, self.height, self.pixel_format
                ),
            });
        }
        if self.fps == 0 {
            return Err(crate::error::ReelError::Config {
                message: "output fps must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            words_per_chunk: 3,
            wrap_threshold_chars: 40,
        }
    }
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            min_rendered_scenes: 1,
            keep_scratch: false,
            words_per_second: 2.5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    ///
    /// Runs before logging is set up, so a problem with the file is handed
    /// back for the caller to report instead of being logged here.
    pub fn load() -> (Self, Option<String>) {
        Self::load_from(&config_file_path())
    }

    /// Load config from `path`; a missing file yields defaults silently.
    pub fn load_from(path: &Path) -> (Self, Option<String>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => (config, None),
                Err(e) => (
                    Self::default(),
                    Some(format!(
                        "Failed to parse config at {}: {e}; using defaults",
                        path.display()
                    )),
                ),
            },
            Err(e) => (
                Self::default(),
                Some(format!(
                    "Failed to read config at {}: {e}; using defaults",
                    path.display()
                )),
            ),
        }
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelsmith").join("config.json")
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
