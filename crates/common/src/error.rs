//! Error types shared across Reelsmith crates.

use std::path::PathBuf;

/// Top-level error type for Reelsmith operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    #[error("Script error: {message}")]
    Script { message: String },

    #[error("Timing error: {message}")]
    Timing { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Caption error: {message}")]
    Caption { message: String },

    #[error("{stage} failed: {message}")]
    Transform { stage: String, message: String },

    #[error("Narration audio not found: {}", path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<not set>".to_string()))]
    MissingNarration { path: Option<PathBuf> },

    #[error("No clips created: {message}")]
    NoClips { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using ReelError.
pub type ReelResult<T> = Result<T, ReelError>;

impl ReelError {
    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script {
            message: msg.into(),
        }
    }

    pub fn timing(msg: impl Into<String>) -> Self {
        Self::Timing {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn caption(msg: impl Into<String>) -> Self {
        Self::Caption {
            message: msg.into(),
        }
    }

    pub fn transform(stage: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transform {
            stage: stage.into(),
            message: msg.into(),
        }
    }

    pub fn no_clips(msg: impl Into<String>) -> Self {
        Self::NoClips {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}
