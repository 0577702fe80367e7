//! ASS styles for burned-in captions.

use crate::cues::CaptionMode;

/// Style parameters written into the `[V4+ Styles]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct AssStyle {
    pub font_name: String,
    pub font_size: u32,
    /// Outline thickness in pixels.
    pub outline: u32,
    pub margin_left: u32,
    pub margin_right: u32,
    /// Distance from the bottom edge in pixels.
    pub margin_vertical: u32,
}

impl AssStyle {
    /// Modest bottom-centered text for one cue per scene.
    pub fn scene_level() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 48,
            outline: 3,
            margin_left: 40,
            margin_right: 40,
            margin_vertical: 120,
        }
    }

    /// Large bold chunks raised above the lower-third UI of short-form players.
    pub fn word_synced() -> Self {
        Self {
            font_name: "Raleway".to_string(),
            font_size: 140,
            outline: 8,
            margin_left: 60,
            margin_right: 60,
            margin_vertical: 450,
        }
    }

    pub fn for_mode(mode: CaptionMode) -> Self {
        match mode {
            CaptionMode::SceneLevel => Self::scene_level(),
            CaptionMode::WordSynced => Self::word_synced(),
        }
    }

    /// The `Style:` line. White bold text, black outline, translucent shadow,
    /// bottom-center alignment.
    pub fn style_line(&self) -> String {
        format!(
            "Style: Default,{},{},&H00FFFFFF,&H000000FF,&H00000000,&H80000000,-1,0,0,0,100,100,0,0,1,{},1,2,{},{},{},1",
            self.font_name,
            self.font_size,
            self.outline,
            self.margin_left,
            self.margin_right,
            self.margin_vertical,
        )
    }
}
