//! Per-user rename settings document.

use serde::{Deserialize, Serialize};

use crate::core::MediaKind;

/// Preferred upload kind for renamed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaPreference {
    Document,
    Video,
}

impl MediaPreference {
    /// Parse user input from /setmedia.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "document" | "doc" | "file" => Some(Self::Document),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn as_media_kind(self) -> MediaKind {
        match self {
            Self::Document => MediaKind::Document,
            Self::Video => MediaKind::Video,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Video => "video",
        }
    }
}

/// Where season/episode/quality markers are scanned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameMode {
    #[default]
    Filename,
    Caption,
}

impl RenameMode {
    /// Parse user input from /mode.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "filename" | "file" => Some(Self::Filename),
            "caption" => Some(Self::Caption),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::Caption => "caption",
        }
    }
}

/// MongoDB document holding everything the bot knows about one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    /// Telegram user ID.
    pub user_id: u64,

    /// Rename template with `[SE.NUM]`/`[EP.NUM]`/`[QUALITY]` tokens.
    #[serde(default)]
    pub format_template: Option<String>,

    /// Preferred upload kind for output files.
    #[serde(default)]
    pub media_preference: Option<MediaPreference>,

    /// Marker scan source (filename or caption).
    #[serde(default)]
    pub rename_mode: RenameMode,

    /// Fixed caption attached to renamed output. `{filename}` expands
    /// to the new name.
    #[serde(default)]
    pub caption: Option<String>,

    /// Telegram file_id of the saved thumbnail photo.
    #[serde(default)]
    pub thumbnail_file_id: Option<String>,

    /// Whether ffmpeg metadata embedding is on.
    #[serde(default)]
    pub metadata_enabled: bool,

    #[serde(default)]
    pub metadata_title: Option<String>,

    #[serde(default)]
    pub metadata_author: Option<String>,

    /// Banned users are rejected at the router.
    #[serde(default)]
    pub banned: bool,

    /// Completed sequence batches.
    #[serde(default)]
    pub sequence_count: u64,

    /// Unix timestamp of the last completed sequence.
    #[serde(default)]
    pub last_sequence_at: Option<i64>,

    /// Unix timestamp of the last settings change.
    #[serde(default)]
    pub updated_at: i64,
}

impl UserSettings {
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            format_template: None,
            media_preference: None,
            rename_mode: RenameMode::default(),
            caption: None,
            thumbnail_file_id: None,
            metadata_enabled: false,
            metadata_title: None,
            metadata_author: None,
            banned: false,
            sequence_count: 0,
            last_sequence_at: None,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Refresh the change timestamp before saving.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_media_preference() {
        assert_eq!(MediaPreference::parse(" Document "), Some(MediaPreference::Document));
        assert_eq!(MediaPreference::parse("VIDEO"), Some(MediaPreference::Video));
        assert_eq!(MediaPreference::parse("audio"), None);
    }

    #[test]
    fn parses_rename_mode() {
        assert_eq!(RenameMode::parse("caption"), Some(RenameMode::Caption));
        assert_eq!(RenameMode::parse("filename"), Some(RenameMode::Filename));
        assert_eq!(RenameMode::parse("banana"), None);
    }

    #[test]
    fn labels_round_trip_through_parse() {
        for pref in [MediaPreference::Document, MediaPreference::Video] {
            assert_eq!(MediaPreference::parse(pref.label()), Some(pref));
        }
        for mode in [RenameMode::Filename, RenameMode::Caption] {
            assert_eq!(RenameMode::parse(mode.label()), Some(mode));
        }
    }
}
