//! Core type definitions shared by the player, the catalog and storage

use serde::{Deserialize, Serialize};

/// A playable track. Identity is `id`.
///
/// Field names follow the JSON blobs the player persists, so queue, favorites
/// and downloads written by earlier builds keep loading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub audio_url: String,
    #[serde(default, alias = "localAudioUrl", skip_serializing_if = "Option::is_none")]
    pub local_uri: Option<String>,
    #[serde(default, rename = "duration")]
    pub duration_secs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
}

impl Track {
    /// Copy of this track pointing at a downloaded file.
    pub fn with_local_uri(&self, local_uri: impl Into<String>) -> Self {
        Self {
            local_uri: Some(local_uri.into()),
            ..self.clone()
        }
    }

    /// URI handed to the audio engine: the downloaded copy wins over the stream.
    pub fn playback_uri(&self) -> &str {
        match self.local_uri.as_deref() {
            Some(local) if !local.is_empty() => local,
            _ => &self.audio_url,
        }
    }

    /// Search results sometimes come without a stream URL; those need a
    /// details lookup before they can be played.
    pub fn needs_resolution(&self) -> bool {
        self.playback_uri().is_empty()
    }
}

/// Repeat mode state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    None,
    All,
    One,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().trim_matches('"') {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track {
            id: "t1".to_string(),
            title: "Song".to_string(),
            artist: "Band".to_string(),
            image_url: String::new(),
            audio_url: "https://cdn.example/t1.mp4".to_string(),
            local_uri: None,
            duration_secs: 200,
            lyrics: None,
        }
    }

    #[test]
    fn local_copy_wins_over_stream() {
        let local = track().with_local_uri("/data/downloads/t1.mp3");
        assert_eq!(local.playback_uri(), "/data/downloads/t1.mp3");
        assert_eq!(track().playback_uri(), "https://cdn.example/t1.mp4");
    }

    #[test]
    fn reads_legacy_persisted_shape() {
        let raw = r#"{"id":"x","title":"T","artist":"A","imageUrl":"i","audioUrl":"a","localAudioUrl":"file:///x.mp3","duration":31}"#;
        let parsed: Track = serde_json::from_str(raw).expect("parse");
        assert_eq!(parsed.local_uri.as_deref(), Some("file:///x.mp3"));
        assert_eq!(parsed.duration_secs, 31);
    }

    #[test]
    fn repeat_cycles_through_all_modes() {
        assert_eq!(RepeatMode::None.next(), RepeatMode::All);
        assert_eq!(RepeatMode::All.next(), RepeatMode::One);
        assert_eq!(RepeatMode::One.next(), RepeatMode::None);
    }

    #[test]
    fn theme_parses_quoted_values() {
        assert_eq!(Theme::parse("\"dark\""), Some(Theme::Dark));
        assert_eq!(Theme::parse("blue"), None);
    }
}
