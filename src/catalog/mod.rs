//! Third-party track catalogs (iTunes Search, Spotify Web API).

pub mod itunes;
pub mod spotify;

pub use itunes::ItunesClient;
pub use spotify::SpotifyClient;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist_name: String,
    pub album_name: Option<String>,
    pub album_image_url: Option<String>,
    pub duration_ms: u32,
    pub popularity: u32,
    pub release_date: Option<String>,
    pub preview_url: Option<String>,
    pub is_explicit: bool,
    /// First credited artist, when the catalog exposes artist ids.
    pub artist_id: Option<String>,
    /// Filled on demand from the artist profile; catalogs do not return it inline.
    pub genres: Vec<String>,
}

impl Track {
    /// "m:ss"
    pub fn duration_text(&self) -> String {
        let secs = self.duration_ms / 1000;
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

/// An album or single from the new-releases shelf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub artist_name: String,
    pub release_date: Option<String>,
    pub image_url: Option<String>,
    pub total_tracks: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFeatures {
    pub energy: f32,
    pub danceability: f32,
    /// Musical positiveness.
    pub valence: f32,
    pub acousticness: f32,
    pub instrumentalness: f32,
    pub speechiness: f32,
    /// BPM
    pub tempo: f32,
    pub key: i32,
    /// 1 major, 0 minor
    pub mode: i32,
}

impl AudioFeatures {
    pub fn percent(value: f32) -> u32 {
        (value.clamp(0.0, 1.0) * 100.0) as u32
    }
}

/// Drop tracks that have no playable preview clip.
pub fn with_preview(tracks: Vec<Track>) -> Vec<Track> {
    tracks
        .into_iter()
        .filter(|t| t.preview_url.as_deref().is_some_and(|u| !u.is_empty()))
        .collect()
}

/// A searchable track catalog.
pub trait CatalogProvider {
    async fn search_tracks(&self, query: &str, limit: u32, offset: u32) -> anyhow::Result<Vec<Track>>;

    async fn get_track(&self, id: &str) -> anyhow::Result<Option<Track>>;

    /// `None` when the catalog has no analysis for the track.
    async fn get_audio_features(&self, id: &str) -> anyhow::Result<Option<AudioFeatures>>;
}

/// Provider picked at runtime.
#[derive(Debug, Clone)]
pub enum AnyCatalog {
    Itunes(ItunesClient),
    Spotify(SpotifyClient),
}

impl CatalogProvider for AnyCatalog {
    async fn search_tracks(&self, query: &str, limit: u32, offset: u32) -> anyhow::Result<Vec<Track>> {
        match self {
            AnyCatalog::Itunes(c) => c.search_tracks(query, limit, offset).await,
            AnyCatalog::Spotify(c) => c.search_tracks(query, limit, offset).await,
        }
    }

    async fn get_track(&self, id: &str) -> anyhow::Result<Option<Track>> {
        match self {
            AnyCatalog::Itunes(c) => c.get_track(id).await,
            AnyCatalog::Spotify(c) => c.get_track(id).await,
        }
    }

    async fn get_audio_features(&self, id: &str) -> anyhow::Result<Option<AudioFeatures>> {
        match self {
            AnyCatalog::Itunes(c) => c.get_audio_features(id).await,
            AnyCatalog::Spotify(c) => c.get_audio_features(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_text() {
        let t = Track {
            duration_ms: 65_999,
            ..Default::default()
        };
        assert_eq!(t.duration_text(), "1:05");
    }

    #[test]
    fn test_with_preview() {
        let track = |id: &str, preview: Option<&str>| Track {
            id: id.to_string(),
            preview_url: preview.map(str::to_string),
            ..Default::default()
        };
        let kept = with_preview(vec![
            track("a", Some("https://p.example/a.mp3")),
            track("b", None),
            track("c", Some("")),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "a");
    }

    #[test]
    fn test_percent_clamps() {
        assert_eq!(AudioFeatures::percent(0.734), 73);
        assert_eq!(AudioFeatures::percent(1.5), 100);
        assert_eq!(AudioFeatures::percent(-0.2), 0);
    }
}
