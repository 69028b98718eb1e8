//! LRCLIB API client
//!
//! LRCLIB is a free lyrics API that provides synchronized (LRC format) lyrics.
//! API Documentation: https://lrclib.net/docs

use super::SyncedLyricsSource;
use crate::config::HttpConfig;
use anyhow::Context;
use serde::Deserialize;

/// LRCLIB `/get` response. Only the lyric fields are used.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LrclibResponse {
    #[serde(rename = "plainLyrics")]
    pub plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    pub synced_lyrics: Option<String>,
}

/// LRCLIB API client
#[derive(Debug, Clone)]
pub struct LrclibClient {
    client: reqwest::Client,
    base_url: String,
}

impl LrclibClient {
    const DEFAULT_BASE_URL: &'static str = "https://lrclib.net/api";

    pub fn new(http: &HttpConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http.build_client()?,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Get lyrics with exact match on track and artist name.
    pub async fn get_exact(
        &self,
        track_name: &str,
        artist_name: &str,
    ) -> anyhow::Result<Option<LrclibResponse>> {
        let url = format!(
            "{}/get?track_name={}&artist_name={}",
            self.base_url,
            urlencoding::encode(track_name),
            urlencoding::encode(artist_name)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("send lrclib request")?;

        if response.status().is_success() {
            let lyrics: LrclibResponse = response.json().await.context("parse lrclib json")?;
            Ok(Some(lyrics))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            anyhow::bail!("LRCLIB API error: {}", response.status());
        }
    }
}

impl SyncedLyricsSource for LrclibClient {
    async fn fetch_synced(&self, title: &str, artist: &str) -> anyhow::Result<Option<LrclibResponse>> {
        self.get_exact(title, artist).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_with_missing_fields() {
        let raw = r#"{"id": 1, "trackName": "x", "artistName": "y", "plainLyrics": "la la", "syncedLyrics": null}"#;
        let parsed: LrclibResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.plain_lyrics.as_deref(), Some("la la"));
        assert!(parsed.synced_lyrics.is_none());

        let parsed: LrclibResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.plain_lyrics.is_none());
    }
}
