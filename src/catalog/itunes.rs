//! iTunes Search API client
//!
//! API Documentation: https://performance-partners.apple.com/search-api

use super::{AudioFeatures, CatalogProvider, Track};
use crate::config::{HttpConfig, ItunesConfig};
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

/// One song result. Every field is optional; incomplete items are skipped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesSong {
    track_id: Option<i64>,
    track_name: Option<String>,
    artist_name: Option<String>,
    collection_name: Option<String>,
    artwork_url100: Option<String>,
    preview_url: Option<String>,
    track_time_millis: Option<u32>,
    release_date: Option<String>,
    track_explicitness: Option<String>,
    artist_id: Option<i64>,
    primary_genre_name: Option<String>,
}

impl ItunesSong {
    fn into_track(self) -> Option<Track> {
        let id = self.track_id?.to_string();
        let name = self.track_name.filter(|n| !n.is_empty())?;
        Some(Track {
            id,
            name,
            artist_name: self.artist_name.unwrap_or_default(),
            album_name: self.collection_name,
            // Bump artwork to 300x300 (iTunes serves any size from the same path).
            album_image_url: self
                .artwork_url100
                .map(|url| url.replace("100x100bb", "300x300bb")),
            duration_ms: self.track_time_millis.unwrap_or(0),
            popularity: 0,
            release_date: self.release_date,
            preview_url: self.preview_url.filter(|p| !p.is_empty()),
            is_explicit: self.track_explicitness.as_deref() == Some("explicit"),
            artist_id: self.artist_id.map(|id| id.to_string()),
            genres: self.primary_genre_name.into_iter().filter(|g| !g.is_empty()).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ItunesClient {
    client: reqwest::Client,
    base_url: String,
    country: String,
}

impl ItunesClient {
    const DEFAULT_BASE_URL: &'static str = "https://itunes.apple.com";

    pub fn new(http: &HttpConfig, cfg: &ItunesConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http.build_client()?,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            country: cfg.country.clone(),
        })
    }

    /// Canned queries for the browse categories.
    pub async fn tracks_by_category(&self, category: &str, limit: u32) -> anyhow::Result<Vec<Track>> {
        self.search_tracks(category_query(category), limit, 0).await
    }

    async fn get_json(&self, url: &str) -> anyhow::Result<Vec<Track>> {
        let envelope: SearchEnvelope = self
            .client
            .get(url)
            .send()
            .await
            .context("send itunes request")?
            .error_for_status()
            .context("itunes http status")?
            .json()
            .await
            .context("parse itunes json")?;
        Ok(parse_results(envelope))
    }
}

impl CatalogProvider for ItunesClient {
    async fn search_tracks(&self, query: &str, limit: u32, offset: u32) -> anyhow::Result<Vec<Track>> {
        let url = format!(
            "{}/search?term={}&entity=song&country={}&limit={}&offset={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.country),
            limit,
            offset
        );
        self.get_json(&url).await
    }

    async fn get_track(&self, id: &str) -> anyhow::Result<Option<Track>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        let url = format!(
            "{}/lookup?id={}&country={}",
            self.base_url,
            urlencoding::encode(id),
            urlencoding::encode(&self.country)
        );
        Ok(self.get_json(&url).await?.into_iter().next())
    }

    async fn get_audio_features(&self, _id: &str) -> anyhow::Result<Option<AudioFeatures>> {
        Ok(None)
    }
}

fn parse_results(envelope: SearchEnvelope) -> Vec<Track> {
    envelope
        .results
        .into_iter()
        .filter_map(|item| serde_json::from_value::<ItunesSong>(item).ok())
        .filter_map(ItunesSong::into_track)
        .collect()
}

fn category_query(category: &str) -> &'static str {
    match category.to_ascii_lowercase().as_str() {
        "trendy" => "top hits",
        "popular" => "popular songs",
        "new" | "new releases" => "new releases",
        "pop" => "pop music",
        "rock" => "rock music",
        "hip hop" | "hiphop" => "hip hop",
        "edm" => "edm electronic",
        "r&b" | "rnb" => "r&b soul",
        "country" => "country music",
        _ => "top songs",
    }
}
