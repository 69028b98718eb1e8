//! Spotify Web API client (client-credentials flow, no user scopes).

use super::{Album, Artist, AudioFeatures, CatalogProvider, Track};
use crate::config::{HttpConfig, SpotifyConfig};
use anyhow::Context;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    tracks: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    artists: Vec<Named>,
    album: Option<SpotifyAlbum>,
    #[serde(default)]
    duration_ms: u32,
    #[serde(default)]
    popularity: u32,
    preview_url: Option<String>,
    #[serde(default)]
    explicit: bool,
}

#[derive(Debug, Deserialize)]
struct Named {
    id: Option<String>,
    name: String,
}

#[derive(Debug, Deserialize)]
struct NewReleasesEnvelope {
    albums: Option<AlbumPaging>,
}

#[derive(Debug, Deserialize)]
struct AlbumPaging {
    #[serde(default)]
    items: Vec<SpotifyReleaseAlbum>,
}

#[derive(Debug, Deserialize)]
struct SpotifyReleaseAlbum {
    id: Option<String>,
    name: Option<String>,
    #[serde(default)]
    artists: Vec<Named>,
    release_date: Option<String>,
    #[serde(default)]
    images: Vec<Image>,
    #[serde(default)]
    total_tracks: u32,
}

impl SpotifyReleaseAlbum {
    fn into_album(self) -> Option<Album> {
        let id = self.id.filter(|s| !s.is_empty())?;
        let name = self.name.filter(|s| !s.is_empty())?;
        Some(Album {
            id,
            name,
            artist_name: join_artists(&self.artists),
            release_date: self.release_date,
            image_url: self.images.into_iter().next().map(|i| i.url),
            total_tracks: self.total_tracks,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    id: String,
    name: String,
    #[serde(default)]
    genres: Vec<String>,
}

impl SpotifyArtist {
    fn into_artist(self) -> Artist {
        Artist {
            id: self.id,
            name: self.name,
            genres: self
                .genres
                .iter()
                .map(|g| capitalize_genre(g))
                .filter(|g| !g.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    name: Option<String>,
    release_date: Option<String>,
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

impl SpotifyTrack {
    fn into_track(self) -> Option<Track> {
        let id = self.id.filter(|s| !s.is_empty())?;
        let name = self.name.filter(|s| !s.is_empty())?;
        let artist_name = join_artists(&self.artists);
        let artist_id = self.artists.into_iter().next().and_then(|a| a.id);
        let (album_name, release_date, album_image_url) = match self.album {
            Some(album) => (
                album.name,
                album.release_date,
                album.images.into_iter().next().map(|i| i.url),
            ),
            None => (None, None, None),
        };
        Some(Track {
            id,
            name,
            artist_name,
            album_name,
            album_image_url,
            duration_ms: self.duration_ms,
            popularity: self.popularity,
            release_date,
            preview_url: self.preview_url.filter(|p| !p.is_empty()),
            is_explicit: self.explicit,
            artist_id,
            genres: Vec::new(),
        })
    }
}

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    market: Option<String>,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    inner: Arc<Inner>,
}

impl SpotifyClient {
    const API_BASE: &'static str = "https://api.spotify.com/v1";
    const TOKEN_URL: &'static str = "https://accounts.spotify.com/api/token";

    pub fn new(http: &HttpConfig, cfg: &SpotifyConfig) -> anyhow::Result<Self> {
        let client_id = cfg
            .client_id
            .clone()
            .context("spotify.client_id is not configured")?;
        let client_secret = cfg
            .client_secret
            .clone()
            .context("spotify.client_secret is not configured")?;
        Ok(Self {
            inner: Arc::new(Inner {
                http: http.build_client()?,
                client_id,
                client_secret,
                market: cfg.market.clone(),
                token: Mutex::new(None),
            }),
        })
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        let mut guard = self.inner.token.lock().await;
        if let Some(t) = guard.as_ref()
            && t.expires_at > Instant::now()
        {
            return Ok(t.value.clone());
        }

        let resp: TokenResponse = self
            .inner
            .http
            .post(Self::TOKEN_URL)
            .basic_auth(&self.inner.client_id, Some(&self.inner.client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await
            .context("send spotify token request")?
            .error_for_status()
            .context("spotify token http status")?
            .json()
            .await
            .context("parse spotify token json")?;

        // Refresh a minute early so a request never races the expiry.
        let lifetime = Duration::from_secs(resp.expires_in.saturating_sub(60));
        *guard = Some(CachedToken {
            value: resp.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        tracing::debug!("refreshed spotify access token");
        Ok(resp.access_token)
    }

    /// Latest albums and singles. `limit` is clamped to 1..=50.
    pub async fn new_releases(&self, limit: u32) -> anyhow::Result<Vec<Album>> {
        let mut path = format!("browse/new-releases?limit={}", limit.clamp(1, 50));
        if let Some(market) = &self.inner.market {
            path.push_str(&format!("&country={}", urlencoding::encode(market)));
        }

        let Some(resp) = self.get(&path).await? else {
            return Ok(Vec::new());
        };
        let envelope: NewReleasesEnvelope = resp
            .json()
            .await
            .context("parse spotify new releases json")?;
        Ok(parse_new_releases(envelope))
    }

    pub async fn get_artist(&self, id: &str) -> anyhow::Result<Option<Artist>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        let Some(resp) = self
            .get(&format!("artists/{}", urlencoding::encode(id)))
            .await?
        else {
            return Ok(None);
        };
        let artist: SpotifyArtist = resp.json().await.context("parse spotify artist json")?;
        Ok(Some(artist.into_artist()))
    }

    async fn get(&self, path_and_query: &str) -> anyhow::Result<Option<reqwest::Response>> {
        let token = self.access_token().await?;
        let resp = self
            .inner
            .http
            .get(format!("{}/{}", Self::API_BASE, path_and_query))
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("send spotify request {path_and_query}"))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = resp
            .error_for_status()
            .with_context(|| format!("spotify http status {path_and_query}"))?;
        Ok(Some(resp))
    }
}

impl CatalogProvider for SpotifyClient {
    async fn search_tracks(&self, query: &str, limit: u32, offset: u32) -> anyhow::Result<Vec<Track>> {
        let mut path = format!(
            "search?q={}&type=track&limit={}&offset={}",
            urlencoding::encode(query),
            limit.clamp(1, 50),
            offset
        );
        if let Some(market) = &self.inner.market {
            path.push_str(&format!("&market={}", urlencoding::encode(market)));
        }

        let Some(resp) = self.get(&path).await? else {
            return Ok(Vec::new());
        };
        let envelope: SearchEnvelope = resp.json().await.context("parse spotify search json")?;
        Ok(parse_search(envelope))
    }

    async fn get_track(&self, id: &str) -> anyhow::Result<Option<Track>> {
        let Some(resp) = self
            .get(&format!("tracks/{}", urlencoding::encode(id)))
            .await?
        else {
            return Ok(None);
        };
        let track: SpotifyTrack = resp.json().await.context("parse spotify track json")?;
        Ok(track.into_track())
    }

    async fn get_audio_features(&self, id: &str) -> anyhow::Result<Option<AudioFeatures>> {
        let Some(resp) = self
            .get(&format!("audio-features/{}", urlencoding::encode(id)))
            .await?
        else {
            return Ok(None);
        };
        let features: AudioFeatures = resp
            .json()
            .await
            .context("parse spotify audio features json")?;
        Ok(Some(features))
    }
}

fn parse_search(envelope: SearchEnvelope) -> Vec<Track> {
    envelope
        .tracks
        .map(|p| p.items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(SpotifyTrack::into_track)
        .collect()
}

fn parse_new_releases(envelope: NewReleasesEnvelope) -> Vec<Album> {
    envelope
        .albums
        .map(|p| p.items)
        .unwrap_or_default()
        .into_iter()
        .filter_map(SpotifyReleaseAlbum::into_album)
        .collect()
}

fn join_artists(artists: &[Named]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// "pop rock" / "hip-hop" / "uk_garage" -> "Pop Rock" / "Hip Hop" / "Uk Garage"
fn capitalize_genre(genre: &str) -> String {
    genre
        .split([' ', '-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
