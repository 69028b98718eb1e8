//! lyrics.ovh client (plain lyrics only)
//!
//! API: https://api.lyrics.ovh/v1/{artist}/{title}

use super::PlainLyricsSource;
use crate::config::HttpConfig;
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct OvhResponse {
    lyrics: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OvhClient {
    client: reqwest::Client,
    base_url: String,
}

impl OvhClient {
    const DEFAULT_BASE_URL: &'static str = "https://api.lyrics.ovh/v1";

    pub fn new(http: &HttpConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http.build_client()?,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    pub async fn get_plain(&self, artist: &str, title: &str) -> anyhow::Result<Option<String>> {
        let url = format!(
            "{}/{}/{}",
            self.base_url,
            urlencoding::encode(&clean_query(artist)),
            urlencoding::encode(&clean_query(title))
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("send lyrics.ovh request")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: OvhResponse = response
            .error_for_status()
            .context("lyrics.ovh http status")?
            .json()
            .await
            .context("parse lyrics.ovh json")?;
        Ok(body.lyrics.filter(|l| !l.trim().is_empty()))
    }
}

impl PlainLyricsSource for OvhClient {
    async fn fetch_plain(&self, artist: &str, title: &str) -> anyhow::Result<Option<String>> {
        self.get_plain(artist, title).await
    }
}

/// Loosen a title or artist so lyrics.ovh matches more often:
/// "Song (feat. X)" -> "Song", "A & B" -> "A and B", "A x B" -> "A B".
pub fn clean_query(s: &str) -> String {
    let mut t = s;
    if let Some(idx) = t.find('(')
        && idx > 0
    {
        t = &t[..idx];
    }
    t.replace('&', "and").replace(" x ", " ").trim().to_string()
}
