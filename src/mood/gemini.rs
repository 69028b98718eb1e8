//! Google Gemini `generateContent` client.

use super::LanguageModel;
use crate::config::{GeminiConfig, HttpConfig};
use anyhow::Context;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate.
    fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    pub fn new(http: &HttpConfig, cfg: &GeminiConfig) -> anyhow::Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .context("gemini.api_key is not configured")?;
        Ok(Self {
            client: http.build_client()?,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: cfg.model.clone(),
            api_key,
        })
    }
}

impl LanguageModel for GeminiClient {
    /// A reply without any text part comes back as an empty string.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            urlencoding::encode(&self.model),
            urlencoding::encode(&self.api_key)
        );
        let body = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let resp: GenerateResponse = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("send gemini request")?
            .error_for_status()
            .context("gemini http status")?
            .json()
            .await
            .context("parse gemini json")?;

        Ok(resp.text().map(str::trim).unwrap_or_default().to_string())
    }
}
