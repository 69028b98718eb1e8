//! Voice input and output for the mood assistant.
//!
//! Recording shells out to SoX's `rec`; recognition and synthesis use the
//! Google Cloud Speech-to-Text and Text-to-Speech REST APIs.

use crate::config::{HttpConfig, SpeechConfig};
use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;

/// Recording format expected by `speech_to_text`.
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Record `seconds` of mono 16-bit WAV from the default input device.
pub async fn record_audio(seconds: u32) -> anyhow::Result<Vec<u8>> {
    let out = Command::new("rec")
        .args(["-q", "-t", "wav", "-c", "1", "-b", "16"])
        .arg("-r")
        .arg(SAMPLE_RATE_HZ.to_string())
        .args(["-", "trim", "0"])
        .arg(seconds.to_string())
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .context("run rec (is SoX installed?)")?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        anyhow::bail!("rec failed: {}", stderr.trim());
    }
    if out.stdout.is_empty() {
        anyhow::bail!("rec produced no audio");
    }
    tracing::debug!(bytes = out.stdout.len(), "recorded audio");
    Ok(out.stdout)
}

#[derive(Debug, Deserialize, Default)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

impl RecognizeResponse {
    fn transcript(&self) -> Option<String> {
        let text = self
            .results
            .iter()
            .flat_map(|r| r.alternatives.iter())
            .map(|a| a.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[derive(Debug, Clone)]
pub struct SpeechClient {
    client: reqwest::Client,
    api_key: String,
    language_code: String,
    voice_name: Option<String>,
}

impl SpeechClient {
    const STT_URL: &'static str = "https://speech.googleapis.com/v1/speech:recognize";
    const TTS_URL: &'static str = "https://texttospeech.googleapis.com/v1/text:synthesize";

    pub fn new(http: &HttpConfig, cfg: &SpeechConfig) -> anyhow::Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .context("speech.api_key is not configured")?;
        Ok(Self {
            client: http.build_client()?,
            api_key,
            language_code: cfg.language_code.clone(),
            voice_name: cfg.voice_name.clone(),
        })
    }

    /// Transcribe 16 kHz LINEAR16 audio. `None` when nothing was recognized.
    pub async fn speech_to_text(&self, wav: &[u8]) -> anyhow::Result<Option<String>> {
        let body = json!({
            "config": {
                "encoding": "LINEAR16",
                "sampleRateHertz": SAMPLE_RATE_HZ,
                "languageCode": self.language_code,
            },
            "audio": { "content": STANDARD.encode(wav) }
        });

        let resp: RecognizeResponse = self
            .client
            .post(format!("{}?key={}", Self::STT_URL, urlencoding::encode(&self.api_key)))
            .json(&body)
            .send()
            .await
            .context("send speech-to-text request")?
            .error_for_status()
            .context("speech-to-text http status")?
            .json()
            .await
            .context("parse speech-to-text json")?;
        Ok(resp.transcript())
    }

    /// Synthesize `text` to WAV bytes. Blank text yields `None` without a request.
    pub async fn text_to_speech(&self, text: &str) -> anyhow::Result<Option<Vec<u8>>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let mut voice = json!({ "languageCode": self.language_code });
        if let Some(name) = &self.voice_name {
            voice["name"] = json!(name);
        }
        let body = json!({
            "input": { "text": text },
            "voice": voice,
            "audioConfig": { "audioEncoding": "LINEAR16" }
        });

        let resp: SynthesizeResponse = self
            .client
            .post(format!("{}?key={}", Self::TTS_URL, urlencoding::encode(&self.api_key)))
            .json(&body)
            .send()
            .await
            .context("send text-to-speech request")?
            .error_for_status()
            .context("text-to-speech http status")?
            .json()
            .await
            .context("parse text-to-speech json")?;

        let audio = STANDARD
            .decode(resp.audio_content.as_bytes())
            .context("decode text-to-speech audio")?;
        Ok(Some(audio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_joins_results() {
        let raw = r#"{"results": [
            {"alternatives": [{"transcript": "i feel ", "confidence": 0.9}]},
            {"alternatives": [{"transcript": "great today"}]},
            {"alternatives": []}
        ]}"#;
        let resp: RecognizeResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.transcript().as_deref(), Some("i feel great today"));
    }

    #[test]
    fn test_no_results() {
        let resp: RecognizeResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.transcript(), None);
    }

    #[tokio::test]
    async fn test_blank_text_skips_request() {
        let cfg = SpeechConfig {
            api_key: Some("unused".into()),
            ..Default::default()
        };
        let client = SpeechClient::new(&HttpConfig::default(), &cfg).unwrap();
        assert!(client.text_to_speech("   ").await.unwrap().is_none());
    }

    #[test]
    fn test_synthesize_response_decodes() {
        let raw = format!(r#"{{"audioContent": "{}"}}"#, STANDARD.encode(b"RIFF"));
        let resp: SynthesizeResponse = serde_json::from_str(&raw).unwrap();
        assert_eq!(STANDARD.decode(resp.audio_content).unwrap(), b"RIFF");
    }
}
