use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub http: HttpConfig,
    pub spotify: SpotifyConfig,
    pub itunes: ItunesConfig,
    pub gemini: GeminiConfig,
    pub speech: SpeechConfig,
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout; requests are never retried.
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Market passed to search (e.g. "US").
    pub market: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItunesConfig {
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Google Cloud API key for Speech-to-Text and Text-to-Speech.
    pub api_key: Option<String>,
    pub language_code: String,
    pub voice_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PlayerConfig {
    /// mpv audio device name (see `mpv --audio-device=help`)
    pub audio_device: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let proj = ProjectDirs::from("dev", "moodtune", "moodtune");
        let data_dir = proj
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("moodtune"));
        Self { data_dir }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: concat!("moodtune/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn build_client(&self) -> anyhow::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .context("build reqwest client")
    }
}

impl Default for ItunesConfig {
    fn default() -> Self {
        Self {
            country: "US".to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            language_code: "en-US".to_string(),
            voice_name: None,
        }
    }
}

impl Config {
    pub fn playlist_db_path(&self) -> PathBuf {
        self.paths.data_dir.join("playlist.sqlite3")
    }

    /// Credentials from the environment win over the config file.
    pub fn apply_env_overrides(&mut self) {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        if let Some(v) = var("SPOTIFY_CLIENT_ID") {
            self.spotify.client_id = Some(v);
        }
        if let Some(v) = var("SPOTIFY_CLIENT_SECRET") {
            self.spotify.client_secret = Some(v);
        }
        if let Some(v) = var("GEMINI_API_KEY") {
            self.gemini.api_key = Some(v);
        }
        if let Some(v) = var("GOOGLE_API_KEY") {
            self.speech.api_key = Some(v);
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj =
        ProjectDirs::from("dev", "moodtune", "moodtune").context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !path.exists() {
        let cfg = Config::default();
        write_config(&cfg, &path)?;
        tracing::info!("wrote default config to {}", path.display());
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    // Holds API credentials.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[gemini]
api_key = "abc"

[itunes]
country = "VN"
"#,
        )
        .unwrap();
        assert_eq!(cfg.gemini.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.gemini.model, "gemini-2.0-flash");
        assert_eq!(cfg.itunes.country, "VN");
        assert_eq!(cfg.http.timeout_secs, 15);
        assert!(cfg.spotify.client_id.is_none());
    }

    #[test]
    fn test_write_then_load() {
        let path = std::env::temp_dir()
            .join(format!("moodtune-config-test-{}", std::process::id()))
            .join("config.toml");
        let mut cfg = Config::default();
        cfg.speech.language_code = "vi-VN".into();
        cfg.player.audio_device = Some("pulse".into());

        write_config(&cfg, &path).unwrap();
        let loaded = load(Some(&path)).unwrap();
        assert_eq!(loaded.speech.language_code, "vi-VN");
        assert_eq!(loaded.player.audio_device.as_deref(), Some("pulse"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_creates_missing_file() {
        let path = std::env::temp_dir()
            .join(format!("moodtune-config-missing-{}", std::process::id()))
            .join("nested")
            .join("config.toml");
        let cfg = load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.itunes.country, "US");

        let _ = fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }
}
