//! One-shot playback through an external `mpv` process.
//!
//! Each call spawns mpv, feeds it a URL or raw audio on stdin, and waits for
//! it to finish. There is no transport control beyond Ctrl-C.

use crate::config::PlayerConfig;
use anyhow::Context;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone, Default)]
pub struct MpvPlayer {
    audio_device: Option<String>,
}

impl MpvPlayer {
    pub fn new(cfg: &PlayerConfig) -> Self {
        Self {
            audio_device: cfg.audio_device.clone(),
        }
    }

    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-video".to_string(),
            "--input-terminal=no".to_string(),
            "--really-quiet".to_string(),
        ];
        if let Some(dev) = &self.audio_device {
            args.push(format!("--audio-device={dev}"));
        }
        args
    }

    /// Play a remote preview (e.g. a 30 second iTunes clip) to the end.
    pub async fn play_url(&self, url: &str) -> anyhow::Result<()> {
        let status = Command::new("mpv")
            .args(self.base_args())
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .context("run mpv")?;
        if !status.success() {
            anyhow::bail!("mpv exited with {status} for {url}");
        }
        Ok(())
    }

    /// Play in-memory audio (synthesized speech) to the end.
    pub async fn play_bytes(&self, audio: &[u8]) -> anyhow::Result<()> {
        let mut child = Command::new("mpv")
            .args(self.base_args())
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("spawn mpv")?;

        let mut stdin = child.stdin.take().context("mpv stdin unavailable")?;
        stdin.write_all(audio).await.context("write audio to mpv")?;
        // Closing stdin signals end of stream.
        drop(stdin);

        let status = child.wait().await.context("wait for mpv")?;
        if !status.success() {
            anyhow::bail!("mpv exited with {status}");
        }
        Ok(())
    }
}
