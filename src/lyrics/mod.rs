//! Lyrics module for fetching and displaying synchronized lyrics
//!
//! This module provides:
//! - LRCLIB API client for synced lyrics (primary source)
//! - lyrics.ovh client for plain lyrics (fallback source)
//! - LRC format parser
//! - The resolver tying them together

pub mod lrclib;
pub mod ovh;
pub mod parser;

pub use lrclib::{LrclibClient, LrclibResponse};
pub use ovh::OvhClient;
pub use parser::LyricLine;

use std::time::Duration;

/// Shown when neither source had anything.
pub const NOT_FOUND_TEXT: &str = "No lyrics found for this track.";

/// Source of synced (LRC) lyrics, keyed by title then artist.
pub trait SyncedLyricsSource {
    async fn fetch_synced(&self, title: &str, artist: &str)
    -> anyhow::Result<Option<LrclibResponse>>;
}

/// Source of plain lyrics, keyed by artist then title.
pub trait PlainLyricsSource {
    async fn fetch_plain(&self, artist: &str, title: &str) -> anyhow::Result<Option<String>>;
}

/// Lyrics for one track request
#[derive(Debug, Clone, Default)]
pub struct SyncedLyricsResult {
    /// Timed lines, sorted by timestamp
    pub lines: Vec<LyricLine>,
    /// Unsynchronized text
    pub plain_text: String,
}

impl SyncedLyricsResult {
    pub fn has_sync(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Index of the line being sung at `position`.
    pub fn line_index_at(&self, position: Duration) -> Option<usize> {
        let count = self.lines.partition_point(|l| l.timestamp <= position);
        count.checked_sub(1)
    }

    pub fn display_text(&self) -> String {
        if self.has_sync() {
            self.lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        } else if !self.plain_text.trim().is_empty() {
            self.plain_text.clone()
        } else {
            NOT_FOUND_TEXT.to_string()
        }
    }
}

/// Playback position from user-supplied seconds. Negative values clamp to
/// zero; NaN, infinite and out-of-range values are rejected.
pub fn playback_position(secs: f64) -> anyhow::Result<Duration> {
    if secs.is_nan() {
        anyhow::bail!("playback position is not a number");
    }
    Duration::try_from_secs_f64(secs.max(0.0))
        .map_err(|e| anyhow::anyhow!("invalid playback position {secs}: {e}"))
}

/// Synced source first, plain source as fallback.
#[derive(Debug, Clone)]
pub struct LyricsResolver<S, P> {
    synced: S,
    plain: P,
}

impl<S: SyncedLyricsSource, P: PlainLyricsSource> LyricsResolver<S, P> {
    pub fn new(synced: S, plain: P) -> Self {
        Self { synced, plain }
    }

    /// Never fails; network and decoding problems end up as an empty result.
    pub async fn resolve(&self, artist: &str, title: &str) -> SyncedLyricsResult {
        let mut result = SyncedLyricsResult::default();

        match self.synced.fetch_synced(title, artist).await {
            Ok(Some(found)) => {
                if let Some(plain) = found.plain_lyrics {
                    result.plain_text = plain;
                }
                if let Some(synced) = found.synced_lyrics.as_deref()
                    && !synced.is_empty()
                {
                    let lines = parser::parse(synced);
                    if !lines.is_empty() {
                        tracing::debug!(lines = lines.len(), "synced lyrics for {artist} - {title}");
                        result.lines = lines;
                        return result;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("synced lyrics lookup failed: {e:#}"),
        }

        match self.plain.fetch_plain(artist, title).await {
            Ok(Some(plain)) => result.plain_text = plain,
            Ok(None) => {}
            Err(e) => tracing::warn!("plain lyrics lookup failed: {e:#}"),
        }

        result
    }
}
