//! Mood assistant: picks tracks from the local playlist that fit a mood.
//!
//! The language model sees the playlist as `"track - artist"` pairs and
//! answers in the same shape. Only exact (case-insensitive) matches against
//! the playlist survive; when nothing matches, a random handful is returned
//! instead so the user always gets something to play.

pub mod gemini;
pub mod prompt;

pub use gemini::GeminiClient;
pub use prompt::MoodLabel;

use crate::storage::PlaylistEntry;
use prompt::{ENTRY_SEPARATOR, MAX_SUGGESTIONS, NAME_ARTIST_SEPARATOR};
use rand::seq::SliceRandom;

/// Size of the random selection used when the model gives nothing usable.
pub const FALLBACK_SAMPLE_SIZE: usize = 5;

pub const NO_REPLY_TEXT: &str = "(no reply)";

/// A text-generation backend.
pub trait LanguageModel {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

pub struct MoodPlaylistSelector<M> {
    model: M,
}

impl<M: LanguageModel> MoodPlaylistSelector<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Tracks from `playlist` suited to `mood_text`, best first.
    ///
    /// Empty only when the playlist is empty; the model is not consulted then.
    pub async fn suggest<'a>(
        &self,
        mood_text: &str,
        playlist: &'a [PlaylistEntry],
    ) -> Vec<&'a PlaylistEntry> {
        if playlist.is_empty() {
            return Vec::new();
        }

        let prompt = prompt::selection_prompt(mood_text, playlist);
        let matched = match self.model.generate(&prompt).await {
            Ok(response) => {
                tracing::debug!(response = %response, "mood selection reply");
                match_response(&response, playlist)
            }
            Err(e) => {
                tracing::warn!("mood selection failed: {e:#}");
                Vec::new()
            }
        };

        if matched.is_empty() {
            tracing::info!("no confident mood match, picking random tracks");
            return random_sample(playlist, FALLBACK_SAMPLE_SIZE);
        }
        matched
    }

    /// One-word mood classification; `Neutral` when the model fails.
    pub async fn classify(&self, mood_text: &str) -> MoodLabel {
        match self.model.generate(&prompt::classification_prompt(mood_text)).await {
            Ok(text) => MoodLabel::from_model_text(&text),
            Err(e) => {
                tracing::warn!("mood classification failed: {e:#}");
                MoodLabel::Neutral
            }
        }
    }

    /// A short reply meant to be spoken back to the user.
    pub async fn encourage(&self, mood_text: &str, label: MoodLabel) -> String {
        self.reply(&prompt::encouragement_prompt(mood_text, label))
            .await
    }

    pub async fn greeting(&self) -> String {
        self.reply(&prompt::greeting_prompt()).await
    }

    async fn reply(&self, prompt: &str) -> String {
        match self.model.generate(prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => NO_REPLY_TEXT.to_string(),
            Err(e) => {
                tracing::warn!("mood reply failed: {e:#}");
                NO_REPLY_TEXT.to_string()
            }
        }
    }
}

/// Resolve a `"track - artist, track - artist"` reply against the playlist,
/// keeping reply order. Malformed and unknown entries are dropped.
pub fn match_response<'a>(response: &str, playlist: &'a [PlaylistEntry]) -> Vec<&'a PlaylistEntry> {
    let mut out: Vec<&PlaylistEntry> = Vec::new();

    for entry in parse_response(response) {
        let Some(found) = split_candidates(entry).into_iter().find_map(|(name, artist)| {
            playlist.iter().find(|p| {
                eq_ignore_case(&p.track_name, name) && eq_ignore_case(&p.artist_name, artist)
            })
        }) else {
            tracing::debug!("model suggested unknown track {entry:?}");
            continue;
        };
        if out.iter().any(|e| std::ptr::eq(*e, found)) {
            continue;
        }
        out.push(found);
        if out.len() == MAX_SUGGESTIONS {
            break;
        }
    }

    out
}

/// Split a reply into its non-empty entries.
fn parse_response(response: &str) -> Vec<&str> {
    let body = response.trim();
    let body = body
        .strip_prefix('"')
        .and_then(|b| b.strip_suffix('"'))
        .unwrap_or(body);

    body.split(ENTRY_SEPARATOR.trim())
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .collect()
}

/// Every `(track, artist)` reading of one entry, rightmost split first.
///
/// Spaced `" - "` is the canonical delimiter so hyphenated names like
/// "Jay-Z" survive; a bare `-` is tried only when no spaced one exists.
/// Track names may contain the delimiter themselves ("Song - Remastered
/// 2011"), so each occurrence is a candidate and the playlist decides.
fn split_candidates(entry: &str) -> Vec<(&str, &str)> {
    let entry = entry.trim();
    let delimiter = if entry.contains(NAME_ARTIST_SEPARATOR) {
        NAME_ARTIST_SEPARATOR
    } else {
        NAME_ARTIST_SEPARATOR.trim()
    };

    entry
        .rmatch_indices(delimiter)
        .map(|(at, _)| {
            (
                entry[..at].trim(),
                entry[at + delimiter.len()..].trim(),
            )
        })
        .filter(|(name, artist)| !name.is_empty() && !artist.is_empty())
        .collect()
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.to_lowercase()
}

/// Up to `n` distinct entries in random order.
fn random_sample(playlist: &[PlaylistEntry], n: usize) -> Vec<&PlaylistEntry> {
    let mut rng = rand::rng();
    let mut picked: Vec<&PlaylistEntry> = playlist.iter().collect();
    picked.shuffle(&mut rng);
    picked.truncate(n);
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::OffsetDateTime;

    struct FakeModel {
        reply: Option<String>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeModel {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl LanguageModel for FakeModel {
        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Some(r) => Ok(r.clone()),
                None => anyhow::bail!("503 Service Unavailable"),
            }
        }
    }

    fn entry(name: &str, artist: &str) -> PlaylistEntry {
        PlaylistEntry {
            track_id: format!("{name}|{artist}"),
            track_name: name.to_string(),
            artist_name: artist.to_string(),
            album_name: None,
            album_image_url: None,
            duration_ms: 200_000,
            preview_url: None,
            added_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn sample_playlist() -> Vec<PlaylistEntry> {
        vec![
            entry("Shape of You", "Ed Sheeran"),
            entry("Someone Like You", "Adele"),
            entry("Levitating", "Dua Lipa"),
        ]
    }

    fn names<'a>(entries: &[&'a PlaylistEntry]) -> Vec<&'a str> {
        entries.iter().map(|e| e.track_name.as_str()).collect()
    }

    fn assert_valid_fallback(result: &[&PlaylistEntry], playlist: &[PlaylistEntry]) {
        assert!(!result.is_empty());
        assert!(result.len() <= FALLBACK_SAMPLE_SIZE);
        assert!(result.iter().all(|r| playlist.iter().any(|p| std::ptr::eq(p, *r))));
        for (i, a) in result.iter().enumerate() {
            assert!(result[i + 1..].iter().all(|b| !std::ptr::eq(*a, *b)));
        }
    }

    #[tokio::test]
    async fn test_empty_playlist_skips_model() {
        let selector = MoodPlaylistSelector::new(FakeModel::replying("anything - at all"));
        let result = selector.suggest("sad", &[]).await;
        assert!(result.is_empty());
        assert_eq!(selector.model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_feeling_great() {
        let playlist = sample_playlist();
        let selector = MoodPlaylistSelector::new(FakeModel::replying(
            "Shape of You - Ed Sheeran, Levitating - Dua Lipa",
        ));
        let result = selector.suggest("feeling great today", &playlist).await;

        assert_eq!(names(&result), vec!["Shape of You", "Levitating"]);
        assert!(std::ptr::eq(result[0], &playlist[0]));
        assert_eq!(selector.model.calls.load(Ordering::SeqCst), 1);

        let prompts = selector.model.prompts.lock().unwrap();
        assert!(prompts[0].contains("feeling great today"));
        assert!(prompts[0].contains("Someone Like You - Adele"));
    }

    #[tokio::test]
    async fn test_exact_match_filtering_keeps_reply_order() {
        let playlist = sample_playlist();
        let selector = MoodPlaylistSelector::new(FakeModel::replying(
            "levitating - DUA LIPA, Bohemian Rhapsody - Queen, Someone Like You - Adele",
        ));
        let result = selector.suggest("mixed", &playlist).await;
        assert_eq!(names(&result), vec!["Levitating", "Someone Like You"]);
    }

    #[tokio::test]
    async fn test_empty_sentinel_falls_back_to_random() {
        let playlist: Vec<_> = (0..8).map(|i| entry(&format!("Song {i}"), "Band")).collect();
        for reply in ["", "\"\"", "  "] {
            let selector = MoodPlaylistSelector::new(FakeModel::replying(reply));
            let result = selector.suggest("meh", &playlist).await;
            assert_eq!(result.len(), FALLBACK_SAMPLE_SIZE);
            assert_valid_fallback(&result, &playlist);
        }
    }

    #[tokio::test]
    async fn test_model_error_falls_back_to_random() {
        let playlist = sample_playlist();
        let selector = MoodPlaylistSelector::new(FakeModel::failing());
        let result = selector.suggest("happy", &playlist).await;
        assert_eq!(result.len(), playlist.len());
        assert_valid_fallback(&result, &playlist);
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back_to_random() {
        let playlist = sample_playlist();
        let selector = MoodPlaylistSelector::new(FakeModel::replying(
            "Sure! Here are some songs you might like: Shape of You by Ed Sheeran",
        ));
        let result = selector.suggest("happy", &playlist).await;
        assert_valid_fallback(&result, &playlist);
    }

    #[test]
    fn test_match_response_dedupes_and_caps() {
        let playlist: Vec<_> = (0..15).map(|i| entry(&format!("Song {i}"), "Band")).collect();
        let mut reply: Vec<String> = (0..15).map(|i| format!("Song {i} - Band")).collect();
        reply.insert(1, "Song 0 - Band".to_string());
        let result = match_response(&reply.join(", "), &playlist);
        assert_eq!(result.len(), MAX_SUGGESTIONS);
        assert_eq!(result[0].track_name, "Song 0");
        assert_eq!(result[1].track_name, "Song 1");
    }

    #[test]
    fn test_split_candidates() {
        assert_eq!(split_candidates(" Numb - Linkin Park "), vec![("Numb", "Linkin Park")]);
        assert_eq!(split_candidates("Numb-Linkin Park"), vec![("Numb", "Linkin Park")]);
        assert_eq!(
            split_candidates("Empire State of Mind - Jay-Z"),
            vec![("Empire State of Mind", "Jay-Z")]
        );
        assert_eq!(split_candidates("a - b - c"), vec![("a - b", "c"), ("a", "b - c")]);
        assert_eq!(split_candidates("a-b-c"), vec![("a-b", "c"), ("a", "b-c")]);
        assert!(split_candidates("no dash here").is_empty());
        assert!(split_candidates(" - Artist").is_empty());
    }

    #[test]
    fn test_listing_reads_back() {
        let playlist = vec![
            entry("Bohemian Rhapsody - Remastered 2011", "Queen"),
            entry("Empire State of Mind", "Jay-Z"),
            entry("Numb", "Linkin Park"),
        ];
        let result = match_response(&prompt::catalog_listing(&playlist), &playlist);
        assert_eq!(result.len(), playlist.len());
        for (got, want) in result.iter().zip(&playlist) {
            assert!(std::ptr::eq(*got, want));
        }
    }

    #[test]
    fn test_unknown_split_is_dropped() {
        let playlist = sample_playlist();
        assert!(match_response("Shape of You - Live - Ed Sheeran", &playlist).is_empty());
    }

    #[test]
    fn test_en_dash_is_not_a_delimiter() {
        let playlist = sample_playlist();
        assert!(match_response("Levitating \u{2013} Dua Lipa", &playlist).is_empty());
    }

    #[test]
    fn test_random_sample_small_playlist() {
        let playlist = vec![entry("Only", "One")];
        let result = random_sample(&playlist, FALLBACK_SAMPLE_SIZE);
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_classify() {
        let selector = MoodPlaylistSelector::new(FakeModel::replying("Sad"));
        assert_eq!(selector.classify("rough day").await, MoodLabel::Sad);

        let selector = MoodPlaylistSelector::new(FakeModel::failing());
        assert_eq!(selector.classify("rough day").await, MoodLabel::Neutral);
    }

    #[tokio::test]
    async fn test_reply_placeholder() {
        let selector = MoodPlaylistSelector::new(FakeModel::replying("   "));
        assert_eq!(selector.greeting().await, NO_REPLY_TEXT);

        let selector = MoodPlaylistSelector::new(FakeModel::replying(" Hang in there! "));
        assert_eq!(
            selector.encourage("tired", MoodLabel::Sad).await,
            "Hang in there!"
        );
    }
}
