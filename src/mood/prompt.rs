//! Prompt text sent to the language model, and the labels it may answer with.

use crate::storage::PlaylistEntry;
use std::fmt;

/// At most this many tracks are requested from the model.
pub const MAX_SUGGESTIONS: usize = 10;

/// Separates entries in both the catalog listing and the model's answer.
pub const ENTRY_SEPARATOR: &str = ", ";

/// Separates track name from artist name (ASCII hyphen, spaced).
pub const NAME_ARTIST_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoodLabel {
    Happy,
    Sad,
    Relax,
    Energetic,
    Angry,
    Romantic,
    Neutral,
}

impl MoodLabel {
    /// Labels the model is asked to choose between when picking tracks.
    pub const CLASSIFIABLE: [MoodLabel; 6] = [
        MoodLabel::Happy,
        MoodLabel::Sad,
        MoodLabel::Relax,
        MoodLabel::Energetic,
        MoodLabel::Angry,
        MoodLabel::Romantic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLabel::Happy => "happy",
            MoodLabel::Sad => "sad",
            MoodLabel::Relax => "relax",
            MoodLabel::Energetic => "energetic",
            MoodLabel::Angry => "angry",
            MoodLabel::Romantic => "romantic",
            MoodLabel::Neutral => "neutral",
        }
    }

    /// Lenient: the model may add punctuation, quotes or capitals.
    pub fn from_model_text(text: &str) -> Self {
        let word = text
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        match word.as_str() {
            "happy" => MoodLabel::Happy,
            "sad" => MoodLabel::Sad,
            "relax" | "relaxed" => MoodLabel::Relax,
            "energetic" | "energy" => MoodLabel::Energetic,
            "angry" => MoodLabel::Angry,
            "romantic" | "love" => MoodLabel::Romantic,
            _ => MoodLabel::Neutral,
        }
    }

    fn guidance(&self) -> &'static str {
        match self {
            MoodLabel::Happy => {
                "never pick songs about sadness, tears, rain, heartbreak, loneliness or missing someone; only upbeat, positive, danceable tracks"
            }
            MoodLabel::Sad => "prefer ballads and emotional, melancholic lyrics",
            MoodLabel::Relax => "chill, soft, lofi or acoustic tracks",
            MoodLabel::Energetic => "EDM, dance, hip-hop or remixes",
            MoodLabel::Angry => "rock or hard-hitting rap",
            MoodLabel::Romantic => "romantic, mellow, sweet love songs",
            MoodLabel::Neutral => "",
        }
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `"trackName - artistName"` for every entry, joined by `", "`.
pub fn catalog_listing(playlist: &[PlaylistEntry]) -> String {
    playlist
        .iter()
        .map(|p| format!("{}{}{}", p.track_name, NAME_ARTIST_SEPARATOR, p.artist_name))
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

/// The track-selection prompt.
pub fn selection_prompt(mood_text: &str, playlist: &[PlaylistEntry]) -> String {
    let labels = MoodLabel::CLASSIFIABLE
        .iter()
        .map(MoodLabel::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let rules = MoodLabel::CLASSIFIABLE
        .iter()
        .map(|l| format!("\n   - {}: {}.", l.as_str().to_uppercase(), l.guidance()))
        .collect::<String>();

    format!(
        "The user's song list: {listing}. \
         The user's current mood: '{mood_text}'. \
         Pick songs that match the mood precisely; do not guess a different emotion.\
         \n1. Classify the mood as exactly one of: {labels}.\
         \n2. Selection rules per mood:{rules}\
         \n3. Only pick a song if you are certain it fits the mood. If unsure, leave it out.\
         \n4. Only pick songs from the list above, copying the track name and artist name exactly as written.\
         \n5. Return at most {max} songs.\
         \n6. Output a single line in exactly this format:\
         \n      Track name{sep}Artist name{entry_sep}Track name{sep}Artist name\
         \n7. If no song fits, return an empty string (\"\").\
         \n8. No explanations, no descriptions, no line breaks, no extra text. Output only the list.",
        listing = catalog_listing(playlist),
        max = MAX_SUGGESTIONS,
        sep = NAME_ARTIST_SEPARATOR,
        entry_sep = ENTRY_SEPARATOR,
    )
}

/// Asks for a one-word mood label.
pub fn classification_prompt(mood_text: &str) -> String {
    let labels = MoodLabel::CLASSIFIABLE
        .iter()
        .map(MoodLabel::as_str)
        .chain(std::iter::once(MoodLabel::Neutral.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "The user says: \"{mood_text}\". Determine their overall mood and answer with exactly one word from: {labels}."
    )
}

/// Asks for a short, warm reply that is read aloud to the user.
pub fn encouragement_prompt(mood_text: &str, label: MoodLabel) -> String {
    format!(
        "The user says: \"{mood_text}\" and seems {label}. \
         Reply in one or two friendly, natural sentences that acknowledge how they feel \
         and tell them you picked some music for them. No emojis, no lists."
    )
}

pub fn greeting_prompt() -> String {
    "You are Mood AI. Greet the user with one friendly, cheerful sentence, \
     introduce yourself as Mood AI and ask how they are feeling today."
        .to_string()
}
