mod catalog;
mod config;
mod lyrics;
mod mood;
mod player;
mod speech;
mod storage;

use anyhow::Context;
use catalog::{AnyCatalog, CatalogProvider, ItunesClient, SpotifyClient, with_preview};
use clap::{Parser, Subcommand, ValueEnum};
use lyrics::{LrclibClient, LyricsResolver, OvhClient};
use mood::{GeminiClient, MoodPlaylistSelector};
use player::MpvPlayer;
use speech::SpeechClient;
use storage::{PlaylistEntry, PlaylistStore};
use time::OffsetDateTime;

#[derive(Debug, Parser)]
#[command(name = "moodtune", version, about = "Music discovery with lyrics and a mood assistant")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Provider {
    #[default]
    Itunes,
    Spotify,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search tracks in a catalog.
    Search {
        query: String,
        #[arg(long, value_enum, default_value_t)]
        provider: Provider,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Only show tracks that have a playable preview clip.
        #[arg(long)]
        with_preview: bool,
    },
    /// Show one track by catalog id.
    Track {
        id: String,
        #[arg(long, value_enum, default_value_t)]
        provider: Provider,
    },
    /// Show Spotify audio features for a track.
    Features { id: String },
    /// Browse an iTunes category (trendy, popular, pop, rock, edm, ...).
    Category {
        name: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Show the latest Spotify album and single releases.
    Releases {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Fetch lyrics (synced when available).
    Lyrics {
        artist: String,
        title: String,
        /// Highlight the line sung at this playback position (seconds).
        #[arg(long)]
        at: Option<f64>,
    },
    /// Manage the local playlist.
    Playlist {
        #[command(subcommand)]
        cmd: PlaylistCommand,
    },
    /// Play the 30 second preview of a track.
    Preview {
        id: String,
        #[arg(long, value_enum, default_value_t)]
        provider: Provider,
    },
    /// Suggest playlist tracks for a mood.
    Mood {
        /// How you feel. Omit when using --voice.
        text: Option<String>,
        /// Record the mood from the microphone for this many seconds.
        #[arg(long, conflicts_with = "text")]
        voice: Option<u32>,
        /// Read an encouraging reply aloud.
        #[arg(long)]
        speak: bool,
        /// Play the previews of the suggested tracks.
        #[arg(long)]
        play: bool,
    },
    /// Let the mood assistant introduce itself.
    Greet {
        #[arg(long)]
        speak: bool,
    },
}

#[derive(Debug, Subcommand)]
enum PlaylistCommand {
    /// Add a catalog track to the playlist.
    Add {
        id: String,
        #[arg(long, value_enum, default_value_t)]
        provider: Provider,
    },
    /// Remove a track from the playlist.
    Remove { id: String },
    /// List saved tracks, newest first.
    List,
    /// Print the number of saved tracks.
    Count,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref()).context("load config")?;
    cfg.apply_env_overrides();

    match cli.command {
        Command::Search {
            query,
            provider,
            limit,
            offset,
            with_preview: preview_only,
        } => {
            let catalog = make_catalog(&cfg, provider)?;
            let mut tracks = catalog.search_tracks(&query, limit, offset).await?;
            if preview_only {
                tracks = with_preview(tracks);
            }
            print_tracks(&tracks);
        }
        Command::Track { id, provider } => {
            let catalog = make_catalog(&cfg, provider)?;
            let mut track = catalog
                .get_track(&id)
                .await?
                .with_context(|| format!("track {id} not found"))?;
            if let AnyCatalog::Spotify(spotify) = &catalog
                && let Some(artist_id) = track.artist_id.as_deref()
            {
                match spotify.get_artist(artist_id).await {
                    Ok(Some(artist)) => track.genres = artist.genres,
                    Ok(None) => {}
                    Err(e) => tracing::warn!("artist genres unavailable: {e:#}"),
                }
            }
            print_track_details(&track);
        }
        Command::Features { id } => {
            let catalog = make_catalog(&cfg, Provider::Spotify)?;
            match catalog.get_audio_features(&id).await? {
                Some(f) => print_features(&f),
                None => println!("No audio features for {id}."),
            }
        }
        Command::Category { name, limit } => {
            let itunes = ItunesClient::new(&cfg.http, &cfg.itunes)?;
            let tracks = itunes.tracks_by_category(&name, limit).await?;
            print_tracks(&tracks);
        }
        Command::Releases { limit } => {
            let spotify = SpotifyClient::new(&cfg.http, &cfg.spotify)?;
            print_albums(&spotify.new_releases(limit).await?);
        }
        Command::Lyrics { artist, title, at } => {
            let resolver = LyricsResolver::new(
                LrclibClient::new(&cfg.http)?,
                OvhClient::new(&cfg.http)?,
            );
            let result = resolver.resolve(&artist, &title).await;
            match at {
                Some(secs) if result.has_sync() => {
                    let position = lyrics::playback_position(secs)?;
                    let current = result.line_index_at(position);
                    for (i, line) in result.lines.iter().enumerate() {
                        let marker = if Some(i) == current { ">" } else { " " };
                        let ts = line.timestamp.as_millis();
                        println!(
                            "{marker} [{:02}:{:02}.{:02}] {}",
                            ts / 60_000,
                            (ts / 1000) % 60,
                            (ts % 1000) / 10,
                            line.text
                        );
                    }
                }
                _ => println!("{}", result.display_text()),
            }
        }
        Command::Playlist { cmd } => {
            let store = PlaylistStore::open(&cfg.playlist_db_path())?;
            match cmd {
                PlaylistCommand::Add { id, provider } => {
                    if store.contains(&id)? {
                        println!("{id} is already in the playlist.");
                        return Ok(());
                    }
                    let catalog = make_catalog(&cfg, provider)?;
                    let track = catalog
                        .get_track(&id)
                        .await?
                        .with_context(|| format!("track {id} not found"))?;
                    let entry = PlaylistEntry::from_track(&track, OffsetDateTime::now_utc());
                    if store.add(&entry)? {
                        println!("Added '{}' to the playlist.", entry.track_name);
                    } else {
                        println!("'{}' is already in the playlist.", entry.track_name);
                    }
                }
                PlaylistCommand::Remove { id } => {
                    if store.remove(&id)? {
                        println!("Removed {id}.");
                    } else {
                        println!("{id} is not in the playlist.");
                    }
                }
                PlaylistCommand::List => print_entries(&store.list()?.iter().collect::<Vec<_>>()),
                PlaylistCommand::Count => println!("{}", store.count()?),
            }
        }
        Command::Preview { id, provider } => {
            let store = PlaylistStore::open(&cfg.playlist_db_path())?;
            let url = match store.get(&id)?.and_then(|e| e.preview_url) {
                Some(url) => url,
                None => make_catalog(&cfg, provider)?
                    .get_track(&id)
                    .await?
                    .and_then(|t| t.preview_url)
                    .with_context(|| format!("no preview available for {id}"))?,
            };
            MpvPlayer::new(&cfg.player).play_url(&url).await?;
        }
        Command::Mood {
            text,
            voice,
            speak,
            play,
        } => {
            let mood_text = match (text, voice) {
                (Some(t), _) => t,
                (None, Some(secs)) => {
                    let speech = SpeechClient::new(&cfg.http, &cfg.speech)?;
                    eprintln!("Listening for {secs}s...");
                    let audio = speech::record_audio(secs).await?;
                    let heard = speech
                        .speech_to_text(&audio)
                        .await?
                        .context("could not understand the recording, please try again")?;
                    println!("You said: {heard}");
                    heard
                }
                (None, None) => anyhow::bail!("describe your mood or pass --voice <seconds>"),
            };

            let store = PlaylistStore::open(&cfg.playlist_db_path())?;
            let playlist = store.list()?;
            if playlist.is_empty() {
                println!("Your playlist is empty. Add some tracks first.");
                return Ok(());
            }

            let selector = MoodPlaylistSelector::new(GeminiClient::new(&cfg.http, &cfg.gemini)?);
            let label = selector.classify(&mood_text).await;
            println!("Mood: {label}");

            if speak {
                let reply = selector.encourage(&mood_text, label).await;
                println!("{reply}");
                say(&cfg, &reply).await;
            }

            let suggestions = selector.suggest(&mood_text, &playlist).await;
            print_entries(&suggestions);

            if play {
                let player = MpvPlayer::new(&cfg.player);
                for entry in &suggestions {
                    let Some(url) = entry.preview_url.as_deref() else {
                        continue;
                    };
                    println!("Playing {} - {}", entry.track_name, entry.artist_name);
                    if let Err(e) = player.play_url(url).await {
                        tracing::warn!("preview failed: {e:#}");
                    }
                }
            }
        }
        Command::Greet { speak } => {
            let selector = MoodPlaylistSelector::new(GeminiClient::new(&cfg.http, &cfg.gemini)?);
            let greeting = selector.greeting().await;
            println!("{greeting}");
            if speak {
                say(&cfg, &greeting).await;
            }
        }
    }

    Ok(())
}

fn make_catalog(cfg: &config::Config, provider: Provider) -> anyhow::Result<AnyCatalog> {
    Ok(match provider {
        Provider::Itunes => AnyCatalog::Itunes(ItunesClient::new(&cfg.http, &cfg.itunes)?),
        Provider::Spotify => AnyCatalog::Spotify(SpotifyClient::new(&cfg.http, &cfg.spotify)?),
    })
}

/// Speaking is best effort; the text has already been printed.
async fn say(cfg: &config::Config, text: &str) {
    let result = async {
        let speech = SpeechClient::new(&cfg.http, &cfg.speech)?;
        if let Some(audio) = speech.text_to_speech(text).await? {
            MpvPlayer::new(&cfg.player).play_bytes(&audio).await?;
        }
        anyhow::Ok(())
    }
    .await;
    if let Err(e) = result {
        tracing::warn!("text-to-speech failed: {e:#}");
    }
}

fn print_tracks(tracks: &[catalog::Track]) {
    for (i, t) in tracks.iter().enumerate() {
        println!(
            "{:02}. {} - {}  [{}]  (id={})",
            i + 1,
            t.name,
            t.artist_name,
            t.duration_text(),
            t.id
        );
    }
}

fn print_track_details(t: &catalog::Track) {
    println!("{} - {}", t.name, t.artist_name);
    if let Some(album) = &t.album_name {
        println!("Album:    {album}");
    }
    println!("Duration: {}", t.duration_text());
    if let Some(date) = &t.release_date {
        println!("Released: {date}");
    }
    if !t.genres.is_empty() {
        println!("Genres:   {}", t.genres.join(", "));
    }
    if t.popularity > 0 {
        println!("Popularity: {}%", t.popularity);
    }
    if t.is_explicit {
        println!("Explicit");
    }
    if let Some(url) = &t.preview_url {
        println!("Preview:  {url}");
    }
}

fn print_albums(albums: &[catalog::Album]) {
    for (i, a) in albums.iter().enumerate() {
        println!(
            "{:02}. {} - {}  [{} tracks, {}]  (id={})",
            i + 1,
            a.name,
            a.artist_name,
            a.total_tracks,
            a.release_date.as_deref().unwrap_or("unknown date"),
            a.id
        );
    }
}

fn print_features(f: &catalog::AudioFeatures) {
    use catalog::AudioFeatures as F;
    println!("Energy:       {}%", F::percent(f.energy));
    println!("Danceability: {}%", F::percent(f.danceability));
    println!("Valence:      {}%", F::percent(f.valence));
    println!("Acousticness: {}%", F::percent(f.acousticness));
    println!("Tempo:        {:.0} BPM", f.tempo);
    println!(
        "Key:          {} {}",
        f.key,
        if f.mode == 1 { "major" } else { "minor" }
    );
}

fn print_entries(entries: &[&PlaylistEntry]) {
    for (i, e) in entries.iter().enumerate() {
        println!(
            "{:02}. {} - {}  [{}]  (id={})",
            i + 1,
            e.track_name,
            e.artist_name,
            e.duration_text(),
            e.track_id
        );
    }
}
