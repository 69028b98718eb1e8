use crate::catalog::Track;
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use time::OffsetDateTime;

/// A track saved in the local playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: Option<String>,
    pub album_image_url: Option<String>,
    pub duration_ms: u32,
    pub preview_url: Option<String>,
    pub added_at: OffsetDateTime,
}

impl PlaylistEntry {
    pub fn from_track(track: &Track, added_at: OffsetDateTime) -> Self {
        Self {
            track_id: track.id.clone(),
            track_name: track.name.clone(),
            artist_name: track.artist_name.clone(),
            album_name: track.album_name.clone(),
            album_image_url: track.album_image_url.clone(),
            duration_ms: track.duration_ms,
            preview_url: track.preview_url.clone(),
            added_at,
        }
    }

    /// "m:ss"
    pub fn duration_text(&self) -> String {
        let secs = self.duration_ms / 1000;
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

const ENTRY_COLUMNS: &str = "track_id, track_name, artist_name, album_name, album_image_url, duration_ms, preview_url, added_at";

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlaylistEntry> {
    let added_at: i64 = row.get(7)?;
    Ok(PlaylistEntry {
        track_id: row.get(0)?,
        track_name: row.get(1)?,
        artist_name: row.get(2)?,
        album_name: row.get(3)?,
        album_image_url: row.get(4)?,
        duration_ms: row.get(5)?,
        preview_url: row.get(6)?,
        added_at: OffsetDateTime::from_unix_timestamp(added_at)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH),
    })
}

pub struct PlaylistStore {
    conn: Connection,
}

impl PlaylistStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let s = Self {
            conn: Connection::open_in_memory().context("open in-memory db")?,
        };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS playlist_items (
  track_id TEXT PRIMARY KEY,
  track_name TEXT NOT NULL,
  artist_name TEXT NOT NULL,
  album_name TEXT,
  album_image_url TEXT,
  duration_ms INTEGER NOT NULL,
  preview_url TEXT,
  added_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_playlist_added_at ON playlist_items(added_at DESC);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    /// Returns false when the track was already saved.
    pub fn add(&self, entry: &PlaylistEntry) -> anyhow::Result<bool> {
        let rows = self
            .conn
            .execute(
                r#"
INSERT OR IGNORE INTO playlist_items
  (track_id, track_name, artist_name, album_name, album_image_url, duration_ms, preview_url, added_at)
VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#,
                params![
                    entry.track_id,
                    entry.track_name,
                    entry.artist_name,
                    entry.album_name,
                    entry.album_image_url,
                    entry.duration_ms,
                    entry.preview_url,
                    entry.added_at.unix_timestamp()
                ],
            )
            .context("add playlist item")?;
        Ok(rows > 0)
    }

    pub fn remove(&self, track_id: &str) -> anyhow::Result<bool> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM playlist_items WHERE track_id=?1",
                params![track_id],
            )
            .context("remove playlist item")?;
        Ok(rows > 0)
    }

    /// All entries, most recently added first.
    pub fn list(&self) -> anyhow::Result<Vec<PlaylistEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM playlist_items ORDER BY added_at DESC, rowid DESC"
            ))
            .context("prepare list playlist")?;

        let entries = stmt
            .query_map([], entry_from_row)
            .context("query playlist")?
            .collect::<Result<Vec<_>, _>>()
            .context("read playlist rows")?;

        Ok(entries)
    }

    pub fn get(&self, track_id: &str) -> anyhow::Result<Option<PlaylistEntry>> {
        self.conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM playlist_items WHERE track_id=?1"),
                params![track_id],
                entry_from_row,
            )
            .optional()
            .context("get playlist item")
    }

    pub fn contains(&self, track_id: &str) -> anyhow::Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM playlist_items WHERE track_id=?1",
                params![track_id],
                |_| Ok(()),
            )
            .optional()
            .context("query playlist item")?;
        Ok(found.is_some())
    }

    pub fn count(&self) -> anyhow::Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM playlist_items", [], |row| row.get(0))
            .context("count playlist items")?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str, added_at: i64) -> PlaylistEntry {
        PlaylistEntry {
            track_id: id.to_string(),
            track_name: name.to_string(),
            artist_name: "Artist".to_string(),
            album_name: Some("Album".to_string()),
            album_image_url: None,
            duration_ms: 201_000,
            preview_url: Some(format!("https://example.com/{id}.m4a")),
            added_at: OffsetDateTime::from_unix_timestamp(added_at).unwrap(),
        }
    }

    #[test]
    fn test_add_and_contains() {
        let store = PlaylistStore::open_in_memory().unwrap();
        assert!(store.add(&entry("1", "One", 100)).unwrap());
        assert!(!store.add(&entry("1", "One again", 200)).unwrap());
        assert!(store.contains("1").unwrap());
        assert!(!store.contains("2").unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_list_newest_first() {
        let store = PlaylistStore::open_in_memory().unwrap();
        store.add(&entry("a", "Old", 100)).unwrap();
        store.add(&entry("b", "New", 300)).unwrap();
        store.add(&entry("c", "Mid", 200)).unwrap();

        let names: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|e| e.track_name)
            .collect();
        assert_eq!(names, vec!["New", "Mid", "Old"]);
    }

    #[test]
    fn test_round_trip_fields() {
        let store = PlaylistStore::open_in_memory().unwrap();
        let e = entry("x", "Song", 1_700_000_000);
        store.add(&e).unwrap();
        assert_eq!(store.get("x").unwrap(), Some(e));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_remove() {
        let store = PlaylistStore::open_in_memory().unwrap();
        store.add(&entry("1", "One", 100)).unwrap();
        assert!(store.remove("1").unwrap());
        assert!(!store.remove("1").unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_duration_text() {
        assert_eq!(entry("1", "One", 0).duration_text(), "3:21");
    }
}
