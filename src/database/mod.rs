pub mod models;


use crate::error::AppError;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub use models::*;

/// Key under which the video list is stored.
pub const VIDEOS_STORAGE_KEY: &str = "aragornic_ai_videos";

/// Same ceiling browsers apply to local storage.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Flat key-value storage with a byte quota, holding serialized values the
/// same way a browser's local storage does.
///
/// Every list operation is a read followed by a separate write. Two
/// processes sharing one file can interleave those steps and the last
/// writer wins.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    quota_bytes: usize,
}

impl Database {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
        ",
        )?;

        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            quota_bytes: DEFAULT_QUOTA_BYTES,
        };

        db.init_schema()?;

        Ok(db)
    }

    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("storage connection poisoned"))
    }

    // =========================================================================
    // Key-value storage
    // =========================================================================

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Store `value` under `key`. Fails without writing anything when the
    /// total stored size would exceed the quota.
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;

        let others: i64 = conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM local_storage WHERE key != ?",
            params![key],
            |row| row.get(0),
        )?;
        let needed = others as usize + key.len() + value.len();
        if needed > self.quota_bytes {
            log::warn!(
                "Refusing to write '{}': {} bytes exceeds quota of {}",
                key,
                needed,
                self.quota_bytes
            );
            return Err(AppError::QuotaExceeded {
                needed,
                quota: self.quota_bytes,
            }
            .into());
        }

        let now = chrono::Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR REPLACE INTO local_storage (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM local_storage WHERE key = ?", params![key])?;
        Ok(())
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// All stored videos, newest first. A missing or unreadable list is empty.
    pub fn get_videos(&self) -> Result<Vec<VideoRecord>> {
        let Some(raw) = self.get_item(VIDEOS_STORAGE_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<VideoRecord>>(&raw) {
            Ok(videos) => Ok(videos),
            Err(e) => {
                log::warn!("Stored video list is unreadable, treating as empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    pub fn get_video(&self, id: &str) -> Result<Option<VideoRecord>> {
        Ok(self.get_videos()?.into_iter().find(|v| v.id == id))
    }

    /// Prepend a new video. Rejects ids already in the list.
    pub fn store_video(&self, video: VideoRecord) -> Result<()> {
        let mut videos = self.get_videos()?;
        if videos.iter().any(|v| v.id == video.id) {
            return Err(AppError::Conflict(format!("video {} is already stored", video.id)).into());
        }

        log::info!("Storing video {} ({})", video.id, video.title);
        videos.insert(0, video);
        self.write_videos(&videos)
    }

    /// Merge `patch` into the video with `id`. Returns false if there is none.
    pub fn update_video(&self, id: &str, patch: VideoPatch) -> Result<bool> {
        let mut videos = self.get_videos()?;
        let Some(video) = videos.iter_mut().find(|v| v.id == id) else {
            return Ok(false);
        };

        video.apply(patch);
        self.write_videos(&videos)?;
        Ok(true)
    }

    /// Remove the video with `id`. Returns false if there is none.
    pub fn delete_video(&self, id: &str) -> Result<bool> {
        let mut videos = self.get_videos()?;
        let before = videos.len();
        videos.retain(|v| v.id != id);
        if videos.len() == before {
            return Ok(false);
        }

        log::info!("Deleting video {}", id);
        self.write_videos(&videos)?;
        Ok(true)
    }

    fn write_videos(&self, videos: &[VideoRecord]) -> Result<()> {
        let raw = serde_json::to_string(videos)?;
        self.set_item(VIDEOS_STORAGE_KEY, &raw)
    }
}
