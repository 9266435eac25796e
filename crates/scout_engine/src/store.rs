use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use engine_logging::engine_debug;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use scout_core::{split_tags, AdFlag, Record};

use crate::StoreError;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS posts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    post_url        TEXT NOT NULL UNIQUE,
    group_label     TEXT NOT NULL,
    writer          TEXT NOT NULL,
    published_date  TEXT NOT NULL,
    title           TEXT NOT NULL,
    content         TEXT NOT NULL,
    tags            TEXT NOT NULL,
    sympathy        INTEGER NOT NULL DEFAULT 0,
    ad_images       TEXT NOT NULL,  -- JSON array of urls
    ad_flag         TEXT NOT NULL CHECK (ad_flag IN ('O', 'X')),
    updated_at      TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_posts_group_label ON posts(group_label);
";

const UPSERT_SQL: &str = "
INSERT INTO posts (post_url, group_label, writer, published_date, title, content,
                   tags, sympathy, ad_images, ad_flag)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT(post_url) DO UPDATE SET
    group_label = excluded.group_label,
    writer = excluded.writer,
    published_date = excluded.published_date,
    title = excluded.title,
    content = excluded.content,
    tags = excluded.tags,
    sympathy = excluded.sympathy,
    ad_images = excluded.ad_images,
    ad_flag = excluded.ad_flag,
    updated_at = CURRENT_TIMESTAMP";

const SELECT_COLUMNS: &str = "id, post_url, group_label, writer, published_date, title, content, \
     tags, sympathy, ad_images, ad_flag";

/// Durable destination of extracted records.
pub trait RecordStore: Send + Sync {
    /// Insert or update every record keyed by `post_url`, all or nothing.
    /// Rows are attributed to `group_label`, whatever the records say.
    fn upsert_batch(&self, records: &[Record], group_label: &str) -> Result<usize, StoreError>;
}

/// A row as stored, with the storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPost {
    pub id: i64,
    pub record: Record,
}

/// SQLite-backed [`RecordStore`].
#[derive(Debug)]
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::initialize(Connection::open(path)?)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        // Silently ignored for in-memory databases.
        let _ = conn.execute_batch("PRAGMA journal_mode = WAL;");
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn get(&self, post_url: &str) -> Result<Option<StoredPost>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM posts WHERE post_url = ?1");
        let post = self
            .lock()
            .query_row(&sql, params![post_url], stored_post_from_row)
            .optional()?;
        Ok(post)
    }

    /// Every stored post in insertion order.
    pub fn all_posts(&self) -> Result<Vec<StoredPost>, StoreError> {
        let conn = self.lock();
        let sql = format!("SELECT {SELECT_COLUMNS} FROM posts ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], stored_post_from_row)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }
}

impl RecordStore for SqliteRecordStore {
    fn upsert_batch(&self, records: &[Record], group_label: &str) -> Result<usize, StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for record in records {
                let ad_images = serde_json::to_string(&record.ad_image_urls)?;
                stmt.execute(params![
                    record.post_url,
                    group_label,
                    record.writer,
                    record.published_date,
                    record.title,
                    record.content,
                    record.tags_text(),
                    i64::from(record.sympathy_count),
                    ad_images,
                    record.ad_flag.marker(),
                ])?;
            }
        }
        tx.commit()?;
        engine_debug!("upserted {} posts for '{}'", records.len(), group_label);
        Ok(records.len())
    }
}

fn stored_post_from_row(row: &Row<'_>) -> rusqlite::Result<StoredPost> {
    let tags: String = row.get(7)?;
    let sympathy: i64 = row.get(8)?;
    let ad_images: String = row.get(9)?;
    let ad_flag: String = row.get(10)?;
    Ok(StoredPost {
        id: row.get(0)?,
        record: Record {
            post_url: row.get(1)?,
            group_label: row.get(2)?,
            writer: row.get(3)?,
            published_date: row.get(4)?,
            title: row.get(5)?,
            content: row.get(6)?,
            tags: split_tags(&tags),
            sympathy_count: u32::try_from(sympathy).unwrap_or(0),
            ad_image_urls: serde_json::from_str(&ad_images).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(err))
            })?,
            ad_flag: AdFlag::from_marker(&ad_flag).unwrap_or_default(),
        },
    })
}
