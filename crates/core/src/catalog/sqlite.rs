//! SQLite mirror of the catalog snapshot.
//!
//! The mirror is a rebuildable projection: `rebuild` replaces its contents
//! from a snapshot transactionally, and the read path treats any mirror
//! failure as a reason to fall back to the snapshot. The schema is fixed and
//! versioned; a database carrying a different version is refused outright
//! rather than probed and adapted at runtime.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::classifier::Category;

use super::{CatalogError, CatalogSnapshot, ProgramRecord};

/// Version of the one supported schema.
pub const SCHEMA_VERSION: u32 = 1;

/// SQLite-backed catalog mirror.
pub struct SqliteMirror {
    conn: Mutex<Connection>,
}

impl SqliteMirror {
    /// Open (or create) the mirror database, verifying the schema version.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory mirror (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize(conn: &Connection) -> Result<(), CatalogError> {
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER NOT NULL
            );

            -- One row per cataloged repository, keyed by lowercase identity
            CREATE TABLE IF NOT EXISTS programs (
                identity TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                url TEXT NOT NULL,
                description TEXT,
                stars INTEGER NOT NULL DEFAULT 0,
                language TEXT,
                topics TEXT NOT NULL DEFAULT '[]',
                updated_at TEXT NOT NULL,
                default_branch TEXT NOT NULL DEFAULT 'main',
                category TEXT NOT NULL,
                sub_category TEXT,
                flagged INTEGER NOT NULL DEFAULT 0,
                first_seen_at TEXT NOT NULL,
                last_merged_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_programs_category ON programs(category);
            CREATE INDEX IF NOT EXISTS idx_programs_stars ON programs(stars);

            -- Provenance of the snapshot the mirror was last rebuilt from
            CREATE TABLE IF NOT EXISTS mirror_meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                scraped_at TEXT NOT NULL,
                rebuilt_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        let found: Option<u32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        match found {
            None => {
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?)",
                    params![SCHEMA_VERSION],
                )
                .map_err(|e| CatalogError::Database(e.to_string()))?;
                Ok(())
            }
            Some(v) if v == SCHEMA_VERSION => Ok(()),
            Some(v) => Err(CatalogError::SchemaMismatch {
                expected: SCHEMA_VERSION,
                found: v,
            }),
        }
    }

    /// Replace the mirror's contents from a snapshot, all-or-nothing.
    pub fn rebuild(&self, snapshot: &CatalogSnapshot) -> Result<(), CatalogError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        tx.execute("DELETE FROM programs", [])
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        for record in &snapshot.repos {
            let topics = serde_json::to_string(&record.topics)
                .map_err(|e| CatalogError::Database(format!("serialize topics: {}", e)))?;
            tx.execute(
                "INSERT INTO programs (identity, full_name, owner, name, url, description,
                                       stars, language, topics, updated_at, default_branch,
                                       category, sub_category, flagged, first_seen_at,
                                       last_merged_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    record.identity(),
                    &record.full_name,
                    &record.owner,
                    &record.name,
                    &record.url,
                    &record.description,
                    record.stars,
                    &record.language,
                    topics,
                    record.updated_at.to_rfc3339(),
                    &record.default_branch,
                    record.category.as_str(),
                    &record.sub_category,
                    record.flagged as i32,
                    record.first_seen_at.to_rfc3339(),
                    record.last_merged_at.to_rfc3339(),
                ],
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        }

        tx.execute(
            "INSERT INTO mirror_meta (id, scraped_at, rebuilt_at) VALUES (1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                scraped_at = excluded.scraped_at,
                rebuilt_at = excluded.rebuilt_at",
            params![snapshot.scraped_at.to_rfc3339(), Utc::now().to_rfc3339()],
        )
        .map_err(|e| CatalogError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        debug!(repos = snapshot.repos.len(), "Rebuilt catalog mirror");
        Ok(())
    }

    /// Load all records plus the mirrored snapshot's scrape time.
    pub fn load_all(&self) -> Result<(Vec<ProgramRecord>, Option<DateTime<Utc>>), CatalogError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT full_name, owner, name, url, description, stars, language, topics,
                        updated_at, default_branch, category, sub_category, flagged,
                        first_seen_at, last_merged_at
                 FROM programs ORDER BY stars DESC",
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_record)
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| CatalogError::Database(e.to_string()))?);
        }

        let scraped_at: Option<DateTime<Utc>> = conn
            .query_row("SELECT scraped_at FROM mirror_meta WHERE id = 1", [], |row| {
                let s: String = row.get(0)?;
                Ok(s)
            })
            .optional()
            .map_err(|e| CatalogError::Database(e.to_string()))?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok((records, scraped_at))
    }

    /// Fetch one record by identity.
    pub fn get(&self, full_name: &str) -> Result<ProgramRecord, CatalogError> {
        let conn = self.conn.lock().unwrap();
        let identity = full_name.to_lowercase();

        conn.query_row(
            "SELECT full_name, owner, name, url, description, stars, language, topics,
                    updated_at, default_branch, category, sub_category, flagged,
                    first_seen_at, last_merged_at
             FROM programs WHERE identity = ?",
            params![&identity],
            Self::row_to_record,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => CatalogError::NotFound(identity.clone()),
            _ => CatalogError::Database(e.to_string()),
        })
    }

    pub fn count(&self) -> Result<u64, CatalogError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM programs", [], |row| row.get(0))
            .map_err(|e| CatalogError::Database(e.to_string()))
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ProgramRecord> {
        let topics_json: String = row.get(7)?;
        let topics: Vec<String> = serde_json::from_str(&topics_json).unwrap_or_default();

        let category_str: String = row.get(10)?;
        let category =
            Category::parse(&category_str).unwrap_or_else(Category::default_category);

        Ok(ProgramRecord {
            full_name: row.get(0)?,
            owner: row.get(1)?,
            name: row.get(2)?,
            url: row.get(3)?,
            description: row.get(4)?,
            stars: row.get(5)?,
            language: row.get(6)?,
            topics,
            updated_at: parse_ts(row.get::<_, String>(8)?),
            default_branch: row.get(9)?,
            category,
            sub_category: row.get(11)?,
            flagged: row.get::<_, i32>(12)? != 0,
            first_seen_at: parse_ts(row.get::<_, String>(13)?),
            last_merged_at: parse_ts(row.get::<_, String>(14)?),
        })
    }
}

fn parse_ts(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
