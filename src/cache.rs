use crate::app::ports::{CatalogSnapshot, SnapshotStorePort};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// In-memory snapshot store for development/testing
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: Mutex<HashMap<String, CatalogSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStorePort for InMemorySnapshotStore {
    async fn upsert(&self, id: &str, snapshot: &CatalogSnapshot) -> Result<(), String> {
        let mut snapshots = self.snapshots.lock().map_err(|e| e.to_string())?;
        snapshots.insert(id.to_string(), snapshot.clone());
        debug!("Stored snapshot {} with {} rows", id, snapshot.rows.len());
        Ok(())
    }

    async fn read(&self, id: &str) -> Result<Option<CatalogSnapshot>, String> {
        let snapshots = self.snapshots.lock().map_err(|e| e.to_string())?;
        Ok(snapshots.get(id).cloned())
    }
}

/// SQLite-backed snapshot store. One row per snapshot id; rows are kept as
/// a JSON document.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS catalog_snapshot (
                id            TEXT PRIMARY KEY,
                rows_json     TEXT NOT NULL,
                last_scraped  TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

#[async_trait]
impl SnapshotStorePort for SqliteSnapshotStore {
    async fn upsert(&self, id: &str, snapshot: &CatalogSnapshot) -> Result<(), String> {
        let rows_json = serde_json::to_string(&snapshot.rows).map_err(|e| e.to_string())?;
        let conn = self.conn.lock().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO catalog_snapshot (id, rows_json, last_scraped) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET rows_json=excluded.rows_json, last_scraped=excluded.last_scraped",
            params![id, rows_json, snapshot.last_scraped.to_rfc3339()],
        )
        .map_err(|e| e.to_string())?;
        debug!("Upserted snapshot {} with {} rows", id, snapshot.rows.len());
        Ok(())
    }

    async fn read(&self, id: &str) -> Result<Option<CatalogSnapshot>, String> {
        let conn = self.conn.lock().map_err(|e| e.to_string())?;
        let mut stmt = conn
            .prepare("SELECT rows_json, last_scraped FROM catalog_snapshot WHERE id = ?1")
            .map_err(|e| e.to_string())?;
        let mut rows = stmt.query(params![id]).map_err(|e| e.to_string())?;
        let Some(row) = rows.next().map_err(|e| e.to_string())? else {
            return Ok(None);
        };
        let rows_json: String = row.get(0).map_err(|e| e.to_string())?;
        let last_scraped: String = row.get(1).map_err(|e| e.to_string())?;

        let rows = serde_json::from_str(&rows_json).map_err(|e| e.to_string())?;
        let last_scraped = chrono::DateTime::parse_from_rfc3339(&last_scraped)
            .map_err(|e| e.to_string())?
            .with_timezone(&chrono::Utc);
        Ok(Some(CatalogSnapshot { rows, last_scraped }))
    }
}
