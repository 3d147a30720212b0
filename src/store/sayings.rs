//! SQLite-backed saying store.
//!
//! One table, one row per saying. Ids come from `AUTOINCREMENT` so a deleted
//! id is never handed out again. `image_path` is only ever written by
//! `set_image`; create/update/import leave it alone.
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sayings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    saying TEXT NOT NULL,
    prompt TEXT NOT NULL,
    image_path TEXT,
    updated_at TEXT NOT NULL
);
"#;

const SELECT_COLUMNS: &str = "SELECT id, saying, prompt, image_path, updated_at FROM sayings";

/// A stored saying as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Saying {
    pub id: i64,
    pub saying: String,
    pub prompt: String,
    /// Public path of the latest generated image, e.g. `/images/saying_1_...png`.
    pub image_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// The `{saying, prompt}` pair used for create/update bodies and for
/// import/export. Unknown fields are ignored on input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SayingEntry {
    pub saying: String,
    pub prompt: String,
}

impl SayingEntry {
    pub fn new(saying: impl Into<String>, prompt: impl Into<String>) -> Self {
        SayingEntry { saying: saying.into(), prompt: prompt.into() }
    }
}

/// `{"sayings": [...]}`, the import/export document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub sayings: Vec<SayingEntry>,
}

fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("'{}' must not be empty", field)));
    }
    Ok(())
}

fn row_to_saying(row: &rusqlite::Row<'_>) -> rusqlite::Result<Saying> {
    Ok(Saying {
        id: row.get(0)?,
        saying: row.get(1)?,
        prompt: row.get(2)?,
        image_path: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn find(conn: &Connection, id: i64) -> AppResult<Option<Saying>> {
    let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
    Ok(conn.query_row(&sql, params![id], row_to_saying).optional()?)
}

fn fetch(conn: &Connection, id: i64) -> AppResult<Saying> {
    find(conn, id)?.ok_or(AppError::NotFound(id))
}

#[derive(Clone)]
pub struct SayingStore {
    db: Arc<Mutex<Connection>>,
}

impl SayingStore {
    /// Opens or creates the database file and its table.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn)
    }

    /// A private, throwaway database. Used by tests and dry runs.
    pub fn open_in_memory() -> AppResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(SayingStore { db: Arc::new(Mutex::new(conn)) })
    }

    /// Run blocking SQLite work on tokio's blocking pool. Works on both the
    /// current-thread and multi-thread runtimes.
    async fn run<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|_| AppError::Storage("database lock poisoned".into()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| AppError::Storage(format!("database task failed: {}", e)))?
    }

    pub async fn create(&self, saying: &str, prompt: &str) -> AppResult<Saying> {
        require_non_empty("saying", saying)?;
        require_non_empty("prompt", prompt)?;
        let (saying, prompt) = (saying.to_string(), prompt.to_string());
        let created = self.run(move |conn| {
            conn.execute(
                "INSERT INTO sayings (saying, prompt, image_path, updated_at) VALUES (?1, ?2, NULL, ?3)",
                params![saying, prompt, Utc::now()],
            )?;
            fetch(conn, conn.last_insert_rowid())
        })
        .await?;
        tracing::info!(id = created.id, "Created saying");
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> AppResult<Saying> {
        self.run(move |conn| fetch(conn, id)).await
    }

    /// All sayings in id order.
    pub async fn list(&self) -> AppResult<Vec<Saying>> {
        self.run(|conn| {
            let sql = format!("{} ORDER BY id ASC", SELECT_COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], row_to_saying)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    /// Replace the saying text and prompt. `image_path` is kept as is.
    pub async fn update(&self, id: i64, saying: &str, prompt: &str) -> AppResult<Saying> {
        require_non_empty("saying", saying)?;
        require_non_empty("prompt", prompt)?;
        let (saying, prompt) = (saying.to_string(), prompt.to_string());
        let updated = self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE sayings SET saying = ?1, prompt = ?2, updated_at = ?3 WHERE id = ?4",
                params![saying, prompt, Utc::now(), id],
            )?;
            if changed == 0 {
                return Err(AppError::NotFound(id));
            }
            fetch(conn, id)
        })
        .await?;
        tracing::info!(id, "Updated saying");
        Ok(updated)
    }

    /// Link a freshly written image to the saying.
    pub async fn set_image(&self, id: i64, image_path: &str) -> AppResult<Saying> {
        let image_path = image_path.to_string();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE sayings SET image_path = ?1, updated_at = ?2 WHERE id = ?3",
                params![image_path, Utc::now(), id],
            )?;
            if changed == 0 {
                return Err(AppError::NotFound(id));
            }
            fetch(conn, id)
        })
        .await
    }

    /// Remove a saying, returning the row as it was so the caller can clean
    /// up its image.
    pub async fn delete(&self, id: i64) -> AppResult<Saying> {
        let removed = self
            .run(move |conn| {
                let existing = fetch(conn, id)?;
                conn.execute("DELETE FROM sayings WHERE id = ?1", params![id])?;
                Ok(existing)
            })
            .await?;
        tracing::info!(id, "Deleted saying");
        Ok(removed)
    }

    /// Append every entry as a new saying in one transaction. No
    /// de-duplication against existing rows. Any entry with an empty saying
    /// rejects the whole batch.
    pub async fn import_sayings(&self, entries: &[SayingEntry]) -> AppResult<Vec<Saying>> {
        for (idx, entry) in entries.iter().enumerate() {
            if entry.saying.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "sayings[{}]: 'saying' must not be empty",
                    idx
                )));
            }
        }
        let entries = entries.to_vec();
        let imported = self.run(move |conn| {
            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(entries.len());
            {
                let mut insert = tx.prepare(
                    "INSERT INTO sayings (saying, prompt, image_path, updated_at) VALUES (?1, ?2, NULL, ?3)",
                )?;
                for entry in &entries {
                    insert.execute(params![entry.saying, entry.prompt, Utc::now()])?;
                    ids.push(tx.last_insert_rowid());
                }
            }
            let rows = ids
                .into_iter()
                .map(|id| fetch(&tx, id))
                .collect::<AppResult<Vec<_>>>()?;
            tx.commit()?;
            Ok(rows)
        })
        .await?;
        tracing::info!(count = imported.len(), "Imported sayings");
        Ok(imported)
    }

    /// Every saying as `{saying, prompt}`, in id order. Ids, timestamps and
    /// image paths are left out.
    pub async fn export_all(&self) -> AppResult<ExportPayload> {
        let sayings = self
            .list()
            .await?
            .into_iter()
            .map(|s| SayingEntry { saying: s.saying, prompt: s.prompt })
            .collect();
        Ok(ExportPayload { sayings })
    }
}
