//! Fact store - rusqlite-backed document persistence.
//!
//! One JSON document per (user, collection) key, last write wins. A missing
//! document is "not found", never an error; callers proceed with empty
//! defaults. Writes are short and serialized behind a mutex.

use anyhow::{Context, Result};
use benji_common::FactBundle;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// User facts (demographics, goal text, medications, flow log).
pub const FACTS: &str = "facts";
/// Profile document edited through /profileinfo.
pub const PROFILE: &str = "profile";
/// Accepted and generated SMART goals.
pub const GOALS: &str = "goals";
/// Check-in history (JSON array document).
pub const CHECKINS: &str = "checkins";

pub struct FactStore {
    conn: Mutex<Connection>,
}

impl FactStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open fact store at {}", path.display()))?;
        Self::init(&conn)?;
        info!("Fact store ready at {}", path.display());
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn init(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                user_id    TEXT NOT NULL,
                collection TEXT NOT NULL,
                body       TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, collection)
            )",
            [],
        )
        .context("Failed to create documents table")?;
        Ok(())
    }

    /// Fetch one document. Absent documents are Ok(None).
    pub fn get(&self, user_id: &str, collection: &str) -> Result<Option<Value>> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE user_id = ?1 AND collection = ?2",
                params![user_id, collection],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(body) => {
                let value = serde_json::from_str(&body)
                    .with_context(|| format!("Corrupt document {}/{}", user_id, collection))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Replace one document, last write wins.
    pub fn put(&self, user_id: &str, collection: &str, value: &Value) -> Result<()> {
        let body = serde_json::to_string(value)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO documents (user_id, collection, body, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, collection) DO UPDATE
             SET body = excluded.body, updated_at = excluded.updated_at",
            params![user_id, collection, body, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Shallow merge into one document: non-null incoming values overwrite,
    /// everything else is preserved. Returns the merged document.
    pub fn merge(&self, user_id: &str, collection: &str, partial: &Value) -> Result<Value> {
        let mut bundle = match self.get(user_id, collection)? {
            Some(existing) => FactBundle::from_value(existing),
            None => FactBundle::new(),
        };
        bundle.merge(partial);
        let merged = bundle.to_value();
        self.put(user_id, collection, &merged)?;
        Ok(merged)
    }

    /// The user's fact bundle; empty when the user has no stored facts.
    pub fn facts(&self, user_id: &str) -> Result<FactBundle> {
        Ok(self
            .get(user_id, FACTS)?
            .map(FactBundle::from_value)
            .unwrap_or_default())
    }
}
