//! Document store backing the tracker.
//!
//! Collections are id -> JSON document tables in sqlite, opened by
//! path per operation. The store stays dumb: point writes, a merge
//! primitive, one equality-filtered lookup, and batch seeding for
//! empty collections. A revision counter bumped on every write drives
//! the subscription pump upstream.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::StoreError;
use crate::model::{ActivityEntry, Incident, Project, UserProfile};

/// Serialized documents above this size are rejected before the write.
/// Embedded base64 images are the realistic way to get here.
pub const MAX_DOCUMENT_BYTES: usize = 256 * 1024;

#[derive(Clone)]
pub struct Store {
    db_path: Arc<PathBuf>,
}

impl Store {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let db_path = PathBuf::from(path);
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Transport(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            CREATE TABLE IF NOT EXISTS incidents (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS activities (
                id TEXT PRIMARY KEY,
                incident_id TEXT NOT NULL,
                doc TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_activities_incident ON activities(incident_id);
            CREATE TABLE IF NOT EXISTS users (
                email TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS projects (
                name TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS credentials (
                email TEXT PRIMARY KEY,
                digest TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );
            INSERT OR IGNORE INTO meta (key, value) VALUES ('revision', 0);
            ",
        )?;

        Ok(Self {
            db_path: Arc::new(db_path),
        })
    }

    fn conn(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&*self.db_path)?)
    }

    /// Monotonic counter bumped on every incident/activity/project
    /// write. Pollers compare it to decide when to push a snapshot.
    pub fn revision(&self) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        let value = conn.query_row(
            "SELECT value FROM meta WHERE key = 'revision'",
            [],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(value)
    }

    fn bump_revision(conn: &Connection) -> Result<(), StoreError> {
        conn.execute("UPDATE meta SET value = value + 1 WHERE key = 'revision'", [])?;
        Ok(())
    }

    // --- incidents ---

    pub fn insert_incident(&self, incident: &Incident) -> Result<(), StoreError> {
        let doc = serde_json::to_string(incident)?;
        guard_size(&doc)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO incidents (id, doc) VALUES (?1, ?2)",
            params![incident.id, doc],
        )?;
        Self::bump_revision(&conn)?;
        Ok(())
    }

    pub fn get_incident(&self, id: &str) -> Result<Option<Incident>, StoreError> {
        let conn = self.conn()?;
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM incidents WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        doc.map(|d| serde_json::from_str(&d).map_err(StoreError::from))
            .transpose()
    }

    /// Shallow-merges the non-null fields of `patch` over the stored
    /// document. Null patch fields clear the stored field.
    pub fn merge_update_incident(
        &self,
        id: &str,
        patch: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM incidents WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        let Some(doc) = doc else {
            return Err(StoreError::Transport(format!("no document with id {id}")));
        };

        let mut merged: serde_json::Value = serde_json::from_str(&doc)?;
        if let (Some(target), Some(fields)) = (merged.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                if value.is_null() {
                    target.remove(key);
                } else {
                    target.insert(key.clone(), value.clone());
                }
            }
        }

        let doc = serde_json::to_string(&merged)?;
        guard_size(&doc)?;
        conn.execute(
            "UPDATE incidents SET doc = ?2 WHERE id = ?1",
            params![id, doc],
        )?;
        Self::bump_revision(&conn)?;
        Ok(())
    }

    /// Full collection, newest-created-first. Documents without a
    /// creation timestamp sort last.
    pub fn list_incidents(&self) -> Result<Vec<Incident>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT doc FROM incidents")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut incidents = Vec::new();
        for row in rows {
            let incident: Incident = serde_json::from_str(&row?)?;
            incidents.push(incident);
        }
        incidents.sort_by(|a, b| match (&b.created_at, &a.created_at) {
            (Some(b_ts), Some(a_ts)) => b_ts.cmp(a_ts),
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(incidents)
    }

    // --- activities ---

    pub fn append_activity(&self, entry: &ActivityEntry) -> Result<(), StoreError> {
        let doc = serde_json::to_string(entry)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO activities (id, incident_id, doc, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id,
                entry.incident_id,
                doc,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Self::bump_revision(&conn)?;
        Ok(())
    }

    /// Entries for one incident, ascending by creation time. The view
    /// layer reverses this for newest-first display.
    pub fn activities_for_incident(
        &self,
        incident_id: &str,
    ) -> Result<Vec<ActivityEntry>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT doc FROM activities
             WHERE incident_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![incident_id], |row| row.get::<_, String>(0))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(serde_json::from_str(&row?)?);
        }
        Ok(entries)
    }

    // --- users ---

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserProfile>, StoreError> {
        let conn = self.conn()?;
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        doc.map(|d| serde_json::from_str(&d).map_err(StoreError::from))
            .transpose()
    }

    pub fn upsert_user(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let doc = serde_json::to_string(profile)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (email, doc) VALUES (?1, ?2)
             ON CONFLICT(email) DO UPDATE SET doc = excluded.doc",
            params![profile.email, doc],
        )?;
        Ok(())
    }

    /// One-time batch seed; a no-op unless the collection is empty.
    pub fn seed_users(&self, profiles: &[UserProfile]) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(false);
        }

        let tx = conn.transaction()?;
        for profile in profiles {
            let doc = serde_json::to_string(profile)?;
            tx.execute(
                "INSERT INTO users (email, doc) VALUES (?1, ?2)",
                params![profile.email, doc],
            )?;
        }
        tx.commit()?;
        Ok(true)
    }

    // --- projects ---

    pub fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT doc FROM projects ORDER BY rowid ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(serde_json::from_str(&row?)?);
        }
        Ok(projects)
    }

    pub fn seed_projects(&self, projects: &[Project]) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(false);
        }

        let tx = conn.transaction()?;
        for project in projects {
            let doc = serde_json::to_string(project)?;
            tx.execute(
                "INSERT INTO projects (name, doc) VALUES (?1, ?2)",
                params![project.name, doc],
            )?;
        }
        tx.commit()?;
        Self::bump_revision(&conn)?;
        Ok(true)
    }

    // --- credentials ---

    pub fn credential_digest(&self, email: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        let digest = conn
            .query_row(
                "SELECT digest FROM credentials WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        Ok(digest)
    }

    pub fn set_credential(&self, email: &str, digest: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO credentials (email, digest) VALUES (?1, ?2)
             ON CONFLICT(email) DO UPDATE SET digest = excluded.digest",
            params![email, digest],
        )?;
        Ok(())
    }
}

fn guard_size(doc: &str) -> Result<(), StoreError> {
    if doc.len() > MAX_DOCUMENT_BYTES {
        return Err(StoreError::PayloadTooLarge);
    }
    Ok(())
}
