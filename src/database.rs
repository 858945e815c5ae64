//! Database module - SQLite integration with async operations.
//!
//! All access goes through one [`tokio_rusqlite::Connection`], which funnels
//! every call onto a single worker thread. Each `call` closure therefore runs
//! to completion before the next one starts; the event-registration
//! read-modify-write relies on this (see `repositories::EventRepository`).

use std::sync::Arc;

use thiserror::Error;
use tokio_rusqlite::Connection as AsyncConnection;

pub mod models;
pub mod repositories;

/// Errors surfaced by the storage layer.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("database error: {0}")]
    Connection(#[from] tokio_rusqlite::Error),
}

/// Shared handle to the SQLite store.
#[derive(Clone)]
pub struct Database {
    conn: Arc<AsyncConnection>,
}

impl Database {
    /// Open an in-memory database and create the schema.
    pub async fn new() -> Result<Self, DatabaseError> {
        let conn = AsyncConnection::open_in_memory().await?;
        let db = Self {
            conn: Arc::new(conn),
        };
        db.init_tables().await?;
        Ok(db)
    }

    /// Open a file-backed database and create the schema.
    pub async fn new_with_path(path: &str) -> Result<Self, DatabaseError> {
        if path == ":memory:" {
            return Self::new().await;
        }
        let conn = AsyncConnection::open(path).await?;
        let db = Self {
            conn: Arc::new(conn),
        };
        db.init_tables().await?;
        Ok(db)
    }

    /// Run a closure on the connection's worker thread.
    pub(crate) async fn call<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        Ok(self.conn.call(f).await?)
    }

    /// Initialize database tables.
    async fn init_tables(&self) -> Result<(), DatabaseError> {
        self.call(|conn| {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;

                CREATE TABLE IF NOT EXISTS users (
                    id            TEXT PRIMARY KEY,
                    name          TEXT NOT NULL,
                    email         TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    role          TEXT NOT NULL DEFAULT 'student',
                    student_id    TEXT,
                    phone         TEXT,
                    bio           TEXT,
                    avatar        TEXT,
                    created_at    TEXT NOT NULL,
                    updated_at    TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS blog_posts (
                    id             TEXT PRIMARY KEY,
                    title          TEXT NOT NULL,
                    content        TEXT NOT NULL,
                    author_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    category       TEXT NOT NULL,
                    featured_image TEXT,
                    tags           TEXT NOT NULL DEFAULT '[]',
                    published      INTEGER NOT NULL DEFAULT 0,
                    views          INTEGER NOT NULL DEFAULT 0,
                    created_at     TEXT NOT NULL,
                    updated_at     TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS events (
                    id                    TEXT PRIMARY KEY,
                    title                 TEXT NOT NULL,
                    description           TEXT NOT NULL,
                    date                  TEXT NOT NULL,
                    location              TEXT NOT NULL,
                    organizer_id          TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    image                 TEXT,
                    category              TEXT NOT NULL,
                    registration_required INTEGER NOT NULL DEFAULT 0,
                    max_participants      INTEGER,
                    published             INTEGER NOT NULL DEFAULT 0,
                    created_at            TEXT NOT NULL,
                    updated_at            TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS event_registrations (
                    event_id      TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                    user_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    registered_at TEXT NOT NULL,
                    PRIMARY KEY (event_id, user_id)
                );

                CREATE TABLE IF NOT EXISTS galleries (
                    id          TEXT PRIMARY KEY,
                    title       TEXT NOT NULL,
                    description TEXT,
                    images      TEXT NOT NULL DEFAULT '[]',
                    event_id    TEXT REFERENCES events(id) ON DELETE SET NULL,
                    uploaded_by TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    published   INTEGER NOT NULL DEFAULT 0,
                    created_at  TEXT NOT NULL,
                    updated_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS contacts (
                    id         TEXT PRIMARY KEY,
                    name       TEXT NOT NULL,
                    email      TEXT NOT NULL,
                    phone      TEXT,
                    subject    TEXT NOT NULL,
                    message    TEXT NOT NULL,
                    status     TEXT NOT NULL DEFAULT 'pending',
                    replied_by TEXT REFERENCES users(id) ON DELETE SET NULL,
                    reply      TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );",
            )?;
            Ok(())
        })
        .await
    }

    /// Ping the database with a minimal query to check connectivity.
    pub async fn ping(&self) -> Result<bool, DatabaseError> {
        self.call(|conn| {
            let mut stmt = conn.prepare("SELECT 1")?;
            let mut rows = stmt.query([])?;
            Ok(rows.next()?.is_some())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_and_ping() {
        let db = Database::new().await.unwrap();
        assert!(db.ping().await.unwrap());

        let tables: Vec<String> = db
            .call(|conn| {
                let mut stmt = conn
                    .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .unwrap();

        for table in [
            "users",
            "blog_posts",
            "events",
            "event_registrations",
            "galleries",
            "contacts",
        ] {
            assert!(tables.iter().any(|t| t == table), "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_file_backed_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::new_with_path(path.to_str().unwrap()).await.unwrap();
        assert!(db.ping().await.unwrap());
    }
}
