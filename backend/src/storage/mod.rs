//! # Storage
//!
//! Metadata lives in a single SQLite file; document bytes live next to it in
//! the [`documents::DocumentStore`]. Every request unit opens its own
//! connection through [`Database::connect`], so handlers never share a
//! connection across threads.
//!
//! ## Sub-modules:
//! - `templates`: template records (both kinds).
//! - `contracts`: contract records and the guarded signing transitions.
//! - `documents`: on-disk template and contract files.
//! - `ledger`: the booking/invoice collaborator backed by the same database.

pub mod contracts;
pub mod documents;
pub mod ledger;
pub mod templates;

use crate::error::AppResult;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS templates (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    markup TEXT,
    file_name TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS contracts (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL,
    client_name TEXT NOT NULL,
    title TEXT NOT NULL,
    value INTEGER NOT NULL,
    wedding_date TEXT NOT NULL,
    venue TEXT,
    package_type TEXT,
    template_id TEXT,
    status TEXT NOT NULL,
    sign_token TEXT,
    issued_token TEXT,
    client_signed_at TEXT,
    signed_at TEXT,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS clients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    phone TEXT
);
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    client_id TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS invoices (
    id TEXT PRIMARY KEY,
    project_id TEXT,
    client_name TEXT NOT NULL,
    client_email TEXT,
    project_title TEXT NOT NULL,
    amount INTEGER NOT NULL,
    status TEXT NOT NULL,
    due_date TEXT NOT NULL,
    invoice_type TEXT
);
";

/// Handle to the metadata database file.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Database { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a fresh connection. Writers wait on a locked database instead of
    /// failing immediately, which concurrent signing requests rely on.
    pub fn connect(&self) -> AppResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    /// Creates every table that does not exist yet.
    pub fn init_schema(&self) -> AppResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use tempfile::TempDir;

    /// A database with the schema applied, living as long as the returned dir.
    pub fn temp_database() -> (TempDir, Database) {
        let dir = TempDir::new().expect("temp dir");
        let db = Database::new(dir.path().join("test.sqlite"));
        db.init_schema().expect("schema");
        (dir, db)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::temp_database;

    #[test]
    fn schema_creation_is_idempotent() {
        let (_dir, db) = temp_database();
        db.init_schema().unwrap();
        let conn = db.connect().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);
    }
}
