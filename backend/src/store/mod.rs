//! SQLite persistence.
//!
//! `SqliteStore` only remembers where the database lives; every operation
//! opens its own connection, so the store is cheap to clone into blocking
//! tasks and concurrent requests never share a handle. Uniqueness of coupon
//! codes is enforced by the `coupon_info.unique_code` constraint.

mod coupons;
mod users;

pub use coupons::{CouponQuery, VerifyOutcome};
pub use users::UserRecord;

use crate::error::ServiceError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::PathBuf;
use std::time::Duration;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS coupon_info (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    unique_code           TEXT NOT NULL UNIQUE,
    link_unique_coupon_cc TEXT NOT NULL,
    date_created          TEXT NOT NULL,
    verified_flag         INTEGER NOT NULL DEFAULT 0,
    verified_on           TEXT,
    verified_location     TEXT,
    del                   INTEGER NOT NULL DEFAULT 0,
    updated_at            TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_coupon_verified ON coupon_info (verified_flag);

CREATE TABLE IF NOT EXISTS dynamic_link_info (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    coupon_link TEXT NOT NULL,
    del         INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS user_info (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    user_name  TEXT NOT NULL UNIQUE,
    email      TEXT,
    mobile     TEXT,
    password   TEXT NOT NULL,
    status     INTEGER NOT NULL DEFAULT 1,
    del        INTEGER NOT NULL DEFAULT 0,
    last_login TEXT
);
";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time in the format stored in every timestamp column.
pub fn timestamp_now() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn connect(&self) -> Result<Connection, ServiceError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    /// Creates missing tables and switches the file to WAL so readers do not
    /// block the bulk insert.
    pub fn init(&self) -> Result<(), ServiceError> {
        let conn = self.connect()?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("sqlite journal mode: {}", mode);
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Makes `prefix` the single active link configuration. Earlier rows are
    /// soft-deleted; links already issued keep their old prefix.
    pub fn set_link_prefix(&self, prefix: &str) -> Result<(), ServiceError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current: Option<String> = tx
            .query_row(
                "SELECT coupon_link FROM dynamic_link_info WHERE del = 0 ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if current.as_deref() != Some(prefix) {
            tx.execute("UPDATE dynamic_link_info SET del = 1 WHERE del = 0", [])?;
            tx.execute(
                "INSERT INTO dynamic_link_info (coupon_link, del) VALUES (?1, 0)",
                params![prefix],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SqliteStore;
    use tempfile::TempDir;

    /// A fresh, initialised database inside a temp dir that lives as long as
    /// the returned guard.
    pub fn temp_store() -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("coupons.sqlite"));
        store.init().unwrap();
        (dir, store)
    }
}
