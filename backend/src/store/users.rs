use super::{timestamp_now, SqliteStore};
use crate::error::ServiceError;
use common::model::user::UserProfile;
use rusqlite::{params, OptionalExtension, Row};

/// An operator account as stored, without the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub profile: UserProfile,
}

impl UserRecord {
    pub fn is_active(&self) -> bool {
        self.profile.status != 0
    }
}

const USER_COLUMNS: &str = "id, name, user_name, email, mobile, status";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        profile: UserProfile {
            id: row.get(0)?,
            name: row.get(1)?,
            user_name: row.get(2)?,
            email: row.get(3)?,
            mobile: row.get(4)?,
            status: row.get(5)?,
        },
    })
}

impl SqliteStore {
    pub fn find_user_by_credentials(
        &self,
        user_name: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, ServiceError> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {} FROM user_info WHERE user_name = ?1 AND password = ?2 AND del = 0",
            USER_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![user_name, password], user_from_row)
            .optional()?)
    }

    pub fn find_user(&self, id: i64) -> Result<Option<UserRecord>, ServiceError> {
        let conn = self.connect()?;
        let sql = format!("SELECT {} FROM user_info WHERE id = ?1 AND del = 0", USER_COLUMNS);
        Ok(conn.query_row(&sql, params![id], user_from_row).optional()?)
    }

    pub fn touch_last_login(&self, id: i64) -> Result<(), ServiceError> {
        let conn = self.connect()?;
        let now = timestamp_now();
        conn.execute(
            "UPDATE user_info SET last_login = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        Ok(())
    }

    /// Creates or resets an active account. Used to seed the admin login.
    pub fn upsert_user(&self, user_name: &str, password: &str) -> Result<i64, ServiceError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO user_info (name, user_name, password, status, del)
             VALUES (?1, ?1, ?2, 1, 0)
             ON CONFLICT(user_name) DO UPDATE SET password = excluded.password, status = 1, del = 0",
            params![user_name, password],
        )?;
        let id = conn.query_row(
            "SELECT id FROM user_info WHERE user_name = ?1",
            params![user_name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn set_user_status(&self, id: i64, status: u8) -> Result<(), ServiceError> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE user_info SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        Ok(())
    }
}
