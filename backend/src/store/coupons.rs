use super::SqliteStore;
use crate::error::ServiceError;
use crate::ingest::gate::{CouponRepository, NewCoupon};
use common::model::coupon::{CouponCode, CouponCounts, CouponListItem};
use common::model::link_config::DynamicLinkConfig;
use common::requests::CouponFilter;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashSet;

/// Normalised listing/export criteria.
#[derive(Debug, Clone, Default)]
pub struct CouponQuery {
    pub verified_flag: Option<u8>,
    pub filter: CouponFilter,
    /// `None` returns every matching row.
    pub limit: Option<u64>,
    pub offset: u64,
}

/// Result of a verification write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified(CouponCode),
    AlreadyVerified(CouponCode),
    NotFound,
}

impl CouponRepository for SqliteStore {
    fn active_link_config(&self) -> Result<Option<DynamicLinkConfig>, ServiceError> {
        let conn = self.connect()?;
        let config = conn
            .query_row(
                "SELECT id, coupon_link FROM dynamic_link_info
                 WHERE del = 0 AND coupon_link <> '' ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(DynamicLinkConfig {
                        id: row.get(0)?,
                        coupon_link: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(config)
    }

    fn existing_codes(&self, codes: &[String]) -> Result<HashSet<String>, ServiceError> {
        if codes.is_empty() {
            return Ok(HashSet::new());
        }
        // One round trip regardless of batch size: the candidates travel as a
        // JSON array and are expanded by json_each.
        let candidates = serde_json::to_string(codes)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT unique_code FROM coupon_info
             WHERE unique_code IN (SELECT value FROM json_each(?1))",
        )?;
        let found = stmt
            .query_map(params![candidates], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(found)
    }

    fn insert_new_codes(&self, rows: &[NewCoupon]) -> Result<usize, ServiceError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO coupon_info
                 (unique_code, link_unique_coupon_cc, date_created, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
            )?;
            for row in rows {
                inserted += stmt.execute(params![row.unique_code, row.link, row.created_at])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

fn coupon_from_row(row: &Row<'_>) -> rusqlite::Result<CouponCode> {
    Ok(CouponCode {
        id: row.get(0)?,
        unique_code: row.get(1)?,
        link_unique_coupon_cc: row.get(2)?,
        date_created: row.get(3)?,
        verified_flag: row.get(4)?,
        verified_on: row.get(5)?,
        verified_location: row.get(6)?,
    })
}

const COUPON_COLUMNS: &str = "id, unique_code, link_unique_coupon_cc, date_created, \
     verified_flag, verified_on, verified_location";

/// Escapes LIKE wildcards so `_` in a code matches only an underscore.
fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// SQLite integers are signed; larger values are pinned to `i64::MAX`.
fn sql_integer(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Builds the shared WHERE clause and its positional values.
fn where_clause(query: &CouponQuery) -> (String, Vec<Value>) {
    let mut clauses = vec!["del = 0".to_string()];
    let mut values = Vec::new();

    if let Some(flag) = query.verified_flag {
        values.push(Value::Integer(i64::from(flag)));
        clauses.push(format!("verified_flag = ?{}", values.len()));
    }
    let text_filters = [
        ("date_created", &query.filter.date_created),
        ("unique_code", &query.filter.unique_code),
        ("link_unique_coupon_cc", &query.filter.link_unique_coupon_cc),
    ];
    for (column, needle) in text_filters {
        if let Some(needle) = needle.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            values.push(Value::Text(contains_pattern(needle)));
            clauses.push(format!("{} LIKE ?{} ESCAPE '\\'", column, values.len()));
        }
    }

    (clauses.join(" AND "), values)
}

impl SqliteStore {
    pub fn find_by_code(&self, code: &str) -> Result<Option<CouponCode>, ServiceError> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT {} FROM coupon_info WHERE unique_code = ?1 AND del = 0",
            COUPON_COLUMNS
        );
        Ok(conn.query_row(&sql, params![code], coupon_from_row).optional()?)
    }

    pub fn list(&self, query: &CouponQuery) -> Result<Vec<CouponListItem>, ServiceError> {
        let conn = self.connect()?;
        let (clause, mut values) = where_clause(query);
        let mut sql = format!(
            "SELECT id, date_created, unique_code, link_unique_coupon_cc
             FROM coupon_info WHERE {} ORDER BY id DESC",
            clause
        );
        if let Some(limit) = query.limit {
            values.push(Value::Integer(sql_integer(limit)));
            values.push(Value::Integer(sql_integer(query.offset)));
            sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", values.len() - 1, values.len()));
        }
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(CouponListItem {
                    id: row.get(0)?,
                    date_created: row.get(1)?,
                    unique_code: row.get(2)?,
                    link_unique_coupon_cc: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn count(&self, query: &CouponQuery) -> Result<u64, ServiceError> {
        let conn = self.connect()?;
        let (clause, values) = where_clause(query);
        let sql = format!("SELECT COUNT(*) FROM coupon_info WHERE {}", clause);
        let total: i64 = conn.query_row(&sql, params_from_iter(values), |row| row.get(0))?;
        Ok(total as u64)
    }

    pub fn counts(&self) -> Result<CouponCounts, ServiceError> {
        let conn = self.connect()?;
        let (total, verified): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(verified_flag = 1), 0) FROM coupon_info WHERE del = 0",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(CouponCounts {
            total_generated: total as u64,
            total_verified: verified as u64,
            total_not_verified: (total - verified) as u64,
        })
    }

    /// Full records for the CSV export, newest first.
    pub fn export_rows(&self, filter: &CouponFilter) -> Result<Vec<CouponCode>, ServiceError> {
        let conn = self.connect()?;
        let query = CouponQuery {
            filter: filter.clone(),
            ..CouponQuery::default()
        };
        let (clause, values) = where_clause(&query);
        let sql = format!(
            "SELECT {} FROM coupon_info WHERE {} ORDER BY id DESC",
            COUPON_COLUMNS, clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), coupon_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Flips the verification flag. With `overwrite` an already verified code
    /// gets the new timestamp and location; otherwise only the 0 → 1 transition
    /// writes, and the update itself guards against two scans racing.
    pub fn mark_verified(
        &self,
        code: &str,
        verified_on: &str,
        location: &str,
        overwrite: bool,
    ) -> Result<VerifyOutcome, ServiceError> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE coupon_info
             SET verified_flag = 1, verified_on = ?2, verified_location = ?3, updated_at = ?2
             WHERE unique_code = ?1 AND del = 0 AND (verified_flag = 0 OR ?4)",
            params![code, verified_on, location, overwrite],
        )?;
        drop(conn);

        match self.find_by_code(code)? {
            None => Ok(VerifyOutcome::NotFound),
            Some(coupon) if changed == 1 => Ok(VerifyOutcome::Verified(coupon)),
            Some(coupon) => Ok(VerifyOutcome::AlreadyVerified(coupon)),
        }
    }
}
