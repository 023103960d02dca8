//! Expiring key/value cache on top of the `cache` table.
//!
//! Expiry times are naive local timestamps; callers pass `now` so that
//! tests can move the clock.

use crate::errors::AppResult;
use crate::models::checkin::TIME_FORMAT;
use chrono::{Duration, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, params};

fn expiry(now: NaiveDateTime, ttl: Option<Duration>) -> Option<String> {
    ttl.map(|t| {
        now.checked_add_signed(t)
            .unwrap_or(NaiveDateTime::MAX)
            .format(TIME_FORMAT)
            .to_string()
    })
}

/// Value for `key`, unless missing or expired.
pub fn get(conn: &Connection, key: &str, now: NaiveDateTime) -> AppResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM cache
             WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
            params![key, now.format(TIME_FORMAT).to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Store `value` under `key`, replacing whatever was there.
pub fn set(
    conn: &Connection,
    key: &str,
    value: &str,
    ttl: Option<Duration>,
    now: NaiveDateTime,
) -> AppResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO cache (key, value, expires_at) VALUES (?1, ?2, ?3)",
        params![key, value, expiry(now, ttl)],
    )?;
    Ok(())
}

/// Store `value` only if `key` is absent or expired. Returns whether it was
/// stored. A single statement, so two processes cannot both win.
pub fn add(
    conn: &Connection,
    key: &str,
    value: &str,
    ttl: Option<Duration>,
    now: NaiveDateTime,
) -> AppResult<bool> {
    let changed = conn.execute(
        "INSERT INTO cache (key, value, expires_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE
            SET value = excluded.value, expires_at = excluded.expires_at
            WHERE cache.expires_at IS NOT NULL AND cache.expires_at <= ?4",
        params![
            key,
            value,
            expiry(now, ttl),
            now.format(TIME_FORMAT).to_string()
        ],
    )?;
    Ok(changed == 1)
}

pub fn delete(conn: &Connection, key: &str) -> AppResult<bool> {
    let changed = conn.execute("DELETE FROM cache WHERE key = ?1", [key])?;
    Ok(changed > 0)
}

/// Delete `key` only while it still holds `value`.
pub fn delete_if(conn: &Connection, key: &str, value: &str) -> AppResult<bool> {
    let changed = conn.execute(
        "DELETE FROM cache WHERE key = ?1 AND value = ?2",
        params![key, value],
    )?;
    Ok(changed > 0)
}
