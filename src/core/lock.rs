//! Non-blocking sync lock held in the expiring cache.
//!
//! A held lock refuses immediately with `AppError::AlreadyRunning`. The
//! guard deletes its key when dropped, unless the lock expired and another
//! holder took it over; the TTL covers a process that died while holding it.

use crate::db::cache;
use crate::errors::{AppError, AppResult};
use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

static NEXT_GUARD: AtomicU64 = AtomicU64::new(1);

pub const LOCK_PREFIX: &str = "zkteco_sync_lock";

/// Cache key for a device lock, or the global one.
pub fn lock_key(device: Option<&str>) -> String {
    match device {
        Some(name) => format!("{}:{}", LOCK_PREFIX, name),
        None => LOCK_PREFIX.to_string(),
    }
}

#[derive(Debug)]
pub struct SyncLock<'c> {
    conn: &'c Connection,
    key: String,
    owner: String,
}

impl<'c> SyncLock<'c> {
    pub fn acquire(
        conn: &'c Connection,
        key: impl Into<String>,
        ttl: Duration,
        now: NaiveDateTime,
    ) -> AppResult<Self> {
        let key = key.into();
        let owner = format!(
            "pid {} guard {} since {}",
            std::process::id(),
            NEXT_GUARD.fetch_add(1, Ordering::Relaxed),
            now
        );

        if !cache::add(conn, &key, &owner, Some(ttl), now)? {
            let holder = cache::get(conn, &key, now)?.unwrap_or_default();
            warn!(key = %key, holder = %holder, "sync lock already held");
            return Err(AppError::AlreadyRunning(key));
        }

        debug!(key = %key, ttl_secs = ttl.num_seconds(), "sync lock acquired");
        Ok(Self { conn, key, owner })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for SyncLock<'_> {
    fn drop(&mut self) {
        match cache::delete_if(self.conn, &self.key, &self.owner) {
            Ok(true) => debug!(key = %self.key, "sync lock released"),
            Ok(false) => warn!(key = %self.key, "sync lock expired and was taken over; left in place"),
            Err(e) => warn!(key = %self.key, error = %e, "failed to release sync lock"),
        }
    }
}
