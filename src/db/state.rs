use crate::errors::{AppError, AppResult};
use crate::models::checkin::TIME_FORMAT;
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

/// Scope of the all-devices checkpoint.
pub const GLOBAL_SCOPE: &str = "global";

/// Sync checkpoint for one scope (a device name, or `global`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncState {
    pub last_sync: Option<NaiveDateTime>,
    pub total_synced: i64,
}

pub fn load_state(conn: &Connection, scope: &str) -> AppResult<SyncState> {
    let row: Option<(Option<String>, i64)> = conn
        .query_row(
            "SELECT last_sync, total_synced FROM sync_state WHERE scope = ?1",
            [scope],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((last, total_synced)) = row else {
        return Ok(SyncState::default());
    };

    let last_sync = match last {
        Some(s) => Some(
            NaiveDateTime::parse_from_str(&s, TIME_FORMAT)
                .map_err(|_| AppError::InvalidTimestamp(s.clone()))?,
        ),
        None => None,
    };

    Ok(SyncState {
        last_sync,
        total_synced,
    })
}

pub fn save_state(conn: &Connection, scope: &str, state: &SyncState) -> AppResult<()> {
    conn.execute(
        "INSERT INTO sync_state (scope, last_sync, total_synced) VALUES (?1, ?2, ?3)
         ON CONFLICT(scope) DO UPDATE
            SET last_sync = excluded.last_sync, total_synced = excluded.total_synced",
        params![
            scope,
            state.last_sync.map(|t| t.format(TIME_FORMAT).to_string()),
            state.total_synced
        ],
    )?;
    Ok(())
}
