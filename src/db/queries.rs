use crate::db::db_utils::contains_pattern;
use crate::errors::{AppError, AppResult};
use crate::models::checkin::{Checkin, TIME_FORMAT};
use crate::models::label::Direction;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Result, Row, params, params_from_iter};

/// Filters shared by the repair and duplicate-removal passes.
#[derive(Debug, Clone, Default)]
pub struct CheckinFilter {
    /// Substring of `device_id`.
    pub device_pattern: Option<String>,
    /// Only check-ins on or after this day.
    pub since: Option<NaiveDate>,
    pub employee: Option<String>,
}

pub fn map_row(row: &Row) -> Result<Checkin> {
    let time_str: String = row.get("time")?;
    let time = NaiveDateTime::parse_from_str(&time_str, TIME_FORMAT).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(AppError::InvalidTimestamp(time_str.clone())),
        )
    })?;

    let kind_str: String = row.get("log_type")?;
    let log_type = Direction::from_db_str(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(AppError::Other(format!("Invalid log_type: {}", kind_str))),
        )
    })?;

    Ok(Checkin {
        id: row.get("id")?,
        employee: row.get("employee")?,
        employee_name: row.get("employee_name")?,
        time,
        log_type,
        device_id: row.get("device_id")?,
        skip_auto_attendance: row.get::<_, i32>("skip_auto_attendance")? == 1,
        meta: row.get::<_, Option<String>>("meta")?.unwrap_or_default(),
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
    })
}

/// Insert a check-in and return its row id.
pub fn insert_checkin(conn: &Connection, ck: &Checkin) -> AppResult<i64> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO checkins (employee, employee_name, time, log_type, device_id,
                               skip_auto_attendance, meta, created_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    stmt.execute(params![
        ck.employee,
        ck.employee_name,
        ck.time_str(),
        ck.log_type.to_db_str(),
        ck.device_id,
        if ck.skip_auto_attendance { 1 } else { 0 },
        ck.meta,
        ck.created_at,
        ck.modified_at,
    ])?;
    Ok(conn.last_insert_rowid())
}

/// Existing check-in with the same identity: employee, second, label and a
/// device id containing `device`.
pub fn find_matching(
    conn: &Connection,
    employee: &str,
    time: &NaiveDateTime,
    log_type: Direction,
    device: &str,
) -> AppResult<Option<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM checkins
         WHERE employee = ?1 AND time = ?2 AND log_type = ?3
           AND device_id LIKE ?4 ESCAPE '\\'
         ORDER BY id ASC
         LIMIT 1",
    )?;
    let mut rows = stmt.query(params![
        employee,
        time.format(TIME_FORMAT).to_string(),
        log_type.to_db_str(),
        contains_pattern(device),
    ])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

/// Load check-ins ordered by employee, time, creation.
pub fn load_checkins(conn: &Connection, filter: &CheckinFilter) -> AppResult<Vec<Checkin>> {
    let mut sql = String::from("SELECT * FROM checkins WHERE 1=1");
    let mut args: Vec<SqlValue> = Vec::new();

    if let Some(p) = &filter.device_pattern {
        sql.push_str(" AND device_id LIKE ? ESCAPE '\\'");
        args.push(SqlValue::Text(contains_pattern(p)));
    }
    if let Some(d) = filter.since {
        sql.push_str(" AND time >= ?");
        args.push(SqlValue::Text(d.format("%Y-%m-%d").to_string()));
    }
    if let Some(e) = &filter.employee {
        sql.push_str(" AND employee = ?");
        args.push(SqlValue::Text(e.clone()));
    }
    sql.push_str(" ORDER BY employee ASC, time ASC, created_at ASC, id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn set_log_type(
    conn: &Connection,
    id: i64,
    log_type: Direction,
    modified_at: &str,
) -> AppResult<usize> {
    let mut stmt = conn.prepare_cached(
        "UPDATE checkins SET log_type = ?1, modified_at = ?2 WHERE id = ?3",
    )?;
    Ok(stmt.execute(params![log_type.to_db_str(), modified_at, id])?)
}

pub fn delete_checkins_by_ids(conn: &Connection, ids: &[i64]) -> AppResult<usize> {
    let mut stmt = conn.prepare_cached("DELETE FROM checkins WHERE id = ?1")?;
    let mut deleted = 0;
    for id in ids {
        deleted += stmt.execute([id])?;
    }
    Ok(deleted)
}

/// Count check-ins created at or after `since`.
pub fn count_created_since(
    conn: &Connection,
    since: &NaiveDateTime,
    log_type: Option<Direction>,
) -> AppResult<i64> {
    let since = since.format(TIME_FORMAT).to_string();
    let n = match log_type {
        Some(d) => conn.query_row(
            "SELECT COUNT(*) FROM checkins WHERE created_at >= ?1 AND log_type = ?2",
            params![since, d.to_db_str()],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM checkins WHERE created_at >= ?1",
            [since],
            |row| row.get(0),
        )?,
    };
    Ok(n)
}

pub fn count_checkins(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM checkins", [], |row| row.get(0))?)
}
