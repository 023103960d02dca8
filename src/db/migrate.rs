use crate::db::db_utils::{has_column, table_exists};
use rusqlite::{Connection, Error, OptionalExtension, Result};
use tracing::info;

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Create the `employees` table (without the optional device mapping column).
fn create_employees_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            name            TEXT PRIMARY KEY,
            employee_name   TEXT,
            employee_number TEXT,
            user_id         TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_employees_number ON employees(employee_number);
        CREATE INDEX IF NOT EXISTS idx_employees_user ON employees(user_id);
        "#,
    )?;
    Ok(())
}

/// Create the `checkins` table with its dedupe constraint.
fn create_checkins_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS checkins (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            employee             TEXT NOT NULL,
            employee_name        TEXT,
            time                 TEXT NOT NULL,
            log_type             TEXT NOT NULL CHECK(log_type IN ('IN','OUT')),
            device_id            TEXT NOT NULL DEFAULT '',
            skip_auto_attendance INTEGER NOT NULL DEFAULT 0,
            meta                 TEXT DEFAULT '',
            created_at           TEXT NOT NULL,
            modified_at          TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_checkins_identity
            ON checkins(employee, time, log_type, device_id);
        CREATE INDEX IF NOT EXISTS idx_checkins_employee_time ON checkins(employee, time);
        CREATE INDEX IF NOT EXISTS idx_checkins_device ON checkins(device_id);
        "#,
    )?;
    Ok(())
}

/// Expiring key/value cache and per-scope sync checkpoints.
fn create_runtime_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cache (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            expires_at TEXT
        );

        CREATE TABLE IF NOT EXISTS sync_state (
            scope        TEXT PRIMARY KEY,
            last_sync    TEXT,
            total_synced INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )?;
    Ok(())
}

fn migration_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// Add the custom device-ID mapping column to `employees`.
fn migrate_add_attendance_device_id(conn: &Connection) -> Result<(), Error> {
    let version = "20251004_0002_add_attendance_device_id";

    if migration_applied(conn, version)? {
        return Ok(());
    }

    if !has_column(conn, "employees", "attendance_device_id")? {
        conn.execute(
            "ALTER TABLE employees ADD COLUMN attendance_device_id TEXT;",
            [],
        )
        .map_err(|e| {
            Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(format!("Failed to add 'attendance_device_id' column: {}", e)),
            )
        })?;
        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_employees_device ON employees(attendance_device_id);",
        )?;
    }

    mark_applied(
        conn,
        version,
        "Added attendance_device_id mapping to employees",
    )?;
    info!(version, "migration applied");

    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    // 1) Ensure log table
    ensure_log_table(conn)?;

    // 2) Base tables
    if !table_exists(conn, "employees")? {
        create_employees_table(conn)?;
        info!("created employees table");
    }
    if !table_exists(conn, "checkins")? {
        create_checkins_table(conn)?;
        info!("created checkins table");
    }
    create_runtime_tables(conn)?;

    // 3) Additive migrations
    migrate_add_attendance_device_id(conn)?;

    Ok(())
}
