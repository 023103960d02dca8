//! Employee directory and device-code resolution.

use crate::db::db_utils::has_column;
use crate::errors::AppResult;
use crate::models::checkin::TIME_FORMAT;
use crate::models::employee::Employee;
use crate::utils::date::now_local;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::io::Read;

/// Employee matched for a device code, and the field that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEmployee {
    pub employee: Employee,
    pub matched_on: &'static str,
}

/// Lookup order for a device-reported code.
const RESOLUTION_FIELDS: &[&str] = &["employee_number", "user_id", "attendance_device_id"];

const OPTIONAL_FIELD: &str = "attendance_device_id";

/// Resolve a device code to an employee. First matching field wins;
/// `attendance_device_id` is only consulted when the column exists.
pub fn resolve_employee(conn: &Connection, code: &str) -> AppResult<Option<ResolvedEmployee>> {
    let code = code.trim();
    if code.is_empty() {
        return Ok(None);
    }

    let has_mapping = has_column(conn, "employees", OPTIONAL_FIELD)?;
    let mapping_col = if has_mapping { OPTIONAL_FIELD } else { "NULL" };

    for field in RESOLUTION_FIELDS {
        if *field == OPTIONAL_FIELD && !has_mapping {
            continue;
        }

        let sql = format!(
            "SELECT name, employee_name, employee_number, user_id, {mapping_col}
             FROM employees WHERE {field} = ?1
             ORDER BY name ASC LIMIT 1"
        );
        let found = conn
            .query_row(&sql, [code], |row| {
                Ok(Employee {
                    name: row.get(0)?,
                    employee_name: row.get(1)?,
                    employee_number: row.get(2)?,
                    user_id: row.get(3)?,
                    attendance_device_id: row.get(4)?,
                })
            })
            .optional()?;

        if let Some(employee) = found {
            tracing::debug!(code, field, employee = %employee.name, "employee resolved");
            return Ok(Some(ResolvedEmployee {
                employee,
                matched_on: field,
            }));
        }
    }

    tracing::debug!(code, "no employee for device code");
    Ok(None)
}

/// Insert or replace an employee.
pub fn upsert_employee(conn: &Connection, e: &Employee) -> AppResult<()> {
    let now = now_local().format(TIME_FORMAT).to_string();

    if has_column(conn, "employees", OPTIONAL_FIELD)? {
        conn.execute(
            "INSERT OR REPLACE INTO employees
                (name, employee_name, employee_number, user_id, attendance_device_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                e.name,
                e.employee_name,
                e.employee_number,
                e.user_id,
                e.attendance_device_id,
                now
            ],
        )?;
    } else {
        conn.execute(
            "INSERT OR REPLACE INTO employees
                (name, employee_name, employee_number, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![e.name, e.employee_name, e.employee_number, e.user_id, now],
        )?;
    }
    Ok(())
}

pub fn list_employees(conn: &Connection) -> AppResult<Vec<Employee>> {
    let mapping_col = if has_column(conn, "employees", OPTIONAL_FIELD)? {
        OPTIONAL_FIELD
    } else {
        "NULL"
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT name, employee_name, employee_number, user_id, {mapping_col}
         FROM employees ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(Employee {
            name: row.get(0)?,
            employee_name: row.get(1)?,
            employee_number: row.get(2)?,
            user_id: row.get(3)?,
            attendance_device_id: row.get(4)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Import a CSV directory export with a header row
/// (`name,employee_name,employee_number,user_id,attendance_device_id`).
/// Returns the number of rows written.
pub fn import_csv<R: Read>(conn: &Connection, reader: R) -> AppResult<usize> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    for row in rdr.deserialize::<Employee>() {
        let e = row?;
        if e.name.is_empty() {
            continue;
        }
        upsert_employee(&tx, &e)?;
        count += 1;
    }
    tx.commit()?;
    Ok(count)
}
