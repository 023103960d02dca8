use crate::db::pool::DbPool;
use crate::utils::colors::{CYAN, GREEN, GREY, RED, RESET, YELLOW};
use chrono::NaiveDate;
use rusqlite::OptionalExtension;
use std::fs;

pub fn print_db_info(pool: &DbPool, db_path: &str) -> rusqlite::Result<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) TOTALS
    //
    let employees: i64 = pool
        .conn
        .query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))?;
    let count: i64 = pool
        .conn
        .query_row("SELECT COUNT(*) FROM checkins", [], |row| row.get(0))?;
    let ins: i64 = pool.conn.query_row(
        "SELECT COUNT(*) FROM checkins WHERE log_type = 'IN'",
        [],
        |row| row.get(0),
    )?;

    println!("{}• Employees:{} {}", CYAN, RESET, employees);
    println!(
        "{}• Total check-ins:{} {}{}{} ({}{} IN{}, {}{} OUT{})",
        CYAN,
        RESET,
        GREEN,
        count,
        RESET,
        GREEN,
        ins,
        RESET,
        RED,
        count - ins,
        RESET
    );

    //
    // 3) DATE RANGE
    //
    let first_date: Option<String> = pool
        .conn
        .query_row("SELECT MIN(substr(time, 1, 10)) FROM checkins", [], |row| {
            row.get(0)
        })
        .optional()?
        .flatten();

    let last_date: Option<String> = pool
        .conn
        .query_row("SELECT MAX(substr(time, 1, 10)) FROM checkins", [], |row| {
            row.get(0)
        })
        .optional()?
        .flatten();

    let fmt_first = first_date
        .clone()
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));
    let fmt_last = last_date
        .clone()
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));

    println!("{}• Date range:{}", CYAN, RESET);
    println!("    from: {}", fmt_first);
    println!("    to:   {}", fmt_last);

    //
    // 4) AVERAGE CHECK-INS/DAY
    //
    if let (Some(f), Some(l)) = (first_date, last_date) {
        let avg = average_per_day(count, parse_date(&f)?, parse_date(&l)?);
        println!("{}• Average check-ins/day:{} {:.2}", CYAN, RESET, avg);
    }

    println!();
    Ok(())
}

/// Check-ins per calendar day over `first..=last`.
pub fn average_per_day(count: i64, first: NaiveDate, last: NaiveDate) -> f64 {
    let days = (last - first).num_days().max(0) + 1;
    count as f64 / days as f64
}

fn parse_date(date_str: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}
