#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::NaiveDateTime;
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::path::PathBuf;
use zkcheckin::db::employees::upsert_employee;
use zkcheckin::db::pool::DbPool;
use zkcheckin::models::employee::Employee;
use zkcheckin::models::label::Label;
use zkcheckin::models::punch::Punch;
use zkcheckin::models::raw::RawFields;

pub fn zkc() -> Command {
    cargo_bin_cmd!("zkcheckin")
}

/// Unique test DB path inside the system temp dir, removed if present
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_zkcheckin.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Temp file path with the given extension, removed if present
pub fn temp_file(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_zkcheckin.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Write a config file for CLI tests and return its path.
pub fn write_config(name: &str, db_path: &str, extra: &str) -> String {
    let path = temp_file(name, "conf");
    let yaml = format!("database: {}\n{}", db_path, extra);
    fs::write(&path, yaml).expect("write config");
    path
}

/// Init a DB through the CLI and register one employee with number 1001.
pub fn init_cli_db(db_path: &str, cfg_path: &str) {
    zkc()
        .args(["--db", db_path, "--config", cfg_path, "init"])
        .assert()
        .success();
    zkc()
        .args([
            "--db", db_path, "--config", cfg_path, "employee", "--add", "alice", "--number",
            "1001",
        ])
        .assert()
        .success();
}

/// Fixed clock used by library tests.
pub fn fixed_now() -> NaiveDateTime {
    ts("2025-06-02 12:00:00")
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid timestamp")
}

/// Yesterday at `hh:mm:00`, local time; keeps CLI data inside the 90-day window.
pub fn yesterday_at(hour: u32, minute: u32) -> String {
    let day = chrono::Local::now().date_naive() - chrono::Duration::days(1);
    day.and_hms_opt(hour, minute, 0)
        .expect("valid time")
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub fn raw(v: Value) -> RawFields {
    serde_json::from_value(v).expect("raw fields")
}

/// Punch for `code` at `when` with the given label and an empty record.
pub fn punch(code: &str, when: &str, label: Label) -> Punch {
    Punch::new(
        Some(code.to_string()),
        Some(ts(when)),
        "Main Gate",
        raw(json!({ "emp_code": code, "punch_time": when })),
    )
    .with_label(label)
}

/// In-memory DB with employee `alice` (number 1001) and `bob` (user u-bob).
pub fn memory_db() -> DbPool {
    let pool = DbPool::in_memory().expect("in-memory db");
    let alice = Employee {
        employee_name: Some("Alice Doe".into()),
        employee_number: Some("1001".into()),
        ..Employee::new("alice")
    };
    let bob = Employee {
        user_id: Some("u-bob".into()),
        ..Employee::new("bob")
    };
    upsert_employee(&pool.conn, &alice).expect("add alice");
    upsert_employee(&pool.conn, &bob).expect("add bob");
    pool
}

/// Transactions JSON in the BioTime `data` shape.
pub fn transactions_body(records: &[(&str, &str)]) -> Value {
    let data: Vec<Value> = records
        .iter()
        .enumerate()
        .map(|(i, (code, when))| {
            json!({
                "id": 1000 + i,
                "emp_code": code,
                "punch_time": when,
                "terminal_sn": "CJDE000123",
                "terminal_alias": "Main Gate",
                "verify_type_display": "Fingerprint"
            })
        })
        .collect();
    json!({ "count": data.len(), "next": null, "data": data })
}
