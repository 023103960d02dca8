use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use rusqlite::Connection;
use std::fs;

mod common;
use common::{init_cli_db, setup_test_db, temp_file, transactions_body, write_config, yesterday_at, zkc};

const GATE: &str = "devices:\n  - name: Main Gate\n    ip: 10.0.0.5\n    port: 4370\n";

/// Saved response with four punches for employee 1001 yesterday.
fn response_file(name: &str) -> String {
    let path = temp_file(name, "json");
    let times = [
        yesterday_at(8, 0),
        yesterday_at(12, 0),
        yesterday_at(13, 0),
        yesterday_at(17, 30),
    ];
    let records: Vec<(&str, &str)> = times.iter().map(|t| ("1001", t.as_str())).collect();
    let body = transactions_body(&records);
    fs::write(&path, body.to_string()).expect("write response");
    path
}

#[test]
fn test_init_creates_config_and_db() {
    let db_path = setup_test_db("cli_init");
    let cfg_path = write_config("cli_init", &db_path, GATE);

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized"));

    assert!(std::path::Path::new(&db_path).exists());
    let cfg = fs::read_to_string(&cfg_path).expect("config");
    assert!(cfg.contains("Main Gate"), "devices must survive init");
}

#[test]
fn test_employee_add_and_list() {
    let db_path = setup_test_db("cli_employee");
    let cfg_path = write_config("cli_employee", &db_path, "");
    init_cli_db(&db_path, &cfg_path);

    zkc()
        .args([
            "--db", &db_path, "--config", &cfg_path, "employee", "--add", "bob", "--full-name",
            "Bob Ray", "--user", "u-bob",
        ])
        .assert()
        .success()
        .stdout(contains("Employee 'bob' saved"));

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "employee", "--list"])
        .assert()
        .success()
        .stdout(contains("alice").and(contains("1001")).and(contains("Bob Ray")));
}

#[test]
fn test_employee_csv_import() {
    let db_path = setup_test_db("cli_employee_csv");
    let cfg_path = write_config("cli_employee_csv", &db_path, "");
    init_cli_db(&db_path, &cfg_path);

    let csv_path = temp_file("cli_employee_csv", "csv");
    fs::write(
        &csv_path,
        "name,employee_name,employee_number,user_id,attendance_device_id\n\
         carol,Carol Ng,2001,,\n\
         dan,Dan Oz,,u-dan,D-9\n",
    )
    .expect("write csv");

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "employee", "--import", &csv_path])
        .assert()
        .success()
        .stdout(contains("Imported 2 employee(s)"));

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "employee", "--list"])
        .assert()
        .success()
        .stdout(contains("Carol Ng").and(contains("D-9")));
}

#[test]
fn test_import_is_idempotent() {
    let db_path = setup_test_db("cli_import");
    let cfg_path = write_config("cli_import", &db_path, GATE);
    init_cli_db(&db_path, &cfg_path);
    let file = response_file("cli_import");

    zkc()
        .args([
            "--db", &db_path, "--config", &cfg_path, "import", "--device", "Main Gate", "--file",
            &file, "--json",
        ])
        .assert()
        .success()
        .stdout(contains("\"created\": 4").and(contains("\"duplicates\": 0")));

    zkc()
        .args([
            "--db", &db_path, "--config", &cfg_path, "import", "--device", "Main Gate", "--file",
            &file, "--json",
        ])
        .assert()
        .success()
        .stdout(contains("\"created\": 0").and(contains("\"duplicates\": 4")));

    let conn = Connection::open(&db_path).expect("open db");
    let labels: Vec<String> = conn
        .prepare("SELECT log_type FROM checkins ORDER BY time")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(labels, vec!["IN", "OUT", "IN", "OUT"]);
}

#[test]
fn test_import_unknown_device_fails() {
    let db_path = setup_test_db("cli_import_unknown");
    let cfg_path = write_config("cli_import_unknown", &db_path, GATE);
    init_cli_db(&db_path, &cfg_path);
    let file = response_file("cli_import_unknown");

    zkc()
        .args([
            "--db", &db_path, "--config", &cfg_path, "import", "--device", "Back Door", "--file",
            &file,
        ])
        .assert()
        .failure()
        .stderr(contains("Device not configured: Back Door"));
}

#[test]
fn test_repair_dry_run_then_apply() {
    let db_path = setup_test_db("cli_repair");
    let cfg_path = write_config("cli_repair", &db_path, GATE);
    init_cli_db(&db_path, &cfg_path);
    let file = response_file("cli_repair");

    zkc()
        .args([
            "--db", &db_path, "--config", &cfg_path, "import", "--device", "Main Gate", "--file",
            &file,
        ])
        .assert()
        .success();

    // break the labels behind the tool's back
    let conn = Connection::open(&db_path).expect("open db");
    conn.execute("UPDATE checkins SET log_type = 'OUT'", [])
        .expect("update");
    drop(conn);

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "repair", "--json"])
        .assert()
        .success()
        .stdout(contains("\"changed\": 2").and(contains("\"applied\": false")));

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "repair", "--apply", "--json"])
        .assert()
        .success()
        .stdout(contains("\"changed\": 2").and(contains("\"applied\": true")));

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "repair", "--json"])
        .assert()
        .success()
        .stdout(contains("\"changed\": 0"));
}

#[test]
fn test_repair_rejects_bad_date() {
    let db_path = setup_test_db("cli_repair_date");
    let cfg_path = write_config("cli_repair_date", &db_path, "");
    init_cli_db(&db_path, &cfg_path);

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "repair", "--since", "yesterday"])
        .assert()
        .failure()
        .stderr(contains("Invalid date"));
}

#[test]
fn test_detect_reports_rule() {
    let db_path = setup_test_db("cli_detect");
    let cfg_path = write_config("cli_detect", &db_path, "");
    init_cli_db(&db_path, &cfg_path);

    zkc()
        .args([
            "--db",
            &db_path,
            "--config",
            &cfg_path,
            "detect",
            r#"{"emp_code":"1001","punch_time":"2025-06-01 18:00:00","punch_state_display":"Check Out"}"#,
        ])
        .assert()
        .success()
        .stdout(
            contains("OUT")
                .and(contains("keyword_scan"))
                .and(contains("alice (matched on employee_number)")),
        );
}

#[test]
fn test_detect_rejects_invalid_json() {
    let db_path = setup_test_db("cli_detect_bad");
    let cfg_path = write_config("cli_detect_bad", &db_path, "");

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "detect", "{not json"])
        .assert()
        .failure()
        .stderr(contains("JSON error"));
}

#[test]
fn test_sync_disabled() {
    let db_path = setup_test_db("cli_sync_disabled");
    let cfg_path = write_config("cli_sync_disabled", &db_path, "enable_sync: false\n");
    init_cli_db(&db_path, &cfg_path);

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "sync"])
        .assert()
        .failure()
        .stderr(contains("Sync is disabled"));
}

#[test]
fn test_sync_unknown_device() {
    let db_path = setup_test_db("cli_sync_unknown");
    let cfg_path = write_config("cli_sync_unknown", &db_path, GATE);
    init_cli_db(&db_path, &cfg_path);

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "sync", "--device", "Nope"])
        .assert()
        .failure()
        .stderr(contains("Device not configured: Nope"));
}

#[test]
fn test_sync_device_mode_from_export() {
    let db_path = setup_test_db("cli_sync_attlog");
    let attlog = temp_file("cli_sync_attlog", "dat");
    fs::write(
        &attlog,
        format!(
            "1001\t{}\t1\t0\n1001\t{}\t1\t1\n",
            yesterday_at(9, 0),
            yesterday_at(17, 0)
        ),
    )
    .expect("write attlog");

    let devices = format!(
        "devices:\n  - name: Main Gate\n    ip: 10.0.0.5\n    port: 4370\n    attlog: {}\n  - name: Side Door\n    ip: 10.0.0.6\n    port: 4370\n",
        attlog
    );
    let cfg_path = write_config("cli_sync_attlog", &db_path, &devices);
    init_cli_db(&db_path, &cfg_path);

    // Side Door has no export: reported, the pass continues
    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "sync", "--json"])
        .assert()
        .success()
        .stdout(
            contains("\"created\": 2")
                .and(contains("\"devices_ok\": 1"))
                .and(contains("\"devices_failed\": 1")),
        );

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "sync", "--scheduled", "--json"])
        .assert()
        .success()
        .stdout(contains("\"reason\":\"not_due\""));

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "status"])
        .assert()
        .success()
        .stdout(
            contains("Main Gate")
                .and(contains("Side Door"))
                .and(contains("device-mode")),
        );

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("sync").and(contains("created=2")));
}

#[test]
fn test_status_without_devices() {
    let db_path = setup_test_db("cli_status_empty");
    let cfg_path = write_config("cli_status_empty", &db_path, "");
    init_cli_db(&db_path, &cfg_path);

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "status"])
        .assert()
        .success()
        .stdout(contains("Sync status").and(contains("No devices configured")));
}

#[test]
fn test_dedupe_dry_run() {
    let db_path = setup_test_db("cli_dedupe");
    let cfg_path = write_config("cli_dedupe", &db_path, GATE);
    init_cli_db(&db_path, &cfg_path);
    let file = response_file("cli_dedupe");

    zkc()
        .args([
            "--db", &db_path, "--config", &cfg_path, "import", "--device", "Main Gate", "--file",
            &file,
        ])
        .assert()
        .success();

    // copy of the first row under another device id
    let conn = Connection::open(&db_path).expect("open db");
    conn.execute(
        "INSERT INTO checkins (employee, employee_name, time, log_type, device_id, created_at)
         SELECT employee, employee_name, time, log_type, 'Back Door', '2999-01-01 00:00:00'
         FROM checkins ORDER BY time LIMIT 1",
        [],
    )
    .expect("insert copy");
    drop(conn);

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "dedupe", "--dry-run"])
        .assert()
        .success();

    let count = |path: &str| -> i64 {
        Connection::open(path)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM checkins", [], |r| r.get(0))
            .unwrap()
    };
    assert_eq!(count(&db_path), 5);

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "dedupe"])
        .assert()
        .success();
    assert_eq!(count(&db_path), 4);
}

#[test]
fn test_token_not_needed_for_device_mode() {
    let db_path = setup_test_db("cli_token");
    let cfg_path = write_config("cli_token", &db_path, GATE);
    init_cli_db(&db_path, &cfg_path);

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "token", "--device", "Main Gate"])
        .assert()
        .success()
        .stdout(contains("no token is needed"));
}

#[test]
fn test_db_check_and_info() {
    let db_path = setup_test_db("cli_db");
    let cfg_path = write_config("cli_db", &db_path, "");
    init_cli_db(&db_path, &cfg_path);

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "db", "--check"])
        .assert()
        .success()
        .stdout(contains("Integrity check passed"));

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "db", "--info"])
        .assert()
        .success()
        .stdout(contains("Employees"));
}

#[test]
fn test_config_print() {
    let db_path = setup_test_db("cli_config");
    let cfg_path = write_config("cli_config", &db_path, GATE);

    zkc()
        .args(["--db", &db_path, "--config", &cfg_path, "config", "--print"])
        .assert()
        .success()
        .stdout(contains("Main Gate").and(contains("sync_interval_seconds")));
}
