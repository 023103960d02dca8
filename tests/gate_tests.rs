use chrono::Duration;
use rusqlite::Connection;
use serde_json::json;
use zkcheckin::core::gate::{GateOutcome, RejectReason, TimeWindow, UpsertGate};
use zkcheckin::db::employees::{resolve_employee, upsert_employee};
use zkcheckin::db::queries::{CheckinFilter, count_checkins, load_checkins};
use zkcheckin::models::employee::Employee;
use zkcheckin::models::label::Direction::{In, Out};
use zkcheckin::models::label::Label;
use zkcheckin::models::punch::Punch;

mod common;
use common::{fixed_now, memory_db, punch, raw, ts};

fn window() -> TimeWindow {
    TimeWindow::new(fixed_now(), 5, 90)
}

fn at(offset: Duration) -> String {
    (fixed_now() + offset).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[test]
fn window_bounds() {
    let w = window();
    assert!(w.check(fixed_now() + Duration::minutes(4)).is_ok());
    assert!(w.check(fixed_now() + Duration::minutes(5)).is_ok());
    assert_eq!(
        w.check(fixed_now() + Duration::minutes(6)),
        Err(RejectReason::InFuture)
    );
    assert!(w.check(fixed_now() - Duration::days(89)).is_ok());
    assert_eq!(
        w.check(fixed_now() - Duration::days(91)),
        Err(RejectReason::TooOld)
    );
}

#[test]
fn out_of_window_punches_are_rejected() {
    let pool = memory_db();
    let gate = UpsertGate::new(&pool.conn, window());

    let future = punch("1001", &at(Duration::minutes(6)), Label::Sequenced(In));
    let old = punch("1001", &at(-Duration::days(91)), Label::Sequenced(In));
    let fine = punch("1001", &at(-Duration::days(89)), Label::Sequenced(In));

    assert_eq!(
        gate.submit(&future).unwrap(),
        GateOutcome::Rejected(RejectReason::InFuture)
    );
    assert_eq!(
        gate.submit(&old).unwrap(),
        GateOutcome::Rejected(RejectReason::TooOld)
    );
    assert!(matches!(gate.submit(&fine).unwrap(), GateOutcome::Created(_)));
    assert_eq!(count_checkins(&pool.conn).unwrap(), 1);
}

#[test]
fn second_submit_is_a_duplicate() {
    let pool = memory_db();
    let gate = UpsertGate::new(&pool.conn, window());
    let p = punch("1001", "2025-06-01 09:00:00", Label::Sequenced(In));

    assert!(matches!(gate.submit(&p).unwrap(), GateOutcome::Created(_)));
    assert_eq!(gate.submit(&p).unwrap(), GateOutcome::Duplicate);
    assert_eq!(count_checkins(&pool.conn).unwrap(), 1);
}

#[test]
fn transaction_id_does_not_defeat_duplicate_detection() {
    let pool = memory_db();
    let gate = UpsertGate::new(&pool.conn, window());

    let first = punch("1001", "2025-06-01 09:00:00", Label::Sequenced(In))
        .with_transaction_id(Some("1".into()));
    let again = punch("1001", "2025-06-01 09:00:00", Label::Sequenced(In))
        .with_transaction_id(Some("2".into()));

    assert!(matches!(gate.submit(&first).unwrap(), GateOutcome::Created(_)));
    assert_eq!(gate.submit(&again).unwrap(), GateOutcome::Duplicate);

    let rows = load_checkins(&pool.conn, &CheckinFilter::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].device_id, "Main Gate (ZKTeco-1)");
}

#[test]
fn different_label_is_a_separate_checkin() {
    let pool = memory_db();
    let gate = UpsertGate::new(&pool.conn, window());

    let a = punch("1001", "2025-06-01 09:00:00", Label::Sequenced(In));
    let b = punch("1001", "2025-06-01 09:00:00", Label::Sequenced(Out));

    assert!(matches!(gate.submit(&a).unwrap(), GateOutcome::Created(_)));
    assert!(matches!(gate.submit(&b).unwrap(), GateOutcome::Created(_)));
    assert_eq!(count_checkins(&pool.conn).unwrap(), 2);
}

#[test]
fn stored_checkin_carries_employee_and_creation_time() {
    let pool = memory_db();
    let gate = UpsertGate::new(&pool.conn, window());
    gate.submit(&punch("1001", "2025-06-01 09:00:00", Label::Sequenced(In)))
        .unwrap();

    let rows = load_checkins(&pool.conn, &CheckinFilter::default()).unwrap();
    let ck = &rows[0];
    assert_eq!(ck.employee, "alice");
    assert_eq!(ck.employee_name.as_deref(), Some("Alice Doe"));
    assert_eq!(ck.time, ts("2025-06-01 09:00:00"));
    assert_eq!(ck.log_type, In);
    assert_eq!(ck.created_at, "2025-06-02 12:00:00");
    assert!(!ck.skip_auto_attendance);
}

#[test]
fn resolution_order_and_matched_field() {
    let pool = memory_db();
    let carol = Employee {
        attendance_device_id: Some("D-77".into()),
        ..Employee::new("carol")
    };
    upsert_employee(&pool.conn, &carol).unwrap();

    let by_number = resolve_employee(&pool.conn, "1001").unwrap().unwrap();
    assert_eq!(by_number.employee.name, "alice");
    assert_eq!(by_number.matched_on, "employee_number");

    let by_user = resolve_employee(&pool.conn, " u-bob ").unwrap().unwrap();
    assert_eq!(by_user.employee.name, "bob");
    assert_eq!(by_user.matched_on, "user_id");

    let by_device = resolve_employee(&pool.conn, "D-77").unwrap().unwrap();
    assert_eq!(by_device.employee.name, "carol");
    assert_eq!(by_device.matched_on, "attendance_device_id");

    assert!(resolve_employee(&pool.conn, "9999").unwrap().is_none());
    assert!(resolve_employee(&pool.conn, "  ").unwrap().is_none());
}

#[test]
fn employee_number_wins_over_user_id() {
    let pool = memory_db();
    // dave's user id equals alice's employee number
    let dave = Employee {
        user_id: Some("1001".into()),
        ..Employee::new("dave")
    };
    upsert_employee(&pool.conn, &dave).unwrap();

    let found = resolve_employee(&pool.conn, "1001").unwrap().unwrap();
    assert_eq!(found.employee.name, "alice");
}

#[test]
fn resolution_without_mapping_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE employees (
            name TEXT PRIMARY KEY,
            employee_name TEXT,
            employee_number TEXT,
            user_id TEXT,
            created_at TEXT NOT NULL
         );
         INSERT INTO employees VALUES ('erin', 'Erin', '2002', 'u-erin', '2025-01-01');",
    )
    .unwrap();

    let found = resolve_employee(&conn, "u-erin").unwrap().unwrap();
    assert_eq!(found.employee.name, "erin");
    assert_eq!(found.matched_on, "user_id");
    assert_eq!(found.employee.attendance_device_id, None);
    assert!(resolve_employee(&conn, "D-1").unwrap().is_none());
}

#[test]
fn unknown_employee_is_rejected() {
    let pool = memory_db();
    let gate = UpsertGate::new(&pool.conn, window());
    let p = punch("4242", "2025-06-01 09:00:00", Label::Sequenced(In));

    assert_eq!(
        gate.submit(&p).unwrap(),
        GateOutcome::Rejected(RejectReason::EmployeeNotFound("4242".into()))
    );
    assert_eq!(count_checkins(&pool.conn).unwrap(), 0);
}

#[test]
fn incomplete_punches_are_rejected() {
    let pool = memory_db();
    let gate = UpsertGate::new(&pool.conn, window());

    let no_code = Punch::new(None, Some(ts("2025-06-01 09:00:00")), "Main Gate", raw(json!({})))
        .with_label(Label::Sequenced(In));
    let blank_code = Punch::new(
        Some("  ".into()),
        Some(ts("2025-06-01 09:00:00")),
        "Main Gate",
        raw(json!({})),
    )
    .with_label(Label::Sequenced(In));
    let no_time = Punch::new(Some("1001".into()), None, "Main Gate", raw(json!({})))
        .with_label(Label::Sequenced(In));
    let unlabelled = punch("1001", "2025-06-01 09:00:00", Label::Unresolved);

    assert_eq!(
        gate.submit(&no_code).unwrap(),
        GateOutcome::Rejected(RejectReason::MissingEmployeeCode)
    );
    assert_eq!(
        gate.submit(&blank_code).unwrap(),
        GateOutcome::Rejected(RejectReason::MissingEmployeeCode)
    );
    assert_eq!(
        gate.submit(&no_time).unwrap(),
        GateOutcome::Rejected(RejectReason::MissingTimestamp)
    );
    assert_eq!(
        gate.submit(&unlabelled).unwrap(),
        GateOutcome::Rejected(RejectReason::Unlabelled)
    );
    assert_eq!(count_checkins(&pool.conn).unwrap(), 0);
}

#[test]
fn meta_keeps_terminal_fields() {
    let pool = memory_db();
    let gate = UpsertGate::new(&pool.conn, window());
    let record = raw(json!({
        "emp_code": "1001",
        "punch_time": "2025-06-01 09:00:00",
        "terminal_alias": "Main Gate",
        "verify_type_display": "Fingerprint"
    }));
    let p = Punch::new(
        Some("1001".into()),
        Some(ts("2025-06-01 09:00:00")),
        "Main Gate",
        record,
    )
    .with_label(Label::Authoritative(In));
    gate.submit(&p).unwrap();

    let rows = load_checkins(&pool.conn, &CheckinFilter::default()).unwrap();
    let meta: serde_json::Value = serde_json::from_str(&rows[0].meta).unwrap();
    assert_eq!(meta["terminal_alias"], "Main Gate");
    assert_eq!(meta["verify_type_display"], "Fingerprint");
    assert_eq!(meta["label_source"], "authoritative");
}

#[test]
fn reject_reason_codes() {
    assert_eq!(RejectReason::TooOld.code(), "too_old");
    assert_eq!(
        RejectReason::EmployeeNotFound("x".into()).to_string(),
        "employee not found: x"
    );
}
