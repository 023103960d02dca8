//! Idempotent upsert gate: one punch in, at most one check-in out.

use crate::config::Config;
use crate::db::employees::resolve_employee;
use crate::db::queries::{find_matching, insert_checkin};
use crate::errors::AppResult;
use crate::models::checkin::Checkin;
use crate::models::punch::Punch;
use crate::models::raw::{RawFields, is_blank};
use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info, warn};

/// Raw fields copied into `checkins.meta` when present.
const META_FIELDS: &[&str] = &[
    "device_name",
    "terminal_sn",
    "terminal_alias",
    "verify_type",
    "verify_type_display",
    "punch_state_display",
];

/// Accepted punch times: at most `future_tolerance` ahead of `now` and at
/// most `max_age` behind it. Both bounds are inclusive; a bound past the
/// calendar range does not reject anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub now: NaiveDateTime,
    pub future_tolerance: Duration,
    pub max_age: Duration,
}

impl TimeWindow {
    pub fn new(now: NaiveDateTime, future_tolerance_minutes: i64, max_age_days: i64) -> Self {
        Self {
            now,
            future_tolerance: Duration::try_minutes(future_tolerance_minutes)
                .unwrap_or(Duration::MAX),
            max_age: Duration::try_days(max_age_days).unwrap_or(Duration::MAX),
        }
    }

    pub fn from_config(cfg: &Config, now: NaiveDateTime) -> Self {
        Self::new(now, cfg.future_tolerance_minutes, cfg.max_age_days)
    }

    pub fn check(&self, ts: NaiveDateTime) -> Result<(), RejectReason> {
        let latest = self.now.checked_add_signed(self.future_tolerance);
        let earliest = self.now.checked_sub_signed(self.max_age);
        if latest.is_some_and(|latest| ts > latest) {
            Err(RejectReason::InFuture)
        } else if earliest.is_some_and(|earliest| ts < earliest) {
            Err(RejectReason::TooOld)
        } else {
            Ok(())
        }
    }
}

/// Why a punch was not stored. Not an error: counted and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RejectReason {
    MissingEmployeeCode,
    MissingTimestamp,
    Unlabelled,
    InFuture,
    TooOld,
    EmployeeNotFound(String),
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::MissingEmployeeCode => "missing_employee_code",
            RejectReason::MissingTimestamp => "missing_timestamp",
            RejectReason::Unlabelled => "unlabelled",
            RejectReason::InFuture => "in_future",
            RejectReason::TooOld => "too_old",
            RejectReason::EmployeeNotFound(_) => "employee_not_found",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingEmployeeCode => f.write_str("missing employee code"),
            RejectReason::MissingTimestamp => f.write_str("missing timestamp"),
            RejectReason::Unlabelled => f.write_str("no IN/OUT label"),
            RejectReason::InFuture => f.write_str("timestamp too far in the future"),
            RejectReason::TooOld => f.write_str("timestamp too old"),
            RejectReason::EmployeeNotFound(code) => write!(f, "employee not found: {}", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GateOutcome {
    Created(i64),
    Duplicate,
    Rejected(RejectReason),
}

pub struct UpsertGate<'c> {
    conn: &'c Connection,
    window: TimeWindow,
}

impl<'c> UpsertGate<'c> {
    pub fn new(conn: &'c Connection, window: TimeWindow) -> Self {
        Self { conn, window }
    }

    /// Store `punch` unless it is invalid or already stored.
    ///
    /// Only storage failures are errors; everything else is an outcome.
    pub fn submit(&self, punch: &Punch) -> AppResult<GateOutcome> {
        let outcome = self.decide(punch)?;
        match &outcome {
            GateOutcome::Created(id) => info!(
                id,
                employee = ?punch.employee_code,
                time = ?punch.timestamp,
                label = ?punch.label,
                "check-in created"
            ),
            GateOutcome::Duplicate => debug!(
                employee = ?punch.employee_code,
                time = ?punch.timestamp,
                "check-in already stored"
            ),
            GateOutcome::Rejected(reason) => warn!(
                employee = ?punch.employee_code,
                time = ?punch.timestamp,
                transaction = ?punch.transaction_id,
                %reason,
                "punch rejected"
            ),
        }
        Ok(outcome)
    }

    fn decide(&self, punch: &Punch) -> AppResult<GateOutcome> {
        let Some(code) = punch.employee_code.as_deref().filter(|c| !c.trim().is_empty()) else {
            return Ok(GateOutcome::Rejected(RejectReason::MissingEmployeeCode));
        };
        let Some(ts) = punch.timestamp else {
            return Ok(GateOutcome::Rejected(RejectReason::MissingTimestamp));
        };
        if let Err(reason) = self.window.check(ts) {
            return Ok(GateOutcome::Rejected(reason));
        }
        let Some(log_type) = punch.direction() else {
            return Ok(GateOutcome::Rejected(RejectReason::Unlabelled));
        };

        let Some(resolved) = resolve_employee(self.conn, code)? else {
            return Ok(GateOutcome::Rejected(RejectReason::EmployeeNotFound(
                code.trim().to_string(),
            )));
        };
        let employee = resolved.employee;

        if find_matching(
            self.conn,
            &employee.name,
            &ts,
            log_type,
            &punch.device_identifier,
        )?
        .is_some()
        {
            return Ok(GateOutcome::Duplicate);
        }

        let checkin = Checkin::new(
            employee.name.clone(),
            employee.employee_name.clone(),
            ts,
            log_type,
            punch.unique_device_id(),
        )
        .with_created_at(self.window.now)
        .with_meta(metadata(&punch.raw, punch));

        match insert_checkin(self.conn, &checkin) {
            Ok(id) => Ok(GateOutcome::Created(id)),
            Err(e) if e.is_unique_violation() => {
                debug!(employee = %employee.name, %ts, "unique constraint hit, treating as stored");
                Ok(GateOutcome::Duplicate)
            }
            Err(e) => Err(e),
        }
    }
}

/// Descriptive device metadata as a JSON object, `""` when there is none.
fn metadata(raw: &RawFields, punch: &Punch) -> String {
    let mut meta = Map::new();
    for field in META_FIELDS {
        if let Some(v) = raw.get(field).filter(|v| !is_blank(v)) {
            meta.insert((*field).to_string(), v.clone());
        }
    }
    if let Some(tx) = &punch.transaction_id {
        meta.insert("transaction_id".into(), Value::String(tx.clone()));
    }
    if meta.is_empty() {
        return String::new();
    }
    meta.insert(
        "label_source".into(),
        Value::String(punch.label.source_str().into()),
    );
    Value::Object(meta).to_string()
}
