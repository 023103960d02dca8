//! Vendor transaction decoding: employee code, punch time and identifiers
//! out of a schema-less record.

use crate::core::detector;
use crate::errors::{AppError, AppResult};
use crate::models::punch::Punch;
use crate::models::raw::{RawFields, value_to_text};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike};
use serde_json::Value;
use tracing::{debug, warn};

/// Fields that may carry the punch time, in priority order.
pub const TIME_FIELDS: &[&str] = &[
    "punch_time",
    "punchTime",
    "punchtime",
    "time",
    "timestamp",
    "punchTimeStr",
    "checktime",
    "record_time",
];

const EMPLOYEE_FIELDS: &[&str] = &["emp_code", "employee_code", "employee_no"];
const TRANSACTION_FIELDS: &[&str] = &["id", "transaction_id", "uid"];
const DEVICE_FIELDS: &[&str] = &["terminal_alias", "terminal_sn", "device_alias", "device_id"];

/// Naive formats seen from firmware and the web API.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y%m%d%H%M%S",
    "%d.%m.%Y %H:%M:%S",
    "%b %d %Y %H:%M:%S",
    "%b %d %Y %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Formats with a numeric offset; the offset is dropped, wall time kept.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Parse a vendor time string into naive local time, whole seconds.
pub fn parse_timestamp_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let parsed = NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|f| DateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.naive_local())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        });

    parsed.map(truncate_seconds)
}

/// UNIX seconds, or milliseconds above 1e12, as local time.
pub fn from_unix(ts: f64) -> Option<NaiveDateTime> {
    let secs = if ts > 1e12 { ts / 1000.0 } else { ts };
    DateTime::from_timestamp(secs.trunc() as i64, 0)
        .map(|utc| utc.with_timezone(&Local).naive_local())
}

pub fn parse_timestamp_value(v: &Value) -> Option<NaiveDateTime> {
    match v {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => n.as_f64().and_then(from_unix),
        _ => None,
    }
}

fn truncate_seconds(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}

/// Punch time from the first time field that parses.
pub fn punch_time(raw: &RawFields) -> Option<NaiveDateTime> {
    for field in TIME_FIELDS {
        let Some(value) = raw.get_present(field) else {
            continue;
        };
        match parse_timestamp_value(value) {
            Some(ts) => {
                debug!(field, %ts, "punch time parsed");
                return Some(ts);
            }
            None => debug!(field, value = %value, "unparseable time field"),
        }
    }
    None
}

/// Employee code as reported by the device. Ids shaped like
/// `EMP001_123` carry the code before the underscore.
pub fn employee_code(raw: &RawFields) -> Option<String> {
    raw.first_text(EMPLOYEE_FIELDS).or_else(|| {
        let id = raw.first_text(&["id"])?;
        let (code, _) = id.split_once('_')?;
        let code = code.trim();
        (!code.is_empty()).then(|| code.to_string())
    })
}

pub fn transaction_id(raw: &RawFields) -> Option<String> {
    raw.first_text(TRANSACTION_FIELDS)
}

/// Terminal name, serial or device id, then the record's own address,
/// then `fallback`.
pub fn device_identifier(raw: &RawFields, fallback: &str) -> String {
    if let Some(id) = raw.first_text(DEVICE_FIELDS) {
        return id;
    }
    if let Some(ip) = raw.first_text(&["ip_address"]) {
        return match raw.first_text(&["port"]) {
            Some(port) => format!("{}:{}", ip, port),
            None => ip,
        };
    }
    fallback.to_string()
}

/// Decode one vendor record into a labelled punch.
pub fn decode(raw: RawFields, fallback_device: &str) -> Punch {
    let code = employee_code(&raw);
    let ts = punch_time(&raw);
    let tx = transaction_id(&raw);
    let device = device_identifier(&raw, fallback_device);
    let label = detector::initial_label(&raw);

    if code.is_none() || ts.is_none() {
        warn!(
            employee = ?code,
            time = ?ts,
            transaction = ?tx,
            "transaction lacks employee code or punch time"
        );
    }

    Punch::new(code, ts, device, raw)
        .with_transaction_id(tx)
        .with_label(label)
}

/// Decode a JSON record. Non-objects become empty records, which the
/// pipeline counts as skipped.
pub fn decode_value(value: Value, fallback_device: &str) -> Punch {
    let raw = match value {
        Value::Object(_) => serde_json::from_value::<RawFields>(value).unwrap_or_else(|e| {
            warn!(error = %e, "cannot read transaction record");
            RawFields::default()
        }),
        other => {
            warn!(value = %value_to_text(&other), "transaction is not a JSON object");
            RawFields::default()
        }
    };
    decode(raw, fallback_device)
}

/// One page of an API response: the records and the next-page URL.
#[derive(Debug, Default)]
pub struct Page {
    pub records: Vec<Value>,
    pub next: Option<String>,
}

/// Split a response body into records and the `next` link. Accepts
/// `data`, `results`, `transactions` or a top-level array.
pub fn extract_page(body: Value) -> AppResult<Page> {
    match body {
        Value::Array(records) => Ok(Page {
            records,
            next: None,
        }),
        Value::Object(mut map) => {
            let next = map
                .get("next")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            for key in ["data", "results", "transactions"] {
                if let Some(Value::Array(records)) = map.remove(key) {
                    return Ok(Page { records, next });
                }
            }
            Err(AppError::InvalidTransaction(
                "response has no data, results or transactions list".into(),
            ))
        }
        other => Err(AppError::InvalidTransaction(format!(
            "unexpected response body: {}",
            crate::utils::formatting::truncate(&other.to_string(), 200)
        ))),
    }
}
