//! Vendor transaction record.
//!
//! ZKTeco firmware and the BioTime-style API do not agree on a schema, so
//! every attribute we know about is an optional `Value` and anything else
//! lands in `extra`. `entries()` gives the label detector a fixed field order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFields {
    // identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Value>,

    // employee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp_code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_no: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<Value>,

    // time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punch_time: Option<Value>,
    #[serde(default, rename = "punchTime", skip_serializing_if = "Option::is_none")]
    pub punch_time_camel: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punchtime: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default, rename = "punchTimeStr", skip_serializing_if = "Option::is_none")]
    pub punch_time_str: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checktime: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_time: Option<Value>,

    // direction hints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punch_state: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punch_state_display: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punch: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punchtype: Option<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,

    // verification / terminal metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_type_display: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_sn: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_alias: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_alias: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawFields {
    /// All present fields as `(wire name, value)`: known fields in
    /// declaration order, then unknown ones sorted by key.
    pub fn entries(&self) -> Vec<(&str, &Value)> {
        let known: [(&str, &Option<Value>); 34] = [
            ("id", &self.id),
            ("transaction_id", &self.transaction_id),
            ("uid", &self.uid),
            ("emp_code", &self.emp_code),
            ("employee_code", &self.employee_code),
            ("employee_no", &self.employee_no),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("department", &self.department),
            ("punch_time", &self.punch_time),
            ("punchTime", &self.punch_time_camel),
            ("punchtime", &self.punchtime),
            ("time", &self.time),
            ("timestamp", &self.timestamp),
            ("punchTimeStr", &self.punch_time_str),
            ("checktime", &self.checktime),
            ("record_time", &self.record_time),
            ("log_type", &self.log_type),
            ("punch_state", &self.punch_state),
            ("punch_state_display", &self.punch_state_display),
            ("punch", &self.punch),
            ("punchtype", &self.punchtype),
            ("type", &self.kind),
            ("direction", &self.direction),
            ("status", &self.status),
            ("verify_type", &self.verify_type),
            ("verify_type_display", &self.verify_type_display),
            ("terminal_sn", &self.terminal_sn),
            ("terminal_alias", &self.terminal_alias),
            ("device_alias", &self.device_alias),
            ("device_id", &self.device_id),
            ("device_name", &self.device_name),
            ("ip_address", &self.ip_address),
            ("port", &self.port),
        ];

        known
            .into_iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k, v)))
            .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v)))
            .collect()
    }

    /// Look a field up by its wire name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// Like `get`, but treats blank values as absent.
    pub fn get_present(&self, name: &str) -> Option<&Value> {
        self.get(name).filter(|v| !is_blank(v))
    }

    /// First present, non-blank field out of `names`, stringified.
    pub fn first_text(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .filter_map(|n| self.get_present(n))
            .map(value_to_text)
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Null, empty strings and empty containers carry no signal.
/// `0` and `false` do.
pub fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Stringify a vendor value the way it reads on a device screen:
/// strings unquoted, everything else in its JSON form.
pub fn value_to_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Integer view of a vendor value, if it has one.
pub fn value_to_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}
