use super::label::Direction;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Persisted attendance event.
#[derive(Debug, Clone, Serialize)]
pub struct Checkin {
    pub id: i64,
    pub employee: String,              // ⇔ checkins.employee (employees.name)
    pub employee_name: Option<String>, // ⇔ checkins.employee_name
    pub time: NaiveDateTime,           // ⇔ checkins.time (TEXT "YYYY-MM-DD HH:MM:SS")
    pub log_type: Direction,           // ⇔ checkins.log_type ('IN' | 'OUT')
    pub device_id: String,             // ⇔ checkins.device_id
    pub skip_auto_attendance: bool,
    pub meta: String,       // ⇔ checkins.meta (JSON object, '' when empty)
    pub created_at: String, // ⇔ checkins.created_at (TIME_FORMAT, local)
    pub modified_at: Option<String>,
}

impl Checkin {
    /// New, not yet persisted check-in (`id = 0`).
    pub fn new(
        employee: impl Into<String>,
        employee_name: Option<String>,
        time: NaiveDateTime,
        log_type: Direction,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            employee: employee.into(),
            employee_name,
            time,
            log_type,
            device_id: device_id.into(),
            skip_auto_attendance: false,
            meta: String::new(),
            created_at: Local::now().format(TIME_FORMAT).to_string(),
            modified_at: None,
        }
    }

    pub fn with_created_at(mut self, at: NaiveDateTime) -> Self {
        self.created_at = at.format(TIME_FORMAT).to_string();
        self
    }

    pub fn with_meta(mut self, meta: String) -> Self {
        self.meta = meta;
        self
    }

    pub fn time_str(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}
