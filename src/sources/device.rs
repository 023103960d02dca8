//! Device-mode input: attendance records read from a terminal session.
//!
//! The shipped connector reads the terminal's USB attendance export
//! (`attlog.dat`). A live TCP session can be plugged in through
//! [`DeviceConnector`].

use crate::config::DeviceConfig;
use crate::errors::{AppError, AppResult};
use crate::models::checkin::TIME_FORMAT;
use crate::models::punch::Punch;
use crate::models::raw::RawFields;
use crate::sources::transaction::{self, parse_timestamp_str};
use crate::sources::{FetchWindow, PunchSource};
use crate::utils::path::expand_tilde;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::fs::File;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One attendance record as stored on the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub user_id: String,
    pub timestamp: NaiveDateTime,
    /// Verification method code (fingerprint, card, ...).
    pub verify: Option<i64>,
    /// Raw direction flag: 0 = IN, 1 = OUT on most firmware.
    pub punch: i64,
}

impl AttendanceRecord {
    /// Vendor-style record so device punches go through the same decoding
    /// and detection as API transactions.
    pub fn to_raw(&self) -> RawFields {
        let when = Value::String(self.timestamp.format(TIME_FORMAT).to_string());
        RawFields {
            emp_code: Some(Value::String(self.user_id.clone())),
            punch_time: Some(when.clone()),
            timestamp: Some(when),
            punch: Some(Value::from(self.punch)),
            verify_type: self.verify.map(Value::from),
            ..RawFields::default()
        }
    }
}

pub trait DeviceSession {
    fn attendance(&mut self) -> AppResult<Vec<AttendanceRecord>>;
    fn disconnect(&mut self);
}

pub trait DeviceConnector {
    fn connect(&self, device: &DeviceConfig) -> AppResult<Box<dyn DeviceSession>>;
}

/// Parse an attendance export: tab-separated user id, timestamp, verify
/// code, punch flag, then optional work code columns. Unreadable lines are
/// logged and left out.
pub fn parse_attlog<R: Read>(reader: R) -> AppResult<Vec<AttendanceRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    for (line, row) in rdr.records().enumerate() {
        let row = row?;
        let user_id = row.get(0).unwrap_or_default();
        let when = row.get(1).and_then(parse_timestamp_str);

        let Some(timestamp) = when.filter(|_| !user_id.is_empty()) else {
            warn!(line = line + 1, "attendance line without user id or time");
            continue;
        };

        let verify = row.get(2).and_then(|v| v.parse::<i64>().ok());
        let punch = row
            .get(3)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);

        out.push(AttendanceRecord {
            user_id: user_id.to_string(),
            timestamp,
            verify,
            punch,
        });
    }
    Ok(out)
}

pub struct AttlogSession {
    path: String,
}

impl DeviceSession for AttlogSession {
    fn attendance(&mut self) -> AppResult<Vec<AttendanceRecord>> {
        let file = File::open(expand_tilde(&self.path))?;
        let records = parse_attlog(file)?;
        debug!(path = %self.path, records = records.len(), "attendance export read");
        Ok(records)
    }

    fn disconnect(&mut self) {}
}

/// Connector over the `attlog` export configured for the device.
pub struct AttlogConnector;

impl DeviceConnector for AttlogConnector {
    fn connect(&self, device: &DeviceConfig) -> AppResult<Box<dyn DeviceSession>> {
        let Some(path) = device.attlog.as_deref().filter(|p| !p.trim().is_empty()) else {
            return Err(AppError::DeviceUnavailable(format!(
                "{} ({}): no attlog export configured for device-mode",
                device.name,
                device.identifier()
            )));
        };
        if !expand_tilde(path).exists() {
            return Err(AppError::DeviceUnavailable(format!(
                "{}: attendance export '{}' not found",
                device.name, path
            )));
        }
        Ok(Box::new(AttlogSession {
            path: path.to_string(),
        }))
    }
}

/// Device-mode source. The terminal returns its whole log; the time
/// window gate and duplicate lookup keep re-reads harmless.
pub struct DeviceSource {
    connector: Box<dyn DeviceConnector>,
    device: DeviceConfig,
}

impl DeviceSource {
    pub fn new(connector: Box<dyn DeviceConnector>, device: &DeviceConfig) -> Self {
        Self {
            connector,
            device: device.clone(),
        }
    }
}

impl PunchSource for DeviceSource {
    fn describe(&self) -> String {
        format!("device {}", self.device.identifier())
    }

    fn fetch(&mut self, _window: &FetchWindow) -> AppResult<Vec<Punch>> {
        let mut session = self.connector.connect(&self.device)?;
        let records = session.attendance();
        session.disconnect();
        let records = records?;

        info!(device = %self.device.name, records = records.len(), "device records read");

        let fallback = self.device.identifier();
        Ok(records
            .iter()
            .map(|r| transaction::decode(r.to_raw(), &fallback))
            .collect())
    }
}

/// TCP reachability check; returns the connect latency.
pub fn probe(ip: &str, port: u16, timeout: Duration) -> AppResult<Duration> {
    let addr = (ip, port)
        .to_socket_addrs()
        .map_err(|e| AppError::DeviceUnavailable(format!("{}:{}: {}", ip, port, e)))?
        .next()
        .ok_or_else(|| AppError::DeviceUnavailable(format!("{}:{}: no address", ip, port)))?;

    let started = Instant::now();
    TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| AppError::DeviceUnavailable(format!("{}:{}: {}", ip, port, e)))?;
    Ok(started.elapsed())
}
