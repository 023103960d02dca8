//! Sync pass: fetch, normalize, gate, checkpoint.
//!
//! State goes in and comes out explicitly; callers persist it with
//! `db::state`. Commits are incremental, so an interrupted pass keeps what
//! it already stored.

use crate::config::{Config, DeviceConfig, TransportMode};
use crate::core::gate::{GateOutcome, TimeWindow, UpsertGate};
use crate::core::lock::{SyncLock, lock_key};
use crate::core::normalizer::{NormalizeReport, normalize};
use crate::db::log::ttlog_quiet;
use crate::db::state::{GLOBAL_SCOPE, SyncState, load_state, save_state};
use crate::errors::{AppError, AppResult};
use crate::models::punch::Punch;
use crate::sources::{FetchWindow, PunchSource};
use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Look-back for a device that never synced.
pub const FIRST_SYNC_LOOKBACK_HOURS: i64 = 1;

/// Outcome counts of feeding a batch of punches through the gate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub fetched: usize,
    pub created: usize,
    pub duplicates: usize,
    /// Rejected by validity checks.
    pub skipped: usize,
    /// Storage errors on single records.
    pub failed: usize,
    pub commits: usize,
    pub normalized: NormalizeReport,
    pub rejections: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub device: String,
    pub mode: TransportMode,
    pub source: String,
    pub window: Option<FetchWindow>,
    #[serde(flatten)]
    pub ingest: IngestReport,
    /// Set when the pass for this device aborted.
    pub error: Option<String>,
}

impl DeviceReport {
    fn new(device: &DeviceConfig) -> Self {
        Self {
            device: device.name.clone(),
            mode: device.mode(),
            source: String::new(),
            window: None,
            ingest: IngestReport::default(),
            error: None,
        }
    }

    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSummary {
    pub created: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
    pub devices_ok: usize,
    pub devices_failed: usize,
    pub state: SyncState,
    pub devices: Vec<DeviceReport>,
}

impl SyncSummary {
    fn add(&mut self, report: DeviceReport) {
        self.created += report.ingest.created;
        self.duplicates += report.ingest.duplicates;
        self.skipped += report.ingest.skipped;
        self.failed += report.ingest.failed;
        if report.ok() {
            self.devices_ok += 1;
        } else {
            self.devices_failed += 1;
        }
        self.devices.push(report);
    }
}

pub struct SyncLogic;

impl SyncLogic {
    /// Whether a scheduled run should start.
    pub fn is_due(settings: &Config, global: &SyncState, now: NaiveDateTime) -> bool {
        match global.last_sync {
            None => true,
            Some(last) => now - last >= settings.sync_interval(),
        }
    }

    /// Fetch window for a device checkpoint.
    pub fn window_for(state: &SyncState, now: NaiveDateTime) -> FetchWindow {
        FetchWindow {
            start: state
                .last_sync
                .unwrap_or(now - Duration::hours(FIRST_SYNC_LOOKBACK_HOURS)),
            end: now,
        }
    }

    /// Normalize `punches` and submit them to the gate, committing every
    /// `commit_every` created records.
    pub fn ingest(
        conn: &Connection,
        settings: &Config,
        mut punches: Vec<Punch>,
        now: NaiveDateTime,
    ) -> AppResult<IngestReport> {
        let mut report = IngestReport {
            fetched: punches.len(),
            normalized: normalize(&mut punches),
            ..IngestReport::default()
        };

        let gate = UpsertGate::new(conn, TimeWindow::from_config(settings, now));
        let commit_every = settings.commit_every.max(1);

        let mut tx = Some(conn.unchecked_transaction()?);
        let mut pending = 0;

        for punch in &punches {
            match gate.submit(punch) {
                Ok(GateOutcome::Created(_)) => {
                    report.created += 1;
                    pending += 1;
                }
                Ok(GateOutcome::Duplicate) => report.duplicates += 1,
                Ok(GateOutcome::Rejected(reason)) => {
                    report.skipped += 1;
                    *report.rejections.entry(reason.code()).or_default() += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        employee = ?punch.employee_code,
                        time = ?punch.timestamp,
                        error = %e,
                        "failed to store punch"
                    );
                }
            }

            if pending >= commit_every {
                if let Some(t) = tx.take() {
                    t.commit()?;
                    report.commits += 1;
                }
                tx = Some(conn.unchecked_transaction()?);
                pending = 0;
            }
        }

        if let Some(t) = tx.take() {
            t.commit()?;
            if pending > 0 {
                report.commits += 1;
            }
        }

        Ok(report)
    }

    /// One device pass. Fatal checks run before any I/O; a fetch failure
    /// returns the error and leaves the checkpoint where it was.
    pub fn sync_device(
        conn: &Connection,
        settings: &Config,
        device: &DeviceConfig,
        source: &mut dyn PunchSource,
        state: SyncState,
        now: NaiveDateTime,
    ) -> AppResult<(DeviceReport, SyncState)> {
        if !settings.enable_sync {
            return Err(AppError::SyncDisabled);
        }
        if !device.enabled {
            return Err(AppError::DeviceDisabled(device.name.clone()));
        }
        if device.mode() == TransportMode::Api && device.token().is_none() {
            return Err(AppError::MissingCredentials(format!(
                "device '{}' has no API token",
                device.name
            )));
        }

        let _lock = SyncLock::acquire(
            conn,
            lock_key(Some(&device.name)),
            settings.lock_ttl(),
            now,
        )?;

        let window = Self::window_for(&state, now);
        let mut report = DeviceReport::new(device);
        report.source = source.describe();
        report.window = Some(window);

        info!(
            device = %device.name,
            mode = %device.mode(),
            start = %window.start,
            end = %window.end,
            "sync started"
        );

        let punches = source.fetch(&window)?;
        report.ingest = Self::ingest(conn, settings, punches, now)?;

        let new_state = SyncState {
            last_sync: Some(now),
            total_synced: state.total_synced + report.ingest.created as i64,
        };

        info!(
            device = %device.name,
            created = report.ingest.created,
            duplicates = report.ingest.duplicates,
            skipped = report.ingest.skipped,
            failed = report.ingest.failed,
            "sync finished"
        );
        Ok((report, new_state))
    }

    /// Sync every enabled device (or only `only`) under the global lock.
    /// A device that fails is reported and the others still run.
    pub fn sync_all<F>(
        conn: &Connection,
        settings: &Config,
        only: Option<&str>,
        mut make_source: F,
        now: NaiveDateTime,
    ) -> AppResult<SyncSummary>
    where
        F: FnMut(&DeviceConfig) -> AppResult<Box<dyn PunchSource>>,
    {
        if !settings.enable_sync {
            return Err(AppError::SyncDisabled);
        }

        let devices: Vec<&DeviceConfig> = match only {
            Some(name) => vec![settings.device(name)?],
            None => settings.devices.iter().filter(|d| d.enabled).collect(),
        };

        let _lock = SyncLock::acquire(
            conn,
            lock_key(None),
            settings.lock_ttl(),
            now,
        )?;

        let mut summary = SyncSummary::default();

        for device in devices {
            let report = match Self::run_device(conn, settings, device, &mut make_source, now) {
                Ok(report) => report,
                Err(e) => {
                    warn!(device = %device.name, error = %e, transient = e.is_transient(), "device sync failed");
                    let mut report = DeviceReport::new(device);
                    report.error = Some(e.to_string());
                    report
                }
            };
            summary.add(report);
        }

        let global = load_state(conn, GLOBAL_SCOPE)?;
        summary.state = SyncState {
            last_sync: Some(now),
            total_synced: global.total_synced + summary.created as i64,
        };
        save_state(conn, GLOBAL_SCOPE, &summary.state)?;

        ttlog_quiet(
            conn,
            "sync",
            only.unwrap_or("all"),
            &format!(
                "created={} duplicates={} skipped={} failed={} devices_ok={} devices_failed={}",
                summary.created,
                summary.duplicates,
                summary.skipped,
                summary.failed,
                summary.devices_ok,
                summary.devices_failed
            ),
        );

        Ok(summary)
    }

    fn run_device<F>(
        conn: &Connection,
        settings: &Config,
        device: &DeviceConfig,
        make_source: &mut F,
        now: NaiveDateTime,
    ) -> AppResult<DeviceReport>
    where
        F: FnMut(&DeviceConfig) -> AppResult<Box<dyn PunchSource>>,
    {
        let mut source = make_source(device)?;
        let state = load_state(conn, &device.name)?;
        let (report, new_state) =
            Self::sync_device(conn, settings, device, source.as_mut(), state, now)?;
        save_state(conn, &device.name, &new_state)?;
        Ok(report)
    }
}
