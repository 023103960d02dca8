use crate::config::{Config, TransportMode};
use crate::db::queries::count_created_since;
use crate::db::state::{GLOBAL_SCOPE, load_state};
use crate::errors::AppResult;
use crate::models::label::Direction;
use crate::sources::device::probe;
use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use std::time::Duration as StdDuration;

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub reachable: bool,
    pub latency_ms: Option<u128>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatus {
    pub name: String,
    pub address: String,
    pub mode: TransportMode,
    pub enabled: bool,
    pub last_sync: Option<NaiveDateTime>,
    pub total_synced: i64,
    pub probe: Option<ProbeResult>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RecentCounts {
    pub total: i64,
    pub checkins: i64,
    pub checkouts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub enable_sync: bool,
    pub sync_interval_seconds: u64,
    pub last_sync: Option<NaiveDateTime>,
    pub total_synced: i64,
    pub last_24h: RecentCounts,
    pub devices: Vec<DeviceStatus>,
}

pub struct StatusLogic;

impl StatusLogic {
    pub fn collect(
        conn: &Connection,
        cfg: &Config,
        now: NaiveDateTime,
        with_probe: bool,
    ) -> AppResult<SyncStatus> {
        let global = load_state(conn, GLOBAL_SCOPE)?;
        let since = now - Duration::hours(24);

        let last_24h = RecentCounts {
            total: count_created_since(conn, &since, None)?,
            checkins: count_created_since(conn, &since, Some(Direction::In))?,
            checkouts: count_created_since(conn, &since, Some(Direction::Out))?,
        };

        let timeout = StdDuration::from_secs(cfg.http_timeout_seconds.clamp(1, 10));
        let mut devices = Vec::with_capacity(cfg.devices.len());
        for d in &cfg.devices {
            let state = load_state(conn, &d.name)?;
            let probe = with_probe.then(|| match probe(&d.ip, d.port, timeout) {
                Ok(latency) => ProbeResult {
                    reachable: true,
                    latency_ms: Some(latency.as_millis()),
                    error: None,
                },
                Err(e) => ProbeResult {
                    reachable: false,
                    latency_ms: None,
                    error: Some(e.to_string()),
                },
            });

            devices.push(DeviceStatus {
                name: d.name.clone(),
                address: match d.mode() {
                    TransportMode::Api => d.base_url(),
                    TransportMode::Device => d.identifier(),
                },
                mode: d.mode(),
                enabled: d.enabled,
                last_sync: state.last_sync,
                total_synced: state.total_synced,
                probe,
            });
        }

        Ok(SyncStatus {
            enable_sync: cfg.enable_sync,
            sync_interval_seconds: cfg.sync_interval_seconds,
            last_sync: global.last_sync,
            total_synced: global.total_synced,
            last_24h,
            devices,
        })
    }
}
