//! Duplicate removal: one check-in per (employee, time, log_type), the
//! earliest created one.

use crate::db::log::ttlog_quiet;
use crate::db::queries::{CheckinFilter, delete_checkins_by_ids, load_checkins};
use crate::errors::AppResult;
use crate::models::checkin::Checkin;
use crate::models::label::Direction;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub employee: String,
    pub time: NaiveDateTime,
    pub log_type: Direction,
    pub kept: i64,
    pub removed: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DedupeReport {
    pub examined: usize,
    pub removed: usize,
    pub groups: Vec<DuplicateGroup>,
    pub applied: bool,
}

pub struct DedupeLogic;

impl DedupeLogic {
    pub fn find(checkins: &[Checkin]) -> Vec<DuplicateGroup> {
        let mut by_key: BTreeMap<(&str, NaiveDateTime, &'static str), Vec<&Checkin>> =
            BTreeMap::new();
        for c in checkins {
            by_key
                .entry((c.employee.as_str(), c.time, c.log_type.to_db_str()))
                .or_default()
                .push(c);
        }

        by_key
            .into_values()
            .filter(|v| v.len() > 1)
            .map(|mut v| {
                v.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
                let keep = v[0];
                DuplicateGroup {
                    employee: keep.employee.clone(),
                    time: keep.time,
                    log_type: keep.log_type,
                    kept: keep.id,
                    removed: v[1..].iter().map(|c| c.id).collect(),
                }
            })
            .collect()
    }

    pub fn apply(conn: &Connection, filter: &CheckinFilter, dry_run: bool) -> AppResult<DedupeReport> {
        let checkins = load_checkins(conn, filter)?;
        let groups = Self::find(&checkins);

        let mut report = DedupeReport {
            examined: checkins.len(),
            removed: groups.iter().map(|g| g.removed.len()).sum(),
            groups,
            applied: false,
        };

        if dry_run || report.removed == 0 {
            return Ok(report);
        }

        let ids: Vec<i64> = report
            .groups
            .iter()
            .flat_map(|g| g.removed.iter().copied())
            .collect();

        let tx = conn.unchecked_transaction()?;
        delete_checkins_by_ids(&tx, &ids)?;
        tx.commit()?;
        report.applied = true;

        info!(removed = report.removed, "duplicate check-ins removed");
        ttlog_quiet(
            conn,
            "dedupe",
            filter.device_pattern.as_deref().unwrap_or("all"),
            &format!("examined={} removed={}", report.examined, report.removed),
        );
        Ok(report)
    }
}
