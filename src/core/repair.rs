//! Backfill/repair: re-derive labels of stored check-ins by position.
//!
//! Every (employee, day) group is recomputed from scratch: first IN, last
//! OUT, alternation in between. Stored labels are never a signal.

use crate::core::normalizer::{group_by_day, positional_labels};
use crate::db::log::ttlog_quiet;
use crate::db::queries::{CheckinFilter, load_checkins, set_log_type};
use crate::errors::AppResult;
use crate::models::checkin::TIME_FORMAT;
use crate::models::label::Direction;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelUpdate {
    pub event_id: i64,
    pub old_label: Direction,
    pub new_label: Direction,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RepairReport {
    pub examined: usize,
    /// Planned changes for a dry run, rows actually written once applied.
    pub changed: usize,
    pub already_correct: usize,
    pub groups: usize,
    pub updates: Vec<LabelUpdate>,
    /// Updates skipped because another row already holds the new identity.
    pub conflicts: usize,
    /// False for a dry run.
    pub applied: bool,
}

pub struct RepairLogic;

impl RepairLogic {
    /// Compute the label diff for stored check-ins matching `filter`.
    pub fn plan(conn: &Connection, filter: &CheckinFilter) -> AppResult<RepairReport> {
        let checkins = load_checkins(conn, filter)?;
        let groups = group_by_day(&checkins, |c| Some((c.employee.clone(), c.time)));

        let mut report = RepairReport {
            examined: checkins.len(),
            groups: groups.len(),
            ..RepairReport::default()
        };

        for ((emp, day), indices) in &groups {
            let labels = positional_labels(indices.len());
            debug!(employee = %emp, %day, events = indices.len(), "recomputing day");

            for (&idx, target) in indices.iter().zip(labels) {
                let c = &checkins[idx];
                if c.log_type == target {
                    report.already_correct += 1;
                    continue;
                }
                debug!(id = c.id, time = %c.time, from = %c.log_type, to = %target, "label differs");
                report.updates.push(LabelUpdate {
                    event_id: c.id,
                    old_label: c.log_type,
                    new_label: target,
                });
            }
        }

        report.changed = report.updates.len();
        Ok(report)
    }

    /// Plan and, unless `dry_run`, write all updates in one transaction.
    pub fn apply(
        conn: &Connection,
        filter: &CheckinFilter,
        dry_run: bool,
        now: NaiveDateTime,
    ) -> AppResult<RepairReport> {
        let mut report = Self::plan(conn, filter)?;

        if dry_run || report.updates.is_empty() {
            info!(
                examined = report.examined,
                changed = report.changed,
                dry_run,
                "repair computed"
            );
            return Ok(report);
        }

        let stamp = now.format(TIME_FORMAT).to_string();
        let tx = conn.unchecked_transaction()?;
        let mut written = 0;
        for u in &report.updates {
            match set_log_type(&tx, u.event_id, u.new_label, &stamp) {
                Ok(n) => written += n,
                Err(e) if e.is_unique_violation() => {
                    warn!(id = u.event_id, to = %u.new_label, "label change collides with a stored row");
                    report.conflicts += 1;
                }
                Err(e) => return Err(e),
            }
        }
        tx.commit()?;
        report.changed = written;
        report.applied = true;

        info!(
            examined = report.examined,
            changed = report.changed,
            conflicts = report.conflicts,
            "repair applied"
        );
        ttlog_quiet(
            conn,
            "repair",
            filter.device_pattern.as_deref().unwrap_or("all"),
            &format!(
                "examined={} changed={} already_correct={} conflicts={}",
                report.examined, report.changed, report.already_correct, report.conflicts
            ),
        );
        Ok(report)
    }
}
