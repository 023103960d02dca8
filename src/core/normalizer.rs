//! Per-day IN/OUT sequence correction.
//!
//! Punches are grouped by (employee code, calendar day) and sorted by time
//! (stable, so equal timestamps keep input order). Within a group:
//! - a single punch is `IN`, a pair is always `IN`, `OUT`;
//! - in longer groups the first punch is `IN` and the last is `OUT`, and
//!   interior punches alternate from the previous resolved label.
//!
//! During ingestion an `Authoritative` label is kept at any position of a
//! group of three or more, and an interior one re-seeds the alternation.
//! During repair every position is recomputed.

use crate::models::label::{Direction, Label};
use crate::models::punch::Punch;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    /// (employee, day) groups seen.
    pub groups: usize,
    /// Punches whose label was written by the sequence rules.
    pub adjusted: usize,
    /// Punches kept because the source was authoritative.
    pub kept: usize,
    /// Punches without employee code or timestamp, left unlabelled.
    pub skipped: usize,
}

/// Labels for `len` chronologically sorted punches.
///
/// `pinned(i)` fixes position `i` when the group has three or more punches.
/// Groups of one or two ignore it.
pub fn sequence_labels<F>(len: usize, pinned: F) -> Vec<Direction>
where
    F: Fn(usize) -> Option<Direction>,
{
    match len {
        0 => return Vec::new(),
        1 => return vec![Direction::In],
        2 => return vec![Direction::In, Direction::Out],
        _ => {}
    }

    let mut out = Vec::with_capacity(len);
    let mut prev = pinned(0).unwrap_or(Direction::In);
    out.push(prev);
    for i in 1..len - 1 {
        let d = pinned(i).unwrap_or_else(|| prev.opposite());
        out.push(d);
        prev = d;
    }
    out.push(pinned(len - 1).unwrap_or(Direction::Out));
    out
}

/// Positional labels with no pinned positions (the repair rule).
pub fn positional_labels(len: usize) -> Vec<Direction> {
    sequence_labels(len, |_| None)
}

/// Group indices by `key`, each group sorted by time with ties in input order.
pub fn group_by_day<T, K>(items: &[T], key: K) -> BTreeMap<(String, NaiveDate), Vec<usize>>
where
    K: Fn(&T) -> Option<(String, NaiveDateTime)>,
{
    let mut grouped: BTreeMap<(String, NaiveDate), Vec<(NaiveDateTime, usize)>> = BTreeMap::new();
    for (idx, item) in items.iter().enumerate() {
        if let Some((emp, ts)) = key(item) {
            grouped.entry((emp, ts.date())).or_default().push((ts, idx));
        }
    }

    grouped
        .into_iter()
        .map(|(k, mut v)| {
            // sort_by_key is stable
            v.sort_by_key(|(ts, _)| *ts);
            (k, v.into_iter().map(|(_, i)| i).collect())
        })
        .collect()
}

/// Fresh-ingestion normalization, in place. Input order is preserved.
pub fn normalize(punches: &mut [Punch]) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    let groups = group_by_day(punches, |p| {
        let key = p.day_key()?;
        Some((key.0, p.timestamp?))
    });

    report.skipped = punches.iter().filter(|p| p.day_key().is_none()).count();
    if report.skipped > 0 {
        warn!(
            skipped = report.skipped,
            "punches without employee code or timestamp left out of sequencing"
        );
    }

    for ((emp, day), indices) in &groups {
        report.groups += 1;
        info!(employee = %emp, %day, punches = indices.len(), "sequencing day");

        let labels = sequence_labels(indices.len(), |pos| match punches[indices[pos]].label {
            Label::Authoritative(d) => Some(d),
            _ => None,
        });

        for (pos, (&idx, target)) in indices.iter().zip(labels).enumerate() {
            let punch = &mut punches[idx];
            let before = punch.label;

            if before == Label::Authoritative(target) {
                report.kept += 1;
                debug!(position = pos + 1, label = %target, "keeping source label");
                continue;
            }

            punch.label = Label::Sequenced(target);
            report.adjusted += 1;
            debug!(
                position = pos + 1,
                time = ?punch.timestamp,
                from = ?before,
                to = %target,
                "label set from sequence"
            );
        }
    }

    report
}
