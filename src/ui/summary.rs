//! Human-readable reports for sync, repair, dedupe and status.

use crate::core::dedupe::DedupeReport;
use crate::core::repair::RepairReport;
use crate::core::status::SyncStatus;
use crate::core::sync::{DeviceReport, IngestReport, SyncSummary};
use crate::ui::messages::{detail, header, info, success, warning};
use crate::utils::colors::{GREY, RESET, colorize_count, colorize_direction};
use crate::utils::formatting::{bold, pad_right};
use chrono::NaiveDateTime;

fn fmt_time(t: Option<NaiveDateTime>) -> String {
    match t {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("{GREY}never{RESET}"),
    }
}

pub fn print_ingest(report: &IngestReport) {
    detail("fetched", report.fetched);
    detail("created", colorize_count(report.created));
    detail("duplicates", colorize_count(report.duplicates));
    detail("skipped", colorize_count(report.skipped));
    detail("failed", colorize_count(report.failed));
    detail(
        "sequence",
        format!(
            "{} day groups, {} labels set, {} kept from source",
            report.normalized.groups, report.normalized.adjusted, report.normalized.kept
        ),
    );
    for (reason, n) in &report.rejections {
        println!("      {} {}", pad_right(reason, 24), n);
    }
}

fn print_device(report: &DeviceReport) {
    println!();
    println!("{} ({})", bold(&report.device), report.mode);
    if let Some(err) = &report.error {
        warning(format!("sync failed: {}", err));
        return;
    }
    if let Some(w) = &report.window {
        detail("window", format!("{} → {}", w.start, w.end));
    }
    detail("source", &report.source);
    print_ingest(&report.ingest);
}

pub fn print_sync_summary(summary: &SyncSummary) {
    header("Sync summary");
    for d in &summary.devices {
        print_device(d);
    }
    println!();

    let line = format!(
        "{} created, {} duplicates, {} skipped, {} failed ({} device(s) ok, {} failed)",
        summary.created,
        summary.duplicates,
        summary.skipped,
        summary.failed,
        summary.devices_ok,
        summary.devices_failed
    );
    if summary.devices_failed > 0 {
        warning(line);
    } else {
        success(line);
    }
}

pub fn print_repair(report: &RepairReport) {
    header(if report.applied {
        "Repair applied"
    } else {
        "Repair (dry run)"
    });
    detail("examined", report.examined);
    detail("employee days", report.groups);
    detail("already correct", report.already_correct);
    detail(
        if report.applied { "changed" } else { "to change" },
        colorize_count(report.changed),
    );
    if report.conflicts > 0 {
        warning(format!(
            "{} change(s) skipped: another row already has that label",
            report.conflicts
        ));
    }

    for u in report.updates.iter().take(50) {
        println!(
            "      #{:<8} {} → {}",
            u.event_id,
            colorize_direction(u.old_label.to_db_str()),
            colorize_direction(u.new_label.to_db_str())
        );
    }
    if report.updates.len() > 50 {
        println!("      … {} more", report.updates.len() - 50);
    }

    if !report.applied && report.changed > 0 {
        info("Run again with --apply to write these changes.");
    }
}

pub fn print_dedupe(report: &DedupeReport) {
    header(if report.applied {
        "Duplicates removed"
    } else {
        "Duplicate check-ins"
    });
    detail("examined", report.examined);
    detail("duplicates", colorize_count(report.removed));
    for g in &report.groups {
        println!(
            "      {} {} {}  keep #{}  drop {:?}",
            pad_right(&g.employee, 16),
            g.time,
            colorize_direction(g.log_type.to_db_str()),
            g.kept,
            g.removed
        );
    }
}

pub fn print_status(status: &SyncStatus) {
    header("Sync status");
    detail(
        "sync",
        if status.enable_sync {
            "enabled"
        } else {
            "disabled"
        },
    );
    detail("interval", format!("{} s", status.sync_interval_seconds));
    detail("last sync", fmt_time(status.last_sync));
    detail("total synced", status.total_synced);
    detail(
        "last 24h",
        format!(
            "{} check-ins ({} IN, {} OUT)",
            status.last_24h.total, status.last_24h.checkins, status.last_24h.checkouts
        ),
    );

    println!();
    if status.devices.is_empty() {
        info("No devices configured.");
        return;
    }
    for d in &status.devices {
        let state = if d.enabled { "" } else { " [disabled]" };
        println!("{} {} ({}){}", bold(&d.name), d.address, d.mode, state);
        detail("last sync", fmt_time(d.last_sync));
        detail("total synced", d.total_synced);
        if let Some(p) = &d.probe {
            match (p.reachable, p.latency_ms, &p.error) {
                (true, Some(ms), _) => detail("probe", format!("reachable in {} ms", ms)),
                (_, _, Some(err)) => detail("probe", format!("unreachable: {}", err)),
                _ => detail("probe", "unknown"),
            }
        }
    }
}
