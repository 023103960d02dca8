use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::lock::{SyncLock, lock_key};
use crate::core::sync::SyncLogic;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::sources::file::FileSource;
use crate::sources::{FetchWindow, PunchSource};
use crate::ui::messages::{header, success};
use crate::ui::summary::print_ingest;
use crate::utils::date::now_local;

/// Ingest a saved response file as if it came from the device. The
/// device checkpoint is left alone.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Import { device, file, json } = cmd {
        let device = cfg.device(device)?;
        let pool = DbPool::open_migrated(&cfg.database)?;
        let now = now_local();

        let _lock = SyncLock::acquire(
            &pool.conn,
            lock_key(Some(&device.name)),
            cfg.lock_ttl(),
            now,
        )?;

        let mut source = FileSource::new(file, device.identifier());
        let punches = source.fetch(&FetchWindow {
            start: now,
            end: now,
        })?;
        let report = SyncLogic::ingest(&pool.conn, cfg, punches, now)?;

        ttlog_quiet(
            &pool.conn,
            "import",
            &device.name,
            &format!(
                "file={} created={} duplicates={} skipped={}",
                file, report.created, report.duplicates, report.skipped
            ),
        );

        if *json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            header(format!("Import {} ({})", file, device.name));
            print_ingest(&report);
            success(format!("{} check-in(s) created.", report.created));
        }
    }
    Ok(())
}
