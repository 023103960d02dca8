use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::dedupe::DedupeLogic;
use crate::db::pool::DbPool;
use crate::db::queries::CheckinFilter;
use crate::errors::AppResult;
use crate::ui::summary::print_dedupe;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Dedupe { device, dry_run } = cmd {
        let filter = CheckinFilter {
            device_pattern: device.clone(),
            ..CheckinFilter::default()
        };
        let pool = DbPool::open_migrated(&cfg.database)?;
        let report = DedupeLogic::apply(&pool.conn, &filter, *dry_run)?;
        print_dedupe(&report);
    }
    Ok(())
}
