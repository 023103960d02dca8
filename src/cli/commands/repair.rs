use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::repair::RepairLogic;
use crate::db::pool::DbPool;
use crate::db::queries::CheckinFilter;
use crate::errors::AppResult;
use crate::ui::summary::print_repair;
use crate::utils::date::{now_local, parse_date};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Repair {
        device,
        since,
        apply,
        json,
    } = cmd
    {
        let filter = CheckinFilter {
            device_pattern: device.clone(),
            since: since.as_deref().map(parse_date).transpose()?,
            employee: None,
        };

        let pool = DbPool::open_migrated(&cfg.database)?;
        let report = RepairLogic::apply(&pool.conn, &filter, !*apply, now_local())?;

        if *json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_repair(&report);
        }
    }
    Ok(())
}
