use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::status::StatusLogic;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::summary::print_status;
use crate::utils::date::now_local;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Status { probe } = cmd {
        let pool = DbPool::open_migrated(&cfg.database)?;
        let status = StatusLogic::collect(&pool.conn, cfg, now_local(), *probe)?;
        print_status(&status);
    }
    Ok(())
}
