use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::sync::SyncLogic;
use crate::db::pool::DbPool;
use crate::db::state::{GLOBAL_SCOPE, load_state};
use crate::errors::{AppError, AppResult};
use crate::sources::source_for;
use crate::ui::messages::{info, warning};
use crate::ui::summary::print_sync_summary;
use crate::utils::date::now_local;
use serde_json::json;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Sync {
        device,
        scheduled,
        json,
    } = cmd
    {
        let pool = DbPool::open_migrated(&cfg.database)?;
        let now = now_local();

        if *scheduled {
            let global = load_state(&pool.conn, GLOBAL_SCOPE)?;
            if !SyncLogic::is_due(cfg, &global, now) {
                if *json {
                    println!(
                        "{}",
                        json!({ "skipped": true, "reason": "not_due", "last_sync": global.last_sync })
                    );
                } else {
                    info("Sync interval has not elapsed yet, nothing to do.");
                }
                return Ok(());
            }
        }

        let result = SyncLogic::sync_all(
            &pool.conn,
            cfg,
            device.as_deref(),
            |d| source_for(d, cfg),
            now,
        );

        let summary = match result {
            Ok(summary) => summary,
            Err(AppError::AlreadyRunning(key)) => {
                if *json {
                    println!(
                        "{}",
                        json!({ "skipped": true, "reason": "already_running", "lock": key })
                    );
                } else {
                    warning(format!("Sync already running ({}).", key));
                }
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if *json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_sync_summary(&summary);
        }
    }
    Ok(())
}
