use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::ttlog_quiet;
use crate::db::migrate::run_pending_migrations;
use crate::db::pool::DbPool;
use crate::db::stats;
use crate::errors::AppResult;
use crate::ui::messages::{error, info, success};

/// Store maintenance. Steps run in a fixed order: migrate, info, check, vacuum.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Db {
        migrate,
        check,
        vacuum,
        info: show_info,
    } = cmd
    else {
        return Ok(());
    };

    if !(*migrate || *check || *vacuum || *show_info) {
        info("Nothing to do: pass --migrate, --check, --vacuum or --info.");
        return Ok(());
    }

    let pool = DbPool::new(&cfg.database)?;

    if *migrate {
        info("Running migrations…");
        run_pending_migrations(&pool.conn)?;
        success("Schema is up to date.");
    }

    if *show_info {
        stats::print_db_info(&pool, &cfg.database)?;
    }

    if *check {
        info("Running integrity check…");
        let integrity: String = pool
            .conn
            .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;

        if integrity == "ok" {
            success("Integrity check passed.");
        } else {
            error(format!("Integrity check failed: {}", integrity));
        }
        ttlog_quiet(&pool.conn, "db", "integrity_check", &integrity);
    }

    if *vacuum {
        info("Running VACUUM…");
        pool.conn.execute_batch("VACUUM;")?;
        success("Vacuum completed.");
        ttlog_quiet(&pool.conn, "db", "vacuum", "database compacted");
    }

    Ok(())
}
