use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::initialize::init_db;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use std::path::Path;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file (devices of an existing file are kept)
///  - the SQLite database and all pending migrations
pub fn handle(cli: &Cli, cfg_path: &Path) -> AppResult<()> {
    let db_path = Config::init_all(cfg_path, cli.db.clone())?;
    let db_path = db_path.to_string_lossy().to_string();

    println!("⚙️  Initializing zkcheckin…");
    info(format!("Config file : {}", cfg_path.display()));
    info(format!("Database    : {}", db_path));

    let pool = DbPool::new(&db_path)?;
    init_db(&pool.conn)?;

    success(format!("Database initialized at {}", db_path));

    ttlog_quiet(
        &pool.conn,
        "init",
        "database",
        &format!("Database initialized at {}", db_path),
    );
    Ok(())
}
