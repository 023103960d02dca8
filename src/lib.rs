//! zkcheckin library root.
//! Exposes the CLI parser, the high-level run() function, and internal modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;

use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use std::path::{Path, PathBuf};

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config, cfg_path: &Path) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli, cfg_path),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg, cfg_path),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::Employee { .. } => cli::commands::employee::handle(&cli.command, cfg),
        Commands::Import { .. } => cli::commands::import::handle(&cli.command, cfg),
        Commands::Sync { .. } => cli::commands::sync::handle(&cli.command, cfg),
        Commands::Repair { .. } => cli::commands::repair::handle(&cli.command, cfg),
        Commands::Dedupe { .. } => cli::commands::dedupe::handle(&cli.command, cfg),
        Commands::Detect { .. } => cli::commands::detect::handle(&cli.command, cfg),
        Commands::Status { .. } => cli::commands::status::handle(&cli.command, cfg),
        Commands::Token { .. } => cli::commands::token::handle(&cli.command, cfg, cfg_path),
        Commands::Preview { .. } => cli::commands::preview::handle(&cli.command, cfg),
    }
}

/// Path of the configuration file a command line refers to.
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .as_deref()
        .map(utils::path::expand_tilde)
        .unwrap_or_else(Config::config_file)
}

/// Entry point used by main.rs
pub fn run(cli: Cli) -> AppResult<()> {
    let cfg_path = config_path(&cli);

    // load the configuration once
    let mut cfg = Config::load_from(&cfg_path)?;

    // --db wins over the configured database
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    dispatch(&cli, &cfg, &cfg_path)
}
