use crate::cli::parser::Commands;
use crate::config::{Config, TransportMode};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::sources::api::ApiClient;
use crate::ui::messages::{info, success};
use std::path::Path;

/// Obtain a token for an api-mode device and store it in the config file.
pub fn handle(cmd: &Commands, cfg: &Config, cfg_path: &Path) -> AppResult<()> {
    if let Commands::Token { device } = cmd {
        let dev = cfg.device(device)?;

        if dev.mode() == TransportMode::Device {
            info(format!(
                "'{}' uses device-mode on port {}; no token is needed.",
                dev.name, dev.port
            ));
            return Ok(());
        }

        let token = ApiClient::from_config(dev, cfg)?.obtain_token()?;

        // persist against the file as written, not the --db override
        let mut stored = Config::load_from(cfg_path)?;
        stored.device_mut(device)?.token = Some(token);
        stored.save_to(cfg_path)?;

        if let Ok(pool) = DbPool::open_migrated(&cfg.database) {
            ttlog_quiet(&pool.conn, "token", device, "API token registered");
        }
        success(format!("Token stored for '{}' in {}.", device, cfg_path.display()));
    }
    Ok(())
}
