use crate::cli::parser::Commands;
use crate::config::{Config, TransportMode};
use crate::errors::{AppError, AppResult};
use crate::sources::FetchWindow;
use crate::sources::api::ApiClient;
use crate::sources::transaction::decode_value;
use crate::ui::messages::{header, info};
use crate::utils::colors::colorize_direction;
use crate::utils::date::now_local;
use chrono::NaiveTime;

const SHOWN: usize = 5;

/// Fetch today's transactions and show the first few; nothing is stored.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Preview { device } = cmd {
        let dev = cfg.device(device)?;
        if dev.mode() != TransportMode::Api {
            return Err(AppError::Config(format!(
                "preview needs an api-mode device; '{}' is {}",
                dev.name,
                dev.mode()
            )));
        }

        let now = now_local();
        let window = FetchWindow {
            start: now.date().and_time(NaiveTime::MIN),
            end: now,
        };
        let records = ApiClient::from_config(dev, cfg)?.fetch_transactions(&window)?;

        header(format!("{}: {} transaction(s) today", dev.name, records.len()));
        for value in records.iter().take(SHOWN).cloned() {
            let p = decode_value(value, &dev.identifier());
            println!(
                "  {:<12} {:<20} {:<4} {}",
                p.employee_code.as_deref().unwrap_or("?"),
                p.timestamp
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "?".into()),
                p.direction()
                    .map(|d| colorize_direction(d.to_db_str()))
                    .unwrap_or_default(),
                p.unique_device_id()
            );
        }
        if records.len() > SHOWN {
            info(format!("… and {} more.", records.len() - SHOWN));
        }
    }
    Ok(())
}
