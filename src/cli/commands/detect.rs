use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::detector::detect_with_rule;
use crate::core::normalizer::normalize;
use crate::db::employees::resolve_employee;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::sources::transaction::decode_value;
use crate::ui::messages::{detail, header, warning};
use crate::utils::colors::{GREY, RESET, colorize_direction};
use serde_json::Value;
use std::path::Path;

fn or_dash<T: ToString>(v: Option<T>) -> String {
    v.map(|x| x.to_string())
        .unwrap_or_else(|| format!("{GREY}--{RESET}"))
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Detect { json } = cmd {
        let value: Value = serde_json::from_str(json)?;
        let punch = decode_value(value, "cli");
        let detection = detect_with_rule(&punch.raw);

        // what the normalizer makes of it as the only punch of its day
        let mut alone = vec![punch.clone()];
        normalize(&mut alone);

        header("Transaction preview");
        detail(
            "detected",
            format!(
                "{} (rule: {})",
                colorize_direction(detection.direction.to_db_str()),
                detection.rule.unwrap_or("default")
            ),
        );
        detail("source label", format!("{:?}", punch.label));
        detail(
            "as sole punch",
            or_dash(alone[0].direction().map(|d| colorize_direction(d.to_db_str()))),
        );
        detail("employee code", or_dash(punch.employee_code.as_deref()));
        detail("time", or_dash(punch.timestamp));
        detail("transaction id", or_dash(punch.transaction_id.as_deref()));
        detail("device id", punch.unique_device_id());

        if let Some(code) = &punch.employee_code {
            if Path::new(&cfg.database).exists() {
                let pool = DbPool::open_migrated(&cfg.database)?;
                match resolve_employee(&pool.conn, code)? {
                    Some(r) => detail(
                        "employee",
                        format!("{} (matched on {})", r.employee.name, r.matched_on),
                    ),
                    None => warning(format!("No employee matches code '{}'.", code)),
                }
            } else {
                detail("employee", format!("{GREY}database not initialized{RESET}"));
            }
        }
    }
    Ok(())
}
