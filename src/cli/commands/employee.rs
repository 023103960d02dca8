use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::employees::{import_csv, list_employees, upsert_employee};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::employee::Employee;
use crate::ui::messages::{info, success};
use crate::utils::colors::{GREY, RESET};
use crate::utils::formatting::pad_right;
use std::fs::File;

fn or_dash(v: &Option<String>) -> String {
    v.clone().unwrap_or_else(|| format!("{GREY}--{RESET}"))
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Employee {
        add,
        full_name,
        number,
        user,
        device_id,
        list,
        import,
    } = cmd
    {
        let pool = DbPool::open_migrated(&cfg.database)?;

        if let Some(name) = add {
            let employee = Employee {
                employee_name: full_name.clone(),
                employee_number: number.clone(),
                user_id: user.clone(),
                attendance_device_id: device_id.clone(),
                ..Employee::new(name.trim())
            };
            upsert_employee(&pool.conn, &employee)?;
            ttlog_quiet(&pool.conn, "employee", name, "added or replaced");
            success(format!("Employee '{}' saved.", employee.name));
        }

        if let Some(path) = import {
            let n = import_csv(&pool.conn, File::open(path)?)?;
            ttlog_quiet(&pool.conn, "employee", path, &format!("imported {} rows", n));
            success(format!("Imported {} employee(s) from {}.", n, path));
        }

        if *list {
            let employees = list_employees(&pool.conn)?;
            if employees.is_empty() {
                info("No employees.");
                return Ok(());
            }
            println!(
                "{} {} {} {} {}",
                pad_right("NAME", 16),
                pad_right("FULL NAME", 24),
                pad_right("NUMBER", 10),
                pad_right("USER", 16),
                "DEVICE ID"
            );
            for e in employees {
                println!(
                    "{} {} {} {} {}",
                    pad_right(&e.name, 16),
                    pad_right(&or_dash(&e.employee_name), 24),
                    pad_right(&or_dash(&e.employee_number), 10),
                    pad_right(&or_dash(&e.user_id), 16),
                    or_dash(&e.attendance_device_id)
                );
            }
        }
    }

    Ok(())
}
