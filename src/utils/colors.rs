/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Green for IN, red for OUT.
pub fn colorize_direction(value: &str) -> String {
    match value.trim() {
        "IN" => format!("{GREEN}{value}{RESET}"),
        "OUT" => format!("{RED}{value}{RESET}"),
        _ => format!("{GREY}{value}{RESET}"),
    }
}

/// Grey for empty values and zero counts.
pub fn colorize_count(n: usize) -> String {
    if n == 0 {
        format!("{GREY}{n}{RESET}")
    } else {
        n.to_string()
    }
}
