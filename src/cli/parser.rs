use clap::{ArgAction, Parser, Subcommand};

/// Command-line interface definition for zkcheckin
/// Sync ZKTeco attendance punches into normalized IN/OUT check-ins
#[derive(Parser)]
#[command(
    name = "zkcheckin",
    version = env!("CARGO_PKG_VERSION"),
    about = "Sync ZKTeco attendance punches into normalized IN/OUT check-ins stored in SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Override configuration file path
    #[arg(global = true, long = "config")]
    pub config: Option<String>,

    /// Diagnostic verbosity on stderr (-v info, -vv debug)
    #[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Maintain the employee directory used to resolve device codes
    Employee {
        #[arg(long = "add", value_name = "NAME", help = "Add or replace an employee")]
        add: Option<String>,

        #[arg(long = "full-name", requires = "add")]
        full_name: Option<String>,

        #[arg(long = "number", requires = "add", help = "Employee number")]
        number: Option<String>,

        #[arg(long = "user", requires = "add", help = "Linked user account")]
        user: Option<String>,

        #[arg(long = "device-id", requires = "add", help = "Custom device ID mapping")]
        device_id: Option<String>,

        #[arg(long = "list", help = "List employees")]
        list: bool,

        #[arg(long = "import", value_name = "CSV", help = "Import employees from a CSV file")]
        import: Option<String>,
    },

    /// Ingest a saved API response file for a configured device
    Import {
        #[arg(long, value_name = "NAME")]
        device: String,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(long, help = "Print the summary as JSON")]
        json: bool,
    },

    /// Fetch punches from devices and store them as check-ins
    Sync {
        #[arg(long, value_name = "NAME", help = "Sync only this device")]
        device: Option<String>,

        #[arg(long, help = "Skip the run if the sync interval has not elapsed")]
        scheduled: bool,

        #[arg(long, help = "Print the summary as JSON")]
        json: bool,
    },

    /// Recompute IN/OUT labels of stored check-ins by position
    Repair {
        #[arg(long, value_name = "PATTERN", help = "Only device ids containing PATTERN")]
        device: Option<String>,

        #[arg(long, value_name = "DATE", help = "Only check-ins on or after DATE (YYYY-MM-DD)")]
        since: Option<String>,

        #[arg(long, help = "Write the changes (default is a dry run)")]
        apply: bool,

        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },

    /// Remove duplicate check-ins, keeping the earliest created
    Dedupe {
        #[arg(long, value_name = "PATTERN", help = "Only device ids containing PATTERN")]
        device: Option<String>,

        #[arg(long = "dry-run", help = "Report duplicates without deleting")]
        dry_run: bool,
    },

    /// Show how a raw transaction would be decoded and labelled
    Detect {
        /// Transaction as a JSON object
        json: String,
    },

    /// Show sync configuration, counters and devices
    Status {
        #[arg(long, help = "Check that each device answers on its port")]
        probe: bool,
    },

    /// Obtain an API token for a device and store it in the configuration
    Token {
        #[arg(long, value_name = "NAME")]
        device: String,
    },

    /// Fetch today's transactions from an api-mode device without storing them
    Preview {
        #[arg(long, value_name = "NAME")]
        device: String,
    },
}
