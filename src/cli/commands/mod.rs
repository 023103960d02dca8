pub mod config;
pub mod db;
pub mod dedupe;
pub mod detect;
pub mod employee;
pub mod import;
pub mod init;
pub mod log;
pub mod preview;
pub mod repair;
pub mod status;
pub mod sync;
pub mod token;
