pub mod checkin;
pub mod employee;
pub mod label;
pub mod punch;
pub mod raw;
