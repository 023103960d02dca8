pub mod messages;
pub mod summary;
