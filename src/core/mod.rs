pub mod dedupe;
pub mod detector;
pub mod gate;
pub mod lock;
pub mod log;
pub mod normalizer;
pub mod repair;
pub mod status;
pub mod sync;
