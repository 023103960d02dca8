//! Punch sources: the vendor API, terminals in device-mode, and saved
//! JSON dumps.

pub mod api;
pub mod device;
pub mod file;
pub mod transaction;

use crate::config::{Config, DeviceConfig, TransportMode};
use crate::errors::{AppError, AppResult};
use crate::models::punch::Punch;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Inclusive time range requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

pub trait PunchSource {
    /// Short human description for logs and summaries.
    fn describe(&self) -> String;

    fn fetch(&mut self, window: &FetchWindow) -> AppResult<Vec<Punch>>;
}

/// Source for a configured device, by transport mode. Api-mode needs a
/// token; this is checked here, before any I/O.
pub fn source_for(device: &DeviceConfig, cfg: &Config) -> AppResult<Box<dyn PunchSource>> {
    match device.mode() {
        TransportMode::Api => {
            if device.token().is_none() {
                return Err(AppError::MissingCredentials(format!(
                    "device '{}' has no API token (run `zkcheckin token --device {}`)",
                    device.name, device.name
                )));
            }
            let client = api::ApiClient::from_config(device, cfg)?;
            Ok(Box::new(api::ApiSource::new(client, device)))
        }
        TransportMode::Device => Ok(Box::new(device::DeviceSource::new(
            Box::new(device::AttlogConnector),
            device,
        ))),
    }
}
