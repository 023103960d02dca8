use crate::errors::AppResult;
use crate::models::punch::Punch;
use crate::sources::transaction::{self, extract_page};
use crate::sources::{FetchWindow, PunchSource};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// Offline import of a saved API response (any accepted response shape).
pub struct FileSource {
    path: PathBuf,
    fallback_device: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, fallback_device: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fallback_device: fallback_device.into(),
        }
    }
}

/// Decode every record of a JSON response body.
pub fn decode_body(body: Value, fallback_device: &str) -> AppResult<Vec<Punch>> {
    let page = extract_page(body)?;
    Ok(page
        .records
        .into_iter()
        .map(|v| transaction::decode_value(v, fallback_device))
        .collect())
}

impl PunchSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    /// The whole file is returned; the window does not apply to dumps.
    fn fetch(&mut self, _window: &FetchWindow) -> AppResult<Vec<Punch>> {
        let content = fs::read_to_string(&self.path)?;
        let body: Value = serde_json::from_str(&content)?;
        decode_body(body, &self.fallback_device)
    }
}
