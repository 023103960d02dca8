//! Blocking HTTP client for the vendor attendance API.

use crate::config::{Config, DeviceConfig};
use crate::errors::{AppError, AppResult};
use crate::models::checkin::TIME_FORMAT;
use crate::models::punch::Punch;
use crate::sources::transaction::{self, extract_page};
use crate::sources::{FetchWindow, PunchSource};
use crate::utils::formatting::truncate;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TRANSACTIONS_ENDPOINT: &str = "/iclock/api/transactions/";
pub const TOKEN_ENDPOINT: &str = "/api-token-auth/";

/// Safety cap on `next` links followed in one fetch.
pub const MAX_PAGES: usize = 100;

/// Full URL for `endpoint` on a device. HTTPS is used when requested, or
/// by default on ports 443 and 8443.
pub fn build_api_url(ip: &str, port: u16, endpoint: &str, use_https: Option<bool>) -> String {
    let https = use_https.unwrap_or(matches!(port, 443 | 8443));
    let scheme = if https { "https" } else { "http" };
    format!(
        "{}://{}:{}/{}",
        scheme,
        ip.trim(),
        port,
        endpoint.trim_start_matches('/')
    )
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

pub struct ApiClient {
    client: Client,
    device: DeviceConfig,
}

impl ApiClient {
    pub fn new(device: &DeviceConfig, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            device: device.clone(),
        })
    }

    pub fn from_config(device: &DeviceConfig, cfg: &Config) -> AppResult<Self> {
        Self::new(device, Duration::from_secs(cfg.http_timeout_seconds))
    }

    fn url(&self, endpoint: &str) -> String {
        build_api_url(
            &self.device.ip,
            self.device.port,
            endpoint,
            self.device.use_https,
        )
    }

    fn auth(&self, req: RequestBuilder) -> AppResult<RequestBuilder> {
        let token = self
            .device
            .token()
            .ok_or_else(|| AppError::MissingCredentials(format!("no API token for '{}'", self.device.name)))?;
        Ok(req
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json"))
    }

    /// `POST /api-token-auth/` with the configured username and password.
    pub fn obtain_token(&self) -> AppResult<String> {
        let (Some(user), Some(pass)) = (&self.device.username, &self.device.password) else {
            return Err(AppError::MissingCredentials(format!(
                "username and password are required for '{}'",
                self.device.name
            )));
        };

        let resp = self
            .client
            .post(self.url(TOKEN_ENDPOINT))
            .json(&json!({ "username": user, "password": pass }))
            .send()?;
        let body: TokenResponse = check_status(resp)?.json()?;

        if body.token.trim().is_empty() {
            return Err(AppError::Api {
                status: 200,
                body: "empty token in response".into(),
            });
        }
        info!(device = %self.device.name, "API token obtained");
        Ok(body.token)
    }

    /// `GET /iclock/api/transactions/` for the window, following `next`.
    pub fn fetch_transactions(&self, window: &FetchWindow) -> AppResult<Vec<Value>> {
        let first = self
            .auth(self.client.get(self.url(TRANSACTIONS_ENDPOINT)))?
            .query(&[
                ("start_time", window.start.format(TIME_FORMAT).to_string()),
                ("end_time", window.end.format(TIME_FORMAT).to_string()),
            ]);

        let mut page = extract_page(check_status(first.send()?)?.json()?)?;
        let mut records = std::mem::take(&mut page.records);
        let mut pages = 1;

        while let Some(next) = page.next.take() {
            if pages >= MAX_PAGES {
                warn!(device = %self.device.name, pages, "page limit reached, stopping");
                break;
            }
            debug!(device = %self.device.name, page = pages + 1, url = %next, "following next page");
            let resp = self.auth(self.client.get(&next))?.send()?;
            page = extract_page(check_status(resp)?.json()?)?;
            records.append(&mut page.records);
            pages += 1;
        }

        info!(
            device = %self.device.name,
            records = records.len(),
            pages,
            "transactions fetched"
        );
        Ok(records)
    }
}

/// Non-2xx responses become `AppError::Api` with the start of the body.
fn check_status(resp: Response) -> AppResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(AppError::Api {
        status: status.as_u16(),
        body: truncate(&body, 200),
    })
}

/// API-mode source for one device.
pub struct ApiSource {
    client: ApiClient,
    fallback_device: String,
}

impl ApiSource {
    pub fn new(client: ApiClient, device: &DeviceConfig) -> Self {
        Self {
            client,
            fallback_device: device.identifier(),
        }
    }
}

impl PunchSource for ApiSource {
    fn describe(&self) -> String {
        format!("api {}", self.client.url(TRANSACTIONS_ENDPOINT))
    }

    fn fetch(&mut self, window: &FetchWindow) -> AppResult<Vec<Punch>> {
        let records = self.client.fetch_transactions(window)?;
        Ok(records
            .into_iter()
            .map(|v| transaction::decode_value(v, &self.fallback_device))
            .collect())
    }
}
