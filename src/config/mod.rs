use crate::errors::{AppError, AppResult};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Native ZKTeco protocol port; any other port is an HTTP API.
pub const DEVICE_MODE_PORT: u16 = 4370;

const MAX_FUTURE_TOLERANCE_MINUTES: i64 = 24 * 60;
const MAX_AGE_DAYS: i64 = 36_500;
const MAX_PERIOD_SECONDS: u64 = 24 * 60 * 60;
const MAX_HTTP_TIMEOUT_SECONDS: u64 = 600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_enable_sync")]
    pub enable_sync: bool,
    #[serde(default = "default_interval")]
    pub sync_interval_seconds: u64,
    #[serde(default = "default_lock_ttl")]
    pub lock_ttl_seconds: u64,
    #[serde(default = "default_commit_every")]
    pub commit_every: usize,
    #[serde(default = "default_future_tolerance")]
    pub future_tolerance_minutes: i64,
    #[serde(default = "default_max_age")]
    pub max_age_days: i64,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceConfig {
    pub name: String,
    pub ip: String,
    pub port: u16,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_https: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attlog: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    Device,
    Api,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Device => f.write_str("device-mode"),
            TransportMode::Api => f.write_str("api-mode"),
        }
    }
}

fn default_enable_sync() -> bool {
    true
}
fn default_interval() -> u64 {
    300
}
fn default_lock_ttl() -> u64 {
    300
}
fn default_commit_every() -> usize {
    50
}
fn default_future_tolerance() -> i64 {
    5
}
fn default_max_age() -> i64 {
    90
}
fn default_http_timeout() -> u64 {
    30
}
fn default_enabled() -> bool {
    true
}

fn check_range<T>(field: &str, value: T, min: T, max: T) -> AppResult<()>
where
    T: PartialOrd + fmt::Display,
{
    if value < min || value > max {
        return Err(AppError::Config(format!(
            "{} must be between {} and {} (got {})",
            field, min, max, value
        )));
    }
    Ok(())
}

/// Saturates instead of panicking for values past what `Duration` holds.
fn seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

impl Default for Config {
    fn default() -> Self {
        let db_path = Self::database_file();
        Self {
            database: db_path.to_string_lossy().to_string(),
            enable_sync: default_enable_sync(),
            sync_interval_seconds: default_interval(),
            lock_ttl_seconds: default_lock_ttl(),
            commit_every: default_commit_every(),
            future_tolerance_minutes: default_future_tolerance(),
            max_age_days: default_max_age(),
            http_timeout_seconds: default_http_timeout(),
            devices: Vec::new(),
        }
    }
}

impl DeviceConfig {
    pub fn new(name: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            port,
            enabled: true,
            username: None,
            password: None,
            token: None,
            use_https: None,
            attlog: None,
        }
    }

    pub fn mode(&self) -> TransportMode {
        if self.port == DEVICE_MODE_PORT {
            TransportMode::Device
        } else {
            TransportMode::Api
        }
    }

    /// `ip:port`, used to scope duplicate detection per device.
    pub fn identifier(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// HTTPS when configured, otherwise for the usual TLS ports.
    pub fn https(&self) -> bool {
        self.use_https
            .unwrap_or(matches!(self.port, 443 | 8443))
    }

    /// `scheme://ip:port`, no trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = if self.https() { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.ip, self.port)
    }

    /// Token, if configured and not blank.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        let base = if cfg!(target_os = "windows") {
            dirs::config_dir()
        } else {
            dirs::home_dir()
        };
        let base = base.unwrap_or_else(|| PathBuf::from("."));
        if cfg!(target_os = "windows") {
            base.join("zkcheckin")
        } else {
            base.join(".zkcheckin")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("zkcheckin.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("zkcheckin.sqlite")
    }

    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    /// Load configuration from `path`, or defaults if the file is absent.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let cfg: Config = serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("cannot parse configuration: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save to the default location.
    pub fn save(&self) -> AppResult<()> {
        self.save_to(&Self::config_file())
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|_| AppError::ConfigSave)?;
        }
        let mut file = fs::File::create(path).map_err(|_| AppError::ConfigSave)?;
        file.write_all(yaml.as_bytes())
            .map_err(|_| AppError::ConfigSave)?;
        Ok(())
    }

    fn validate(&self) -> AppResult<()> {
        if self.commit_every == 0 {
            return Err(AppError::Config("commit_every must be at least 1".into()));
        }
        check_range(
            "future_tolerance_minutes",
            self.future_tolerance_minutes,
            0,
            MAX_FUTURE_TOLERANCE_MINUTES,
        )?;
        check_range("max_age_days", self.max_age_days, 1, MAX_AGE_DAYS)?;
        check_range(
            "sync_interval_seconds",
            self.sync_interval_seconds,
            1,
            MAX_PERIOD_SECONDS,
        )?;
        check_range("lock_ttl_seconds", self.lock_ttl_seconds, 1, MAX_PERIOD_SECONDS)?;
        check_range(
            "http_timeout_seconds",
            self.http_timeout_seconds,
            1,
            MAX_HTTP_TIMEOUT_SECONDS,
        )?;
        let mut names: Vec<&str> = self.devices.iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        if let Some(w) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(AppError::Config(format!("duplicate device name '{}'", w[0])));
        }
        Ok(())
    }

    /// Minimum spacing between scheduled runs.
    pub fn sync_interval(&self) -> Duration {
        seconds(self.sync_interval_seconds)
    }

    /// How long a sync lock stays valid without being released.
    pub fn lock_ttl(&self) -> Duration {
        seconds(self.lock_ttl_seconds)
    }

    pub fn device(&self, name: &str) -> AppResult<&DeviceConfig> {
        self.devices
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| AppError::DeviceNotFound(name.to_string()))
    }

    pub fn device_mut(&mut self, name: &str) -> AppResult<&mut DeviceConfig> {
        self.devices
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| AppError::DeviceNotFound(name.to_string()))
    }

    /// Initialize configuration and database files.
    ///
    /// Returns the database path that was configured.
    pub fn init_all(config_path: &Path, custom_db: Option<String>) -> AppResult<PathBuf> {
        let dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_dir);
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_db {
            let p = Path::new(&name);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                dir.join(p)
            }
        } else {
            dir.join("zkcheckin.sqlite")
        };

        // keep devices of an existing file
        let mut config = if config_path.exists() {
            Self::load_from(config_path)?
        } else {
            Config::default()
        };
        config.database = db_path.to_string_lossy().to_string();

        config.save_to(config_path)?;

        // Create empty DB file if not exists
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        Ok(db_path)
    }
}
