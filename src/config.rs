use crate::messages::Language;
use anyhow::{Context, Result, ensure};
use std::{env, str::FromStr, sync::OnceLock, time::Duration};

/// Application configuration loaded and validated at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Device HTTP API configuration
    pub device: DeviceConfig,

    /// Poll periods and session timings
    pub polling: PollingConfig,

    /// Terminal page configuration
    pub ui: UiConfig,
}

#[derive(Clone, Debug)]
pub struct DeviceConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollingConfig {
    pub sensor_interval: Duration,
    pub clock_interval: Duration,
    pub wifi_status_interval: Duration,
    pub reboot_countdown_secs: u32,
    pub disconnect_reload_delay: Duration,
}

#[derive(Clone, Debug)]
pub struct UiConfig {
    pub language: Language,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            sensor_interval: Duration::from_millis(2000),
            clock_interval: Duration::from_millis(10000),
            wifi_status_interval: Duration::from_millis(2800),
            reboot_countdown_secs: 10,
            disconnect_reload_delay: Duration::from_millis(2000),
        }
    }
}

impl AppConfig {
    /// Get or load the application configuration
    ///
    /// Returns a reference to the cached configuration. On first call, it loads
    /// and validates all configuration from environment variables.
    ///
    /// # Panics
    /// Panics if configuration loading fails. The client cannot talk to a
    /// device without a valid configuration.
    pub fn get() -> &'static Self {
        static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();
        APP_CONFIG.get_or_init(|| {
            Self::load_from(|key| env::var(key).ok())
                .expect("failed to load application configuration")
        })
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let device = DeviceConfig::load(&lookup)?;
        let polling = PollingConfig::load(&lookup)?;
        let ui = UiConfig::load(&lookup)?;

        Ok(Self {
            device,
            polling,
            ui,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("failed to parse {key}: invalid format")),
        None => Ok(default),
    }
}

fn millis_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<Duration> {
    let millis = parse_or(lookup, key, default)?;
    ensure!(millis > 0, "failed to parse {key}: interval must be positive");
    Ok(Duration::from_millis(millis))
}

impl DeviceConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("DEVICE_URL").unwrap_or_else(|| "http://192.168.4.1".to_string());
        ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            "failed to parse DEVICE_URL: expected an http(s) url, got {base_url}"
        );

        let request_timeout = parse_or(lookup, "DEVICE_REQUEST_TIMEOUT_SECS", 10u64)?;
        let upload_timeout = parse_or(lookup, "DEVICE_UPLOAD_TIMEOUT_SECS", 300u64)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(request_timeout),
            upload_timeout: Duration::from_secs(upload_timeout),
        })
    }
}

impl PollingConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let sensor_interval = millis_or(lookup, "SENSOR_POLL_INTERVAL_MS", 2000)?;
        let clock_interval = millis_or(lookup, "CLOCK_POLL_INTERVAL_MS", 10000)?;
        let wifi_status_interval = millis_or(lookup, "WIFI_STATUS_POLL_INTERVAL_MS", 2800)?;
        let disconnect_reload_delay = millis_or(lookup, "DISCONNECT_RELOAD_DELAY_MS", 2000)?;

        let reboot_countdown_secs = parse_or(lookup, "REBOOT_COUNTDOWN_SECS", 10u32)?;
        ensure!(
            reboot_countdown_secs > 0,
            "failed to parse REBOOT_COUNTDOWN_SECS: countdown must be at least one second"
        );

        Ok(Self {
            sensor_interval,
            clock_interval,
            wifi_status_interval,
            reboot_countdown_secs,
            disconnect_reload_delay,
        })
    }
}

impl UiConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let language = parse_or(lookup, "UI_LANGUAGE", Language::Portuguese)?;
        Ok(Self { language })
    }
}
