use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Keys the kiosk build ignores entirely.
pub const KIOSK_IGNORE_KEYS: &[&str] = &[
    "Meta", "Shift", "Alt", "Control", "Tab", "Dead", "Enter", "CapsLock", "`", "Escape",
    "Delete",
];

/// Narrower set used by the demo build: modifiers only.
pub const MODIFIER_IGNORE_KEYS: &[&str] = &["Meta", "Shift", "Alt", "Control"];

/// Inactivity after the last key before recording stops.
pub const DEFAULT_WAIT_MS: u64 = 500;

/// Sequences shorter than this are discarded without a request.
pub const DEFAULT_MIN_KEYS: usize = 3;

pub const KIOSK_REFRESH_MS: u64 = 30_000;
pub const DEMO_REFRESH_MS: u64 = 60_000;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/predict";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub predict: PredictConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_wait")]
    pub wait_ms: u64,
    #[serde(default = "SessionConfig::default_min_keys")]
    pub min_keys: usize,
    #[serde(default = "SessionConfig::default_poll")]
    pub poll_ms: u64,
}

impl SessionConfig {
    fn default_wait() -> u64 { DEFAULT_WAIT_MS }
    fn default_min_keys() -> usize { DEFAULT_MIN_KEYS }
    fn default_poll() -> u64 { 100 }

    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wait_ms: DEFAULT_WAIT_MS,
            min_keys: DEFAULT_MIN_KEYS,
            poll_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "RefreshConfig::default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "RefreshConfig::default_poll")]
    pub poll_ms: u64,
}

impl RefreshConfig {
    fn default_timeout() -> u64 { KIOSK_REFRESH_MS }
    fn default_poll() -> u64 { 2000 }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            timeout_ms: KIOSK_REFRESH_MS,
            poll_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    #[serde(default = "KeysConfig::default_ignore")]
    pub ignore: Vec<String>,
    #[serde(default = "KeysConfig::default_backspace")]
    pub backspace: String,
}

impl KeysConfig {
    fn default_ignore() -> Vec<String> {
        KIOSK_IGNORE_KEYS.iter().map(|k| k.to_string()).collect()
    }
    fn default_backspace() -> String { "Backspace".into() }

    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignore.iter().any(|k| k == key)
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            ignore: Self::default_ignore(),
            backspace: Self::default_backspace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictConfig {
    #[serde(default = "PredictConfig::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "PredictConfig::default_timeout")]
    pub timeout_ms: u64,
}

impl PredictConfig {
    fn default_endpoint() -> String { DEFAULT_ENDPOINT.into() }
    fn default_timeout() -> u64 { 5000 }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputConfig {
    /// Take exclusive ownership of the keyboards (EVIOCGRAB).
    #[serde(default)]
    pub grab: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "AnalyticsConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "AnalyticsConfig::default_category")]
    pub category: String,
}

impl AnalyticsConfig {
    fn default_enabled() -> bool { true }
    fn default_category() -> String { "kiosk".into() }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            category: "kiosk".into(),
        }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("nazoru")
    }

    /// Resolve the config file: NAZORU_CONFIG env var, then the user config dir.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("NAZORU_CONFIG") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "parsing config TOML")
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.poll_ms == 0 {
            anyhow::bail!("session.poll_ms must be greater than zero");
        }
        if self.refresh.poll_ms == 0 {
            anyhow::bail!("refresh.poll_ms must be greater than zero");
        }
        if self.session.min_keys == 0 {
            anyhow::bail!("session.min_keys must be at least 1");
        }
        if self.predict.endpoint.trim().is_empty() {
            anyhow::bail!("predict.endpoint must not be empty");
        }
        if self.keys.is_ignored(&self.keys.backspace) {
            anyhow::bail!(
                "keys.backspace '{}' is also listed in keys.ignore",
                self.keys.backspace
            );
        }
        Ok(())
    }
}
