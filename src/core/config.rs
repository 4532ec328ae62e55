use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const ENV_API_KEY: &str = "COMMODITY_API_KEY";
pub const ENV_REFRESH_INTERVAL: &str = "REFRESH_INTERVAL_SECS";
pub const ENV_TARGET_CURRENCY: &str = "TARGET_CURRENCY";

pub const RATE_TIMEOUT: Duration = Duration::from_secs(3);
pub const COMMODITY_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderEndpoint {
    pub base_url: String,
    /// Per-request timeout; each provider has its own default.
    pub timeout_ms: Option<u64>,
}

impl ProviderEndpoint {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            timeout_ms: None,
        }
    }

    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout_ms.map_or(default, Duration::from_millis)
    }
}

fn default_frankfurter() -> ProviderEndpoint {
    ProviderEndpoint::new("https://api.frankfurter.app")
}

fn default_exchangerate_api() -> ProviderEndpoint {
    ProviderEndpoint::new("https://api.exchangerate-api.com")
}

fn default_commodity_api() -> ProviderEndpoint {
    ProviderEndpoint::new("https://api.commoditypriceapi.com")
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default = "default_frankfurter")]
    pub frankfurter: ProviderEndpoint,
    #[serde(default = "default_exchangerate_api")]
    pub exchangerate_api: ProviderEndpoint,
    #[serde(default = "default_commodity_api")]
    pub commodity_api: ProviderEndpoint,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            frankfurter: default_frankfurter(),
            exchangerate_api: default_exchangerate_api(),
            commodity_api: default_commodity_api(),
        }
    }
}

fn default_target_currency() -> String {
    "IDR".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    180
}

fn default_rate() -> f64 {
    15500.0
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_target_currency")]
    pub target_currency: String,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// USD rate used when every exchange-rate source fails.
    #[serde(default = "default_rate")]
    pub default_rate: f64,
    #[serde(default)]
    pub commodity_api_key: Option<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            target_currency: default_target_currency(),
            refresh_interval_secs: default_refresh_interval_secs(),
            default_rate: default_rate(),
            commodity_api_key: None,
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config at the default location, falling back to defaults
    /// when no file exists there. Environment overrides always apply.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let mut config = if config_path.exists() {
            Self::parse_file(&config_path)?
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("id", "metalwatch", "metalwatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let mut config = Self::parse_file(path.as_ref())?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &std::path::Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Applies `COMMODITY_API_KEY`, `REFRESH_INTERVAL_SECS` and
    /// `TARGET_CURRENCY` from `lookup` on top of the file values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.commodity_api_key = Some(key);
        }
        if let Some(interval) = lookup(ENV_REFRESH_INTERVAL) {
            self.refresh_interval_secs = interval
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_REFRESH_INTERVAL}: '{interval}'"))?;
        }
        if let Some(currency) = lookup(ENV_TARGET_CURRENCY) {
            self.target_currency = currency;
        }
        self.target_currency = self.target_currency.trim().to_uppercase();
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_currency.len() != 3
            || !self.target_currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            bail!(
                "target_currency must be a 3-letter ISO code, got '{}'",
                self.target_currency
            );
        }
        if self.refresh_interval_secs == 0 {
            bail!("refresh_interval_secs must be greater than zero");
        }
        if !self.default_rate.is_finite() || self.default_rate <= 0.0 {
            bail!("default_rate must be positive, got {}", self.default_rate);
        }
        Ok(())
    }

    /// The commodity API credential, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.commodity_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
