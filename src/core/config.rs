use crate::core::currency::REFERENCE_CURRENCY;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_AVANZA_URL: &str = "https://www.avanza.se";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AvanzaProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub avanza: Option<AvanzaProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            avanza: Some(AvanzaProviderConfig {
                base_url: DEFAULT_AVANZA_URL.to_string(),
            }),
        }
    }
}

fn default_currency() -> String {
    REFERENCE_CURRENCY.to_string()
}

fn default_cache_ttl_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Currency the grand total of `show` is reported in.
    #[serde(default = "default_currency")]
    pub currency: String,
    pub data_path: Option<String>,
    /// Legacy YAML configuration scanned by `import`.
    pub legacy_config: Option<String>,
    /// How long fetched quotes are reused.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            currency: default_currency(),
            data_path: None,
            legacy_config: None,
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("se", "avanza-stock", "avanza-stock")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("se", "avanza-stock", "avanza-stock")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn avanza_base_url(&self) -> &str {
        self.providers
            .avanza
            .as_ref()
            .map_or(DEFAULT_AVANZA_URL, |p| &p.base_url)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
