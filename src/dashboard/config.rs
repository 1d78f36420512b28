use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::error::DashboardError;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub snapshot_path: PathBuf,

    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Renders the tag selector control.
    #[serde(default)]
    pub show_tag: bool,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialDashboardConfig {
    snapshot_path: Option<PathBuf>,
    refresh_interval_secs: Option<u64>,
    state_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    show_tag: Option<bool>,
    locale: Option<String>,
    page_size: Option<usize>,
}

fn default_refresh_interval_secs() -> u64 {
    2
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_page_size() -> usize {
    20
}

/// Web builds exposed the tag selector flag under this name.
const LEGACY_SHOW_TAG: &str = "NEXT_PUBLIC_ShowTag";

impl DashboardConfig {
    /// Layers, lowest to highest: built-in defaults, the TOML file, then
    /// environment variables (a `.env` file is honored).
    pub fn load(config_path: Option<&str>) -> Result<Self, DashboardError> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = read_file_config(config_path)?;

        // 2. Load from environment variables
        let env_config: PartialDashboardConfig = envy::from_env::<PartialDashboardConfig>()
            .map_err(|e| DashboardError::Config(format!("Failed to load config from environment: {e}")))?;
        let legacy_show_tag = env::var(LEGACY_SHOW_TAG).ok();

        Self::merge(file_config, env_config, legacy_show_tag)
    }

    /// Same as [`DashboardConfig::load`], with the environment given as
    /// `(NAME, value)` pairs and no `.env` lookup.
    pub fn load_with<I>(config_path: Option<&str>, vars: I) -> Result<Self, DashboardError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let file_config = read_file_config(config_path)?;

        let vars: Vec<(String, String)> = vars.into_iter().collect();
        let legacy_show_tag = vars
            .iter()
            .find(|(key, _)| key == LEGACY_SHOW_TAG)
            .map(|(_, value)| value.clone());
        let env_config: PartialDashboardConfig = envy::from_iter(vars)
            .map_err(|e| DashboardError::Config(format!("Failed to load config from environment: {e}")))?;

        Self::merge(file_config, env_config, legacy_show_tag)
    }

    // Merge: environment overrides file
    fn merge(
        file_config: PartialDashboardConfig,
        env_config: PartialDashboardConfig,
        legacy_show_tag: Option<String>,
    ) -> Result<Self, DashboardError> {
        let config = DashboardConfig {
            snapshot_path: env_config
                .snapshot_path
                .or(file_config.snapshot_path)
                .ok_or_else(|| DashboardError::Config("SNAPSHOT_PATH is required".to_string()))?,
            refresh_interval_secs: env_config
                .refresh_interval_secs
                .or(file_config.refresh_interval_secs)
                .unwrap_or_else(default_refresh_interval_secs),
            state_dir: env_config
                .state_dir
                .or(file_config.state_dir)
                .unwrap_or_else(default_state_dir),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            show_tag: env_config
                .show_tag
                .or_else(|| legacy_show_tag.map(|value| value == "true"))
                .or(file_config.show_tag)
                .unwrap_or(false),
            locale: env_config
                .locale
                .or(file_config.locale)
                .unwrap_or_else(default_locale),
            page_size: env_config
                .page_size
                .or(file_config.page_size)
                .unwrap_or_else(default_page_size),
        };

        if config.refresh_interval_secs == 0 {
            return Err(DashboardError::Config(
                "REFRESH_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        if config.page_size == 0 {
            return Err(DashboardError::Config(
                "PAGE_SIZE must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Location of the device-scoped preference file.
    pub fn device_storage_path(&self) -> PathBuf {
        self.state_dir.join("device.json")
    }
}

fn read_file_config(config_path: Option<&str>) -> Result<PartialDashboardConfig, DashboardError> {
    let Some(path_str) = config_path else {
        return Ok(PartialDashboardConfig::default());
    };
    let path = Path::new(path_str);
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using environment and defaults.");
        return Ok(PartialDashboardConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|e| {
        DashboardError::Config(format!("Failed to read config file at {path:?}: {e}"))
    })?;
    toml::from_str(&contents).map_err(|e| {
        DashboardError::Config(format!("Failed to parse TOML from config file at {path:?}: {e}"))
    })
}

/// TOML gives a real boolean; the environment gives text, where only the
/// literal `"true"` enables the flag.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(value) => value,
        Flag::Text(text) => text == "true",
    }))
}
