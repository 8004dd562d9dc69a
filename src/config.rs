use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::DEFAULT_STATUS_INTERVAL;
use crate::model::DEFAULT_API_URL;

const APP_DIR: &str = "mume";
const CONFIG_FILE: &str = "config.toml";
const LOG_SUBDIR: &str = "logs";

pub const DATA_DIR_ENV: &str = "MUME_DATA_DIR";
pub const API_URL_ENV: &str = "MUME_API_URL";

/// Runtime settings for the player shell
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub status_interval_ms: u64,
}

/// `config.toml` as written by users; every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    api_base_url: Option<String>,
    log_dir: Option<PathBuf>,
    status_interval_ms: Option<u64>,
}

impl Config {
    /// Resolve the data directory, read its `config.toml`, then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&data_root()?)?;
        if let Ok(url) = env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_base_url = url;
            }
        }
        Ok(config)
    }

    /// Settings for `data_dir`, ignoring the environment. A missing
    /// `config.toml` yields the defaults.
    pub fn load_from(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let file = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<ConfigFile>(&raw)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            ConfigFile::default()
        };

        let log_dir = match file.log_dir {
            Some(dir) if dir.is_relative() => data_dir.join(dir),
            Some(dir) => dir,
            None => data_dir.join(LOG_SUBDIR),
        };

        Ok(Self {
            api_base_url: file.api_base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            data_dir: data_dir.to_path_buf(),
            log_dir,
            status_interval_ms: file
                .status_interval_ms
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_STATUS_INTERVAL.as_millis() as u64),
        })
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}

fn data_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(override_dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| anyhow!("no data directory on this platform, set {DATA_DIR_ENV}"))
}
