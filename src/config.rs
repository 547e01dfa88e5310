use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    PaddockError,
    api::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_UPCOMING_LIMIT},
    fetch::{FetchOptions, RevalidationBus},
};

const CONFIG_FILE_NAME: &str = "config.json";
const APP_DIR: &str = "paddock";

/// How often `watch` refreshes when nothing else is configured
pub const DEFAULT_REFRESH_INTERVAL_S: u64 = 60;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Season to show when none is given; the current year when unset.
    pub season: Option<String>,
    pub refresh_interval_s: u64,
    pub revalidate_on_focus: bool,
    pub revalidate_on_reconnect: bool,
    /// Unset means requests wait until they complete.
    pub request_timeout_ms: Option<u64>,
    pub upcoming_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            season: None,
            refresh_interval_s: DEFAULT_REFRESH_INTERVAL_S,
            revalidate_on_focus: false,
            revalidate_on_reconnect: false,
            request_timeout_ms: None,
            upcoming_limit: DEFAULT_UPCOMING_LIMIT,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(APP_DIR).join(CONFIG_FILE_NAME))
    }

    /// Config from the platform config directory, if one has been saved and
    /// can be read.
    pub fn from_local_file() -> Option<Self> {
        let config_path = Self::default_path()?;
        if !config_path.exists() {
            return None;
        }
        match Self::from_path(&config_path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Ignoring config file {:?}: {}", config_path, e);
                None
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, PaddockError> {
        let file = File::open(path).map_err(|e| PaddockError::ConfigIOError { source: e })?;
        let config = serde_json::from_reader(file)
            .map_err(|e| PaddockError::ConfigSerializeError { source: e })?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self) -> Result<(), PaddockError> {
        let config_path = Self::default_path().ok_or(PaddockError::NoConfigDir)?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PaddockError> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| PaddockError::ConfigIOError { source: e })?;
        }
        let file = File::create(path).map_err(|e| PaddockError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| PaddockError::ConfigSerializeError { source: e })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: self.request_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn fetch_options(&self, bus: Option<RevalidationBus>) -> FetchOptions {
        FetchOptions {
            refresh_interval: Some(Duration::from_secs(self.refresh_interval_s)),
            revalidate_on_focus: self.revalidate_on_focus,
            revalidate_on_reconnect: self.revalidate_on_reconnect,
            bus,
        }
    }
}
