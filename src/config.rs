//! User configuration read from `config.toml`.
//!
//! Lookup order: `--config PATH`, then the platform config directory
//! (`~/.config/appgrid/config.toml` on Linux). A missing file means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::export::DEFAULT_REPORT_ROWS_PER_PAGE;

const APP_NAME: &str = "appgrid";
const CONFIG_FILENAME: &str = "config.toml";
const LOG_FILENAME: &str = "appgrid.log";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application data file; the bundled sample when unset.
    pub data_path: Option<PathBuf>,
    pub search_debounce_ms: u64,
    pub resize_debounce_ms: u64,
    pub export_dir: PathBuf,
    pub report_rows_per_page: usize,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: None,
            search_debounce_ms: 300,
            resize_debounce_ms: 150,
            export_dir: PathBuf::from("."),
            report_rows_per_page: DEFAULT_REPORT_ROWS_PER_PAGE,
            log_file: None,
        }
    }
}

impl Config {
    /// Load from `path`, or from the platform config file when `path` is None.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match config_path() {
                Some(path) => path,
                None => {
                    debug!("no platform config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        match fs::read_to_string(&path) {
            Ok(content) => {
                let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?;
                info!("loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Where the terminal UI logs when no log file is configured.
pub fn default_log_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_local_dir().join(LOG_FILENAME))
}
