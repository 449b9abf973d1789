//! Configuration management and validation.
//!
//! Settings are layered: built-in defaults, then an optional JSON config
//! file, then the `SOUND_DB_ROOT` environment variable, then command-line
//! flags (applied by the caller through the `with_*` methods).

use crate::constants::{APP_DIR_NAME, DEFAULT_RAW_DATA_DIR_NAME, ROOT_ENV_VAR};
use crate::error::{Result, SoundDbError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundDbConfig {
    /// Folder holding one data directory per site-year
    pub raw_data_root: PathBuf,

    /// Suppress per-site diagnostics in bulk operations
    pub quiet: bool,

    /// Site metadata table (CSV)
    pub metadata_path: Option<PathBuf>,

    /// Derived data table (CSV)
    pub derived_data_path: Option<PathBuf>,
}

impl Default for SoundDbConfig {
    fn default() -> Self {
        Self {
            raw_data_root: default_raw_data_root(),
            quiet: true,
            metadata_path: None,
            derived_data_path: None,
        }
    }
}

/// `<user data dir>/sound-db/raw-data`, or `./raw-data` without one
pub fn default_raw_data_root() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_RAW_DATA_DIR_NAME)
}

impl SoundDbConfig {
    /// Defaults, overlaid with the config file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Read a JSON config file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            SoundDbError::configuration(format!(
                "Cannot read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `SOUND_DB_ROOT` if it is set and not empty
    pub fn with_env_overrides(self) -> Self {
        match std::env::var_os(ROOT_ENV_VAR).filter(|value| !value.is_empty()) {
            Some(root) => {
                debug!("Using raw data root from {}", ROOT_ENV_VAR);
                self.with_raw_data_root(root)
            }
            None => self,
        }
    }

    /// Set the raw data root directory
    pub fn with_raw_data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.raw_data_root = root.into();
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Set the metadata and derived data tables used for merging
    pub fn with_metadata_paths(
        mut self,
        metadata: impl Into<PathBuf>,
        derived: impl Into<PathBuf>,
    ) -> Self {
        self.metadata_path = Some(metadata.into());
        self.derived_data_path = Some(derived.into());
        self
    }

    /// Check settings are usable
    ///
    /// A root that does not exist is allowed; indexing reports it as a
    /// warning.
    pub fn validate(&self) -> Result<()> {
        if self.raw_data_root.as_os_str().is_empty() {
            return Err(SoundDbError::configuration("Raw data root must not be empty"));
        }

        match (&self.metadata_path, &self.derived_data_path) {
            (Some(_), None) | (None, Some(_)) => Err(SoundDbError::configuration(
                "metadata_path and derived_data_path must be set together",
            )),
            _ => Ok(()),
        }
    }
}
