//! TOML configuration for a generation run.
//!
//! Sections default independently, so a file only needs the keys it changes.
//! The file path comes from `--config` (or the `INCIDENT_SYNTH_CONFIG`
//! environment variable), then `./incident-synth.toml`, then compiled-in
//! defaults. A file that is found but broken is always an error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const CONFIG_ENV_VAR: &str = "INCIDENT_SYNTH_CONFIG";
const LOCAL_CONFIG_PATH: &str = "incident-synth.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("run window is inverted: start {start} is after end {end}")]
    InvertedWindow { start: NaiveDate, end: NaiveDate },

    #[error("entity list is empty")]
    NoEntities,

    #[error("entity id at position {index} is blank")]
    BlankEntity { index: usize },

    #[error("entity id '{0}' is listed more than once")]
    DuplicateEntity(String),
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SynthConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load `./incident-synth.toml` if present, otherwise the compiled-in defaults.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Self::load_or_default_in(Path::new("."))
    }

    /// Load `incident-synth.toml` from `dir` if present, otherwise the defaults.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default_in(dir: &Path) -> Result<Self, ConfigError> {
        let local_path = dir.join(LOCAL_CONFIG_PATH);
        if local_path.exists() {
            return Self::load(&local_path);
        }
        debug!("no config file found, using compiled-in defaults");
        Ok(Self::default())
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Which entities to generate and over which window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Tracked products, each generated as an independent stream.
    pub entities: Vec<String>,
    /// First day of the run (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the run (inclusive).
    pub end_date: NaiveDate,
    /// Fixed seed for reproducible runs. Absent means OS entropy.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            entities: vec![
                "PRODUCT_A".to_string(),
                "PRODUCT_B".to_string(),
                "PRODUCT_C".to_string(),
            ],
            start_date: NaiveDate::from_ymd_opt(2022, 1, 1).expect("valid default start date"),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid default end date"),
            seed: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_date > self.end_date {
            return Err(ConfigError::InvertedWindow {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.entities.is_empty() {
            return Err(ConfigError::NoEntities);
        }
        let mut seen = HashSet::new();
        for (index, entity) in self.entities.iter().enumerate() {
            if entity.trim().is_empty() {
                return Err(ConfigError::BlankEntity { index });
            }
            if !seen.insert(entity.as_str()) {
                return Err(ConfigError::DuplicateEntity(entity.clone()));
            }
        }
        Ok(())
    }

    /// Number of calendar days in the window, both ends included.
    pub fn day_count(&self) -> u32 {
        ((self.end_date - self.start_date).num_days() + 1).max(0) as u32
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file receiving the incidents table.
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/incidents.db"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
