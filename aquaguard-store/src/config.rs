//! File-backed probe configuration
//!
//! Thresholds, intervals and compensation coefficients change far more
//! often than calibration, so they live in their own record and file.

use std::path::{Path, PathBuf};

use aquaguard_core::ProbeConfig;
use serde::{Deserialize, Serialize};

use crate::atomic::{read_optional, write_atomic};
use crate::error::{StoreError, StoreResult};
use crate::record::open;

/// Format tag of configuration records
pub const CONFIG_FORMAT: &str = "aquaguard.config";

/// Revision written by this crate
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ConfigRecord {
    format: String,
    version: u32,
    config: ProbeConfig,
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored configuration, `None` when the file does not exist
    pub fn load(&self) -> StoreResult<Option<ProbeConfig>> {
        let Some(text) = read_optional(&self.path)? else {
            return Ok(None);
        };

        let (value, version) = open(&text, CONFIG_FORMAT)?;
        if version != CONFIG_VERSION {
            return Err(StoreError::UnsupportedVersion {
                record: CONFIG_FORMAT,
                found: version,
                supported: CONFIG_VERSION,
            });
        }

        let record: ConfigRecord = serde_json::from_value(value)?;
        Ok(Some(record.config))
    }

    /// Stored configuration, or the documented defaults for `kind`
    pub fn load_or_default(&self, kind: aquaguard_core::SensorKind) -> StoreResult<ProbeConfig> {
        Ok(self
            .load()?
            .unwrap_or_else(|| ProbeConfig::for_sensor(kind)))
    }

    pub fn save(&self, config: &ProbeConfig) -> StoreResult<()> {
        let record = ConfigRecord {
            format: CONFIG_FORMAT.to_string(),
            version: CONFIG_VERSION,
            config: config.clone(),
        };
        let json = serde_json::to_string_pretty(&record)?;
        write_atomic(&self.path, json.as_bytes())?;
        log::debug!("saved {} configuration to {}", config.sensor().name(), self.path.display());
        Ok(())
    }
}
