//! Durable storage for AquaGuard probes
//!
//! Two independent JSON files per probe:
//!
//! - **Calibration** ([`FileCalibrationStore`]): the fitted curve plus its
//!   metadata, written only when a calibration run succeeds. Implements the
//!   core [`CalibrationStore`](aquaguard_core::CalibrationStore) trait.
//! - **Configuration** ([`FileConfigStore`]): the mutable
//!   [`ProbeConfig`](aquaguard_core::ProbeConfig).
//!
//! Both are versioned records (see [`record`]) and are replaced atomically:
//! a crash mid-write leaves the previous file intact.
//!
//! ```rust,no_run
//! use aquaguard_core::{ProbeConfig, SensorKind};
//! use aquaguard_store::{FileCalibrationStore, FileConfigStore};
//!
//! let dir = "/var/lib/aquaguard";
//! let calibration = FileCalibrationStore::in_dir(dir, SensorKind::Ammonia);
//! let config = FileConfigStore::new(format!("{}/ammonia.config.json", dir));
//! let probe_config = config.load_or_default(SensorKind::Ammonia)?;
//! # let _ = (calibration, probe_config);
//! # Ok::<(), aquaguard_store::StoreError>(())
//! ```

#![deny(unsafe_code)]

mod atomic;
mod calibration;
mod config;
mod error;
pub mod record;

pub use calibration::FileCalibrationStore;
pub use config::{FileConfigStore, CONFIG_FORMAT, CONFIG_VERSION};
pub use error::{StoreError, StoreResult};
pub use record::{CalibrationRecord, CALIBRATION_FORMAT, CALIBRATION_VERSION};
