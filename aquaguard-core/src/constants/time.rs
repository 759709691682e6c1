//! Time Constants
//!
//! All timestamps in the engine are milliseconds.

pub const MS_PER_SECOND: u64 = 1000;
pub const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
pub const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Default interval between measurement cycles.
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = MS_PER_MINUTE;

/// Maximum time to wait for an operator to confirm a stable reading.
///
/// Replaces the unbounded wait of bench calibration procedures.
pub const CALIBRATION_OPERATOR_TIMEOUT_MS: u64 = 10 * MS_PER_MINUTE;

/// Maximum time allowed to fill one calibration averaging window.
pub const CALIBRATION_COLLECTION_TIMEOUT_MS: u64 = 2 * MS_PER_MINUTE;

/// Calibration age after which ion-selective electrodes are flagged stale.
pub const ISE_CALIBRATION_MAX_AGE_MS: u64 = 7 * MS_PER_DAY;

/// Calibration age after which optical and conductivity probes are flagged stale.
pub const OPTICAL_CALIBRATION_MAX_AGE_MS: u64 = 30 * MS_PER_DAY;

/// Reagent heating dwell for sensors that prepare a sample (nitrite/nitrate).
pub const HEATING_DWELL_MS: u64 = 30 * MS_PER_SECOND;

/// Settling dwell before an optical measurement.
pub const MEASURING_DWELL_MS: u64 = 5 * MS_PER_SECOND;

/// Flush dwell after an optical measurement.
pub const CLEANING_DWELL_MS: u64 = 20 * MS_PER_SECOND;

/// Consecutive late cycles after which publication is skipped.
pub const DEFAULT_SKIP_PUBLICATION_AFTER: u32 = 3;
