//! Quality Score Penalties and Calibration Acceptance
//!
//! The quality score is a 0–100 confidence indicator. It starts at
//! [`QUALITY_MAX`] and each condition below subtracts a fixed penalty.

/// Starting (perfect) quality score.
pub const QUALITY_MAX: u8 = 100;

/// Penalty when no valid calibration is available.
///
/// Keeps uncalibrated readings at or below 70.
pub const PENALTY_UNCALIBRATED: u8 = 30;

/// Default penalty when the calibration is older than the sensor's max age.
pub const PENALTY_STALE_CALIBRATION: u8 = 15;

/// Stale penalty for electrodes that drift quickly (ammonia, nitrite, nitrate).
pub const PENALTY_STALE_CALIBRATION_ISE: u8 = 20;

/// Penalty for a value inside the physical range but outside the nominal band.
pub const PENALTY_SUSPECT_VALUE: u8 = 20;

/// Penalty for water temperature outside the nominal band.
pub const PENALTY_TEMPERATURE_OFF_NOMINAL: u8 = 10;

/// Penalty when an auxiliary reading was replaced by its configured fallback.
pub const PENALTY_AUX_SUBSTITUTED: u8 = 5;

// ===== CALIBRATION ACCEPTANCE =====

/// Minimum |r| for a calibration curve from a laboratory-grade electrode.
pub const MIN_CORRELATION: f32 = 0.995;

/// Minimum |r| accepted for lower-grade sensors (turbidity, organic load).
pub const MIN_CORRELATION_LOW_GRADE: f32 = 0.990;

/// Consecutive failed cycles after which a probe is marked unhealthy.
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 5;
