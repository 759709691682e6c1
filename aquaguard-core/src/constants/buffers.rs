//! Buffer Capacities
//!
//! Fixed sizes for `heapless` collections and ring buffers. Every instance
//! of the probe engine has a bounded, compile-time memory footprint.

/// Number of valid measurements averaged into the published value.
pub const SMOOTHING_WINDOW: usize = 8;

/// Raw samples averaged for a single measurement or calibration point.
pub const CALIBRATION_WINDOW: usize = 10;

/// Maximum number of standards in one calibration run.
pub const MAX_CALIBRATION_POINTS: usize = 4;

/// Minimum number of standards in one calibration run.
pub const MIN_CALIBRATION_POINTS: usize = 2;

/// Upper bound on alarms returned from a single evaluation.
pub const MAX_ALARMS_PER_EVALUATION: usize = 8;

/// Maximum number of auxiliary quantities used for compensation.
pub const MAX_AUXILIARY_INPUTS: usize = 4;

/// Maximum number of phases in a sample-preparation plan.
pub const MAX_PREPARATION_STEPS: usize = 5;

/// Maximum length of a calibration standard label.
pub const MAX_LABEL_LEN: usize = 16;
