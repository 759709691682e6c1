//! Constants for AquaGuard Core
//!
//! Centralized, documented constants used throughout the probe engine. All
//! numeric values live here with a note on their purpose and source.
//!
//! ## Organization
//!
//! Constants are grouped by domain:
//! - **Physics**: electrochemistry and thermodynamics (Nernst, ammonia equilibrium)
//! - **Sensors**: physical and nominal ranges of every probe type
//! - **Time**: sampling intervals, dwell times and operator timeouts
//! - **Quality**: quality score penalties and calibration acceptance limits
//! - **Buffers**: fixed capacities for `heapless` collections
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Include units in the name
//! 3. Reference the chemistry or datasheet the value comes from

/// Physical constants for electrochemistry and aqueous equilibria.
pub mod physics;

/// Physical and nominal operating ranges for each probe type.
pub mod sensors;

/// Time-related constants for intervals, dwell times and timeouts.
pub mod time;

/// Quality score penalties and calibration acceptance limits.
pub mod quality;

/// Fixed capacities for buffers and bounded collections.
pub mod buffers;

pub use physics::{
    KELVIN_OFFSET, NERNST_SLOPE_25C_MV, REFERENCE_TEMP_C,
    AMMONIA_PKA_25C, AMMONIA_PKA_TEMP_COEFF, PH_TEMP_COEFF_PER_C,
};

pub use quality::{
    QUALITY_MAX, MIN_CORRELATION, MIN_CORRELATION_LOW_GRADE,
    PENALTY_UNCALIBRATED,
};

pub use time::{MS_PER_SECOND, MS_PER_MINUTE, DEFAULT_SAMPLE_INTERVAL_MS};

pub use buffers::{
    SMOOTHING_WINDOW, CALIBRATION_WINDOW, MAX_CALIBRATION_POINTS,
    MAX_ALARMS_PER_EVALUATION,
};
