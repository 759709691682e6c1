//! Error Types for the Probe Engine
//!
//! ## Design Philosophy
//!
//! Errors are returned from the sampling loop, stored in the device status
//! and carried through the command interface, so they follow the same rules
//! as every other hot-path value:
//!
//! 1. **Copy Semantics**: no heap data, only `f32`, integers and `&'static str`.
//! 2. **Recoverable by default**: nothing here is fatal to the process.
//!    Acquisition and range failures degrade the measurement into
//!    `valid = false`; calibration failures restore the previous curve.
//!
//! ## Error Categories
//!
//! ### Measurement
//! - `Acquisition`: the sample source produced no usable raw sample
//! - `OutOfRange`: the computed value is outside the sensor's physical range
//! - `InvalidValue`: NaN or infinity reached the calculator
//!
//! ### Calibration
//! - `Calibration`: a calibration run was rejected, see [`CalibrationFailure`]
//!
//! ### Collaborators
//! - `Storage`: the calibration store could not load or save
//!
//! ### Commands
//! - `Busy`: a calibration run is already in progress
//! - `InvalidCommand`: the command does not apply in the current state
//!
//! Stale calibration is deliberately *not* an error. It only lowers the
//! quality score and raises `QualityFlags::STALE_CALIBRATION`.
//!
//! ```rust
//! use aquaguard_core::{ProbeError, CalibrationFailure};
//!
//! fn describe(err: ProbeError) -> &'static str {
//!     match err {
//!         ProbeError::Acquisition { .. } => "check the sample source",
//!         ProbeError::Calibration(CalibrationFailure::SlopeOutOfRange { .. }) => "replace electrode",
//!         ProbeError::Calibration(_) => "repeat calibration",
//!         _ => "see logs",
//!     }
//! }
//! # assert_eq!(describe(ProbeError::Acquisition { reason: "empty window" }), "check the sample source");
//! ```

use thiserror_no_std::Error;

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Probe engine errors
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ProbeError {
    /// No valid raw sample could be acquired
    #[error("Acquisition failed: {reason}")]
    Acquisition {
        reason: &'static str,
    },

    /// Calibration run rejected
    #[error("Calibration failed: {0}")]
    Calibration(CalibrationFailure),

    /// Computed value outside the sensor's physical range
    #[error("Value {value} outside range [{min}, {max}]")]
    OutOfRange {
        /// The computed value
        value: f32,
        /// Physical minimum for the sensor
        min: f32,
        /// Physical maximum for the sensor
        max: f32,
    },

    /// Value makes no numerical sense (NaN, infinity)
    #[error("Invalid value: not a valid number")]
    InvalidValue,

    /// Calibration store failure
    #[error("Storage error: {reason}")]
    Storage {
        reason: &'static str,
    },

    /// A calibration run is already in progress
    #[error("Calibration already in progress")]
    Busy,

    /// Command not applicable in the current state
    #[error("Invalid command: {reason}")]
    InvalidCommand {
        reason: &'static str,
    },
}

/// Reasons a calibration run is rejected
///
/// Every failure leaves the previously stored curve in place.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalibrationFailure {
    /// Fewer standards than a curve needs
    #[error("Need at least {required} standards, got {provided}")]
    TooFewStandards {
        required: usize,
        provided: usize,
    },

    /// More standards than the curve can hold
    #[error("At most {limit} standards supported, got {provided}")]
    TooManyStandards {
        limit: usize,
        provided: usize,
    },

    /// Log-linear fits need strictly positive standard values
    #[error("Standard value {value} must be positive for a log-linear fit")]
    NonPositiveStandard {
        value: f32,
    },

    /// All standards (or all raw signals) are identical
    #[error("Standards do not span a range")]
    DegenerateStandards,

    /// Electrode slope outside the accepted range
    #[error("Slope {slope} outside [{min}, {max}]")]
    SlopeOutOfRange {
        slope: f32,
        min: f32,
        max: f32,
    },

    /// Fit quality below the minimum correlation
    #[error("Correlation {correlation} below {min}")]
    PoorCorrelation {
        correlation: f32,
        min: f32,
    },

    /// Segment interpolation needs raw signals ordered like the standards
    #[error("Raw signals are not monotonic across standards")]
    NotMonotonic,

    /// Operator did not confirm a stable reading in time
    #[error("Operator did not confirm standard {index} in time")]
    OperatorTimeout {
        index: usize,
    },

    /// Averaging window could not be filled in time
    #[error("Could not collect samples for standard {index} in time")]
    CollectionTimeout {
        index: usize,
    },

    /// Run cancelled by the operator
    #[error("Calibration cancelled")]
    Cancelled,

    /// The calibration store refused the new curve
    #[error("Calibration store rejected the curve")]
    StoreRejected,
}

impl From<CalibrationFailure> for ProbeError {
    fn from(failure: CalibrationFailure) -> Self {
        ProbeError::Calibration(failure)
    }
}

impl ProbeError {
    /// Whether the error is recovered locally into an invalid measurement
    pub const fn degrades_measurement(&self) -> bool {
        matches!(
            self,
            ProbeError::Acquisition { .. } | ProbeError::OutOfRange { .. } | ProbeError::InvalidValue
        )
    }
}
