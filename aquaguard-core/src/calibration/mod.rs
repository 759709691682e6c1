//! Calibration Engine
//!
//! ## Overview
//!
//! A calibration run walks the probe through 2–4 standard solutions. For
//! each standard the engine waits for the operator to confirm the electrode
//! has stabilised, averages a window of raw samples, and records a
//! [`CalibrationPoint`]. When all standards are recorded a curve is fitted
//! ([`fit`]) and checked for electrode health. Only a curve that passes
//! replaces the stored one.
//!
//! ```text
//!  request ──► AwaitingStable(0) ──confirm──► Collecting(0) ──window full──►
//!              AwaitingStable(1) ──confirm──► Collecting(1) ──window full──►
//!              ...                                                      fit
//!                                                                        │
//!                        Completed(curve) ◄── slope & r in range ────────┤
//!                        Failed(reason)   ◄── otherwise ─────────────────┘
//! ```
//!
//! Operator waits are explicit suspend points of [`CalibrationSession`]: the
//! host loop keeps ticking, so measurement, alarm and health checks continue
//! while a run is in progress.
//!
//! ## Curve Model
//!
//! Curves are fitted in the electrode's natural direction:
//!
//! ```text
//! raw = slope · x + intercept      x = standard        (Linear)
//!                                  x = log10(standard) (LogLinear)
//! ```
//!
//! so `slope` reads in mV/decade for ion-selective electrodes and in mV/pH for
//! pH electrodes. Concentration is recovered by inverting the line (or, for
//! segment curves, by interpolating between neighbouring points).

pub mod fit;
pub mod session;

pub use fit::{fit_curve, FitSpec};
pub use session::{CalibrationSession, CalibrationSettings, SessionProgress};

use heapless::{String, Vec};
use libm::{fabsf, log10f, powf};

use crate::constants::buffers::{MAX_CALIBRATION_POINTS, MAX_LABEL_LEN};
use crate::sensor::{FitMode, Interpolation, ValueRange};
use crate::time::{elapsed_ms, Timestamp};

/// Label of a calibration standard (e.g. "pH 7.00", "10 mg/L")
pub type StandardLabel = String<MAX_LABEL_LEN>;

/// A standard solution the operator presents to the probe
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Standard {
    pub label: StandardLabel,
    pub expected_value: f32,
}

impl Standard {
    /// Create a standard, truncating labels longer than the label capacity
    pub fn new(label: &str, expected_value: f32) -> Self {
        let mut text = StandardLabel::new();
        for ch in label.chars() {
            if text.push(ch).is_err() {
                break;
            }
        }

        Self {
            label: text,
            expected_value,
        }
    }
}

/// Ordered standards for one calibration run
pub type Standards = Vec<Standard, MAX_CALIBRATION_POINTS>;

/// One recorded (standard, raw signal) pair
///
/// Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationPoint {
    pub standard_value: f32,
    pub raw_signal: f32,
    pub captured_temperature: f32,
    pub captured_at: Timestamp,
}

/// Fitted calibration curve
///
/// Owned by exactly one probe and replaced as a whole on every successful run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationCurve {
    pub points: Vec<CalibrationPoint, MAX_CALIBRATION_POINTS>,
    pub fit_mode: FitMode,
    pub interpolation: Interpolation,
    pub slope: f32,
    pub intercept: f32,
    /// Absolute Pearson correlation of the fit
    pub correlation: f32,
    pub valid_slope_range: ValueRange,
    pub created_at: Timestamp,
    pub is_valid: bool,
}

impl CalibrationCurve {
    /// Milliseconds since the curve was created
    pub fn age_ms(&self, now: Timestamp) -> u64 {
        elapsed_ms(self.created_at, now)
    }

    /// Whether slope and correlation satisfy the acceptance limits
    pub fn meets(&self, min_correlation: f32) -> bool {
        self.valid_slope_range.contains(fabsf(self.slope)) && self.correlation >= min_correlation
    }

    /// Map a raw signal back to a value
    ///
    /// `slope_scale` stretches the electrode slope (Nernst temperature
    /// correction). At a scale of exactly 1 a raw signal equal to a recorded
    /// point returns that point's standard value unchanged.
    pub fn invert(&self, raw: f32, slope_scale: f32) -> f32 {
        if slope_scale == 1.0 {
            if let Some(point) = self.points.iter().find(|p| p.raw_signal == raw) {
                return point.standard_value;
            }
        }

        match self.interpolation {
            Interpolation::Regression => {
                invert_line(self.fit_mode, self.slope * slope_scale, self.intercept, raw)
            }
            Interpolation::Segments => self.interpolate_segments(raw),
        }
    }

    /// Piecewise-linear interpolation in the fit's x space, clamped at the ends
    fn interpolate_segments(&self, raw: f32) -> f32 {
        let mut sorted: Vec<(f32, f32), MAX_CALIBRATION_POINTS> = self
            .points
            .iter()
            .map(|p| (p.raw_signal, to_fit_space(self.fit_mode, p.standard_value)))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(core::cmp::Ordering::Equal));

        let (first, last) = match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return invert_line(self.fit_mode, self.slope, self.intercept, raw),
        };

        let x = if raw <= first.0 {
            first.1
        } else if raw >= last.0 {
            last.1
        } else {
            sorted
                .windows(2)
                .find(|pair| raw >= pair[0].0 && raw <= pair[1].0)
                .map(|pair| {
                    let (r0, x0) = pair[0];
                    let (r1, x1) = pair[1];
                    x0 + (raw - r0) * (x1 - x0) / (r1 - r0)
                })
                .unwrap_or(last.1)
        };

        from_fit_space(self.fit_mode, x)
    }
}

/// Invert `raw = slope · x + intercept` and leave fit space
pub(crate) fn invert_line(mode: FitMode, slope: f32, intercept: f32, raw: f32) -> f32 {
    if slope == 0.0 {
        return f32::NAN;
    }

    from_fit_space(mode, (raw - intercept) / slope)
}

/// Standard value → x used by the regression
pub(crate) fn to_fit_space(mode: FitMode, value: f32) -> f32 {
    match mode {
        FitMode::Linear => value,
        FitMode::LogLinear => log10f(value),
    }
}

/// Regression x → standard value
pub(crate) fn from_fit_space(mode: FitMode, x: f32) -> f32 {
    match mode {
        FitMode::Linear => x,
        FitMode::LogLinear => powf(10.0, x),
    }
}

/// Calibration state as seen by the quality scorer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationState {
    /// No stored curve, or the stored curve failed its checks
    Uncalibrated,
    /// Valid curve of the given age
    Calibrated { age_ms: u64 },
}

impl CalibrationState {
    /// Derive the state of an optional curve at `now`
    pub fn of(curve: Option<&CalibrationCurve>, now: Timestamp) -> Self {
        match curve {
            Some(curve) if curve.is_valid => CalibrationState::Calibrated {
                age_ms: curve.age_ms(now),
            },
            _ => CalibrationState::Uncalibrated,
        }
    }

    pub const fn is_calibrated(&self) -> bool {
        matches!(self, CalibrationState::Calibrated { .. })
    }
}
