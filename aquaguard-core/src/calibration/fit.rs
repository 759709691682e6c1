//! Curve fitting and electrode health checks
//!
//! Ordinary least squares over (x, raw) pairs, where x is the standard value
//! or its log10. Sums are accumulated in `f64`: with only 2–4 points the cost
//! is negligible and it keeps an exactly log-linear input at |r| = 1.

use heapless::Vec;
use libm::{fabs, log10, sqrt};

use super::{CalibrationCurve, CalibrationPoint};
use crate::constants::buffers::{MAX_CALIBRATION_POINTS, MIN_CALIBRATION_POINTS};
use crate::errors::CalibrationFailure;
use crate::sensor::{FitMode, Interpolation, SensorProfile, ValueRange};
use crate::time::Timestamp;

/// What to fit and how to judge it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSpec {
    pub fit_mode: FitMode,
    pub interpolation: Interpolation,
    pub valid_slope: ValueRange,
    pub min_correlation: f32,
}

impl From<&SensorProfile> for FitSpec {
    fn from(profile: &SensorProfile) -> Self {
        Self {
            fit_mode: profile.fit_mode,
            interpolation: profile.interpolation,
            valid_slope: profile.valid_slope,
            min_correlation: profile.min_correlation,
        }
    }
}

/// Least-squares line with its correlation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Signed Pearson correlation
    pub correlation: f64,
}

/// Fit `y = slope · x + intercept`
///
/// Returns `None` when x or y has no spread.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<LineFit> {
    let n = xs.len().min(ys.len());
    if n < MIN_CALIBRATION_POINTS {
        return None;
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut sxx, mut syy, mut sxy) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx <= f64::EPSILON || syy <= f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    Some(LineFit {
        slope,
        intercept: mean_y - slope * mean_x,
        correlation: (sxy / sqrt(sxx * syy)).clamp(-1.0, 1.0),
    })
}

/// Fit a curve through recorded points and check it against `spec`
///
/// Only curves that pass every check are returned; they carry `is_valid = true`.
pub fn fit_curve(
    points: &[CalibrationPoint],
    spec: &FitSpec,
    created_at: Timestamp,
) -> Result<CalibrationCurve, CalibrationFailure> {
    if points.len() < MIN_CALIBRATION_POINTS {
        return Err(CalibrationFailure::TooFewStandards {
            required: MIN_CALIBRATION_POINTS,
            provided: points.len(),
        });
    }
    if points.len() > MAX_CALIBRATION_POINTS {
        return Err(CalibrationFailure::TooManyStandards {
            limit: MAX_CALIBRATION_POINTS,
            provided: points.len(),
        });
    }

    let mut xs: Vec<f64, MAX_CALIBRATION_POINTS> = Vec::new();
    let mut ys: Vec<f64, MAX_CALIBRATION_POINTS> = Vec::new();
    for point in points {
        let x = match spec.fit_mode {
            FitMode::Linear => point.standard_value as f64,
            FitMode::LogLinear => {
                if !(point.standard_value > 0.0) {
                    return Err(CalibrationFailure::NonPositiveStandard {
                        value: point.standard_value,
                    });
                }
                log10(point.standard_value as f64)
            }
        };
        // Capacity checked above
        let _ = xs.push(x);
        let _ = ys.push(point.raw_signal as f64);
    }

    let line = fit_line(&xs, &ys).ok_or(CalibrationFailure::DegenerateStandards)?;

    if spec.interpolation == Interpolation::Segments && !is_monotonic(points) {
        return Err(CalibrationFailure::NotMonotonic);
    }

    let slope = line.slope as f32;
    let correlation = fabs(line.correlation) as f32;

    if !spec.valid_slope.contains(fabs(line.slope) as f32) {
        return Err(CalibrationFailure::SlopeOutOfRange {
            slope,
            min: spec.valid_slope.min,
            max: spec.valid_slope.max,
        });
    }
    if correlation < spec.min_correlation {
        return Err(CalibrationFailure::PoorCorrelation {
            correlation,
            min: spec.min_correlation,
        });
    }

    let mut stored = Vec::new();
    for point in points {
        let _ = stored.push(*point);
    }

    Ok(CalibrationCurve {
        points: stored,
        fit_mode: spec.fit_mode,
        interpolation: spec.interpolation,
        slope,
        intercept: line.intercept as f32,
        correlation,
        valid_slope_range: spec.valid_slope,
        created_at,
        is_valid: true,
    })
}

/// Raw signal strictly increasing or strictly decreasing with the standard
fn is_monotonic(points: &[CalibrationPoint]) -> bool {
    let mut sorted: Vec<CalibrationPoint, MAX_CALIBRATION_POINTS> = Vec::new();
    for point in points {
        let _ = sorted.push(*point);
    }
    sorted.sort_unstable_by(|a, b| {
        a.standard_value
            .partial_cmp(&b.standard_value)
            .unwrap_or(core::cmp::Ordering::Equal)
    });

    let rising = sorted.windows(2).all(|w| w[1].raw_signal > w[0].raw_signal);
    let falling = sorted.windows(2).all(|w| w[1].raw_signal < w[0].raw_signal);
    rising || falling
}
