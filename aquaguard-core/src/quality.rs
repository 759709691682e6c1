//! Measurement Validator & Quality Scorer
//!
//! ## Validity
//!
//! A measurement is valid only if the computed value lies inside the sensor's
//! physical range and the water temperature inside its specified bounds.
//! Validity is independent of the score: an impossible value is invalid even
//! with a perfect score.
//!
//! ## Quality Score
//!
//! Starts at 100; each condition subtracts a fixed penalty, floored at 0.
//!
//! | Condition                              | Penalty | Flag                      |
//! |----------------------------------------|---------|---------------------------|
//! | No valid calibration                   | 30      | `UNCALIBRATED`            |
//! | Calibration older than max age         | 15–20   | `STALE_CALIBRATION`       |
//! | Value outside nominal band             | 20      | `SUSPECT_VALUE`           |
//! | Temperature outside nominal band       | 10      | `TEMPERATURE_OFF_NOMINAL` |
//! | Auxiliary reading substituted          | 5       | `AUX_SUBSTITUTED`         |
//!
//! Penalties only ever subtract, so the score is monotonically non-increasing
//! in every condition.

use crate::calibration::CalibrationState;
use crate::constants::quality::{
    PENALTY_SUSPECT_VALUE, PENALTY_TEMPERATURE_OFF_NOMINAL, PENALTY_UNCALIBRATED, QUALITY_MAX,
};
use crate::sensor::SensorProfile;
use crate::traits::Validatable;

/// Conditions observed while validating a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualityFlags(u16);

impl QualityFlags {
    pub const UNCALIBRATED: Self = Self(1 << 0);
    pub const STALE_CALIBRATION: Self = Self(1 << 1);
    pub const SUSPECT_VALUE: Self = Self(1 << 2);
    pub const TEMPERATURE_OFF_NOMINAL: Self = Self(1 << 3);
    pub const OUT_OF_RANGE: Self = Self(1 << 4);
    pub const TEMPERATURE_OUT_OF_BOUNDS: Self = Self(1 << 5);
    pub const AUX_SUBSTITUTED: Self = Self(1 << 6);
    pub const ACQUISITION_FAILED: Self = Self(1 << 7);
    pub const CALIBRATING: Self = Self(1 << 8);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub fn set(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Outcome of validating one measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub valid: bool,
    pub quality_score: u8,
    pub flags: QualityFlags,
}

impl Assessment {
    /// Raise `flag` and subtract `penalty`, saturating at 0
    pub fn penalize(&mut self, flag: QualityFlags, penalty: u8) {
        self.flags.set(flag);
        self.quality_score = self.quality_score.saturating_sub(penalty);
    }

    /// Mark invalid without touching the score
    pub fn invalidate(&mut self, flag: QualityFlags) {
        self.flags.set(flag);
        self.valid = false;
    }
}

/// Range checks and scoring for one probe
#[derive(Debug, Clone, Copy)]
pub struct MeasurementValidator<'a> {
    profile: &'a SensorProfile,
}

impl<'a> MeasurementValidator<'a> {
    pub fn new(profile: &'a SensorProfile) -> Self {
        Self { profile }
    }

    pub fn validate(&self, value: f32, temperature: f32, calibration: CalibrationState) -> Assessment {
        let profile = self.profile;
        let mut assessment = Assessment {
            valid: true,
            quality_score: QUALITY_MAX,
            flags: QualityFlags::empty(),
        };

        if !value.is_valid() || !profile.physical_range.contains(value) {
            assessment.invalidate(QualityFlags::OUT_OF_RANGE);
        } else if !profile.nominal_range.contains(value) {
            assessment.penalize(QualityFlags::SUSPECT_VALUE, PENALTY_SUSPECT_VALUE);
        }

        if !temperature.is_valid() || !profile.temperature_bounds.contains(temperature) {
            assessment.invalidate(QualityFlags::TEMPERATURE_OUT_OF_BOUNDS);
        } else if !profile.nominal_temperature.contains(temperature) {
            assessment.penalize(
                QualityFlags::TEMPERATURE_OFF_NOMINAL,
                PENALTY_TEMPERATURE_OFF_NOMINAL,
            );
        }

        match calibration {
            CalibrationState::Uncalibrated => {
                assessment.penalize(QualityFlags::UNCALIBRATED, PENALTY_UNCALIBRATED);
            }
            CalibrationState::Calibrated { age_ms } if age_ms > profile.max_calibration_age_ms => {
                assessment.penalize(QualityFlags::STALE_CALIBRATION, profile.stale_penalty);
            }
            CalibrationState::Calibrated { .. } => {}
        }

        assessment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::time::MS_PER_DAY;
    use crate::sensor::SensorKind;

    const FRESH: CalibrationState = CalibrationState::Calibrated { age_ms: MS_PER_DAY };

    #[test]
    fn clean_reading_scores_full() {
        let profile = SensorProfile::for_kind(SensorKind::Ammonia);
        let result = MeasurementValidator::new(&profile).validate(0.5, 22.0, FRESH);
        assert!(result.valid);
        assert_eq!(result.quality_score, 100);
        assert!(result.flags.is_empty());
    }

    #[test]
    fn negative_concentration_is_invalid() {
        let profile = SensorProfile::for_kind(SensorKind::Ammonia);
        let result = MeasurementValidator::new(&profile).validate(-5.0, 22.0, FRESH);
        assert!(!result.valid);
        assert!(result.flags.contains(QualityFlags::OUT_OF_RANGE));
    }

    #[test]
    fn nan_is_invalid() {
        let profile = SensorProfile::for_kind(SensorKind::Ph);
        let validator = MeasurementValidator::new(&profile);
        assert!(!validator.validate(f32::NAN, 22.0, FRESH).valid);
        assert!(!validator.validate(7.0, f32::NAN, FRESH).valid);
    }

    #[test]
    fn temperature_outside_bounds_is_invalid() {
        let profile = SensorProfile::for_kind(SensorKind::Ph);
        let result = MeasurementValidator::new(&profile).validate(7.0, 55.0, FRESH);
        assert!(!result.valid);
        assert!(result.flags.contains(QualityFlags::TEMPERATURE_OUT_OF_BOUNDS));
    }

    #[test]
    fn uncalibrated_capped_at_seventy() {
        let profile = SensorProfile::for_kind(SensorKind::Ammonia);
        let result =
            MeasurementValidator::new(&profile).validate(0.5, 22.0, CalibrationState::Uncalibrated);
        assert!(result.valid);
        assert_eq!(result.quality_score, 70);
        assert!(result.flags.contains(QualityFlags::UNCALIBRATED));
    }

    #[test]
    fn stale_calibration_penalised() {
        let profile = SensorProfile::for_kind(SensorKind::Nitrite);
        let stale = CalibrationState::Calibrated {
            age_ms: profile.max_calibration_age_ms + 1,
        };
        let result = MeasurementValidator::new(&profile).validate(0.5, 22.0, stale);
        assert_eq!(result.quality_score, 80);
        assert!(result.flags.contains(QualityFlags::STALE_CALIBRATION));
    }

    #[test]
    fn penalties_accumulate_and_floor() {
        let profile = SensorProfile::for_kind(SensorKind::Ammonia);
        let mut result = MeasurementValidator::new(&profile).validate(
            50.0,
            5.0,
            CalibrationState::Uncalibrated,
        );
        // suspect 20 + temperature 10 + uncalibrated 30
        assert_eq!(result.quality_score, 40);

        for _ in 0..20 {
            result.penalize(QualityFlags::AUX_SUBSTITUTED, 5);
        }
        assert_eq!(result.quality_score, 0);
    }
}
