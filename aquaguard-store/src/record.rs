//! Versioned on-disk records
//!
//! Every file starts with a `format` tag and a `version` number. The header
//! is read first; the body is only decoded once the revision is known, so a
//! record from an unknown revision is rejected instead of being coerced into
//! the current layout.
//!
//! Calibration record revisions:
//!
//! | Version | Curve fields                                                  |
//! |---------|---------------------------------------------------------------|
//! | 1       | points, slope, intercept, correlation, created_at, is_valid   |
//! | 2       | v1 + fit_mode, interpolation, valid_slope_range               |
//!
//! Version 1 records take the missing fields from the sensor profile and
//! have their validity re-checked against its acceptance limits.

use aquaguard_core::{CalibrationCurve, CalibrationPoint, SensorKind, SensorProfile, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Format tag of calibration records
pub const CALIBRATION_FORMAT: &str = "aquaguard.calibration";

/// Revision written by this crate
pub const CALIBRATION_VERSION: u32 = 2;

#[derive(Debug, Deserialize)]
struct Header {
    format: String,
    version: u32,
}

/// Parse JSON and check the format tag, returning the body and its version
pub(crate) fn open(text: &str, expected: &'static str) -> StoreResult<(Value, u32)> {
    let value: Value = serde_json::from_str(text)?;
    let header: Header = serde_json::from_value(value.clone())?;

    if header.format != expected {
        return Err(StoreError::WrongFormat {
            found: header.format,
            expected,
        });
    }
    Ok((value, header.version))
}

/// Calibration curve as persisted, with the sensor it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub format: String,
    pub version: u32,
    pub sensor: SensorKind,
    pub curve: CalibrationCurve,
}

impl CalibrationRecord {
    /// Wrap a curve in a current-revision record
    pub fn new(sensor: SensorKind, curve: CalibrationCurve) -> Self {
        Self {
            format: CALIBRATION_FORMAT.to_string(),
            version: CALIBRATION_VERSION,
            sensor,
            curve,
        }
    }

    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode any known revision, migrating older ones
    pub fn from_json(text: &str) -> StoreResult<Self> {
        let (value, version) = open(text, CALIBRATION_FORMAT)?;

        match version {
            CALIBRATION_VERSION => Ok(serde_json::from_value(value)?),
            1 => {
                let legacy: RecordV1 = serde_json::from_value(value)?;
                log::info!(
                    "migrating {} calibration record from version 1",
                    legacy.sensor.name()
                );
                legacy.migrate()
            }
            found => Err(StoreError::UnsupportedVersion {
                record: CALIBRATION_FORMAT,
                found,
                supported: CALIBRATION_VERSION,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurveV1 {
    points: Vec<CalibrationPoint>,
    slope: f32,
    intercept: f32,
    correlation: f32,
    created_at: Timestamp,
    is_valid: bool,
}

#[derive(Debug, Deserialize)]
struct RecordV1 {
    sensor: SensorKind,
    curve: CurveV1,
}

impl RecordV1 {
    fn migrate(self) -> StoreResult<CalibrationRecord> {
        let profile = SensorProfile::for_kind(self.sensor);
        let legacy = self.curve;
        let points = heapless::Vec::from_slice(&legacy.points)
            .map_err(|_| StoreError::Malformed(format!("{} calibration points", legacy.points.len())))?;

        let mut curve = CalibrationCurve {
            points,
            fit_mode: profile.fit_mode,
            interpolation: profile.interpolation,
            slope: legacy.slope,
            intercept: legacy.intercept,
            correlation: legacy.correlation,
            valid_slope_range: profile.valid_slope,
            created_at: legacy.created_at,
            is_valid: false,
        };
        curve.is_valid = legacy.is_valid && curve.meets(profile.min_correlation);

        Ok(CalibrationRecord::new(self.sensor, curve))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_AMMONIA: &str = r#"{
        "format": "aquaguard.calibration",
        "version": 1,
        "sensor": "ammonia",
        "curve": {
            "points": [
                { "standard_value": 1.0, "raw_signal": 200.0, "captured_temperature": 25.0, "captured_at": 10 },
                { "standard_value": 10.0, "raw_signal": 141.0, "captured_temperature": 25.0, "captured_at": 20 }
            ],
            "slope": -59.0,
            "intercept": 200.0,
            "correlation": 1.0,
            "created_at": 20,
            "is_valid": true
        }
    }"#;

    #[test]
    fn version_one_is_migrated_from_profile() {
        let record = CalibrationRecord::from_json(LEGACY_AMMONIA).unwrap();
        let profile = SensorProfile::for_kind(SensorKind::Ammonia);

        assert_eq!(record.version, CALIBRATION_VERSION);
        assert_eq!(record.sensor, SensorKind::Ammonia);
        assert_eq!(record.curve.fit_mode, profile.fit_mode);
        assert_eq!(record.curve.valid_slope_range, profile.valid_slope);
        assert_eq!(record.curve.points.len(), 2);
        assert!(record.curve.is_valid);
    }

    #[test]
    fn migration_revalidates_slope() {
        let worn = LEGACY_AMMONIA.replace("-59.0", "-30.0");
        let record = CalibrationRecord::from_json(&worn).unwrap();
        assert!(!record.curve.is_valid);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let future = LEGACY_AMMONIA.replace("\"version\": 1", "\"version\": 7");
        assert_eq!(
            CalibrationRecord::from_json(&future),
            Err(StoreError::UnsupportedVersion {
                record: CALIBRATION_FORMAT,
                found: 7,
                supported: CALIBRATION_VERSION,
            })
        );
    }

    #[test]
    fn foreign_format_is_rejected() {
        let other = LEGACY_AMMONIA.replace("aquaguard.calibration", "aquaguard.config");
        assert!(matches!(
            CalibrationRecord::from_json(&other),
            Err(StoreError::WrongFormat { .. })
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            CalibrationRecord::from_json("{ not json"),
            Err(StoreError::Malformed(_))
        ));
        assert!(matches!(
            CalibrationRecord::from_json(r#"{"version": 2}"#),
            Err(StoreError::Malformed(_))
        ));
    }
}
