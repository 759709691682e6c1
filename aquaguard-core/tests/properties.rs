//! Property tests for fitting, conversion and scoring

mod common;

use proptest::prelude::*;

use aquaguard_core::calibration::{fit_curve, CalibrationState, FitSpec};
use aquaguard_core::compensation::{AuxQuantity, AuxiliaryReadings, CompensationConfig};
use aquaguard_core::constants::time::MS_PER_DAY;
use aquaguard_core::{ConcentrationCalculator, MeasurementValidator, SensorKind, SensorProfile};

use common::point;

proptest! {
    /// Exactly log-linear standards are recovered with |r| = 1
    #[test]
    fn exact_log_linear_fit(
        slope in -64.0f32..-51.0,
        intercept in 100.0f32..300.0,
        base in 0.1f32..10.0,
    ) {
        let standards = [base, base * 10.0, base * 100.0];
        let points: Vec<_> = standards
            .iter()
            .map(|&s| point(s, slope * s.log10() + intercept))
            .collect();

        let profile = SensorProfile::for_kind(SensorKind::Ammonia);
        let curve = fit_curve(&points, &FitSpec::from(&profile), 0).unwrap();

        prop_assert!((curve.correlation - 1.0).abs() < 1e-4);
        prop_assert!((curve.slope - slope).abs() < 1e-2);
        prop_assert!((curve.intercept - intercept).abs() < 1e-2);
        prop_assert!(curve.is_valid);
    }

    /// Same inputs and calibration, same output
    #[test]
    fn compute_is_idempotent(
        raw in -100.0f32..400.0,
        temperature in 0.0f32..40.0,
        ph in 6.0f32..10.0,
    ) {
        let profile = SensorProfile::for_kind(SensorKind::Ammonia);
        let compensation = CompensationConfig::for_kind(SensorKind::Ammonia);
        let points = [point(1.0, 200.0), point(10.0, 141.0), point(100.0, 82.0)];
        let curve = fit_curve(&points, &FitSpec::from(&profile), 0).unwrap();
        let mut aux = AuxiliaryReadings::new();
        aux.insert(AuxQuantity::Ph, ph);

        let calc = ConcentrationCalculator::new(&profile, &compensation);
        let first = calc.compute(Some(&curve), raw, temperature, &aux);
        let second = calc.compute(Some(&curve), raw, temperature, &aux);
        prop_assert_eq!(first, second);
    }

    /// Ageing past the limit never raises the score
    #[test]
    fn score_non_increasing_with_age(
        value in 0.0f32..5.0,
        temperature in -5.0f32..45.0,
        days in 0u64..60,
    ) {
        let profile = SensorProfile::for_kind(SensorKind::Nitrate);
        let validator = MeasurementValidator::new(&profile);

        let younger = validator.validate(value, temperature, CalibrationState::Calibrated { age_ms: days * MS_PER_DAY });
        let older = validator.validate(value, temperature, CalibrationState::Calibrated { age_ms: (days + 10) * MS_PER_DAY });
        let none = validator.validate(value, temperature, CalibrationState::Uncalibrated);

        prop_assert!(older.quality_score <= younger.quality_score);
        prop_assert!(none.quality_score <= older.quality_score);
    }

    /// Moving from the nominal band into the suspect band never raises the score
    #[test]
    fn score_non_increasing_into_suspect_range(
        nominal in 0.0f32..1.0,
        suspect in 1.01f32..100.0,
        temperature in 10.0f32..30.0,
    ) {
        let profile = SensorProfile::for_kind(SensorKind::Nitrite);
        let validator = MeasurementValidator::new(&profile);
        let state = CalibrationState::Calibrated { age_ms: 0 };

        let inside = validator.validate(nominal, temperature, state);
        let outside = validator.validate(suspect, temperature, state);
        prop_assert!(outside.quality_score <= inside.quality_score);
        prop_assert!(inside.valid && outside.valid);
    }

    /// A raw signal equal to a recorded point returns its standard exactly
    #[test]
    fn recorded_point_round_trips(index in 0usize..3) {
        let profile = SensorProfile::for_kind(SensorKind::Ammonia);
        let compensation = CompensationConfig::for_kind(SensorKind::Ammonia);
        let points = [point(1.0, 200.0), point(10.0, 141.0), point(100.0, 82.0)];
        let curve = fit_curve(&points, &FitSpec::from(&profile), 0).unwrap();

        let calc = ConcentrationCalculator::new(&profile, &compensation);
        let result = calc.compute(Some(&curve), points[index].raw_signal, 25.0, &AuxiliaryReadings::new());
        prop_assert_eq!(result.value, points[index].standard_value);
    }
}
