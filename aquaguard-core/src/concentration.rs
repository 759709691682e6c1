//! Concentration Calculator
//!
//! Converts an averaged raw signal into a value in physical units:
//!
//! 1. Pick the model: the stored curve if it is valid, otherwise the
//!    sensor's documented default model (output flagged uncalibrated).
//! 2. Invert it. Nernstian electrodes scale their slope with absolute
//!    temperature, `slope_T = slope · T_K / T_ref_K`.
//! 3. Linear sensors apply the configured span and zero offset.
//! 4. Temperature compensation per the sensor's mode.
//! 5. Cross-sensor factors, then derived quantities (free ammonia).
//!
//! The calculation is a pure function of its inputs: identical raw signal,
//! temperature, auxiliary readings and curve always give the same result.

use crate::calibration::{invert_line, CalibrationCurve};
use crate::compensation::{AmmoniaSpeciation, AuxQuantity, AuxiliaryReadings, CompensationConfig};
use crate::sensor::{DerivedQuantity, FitMode, SensorProfile, TemperatureMode};

/// Result of one conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Concentration {
    pub value: f32,
    /// A valid stored curve was used
    pub calibrated: bool,
    /// Free / ionised split, for ammonia probes with a pH reading
    pub speciation: Option<AmmoniaSpeciation>,
}

/// Raw signal → physical value for one probe
#[derive(Debug, Clone, Copy)]
pub struct ConcentrationCalculator<'a> {
    profile: &'a SensorProfile,
    compensation: &'a CompensationConfig,
}

impl<'a> ConcentrationCalculator<'a> {
    pub fn new(profile: &'a SensorProfile, compensation: &'a CompensationConfig) -> Self {
        Self {
            profile,
            compensation,
        }
    }

    pub fn compute(
        &self,
        curve: Option<&CalibrationCurve>,
        raw_signal: f32,
        temperature: f32,
        auxiliary: &AuxiliaryReadings,
    ) -> Concentration {
        let curve = curve.filter(|c| c.is_valid);
        let slope_scale = if self.profile.nernstian {
            self.compensation.nernst_scale(temperature)
        } else {
            1.0
        };

        let mut value = match curve {
            Some(curve) => curve.invert(raw_signal, slope_scale),
            None => {
                let model = self.profile.default_model;
                invert_line(
                    self.profile.fit_mode,
                    model.slope * slope_scale,
                    model.intercept,
                    raw_signal,
                )
            }
        };

        if self.profile.fit_mode == FitMode::Linear {
            value = value * self.compensation.span + self.compensation.zero_offset;
        }

        match self.profile.temperature_mode {
            TemperatureMode::None => {}
            TemperatureMode::Multiplicative => value *= self.compensation.temperature_factor(temperature),
            TemperatureMode::Additive => value += self.compensation.temperature_offset(temperature),
        }

        for entry in self.compensation.cross_sensor.iter() {
            if entry.coefficient == 0.0 {
                continue;
            }
            if let Some(reading) = auxiliary.get(entry.quantity) {
                value *= entry.factor(reading);
            }
        }

        let speciation = match self.profile.derived {
            DerivedQuantity::FreeAmmonia => auxiliary
                .get(AuxQuantity::Ph)
                .map(|ph| AmmoniaSpeciation::split(value, ph, temperature)),
            DerivedQuantity::None => None,
        };

        Concentration {
            value,
            calibrated: curve.is_some(),
            speciation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{fit_curve, CalibrationPoint, FitSpec};
    use crate::sensor::SensorKind;
    use heapless::Vec;

    fn setup(kind: SensorKind) -> (SensorProfile, CompensationConfig) {
        (SensorProfile::for_kind(kind), CompensationConfig::for_kind(kind))
    }

    fn ammonia_curve(profile: &SensorProfile) -> CalibrationCurve {
        let points: Vec<CalibrationPoint, 4> = [(1.0, 200.0), (10.0, 141.0), (100.0, 82.0)]
            .iter()
            .map(|&(standard_value, raw_signal)| CalibrationPoint {
                standard_value,
                raw_signal,
                captured_temperature: 25.0,
                captured_at: 0,
            })
            .collect();
        fit_curve(&points, &FitSpec::from(profile), 0).unwrap()
    }

    fn with_ph(ph: f32) -> AuxiliaryReadings {
        let mut aux = AuxiliaryReadings::new();
        aux.insert(AuxQuantity::Ph, ph);
        aux
    }

    #[test]
    fn recorded_raw_returns_standard() {
        let (profile, compensation) = setup(SensorKind::Ammonia);
        let curve = ammonia_curve(&profile);
        let calc = ConcentrationCalculator::new(&profile, &compensation);

        let result = calc.compute(Some(&curve), 141.0, 25.0, &with_ph(7.0));
        assert_eq!(result.value, 10.0);
        assert!(result.calibrated);
    }

    #[test]
    fn free_ammonia_split() {
        let (profile, compensation) = setup(SensorKind::Ammonia);
        let curve = ammonia_curve(&profile);
        let calc = ConcentrationCalculator::new(&profile, &compensation);

        // 200 mV is the 1 mg/L point
        let result = calc.compute(Some(&curve), 200.0, 25.0, &with_ph(9.5));
        let split = result.speciation.unwrap();
        assert_eq!(split.total, 1.0);
        assert!((split.free_ammonia - 0.640).abs() < 1e-3);
    }

    #[test]
    fn nernst_correction_in_warm_water() {
        let (profile, compensation) = setup(SensorKind::Ammonia);
        let curve = ammonia_curve(&profile);
        let calc = ConcentrationCalculator::new(&profile, &compensation);
        let aux = AuxiliaryReadings::new();

        // Steeper slope at 35°C: the same potential drop means less ammonia
        let at_25 = calc.compute(Some(&curve), 120.0, 25.0, &aux).value;
        let at_35 = calc.compute(Some(&curve), 120.0, 35.0, &aux).value;
        assert!(at_35 < at_25);
    }

    #[test]
    fn uncalibrated_uses_default_model() {
        let (profile, compensation) = setup(SensorKind::Ammonia);
        let calc = ConcentrationCalculator::new(&profile, &compensation);

        let result = calc.compute(None, 200.0, 25.0, &AuxiliaryReadings::new());
        assert!(!result.calibrated);
        assert!((result.value - 1.0).abs() < 1e-5);
    }

    #[test]
    fn invalid_curve_is_ignored() {
        let (profile, compensation) = setup(SensorKind::Ammonia);
        let mut curve = ammonia_curve(&profile);
        curve.is_valid = false;
        let calc = ConcentrationCalculator::new(&profile, &compensation);

        let result = calc.compute(Some(&curve), 200.0, 25.0, &AuxiliaryReadings::new());
        assert!(!result.calibrated);
    }

    #[test]
    fn ph_additive_temperature_offset() {
        let (profile, compensation) = setup(SensorKind::Ph);
        let calc = ConcentrationCalculator::new(&profile, &compensation);
        let aux = AuxiliaryReadings::new();

        // 0 mV is pH 7 on the default model at any temperature
        let at_25 = calc.compute(None, 0.0, 25.0, &aux).value;
        let at_35 = calc.compute(None, 0.0, 35.0, &aux).value;
        assert!((at_25 - 7.0).abs() < 1e-5);
        assert!((at_35 - (7.0 - 0.003)).abs() < 1e-5);
    }

    #[test]
    fn conductivity_normalised_to_reference() {
        let (profile, compensation) = setup(SensorKind::Conductivity);
        let calc = ConcentrationCalculator::new(&profile, &compensation);
        let aux = AuxiliaryReadings::new();

        assert_eq!(calc.compute(None, 1000.0, 25.0, &aux).value, 1000.0);
        let warm = calc.compute(None, 1000.0, 30.0, &aux).value;
        assert!((warm - 900.0).abs() < 1e-2);
    }

    #[test]
    fn span_and_offset_apply_to_linear_sensors() {
        let (profile, mut compensation) = setup(SensorKind::Turbidity);
        compensation.span = 2.0;
        compensation.zero_offset = -1.0;
        let calc = ConcentrationCalculator::new(&profile, &compensation);

        let value = calc.compute(None, 5.0, 25.0, &AuxiliaryReadings::new()).value;
        assert_eq!(value, 9.0);
    }

    #[test]
    fn nitrate_cross_correction() {
        let (profile, compensation) = setup(SensorKind::Nitrate);
        let calc = ConcentrationCalculator::new(&profile, &compensation);

        let mut neutral = AuxiliaryReadings::new();
        neutral.insert(AuxQuantity::Ph, 7.0);
        neutral.insert(AuxQuantity::Conductivity, 500.0);
        let mut salty = AuxiliaryReadings::new();
        salty.insert(AuxQuantity::Ph, 7.0);
        salty.insert(AuxQuantity::Conductivity, 1500.0);

        let base = calc.compute(None, 141.0, 25.0, &neutral).value;
        let corrected = calc.compute(None, 141.0, 25.0, &salty).value;
        assert!((corrected / base - 0.97).abs() < 1e-4);
    }

    #[test]
    fn identical_inputs_identical_output() {
        let (profile, compensation) = setup(SensorKind::Ammonia);
        let curve = ammonia_curve(&profile);
        let calc = ConcentrationCalculator::new(&profile, &compensation);
        let aux = with_ph(8.1);

        let a = calc.compute(Some(&curve), 133.3, 21.7, &aux);
        let b = calc.compute(Some(&curve), 133.3, 21.7, &aux);
        assert_eq!(a, b);
    }
}
