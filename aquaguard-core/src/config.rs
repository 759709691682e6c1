//! Per-probe configuration
//!
//! [`ProbeConfig`] bundles everything one probe instance needs. It is plain
//! data: with the `serde` feature it round-trips through JSON, and it is
//! stored separately from the calibration record.
//!
//! ```rust
//! use aquaguard_core::config::ProbeConfig;
//! use aquaguard_core::sensor::SensorKind;
//!
//! let config = ProbeConfig::for_sensor(SensorKind::Nitrite);
//! assert_eq!(config.sampling.preparation.len(), 3);
//! assert!(config.alarms.thresholds.high.is_some());
//! ```

use crate::alarm::{AlarmConfig, AlarmPolicy, AlarmThresholds, ToxicityBands};
use crate::calibration::CalibrationSettings;
use crate::compensation::CompensationConfig;
use crate::constants::buffers::CALIBRATION_WINDOW;
use crate::constants::quality::DEFAULT_MAX_CONSECUTIVE_ERRORS;
use crate::constants::sensors;
use crate::constants::time::{
    CLEANING_DWELL_MS, DEFAULT_SAMPLE_INTERVAL_MS, DEFAULT_SKIP_PUBLICATION_AFTER,
    HEATING_DWELL_MS, MEASURING_DWELL_MS,
};
use crate::scheduler::{Phase, Preparation, PreparationStep};
use crate::sensor::{SensorKind, SensorProfile};

/// When and how samples are taken
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplingConfig {
    pub interval_ms: u64,
    /// Raw samples averaged per measurement
    pub window: usize,
    /// Preparation phases after SAMPLING
    pub preparation: Preparation,
    /// Consecutive late cycles before publication is skipped (0 = never)
    pub skip_publication_after: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            window: CALIBRATION_WINDOW,
            preparation: Preparation::new(),
            skip_publication_after: DEFAULT_SKIP_PUBLICATION_AFTER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthConfig {
    /// Consecutive failed cycles before the probe is marked unhealthy (0 = never)
    pub max_consecutive_errors: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

/// Complete configuration of one probe instance
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProbeConfig {
    pub profile: SensorProfile,
    pub compensation: CompensationConfig,
    pub alarms: AlarmConfig,
    pub sampling: SamplingConfig,
    pub calibration: CalibrationSettings,
    pub health: HealthConfig,
}

impl ProbeConfig {
    /// Documented defaults for a probe type
    pub fn for_sensor(kind: SensorKind) -> Self {
        let mut sampling = SamplingConfig::default();
        if matches!(kind, SensorKind::Nitrite | SensorKind::Nitrate) {
            sampling.preparation = wet_chemistry();
        }

        Self {
            profile: SensorProfile::for_kind(kind),
            compensation: CompensationConfig::for_kind(kind),
            alarms: default_alarms(kind),
            sampling,
            calibration: CalibrationSettings::default(),
            health: HealthConfig::default(),
        }
    }

    pub fn sensor(&self) -> SensorKind {
        self.profile.kind
    }
}

/// Reagent heating, read, then flush
fn wet_chemistry() -> Preparation {
    let mut steps = Preparation::new();
    for (phase, dwell_ms) in [
        (Phase::Heating, HEATING_DWELL_MS),
        (Phase::Measuring, MEASURING_DWELL_MS),
        (Phase::Cleaning, CLEANING_DWELL_MS),
    ] {
        let _ = steps.push(PreparationStep { phase, dwell_ms });
    }
    steps
}

const fn thresholds(
    low: Option<f32>,
    high: Option<f32>,
    critical_low: Option<f32>,
    critical_high: Option<f32>,
) -> AlarmThresholds {
    AlarmThresholds {
        low,
        high,
        critical_low,
        critical_high,
    }
}

fn default_alarms(kind: SensorKind) -> AlarmConfig {
    let (thresholds, rapid_change_per_minute, bands) = match kind {
        SensorKind::Ph => (thresholds(Some(6.5), Some(8.5), Some(6.0), Some(9.0)), Some(0.2), None),
        SensorKind::Ammonia => (
            thresholds(None, Some(1.0), None, Some(sensors::AMMONIA_NOMINAL_MAX_MG_L)),
            None,
            Some(ToxicityBands::free_ammonia()),
        ),
        SensorKind::Nitrite => (
            thresholds(None, Some(0.5), None, Some(sensors::NITRITE_NOMINAL_MAX_MG_L)),
            None,
            None,
        ),
        SensorKind::Nitrate => (
            thresholds(None, Some(50.0), None, Some(sensors::NITRATE_NOMINAL_MAX_MG_L)),
            None,
            None,
        ),
        SensorKind::DissolvedOxygen => (
            thresholds(Some(sensors::DO_NOMINAL_MIN_MG_L), None, Some(3.0), None),
            Some(0.5),
            None,
        ),
        SensorKind::Orp => (
            thresholds(Some(sensors::ORP_NOMINAL_MIN_MV), Some(sensors::ORP_NOMINAL_MAX_MV), None, None),
            None,
            None,
        ),
        SensorKind::Temperature => (
            thresholds(
                Some(sensors::WATER_TEMP_NOMINAL_MIN_C),
                Some(sensors::WATER_TEMP_NOMINAL_MAX_C),
                Some(4.0),
                Some(34.0),
            ),
            Some(1.0),
            None,
        ),
        SensorKind::Conductivity | SensorKind::Salinity | SensorKind::Turbidity | SensorKind::OrganicLoad => {
            let profile = SensorProfile::for_kind(kind);
            (thresholds(None, Some(profile.nominal_range.max), None, None), None, None)
        }
    };

    AlarmConfig {
        thresholds,
        rapid_change_per_minute,
        bands,
        policy: AlarmPolicy::Repeat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_every_sensor() {
        for kind in SensorKind::ALL {
            let config = ProbeConfig::for_sensor(kind);
            assert_eq!(config.sensor(), kind);
            assert_eq!(config.alarms.policy, AlarmPolicy::Repeat);
            assert!(config.sampling.window > 0);

            let t = config.alarms.thresholds;
            if let (Some(low), Some(high)) = (t.low, t.high) {
                assert!(low < high, "{:?}", kind);
            }
        }
    }

    #[test]
    fn only_ammonia_has_toxicity_bands() {
        for kind in SensorKind::ALL {
            let config = ProbeConfig::for_sensor(kind);
            assert_eq!(config.alarms.bands.is_some(), kind == SensorKind::Ammonia);
        }
    }

    #[test]
    fn simple_probes_have_no_preparation() {
        assert!(ProbeConfig::for_sensor(SensorKind::Ph).sampling.preparation.is_empty());
        assert_eq!(
            ProbeConfig::for_sensor(SensorKind::Nitrate).sampling.preparation[1].phase,
            Phase::Measuring
        );
    }
}
