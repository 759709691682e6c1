//! Sensor Catalogue and Per-Sensor Profiles
//!
//! ## Overview
//!
//! Every water-quality probe shares the same calibration and measurement
//! pipeline. What differs between them is captured here, as data:
//!
//! | Sensor           | Fit        | Temp. compensation | Derived quantity |
//! |------------------|------------|--------------------|------------------|
//! | pH               | Linear     | Additive           | -                |
//! | Ammonia          | LogLinear  | Nernst             | Free NH₃         |
//! | Nitrite, Nitrate | LogLinear  | Nernst             | -                |
//! | Dissolved oxygen | Linear     | Multiplicative     | -                |
//! | ORP              | Linear     | None               | -                |
//! | Conductivity     | Linear     | Multiplicative     | -                |
//! | Salinity         | Linear     | Multiplicative     | -                |
//! | Turbidity        | Segments   | None               | -                |
//! | Temperature      | Linear     | None               | -                |
//! | Organic load     | Segments   | Multiplicative     | -                |
//!
//! ## pH and the log-linear fit
//!
//! Ion-selective electrodes respond to the logarithm of ion activity. pH is
//! already a logarithm (`-log10 aH⁺`), so the pH electrode is fitted linearly
//! in pH space and its slope is read directly in mV per pH unit.
//!
//! ## Usage Example
//!
//! ```rust
//! use aquaguard_core::sensor::{SensorKind, SensorProfile, FitMode};
//!
//! let profile = SensorProfile::for_kind(SensorKind::Ammonia);
//! assert_eq!(profile.fit_mode, FitMode::LogLinear);
//! assert!(profile.physical_range.contains(1.0));
//! assert!(!profile.physical_range.contains(-5.0));
//! ```

use crate::constants::{physics, quality, sensors, time};

/// Probe type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum SensorKind {
    Ph = 0,
    Ammonia = 1,
    Nitrite = 2,
    Nitrate = 3,
    DissolvedOxygen = 4,
    Orp = 5,
    Conductivity = 6,
    Salinity = 7,
    Turbidity = 8,
    Temperature = 9,
    OrganicLoad = 10,
}

impl SensorKind {
    /// All supported probe types
    pub const ALL: [SensorKind; 11] = [
        SensorKind::Ph,
        SensorKind::Ammonia,
        SensorKind::Nitrite,
        SensorKind::Nitrate,
        SensorKind::DissolvedOxygen,
        SensorKind::Orp,
        SensorKind::Conductivity,
        SensorKind::Salinity,
        SensorKind::Turbidity,
        SensorKind::Temperature,
        SensorKind::OrganicLoad,
    ];

    /// Human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            SensorKind::Ph => "ph",
            SensorKind::Ammonia => "ammonia",
            SensorKind::Nitrite => "nitrite",
            SensorKind::Nitrate => "nitrate",
            SensorKind::DissolvedOxygen => "dissolved_oxygen",
            SensorKind::Orp => "orp",
            SensorKind::Conductivity => "conductivity",
            SensorKind::Salinity => "salinity",
            SensorKind::Turbidity => "turbidity",
            SensorKind::Temperature => "temperature",
            SensorKind::OrganicLoad => "toc",
        }
    }

    /// Unit of the computed value
    pub const fn unit(&self) -> &'static str {
        match self {
            SensorKind::Ph => "pH",
            SensorKind::Ammonia
            | SensorKind::Nitrite
            | SensorKind::Nitrate
            | SensorKind::DissolvedOxygen
            | SensorKind::OrganicLoad => "mg/L",
            SensorKind::Orp => "mV",
            SensorKind::Conductivity => "µS/cm",
            SensorKind::Salinity => "ppt",
            SensorKind::Turbidity => "NTU",
            SensorKind::Temperature => "°C",
        }
    }

    /// Look up a sensor by its name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

/// Curve family fitted by the calibration engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitMode {
    /// `raw = slope · standard + intercept`
    Linear,
    /// `raw = slope · log10(standard) + intercept` (Nernstian electrodes)
    LogLinear,
}

/// How a fitted curve maps raw signal back to a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
    /// Invert the least-squares line
    Regression,
    /// Interpolate between adjacent calibration points, clamped at the ends
    Segments,
}

/// How water temperature corrects the computed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemperatureMode {
    /// No correction
    None,
    /// `value *= 1 + coefficient · (T - reference)`
    Multiplicative,
    /// `value += coefficient · (T - reference)`
    Additive,
}

/// Quantity derived from the primary value using auxiliary readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DerivedQuantity {
    None,
    /// Split total ammonia into free NH₃ and NH₄⁺ using pH and temperature
    FreeAmmonia,
}

/// Closed value interval
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    /// Create a range, swapping bounds given in the wrong order
    pub fn new(min: f32, max: f32) -> Self {
        if min > max {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    /// Whether `value` lies inside the range (NaN never does)
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp `value` into the range
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }
}

/// Uncalibrated fallback model, in the same form as a fitted curve
///
/// `raw = slope · x + intercept`, where `x` is the value (Linear) or its
/// log10 (LogLinear).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefaultModel {
    pub slope: f32,
    pub intercept: f32,
}

/// Everything that differs between probe types
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorProfile {
    pub kind: SensorKind,
    pub fit_mode: FitMode,
    pub interpolation: Interpolation,
    /// Values outside this range are physically impossible
    pub physical_range: ValueRange,
    /// Values outside this range (but physical) are suspect
    pub nominal_range: ValueRange,
    /// Water temperatures the probe is specified for
    pub temperature_bounds: ValueRange,
    /// Temperatures at which the probe is most accurate
    pub nominal_temperature: ValueRange,
    /// Accepted |slope| of a fitted curve
    pub valid_slope: ValueRange,
    /// Minimum accepted |r| of a fitted curve
    pub min_correlation: f32,
    /// Calibration age after which the score is penalised
    pub max_calibration_age_ms: u64,
    /// Score penalty applied to a stale calibration
    pub stale_penalty: u8,
    pub default_model: DefaultModel,
    pub temperature_mode: TemperatureMode,
    /// Scale the fitted slope with absolute temperature (log-linear electrodes)
    pub nernstian: bool,
    pub derived: DerivedQuantity,
}

impl SensorProfile {
    /// Documented defaults for a probe type
    pub fn for_kind(kind: SensorKind) -> Self {
        match kind {
            SensorKind::Ph => Self::ph(),
            SensorKind::Ammonia => Self::ion_selective(
                kind,
                ValueRange::new(sensors::AMMONIA_MIN_MG_L, sensors::AMMONIA_MAX_MG_L),
                ValueRange::new(sensors::AMMONIA_MIN_MG_L, sensors::AMMONIA_NOMINAL_MAX_MG_L),
                DerivedQuantity::FreeAmmonia,
            ),
            SensorKind::Nitrite => Self::ion_selective(
                kind,
                ValueRange::new(0.0, sensors::NITRITE_MAX_MG_L),
                ValueRange::new(0.0, sensors::NITRITE_NOMINAL_MAX_MG_L),
                DerivedQuantity::None,
            ),
            SensorKind::Nitrate => Self::ion_selective(
                kind,
                ValueRange::new(0.0, sensors::NITRATE_MAX_MG_L),
                ValueRange::new(0.0, sensors::NITRATE_NOMINAL_MAX_MG_L),
                DerivedQuantity::None,
            ),
            SensorKind::DissolvedOxygen => Self {
                nominal_range: ValueRange::new(sensors::DO_NOMINAL_MIN_MG_L, sensors::DO_NOMINAL_MAX_MG_L),
                valid_slope: ValueRange::new(1.0, 1000.0),
                temperature_mode: TemperatureMode::Multiplicative,
                // Galvanic probe, ~50 mV per mg/L at 25°C
                default_model: DefaultModel { slope: 50.0, intercept: 0.0 },
                ..Self::linear(kind, ValueRange::new(0.0, sensors::DO_MAX_MG_L))
            },
            SensorKind::Orp => Self {
                nominal_range: ValueRange::new(sensors::ORP_NOMINAL_MIN_MV, sensors::ORP_NOMINAL_MAX_MV),
                valid_slope: ValueRange::new(0.8, 1.2),
                temperature_mode: TemperatureMode::None,
                ..Self::linear(kind, ValueRange::new(sensors::ORP_MIN_MV, sensors::ORP_MAX_MV))
            },
            SensorKind::Conductivity => Self {
                nominal_range: ValueRange::new(0.0, sensors::CONDUCTIVITY_NOMINAL_MAX_US_CM),
                valid_slope: ValueRange::new(1e-4, 1e4),
                temperature_mode: TemperatureMode::Multiplicative,
                ..Self::linear(kind, ValueRange::new(0.0, sensors::CONDUCTIVITY_MAX_US_CM))
            },
            SensorKind::Salinity => Self {
                nominal_range: ValueRange::new(0.0, sensors::SALINITY_NOMINAL_MAX_PPT),
                valid_slope: ValueRange::new(1e-4, 1e4),
                temperature_mode: TemperatureMode::Multiplicative,
                ..Self::linear(kind, ValueRange::new(0.0, sensors::SALINITY_MAX_PPT))
            },
            SensorKind::Turbidity => Self {
                interpolation: Interpolation::Segments,
                nominal_range: ValueRange::new(0.0, sensors::TURBIDITY_NOMINAL_MAX_NTU),
                valid_slope: ValueRange::new(1e-5, 1e4),
                min_correlation: quality::MIN_CORRELATION_LOW_GRADE,
                temperature_mode: TemperatureMode::None,
                ..Self::linear(kind, ValueRange::new(0.0, sensors::TURBIDITY_MAX_NTU))
            },
            SensorKind::Temperature => Self {
                nominal_range: ValueRange::new(
                    sensors::WATER_TEMP_NOMINAL_MIN_C,
                    sensors::WATER_TEMP_NOMINAL_MAX_C,
                ),
                valid_slope: ValueRange::new(0.5, 2.0),
                temperature_mode: TemperatureMode::None,
                ..Self::linear(
                    kind,
                    ValueRange::new(sensors::WATER_TEMP_MIN_C, sensors::WATER_TEMP_MAX_C),
                )
            },
            SensorKind::OrganicLoad => Self {
                interpolation: Interpolation::Segments,
                nominal_range: ValueRange::new(0.0, sensors::TOC_NOMINAL_MAX_MG_L),
                valid_slope: ValueRange::new(1e-5, 1e4),
                min_correlation: quality::MIN_CORRELATION_LOW_GRADE,
                temperature_mode: TemperatureMode::Multiplicative,
                ..Self::linear(kind, ValueRange::new(0.0, sensors::TOC_MAX_MG_L))
            },
        }
    }

    fn ph() -> Self {
        Self {
            kind: SensorKind::Ph,
            fit_mode: FitMode::Linear,
            interpolation: Interpolation::Regression,
            physical_range: ValueRange::new(sensors::PH_MIN, sensors::PH_MAX),
            nominal_range: ValueRange::new(sensors::PH_NOMINAL_MIN, sensors::PH_NOMINAL_MAX),
            temperature_bounds: Self::water_temperature(),
            nominal_temperature: Self::nominal_water_temperature(),
            valid_slope: ValueRange::new(physics::PH_SLOPE_MIN_MV, physics::PH_SLOPE_MAX_MV),
            min_correlation: quality::MIN_CORRELATION,
            max_calibration_age_ms: time::ISE_CALIBRATION_MAX_AGE_MS,
            stale_penalty: quality::PENALTY_STALE_CALIBRATION,
            // 0 mV at pH 7, -59.16 mV per pH unit
            default_model: DefaultModel {
                slope: -physics::NERNST_SLOPE_25C_MV,
                intercept: physics::NERNST_SLOPE_25C_MV * physics::PH_NEUTRAL,
            },
            temperature_mode: TemperatureMode::Additive,
            nernstian: false,
            derived: DerivedQuantity::None,
        }
    }

    fn ion_selective(
        kind: SensorKind,
        physical_range: ValueRange,
        nominal_range: ValueRange,
        derived: DerivedQuantity,
    ) -> Self {
        Self {
            kind,
            fit_mode: FitMode::LogLinear,
            interpolation: Interpolation::Regression,
            physical_range,
            nominal_range,
            temperature_bounds: Self::water_temperature(),
            nominal_temperature: Self::nominal_water_temperature(),
            valid_slope: ValueRange::new(physics::ISE_SLOPE_MIN_MV, physics::ISE_SLOPE_MAX_MV),
            min_correlation: quality::MIN_CORRELATION,
            max_calibration_age_ms: time::ISE_CALIBRATION_MAX_AGE_MS,
            stale_penalty: quality::PENALTY_STALE_CALIBRATION_ISE,
            // 200 mV at 1 mg/L, falling one Nernst slope per decade
            default_model: DefaultModel {
                slope: -physics::NERNST_SLOPE_25C_MV,
                intercept: 200.0,
            },
            temperature_mode: TemperatureMode::None,
            nernstian: true,
            derived,
        }
    }

    fn linear(kind: SensorKind, physical_range: ValueRange) -> Self {
        Self {
            kind,
            fit_mode: FitMode::Linear,
            interpolation: Interpolation::Regression,
            physical_range,
            nominal_range: physical_range,
            temperature_bounds: Self::water_temperature(),
            nominal_temperature: Self::nominal_water_temperature(),
            valid_slope: ValueRange::new(1e-4, 1e4),
            min_correlation: quality::MIN_CORRELATION,
            max_calibration_age_ms: time::OPTICAL_CALIBRATION_MAX_AGE_MS,
            stale_penalty: quality::PENALTY_STALE_CALIBRATION,
            default_model: DefaultModel { slope: 1.0, intercept: 0.0 },
            temperature_mode: TemperatureMode::Multiplicative,
            nernstian: false,
            derived: DerivedQuantity::None,
        }
    }

    fn water_temperature() -> ValueRange {
        ValueRange::new(sensors::WATER_TEMP_MIN_C, sensors::WATER_TEMP_MAX_C)
    }

    fn nominal_water_temperature() -> ValueRange {
        ValueRange::new(sensors::WATER_TEMP_NOMINAL_MIN_C, sensors::WATER_TEMP_NOMINAL_MAX_C)
    }
}
