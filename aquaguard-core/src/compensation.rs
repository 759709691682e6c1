//! Temperature and Cross-Sensor Compensation
//!
//! ## Overview
//!
//! A probe's computed value depends on more than its own electrode:
//!
//! - **Temperature** changes electrode slope (Nernst), conductivity, membrane
//!   permeability and the pH scale itself.
//! - **Auxiliary quantities** measured by *other* probes shift the result:
//!   nitrite and nitrate electrodes respond to pH and ionic strength, and
//!   total ammonia only becomes meaningful once split into toxic free NH₃ and
//!   harmless NH₄⁺ using pH and temperature.
//!
//! [`CompensationConfig`] holds the coefficients for one probe.
//! [`gather_auxiliary`] collects the auxiliary readings it needs, falling back
//! to configured values when a live reading is unavailable.
//!
//! ## Ammonia Speciation
//!
//! ```text
//! pKa      = 9.25 + 0.0324 · (T - 25)
//! fraction = 1 / (1 + 10^(pKa - pH))
//! NH₃      = total · fraction
//! ```
//!
//! ```rust
//! use aquaguard_core::compensation::free_ammonia_fraction;
//!
//! let fraction = free_ammonia_fraction(7.0, 25.0);
//! assert!((fraction - 0.0056).abs() < 1e-4);
//! ```

use heapless::Vec;
use libm::powf;

use crate::constants::buffers::MAX_AUXILIARY_INPUTS;
use crate::constants::physics;
use crate::sampling::SampleSource;
use crate::sensor::SensorKind;
use crate::traits::Validatable;

/// Quantity read from another probe for compensation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AuxQuantity {
    Ph,
    Conductivity,
    Salinity,
    DissolvedOxygen,
}

impl AuxQuantity {
    pub const fn name(&self) -> &'static str {
        match self {
            AuxQuantity::Ph => "ph",
            AuxQuantity::Conductivity => "conductivity",
            AuxQuantity::Salinity => "salinity",
            AuxQuantity::DissolvedOxygen => "dissolved_oxygen",
        }
    }
}

/// Multiplicative correction driven by one auxiliary quantity
///
/// `factor = 1 + coefficient · (reading - reference)`. A coefficient of zero
/// still requests the reading (ammonia needs pH for speciation only).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrossCoefficient {
    pub quantity: AuxQuantity,
    pub coefficient: f32,
    pub reference: f32,
    /// Value substituted when no live reading is available
    pub fallback: Option<f32>,
}

impl CrossCoefficient {
    /// Correction factor for a reading of this quantity
    pub fn factor(&self, reading: f32) -> f32 {
        1.0 + self.coefficient * (reading - self.reference)
    }
}

pub type CrossCoefficients = Vec<CrossCoefficient, MAX_AUXILIARY_INPUTS>;

/// Compensation coefficients for one probe
///
/// Set at startup and replaced only through an explicit configuration command.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompensationConfig {
    /// Per-°C coefficient, applied multiplicatively or additively depending
    /// on the sensor's temperature mode
    pub temp_coefficient: f32,
    /// Temperature (°C) at which no correction is applied
    pub reference_temp: f32,
    /// Added to linear sensor values after the span
    pub zero_offset: f32,
    /// Multiplies linear sensor values
    pub span: f32,
    pub cross_sensor: CrossCoefficients,
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            temp_coefficient: 0.0,
            reference_temp: physics::REFERENCE_TEMP_C,
            zero_offset: 0.0,
            span: 1.0,
            cross_sensor: Vec::new(),
        }
    }
}

impl CompensationConfig {
    /// Documented defaults for a probe type
    pub fn for_kind(kind: SensorKind) -> Self {
        let mut config = Self::default();

        match kind {
            SensorKind::Ph => config.temp_coefficient = physics::PH_TEMP_COEFF_PER_C,
            SensorKind::Ammonia => {
                config.push(AuxQuantity::Ph, 0.0, physics::PH_NEUTRAL, Some(physics::PH_NEUTRAL));
            }
            SensorKind::Nitrite => {
                config.push(
                    AuxQuantity::Ph,
                    physics::NITRITE_PH_COEFF,
                    physics::PH_NEUTRAL,
                    Some(physics::PH_NEUTRAL),
                );
                config.push(
                    AuxQuantity::Conductivity,
                    physics::NITRITE_CONDUCTIVITY_COEFF,
                    physics::CONDUCTIVITY_REFERENCE_US_CM,
                    Some(physics::CONDUCTIVITY_REFERENCE_US_CM),
                );
            }
            SensorKind::Nitrate => {
                config.push(
                    AuxQuantity::Ph,
                    physics::NITRATE_PH_COEFF,
                    physics::PH_NEUTRAL,
                    Some(physics::PH_NEUTRAL),
                );
                config.push(
                    AuxQuantity::Conductivity,
                    physics::NITRATE_CONDUCTIVITY_COEFF,
                    physics::CONDUCTIVITY_REFERENCE_US_CM,
                    Some(physics::CONDUCTIVITY_REFERENCE_US_CM),
                );
            }
            SensorKind::DissolvedOxygen => {
                config.temp_coefficient = physics::DO_TEMP_COEFF;
                // Fresh water unless a salinity probe says otherwise
                config.push(AuxQuantity::Salinity, physics::DO_SALINITY_COEFF, 0.0, None);
            }
            SensorKind::Conductivity | SensorKind::Salinity => {
                config.temp_coefficient = physics::CONDUCTIVITY_TEMP_COEFF;
            }
            SensorKind::OrganicLoad => config.temp_coefficient = physics::TOC_TEMP_COEFF,
            SensorKind::Orp | SensorKind::Turbidity | SensorKind::Temperature => {}
        }

        config
    }

    fn push(&mut self, quantity: AuxQuantity, coefficient: f32, reference: f32, fallback: Option<f32>) {
        // Defaults never exceed the capacity
        let _ = self.cross_sensor.push(CrossCoefficient {
            quantity,
            coefficient,
            reference,
            fallback,
        });
    }

    /// Cross-sensor entry for an auxiliary quantity
    pub fn coefficient_for(&self, quantity: AuxQuantity) -> Option<&CrossCoefficient> {
        self.cross_sensor.iter().find(|c| c.quantity == quantity)
    }

    /// `1 + temp_coefficient · (T - reference_temp)`
    pub fn temperature_factor(&self, temperature: f32) -> f32 {
        1.0 + self.temp_coefficient * (temperature - self.reference_temp)
    }

    /// `temp_coefficient · (T - reference_temp)`
    pub fn temperature_offset(&self, temperature: f32) -> f32 {
        self.temp_coefficient * (temperature - self.reference_temp)
    }

    /// Nernst slope scale `T_K / T_ref_K`
    pub fn nernst_scale(&self, temperature: f32) -> f32 {
        (temperature + physics::KELVIN_OFFSET) / (self.reference_temp + physics::KELVIN_OFFSET)
    }
}

/// One auxiliary value used for compensation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuxReading {
    pub quantity: AuxQuantity,
    pub value: f32,
    /// The configured fallback stood in for a live reading
    pub substituted: bool,
}

/// Auxiliary values captured for one measurement
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuxiliaryReadings {
    readings: Vec<AuxReading, MAX_AUXILIARY_INPUTS>,
    /// A configured quantity had neither a live reading nor a fallback
    missing: bool,
}

impl AuxiliaryReadings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live reading
    pub fn insert(&mut self, quantity: AuxQuantity, value: f32) {
        self.put(AuxReading {
            quantity,
            value,
            substituted: false,
        });
    }

    fn put(&mut self, reading: AuxReading) {
        if let Some(existing) = self.readings.iter_mut().find(|r| r.quantity == reading.quantity) {
            *existing = reading;
        } else {
            let _ = self.readings.push(reading);
        }
    }

    pub fn get(&self, quantity: AuxQuantity) -> Option<f32> {
        self.readings
            .iter()
            .find(|r| r.quantity == quantity)
            .map(|r| r.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuxReading> {
        self.readings.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Any value is a fallback, or a configured quantity is missing entirely
    pub fn degraded(&self) -> bool {
        self.missing || self.readings.iter().any(|r| r.substituted)
    }
}

/// Read every auxiliary quantity `config` needs
///
/// Live readings win; otherwise the entry's fallback is used and marked as
/// substituted. Entries with neither are skipped and mark the set degraded.
pub fn gather_auxiliary<S: SampleSource + ?Sized>(
    config: &CompensationConfig,
    source: &mut S,
) -> AuxiliaryReadings {
    let mut readings = AuxiliaryReadings::new();

    for entry in config.cross_sensor.iter() {
        match source.read_auxiliary(entry.quantity).filter(|v| v.is_valid()) {
            Some(value) => readings.insert(entry.quantity, value),
            None => match entry.fallback {
                Some(value) => {
                    log_debug!("{} unavailable, using fallback {}", entry.quantity.name(), value);
                    readings.put(AuxReading {
                        quantity: entry.quantity,
                        value,
                        substituted: true,
                    });
                }
                None => readings.missing = true,
            },
        }
    }

    readings
}

/// pKa of NH₄⁺ at water temperature `temperature` (°C)
pub fn ammonia_pka(temperature: f32) -> f32 {
    physics::AMMONIA_PKA_25C + physics::AMMONIA_PKA_TEMP_COEFF * (temperature - physics::REFERENCE_TEMP_C)
}

/// Fraction of total ammonia present as free NH₃
pub fn free_ammonia_fraction(ph: f32, temperature: f32) -> f32 {
    1.0 / (1.0 + powf(10.0, ammonia_pka(temperature) - ph))
}

/// Total ammonia split into its equilibrium species
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AmmoniaSpeciation {
    pub total: f32,
    /// Un-ionised NH₃ (toxic)
    pub free_ammonia: f32,
    /// NH₄⁺
    pub ionized: f32,
    pub fraction: f32,
}

impl AmmoniaSpeciation {
    pub fn split(total: f32, ph: f32, temperature: f32) -> Self {
        let fraction = free_ammonia_fraction(ph, temperature);
        let free_ammonia = total * fraction;

        Self {
            total,
            free_ammonia,
            ionized: total - free_ammonia,
            fraction,
        }
    }
}
