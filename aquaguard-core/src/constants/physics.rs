//! Electrochemistry and Aqueous Equilibrium Constants
//!
//! Constants used by the Nernst temperature correction and the
//! ammonia / ammonium speciation.

// ===== TEMPERATURE =====

/// Offset between Celsius and Kelvin scales.
pub const KELVIN_OFFSET: f32 = 273.15;

/// Reference temperature for compensation (°C).
///
/// Most water-quality standards are specified at 25°C.
pub const REFERENCE_TEMP_C: f32 = 25.0;

// ===== NERNST RELATION =====

/// Theoretical electrode slope at 25°C (mV per decade).
///
/// `2.303 · R · T / F` for a monovalent ion at 298.15 K.
///
/// Source: Nernst equation, R = 8.314 J/(mol·K), F = 96485 C/mol
pub const NERNST_SLOPE_25C_MV: f32 = 59.16;

/// Lower bound of an acceptable ion-selective electrode slope (mV/decade).
///
/// Electrodes below ~85% of theoretical are considered worn.
pub const ISE_SLOPE_MIN_MV: f32 = 50.0;

/// Upper bound of an acceptable ion-selective electrode slope (mV/decade).
pub const ISE_SLOPE_MAX_MV: f32 = 65.0;

/// Minimum acceptable pH electrode slope (mV per pH unit).
pub const PH_SLOPE_MIN_MV: f32 = 50.0;

/// Maximum acceptable pH electrode slope (mV per pH unit).
pub const PH_SLOPE_MAX_MV: f32 = 65.0;

/// Additive pH temperature correction (pH units per °C away from 25°C).
pub const PH_TEMP_COEFF_PER_C: f32 = -0.0003;

/// Neutral pH, used as the zero point of uncalibrated pH electrodes.
pub const PH_NEUTRAL: f32 = 7.0;

// ===== AMMONIA EQUILIBRIUM =====

/// pKa of the NH₄⁺ ⇌ NH₃ + H⁺ equilibrium at 25°C.
///
/// Source: Emerson et al. (1975), aquaculture toxicity tables
pub const AMMONIA_PKA_25C: f32 = 9.25;

/// Change in pKa per °C away from 25°C.
pub const AMMONIA_PKA_TEMP_COEFF: f32 = 0.0324;

// ===== CONDUCTIVITY =====

/// Typical linear temperature coefficient of natural water conductivity (1/°C).
///
/// Applied with a negative sign to normalise readings to 25°C.
pub const CONDUCTIVITY_TEMP_COEFF: f32 = -0.02;

/// Reference conductivity used by nitrite/nitrate ionic-strength correction (µS/cm).
pub const CONDUCTIVITY_REFERENCE_US_CM: f32 = 500.0;

// ===== CROSS-SENSOR CORRECTIONS =====

/// Nitrite electrode response change per pH unit away from neutral.
///
/// Below ~pH 5 nitrite protonates to HNO₂ and the electrode under-reads.
pub const NITRITE_PH_COEFF: f32 = -0.01;

/// Nitrite ionic-strength correction per µS/cm away from the reference.
pub const NITRITE_CONDUCTIVITY_COEFF: f32 = -0.00002;

/// Nitrate electrode response change per pH unit away from neutral.
pub const NITRATE_PH_COEFF: f32 = -0.005;

/// Nitrate ionic-strength correction per µS/cm away from the reference.
///
/// Chloride and bicarbonate are the dominant interferents.
pub const NITRATE_CONDUCTIVITY_COEFF: f32 = -0.00003;

/// Oxygen solubility loss per ppt of salinity (fraction per ppt).
pub const DO_SALINITY_COEFF: f32 = -0.0055;

/// Membrane permeability change of galvanic oxygen probes (1/°C).
pub const DO_TEMP_COEFF: f32 = -0.018;

/// Temperature coefficient of UV-absorbance organic-load probes (1/°C).
pub const TOC_TEMP_COEFF: f32 = -0.005;
