//! Probe Ranges and Limits
//!
//! Absolute physical ranges (outside of which a reading is rejected) and
//! nominal ranges (outside of which a reading is only suspect) for every
//! probe type. Nominal ranges reflect healthy aquaculture water.

// ===== WATER TEMPERATURE =====

/// Lowest water temperature at which probes are specified (°C).
pub const WATER_TEMP_MIN_C: f32 = -10.0;

/// Highest water temperature at which probes are specified (°C).
pub const WATER_TEMP_MAX_C: f32 = 50.0;

/// Nominal operating band for electrode accuracy (°C).
pub const WATER_TEMP_NOMINAL_MIN_C: f32 = 10.0;
pub const WATER_TEMP_NOMINAL_MAX_C: f32 = 30.0;

// ===== pH =====

pub const PH_MIN: f32 = 0.0;
pub const PH_MAX: f32 = 14.0;
pub const PH_NOMINAL_MIN: f32 = 6.0;
pub const PH_NOMINAL_MAX: f32 = 9.0;

// ===== AMMONIA (total ammonia nitrogen, mg/L) =====

pub const AMMONIA_MIN_MG_L: f32 = 0.0;
pub const AMMONIA_MAX_MG_L: f32 = 1000.0;
pub const AMMONIA_NOMINAL_MAX_MG_L: f32 = 5.0;

/// Free ammonia toxicity band lower bounds (mg/L NH₃).
///
/// Source: common aquaculture guidance; chronic effects above 0.02 mg/L,
/// gill damage above 0.5 mg/L, acute mortality above 2 mg/L.
pub const FREE_AMMONIA_WARNING_MG_L: f32 = 0.02;
pub const FREE_AMMONIA_CRITICAL_MG_L: f32 = 0.5;
pub const FREE_AMMONIA_ACUTE_MG_L: f32 = 2.0;

// ===== NITRITE / NITRATE (mg/L) =====

pub const NITRITE_MAX_MG_L: f32 = 100.0;
pub const NITRITE_NOMINAL_MAX_MG_L: f32 = 1.0;
pub const NITRATE_MAX_MG_L: f32 = 1000.0;
pub const NITRATE_NOMINAL_MAX_MG_L: f32 = 100.0;

// ===== DISSOLVED OXYGEN (mg/L) =====

pub const DO_MAX_MG_L: f32 = 20.0;
pub const DO_NOMINAL_MIN_MG_L: f32 = 5.0;
pub const DO_NOMINAL_MAX_MG_L: f32 = 12.0;

// ===== ORP (mV) =====

pub const ORP_MIN_MV: f32 = -2000.0;
pub const ORP_MAX_MV: f32 = 2000.0;
pub const ORP_NOMINAL_MIN_MV: f32 = 150.0;
pub const ORP_NOMINAL_MAX_MV: f32 = 450.0;

// ===== CONDUCTIVITY (µS/cm) / SALINITY (ppt) =====

pub const CONDUCTIVITY_MAX_US_CM: f32 = 200_000.0;
pub const CONDUCTIVITY_NOMINAL_MAX_US_CM: f32 = 60_000.0;
pub const SALINITY_MAX_PPT: f32 = 70.0;
pub const SALINITY_NOMINAL_MAX_PPT: f32 = 40.0;

// ===== TURBIDITY (NTU) =====

pub const TURBIDITY_MAX_NTU: f32 = 4000.0;
pub const TURBIDITY_NOMINAL_MAX_NTU: f32 = 50.0;

// ===== ORGANIC LOAD (TOC, mg/L) =====

pub const TOC_MAX_MG_L: f32 = 500.0;
pub const TOC_NOMINAL_MAX_MG_L: f32 = 20.0;
