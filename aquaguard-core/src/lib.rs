//! Calibration and measurement engine for AquaGuard water-quality probes
//!
//! One generic pipeline serves every probe type (pH, ammonia, nitrite,
//! nitrate, dissolved oxygen, ORP, conductivity, salinity, turbidity,
//! temperature, organic load). Per-sensor differences are data, captured in
//! [`SensorProfile`] and [`ProbeConfig`].
//!
//! Key constraints:
//! - Runs on microcontrollers: `no_std`, no heap allocation
//! - Single-threaded and cooperative: nothing here ever blocks
//! - Degraded inputs degrade data quality, never crash the sampling loop
//!
//! ```no_run
//! use aquaguard_core::{
//!     MemoryCalibrationStore, Probe, ProbeConfig, SampleSource, SensorKind, Standard,
//! };
//! # use aquaguard_core::{Publisher, Measurement, AlarmEvent, ProbeResult, RawSample, AuxQuantity};
//! # struct Adc; struct Uplink;
//! # impl SampleSource for Adc {
//! #     fn read_raw(&mut self) -> ProbeResult<RawSample> { Ok(RawSample { signal: 150.0, timestamp: 0 }) }
//! #     fn read_temperature(&mut self) -> ProbeResult<f32> { Ok(24.0) }
//! #     fn read_auxiliary(&mut self, _: AuxQuantity) -> Option<f32> { Some(7.8) }
//! # }
//! # impl Publisher for Uplink {
//! #     fn publish(&mut self, _: &Measurement) {}
//! #     fn publish_alarm(&mut self, _: &AlarmEvent) {}
//! # }
//! # fn millis() -> u64 { 0 }
//!
//! let config = ProbeConfig::for_sensor(SensorKind::Ammonia);
//! let mut probe = Probe::new(config, Adc, MemoryCalibrationStore::new(), Uplink);
//! let _ = probe.restore();
//!
//! probe.request_calibration(&[Standard::new("1 mg/L", 1.0), Standard::new("10 mg/L", 10.0)], millis())?;
//!
//! loop {
//!     if let Some(measurement) = probe.tick(millis()) {
//!         // measurement.valid, measurement.quality_score, ...
//!     }
//! }
//! # Ok::<(), aquaguard_core::ProbeError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod macros;

pub mod alarm;
pub mod buffer;
pub mod calibration;
pub mod compensation;
pub mod concentration;
pub mod config;
pub mod constants;
pub mod errors;
pub mod measurement;
pub mod probe;
pub mod quality;
pub mod sampling;
pub mod scheduler;
pub mod sensor;
pub mod time;
pub mod traits;

// Public API
pub use alarm::{
    AlarmConfig, AlarmEvaluator, AlarmEvent, AlarmKind, AlarmPolicy, AlarmThresholds, BandLevel,
    ToxicityBands,
};
pub use calibration::{
    fit_curve, CalibrationCurve, CalibrationPoint, CalibrationSession, CalibrationState, Standard,
    Standards,
};
pub use compensation::{AmmoniaSpeciation, AuxQuantity, AuxiliaryReadings, CompensationConfig};
pub use concentration::{Concentration, ConcentrationCalculator};
pub use config::ProbeConfig;
pub use errors::{CalibrationFailure, ProbeError, ProbeResult};
pub use measurement::Measurement;
pub use probe::{CalibrationOutcome, Command, CommandResponse, DeviceStatus, Probe};
pub use quality::{MeasurementValidator, QualityFlags};
pub use sampling::{RawSample, SampleSource};
pub use scheduler::{Phase, Scheduler};
pub use sensor::{SensorKind, SensorProfile};
pub use time::{TimeSource, Timestamp};
pub use traits::{Actuator, CalibrationStore, MemoryCalibrationStore, NoActuator, Publisher};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
