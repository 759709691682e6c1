//! Shared fixtures for integration tests
//!
//! - [`SimulatedProbe`]: a sample source driven by a true concentration and a
//!   Nernstian electrode model
//! - [`RecordingPublisher`]: keeps everything published

#![allow(dead_code)]

use aquaguard_core::{
    AlarmEvent, AuxQuantity, CalibrationPoint, Measurement, ProbeError, ProbeResult, Publisher,
    RawSample, SampleSource,
};

/// Electrode potential for `concentration` on a 200 mV / -59 mV-per-decade electrode
pub fn nernst_mv(concentration: f32) -> f32 {
    200.0 - 59.0 * concentration.log10()
}

/// Sample source with a settable signal and auxiliary bus
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    pub signal: Option<f32>,
    pub temperature: f32,
    pub ph: Option<f32>,
    pub conductivity: Option<f32>,
    pub reads: u64,
}

impl SimulatedProbe {
    pub fn new(signal: f32) -> Self {
        Self {
            signal: Some(signal),
            temperature: 25.0,
            ph: Some(7.0),
            conductivity: None,
            reads: 0,
        }
    }

    /// Immersed in a solution of `concentration` mg/L
    pub fn immersed(concentration: f32) -> Self {
        Self::new(nernst_mv(concentration))
    }

    pub fn disconnected() -> Self {
        Self {
            signal: None,
            ..Self::new(0.0)
        }
    }
}

impl SampleSource for SimulatedProbe {
    fn read_raw(&mut self) -> ProbeResult<RawSample> {
        self.reads += 1;
        match self.signal {
            Some(signal) => Ok(RawSample {
                signal,
                timestamp: self.reads,
            }),
            None => Err(ProbeError::Acquisition {
                reason: "electrode disconnected",
            }),
        }
    }

    fn read_temperature(&mut self) -> ProbeResult<f32> {
        Ok(self.temperature)
    }

    fn read_auxiliary(&mut self, quantity: AuxQuantity) -> Option<f32> {
        match quantity {
            AuxQuantity::Ph => self.ph,
            AuxQuantity::Conductivity => self.conductivity,
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub measurements: Vec<Measurement>,
    pub alarms: Vec<AlarmEvent>,
}

impl Publisher for RecordingPublisher {
    fn publish(&mut self, measurement: &Measurement) {
        self.measurements.push(measurement.clone());
    }

    fn publish_alarm(&mut self, alarm: &AlarmEvent) {
        self.alarms.push(*alarm);
    }
}

pub fn point(standard_value: f32, raw_signal: f32) -> CalibrationPoint {
    CalibrationPoint {
        standard_value,
        raw_signal,
        captured_temperature: 25.0,
        captured_at: 0,
    }
}
