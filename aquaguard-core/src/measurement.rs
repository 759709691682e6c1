//! Measurement record
//!
//! One [`Measurement`] is built per sampling cycle, handed to the alarm
//! evaluator and the publisher, and then dropped. Only its value and
//! timestamp survive, in the probe's smoothing buffer.

use crate::buffer::{CircularBuffer, TimestampedValue};
use crate::compensation::{AmmoniaSpeciation, AuxiliaryReadings};
use crate::constants::time::MS_PER_MINUTE;
use crate::quality::QualityFlags;
use crate::sensor::SensorKind;
use crate::time::{elapsed_ms, Timestamp};

/// Result of one sampling cycle
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Measurement {
    pub sensor: SensorKind,
    /// Averaged raw signal, NaN when acquisition failed
    pub raw_signal: f32,
    pub computed_value: f32,
    /// Mean of the smoothing buffer, including this value when valid
    pub smoothed_value: f32,
    pub temperature: f32,
    pub auxiliary: AuxiliaryReadings,
    pub speciation: Option<AmmoniaSpeciation>,
    /// Change per minute against the previous valid value
    pub rate_per_minute: Option<f32>,
    pub timestamp: Timestamp,
    /// 0–100
    pub quality_score: u8,
    pub flags: QualityFlags,
    pub valid: bool,
}

impl Measurement {
    /// Invalid record for a cycle that produced no usable sample
    pub fn failed(sensor: SensorKind, smoothed_value: f32, timestamp: Timestamp) -> Self {
        let mut flags = QualityFlags::empty();
        flags.set(QualityFlags::ACQUISITION_FAILED);

        Self {
            sensor,
            raw_signal: f32::NAN,
            computed_value: f32::NAN,
            smoothed_value,
            temperature: f32::NAN,
            auxiliary: AuxiliaryReadings::new(),
            speciation: None,
            rate_per_minute: None,
            timestamp,
            quality_score: 0,
            flags,
            valid: false,
        }
    }

    pub fn calibrated(&self) -> bool {
        !self.flags.contains(QualityFlags::UNCALIBRATED)
    }
}

/// Change per minute from the newest buffered value to `value`
///
/// `None` when the buffer is empty or no time has passed.
pub fn rate_per_minute<const N: usize>(
    history: &CircularBuffer<N>,
    value: f32,
    timestamp: Timestamp,
) -> Option<f32> {
    let last: &TimestampedValue = history.last()?;
    let elapsed = elapsed_ms(last.timestamp, timestamp);
    if elapsed == 0 {
        return None;
    }

    Some((value - last.value) * MS_PER_MINUTE as f32 / elapsed as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_against_last_value() {
        let mut history: CircularBuffer<4> = CircularBuffer::new();
        assert_eq!(rate_per_minute(&history, 1.0, 0), None);

        history.push(TimestampedValue {
            value: 1.0,
            timestamp: 0,
        });
        assert_eq!(rate_per_minute(&history, 1.5, 30_000), Some(1.0));
        assert_eq!(rate_per_minute(&history, 1.5, 0), None);
    }

    #[test]
    fn failed_cycle_is_invalid() {
        let m = Measurement::failed(SensorKind::Ph, 7.1, 10);
        assert!(!m.valid);
        assert!(m.flags.contains(QualityFlags::ACQUISITION_FAILED));
        assert!(m.computed_value.is_nan());
    }
}
