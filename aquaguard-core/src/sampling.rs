//! Sample acquisition
//!
//! The sample source is an external collaborator (ADC driver, simulator,
//! replay file). The engine only asks it for single raw samples, a water
//! temperature and, for cross-sensor compensation, auxiliary readings.
//! [`acquire_window`] averages a fixed-size window of raw samples into one
//! [`AveragedSample`]; it is shared by measurement cycles and calibration runs.

use crate::compensation::AuxQuantity;
use crate::errors::{ProbeError, ProbeResult};
use crate::time::Timestamp;
use crate::traits::Validatable;

/// One raw reading from the analog front end
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Electrode potential (mV), photodiode voltage, cell conductance, ...
    pub signal: f32,
    pub timestamp: Timestamp,
}

/// Supplies raw signal, temperature and auxiliary readings
pub trait SampleSource {
    /// Read one raw sample
    fn read_raw(&mut self) -> ProbeResult<RawSample>;

    /// Read the water temperature (°C)
    fn read_temperature(&mut self) -> ProbeResult<f32>;

    /// Read a live auxiliary quantity from another sensor, if available
    fn read_auxiliary(&mut self, quantity: AuxQuantity) -> Option<f32>;
}

/// Mean of a window of raw samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragedSample {
    pub signal: f32,
    pub temperature: f32,
    /// Timestamp of the newest sample in the window
    pub timestamp: Timestamp,
    /// Number of samples that contributed
    pub samples: usize,
}

/// Average up to `window` raw samples
///
/// Failed or non-finite samples are skipped. An empty window, or a missing
/// temperature, is an acquisition error.
pub fn acquire_window<S: SampleSource + ?Sized>(
    source: &mut S,
    window: usize,
) -> ProbeResult<AveragedSample> {
    let mut sum = 0.0f64;
    let mut samples = 0usize;
    let mut timestamp = 0;

    for _ in 0..window.max(1) {
        if let Ok(sample) = source.read_raw() {
            if sample.signal.is_valid() {
                sum += sample.signal as f64;
                samples += 1;
                timestamp = timestamp.max(sample.timestamp);
            }
        }
    }

    if samples == 0 {
        return Err(ProbeError::Acquisition {
            reason: "empty averaging window",
        });
    }

    let temperature = source.read_temperature()?;
    if !temperature.is_valid() {
        return Err(ProbeError::Acquisition {
            reason: "temperature not a number",
        });
    }

    Ok(AveragedSample {
        signal: (sum / samples as f64) as f32,
        temperature,
        timestamp,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        signals: [f32; 4],
        next: usize,
        temperature: Option<f32>,
    }

    impl SampleSource for Scripted {
        fn read_raw(&mut self) -> ProbeResult<RawSample> {
            let signal = self.signals[self.next % self.signals.len()];
            self.next += 1;
            if signal < 0.0 {
                return Err(ProbeError::Acquisition { reason: "adc timeout" });
            }
            Ok(RawSample {
                signal,
                timestamp: self.next as u64,
            })
        }

        fn read_temperature(&mut self) -> ProbeResult<f32> {
            self.temperature.ok_or(ProbeError::Acquisition { reason: "no thermistor" })
        }

        fn read_auxiliary(&mut self, _quantity: AuxQuantity) -> Option<f32> {
            None
        }
    }

    #[test]
    fn averages_and_skips_bad_samples() {
        let mut source = Scripted {
            signals: [100.0, f32::NAN, -1.0, 110.0],
            next: 0,
            temperature: Some(24.0),
        };

        let sample = acquire_window(&mut source, 4).unwrap();
        assert_eq!(sample.samples, 2);
        assert_eq!(sample.signal, 105.0);
        assert_eq!(sample.temperature, 24.0);
        assert_eq!(sample.timestamp, 4);
    }

    #[test]
    fn empty_window_is_acquisition_error() {
        let mut source = Scripted {
            signals: [-1.0; 4],
            next: 0,
            temperature: Some(24.0),
        };

        assert!(matches!(
            acquire_window(&mut source, 10),
            Err(ProbeError::Acquisition { .. })
        ));
    }

    #[test]
    fn missing_temperature_fails() {
        let mut source = Scripted {
            signals: [100.0; 4],
            next: 0,
            temperature: None,
        };

        assert!(acquire_window(&mut source, 2).is_err());
    }
}
