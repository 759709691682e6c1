//! Collaborator traits
//!
//! The core talks to the outside world only through these narrow
//! interfaces (plus [`SampleSource`](crate::sampling::SampleSource) and
//! [`TimeSource`](crate::time::TimeSource)). Keep them simple: embedded
//! hosts implement them directly on their drivers.

use crate::alarm::AlarmEvent;
use crate::calibration::CalibrationCurve;
use crate::errors::ProbeResult;
use crate::measurement::Measurement;
use crate::scheduler::Phase;

/// Trait for values that can be validated
pub trait Validatable {
    /// Check if the value is numerically usable (not NaN or infinite)
    fn is_valid(&self) -> bool;
}

impl Validatable for f32 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl Validatable for f64 {
    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

/// Durable storage for one probe's calibration curve
///
/// Implementations must be durable across restarts and versioned so the
/// stored layout can evolve. A failed `save` must leave the previous curve
/// loadable.
pub trait CalibrationStore {
    /// Load the stored curve, `None` if nothing was ever saved
    fn load(&mut self) -> ProbeResult<Option<CalibrationCurve>>;

    /// Replace the stored curve
    fn save(&mut self, curve: &CalibrationCurve) -> ProbeResult<()>;
}

/// Receives finished measurements and alarms
///
/// Fire-and-forget: retries and buffering are the publisher's business.
pub trait Publisher {
    fn publish(&mut self, measurement: &Measurement);

    fn publish_alarm(&mut self, alarm: &AlarmEvent);
}

/// Physical equipment driven by the probe (pumps, heaters, valves)
pub trait Actuator {
    /// The scheduler entered `phase`
    fn enter_phase(&mut self, phase: Phase);

    /// Put the equipment into its safe default state
    fn force_safe(&mut self);
}

/// For probes that drive nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoActuator;

impl Actuator for NoActuator {
    fn enter_phase(&mut self, _phase: Phase) {}

    fn force_safe(&mut self) {}
}

/// Volatile store, for tests and hosts without persistent storage
#[derive(Debug, Clone, Default)]
pub struct MemoryCalibrationStore {
    curve: Option<CalibrationCurve>,
}

impl MemoryCalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_curve(curve: CalibrationCurve) -> Self {
        Self { curve: Some(curve) }
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn load(&mut self) -> ProbeResult<Option<CalibrationCurve>> {
        Ok(self.curve.clone())
    }

    fn save(&mut self, curve: &CalibrationCurve) -> ProbeResult<()> {
        self.curve = Some(curve.clone());
        Ok(())
    }
}

impl<T: CalibrationStore + ?Sized> CalibrationStore for &mut T {
    fn load(&mut self) -> ProbeResult<Option<CalibrationCurve>> {
        (**self).load()
    }

    fn save(&mut self, curve: &CalibrationCurve) -> ProbeResult<()> {
        (**self).save(curve)
    }
}

impl<T: Publisher + ?Sized> Publisher for &mut T {
    fn publish(&mut self, measurement: &Measurement) {
        (**self).publish(measurement)
    }

    fn publish_alarm(&mut self, alarm: &AlarmEvent) {
        (**self).publish_alarm(alarm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_validity() {
        assert!(1.0f32.is_valid());
        assert!(!f32::NAN.is_valid());
        assert!(!f64::INFINITY.is_valid());
    }

    #[test]
    fn memory_store_starts_empty() {
        let mut store = MemoryCalibrationStore::new();
        assert_eq!(store.load(), Ok(None));
    }
}
