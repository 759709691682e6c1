//! Alarm Evaluator
//!
//! ## Overview
//!
//! [`AlarmEvaluator::evaluate`] is a pure function of one measurement and the
//! configured thresholds. Several alarms may fire together, e.g. a low level
//! while the value is also dropping fast.
//!
//! ```text
//!              critical_low   low            high   critical_high
//!   ──────────────┼────────────┼──────────────┼───────────┼──────────►
//!    CriticalLow  │    Low     │      (ok)    │   High    │ CriticalHigh
//! ```
//!
//! A critical level supersedes the plain level on the same side.
//!
//! Multi-tier taxonomies (ammonia toxicity) are evaluated as membership of
//! ordered bands; every band above `Safe` raises a [`AlarmKind::Tier`] alarm.
//!
//! ## Repetition
//!
//! With [`AlarmPolicy::Repeat`] an alarm is raised on every evaluation while its
//! condition holds. [`AlarmPolicy::OnTransition`] passes events through an
//! [`AlarmLatch`] so each kind is raised only when it becomes active.

use heapless::Vec;
use libm::fabsf;

use crate::constants::buffers::MAX_ALARMS_PER_EVALUATION;
use crate::constants::sensors::{
    FREE_AMMONIA_ACUTE_MG_L, FREE_AMMONIA_CRITICAL_MG_L, FREE_AMMONIA_WARNING_MG_L,
};
use crate::measurement::Measurement;
use crate::sensor::SensorKind;
use crate::time::Timestamp;

/// Alarms raised by one evaluation
pub type AlarmEvents = Vec<AlarmEvent, MAX_ALARMS_PER_EVALUATION>;

/// Level thresholds for one measured quantity
///
/// Any threshold may be left unset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlarmThresholds {
    pub low: Option<f32>,
    pub high: Option<f32>,
    pub critical_low: Option<f32>,
    pub critical_high: Option<f32>,
}

/// Ordered toxicity band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BandLevel {
    Safe,
    Warning,
    Critical,
    Acute,
}

impl BandLevel {
    pub const fn name(&self) -> &'static str {
        match self {
            BandLevel::Safe => "safe",
            BandLevel::Warning => "warning",
            BandLevel::Critical => "critical",
            BandLevel::Acute => "acute",
        }
    }
}

/// Lower edges of the Warning, Critical and Acute bands
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToxicityBands {
    pub warning: f32,
    pub critical: f32,
    pub acute: f32,
}

impl ToxicityBands {
    /// Free-ammonia (NH₃) bands in mg/L
    pub const fn free_ammonia() -> Self {
        Self {
            warning: FREE_AMMONIA_WARNING_MG_L,
            critical: FREE_AMMONIA_CRITICAL_MG_L,
            acute: FREE_AMMONIA_ACUTE_MG_L,
        }
    }

    /// Band containing `value`; each band includes its lower edge
    pub fn classify(&self, value: f32) -> BandLevel {
        if value >= self.acute {
            BandLevel::Acute
        } else if value >= self.critical {
            BandLevel::Critical
        } else if value >= self.warning {
            BandLevel::Warning
        } else {
            BandLevel::Safe
        }
    }

    /// Lower edge of `level`
    pub fn edge(&self, level: BandLevel) -> f32 {
        match level {
            BandLevel::Safe => 0.0,
            BandLevel::Warning => self.warning,
            BandLevel::Critical => self.critical,
            BandLevel::Acute => self.acute,
        }
    }
}

/// How repeated alarm conditions are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlarmPolicy {
    /// Raise on every evaluation while the condition holds
    #[default]
    Repeat,
    /// Raise only when the condition becomes active
    OnTransition,
}

/// Alarm configuration for one probe
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlarmConfig {
    pub thresholds: AlarmThresholds,
    /// Maximum |change| per minute before a rapid-change alarm
    pub rapid_change_per_minute: Option<f32>,
    /// Tiered bands, applied to free ammonia when available
    pub bands: Option<ToxicityBands>,
    pub policy: AlarmPolicy,
}

/// What tripped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlarmKind {
    Low,
    High,
    CriticalLow,
    CriticalHigh,
    RapidChange,
    Tier(BandLevel),
    /// Too many consecutive failed cycles
    Unhealthy,
}

impl AlarmKind {
    /// Critical alarms are raised even when publication is skipped
    pub const fn is_critical(&self) -> bool {
        matches!(
            self,
            AlarmKind::CriticalLow
                | AlarmKind::CriticalHigh
                | AlarmKind::Tier(BandLevel::Critical)
                | AlarmKind::Tier(BandLevel::Acute)
                | AlarmKind::Unhealthy
        )
    }

    pub const fn name(&self) -> &'static str {
        match self {
            AlarmKind::Low => "low",
            AlarmKind::High => "high",
            AlarmKind::CriticalLow => "critical_low",
            AlarmKind::CriticalHigh => "critical_high",
            AlarmKind::RapidChange => "rapid_change",
            AlarmKind::Tier(level) => level.name(),
            AlarmKind::Unhealthy => "unhealthy",
        }
    }
}

/// A threshold crossing
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlarmEvent {
    pub kind: AlarmKind,
    pub sensor: SensorKind,
    pub value: f32,
    pub threshold: f32,
    pub timestamp: Timestamp,
}

/// Evaluates measurements against one probe's alarm configuration
#[derive(Debug, Clone, Copy)]
pub struct AlarmEvaluator<'a> {
    config: &'a AlarmConfig,
}

impl<'a> AlarmEvaluator<'a> {
    pub fn new(config: &'a AlarmConfig) -> Self {
        Self { config }
    }

    /// Alarms for one measurement; invalid measurements raise none
    pub fn evaluate(&self, measurement: &Measurement) -> AlarmEvents {
        let mut events = AlarmEvents::new();
        if !measurement.valid {
            return events;
        }

        let value = measurement.computed_value;
        let thresholds = &self.config.thresholds;
        let mut raise = |kind: AlarmKind, value: f32, threshold: f32| {
            let _ = events.push(AlarmEvent {
                kind,
                sensor: measurement.sensor,
                value,
                threshold,
                timestamp: measurement.timestamp,
            });
        };

        match (thresholds.critical_low, thresholds.low) {
            (Some(limit), _) if value < limit => raise(AlarmKind::CriticalLow, value, limit),
            (_, Some(limit)) if value < limit => raise(AlarmKind::Low, value, limit),
            _ => {}
        }

        match (thresholds.critical_high, thresholds.high) {
            (Some(limit), _) if value > limit => raise(AlarmKind::CriticalHigh, value, limit),
            (_, Some(limit)) if value > limit => raise(AlarmKind::High, value, limit),
            _ => {}
        }

        if let (Some(limit), Some(rate)) = (self.config.rapid_change_per_minute, measurement.rate_per_minute) {
            if fabsf(rate) > limit {
                raise(AlarmKind::RapidChange, rate, limit);
            }
        }

        if let Some(bands) = &self.config.bands {
            let subject = measurement
                .speciation
                .map(|s| s.free_ammonia)
                .unwrap_or(value);
            let level = bands.classify(subject);
            if level != BandLevel::Safe {
                raise(AlarmKind::Tier(level), subject, bands.edge(level));
            }
        }

        events
    }
}

/// Remembers which alarm kinds were active on the previous evaluation
#[derive(Debug, Clone, Default)]
pub struct AlarmLatch {
    active: Vec<AlarmKind, MAX_ALARMS_PER_EVALUATION>,
}

impl AlarmLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `policy` to freshly evaluated events
    ///
    /// Always records the current set of active kinds, so switching policy
    /// mid-run does not replay old alarms.
    pub fn filter(&mut self, events: AlarmEvents, policy: AlarmPolicy) -> AlarmEvents {
        let previous = core::mem::take(&mut self.active);
        for event in events.iter() {
            let _ = self.active.push(event.kind);
        }

        match policy {
            AlarmPolicy::Repeat => events,
            AlarmPolicy::OnTransition => events
                .into_iter()
                .filter(|event| !previous.contains(&event.kind))
                .collect(),
        }
    }

    pub fn is_active(&self, kind: AlarmKind) -> bool {
        self.active.contains(&kind)
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compensation::{AmmoniaSpeciation, AuxiliaryReadings};
    use crate::quality::QualityFlags;

    fn measurement(value: f32) -> Measurement {
        Measurement {
            sensor: SensorKind::DissolvedOxygen,
            raw_signal: value,
            computed_value: value,
            smoothed_value: value,
            temperature: 22.0,
            auxiliary: AuxiliaryReadings::new(),
            speciation: None,
            rate_per_minute: None,
            timestamp: 1_000,
            quality_score: 100,
            flags: QualityFlags::empty(),
            valid: true,
        }
    }

    fn oxygen_config() -> AlarmConfig {
        AlarmConfig {
            thresholds: AlarmThresholds {
                low: Some(5.0),
                high: Some(12.0),
                critical_low: Some(3.0),
                critical_high: None,
            },
            rapid_change_per_minute: Some(0.5),
            ..AlarmConfig::default()
        }
    }

    fn kinds(events: &AlarmEvents) -> std::vec::Vec<AlarmKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn within_limits_is_quiet() {
        let config = oxygen_config();
        assert!(AlarmEvaluator::new(&config).evaluate(&measurement(7.0)).is_empty());
    }

    #[test]
    fn critical_supersedes_low() {
        let config = oxygen_config();
        let evaluator = AlarmEvaluator::new(&config);

        assert_eq!(kinds(&evaluator.evaluate(&measurement(4.0))), [AlarmKind::Low]);
        let events = evaluator.evaluate(&measurement(2.0));
        assert_eq!(kinds(&events), [AlarmKind::CriticalLow]);
        assert_eq!(events[0].threshold, 3.0);
    }

    #[test]
    fn low_and_rapid_change_co_fire() {
        let config = oxygen_config();
        let mut m = measurement(4.5);
        m.rate_per_minute = Some(-0.8);

        let events = AlarmEvaluator::new(&config).evaluate(&m);
        assert_eq!(kinds(&events), [AlarmKind::Low, AlarmKind::RapidChange]);
    }

    #[test]
    fn invalid_measurement_raises_nothing() {
        let config = oxygen_config();
        let mut m = measurement(1.0);
        m.valid = false;
        assert!(AlarmEvaluator::new(&config).evaluate(&m).is_empty());
    }

    #[test]
    fn toxicity_bands() {
        let bands = ToxicityBands::free_ammonia();
        assert_eq!(bands.classify(0.0056), BandLevel::Safe);
        assert_eq!(bands.classify(0.02), BandLevel::Warning);
        assert_eq!(bands.classify(0.640), BandLevel::Critical);
        assert_eq!(bands.classify(1.999), BandLevel::Critical);
        assert_eq!(bands.classify(2.0), BandLevel::Acute);
    }

    #[test]
    fn tier_uses_free_ammonia() {
        let config = AlarmConfig {
            bands: Some(ToxicityBands::free_ammonia()),
            ..AlarmConfig::default()
        };
        let mut m = measurement(1.0);
        m.sensor = SensorKind::Ammonia;
        m.speciation = Some(AmmoniaSpeciation::split(1.0, 9.5, 25.0));

        let events = AlarmEvaluator::new(&config).evaluate(&m);
        assert_eq!(kinds(&events), [AlarmKind::Tier(BandLevel::Critical)]);
        assert!(events[0].kind.is_critical());
        assert_eq!(events[0].threshold, 0.5);

        m.speciation = Some(AmmoniaSpeciation::split(1.0, 7.0, 25.0));
        assert!(AlarmEvaluator::new(&config).evaluate(&m).is_empty());
    }

    #[test]
    fn repeat_policy_re_emits() {
        let config = oxygen_config();
        let evaluator = AlarmEvaluator::new(&config);
        let mut latch = AlarmLatch::new();

        for _ in 0..3 {
            let events = latch.filter(evaluator.evaluate(&measurement(4.0)), AlarmPolicy::Repeat);
            assert_eq!(events.len(), 1);
        }
    }

    #[test]
    fn transition_policy_emits_once() {
        let config = oxygen_config();
        let evaluator = AlarmEvaluator::new(&config);
        let mut latch = AlarmLatch::new();
        let policy = AlarmPolicy::OnTransition;

        assert_eq!(latch.filter(evaluator.evaluate(&measurement(4.0)), policy).len(), 1);
        assert!(latch.filter(evaluator.evaluate(&measurement(4.1)), policy).is_empty());
        assert!(latch.is_active(AlarmKind::Low));

        // Recovery clears the latch, so the next excursion alarms again
        assert!(latch.filter(evaluator.evaluate(&measurement(7.0)), policy).is_empty());
        assert_eq!(latch.filter(evaluator.evaluate(&measurement(4.0)), policy).len(), 1);
    }
}
