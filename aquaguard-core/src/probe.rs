//! Probe context object
//!
//! ## Overview
//!
//! A [`Probe`] owns everything one sensor instance needs: its configuration,
//! its calibration curve, its smoothing buffer, an optional calibration run
//! in progress, and its health counters. There are no globals; two probes in
//! one process share nothing.
//!
//! ```text
//!  tick(now) ──► CalibrationSession::poll        (if a run is active)
//!           └──► Scheduler::tick ──► Acquire ──► acquire_window
//!                                                 │
//!                ConcentrationCalculator::compute ◄┘
//!                MeasurementValidator::validate
//!                AlarmEvaluator::evaluate ──► AlarmLatch ──► Publisher
//! ```
//!
//! Failures never escape `tick`. A failed acquisition or an out-of-range
//! value becomes an invalid measurement and bumps the error counter; once the
//! counter reaches the configured limit the probe is marked unhealthy, its
//! actuator is forced safe and an alarm is published.

use crate::alarm::{AlarmEvaluator, AlarmEvent, AlarmKind, AlarmLatch, AlarmPolicy, AlarmThresholds};
use crate::buffer::{CircularBuffer, TimestampedValue};
use crate::calibration::{
    CalibrationCurve, CalibrationSession, CalibrationState, FitSpec, SessionProgress, Standard,
    Standards,
};
use crate::compensation::{gather_auxiliary, CompensationConfig};
use crate::concentration::ConcentrationCalculator;
use crate::config::ProbeConfig;
use crate::constants::buffers::SMOOTHING_WINDOW;
use crate::constants::quality::PENALTY_AUX_SUBSTITUTED;
use crate::errors::{CalibrationFailure, ProbeError, ProbeResult};
use crate::measurement::{rate_per_minute, Measurement};
use crate::quality::{MeasurementValidator, QualityFlags};
use crate::sampling::{acquire_window, SampleSource};
use crate::scheduler::{Directive, Phase, Scheduler};
use crate::sensor::SensorKind;
use crate::time::Timestamp;
use crate::traits::{Actuator, CalibrationStore, NoActuator, Publisher};

/// Result of the most recent calibration run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CalibrationOutcome {
    Completed {
        slope: f32,
        intercept: f32,
        correlation: f32,
        created_at: Timestamp,
    },
    Failed(CalibrationFailure),
}

/// Snapshot for the command interface
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub sensor: SensorKind,
    pub phase: Phase,
    pub calibration: CalibrationState,
    /// Calibration is older than the sensor's max age; recalibration is
    /// up to the operator
    pub calibration_due: bool,
    /// Run in progress, if any
    pub calibrating: Option<SessionProgress>,
    pub last_calibration: Option<CalibrationOutcome>,
    pub healthy: bool,
    pub consecutive_errors: u32,
    pub total_errors: u64,
    pub last_error: Option<ProbeError>,
    pub missed_intervals: u64,
    pub last_measurement_at: Option<Timestamp>,
}

/// Operator commands
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Latest measurement (idempotent)
    Measure,
    /// Device status (idempotent)
    Status,
    /// Start a calibration run over the given standards
    Calibrate(Standards),
    /// The current standard reading is stable
    ConfirmStable,
    CancelCalibration,
    SetThresholds(AlarmThresholds),
    SetCompensation(CompensationConfig),
    SetAlarmPolicy(AlarmPolicy),
    /// Milliseconds between cycles, from the next cycle on
    SetInterval(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandResponse {
    Measurement(Option<Measurement>),
    Status(DeviceStatus),
    Accepted,
    Rejected(ProbeError),
}

impl From<ProbeResult<()>> for CommandResponse {
    fn from(result: ProbeResult<()>) -> Self {
        match result {
            Ok(()) => CommandResponse::Accepted,
            Err(err) => CommandResponse::Rejected(err),
        }
    }
}

/// One sensor instance
pub struct Probe<S, C, P, A = NoActuator> {
    config: ProbeConfig,
    source: S,
    store: C,
    publisher: P,
    actuator: A,
    curve: Option<CalibrationCurve>,
    smoothing: CircularBuffer<SMOOTHING_WINDOW>,
    session: Option<CalibrationSession>,
    last_calibration: Option<CalibrationOutcome>,
    scheduler: Scheduler,
    latch: AlarmLatch,
    consecutive_errors: u32,
    total_errors: u64,
    last_error: Option<ProbeError>,
    unhealthy: bool,
    last_measurement: Option<Measurement>,
}

impl<S, C, P> Probe<S, C, P, NoActuator>
where
    S: SampleSource,
    C: CalibrationStore,
    P: Publisher,
{
    pub fn new(config: ProbeConfig, source: S, store: C, publisher: P) -> Self {
        Self::with_actuator(config, source, store, publisher, NoActuator)
    }
}

impl<S, C, P, A> Probe<S, C, P, A>
where
    S: SampleSource,
    C: CalibrationStore,
    P: Publisher,
    A: Actuator,
{
    pub fn with_actuator(config: ProbeConfig, source: S, store: C, publisher: P, actuator: A) -> Self {
        let scheduler = Scheduler::new(
            config.sampling.interval_ms,
            config.sampling.preparation.clone(),
            config.sampling.skip_publication_after,
        );

        Self {
            config,
            source,
            store,
            publisher,
            actuator,
            curve: None,
            smoothing: CircularBuffer::new(),
            session: None,
            last_calibration: None,
            scheduler,
            latch: AlarmLatch::new(),
            consecutive_errors: 0,
            total_errors: 0,
            last_error: None,
            unhealthy: false,
            last_measurement: None,
        }
    }

    /// Load the stored curve; call once at startup
    ///
    /// On error the probe keeps running on its default model.
    pub fn restore(&mut self) -> ProbeResult<()> {
        match self.store.load() {
            Ok(curve) => {
                if let Some(curve) = &curve {
                    log_info!(
                        "{}: restored calibration slope={} r={}",
                        self.sensor().name(),
                        curve.slope,
                        curve.correlation
                    );
                }
                self.curve = curve;
                Ok(())
            }
            Err(err) => {
                log_warn!("{}: calibration not restored: {}", self.sensor().name(), err);
                self.last_error = Some(err);
                Err(err)
            }
        }
    }

    pub fn sensor(&self) -> SensorKind {
        self.config.sensor()
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn curve(&self) -> Option<&CalibrationCurve> {
        self.curve.as_ref()
    }

    pub fn last_measurement(&self) -> Option<&Measurement> {
        self.last_measurement.as_ref()
    }

    pub fn is_healthy(&self) -> bool {
        !self.unhealthy
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Advance calibration and scheduling by one host-loop iteration
    ///
    /// Returns the measurement taken this tick, if any.
    pub fn tick(&mut self, now: Timestamp) -> Option<Measurement> {
        self.poll_calibration(now);

        let tick = self.scheduler.tick(now);
        if tick.phase_changed && !self.unhealthy {
            self.actuator.enter_phase(tick.phase);
        }

        match tick.directive {
            Directive::Acquire { publish } => Some(self.run_cycle(now, publish)),
            Directive::Wait => None,
        }
    }

    /// Take and process one measurement outside the schedule
    pub fn measure_now(&mut self, now: Timestamp) -> Measurement {
        self.run_cycle(now, true)
    }

    fn run_cycle(&mut self, now: Timestamp, publish: bool) -> Measurement {
        let mut measurement = match acquire_window(&mut self.source, self.config.sampling.window) {
            Ok(sample) => {
                let auxiliary = gather_auxiliary(&self.config.compensation, &mut self.source);
                let calculator =
                    ConcentrationCalculator::new(&self.config.profile, &self.config.compensation);
                let result =
                    calculator.compute(self.curve.as_ref(), sample.signal, sample.temperature, &auxiliary);

                let mut assessment = MeasurementValidator::new(&self.config.profile).validate(
                    result.value,
                    sample.temperature,
                    CalibrationState::of(self.curve.as_ref(), now),
                );
                if auxiliary.degraded() {
                    assessment.penalize(QualityFlags::AUX_SUBSTITUTED, PENALTY_AUX_SUBSTITUTED);
                }

                let (smoothed_value, rate) = if assessment.valid {
                    let rate = rate_per_minute(&self.smoothing, result.value, now);
                    self.smoothing.push(TimestampedValue {
                        value: result.value,
                        timestamp: now,
                    });
                    (self.smoothing.mean().unwrap_or(result.value), rate)
                } else {
                    (self.smoothing.mean().unwrap_or(f32::NAN), None)
                };

                Measurement {
                    sensor: self.sensor(),
                    raw_signal: sample.signal,
                    computed_value: result.value,
                    smoothed_value,
                    temperature: sample.temperature,
                    auxiliary,
                    speciation: result.speciation,
                    rate_per_minute: rate,
                    timestamp: now,
                    quality_score: assessment.quality_score,
                    flags: assessment.flags,
                    valid: assessment.valid,
                }
            }
            Err(err) => {
                log_warn!("{}: {}", self.sensor().name(), err);
                self.last_error = Some(err);
                Measurement::failed(
                    self.sensor(),
                    self.smoothing.mean().unwrap_or(f32::NAN),
                    now,
                )
            }
        };

        if self.session.is_some() {
            measurement.flags.set(QualityFlags::CALIBRATING);
        }

        self.track_health(&measurement);

        let alarms = AlarmEvaluator::new(&self.config.alarms).evaluate(&measurement);
        let alarms = self.latch.filter(alarms, self.config.alarms.policy);

        if publish {
            self.publisher.publish(&measurement);
        }
        for alarm in alarms.iter().filter(|a| publish || a.kind.is_critical()) {
            log_info!(
                "{}: {} alarm value={} threshold={}",
                self.sensor().name(),
                alarm.kind.name(),
                alarm.value,
                alarm.threshold
            );
            self.publisher.publish_alarm(alarm);
        }

        self.last_measurement = Some(measurement.clone());
        measurement
    }

    fn track_health(&mut self, measurement: &Measurement) {
        if measurement.valid {
            if self.unhealthy {
                log_info!("{}: healthy again", self.sensor().name());
            }
            self.consecutive_errors = 0;
            self.unhealthy = false;
            return;
        }

        if !measurement.flags.contains(QualityFlags::ACQUISITION_FAILED) {
            self.last_error = Some(if measurement.computed_value.is_finite() {
                ProbeError::OutOfRange {
                    value: measurement.computed_value,
                    min: self.config.profile.physical_range.min,
                    max: self.config.profile.physical_range.max,
                }
            } else {
                ProbeError::InvalidValue
            });
        }

        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        self.total_errors = self.total_errors.saturating_add(1);

        let limit = self.config.health.max_consecutive_errors;
        if !self.unhealthy && limit > 0 && self.consecutive_errors >= limit {
            self.unhealthy = true;
            log_warn!(
                "{}: unhealthy after {} consecutive errors",
                self.sensor().name(),
                self.consecutive_errors
            );
            self.actuator.force_safe();
            self.publisher.publish_alarm(&AlarmEvent {
                kind: AlarmKind::Unhealthy,
                sensor: self.sensor(),
                value: self.consecutive_errors as f32,
                threshold: limit as f32,
                timestamp: measurement.timestamp,
            });
        }
    }

    /// Start a calibration run
    pub fn request_calibration(&mut self, standards: &[Standard], now: Timestamp) -> ProbeResult<()> {
        if self.session.is_some() {
            return Err(ProbeError::Busy);
        }

        let session = CalibrationSession::start(
            standards,
            FitSpec::from(&self.config.profile),
            self.config.calibration,
            now,
        )?;

        log_info!(
            "{}: calibration started with {} standards",
            self.sensor().name(),
            standards.len()
        );
        self.session = Some(session);
        Ok(())
    }

    /// Operator confirms the current standard reads stable
    pub fn confirm_stable(&mut self, now: Timestamp) -> ProbeResult<()> {
        match self.session.as_mut() {
            Some(session) => session.confirm_stable(now),
            None => Err(ProbeError::InvalidCommand {
                reason: "no calibration in progress",
            }),
        }
    }

    /// Abort the run; the current curve stays in place
    pub fn cancel_calibration(&mut self) -> ProbeResult<()> {
        match self.session.as_mut() {
            Some(session) => {
                session.cancel();
                let progress = session.progress();
                self.finish_calibration(progress);
                Ok(())
            }
            None => Err(ProbeError::InvalidCommand {
                reason: "no calibration in progress",
            }),
        }
    }

    pub fn calibration_progress(&self) -> Option<SessionProgress> {
        self.session.as_ref().map(|s| s.progress())
    }

    pub fn last_calibration(&self) -> Option<CalibrationOutcome> {
        self.last_calibration
    }

    fn poll_calibration(&mut self, now: Timestamp) {
        let progress = match self.session.as_mut() {
            Some(session) => session.poll(now, &mut self.source),
            None => return,
        };

        if progress.is_finished() {
            self.finish_calibration(progress);
        }
    }

    fn finish_calibration(&mut self, progress: SessionProgress) {
        self.session = None;

        let outcome = match progress {
            SessionProgress::Completed(curve) => match self.store.save(&curve) {
                Ok(()) => {
                    log_info!(
                        "{}: calibration accepted slope={} r={}",
                        self.sensor().name(),
                        curve.slope,
                        curve.correlation
                    );
                    let outcome = CalibrationOutcome::Completed {
                        slope: curve.slope,
                        intercept: curve.intercept,
                        correlation: curve.correlation,
                        created_at: curve.created_at,
                    };
                    self.curve = Some(curve);
                    self.smoothing.clear();
                    outcome
                }
                Err(err) => {
                    log_warn!("{}: calibration not saved: {}", self.sensor().name(), err);
                    self.last_error = Some(err);
                    CalibrationOutcome::Failed(CalibrationFailure::StoreRejected)
                }
            },
            SessionProgress::Failed(failure) => {
                log_warn!("{}: calibration failed: {}", self.sensor().name(), failure);
                CalibrationOutcome::Failed(failure)
            }
            SessionProgress::AwaitingStable { .. } | SessionProgress::Collecting { .. } => return,
        };

        self.last_calibration = Some(outcome);
    }

    pub fn status(&self, now: Timestamp) -> DeviceStatus {
        let calibration = CalibrationState::of(self.curve.as_ref(), now);
        let calibration_due = match calibration {
            CalibrationState::Calibrated { age_ms } => age_ms > self.config.profile.max_calibration_age_ms,
            CalibrationState::Uncalibrated => true,
        };

        DeviceStatus {
            sensor: self.sensor(),
            phase: self.scheduler.phase(),
            calibration,
            calibration_due,
            calibrating: self.calibration_progress(),
            last_calibration: self.last_calibration,
            healthy: !self.unhealthy,
            consecutive_errors: self.consecutive_errors,
            total_errors: self.total_errors,
            last_error: self.last_error,
            missed_intervals: self.scheduler.missed_intervals(),
            last_measurement_at: self.last_measurement.as_ref().map(|m| m.timestamp),
        }
    }

    pub fn handle(&mut self, command: Command, now: Timestamp) -> CommandResponse {
        match command {
            Command::Measure => CommandResponse::Measurement(self.last_measurement.clone()),
            Command::Status => CommandResponse::Status(self.status(now)),
            Command::Calibrate(standards) => self.request_calibration(&standards, now).into(),
            Command::ConfirmStable => self.confirm_stable(now).into(),
            Command::CancelCalibration => self.cancel_calibration().into(),
            Command::SetThresholds(thresholds) => {
                self.config.alarms.thresholds = thresholds;
                self.latch.clear();
                CommandResponse::Accepted
            }
            Command::SetCompensation(compensation) => {
                self.config.compensation = compensation;
                CommandResponse::Accepted
            }
            Command::SetAlarmPolicy(policy) => {
                self.config.alarms.policy = policy;
                CommandResponse::Accepted
            }
            Command::SetInterval(0) => CommandResponse::Rejected(ProbeError::InvalidCommand {
                reason: "sampling interval must be positive",
            }),
            Command::SetInterval(interval_ms) => {
                self.config.sampling.interval_ms = interval_ms;
                self.scheduler.set_interval(interval_ms);
                CommandResponse::Accepted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compensation::AuxQuantity;
    use crate::sampling::RawSample;
    use crate::traits::MemoryCalibrationStore;

    struct Constant {
        signal: Option<f32>,
        temperature: f32,
    }

    impl SampleSource for Constant {
        fn read_raw(&mut self) -> ProbeResult<RawSample> {
            self.signal
                .map(|signal| RawSample { signal, timestamp: 0 })
                .ok_or(ProbeError::Acquisition { reason: "no signal" })
        }

        fn read_temperature(&mut self) -> ProbeResult<f32> {
            Ok(self.temperature)
        }

        fn read_auxiliary(&mut self, quantity: AuxQuantity) -> Option<f32> {
            (quantity == AuxQuantity::Ph).then_some(7.0)
        }
    }

    #[derive(Default)]
    struct Sink {
        measurements: usize,
        alarms: std::vec::Vec<AlarmKind>,
    }

    impl Publisher for Sink {
        fn publish(&mut self, _measurement: &Measurement) {
            self.measurements += 1;
        }

        fn publish_alarm(&mut self, alarm: &AlarmEvent) {
            self.alarms.push(alarm.kind);
        }
    }

    #[derive(Default)]
    struct Pump {
        safe: bool,
    }

    impl Actuator for Pump {
        fn enter_phase(&mut self, _phase: Phase) {}

        fn force_safe(&mut self) {
            self.safe = true;
        }
    }

    fn ammonia(signal: Option<f32>) -> Probe<Constant, MemoryCalibrationStore, Sink, Pump> {
        Probe::with_actuator(
            ProbeConfig::for_sensor(SensorKind::Ammonia),
            Constant {
                signal,
                temperature: 25.0,
            },
            MemoryCalibrationStore::new(),
            Sink::default(),
            Pump::default(),
        )
    }

    #[test]
    fn uncalibrated_measurement() {
        let mut probe = ammonia(Some(200.0));
        let m = probe.tick(0).unwrap();

        assert!(m.valid);
        assert!(!m.calibrated());
        assert!(m.quality_score <= 70);
        assert!((m.computed_value - 1.0).abs() < 1e-4);
        assert_eq!(probe.publisher().measurements, 1);
    }

    #[test]
    fn failures_mark_unhealthy_and_force_safe() {
        let mut probe = ammonia(None);
        let limit = probe.config().health.max_consecutive_errors;

        for i in 0..limit as u64 {
            let m = probe.measure_now(i * 1_000);
            assert!(!m.valid);
        }

        assert!(!probe.is_healthy());
        assert!(probe.actuator().safe);
        assert_eq!(probe.publisher().alarms, [AlarmKind::Unhealthy]);
        assert_eq!(probe.status(0).consecutive_errors, limit);

        probe.source_mut().signal = Some(200.0);
        assert!(probe.measure_now(10_000).valid);
        assert!(probe.is_healthy());
    }

    #[test]
    fn calibration_replaces_curve() {
        let mut probe = ammonia(Some(200.0));
        let standards = [Standard::new("1", 1.0), Standard::new("10", 10.0)];
        probe.request_calibration(&standards, 0).unwrap();
        assert_eq!(probe.request_calibration(&standards, 0), Err(ProbeError::Busy));

        probe.confirm_stable(0).unwrap();
        probe.tick(1);
        probe.source_mut().signal = Some(141.0);
        probe.confirm_stable(2).unwrap();
        probe.tick(3);

        assert!(probe.calibration_progress().is_none());
        assert!(matches!(probe.last_calibration(), Some(CalibrationOutcome::Completed { .. })));
        assert!(probe.curve().unwrap().is_valid);
        assert!(!probe.status(3).calibration_due);
    }

    #[test]
    fn cancel_keeps_previous_curve() {
        let mut probe = ammonia(Some(200.0));
        probe
            .request_calibration(&[Standard::new("1", 1.0), Standard::new("10", 10.0)], 0)
            .unwrap();

        assert_eq!(probe.handle(Command::CancelCalibration, 1), CommandResponse::Accepted);
        assert!(probe.curve().is_none());
        assert_eq!(
            probe.last_calibration(),
            Some(CalibrationOutcome::Failed(CalibrationFailure::Cancelled))
        );
        assert!(matches!(
            probe.handle(Command::ConfirmStable, 2),
            CommandResponse::Rejected(ProbeError::InvalidCommand { .. })
        ));
    }

    #[test]
    fn measure_command_is_idempotent() {
        let mut probe = ammonia(Some(200.0));
        assert_eq!(probe.handle(Command::Measure, 0), CommandResponse::Measurement(None));

        probe.tick(0);
        let first = probe.handle(Command::Measure, 5);
        let second = probe.handle(Command::Measure, 6);
        assert_eq!(first, second);
        assert_eq!(probe.publisher().measurements, 1);
    }

    #[test]
    fn zero_error_limit_disables_health_tracking() {
        let mut probe = ammonia(None);
        probe.config.health.max_consecutive_errors = 0;

        for i in 0..10 {
            probe.measure_now(i * 1_000);
        }
        assert!(probe.is_healthy());
        assert!(!probe.actuator().safe);
        assert!(probe.publisher().alarms.is_empty());
        assert_eq!(probe.status(10_000).consecutive_errors, 10);
    }

    #[test]
    fn interval_command_reschedules() {
        let mut probe = ammonia(Some(200.0));
        assert!(matches!(
            probe.handle(Command::SetInterval(0), 0),
            CommandResponse::Rejected(ProbeError::InvalidCommand { .. })
        ));
        assert_eq!(probe.handle(Command::SetInterval(120_000), 0), CommandResponse::Accepted);
        assert_eq!(probe.config().sampling.interval_ms, 120_000);

        assert!(probe.tick(0).is_some());
        assert!(probe.tick(60_000).is_none());
        assert!(probe.tick(120_000).is_some());
        assert_eq!(probe.status(120_000).missed_intervals, 0);
    }
}
