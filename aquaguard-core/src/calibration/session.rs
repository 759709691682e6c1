//! Resumable calibration run
//!
//! A [`CalibrationSession`] never blocks. The host loop calls
//! [`CalibrationSession::poll`] on every tick; operator confirmations and
//! cancellations arrive through [`CalibrationSession::confirm_stable`] and
//! [`CalibrationSession::cancel`]. Every wait is bounded by a timeout.
//!
//! The session only ever holds the points of the run in progress. The
//! probe's current curve is not touched until the session completes, so a
//! failed or cancelled run leaves it exactly as it was.

use heapless::Vec;

use super::fit::{fit_curve, FitSpec};
use super::{CalibrationCurve, CalibrationPoint, Standard, Standards};
use crate::constants::buffers::{CALIBRATION_WINDOW, MAX_CALIBRATION_POINTS, MIN_CALIBRATION_POINTS};
use crate::constants::time::{CALIBRATION_COLLECTION_TIMEOUT_MS, CALIBRATION_OPERATOR_TIMEOUT_MS};
use crate::errors::{CalibrationFailure, ProbeError, ProbeResult};
use crate::sampling::{acquire_window, SampleSource};
use crate::sensor::FitMode;
use crate::time::{elapsed_ms, Timestamp};

/// Timing and averaging for calibration runs
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationSettings {
    /// Raw samples averaged per standard
    pub window: usize,
    /// Maximum wait for the operator to confirm a stable reading
    pub operator_timeout_ms: u64,
    /// Maximum time to fill the averaging window once confirmed
    pub collection_timeout_ms: u64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            window: CALIBRATION_WINDOW,
            operator_timeout_ms: CALIBRATION_OPERATOR_TIMEOUT_MS,
            collection_timeout_ms: CALIBRATION_COLLECTION_TIMEOUT_MS,
        }
    }
}

/// Where a calibration run stands
#[derive(Debug, Clone, PartialEq)]
pub enum SessionProgress {
    /// Suspended until the operator confirms the reading is stable
    AwaitingStable { index: usize, expected_value: f32 },
    /// Confirmed; averaging raw samples for the standard
    Collecting { index: usize },
    /// All standards recorded and the fitted curve passed its checks
    Completed(CalibrationCurve),
    /// Run aborted; the previous curve stays in place
    Failed(CalibrationFailure),
}

impl SessionProgress {
    pub fn is_finished(&self) -> bool {
        matches!(self, SessionProgress::Completed(_) | SessionProgress::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    AwaitingStable { since: Timestamp },
    Collecting { since: Timestamp },
    Finished(SessionProgress),
}

/// One calibration run in progress
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    standards: Standards,
    points: Vec<CalibrationPoint, MAX_CALIBRATION_POINTS>,
    index: usize,
    stage: Stage,
    spec: FitSpec,
    settings: CalibrationSettings,
}

impl CalibrationSession {
    /// Start a run over `standards`, waiting for the first confirmation
    pub fn start(
        standards: &[Standard],
        spec: FitSpec,
        settings: CalibrationSettings,
        now: Timestamp,
    ) -> Result<Self, CalibrationFailure> {
        if standards.len() < MIN_CALIBRATION_POINTS {
            return Err(CalibrationFailure::TooFewStandards {
                required: MIN_CALIBRATION_POINTS,
                provided: standards.len(),
            });
        }

        let mut ordered = Standards::new();
        for standard in standards {
            if spec.fit_mode == FitMode::LogLinear && !(standard.expected_value > 0.0) {
                return Err(CalibrationFailure::NonPositiveStandard {
                    value: standard.expected_value,
                });
            }
            ordered
                .push(standard.clone())
                .map_err(|_| CalibrationFailure::TooManyStandards {
                    limit: MAX_CALIBRATION_POINTS,
                    provided: standards.len(),
                })?;
        }

        Ok(Self {
            standards: ordered,
            points: Vec::new(),
            index: 0,
            stage: Stage::AwaitingStable { since: now },
            spec,
            settings,
        })
    }

    /// Standard currently presented to the probe
    pub fn current_standard(&self) -> Option<&Standard> {
        match self.stage {
            Stage::Finished(_) => None,
            _ => self.standards.get(self.index),
        }
    }

    /// Points recorded so far
    pub fn recorded(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// Progress without advancing the run
    pub fn progress(&self) -> SessionProgress {
        match &self.stage {
            Stage::AwaitingStable { .. } => SessionProgress::AwaitingStable {
                index: self.index,
                expected_value: self.expected_value(),
            },
            Stage::Collecting { .. } => SessionProgress::Collecting { index: self.index },
            Stage::Finished(outcome) => outcome.clone(),
        }
    }

    /// Operator confirms the reading is stable for the current standard
    pub fn confirm_stable(&mut self, now: Timestamp) -> ProbeResult<()> {
        match self.stage {
            Stage::AwaitingStable { .. } => {
                self.stage = Stage::Collecting { since: now };
                Ok(())
            }
            _ => Err(ProbeError::InvalidCommand {
                reason: "not awaiting a stable reading",
            }),
        }
    }

    /// Abort the run
    pub fn cancel(&mut self) {
        if !matches!(self.stage, Stage::Finished(_)) {
            self.stage = Stage::Finished(SessionProgress::Failed(CalibrationFailure::Cancelled));
        }
    }

    /// Advance the run by one step
    pub fn poll<S: SampleSource + ?Sized>(&mut self, now: Timestamp, source: &mut S) -> SessionProgress {
        match self.stage {
            Stage::AwaitingStable { since } => {
                if elapsed_ms(since, now) > self.settings.operator_timeout_ms {
                    self.finish(SessionProgress::Failed(CalibrationFailure::OperatorTimeout {
                        index: self.index,
                    }));
                }
            }
            Stage::Collecting { since } => match acquire_window(source, self.settings.window) {
                Ok(sample) => self.record(CalibrationPoint {
                    standard_value: self.expected_value(),
                    raw_signal: sample.signal,
                    captured_temperature: sample.temperature,
                    captured_at: now,
                }, now),
                Err(_) if elapsed_ms(since, now) > self.settings.collection_timeout_ms => {
                    self.finish(SessionProgress::Failed(CalibrationFailure::CollectionTimeout {
                        index: self.index,
                    }));
                }
                // Retry on the next poll
                Err(_) => {}
            },
            Stage::Finished(_) => {}
        }

        self.progress()
    }

    fn record(&mut self, point: CalibrationPoint, now: Timestamp) {
        // Capacity matches the standards list
        let _ = self.points.push(point);
        self.index += 1;

        if self.index < self.standards.len() {
            self.stage = Stage::AwaitingStable { since: now };
            return;
        }

        let outcome = match fit_curve(&self.points, &self.spec, now) {
            Ok(curve) => SessionProgress::Completed(curve),
            Err(failure) => SessionProgress::Failed(failure),
        };
        self.finish(outcome);
    }

    fn finish(&mut self, outcome: SessionProgress) {
        self.stage = Stage::Finished(outcome);
    }

    fn expected_value(&self) -> f32 {
        self.standards
            .get(self.index)
            .map(|s| s.expected_value)
            .unwrap_or(f32::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compensation::AuxQuantity;
    use crate::sampling::RawSample;
    use crate::sensor::{SensorKind, SensorProfile};

    /// Emits a fixed signal that the test changes between standards
    struct Bench {
        signal: Option<f32>,
    }

    impl SampleSource for Bench {
        fn read_raw(&mut self) -> ProbeResult<RawSample> {
            self.signal
                .map(|signal| RawSample { signal, timestamp: 0 })
                .ok_or(ProbeError::Acquisition { reason: "electrode unplugged" })
        }

        fn read_temperature(&mut self) -> ProbeResult<f32> {
            Ok(25.0)
        }

        fn read_auxiliary(&mut self, _quantity: AuxQuantity) -> Option<f32> {
            None
        }
    }

    fn ammonia_session(now: Timestamp) -> CalibrationSession {
        let standards = [
            Standard::new("1 mg/L", 1.0),
            Standard::new("10 mg/L", 10.0),
            Standard::new("100 mg/L", 100.0),
        ];
        CalibrationSession::start(
            &standards,
            FitSpec::from(&SensorProfile::for_kind(SensorKind::Ammonia)),
            CalibrationSettings::default(),
            now,
        )
        .unwrap()
    }

    #[test]
    fn full_run_completes() {
        let mut session = ammonia_session(0);
        let mut bench = Bench { signal: None };

        for (i, raw) in [200.0, 141.0, 82.0].into_iter().enumerate() {
            let now = (i as u64 + 1) * 10_000;
            assert!(matches!(
                session.poll(now, &mut bench),
                SessionProgress::AwaitingStable { index, .. } if index == i
            ));

            bench.signal = Some(raw);
            session.confirm_stable(now).unwrap();
            session.poll(now + 100, &mut bench);
        }

        match session.progress() {
            SessionProgress::Completed(curve) => {
                assert!((curve.slope + 59.0).abs() < 1e-3);
                assert!(curve.is_valid);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(session.current_standard().is_none());
    }

    #[test]
    fn operator_wait_times_out() {
        let mut session = ammonia_session(0);
        let mut bench = Bench { signal: Some(200.0) };

        let progress = session.poll(CALIBRATION_OPERATOR_TIMEOUT_MS + 1, &mut bench);
        assert_eq!(
            progress,
            SessionProgress::Failed(CalibrationFailure::OperatorTimeout { index: 0 })
        );
    }

    #[test]
    fn collection_retries_then_times_out() {
        let mut session = ammonia_session(0);
        let mut bench = Bench { signal: None };

        session.confirm_stable(0).unwrap();
        assert_eq!(session.poll(1_000, &mut bench), SessionProgress::Collecting { index: 0 });

        let progress = session.poll(CALIBRATION_COLLECTION_TIMEOUT_MS + 1, &mut bench);
        assert_eq!(
            progress,
            SessionProgress::Failed(CalibrationFailure::CollectionTimeout { index: 0 })
        );
    }

    #[test]
    fn cancel_is_terminal() {
        let mut session = ammonia_session(0);
        session.cancel();
        assert_eq!(session.progress(), SessionProgress::Failed(CalibrationFailure::Cancelled));
        assert!(session.confirm_stable(10).is_err());
    }

    #[test]
    fn confirm_only_while_waiting() {
        let mut session = ammonia_session(0);
        session.confirm_stable(0).unwrap();
        assert!(matches!(
            session.confirm_stable(1),
            Err(ProbeError::InvalidCommand { .. })
        ));
    }

    #[test]
    fn rejects_bad_standard_lists() {
        let spec = FitSpec::from(&SensorProfile::for_kind(SensorKind::Ammonia));
        let settings = CalibrationSettings::default();

        let one = [Standard::new("10", 10.0)];
        assert!(matches!(
            CalibrationSession::start(&one, spec, settings, 0),
            Err(CalibrationFailure::TooFewStandards { .. })
        ));

        let five: [Standard; 5] = core::array::from_fn(|i| Standard::new("s", (i + 1) as f32));
        assert!(matches!(
            CalibrationSession::start(&five, spec, settings, 0),
            Err(CalibrationFailure::TooManyStandards { limit: 4, provided: 5 })
        ));

        let zero = [Standard::new("blank", 0.0), Standard::new("10", 10.0)];
        assert!(matches!(
            CalibrationSession::start(&zero, spec, settings, 0),
            Err(CalibrationFailure::NonPositiveStandard { .. })
        ));
    }
}
