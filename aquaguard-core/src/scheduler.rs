//! Measurement Scheduler
//!
//! ## State Machine
//!
//! ```text
//!            interval due
//!   IDLE ─────────────────► SAMPLING ──► [HEATING ──► MEASURING ──► CLEANING] ──► IDLE
//!    ▲                                    optional preparation, fixed dwells       │
//!    └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! IDLE is both the initial and the terminal state. [`Scheduler::tick`] is
//! called by the host loop; it never blocks and never starts a new cycle
//! while one is running.
//!
//! The sample is acquired when the MEASURING phase ends, or when SAMPLING
//! ends for probes without a MEASURING step.
//!
//! ## Missed Intervals
//!
//! When the host oversleeps (low-power mode) the scheduler notices that one
//! or more due times passed without a tick. Due times that pass while a
//! cycle is still running are not missed: the next cycle starts as soon as
//! the running one returns to IDLE, in the same tick. After
//! `skip_publication_after` consecutive late cycles the acquisition directive
//! carries `publish: false`; the probe still evaluates critical alarms.

use heapless::Vec;

use crate::constants::buffers::MAX_PREPARATION_STEPS;
use crate::time::{elapsed_ms, Timestamp};

/// Scheduler phase, also forwarded to the actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    Idle,
    Sampling,
    Heating,
    Measuring,
    Cleaning,
}

impl Phase {
    pub const fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Sampling => "sampling",
            Phase::Heating => "heating",
            Phase::Measuring => "measuring",
            Phase::Cleaning => "cleaning",
        }
    }
}

/// One preparation phase and how long to stay in it
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreparationStep {
    pub phase: Phase,
    pub dwell_ms: u64,
}

/// Phases run after SAMPLING, in order
pub type Preparation = Vec<PreparationStep, MAX_PREPARATION_STEPS>;

/// What the host should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Wait,
    /// Acquire and process a sample now
    Acquire { publish: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTick {
    pub phase: Phase,
    /// The phase changed during this tick
    pub phase_changed: bool,
    pub directive: Directive,
}

/// Drives the sampling cycle of one probe
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval_ms: u64,
    preparation: Preparation,
    skip_publication_after: u32,
    phase: Phase,
    /// Index into `preparation` while preparing; SAMPLING is before index 0
    step: Option<usize>,
    phase_since: Timestamp,
    next_due: Option<Timestamp>,
    last_tick: Option<Timestamp>,
    late_streak: u32,
    missed_total: u64,
    publish: bool,
}

impl Scheduler {
    pub fn new(interval_ms: u64, preparation: Preparation, skip_publication_after: u32) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            preparation,
            skip_publication_after,
            phase: Phase::Idle,
            step: None,
            phase_since: 0,
            next_due: None,
            last_tick: None,
            late_streak: 0,
            missed_total: 0,
            publish: true,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Intervals skipped since startup
    pub fn missed_intervals(&self) -> u64 {
        self.missed_total
    }

    /// Whether the current or most recent cycle publishes
    pub fn publishing(&self) -> bool {
        self.publish
    }

    /// Takes effect when the next cycle is scheduled
    pub fn set_interval(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms.max(1);
    }

    pub fn tick(&mut self, now: Timestamp) -> SchedulerTick {
        let start_phase = self.phase;
        let previous_tick = self.last_tick.replace(now);
        let mut directive = Directive::Wait;

        let running = self.phase != Phase::Idle || self.start_cycle_if_due(now, previous_tick);
        if running {
            self.run_phases(now, &mut directive);

            // A cycle that ended here hands over to the next one without waiting a tick
            if start_phase != Phase::Idle
                && self.phase == Phase::Idle
                && self.start_cycle_if_due(now, previous_tick)
            {
                self.run_phases(now, &mut directive);
            }
        }

        SchedulerTick {
            phase: self.phase,
            phase_changed: self.phase != start_phase || directive != Directive::Wait,
            directive,
        }
    }

    /// Complete every phase whose dwell has elapsed; zero-length dwells finish in the same tick
    fn run_phases(&mut self, now: Timestamp, directive: &mut Directive) {
        while self.phase != Phase::Idle && elapsed_ms(self.phase_since, now) >= self.dwell() {
            if self.acquires_here() {
                *directive = Directive::Acquire {
                    publish: self.publish,
                };
            }
            self.advance(now);
        }
    }

    fn start_cycle_if_due(&mut self, now: Timestamp, previous_tick: Option<Timestamp>) -> bool {
        let due = match self.next_due {
            None => now,
            Some(due) if now >= due => due,
            Some(_) => return false,
        };

        // Due times before the one served now
        let passed = elapsed_ms(due, now) / self.interval_ms;
        // Of those, the ones no tick observed
        let missed = match previous_tick {
            Some(seen) if seen >= due => passed.saturating_sub((seen - due) / self.interval_ms + 1),
            _ => passed,
        };

        if missed > 0 {
            self.missed_total += missed;
            self.late_streak = self.late_streak.saturating_add(1);
            log_debug!("missed {} sampling interval(s)", missed);
        } else {
            self.late_streak = 0;
        }

        self.publish = self.skip_publication_after == 0 || self.late_streak < self.skip_publication_after;
        self.next_due = Some(due + (passed + 1) * self.interval_ms);
        self.phase = Phase::Sampling;
        self.step = None;
        self.phase_since = now;
        true
    }

    fn dwell(&self) -> u64 {
        match self.step {
            None => 0,
            Some(i) => self.preparation.get(i).map(|s| s.dwell_ms).unwrap_or(0),
        }
    }

    fn acquires_here(&self) -> bool {
        let has_measuring = self.preparation.iter().any(|s| s.phase == Phase::Measuring);
        if has_measuring {
            self.phase == Phase::Measuring
        } else {
            self.phase == Phase::Sampling
        }
    }

    fn advance(&mut self, now: Timestamp) {
        let next = self.step.map(|i| i + 1).unwrap_or(0);
        match self.preparation.get(next) {
            Some(step) => {
                self.phase = step.phase;
                self.step = Some(next);
            }
            None => {
                self.phase = Phase::Idle;
                self.step = None;
            }
        }
        self.phase_since = now;
    }
}
