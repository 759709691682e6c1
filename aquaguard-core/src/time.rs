//! Clocks for the host loop
//!
//! The engine never reads a clock itself: every operation takes `now` from
//! the caller. A host loop reads one of these clocks once per iteration and
//! passes the value down, which keeps every probe operation deterministic
//! under test.

/// Milliseconds on the host clock (Unix epoch or device boot)
pub type Timestamp = u64;

/// Where the host loop gets `now` from
pub trait TimeSource {
    fn now(&self) -> Timestamp;

    /// Milliseconds since `earlier`, zero if the clock stepped back
    fn since(&self, earlier: Timestamp) -> u64 {
        elapsed_ms(earlier, self.now())
    }
}

/// Milliseconds elapsed between two timestamps, zero if the clock went backwards
pub const fn elapsed_ms(earlier: Timestamp, later: Timestamp) -> u64 {
    later.saturating_sub(earlier)
}

/// Manually driven clock for simulations and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTime {
    now_ms: Timestamp,
}

impl FixedTime {
    pub const fn new(start: Timestamp) -> Self {
        Self { now_ms: start }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now_ms = self.now_ms.saturating_add(ms);
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_when_told() {
        let mut clock = FixedTime::new(1_000);
        assert_eq!(clock.now(), clock.now());

        clock.advance(500);
        assert_eq!(clock.now(), 1_500);
        assert_eq!(clock.since(1_200), 300);
    }

    #[test]
    fn elapsed_saturates() {
        assert_eq!(elapsed_ms(1000, 1500), 500);
        assert_eq!(elapsed_ms(1500, 1000), 0);
    }
}
