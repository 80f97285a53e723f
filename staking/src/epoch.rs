//! Epoch accounting
//!
//! Epochs are fixed-length intervals counted from genesis, starting at 1.

use chrono::{DateTime, Duration, Utc};

/// Epoch clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochClock {
    /// Start of epoch 1
    genesis: DateTime<Utc>,

    /// Epoch length in seconds (non-zero once configured)
    duration_seconds: u64,
}

impl EpochClock {
    /// Create a clock
    pub fn new(genesis: DateTime<Utc>, duration_seconds: u64) -> Self {
        Self {
            genesis,
            duration_seconds,
        }
    }

    /// Start of epoch 1
    pub fn genesis(&self) -> DateTime<Utc> {
        self.genesis
    }

    /// Epoch length in seconds
    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    /// Same genesis, different epoch length
    pub fn with_duration(self, duration_seconds: u64) -> Self {
        Self {
            duration_seconds,
            ..self
        }
    }

    /// Epoch containing `now`
    ///
    /// Times at or before genesis are epoch 1.
    pub fn current_epoch(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = (now - self.genesis).num_seconds();
        if elapsed <= 0 {
            return 1;
        }

        (elapsed as u64)
            .checked_div(self.duration_seconds)
            .unwrap_or(0)
            .saturating_add(1)
    }

    /// Instant `epoch` begins, `None` if out of range
    pub fn epoch_start(&self, epoch: u64) -> Option<DateTime<Utc>> {
        let offset = epoch.saturating_sub(1).checked_mul(self.duration_seconds)?;
        let offset = Duration::try_seconds(i64::try_from(offset).ok()?)?;
        self.genesis.checked_add_signed(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_epoch_numbering() {
        let clock = EpochClock::new(t0(), 1000);

        assert_eq!(clock.current_epoch(t0()), 1);
        assert_eq!(clock.current_epoch(t0() + Duration::seconds(999)), 1);
        assert_eq!(clock.current_epoch(t0() + Duration::seconds(1000)), 2);
        assert_eq!(clock.current_epoch(t0() + Duration::seconds(4000)), 5);
    }

    #[test]
    fn test_before_genesis_is_first_epoch() {
        let clock = EpochClock::new(t0(), 1000);
        assert_eq!(clock.current_epoch(t0() - Duration::seconds(5000)), 1);
    }

    #[test]
    fn test_epoch_start() {
        let clock = EpochClock::new(t0(), 1000);

        assert_eq!(clock.epoch_start(1), Some(t0()));
        assert_eq!(clock.epoch_start(5), Some(t0() + Duration::seconds(4000)));
        assert_eq!(clock.current_epoch(clock.epoch_start(7).unwrap()), 7);
        assert_eq!(clock.epoch_start(u64::MAX), None);
    }

    #[test]
    fn test_duration_change() {
        let clock = EpochClock::new(t0(), 1000).with_duration(500);
        assert_eq!(clock.duration_seconds(), 500);
        assert_eq!(clock.current_epoch(t0() + Duration::seconds(4000)), 9);
    }
}
