use std::time::{Duration, Instant};

/// Monotonic animation clock that can be frozen and resumed.
///
/// While paused, `elapsed` holds still; resuming continues from the
/// frozen value rather than snapping forward or restarting at zero.
#[derive(Debug, Clone, Copy)]
pub struct PauseClock {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl PauseClock {
    pub fn new(now: Instant) -> Self {
        Self {
            accumulated: Duration::ZERO,
            running_since: Some(now),
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + now.saturating_duration_since(since),
            None => self.accumulated,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.running_since.is_none()
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += now.saturating_duration_since(since);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Flips the paused state; returns true when the clock is now paused.
    pub fn toggle(&mut self, now: Instant) -> bool {
        if self.is_paused() {
            self.resume(now);
        } else {
            self.pause(now);
        }
        self.is_paused()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_while_unpaused() {
        let start = Instant::now();
        let clock = PauseClock::new(start);
        let later = start + Duration::from_secs(3);
        assert_eq!(clock.elapsed(later), Duration::from_secs(3));
    }

    #[test]
    fn holds_still_while_paused() {
        let start = Instant::now();
        let mut clock = PauseClock::new(start);
        clock.pause(start + Duration::from_secs(2));
        let much_later = start + Duration::from_secs(60);
        assert_eq!(clock.elapsed(much_later), Duration::from_secs(2));
    }

    #[test]
    fn resume_continues_from_frozen_value() {
        let start = Instant::now();
        let mut clock = PauseClock::new(start);
        clock.pause(start + Duration::from_secs(2));
        clock.resume(start + Duration::from_secs(10));
        let later = start + Duration::from_secs(15);
        assert_eq!(clock.elapsed(later), Duration::from_secs(7));
    }

    #[test]
    fn toggle_reports_new_state() {
        let start = Instant::now();
        let mut clock = PauseClock::new(start);
        assert!(clock.toggle(start));
        assert!(clock.is_paused());
        assert!(!clock.toggle(start + Duration::from_secs(1)));
        assert!(!clock.is_paused());
    }

    #[test]
    fn double_pause_and_double_resume_are_harmless() {
        let start = Instant::now();
        let mut clock = PauseClock::new(start);
        clock.pause(start + Duration::from_secs(1));
        clock.pause(start + Duration::from_secs(5));
        assert_eq!(clock.elapsed(start + Duration::from_secs(9)), Duration::from_secs(1));
        clock.resume(start + Duration::from_secs(10));
        clock.resume(start + Duration::from_secs(20));
        assert_eq!(
            clock.elapsed(start + Duration::from_secs(12)),
            Duration::from_secs(3)
        );
    }
}
