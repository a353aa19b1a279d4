use std::time::{Duration, Instant};

const MIN_FADE_SECS: f32 = f32::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    Forward,
    Backward,
}

/// Transition notifications emitted by the scheduler. The caller reacts
/// by staging textures: on `Committed` the back slot has just become
/// visible, the slots should swap, and `preload` should be decoded into
/// the freed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideEvent {
    FadeStarted { target: usize },
    Retargeted { target: usize },
    Committed { revealed: usize, preload: usize },
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Holding { since: Instant },
    Dissolving { started: Instant },
}

/// Two-phase auto-advance state machine: hold the current photo for the
/// display duration, dissolve to the next over the fade duration, then
/// commit and hold again. All time is injected so tests can drive it
/// with synthetic instants.
#[derive(Debug)]
pub struct CrossfadeScheduler {
    photo_count: usize,
    current: usize,
    next: usize,
    phase: Phase,
    display: Duration,
    fade: Duration,
}

impl CrossfadeScheduler {
    /// `photo_count` must be non-zero; an empty corpus is rejected
    /// before a scheduler ever exists.
    pub fn new(photo_count: usize, display: Duration, fade: Duration, now: Instant) -> Self {
        debug_assert!(photo_count > 0);
        Self {
            photo_count,
            current: 0,
            next: 1 % photo_count,
            phase: Phase::Holding { since: now },
            display,
            fade,
        }
    }

    /// Index of the photo in the front (visible) slot.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Index of the photo staged in the back slot.
    pub fn next(&self) -> usize {
        self.next
    }

    pub fn is_dissolving(&self) -> bool {
        matches!(self.phase, Phase::Dissolving { .. })
    }

    /// Dissolve progress in [0, 1]; exactly 0 while holding.
    pub fn fade_progress(&self, now: Instant) -> f32 {
        match self.phase {
            Phase::Holding { .. } => 0.0,
            Phase::Dissolving { started } => {
                let elapsed = now.saturating_duration_since(started).as_secs_f32();
                let span = self.fade.as_secs_f32().max(MIN_FADE_SECS);
                (elapsed / span).clamp(0.0, 1.0)
            }
        }
    }

    /// Time left in the hold phase, for telemetry. Zero mid-dissolve.
    pub fn hold_remaining(&self, now: Instant) -> Duration {
        match self.phase {
            Phase::Holding { since } => self
                .display
                .saturating_sub(now.saturating_duration_since(since)),
            Phase::Dissolving { .. } => Duration::ZERO,
        }
    }

    /// Advances the state machine. At most one phase change happens per
    /// call; the caller ticks once per frame.
    pub fn tick(&mut self, now: Instant) -> Option<SlideEvent> {
        match self.phase {
            Phase::Holding { since } => {
                if now.saturating_duration_since(since) >= self.display {
                    self.phase = Phase::Dissolving { started: now };
                    Some(SlideEvent::FadeStarted { target: self.next })
                } else {
                    None
                }
            }
            Phase::Dissolving { .. } => {
                if self.fade_progress(now) >= 1.0 {
                    self.current = self.next;
                    self.next = (self.current + 1) % self.photo_count;
                    self.phase = Phase::Holding { since: now };
                    Some(SlideEvent::Committed {
                        revealed: self.current,
                        preload: self.next,
                    })
                } else {
                    None
                }
            }
        }
    }

    /// Manual navigation: aims the dissolve at the cyclic neighbour of
    /// the visible photo and restarts the fade from zero. Mid-dissolve
    /// the step is taken from the in-flight target, so repeated presses
    /// keep walking through the corpus instead of re-requesting the
    /// same photo until the fade lands.
    pub fn navigate(&mut self, direction: SlideDirection, now: Instant) -> SlideEvent {
        let base = if self.is_dissolving() {
            self.next
        } else {
            self.current
        };
        let target = match direction {
            SlideDirection::Forward => (base + 1) % self.photo_count,
            SlideDirection::Backward => (base + self.photo_count - 1) % self.photo_count,
        };
        self.next = target;
        self.phase = Phase::Dissolving { started: now };
        SlideEvent::Retargeted { target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY: Duration = Duration::from_secs(15);
    const FADE: Duration = Duration::from_secs(2);

    fn scheduler(count: usize, start: Instant) -> CrossfadeScheduler {
        CrossfadeScheduler::new(count, DISPLAY, FADE, start)
    }

    #[test]
    fn holds_then_dissolves_then_commits() {
        let start = Instant::now();
        let mut sched = scheduler(3, start);

        assert_eq!(sched.tick(start + Duration::from_secs(14)), None);
        assert_eq!(sched.fade_progress(start + Duration::from_secs(14)), 0.0);

        let fade_start = start + DISPLAY;
        assert_eq!(
            sched.tick(fade_start),
            Some(SlideEvent::FadeStarted { target: 1 })
        );
        assert!(sched.is_dissolving());

        let midway = fade_start + Duration::from_secs(1);
        assert_eq!(sched.tick(midway), None);
        let progress = sched.fade_progress(midway);
        assert!((progress - 0.5).abs() < 1e-3);

        let done = fade_start + FADE;
        assert_eq!(
            sched.tick(done),
            Some(SlideEvent::Committed {
                revealed: 1,
                preload: 2
            })
        );
        assert_eq!(sched.current(), 1);
        assert_eq!(sched.fade_progress(done), 0.0);
    }

    #[test]
    fn progress_is_monotonic_and_clamped() {
        let start = Instant::now();
        let mut sched = scheduler(2, start);
        sched.tick(start + DISPLAY);

        let mut last = 0.0_f32;
        for ms in (0..4000).step_by(50) {
            let now = start + DISPLAY + Duration::from_millis(ms);
            let progress = sched.fade_progress(now);
            assert!(progress >= last);
            assert!((0.0..=1.0).contains(&progress));
            last = progress;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn zero_fade_duration_commits_on_next_tick() {
        let start = Instant::now();
        let mut sched = CrossfadeScheduler::new(3, DISPLAY, Duration::ZERO, start);
        sched.tick(start + DISPLAY);
        assert!(sched.is_dissolving());
        assert_eq!(
            sched.tick(start + DISPLAY + Duration::from_millis(1)),
            Some(SlideEvent::Committed {
                revealed: 1,
                preload: 2
            })
        );
    }

    #[test]
    fn navigate_forward_starts_a_dissolve_immediately() {
        let start = Instant::now();
        let mut sched = scheduler(4, start);
        let event = sched.navigate(SlideDirection::Forward, start + Duration::from_secs(1));
        assert_eq!(event, SlideEvent::Retargeted { target: 1 });
        assert!(sched.is_dissolving());
    }

    #[test]
    fn navigate_backward_wraps_to_last() {
        let start = Instant::now();
        let mut sched = scheduler(4, start);
        let event = sched.navigate(SlideDirection::Backward, start);
        assert_eq!(event, SlideEvent::Retargeted { target: 3 });
        let done = start + FADE;
        assert_eq!(
            sched.tick(done),
            Some(SlideEvent::Committed {
                revealed: 3,
                preload: 0
            })
        );
    }

    #[test]
    fn navigate_mid_dissolve_retargets_and_restarts_fade() {
        let start = Instant::now();
        let mut sched = scheduler(4, start);
        sched.tick(start + DISPLAY);
        let midway = start + DISPLAY + Duration::from_secs(1);
        assert!(sched.fade_progress(midway) > 0.0);

        // The auto-dissolve was heading to photo 1; stepping back from
        // that target cancels the advance and returns to the visible
        // photo.
        let event = sched.navigate(SlideDirection::Backward, midway);
        assert_eq!(event, SlideEvent::Retargeted { target: 0 });
        assert_eq!(sched.fade_progress(midway), 0.0);
        assert_eq!(
            sched.tick(midway + FADE),
            Some(SlideEvent::Committed {
                revealed: 0,
                preload: 1
            })
        );
    }

    #[test]
    fn repeated_forward_presses_step_past_the_inflight_target() {
        let start = Instant::now();
        let mut sched = scheduler(5, start);

        assert_eq!(
            sched.navigate(SlideDirection::Forward, start),
            SlideEvent::Retargeted { target: 1 }
        );
        assert_eq!(
            sched.navigate(SlideDirection::Forward, start + Duration::from_millis(200)),
            SlideEvent::Retargeted { target: 2 }
        );
        assert_eq!(
            sched.navigate(SlideDirection::Forward, start + Duration::from_millis(400)),
            SlideEvent::Retargeted { target: 3 }
        );
        assert_eq!(
            sched.tick(start + Duration::from_millis(400) + FADE),
            Some(SlideEvent::Committed {
                revealed: 3,
                preload: 4
            })
        );
    }

    #[test]
    fn single_photo_cycles_onto_itself() {
        let start = Instant::now();
        let mut sched = scheduler(1, start);
        assert_eq!(sched.next(), 0);
        sched.tick(start + DISPLAY);
        assert_eq!(
            sched.tick(start + DISPLAY + FADE),
            Some(SlideEvent::Committed {
                revealed: 0,
                preload: 0
            })
        );
    }

    #[test]
    fn hold_remaining_counts_down() {
        let start = Instant::now();
        let sched = scheduler(2, start);
        assert_eq!(sched.hold_remaining(start), DISPLAY);
        assert_eq!(
            sched.hold_remaining(start + Duration::from_secs(10)),
            Duration::from_secs(5)
        );
        assert_eq!(sched.hold_remaining(start + Duration::from_secs(20)), Duration::ZERO);
    }
}
