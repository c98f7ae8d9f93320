//! Debounce and throttle state machines.
//!
//! Neither type sleeps or spawns. Callers pass the current instant from a
//! [`Clock`], so the logic runs the same under tokio timers and in tests
//! with a [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_nanos: AtomicU64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_nanos: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_nanos
            .fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

/// Fires once, `interval` after the last trigger.
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm, or push back an armed deadline.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// `true` exactly once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Verdict for one throttled call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Run now; the run has been recorded.
    RunNow,
    /// Inside the window: run once after the remaining time.
    Deferred(Duration),
    /// A trailing run is already scheduled.
    Suppressed,
}

/// Leading-edge throttle with a single trailing run.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_run: Option<Instant>,
    trailing_pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            trailing_pending: false,
        }
    }

    pub fn check(&mut self, now: Instant) -> ThrottleDecision {
        let elapsed = self.last_run.map(|last| now.saturating_duration_since(last));

        match elapsed {
            Some(elapsed) if elapsed < self.interval => {
                if self.trailing_pending {
                    ThrottleDecision::Suppressed
                } else {
                    self.trailing_pending = true;
                    ThrottleDecision::Deferred(self.interval - elapsed)
                }
            }
            _ => {
                self.last_run = Some(now);
                self.trailing_pending = false;
                ThrottleDecision::RunNow
            }
        }
    }

    /// Record that the deferred run happened.
    pub fn complete_trailing(&mut self, now: Instant) {
        self.last_run = Some(now);
        self.trailing_pending = false;
    }

    pub fn has_trailing(&self) -> bool {
        self.trailing_pending
    }
}
