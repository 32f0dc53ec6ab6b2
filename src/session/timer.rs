//! Elapsed-time bookkeeping
//!
//! Elapsed time is a wall-clock delta from an anchor instant, never a sum of
//! timer ticks, so a late or dropped tick cannot make the display drift.

use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Source of "now" for the controller
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Tokio's clock (follows paused time in tests)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}

/// Whole-second elapsed time with pause/resume
///
/// While running, `elapsed = frozen + (now - resumed_at)`, which is the same
/// as measuring from a virtual anchor at `resumed_at - frozen`: right after a
/// resume, `now - anchor` equals the time frozen at pause. The frozen value
/// keeps sub-second precision so repeated pauses do not lose time.
#[derive(Debug, Default, Clone)]
pub struct ElapsedTimer {
    running_since: Option<Instant>,
    frozen: Duration,
}

impl ElapsedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin counting from zero at `now`
    pub fn start(&mut self, now: Instant) {
        self.frozen = Duration::ZERO;
        self.running_since = Some(now);
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self.frozen + now.saturating_duration_since(since),
            None => self.frozen,
        }
    }

    /// Current elapsed seconds (floored)
    pub fn sample(&self, now: Instant) -> u64 {
        self.elapsed(now).as_secs()
    }

    /// Freeze at the time elapsed by `now`; a no-op when not running
    pub fn pause(&mut self, now: Instant) -> u64 {
        self.frozen = self.elapsed(now);
        self.running_since = None;
        self.frozen.as_secs()
    }

    /// Continue counting from the frozen value
    pub fn resume(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    pub fn reset(&mut self) {
        self.frozen = Duration::ZERO;
        self.running_since = None;
    }
}
