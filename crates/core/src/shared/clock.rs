use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Local};

/// Source of wall-clock time for the time-windowed policies.
///
/// Injected so cooldown and throttle logic can be driven deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The real local clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Hand-advanced clock for tests and replays.
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += chrono::Duration::microseconds(by.as_micros() as i64);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Time from `earlier` to `later`; zero if the clock went backwards.
pub fn elapsed_between(earlier: DateTime<Local>, later: DateTime<Local>) -> Duration {
    (later - earlier).to_std().unwrap_or(Duration::ZERO)
}
