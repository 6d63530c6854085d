use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Minimum interval between accepted rescan triggers.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(10);

/// Drops triggers that arrive within `window` of the last accepted one.
///
/// Dropped triggers are not rescheduled: a burst yields one rescan at its start,
/// and changes right after the window closes wait for the next event.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true if a rescan should run for a trigger observed at `now`.
    pub fn try_trigger(&self, now: Instant) -> bool {
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = *last {
            if now.saturating_duration_since(previous) < self.window {
                return false;
            }
        }
        *last = Some(now);
        true
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}
