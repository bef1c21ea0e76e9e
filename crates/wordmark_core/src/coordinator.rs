//! Debouncing of the mouse-up events a selection produces.

use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending { deadline: Instant },
}

/// Two-state debounce machine, the last mouse-up wins.
///
/// The machine does not own a timer, the caller tells it the time on every transition.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    state: DebounceState,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_DELAY)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: DebounceState::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Pending { .. })
    }

    /// Starts, or restarts, the countdown.
    pub fn on_mouse_up(&mut self, now: Instant) {
        self.state = DebounceState::Pending {
            deadline: now + self.delay,
        };
    }

    /// Returns `true` exactly once per countdown, when `now` has reached the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Pending { deadline } if now >= deadline => {
                self.state = DebounceState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Pending { deadline } => Some(deadline),
            DebounceState::Idle => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = DebounceState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_last_mouse_up_wins() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        assert_eq!(debouncer.state(), DebounceState::Idle);
        assert!(!debouncer.poll(start));

        debouncer.on_mouse_up(start);
        assert_eq!(debouncer.deadline(), Some(start + DEFAULT_DEBOUNCE_DELAY));

        let second = start + Duration::from_millis(100);
        assert!(!debouncer.poll(second));
        debouncer.on_mouse_up(second);

        // The first deadline has passed but the countdown was restarted.
        assert!(!debouncer.poll(start + Duration::from_millis(300)));
        assert!(debouncer.poll(second + DEFAULT_DEBOUNCE_DELAY));

        assert_eq!(debouncer.state(), DebounceState::Idle);
        assert!(!debouncer.poll(second + Duration::from_secs(10)));
    }

    #[test]
    fn test_debounce_cancel() {
        let now = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.on_mouse_up(now);
        assert!(debouncer.is_pending());

        debouncer.cancel();
        assert_eq!(debouncer.deadline(), None);
        assert!(!debouncer.poll(now + Duration::from_secs(1)));
    }
}
