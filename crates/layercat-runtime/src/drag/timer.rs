#![forbid(unsafe_code)]

//! Dwell timer behind drag auto-expand.
//!
//! The timer is armed for one [`ExpansionKey`] at a time. Re-arming for the
//! same key keeps the original deadline, so continuous hovering over one node
//! counts from the first hover; arming for a different key restarts it.
//! Nothing here reads the clock: callers pass `now`.

use std::fmt;
use std::time::Duration;

use web_time::Instant;

use layercat_core::ExpansionKey;

/// Invoked with the key whose dwell elapsed.
pub type FireCallback = Box<dyn FnMut(&ExpansionKey)>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Armed {
    key: ExpansionKey,
    deadline: Instant,
}

/// Cancellable one-shot timer keyed by target identity.
pub struct AutoExpandTimer {
    delay: Duration,
    armed: Option<Armed>,
    on_fire: Option<FireCallback>,
}

impl fmt::Debug for AutoExpandTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoExpandTimer")
            .field("delay", &self.delay)
            .field("armed", &self.armed)
            .field("has_callback", &self.on_fire.is_some())
            .finish()
    }
}

impl AutoExpandTimer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            armed: None,
            on_fire: None,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start counting toward `key`. Returns `false` if the timer was already
    /// armed for `key` (deadline unchanged).
    pub fn arm(&mut self, key: ExpansionKey, now: Instant) -> bool {
        if self.armed.as_ref().is_some_and(|armed| armed.key == key) {
            return false;
        }
        tracing::trace!(message = "drag.timer.arm", key = ?key, delay_ms = self.delay.as_millis() as u64);
        self.armed = Some(Armed {
            key,
            deadline: now + self.delay,
        });
        true
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        if let Some(armed) = self.armed.take() {
            tracing::trace!(message = "drag.timer.cancel", key = ?armed.key);
        }
    }

    #[must_use]
    pub fn armed_key(&self) -> Option<&ExpansionKey> {
        self.armed.as_ref().map(|armed| &armed.key)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|armed| armed.deadline)
    }

    /// Replace the fire callback. An armed deadline is left alone.
    pub fn set_callback(&mut self, callback: FireCallback) {
        self.on_fire = Some(callback);
    }

    pub fn clear_callback(&mut self) {
        self.on_fire = None;
    }

    /// Fire if the deadline has passed: disarms, runs the callback, and
    /// returns the key.
    pub fn poll(&mut self, now: Instant) -> Option<ExpansionKey> {
        let due = self.armed.as_ref().is_some_and(|armed| now >= armed.deadline);
        if !due {
            return None;
        }
        let armed = self.armed.take()?;
        if let Some(callback) = self.on_fire.as_mut() {
            callback(&armed.key);
        }
        Some(armed.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DELAY: Duration = Duration::from_millis(600);

    #[test]
    fn fires_after_delay_only() {
        let start = Instant::now();
        let mut timer = AutoExpandTimer::new(DELAY);
        timer.arm(ExpansionKey::group("Imagery"), start);
        assert_eq!(timer.poll(start + Duration::from_millis(599)), None);
        assert_eq!(
            timer.poll(start + DELAY),
            Some(ExpansionKey::group("Imagery"))
        );
        assert!(timer.armed_key().is_none());
        assert_eq!(timer.poll(start + DELAY * 2), None);
    }

    #[test]
    fn rearming_same_key_keeps_deadline() {
        let start = Instant::now();
        let mut timer = AutoExpandTimer::new(DELAY);
        assert!(timer.arm(ExpansionKey::Ungrouped, start));
        assert!(!timer.arm(ExpansionKey::Ungrouped, start + Duration::from_millis(400)));
        assert_eq!(timer.deadline(), Some(start + DELAY));
    }

    #[test]
    fn new_key_restarts() {
        let start = Instant::now();
        let mut timer = AutoExpandTimer::new(DELAY);
        timer.arm(ExpansionKey::group("A"), start);
        let later = start + Duration::from_millis(500);
        assert!(timer.arm(ExpansionKey::group("B"), later));
        assert_eq!(timer.poll(start + DELAY), None);
        assert_eq!(timer.poll(later + DELAY), Some(ExpansionKey::group("B")));
    }

    #[test]
    fn cancel_prevents_fire() {
        let start = Instant::now();
        let mut timer = AutoExpandTimer::new(DELAY);
        timer.arm(ExpansionKey::BaseLayers, start);
        timer.cancel();
        assert_eq!(timer.poll(start + DELAY), None);
    }

    #[test]
    fn callback_swap_does_not_reset_deadline() {
        let start = Instant::now();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut timer = AutoExpandTimer::new(DELAY);
        timer.set_callback(Box::new(|_: &ExpansionKey| panic!("stale callback")));
        timer.arm(ExpansionKey::group("A"), start);

        let sink = Rc::clone(&fired);
        timer.set_callback(Box::new(move |key: &ExpansionKey| sink.borrow_mut().push(key.clone())));
        assert_eq!(timer.deadline(), Some(start + DELAY));

        timer.poll(start + DELAY);
        assert_eq!(*fired.borrow(), vec![ExpansionKey::group("A")]);
    }
}
