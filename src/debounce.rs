//! Debounced delayed task
//!
//! Holds at most one pending deadline. Scheduling again replaces it, so a
//! burst of edits collapses into a single firing once the burst settles.
//! Time is supplied by the caller in milliseconds (`js_sys::Date::now()` in
//! the browser), which keeps the model deterministic under test.

#[derive(Debug, Clone, PartialEq)]
pub struct Debounce {
    delay_ms: f64,
    deadline: Option<f64>,
}

impl Debounce {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(0.0),
            deadline: None,
        }
    }

    /// Cancel any pending deadline and start a new one from `now`
    pub fn schedule(&mut self, now: f64) {
        self.deadline = Some(now + self.delay_ms);
    }

    /// Drop the pending deadline without firing
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Milliseconds left until the pending deadline, if any
    pub fn remaining(&self, now: f64) -> Option<f64> {
        self.deadline.map(|d| (d - now).max(0.0))
    }

    /// Fire if the deadline has passed. Consumes the deadline.
    pub fn fire_if_due(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Consume a pending deadline regardless of time
    pub fn take(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let mut d = Debounce::new(500.0);
        d.schedule(1000.0);
        assert!(!d.fire_if_due(1499.0));
        assert!(d.fire_if_due(1500.0));
        assert!(!d.is_pending());
        assert!(!d.fire_if_due(2000.0));
    }

    #[test]
    fn test_reschedule_restarts_timer() {
        let mut d = Debounce::new(500.0);
        d.schedule(0.0);
        d.schedule(300.0);
        d.schedule(600.0);
        assert!(!d.fire_if_due(1000.0));
        assert_eq!(d.remaining(1000.0), Some(100.0));
        assert!(d.fire_if_due(1100.0));
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let mut d = Debounce::new(500.0);
        d.schedule(0.0);
        d.cancel();
        assert!(!d.fire_if_due(10_000.0));
        assert_eq!(d.remaining(0.0), None);
    }

    #[test]
    fn test_take_consumes_pending() {
        let mut d = Debounce::new(500.0);
        assert!(!d.take());
        d.schedule(0.0);
        assert!(d.take());
        assert!(!d.is_pending());
    }
}
