use foundation::TimestampMs;

/// Holds the latest value until it has been quiet for `delay_ms`.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<(TimestampMs, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Replaces any pending value and restarts the quiet period.
    pub fn schedule(&mut self, value: T, now: TimestampMs) {
        self.pending = Some((now.saturating_add(self.delay_ms), value));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<TimestampMs> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Takes the pending value once its deadline has passed.
    pub fn poll(&mut self, now: TimestampMs) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if now >= *deadline => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::Debouncer;

    #[test]
    fn fires_after_quiet_period() {
        let mut d = Debouncer::new(300);
        d.schedule("a", 1_000);
        assert_eq!(d.poll(1_299), None);
        assert_eq!(d.poll(1_300), Some("a"));
        assert!(!d.is_pending());
    }

    #[test]
    fn reschedule_restarts_timer() {
        let mut d = Debouncer::new(300);
        d.schedule("a", 1_000);
        d.schedule("ab", 1_200);
        assert_eq!(d.poll(1_350), None);
        assert_eq!(d.deadline(), Some(1_500));
        assert_eq!(d.poll(1_500), Some("ab"));
    }

    #[test]
    fn cancel_returns_pending() {
        let mut d = Debouncer::new(10);
        assert_eq!(d.cancel(), None::<&str>);
        d.schedule("x", 0);
        assert_eq!(d.cancel(), Some("x"));
        assert_eq!(d.poll(100), None);
    }
}
