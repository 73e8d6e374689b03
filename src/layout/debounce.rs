//! Single-flight debounce driven by the caller's tick.

use std::time::Duration;
use tokio::time::Instant;

/// Holds at most one pending value.
///
/// Each `schedule` replaces the pending value and restarts the quiet
/// period; `poll` hands the value out once the period has elapsed.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, value: T) {
        self.schedule_at(value, Instant::now());
    }

    pub fn schedule_at(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.delay, value));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Take the pending value if its quiet period is over
    pub fn poll(&mut self) -> Option<T> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> Option<T> {
        let due = matches!(&self.pending, Some((deadline, _)) if now >= *deadline);
        if due {
            self.pending.take().map(|(_, value)| value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(150);

    #[test]
    fn test_fires_once_after_quiet_period() {
        let mut debouncer = Debouncer::new(QUIET);
        let t0 = Instant::now();
        debouncer.schedule_at(800, t0);

        assert_eq!(debouncer.poll_at(t0 + Duration::from_millis(149)), None);
        assert_eq!(debouncer.poll_at(t0 + QUIET), Some(800));
        assert_eq!(debouncer.poll_at(t0 + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_burst_yields_last_value_only() {
        let mut debouncer = Debouncer::new(QUIET);
        let t0 = Instant::now();
        for (i, width) in [500, 700, 900, 1300].into_iter().enumerate() {
            let at = t0 + Duration::from_millis(100 * i as u64);
            assert_eq!(debouncer.poll_at(at), None);
            debouncer.schedule_at(width, at);
        }

        let last = t0 + Duration::from_millis(300);
        assert_eq!(debouncer.deadline(), Some(last + QUIET));
        assert_eq!(debouncer.poll_at(last + Duration::from_millis(100)), None);
        assert_eq!(debouncer.poll_at(last + QUIET), Some(1300));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_cancel() {
        let mut debouncer = Debouncer::new(QUIET);
        let t0 = Instant::now();
        debouncer.schedule_at((), t0);
        debouncer.cancel();
        assert_eq!(debouncer.poll_at(t0 + QUIET), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_runtime_clock() {
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.schedule("resize");
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(debouncer.poll(), None);

        tokio::time::advance(Duration::from_millis(60)).await;
        assert_eq!(debouncer.poll(), Some("resize"));
    }
}
