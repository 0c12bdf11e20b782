use std::time::{Duration, Instant};

/// Quiet period before a dirty buffer is written out.
pub const DEFAULT_QUIET: Duration = Duration::from_secs(1);

/// Deadline-based debounce: each `touch` pushes the deadline out, so a save
/// only happens once edits pause for the whole quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET)
    }
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_supersedes_earlier_deadline() {
        let start = Instant::now();
        let mut d = Debouncer::default();
        d.touch(start);
        d.touch(start + Duration::from_millis(800));

        assert!(!d.due(start + Duration::from_millis(1200)));
        assert!(d.due(start + Duration::from_millis(1800)));
    }

    #[test]
    fn idle_debouncer_is_never_due() {
        let d = Debouncer::new(Duration::ZERO);
        assert!(!d.is_pending());
        assert!(!d.due(Instant::now()));
    }

    #[test]
    fn clear_cancels_pending_save() {
        let now = Instant::now();
        let mut d = Debouncer::new(Duration::ZERO);
        d.touch(now);
        assert!(d.due(now));
        d.clear();
        assert!(!d.due(now));
    }
}
