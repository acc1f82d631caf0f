use std::time::{Duration, Instant};

/// Debounces writes of the action tree: a save fires once `delay` has passed
/// without further changes.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    delay: Duration,
    dirty_since: Option<Instant>,
}

impl SaveDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            dirty_since: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// When the pending save becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.dirty_since.map(|t| t + self.delay)
    }

    pub fn due(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.dirty_since = None;
                true
            }
            _ => false,
        }
    }

    pub fn flush(&mut self) -> bool {
        self.dirty_since.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_touch_pushes_deadline() {
        let start = Instant::now();
        let mut d = SaveDebouncer::new(Duration::from_millis(100));
        d.touch(start);
        d.touch(start + Duration::from_millis(80));
        assert!(!d.due(start + Duration::from_millis(120)));
        assert!(d.due(start + Duration::from_millis(180)));
        assert!(!d.is_pending());
    }
}
