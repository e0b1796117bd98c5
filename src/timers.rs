use std::time::{Duration, Instant};

/// Deadline that is re-armed on every accepted key press; once it passes,
/// the pending token history is considered stale.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl IdleTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Push the deadline out by the configured delay from now.
    pub fn rearm(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    /// True once the deadline has passed. Never true while disarmed.
    pub fn expired(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time until expiry, `None` while disarmed.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Applies to the next `rearm`; an armed deadline keeps its instant.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }
}

/// Cooldown engaged after a sequence fires. While active every incoming key
/// event is dropped outright. There is no early cancel: once engaged the
/// window runs its full delay.
#[derive(Debug, Clone)]
pub struct BlockingWindow {
    delay: Duration,
    until: Option<Instant>,
}

impl BlockingWindow {
    pub fn new(delay: Duration) -> Self {
        Self { delay, until: None }
    }

    /// Engage the window for the configured delay starting now.
    pub fn engage(&mut self) {
        self.until = Some(Instant::now() + self.delay);
    }

    pub fn is_active(&self) -> bool {
        self.until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    /// Time left in the current window, `None` when inactive.
    pub fn time_remaining(&self) -> Option<Duration> {
        let until = self.until?;
        let now = Instant::now();
        if now < until {
            Some(until - now)
        } else {
            None
        }
    }

    /// Applies to the next `engage`; an active window keeps its deadline.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }
}
