use std::time::{Duration, Instant};

pub const PING_INTERVAL: Duration = Duration::from_secs(5);
pub const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Tracks whether a WebSocket peer still answers our pings.
pub struct Heartbeat {
    last_pong: Instant,
    timeout: Duration,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::with_timeout(PONG_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            last_pong: Instant::now(),
            timeout,
        }
    }

    pub fn record_pong(&mut self) {
        self.last_pong = Instant::now();
    }

    pub fn is_alive_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_pong) < self.timeout
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive_at(Instant::now())
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}
