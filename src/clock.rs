use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Monotonic time source, measured from an arbitrary origin
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated clock for tests; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.lock().map(|now| *now).unwrap_or_default()
    }
}

/// Cancellable one-second schedule.
///
/// `poll` reports how many whole seconds have passed since the last poll;
/// a cancelled ticker reports none, so a late tick cannot reach a discarded
/// session.
pub struct SecondTicker {
    clock: Arc<dyn Clock>,
    armed_at: Option<Duration>,
    delivered: u64,
}

impl SecondTicker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            armed_at: None,
            delivered: 0,
        }
    }

    pub fn arm(&mut self) {
        self.armed_at = Some(self.clock.now());
        self.delivered = 0;
    }

    pub fn cancel(&mut self) {
        self.armed_at = None;
        self.delivered = 0;
    }

    pub fn poll(&mut self) -> u64 {
        let Some(armed_at) = self.armed_at else {
            return 0;
        };
        let due = self.clock.now().saturating_sub(armed_at).as_secs();
        let fresh = due.saturating_sub(self.delivered);
        self.delivered = due;
        fresh
    }
}

impl std::fmt::Debug for SecondTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondTicker")
            .field("armed_at", &self.armed_at)
            .field("delivered", &self.delivered)
            .finish()
    }
}
