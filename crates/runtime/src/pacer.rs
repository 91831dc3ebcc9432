use std::time::{Duration, Instant};

/// Sleeps out the remainder of a fixed interval.
///
/// Deadlines advance by whole intervals so short oversleeps do not
/// accumulate. When a cycle overruns, the schedule restarts from now instead
/// of trying to catch up.
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Option<Duration>,
    next: Instant,
    overruns: u64,
}

impl Pacer {
    /// `None` never sleeps.
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            next: Instant::now() + interval.unwrap_or_default(),
            overruns: 0,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Cycles that finished after their deadline.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Block until the current cycle's deadline.
    pub fn wait(&mut self) {
        let Some(interval) = self.interval else {
            std::thread::yield_now();
            return;
        };
        let now = Instant::now();
        if now < self.next {
            std::thread::sleep(self.next - now);
            self.next += interval;
        } else {
            self.overruns += 1;
            self.next = now + interval;
        }
    }
}
