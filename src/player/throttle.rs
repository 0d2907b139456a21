//! Frame throttle for scroll samples
//!
//! Scroll sources fire far more often than a frame. The throttle lets at most
//! one ratio through per interval and keeps the newest sample seen in
//! between, so the final position of a burst is never lost.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: Option<f64>,
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Offer a sample taken at `now`. Returns the ratio to act on, if any.
    pub fn offer(&mut self, ratio: f64, now: Instant) -> Option<f64> {
        self.pending = Some(ratio);
        self.poll(now)
    }

    /// Release the held sample once the interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<f64> {
        let due = match self.last_emit {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if !due {
            return None;
        }
        let ratio = self.pending.take()?;
        self.last_emit = Some(now);
        Some(ratio)
    }

    /// Release the held sample regardless of timing (end of a burst).
    pub fn flush(&mut self) -> Option<f64> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Run a recorded burst through the throttle, one sample every `spacing`
    /// from `start`, then flush. Returns the ratios that get through, in order.
    pub fn coalesce(&mut self, ratios: &[f64], spacing: Duration, start: Instant) -> Vec<f64> {
        // A gap of one interval or more already lets every sample through.
        let step = spacing.min(self.interval);
        let mut passed = Vec::with_capacity(ratios.len());
        let mut at = Some(start);

        for &ratio in ratios {
            match at {
                Some(now) => passed.extend(self.offer(ratio, now)),
                // Beyond the clock's range every gap is past the interval
                None => {
                    self.pending = None;
                    passed.push(ratio);
                }
            }
            at = at.and_then(|now| now.checked_add(step));
        }

        passed.extend(self.flush());
        passed
    }
}
