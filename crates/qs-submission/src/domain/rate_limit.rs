//! # Rate Limiter
//!
//! Sliding window over one shared timeline. Retries always pass and never
//! consume quota.

use crate::domain::config::RateLimitSetting;
use crate::ports::outbound::{TimeSource, Timestamp};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Process-scoped sliding-window limiter.
pub struct RateLimiter {
    time_source: Arc<dyn TimeSource>,
    timeline: Mutex<VecDeque<Timestamp>>,
}

impl RateLimiter {
    pub fn new(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            time_source,
            timeline: Mutex::new(VecDeque::new()),
        }
    }

    /// Admission check. Does not record.
    pub fn admit(&self, setting: &RateLimitSetting, is_retry: bool) -> bool {
        let window = match setting {
            RateLimitSetting::Disabled => return true,
            RateLimitSetting::Enabled(window) => window,
        };
        if is_retry {
            return true;
        }

        let mut timeline = self.timeline.lock();
        prune(&mut timeline, self.time_source.now(), window.window_ms);
        timeline.len() < window.max
    }

    /// Record a successful submission at `now`.
    ///
    /// The timeline never holds more than `max` entries inside the window.
    pub fn record(&self, setting: &RateLimitSetting) {
        let RateLimitSetting::Enabled(window) = setting else {
            return;
        };

        let now = self.time_source.now();
        let mut timeline = self.timeline.lock();
        prune(&mut timeline, now, window.window_ms);
        timeline.push_back(now);
        while timeline.len() > window.max {
            timeline.pop_front();
        }
    }

    /// Timestamps currently held.
    pub fn len(&self) -> usize {
        self.timeline.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.lock().is_empty()
    }

    /// Drop the whole timeline.
    pub fn reset(&self) {
        self.timeline.lock().clear();
    }
}

fn prune(timeline: &mut VecDeque<Timestamp>, now: Timestamp, window_ms: u64) {
    let cutoff = now.saturating_sub(window_ms);
    while timeline.front().is_some_and(|&t| t <= cutoff) {
        timeline.pop_front();
    }
}
