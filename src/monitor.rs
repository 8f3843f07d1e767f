//! Drop performance monitor.
//!
//! Keeps a bounded history of how long each drop took from acceptance to
//! placement (or failure) and warns about slow ones.

#[cfg(test)]
#[path = "monitor_test.rs"]
mod monitor_test;

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, warn};

use crate::consts::{DROP_HISTORY_LIMIT, SLOW_DROP_MS};

/// One finished drop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropRecord {
    pub duration: Duration,
    pub success: bool,
}

/// Aggregates over the retained history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropStats {
    pub total: usize,
    pub failures: usize,
    pub average_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug)]
pub struct DropMonitor {
    history: VecDeque<DropRecord>,
    limit: usize,
}

impl Default for DropMonitor {
    fn default() -> Self {
        Self::with_limit(DROP_HISTORY_LIMIT)
    }
}

impl DropMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self { history: VecDeque::with_capacity(limit.min(DROP_HISTORY_LIMIT)), limit: limit.max(1) }
    }

    /// Record a finished drop, evicting the oldest record when full.
    pub fn record(&mut self, duration: Duration, success: bool) {
        let ms = duration.as_secs_f64() * 1000.0;
        if ms > SLOW_DROP_MS {
            warn!(duration_ms = ms, success, "slow image drop");
        } else {
            debug!(duration_ms = ms, success, "image drop finished");
        }
        if self.history.len() == self.limit {
            self.history.pop_front();
        }
        self.history.push_back(DropRecord { duration, success });
    }

    /// Records oldest first.
    pub fn history(&self) -> impl Iterator<Item = &DropRecord> {
        self.history.iter()
    }

    /// Aggregates, or `None` when nothing has been recorded.
    #[must_use]
    pub fn stats(&self) -> Option<DropStats> {
        if self.history.is_empty() {
            return None;
        }
        let millis: Vec<f64> = self.history.iter().map(|r| r.duration.as_secs_f64() * 1000.0).collect();
        let sum: f64 = millis.iter().sum();
        #[allow(clippy::cast_precision_loss)]
        let average_ms = sum / millis.len() as f64;
        Some(DropStats {
            total: self.history.len(),
            failures: self.history.iter().filter(|r| !r.success).count(),
            average_ms,
            min_ms: millis.iter().copied().fold(f64::INFINITY, f64::min),
            max_ms: millis.iter().copied().fold(0.0, f64::max),
        })
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
