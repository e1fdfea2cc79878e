use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<FeedMetrics>,
}

/// Counters for one feed or display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMetrics {
    pub ingested: u64,
    pub rejected: u64,
    pub duplicates: u64,
    pub resets: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(FeedMetrics::default()),
        }
    }

    pub fn record_ingested(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.ingested += 1;
        }
    }

    pub fn record_rejected(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rejected += 1;
        }
    }

    pub fn record_duplicate(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.duplicates += 1;
        }
    }

    pub fn record_reset(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.resets += 1;
        }
    }

    pub fn snapshot(&self) -> FeedMetrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
