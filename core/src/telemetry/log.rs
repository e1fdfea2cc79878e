use log::{info, warn};
use std::collections::VecDeque;

/// Owned activity log: forwards to `log` and keeps the most recent lines
/// for display.
#[derive(Debug, Clone)]
pub struct LogManager {
    recent: VecDeque<String>,
    capacity: usize,
}

impl LogManager {
    pub fn new() -> Self {
        Self::with_capacity(20)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.push(message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.push(message);
    }

    /// Oldest first.
    pub fn recent(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.recent.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    fn push(&mut self, message: String) {
        if self.capacity == 0 {
            return;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_most_recent_lines() {
        let mut log = LogManager::with_capacity(2);
        log.record("one");
        log.warn("two");
        log.record("three");
        let lines: Vec<&str> = log.recent().collect();
        assert_eq!(lines, vec!["two", "three"]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut log = LogManager::with_capacity(0);
        log.record("dropped");
        assert!(log.is_empty());
    }
}
