//! Transport link tracking, kept apart from the projection engine.
//!
//! The monitor only decides *when* a session must be reset; owning the
//! session and calling `reset()` stays with the caller.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BASE_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// Transport events that drive the link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// A connection or poll attempt started.
    Attempt,
    /// A frame arrived.
    Delivered,
    /// The attempt failed or the connection closed.
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTransition {
    pub from: LinkState,
    pub to: LinkState,
    /// Continuity state must be cleared before the next frame is ingested.
    pub reset_required: bool,
}

/// Verdict on an incoming frame sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceVerdict {
    /// Newer than anything seen; ingest it.
    Fresh,
    /// Already ingested; skip it.
    Duplicate,
    /// Older than the last one; the source restarted, reset before ingesting.
    Rewound,
}

#[derive(Debug, Clone)]
pub struct LinkMonitor {
    state: LinkState,
    failed_attempts: u32,
    last_sequence: Option<u64>,
}

impl Default for LinkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkMonitor {
    pub fn new() -> Self {
        Self {
            state: LinkState::Disconnected,
            failed_attempts: 0,
            last_sequence: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn handle(&mut self, event: LinkEvent) -> LinkTransition {
        let from = self.state;
        let to = match (from, event) {
            (LinkState::Connected, LinkEvent::Attempt) => LinkState::Connected,
            (_, LinkEvent::Attempt) => LinkState::Connecting,
            (_, LinkEvent::Delivered) => LinkState::Connected,
            (_, LinkEvent::Dropped) => LinkState::Disconnected,
        };

        match (from, to) {
            (LinkState::Connected, LinkState::Connected) => {}
            (_, LinkState::Connected) => {
                info!(
                    "telemetry link up after {} failed attempts",
                    self.failed_attempts
                );
                self.failed_attempts = 0;
                self.last_sequence = None;
            }
            (LinkState::Connected, LinkState::Disconnected) => {
                warn!("telemetry link lost");
                self.failed_attempts = 1;
            }
            (_, LinkState::Disconnected) => {
                self.failed_attempts = self.failed_attempts.saturating_add(1);
            }
            _ => {}
        }

        self.state = to;
        LinkTransition {
            from,
            to,
            reset_required: to == LinkState::Connected && from != LinkState::Connected,
        }
    }

    /// Delay before the next attempt while disconnected; doubles per failure.
    pub fn retry_delay(&self) -> Duration {
        if self.state != LinkState::Disconnected || self.failed_attempts == 0 {
            return Duration::ZERO;
        }
        let shift = (self.failed_attempts - 1).min(16);
        BASE_RETRY_DELAY
            .saturating_mul(1u32 << shift)
            .min(MAX_RETRY_DELAY)
    }

    /// Classifies a frame sequence number and remembers fresh ones.
    pub fn accept_sequence(&mut self, sequence: u64) -> SequenceVerdict {
        let verdict = match self.last_sequence {
            None => SequenceVerdict::Fresh,
            Some(last) if sequence > last => SequenceVerdict::Fresh,
            Some(last) if sequence == last => SequenceVerdict::Duplicate,
            Some(_) => SequenceVerdict::Rewound,
        };
        if verdict != SequenceVerdict::Duplicate {
            self.last_sequence = Some(sequence);
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_delivery_requires_reset() {
        let mut monitor = LinkMonitor::new();
        let attempt = monitor.handle(LinkEvent::Attempt);
        assert_eq!(attempt.to, LinkState::Connecting);
        assert!(!attempt.reset_required);
        let up = monitor.handle(LinkEvent::Delivered);
        assert_eq!(up.to, LinkState::Connected);
        assert!(up.reset_required);
    }

    #[test]
    fn steady_delivery_does_not_reset() {
        let mut monitor = LinkMonitor::new();
        monitor.handle(LinkEvent::Delivered);
        monitor.handle(LinkEvent::Attempt);
        let transition = monitor.handle(LinkEvent::Delivered);
        assert_eq!(transition.from, LinkState::Connected);
        assert!(!transition.reset_required);
    }

    #[test]
    fn reconnect_after_drop_requires_reset() {
        let mut monitor = LinkMonitor::new();
        monitor.handle(LinkEvent::Delivered);
        let down = monitor.handle(LinkEvent::Dropped);
        assert_eq!(down.to, LinkState::Disconnected);
        monitor.handle(LinkEvent::Attempt);
        assert!(monitor.handle(LinkEvent::Delivered).reset_required);
    }

    #[test]
    fn retry_delay_backs_off_and_caps() {
        let mut monitor = LinkMonitor::new();
        assert_eq!(monitor.retry_delay(), Duration::ZERO);
        monitor.handle(LinkEvent::Dropped);
        assert_eq!(monitor.retry_delay(), Duration::from_millis(500));
        monitor.handle(LinkEvent::Dropped);
        assert_eq!(monitor.retry_delay(), Duration::from_secs(1));
        for _ in 0..10 {
            monitor.handle(LinkEvent::Dropped);
        }
        assert_eq!(monitor.retry_delay(), Duration::from_secs(5));
        monitor.handle(LinkEvent::Delivered);
        assert_eq!(monitor.failed_attempts(), 0);
    }

    #[test]
    fn sequence_guard_skips_duplicates_and_flags_rewinds() {
        let mut monitor = LinkMonitor::new();
        assert_eq!(monitor.accept_sequence(5), SequenceVerdict::Fresh);
        assert_eq!(monitor.accept_sequence(5), SequenceVerdict::Duplicate);
        assert_eq!(monitor.accept_sequence(9), SequenceVerdict::Fresh);
        assert_eq!(monitor.accept_sequence(2), SequenceVerdict::Rewound);
        assert_eq!(monitor.accept_sequence(3), SequenceVerdict::Fresh);
    }

    #[test]
    fn reconnect_forgets_sequence() {
        let mut monitor = LinkMonitor::new();
        monitor.handle(LinkEvent::Delivered);
        monitor.accept_sequence(40);
        monitor.handle(LinkEvent::Dropped);
        monitor.handle(LinkEvent::Delivered);
        assert_eq!(monitor.accept_sequence(1), SequenceVerdict::Fresh);
    }
}
