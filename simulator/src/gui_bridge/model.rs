use radarcore::interface::{RadarFrame, TelemetryFrame};
use radarcore::telemetry::FeedMetrics;
use serde::{Deserialize, Serialize};

/// Latest raw frame served to displays that run their own session.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedSnapshot {
    /// Increases by one per accepted frame; zero before the first.
    pub sequence: u64,
    pub frame: Option<TelemetryFrame>,
}

/// Output of the bridge's own session for lightweight clients.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RadarSnapshot {
    pub sequence: u64,
    pub radar: Option<RadarFrame>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsSnapshot {
    pub metrics: FeedMetrics,
    pub tracked_entities: usize,
    pub notes: Vec<String>,
}
