use crate::generator::profile::FeedGenerator;
use crate::gui_bridge::model::{FeedSnapshot, MetricsSnapshot, RadarSnapshot};
use log::{error, info, warn};
use radarcore::interface::{RadarFrame, TelemetryFrame};
use radarcore::telemetry::{LogManager, MetricsRecorder};
use radarcore::{EngineConfig, EngineResult, UpdateSession};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    thread,
    time::Duration,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, hyper::body::Bytes, Filter};

const MAX_FRAME_BYTES: u64 = 1 << 20;

pub fn gui_bind_address(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

struct HubState {
    sequence: u64,
    frame: Option<TelemetryFrame>,
    radar: Option<RadarFrame>,
    session: UpdateSession,
    log: LogManager,
}

/// Shared feed state behind the HTTP routes; frames are applied one at a time.
pub struct FeedHub {
    state: Mutex<HubState>,
    metrics: MetricsRecorder,
}

impl FeedHub {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        Ok(Self {
            state: Mutex::new(HubState {
                sequence: 0,
                frame: None,
                radar: None,
                session: UpdateSession::new(config)?,
                log: LogManager::new(),
            }),
            metrics: MetricsRecorder::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validates and applies a frame; returns its sequence number.
    pub fn push(&self, frame: TelemetryFrame) -> EngineResult<u64> {
        if let Err(err) = frame.validate() {
            self.reject(&err.to_string());
            return Err(err);
        }
        let mut state = self.lock();
        let radar = state.session.ingest(&frame);
        state.sequence += 1;
        state.frame = Some(frame);
        state.radar = Some(radar);
        self.metrics.record_ingested();
        Ok(state.sequence)
    }

    pub fn push_bytes(&self, body: &[u8]) -> EngineResult<u64> {
        match TelemetryFrame::from_slice(body) {
            Ok(frame) => self.push(frame),
            Err(err) => {
                self.reject(&err.to_string());
                Err(err)
            }
        }
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        state.session.reset();
        state.radar = None;
        state.log.record("session reset on request");
        self.metrics.record_reset();
    }

    pub fn feed_snapshot(&self) -> FeedSnapshot {
        let state = self.lock();
        FeedSnapshot {
            sequence: state.sequence,
            frame: state.frame.clone(),
        }
    }

    pub fn radar_snapshot(&self) -> RadarSnapshot {
        let state = self.lock();
        RadarSnapshot {
            sequence: state.sequence,
            radar: state.radar.clone(),
        }
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        let state = self.lock();
        MetricsSnapshot {
            metrics: self.metrics.snapshot(),
            tracked_entities: state.session.tracked_entities(),
            notes: state.log.recent().map(str::to_string).collect(),
        }
    }

    fn reject(&self, reason: &str) {
        self.metrics.record_rejected();
        self.lock().log.warn(format!("rejected frame: {}", reason));
    }
}

pub fn routes(
    hub: Arc<FeedHub>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let hub_filter = warp::any().map(move || hub.clone());

    let frame_route = warp::path("frame")
        .and(warp::path::end())
        .and(warp::get())
        .and(hub_filter.clone())
        .map(|hub: Arc<FeedHub>| warp::reply::json(&hub.feed_snapshot()));

    let radar_route = warp::path("radar")
        .and(warp::path::end())
        .and(warp::get())
        .and(hub_filter.clone())
        .map(|hub: Arc<FeedHub>| warp::reply::json(&hub.radar_snapshot()));

    let metrics_route = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and(hub_filter.clone())
        .map(|hub: Arc<FeedHub>| warp::reply::json(&hub.metrics_snapshot()));

    let ingest_route = warp::path("ingest")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_FRAME_BYTES))
        .and(warp::body::bytes())
        .and(hub_filter.clone())
        .map(|body: Bytes, hub: Arc<FeedHub>| match hub.push_bytes(&body) {
            Ok(sequence) => warp::reply::with_status(
                warp::reply::json(&json!({"status": "ok", "sequence": sequence})),
                StatusCode::OK,
            ),
            Err(err) => warp::reply::with_status(
                warp::reply::json(&json!({"status": "rejected", "reason": err.to_string()})),
                StatusCode::BAD_REQUEST,
            ),
        });

    let reset_route = warp::path("reset")
        .and(warp::path::end())
        .and(warp::post())
        .and(hub_filter)
        .map(|hub: Arc<FeedHub>| {
            hub.reset();
            warp::reply::json(&json!({"status": "ok"}))
        });

    frame_route
        .or(radar_route)
        .or(metrics_route)
        .or(ingest_route)
        .or(reset_route)
}

async fn run_ticker(hub: Arc<FeedHub>, mut generator: FeedGenerator, update_rate_hz: f64) {
    let period = match Duration::try_from_secs_f64(1.0 / update_rate_hz) {
        Ok(period) if !period.is_zero() => period,
        _ => {
            error!("cannot pace synthetic feed at {} Hz; ticker stopped", update_rate_hz);
            return;
        }
    };
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        if let Err(err) = hub.push(generator.next_frame()) {
            warn!("synthetic frame rejected: {}", err);
        }
    }
}

/// Hosts the feed routes on a background thread.
pub struct GuiBridge {
    hub: Arc<FeedHub>,
}

impl GuiBridge {
    /// Starts serving; with a generator, also publishes synthetic frames at
    /// `update_rate_hz`.
    pub fn spawn(
        hub: Arc<FeedHub>,
        addr: SocketAddr,
        generator: Option<FeedGenerator>,
        update_rate_hz: f64,
    ) -> Self {
        let routes = routes(hub.clone());
        let ticker_hub = hub.clone();

        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                if let Some(generator) = generator {
                    tokio::spawn(run_ticker(ticker_hub, generator, update_rate_hz));
                }
                info!("feed bridge listening on http://{}", addr);
                warp::serve(routes).run(addr).await;
            });
        });

        Self { hub }
    }

    pub fn hub(&self) -> &Arc<FeedHub> {
        &self.hub
    }

    pub fn publish_status(&self, message: &str) {
        println!("[FEED] {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_frames, ScenarioConfig};

    fn hub() -> Arc<FeedHub> {
        Arc::new(FeedHub::new(EngineConfig::default()).unwrap())
    }

    #[test]
    fn hub_sequences_accepted_frames() {
        let hub = hub();
        let frames = build_frames(&ScenarioConfig::default(), 3, 20.0).unwrap();
        for (index, frame) in frames.into_iter().enumerate() {
            assert_eq!(hub.push(frame).unwrap(), index as u64 + 1);
        }
        let snapshot = hub.feed_snapshot();
        assert_eq!(snapshot.sequence, 3);
        assert!(snapshot.frame.is_some());
        assert!(hub.radar_snapshot().radar.is_some());
    }

    #[test]
    fn malformed_frame_leaves_state_untouched() {
        let hub = hub();
        assert!(hub.push_bytes(br#"{"cars": []}"#).is_err());
        assert_eq!(hub.feed_snapshot().sequence, 0);
        let metrics = hub.metrics_snapshot();
        assert_eq!(metrics.metrics.rejected, 1);
        assert_eq!(metrics.notes.len(), 1);
    }

    #[tokio::test]
    async fn ticker_refuses_zero_length_period() {
        let hub = hub();
        let generator = FeedGenerator::new(ScenarioConfig::default(), 20.0).unwrap();
        let ticker = tokio::spawn(run_ticker(hub.clone(), generator, 1e10));
        assert!(ticker.await.is_ok());
        assert_eq!(hub.feed_snapshot().sequence, 0);
    }

    #[tokio::test]
    async fn ingest_route_accepts_and_serves_frames() {
        let hub = hub();
        let api = routes(hub.clone());
        let body = r#"{"player": {"position": {"x": 0, "y": 0, "z": 0}, "yaw": 0.5},
                       "cars": [{"position": {"x": 4, "y": 3, "z": 0}, "class": "LMGT3"}]}"#;

        let response = warp::test::request()
            .method("POST")
            .path("/ingest")
            .body(body)
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = warp::test::request()
            .method("GET")
            .path("/radar")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let snapshot: RadarSnapshot = serde_json::from_slice(response.body()).unwrap();
        let radar = snapshot.radar.unwrap();
        assert_eq!(snapshot.sequence, 1);
        assert_eq!(radar.entities.len(), 1);
        assert!((radar.entities[0].distance_meters - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn ingest_route_rejects_malformed_frames() {
        let hub = hub();
        let api = routes(hub.clone());
        let response = warp::test::request()
            .method("POST")
            .path("/ingest")
            .body(r#"{"player": {"position": {"x": 0, "y": 0, "z": 0}, "yaw": 0}}"#)
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(hub.feed_snapshot().sequence, 0);
    }

    #[tokio::test]
    async fn reset_route_clears_server_session() {
        let hub = hub();
        for frame in build_frames(&ScenarioConfig::default(), 2, 20.0).unwrap() {
            hub.push(frame).unwrap();
        }
        let api = routes(hub.clone());
        let response = warp::test::request()
            .method("POST")
            .path("/reset")
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(hub.radar_snapshot().radar.is_none());
        assert_eq!(hub.metrics_snapshot().metrics.resets, 1);
        assert_eq!(hub.metrics_snapshot().tracked_entities, 0);
    }
}
