use iced::{
    mouse, time,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, text_input, Column, Container,
    },
    Alignment, Color, Element, Length, Pixels, Point, Rectangle, Renderer, Subscription, Task,
    Theme,
};
use radarcore::geometry::GeometryKernel;
use radarcore::interface::{RadarFrame, TelemetryFrame};
use radarcore::link::{LinkEvent, LinkMonitor, LinkState, SequenceVerdict};
use radarcore::telemetry::{LogManager, MetricsRecorder};
use radarcore::{EngineConfig, UpdateSession};
use serde::Deserialize;
use std::time::{Duration, Instant};

const FEED_URL: &str = "http://127.0.0.1:9000";
const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// A stalled feed counts as dropped after this long.
const REQUEST_TIMEOUT: Duration = Duration::from_millis(500);
/// Car footprint in metres (width, length).
const CAR_SIZE: (f32, f32) = (2.0, 4.6);

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Racing Radar".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(POLL_INTERVAL).map(|_| Message::Tick)
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

struct Visualizer {
    config: ConfigForm,
    session: UpdateSession,
    monitor: LinkMonitor,
    radar: Option<RadarFrame>,
    status: String,
    log: LogManager,
    metrics: MetricsRecorder,
    in_flight: bool,
    next_attempt: Option<Instant>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    FrameFetched(Result<FeedPayload, String>),
    ConfigFieldChanged(ConfigField, String),
    ApplyConfig,
    ResetSession,
    ResetFeed,
    FeedReset(Result<String, String>),
}

#[derive(Debug, Clone, Copy)]
enum ConfigField {
    Radius,
    PixelRadius,
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let config = EngineConfig::default();
        let session =
            UpdateSession::new(config.clone()).expect("default radar configuration is valid");
        (
            Visualizer {
                config: ConfigForm::from_config(&config),
                session,
                monitor: LinkMonitor::new(),
                radar: None,
                status: "Waiting for telemetry...".into(),
                log: LogManager::with_capacity(20),
                metrics: MetricsRecorder::new(),
                in_flight: false,
                next_attempt: None,
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                if state.in_flight {
                    return Task::none();
                }
                if let Some(at) = state.next_attempt {
                    if Instant::now() < at {
                        return Task::none();
                    }
                }
                state.monitor.handle(LinkEvent::Attempt);
                state.in_flight = true;
                Task::perform(fetch_frame(), Message::FrameFetched)
            }
            Message::FrameFetched(Ok(payload)) => {
                state.in_flight = false;
                state.next_attempt = None;
                let transition = state.monitor.handle(LinkEvent::Delivered);
                if transition.reset_required {
                    state.reset_session("telemetry link up, continuity reset");
                }
                state.apply_payload(payload);
                Task::none()
            }
            Message::FrameFetched(Err(err)) => {
                state.in_flight = false;
                let transition = state.monitor.handle(LinkEvent::Dropped);
                if transition.from == LinkState::Connected {
                    state.log.warn(format!("telemetry link lost: {err}"));
                }
                let delay = state.monitor.retry_delay();
                state.next_attempt = Some(Instant::now() + delay);
                state.status = format!(
                    "Telemetry unavailable, retrying in {:.1} s",
                    delay.as_secs_f32()
                );
                Task::none()
            }
            Message::ConfigFieldChanged(field, value) => {
                state.config.update_field(field, value);
                Task::none()
            }
            Message::ApplyConfig => {
                match state
                    .config
                    .to_engine_config()
                    .and_then(|config| UpdateSession::new(config).map_err(|e| e.to_string()))
                {
                    Ok(session) => {
                        let config = session.config().clone();
                        state.session = session;
                        state.radar = None;
                        state.log.record(format!(
                            "radar radius {:.0} m at {:.0} px",
                            config.radius_meters, config.pixel_radius
                        ));
                    }
                    Err(err) => state.status = format!("Config error: {err}"),
                }
                Task::none()
            }
            Message::ResetSession => {
                state.reset_session("continuity reset by operator");
                Task::none()
            }
            Message::ResetFeed => Task::perform(post_reset(), Message::FeedReset),
            Message::FeedReset(Ok(message)) => {
                state.log.record(message);
                Task::none()
            }
            Message::FeedReset(Err(err)) => {
                state.status = format!("Feed reset failed: {err}");
                Task::none()
            }
        }
    }

    fn apply_payload(&mut self, payload: FeedPayload) {
        let Some(frame) = payload.frame else {
            self.status = "Connected, waiting for first frame...".into();
            return;
        };

        match self.monitor.accept_sequence(payload.sequence) {
            SequenceVerdict::Duplicate => {
                self.metrics.record_duplicate();
                return;
            }
            SequenceVerdict::Rewound => self.reset_session("feed restarted, continuity reset"),
            SequenceVerdict::Fresh => {}
        }

        if let Err(err) = frame.validate() {
            self.metrics.record_rejected();
            self.log.warn(format!("frame {} rejected: {err}", payload.sequence));
            return;
        }

        let radar = self.session.ingest(&frame);
        self.metrics.record_ingested();
        self.status = format!(
            "Frame {}: {} of {} cars on radar",
            payload.sequence,
            radar.len(),
            frame.cars.len()
        );
        self.radar = Some(radar);
    }

    fn reset_session(&mut self, reason: &str) {
        self.session.reset();
        self.radar = None;
        self.metrics.record_reset();
        self.log.record(reason);
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let metrics = state.metrics.snapshot();
        let engine = state.session.config();

        let link_label = match state.monitor.state() {
            LinkState::Connected => "Link: connected",
            LinkState::Connecting => "Link: connecting",
            LinkState::Disconnected => "Link: disconnected",
        };

        let config_column = column![
            text("Radar").size(26),
            text_input("Radius (m)", &state.config.radius)
                .on_input(|value| Message::ConfigFieldChanged(ConfigField::Radius, value))
                .padding(6),
            text_input("Display radius (px)", &state.config.pixel_radius)
                .on_input(|value| Message::ConfigFieldChanged(ConfigField::PixelRadius, value))
                .padding(6),
            row![
                button("Apply").on_press(Message::ApplyConfig).padding(10),
                button("Reset session")
                    .on_press(Message::ResetSession)
                    .padding(10),
                button("Reset feed").on_press(Message::ResetFeed).padding(10),
            ]
            .spacing(8),
            text(&state.status).size(14),
            text(link_label).size(14),
            text(format!(
                "ingested {} | duplicates {} | rejected {} | resets {}",
                metrics.ingested, metrics.duplicates, metrics.rejected, metrics.resets
            ))
            .size(12),
            text(format!(
                "tracking {} cars, {} frames this session",
                state.session.tracked_entities(),
                state.session.frames_ingested()
            ))
            .size(12),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(360.0));

        let entities = state
            .radar
            .as_ref()
            .map(|radar| radar.entities.clone())
            .unwrap_or_default();

        let nearest_list = if entities.is_empty() {
            Column::new().push(text("No cars in range").size(12))
        } else {
            entities.iter().take(6).fold(Column::new().spacing(4), |col, entity| {
                col.push(
                    text(format!(
                        "{} | {:.1} m | {}",
                        entity.classification.label(),
                        entity.distance_meters,
                        entity
                            .speed
                            .map(|speed| format!("{:.0} km/h", speed))
                            .unwrap_or_else(|| "-".into())
                    ))
                    .size(12),
                )
            })
        };

        let history_list = if state.log.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .log
                .recent()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.to_string()).size(12))
                })
        };

        let scope_size = (engine.pixel_radius as f32 + 24.0) * 2.0;
        let scope = Canvas::new(RadarScope {
            radar: state.radar.clone(),
            pixels_per_meter: (engine.pixel_radius / engine.radius_meters) as f32,
            pixel_radius: engine.pixel_radius as f32,
        })
        .width(Length::Fixed(scope_size))
        .height(Length::Fixed(scope_size));

        let radar_column = column![
            scope,
            text("Nearest cars").size(16),
            Container::new(nearest_list).padding(6),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(120.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let layout = row![config_column, radar_column]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

fn feed_client() -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| e.to_string())
}

async fn fetch_frame() -> Result<FeedPayload, String> {
    fetch_frame_from(FEED_URL).await
}

async fn fetch_frame_from(base: &str) -> Result<FeedPayload, String> {
    let response = feed_client()?
        .get(format!("{base}/frame"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<FeedPayload>()
        .await
        .map_err(|e| e.to_string())
}

async fn post_reset() -> Result<String, String> {
    let response = feed_client()?
        .post(format!("{FEED_URL}/reset"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok("Feed session reset".into())
    } else {
        let status = response.status();
        let text = response.text().await.unwrap_or_else(|_| "".into());
        Err(format!("{}: {}", status, text))
    }
}

#[derive(Debug, Clone)]
struct ConfigForm {
    radius: String,
    pixel_radius: String,
}

impl ConfigForm {
    fn from_config(config: &EngineConfig) -> Self {
        Self {
            radius: config.radius_meters.to_string(),
            pixel_radius: config.pixel_radius.to_string(),
        }
    }

    fn update_field(&mut self, field: ConfigField, value: String) {
        match field {
            ConfigField::Radius => self.radius = value,
            ConfigField::PixelRadius => self.pixel_radius = value,
        }
    }

    fn to_engine_config(&self) -> Result<EngineConfig, String> {
        let radius = self
            .radius
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("radius '{}' is not a number", self.radius))?;
        let pixel_radius = self
            .pixel_radius
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("display radius '{}' is not a number", self.pixel_radius))?;
        EngineConfig::new(radius, pixel_radius).map_err(|e| e.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct FeedPayload {
    #[serde(default)]
    sequence: u64,
    #[serde(default)]
    frame: Option<TelemetryFrame>,
}

#[derive(Clone)]
struct RadarScope {
    radar: Option<RadarFrame>,
    pixels_per_meter: f32,
    pixel_radius: f32,
}

impl RadarScope {
    /// Corners of a car glyph centred on `center`, nose along `heading`.
    fn car_outline(&self, center: Point, heading: f32) -> Path {
        let half_width = CAR_SIZE.0 * self.pixels_per_meter / 2.0;
        let half_length = CAR_SIZE.1 * self.pixels_per_meter / 2.0;
        let corners = [
            (-half_width, half_length),
            (half_width, half_length),
            (half_width, -half_length),
            (-half_width, -half_length),
        ];
        Path::new(|builder| {
            for (index, (lateral, forward)) in corners.iter().enumerate() {
                let (x, y) = GeometryKernel::rotate_inverse(
                    *lateral as f64,
                    *forward as f64,
                    heading as f64,
                );
                let point = Point::new(center.x + x as f32, center.y - y as f32);
                if index == 0 {
                    builder.move_to(point);
                } else {
                    builder.line_to(point);
                }
            }
            builder.close();
        })
    }
}

impl canvas::Program<Message> for RadarScope {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.02, 0.02, 0.04),
        );

        let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
        let radius = self.pixel_radius;

        for ring in 1..=3 {
            let ring_radius = radius * (ring as f32 / 3.0);
            let ring_path = Path::new(|builder| builder.circle(center, ring_radius));
            frame.stroke(
                &ring_path,
                Stroke::default().with_color(Color::from_rgb(0.25, 0.25, 0.3)),
            );
        }

        let axes = Path::new(|builder| {
            builder.move_to(Point::new(center.x - radius, center.y));
            builder.line_to(Point::new(center.x + radius, center.y));
            builder.move_to(Point::new(center.x, center.y - radius));
            builder.line_to(Point::new(center.x, center.y + radius));
        });
        frame.stroke(
            &axes,
            Stroke::default()
                .with_color(Color::from_rgb(0.35, 0.35, 0.45))
                .with_width(1.0),
        );

        frame.fill(
            &self.car_outline(center, 0.0),
            Color::from_rgb(0.95, 0.95, 0.98),
        );

        if let Some(radar) = &self.radar {
            // farthest first so the nearest car is drawn on top
            for entity in radar.entities.iter().rev() {
                let position = Point::new(
                    center.x + entity.radar_position.x as f32,
                    center.y - entity.radar_position.y as f32,
                );
                let [r, g, b] = entity.classification.color();
                let heading = entity.relative_heading.unwrap_or(0.0) as f32;
                frame.fill(&self.car_outline(position, heading), Color::from_rgb(r, g, b));
                frame.fill_text(canvas::Text {
                    content: format!("{:.0}m", entity.distance_meters),
                    position: Point::new(position.x + 8.0, position.y - 6.0),
                    color: Color::from_rgb(0.85, 0.85, 0.9),
                    size: Pixels(11.0),
                    ..canvas::Text::default()
                });
            }
        }

        vec![frame.into_geometry()]
    }
}
