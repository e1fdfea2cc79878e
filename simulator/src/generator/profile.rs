use crate::generator::classes::{classify_model, normalize_heading, speed_kmh, CAR_MODELS};
use anyhow::{bail, Context};
use radarcore::geometry::{GeometryKernel, Vector3};
use radarcore::interface::{CarState, PlayerState, TelemetryFrame};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// The player's own car is one of these, so at most this many others.
const MAX_CARS: usize = 63;

/// Fastest feed the ticker can pace without a zero-length period.
pub const MAX_UPDATE_RATE_HZ: f64 = 1000.0;

pub fn validate_update_rate(update_rate_hz: f64) -> anyhow::Result<()> {
    if !(update_rate_hz > 0.0 && update_rate_hz <= MAX_UPDATE_RATE_HZ) {
        bail!(
            "update rate must be within (0, {}] Hz, got {}",
            MAX_UPDATE_RATE_HZ,
            update_rate_hz
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingUnits {
    Radians,
    Degrees,
}

/// Configuration for generating a synthetic race around the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub car_count: usize,
    /// Radius of the circular track in metres.
    pub track_radius: f64,
    /// Player speed along the track in m/s.
    pub player_speed: f64,
    pub lane_width: f64,
    /// Cars stay within this many metres ahead of or behind the player.
    pub spread_meters: f64,
    /// Largest speed difference to the player in m/s.
    pub closing_speed: f64,
    /// Peak track elevation change in metres.
    pub elevation: f64,
    /// Uniform position jitter in metres.
    pub noise: f64,
    pub seed: u64,
    /// Attach each car's index as a stable id.
    pub stable_ids: bool,
    /// Units the simulated sim reports headings in.
    pub heading_units: HeadingUnits,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            car_count: 8,
            track_radius: 120.0,
            player_speed: 40.0,
            lane_width: 4.0,
            spread_meters: 60.0,
            closing_speed: 3.0,
            elevation: 2.0,
            noise: 0.05,
            seed: 0,
            stable_ids: true,
            heading_units: HeadingUnits::Radians,
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.car_count > MAX_CARS {
            bail!(
                "car_count {} exceeds the {} cars a session can report",
                self.car_count,
                MAX_CARS
            );
        }
        let floats = [
            ("track_radius", self.track_radius),
            ("player_speed", self.player_speed),
            ("lane_width", self.lane_width),
            ("spread_meters", self.spread_meters),
            ("closing_speed", self.closing_speed),
            ("elevation", self.elevation),
            ("noise", self.noise),
        ];
        if let Some((name, value)) = floats.iter().find(|(_, value)| !value.is_finite()) {
            bail!("{} must be finite, got {}", name, value);
        }
        if !(self.track_radius > 0.0) {
            bail!("track_radius must be positive");
        }
        if self.noise < 0.0 || self.closing_speed < 0.0 || self.spread_meters < 0.0 {
            bail!("noise, closing_speed and spread_meters must not be negative");
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct SyntheticCar {
    model: &'static str,
    id: u32,
    lane: f64,
    /// Metres along the track relative to the player, positive ahead.
    gap: f64,
    closing: f64,
}

/// Deterministic source of telemetry frames for a seeded scenario.
#[derive(Debug, Clone)]
pub struct FeedGenerator {
    config: ScenarioConfig,
    rng: StdRng,
    cars: Vec<SyntheticCar>,
    time: f64,
    step: f64,
}

impl FeedGenerator {
    pub fn new(config: ScenarioConfig, update_rate_hz: f64) -> anyhow::Result<Self> {
        config.validate()?;
        validate_update_rate(update_rate_hz)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let cars = (0..config.car_count)
            .map(|index| {
                let (model, _) = CAR_MODELS[rng.gen_range(0..CAR_MODELS.len())];
                let lane = rng.gen_range(-1i32..=1) as f64 * config.lane_width;
                let gap = if config.spread_meters > 0.0 {
                    rng.gen_range(-config.spread_meters..=config.spread_meters)
                } else {
                    0.0
                };
                let closing = if config.closing_speed > 0.0 {
                    rng.gen_range(-config.closing_speed..=config.closing_speed)
                } else {
                    0.0
                };
                SyntheticCar {
                    model,
                    id: index as u32 + 1,
                    lane,
                    gap,
                    closing,
                }
            })
            .collect();

        Ok(Self {
            config,
            rng,
            cars,
            time: 0.0,
            step: 1.0 / update_rate_hz,
        })
    }

    /// Produces the frame for the current instant and advances one step.
    pub fn next_frame(&mut self) -> TelemetryFrame {
        let radius = self.config.track_radius;
        let player_angle = self.config.player_speed / radius * self.time;
        let player = PlayerState {
            position: Vector3::new(radius * player_angle.cos(), radius * player_angle.sin(), 0.0),
            yaw: self.reported_heading(player_angle + FRAC_PI_2),
        };

        let mut cars = Vec::with_capacity(self.cars.len());
        for index in 0..self.cars.len() {
            let car = self.cars[index].clone();
            let angle = player_angle + car.gap / radius;
            let lane_radius = radius + car.lane;
            let position = Vector3::new(
                lane_radius * angle.cos() + self.jitter(),
                lane_radius * angle.sin() + self.jitter(),
                self.config.elevation * (3.0 * angle).sin(),
            );
            cars.push(CarState {
                position,
                classification: classify_model(car.model),
                speed: Some(speed_kmh(self.config.player_speed + car.closing)),
                yaw: Some(self.reported_heading(angle + FRAC_PI_2)),
                id: self.config.stable_ids.then_some(car.id),
            });
        }

        self.advance();
        TelemetryFrame::new(player, cars)
    }

    pub fn frames(&mut self, count: usize) -> Vec<TelemetryFrame> {
        (0..count).map(|_| self.next_frame()).collect()
    }

    fn advance(&mut self) {
        let spread = self.config.spread_meters;
        for car in &mut self.cars {
            car.gap += car.closing * self.step;
            if car.gap.abs() > spread {
                car.gap = car.gap.clamp(-spread, spread);
                car.closing = -car.closing;
            }
        }
        self.time += self.step;
    }

    /// Heading as the sim would report it, then as the feed normalizes it.
    fn reported_heading(&self, heading: f64) -> f64 {
        let heading = GeometryKernel::normalize_angle(heading);
        let raw = match self.config.heading_units {
            HeadingUnits::Radians => heading,
            HeadingUnits::Degrees => heading.to_degrees(),
        };
        normalize_heading(raw)
    }

    fn jitter(&mut self) -> f64 {
        if self.config.noise > 0.0 {
            self.rng.gen_range(-self.config.noise..self.config.noise)
        } else {
            0.0
        }
    }
}

pub fn build_frames(
    config: &ScenarioConfig,
    count: usize,
    update_rate_hz: f64,
) -> anyhow::Result<Vec<TelemetryFrame>> {
    let mut generator = FeedGenerator::new(config.clone(), update_rate_hz)
        .context("building synthetic feed generator")?;
    Ok(generator.frames(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_builds_requested_frames() {
        let frames = build_frames(&ScenarioConfig::default(), 40, 20.0).unwrap();
        assert_eq!(frames.len(), 40);
        assert!(frames.iter().all(|frame| frame.cars.len() == 8));
        assert!(frames.iter().all(|frame| frame.validate().is_ok()));
    }

    #[test]
    fn same_seed_replays_identically() {
        let config = ScenarioConfig {
            seed: 42,
            ..Default::default()
        };
        let a = build_frames(&config, 10, 20.0).unwrap();
        let b = build_frames(&config, 10, 20.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn player_heading_crosses_the_wrap_boundary() {
        // one lap at 40 m/s on a 120 m radius takes about 19 s
        let frames = build_frames(&ScenarioConfig::default(), 400, 20.0).unwrap();
        let crossed = frames
            .windows(2)
            .any(|pair| (pair[1].player.yaw - pair[0].player.yaw).abs() > std::f64::consts::PI);
        assert!(crossed);
    }

    #[test]
    fn degree_reporting_is_normalized_back_to_radians() {
        let config = ScenarioConfig {
            heading_units: HeadingUnits::Degrees,
            noise: 0.0,
            ..Default::default()
        };
        let mut generator = FeedGenerator::new(config, 20.0).unwrap();
        let frame = generator.next_frame();
        assert!((frame.player.yaw - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn ids_are_optional() {
        let config = ScenarioConfig {
            stable_ids: false,
            ..Default::default()
        };
        let frames = build_frames(&config, 1, 20.0).unwrap();
        assert!(frames[0].cars.iter().all(|car| car.id.is_none()));
    }

    #[test]
    fn oversized_field_is_rejected() {
        let config = ScenarioConfig {
            car_count: 64,
            ..Default::default()
        };
        assert!(FeedGenerator::new(config, 20.0).is_err());
        assert!(FeedGenerator::new(ScenarioConfig::default(), 0.0).is_err());
    }

    #[test]
    fn unbounded_values_are_rejected() {
        for rate in [f64::INFINITY, f64::NAN, 1e10] {
            assert!(FeedGenerator::new(ScenarioConfig::default(), rate).is_err());
        }
        assert!(FeedGenerator::new(ScenarioConfig::default(), MAX_UPDATE_RATE_HZ).is_ok());

        let noisy = ScenarioConfig {
            noise: f64::INFINITY,
            ..Default::default()
        };
        assert!(noisy.validate().is_err());
        let spread = ScenarioConfig {
            spread_meters: f64::INFINITY,
            ..Default::default()
        };
        assert!(spread.validate().is_err());
        let closing = ScenarioConfig {
            closing_speed: f64::NAN,
            ..Default::default()
        };
        assert!(closing.validate().is_err());
    }
}
