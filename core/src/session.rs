use crate::continuity::state::FrameUpdate;
use crate::continuity::{unwrap_angle, ContinuityState, EntityKey};
use crate::geometry::{GeometryKernel, PixelScale, PlanarPoint};
use crate::interface::frame::TelemetryFrame;
use crate::interface::radar::{RadarEntity, RadarFrame, RadarPlayer};
use crate::prelude::{EngineConfig, EngineResult};
use crate::projection::{filter_and_sort, transform, Projection};
use log::{debug, info, trace};

/// Whether a session has continuity history to unwrap against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Fresh,
    Tracking,
}

/// Stateful shell around the projection engine.
///
/// Frames must be ingested in arrival order. Call [`UpdateSession::reset`]
/// whenever the feed is known to have dropped and resumed.
#[derive(Debug, Clone)]
pub struct UpdateSession {
    config: EngineConfig,
    scale: PixelScale,
    continuity: ContinuityState,
    frames_ingested: u64,
}

impl UpdateSession {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let scale = PixelScale::new(config.radius_meters, config.pixel_radius)?;
        Ok(Self {
            config,
            scale,
            continuity: ContinuityState::new(),
            frames_ingested: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        if self.continuity.player_yaw().is_some() {
            SessionState::Tracking
        } else {
            SessionState::Fresh
        }
    }

    pub fn frames_ingested(&self) -> u64 {
        self.frames_ingested
    }

    pub fn tracked_entities(&self) -> usize {
        self.continuity.tracked_entities()
    }

    pub fn ingest(&mut self, frame: &TelemetryFrame) -> RadarFrame {
        let player_yaw = unwrap_angle(frame.player.yaw, self.continuity.player_yaw());

        let projections: Vec<(EntityKey, Projection)> = frame
            .cars
            .iter()
            .enumerate()
            .map(|(slot, car)| {
                let key = EntityKey::for_car(slot, car);
                let previous = self.continuity.entity_angle(&key);
                (key, transform(car, &frame.player, player_yaw, previous))
            })
            .collect();

        let entities: Vec<RadarEntity> =
            filter_and_sort(&frame.cars, &frame.player, self.config.radius_meters)
                .into_iter()
                .map(|ranked| {
                    let (_, projection) = projections[ranked.slot];
                    let (px, py) = self.scale.apply(projection.x, projection.y);
                    RadarEntity {
                        slot: ranked.slot,
                        id: ranked.entity.id,
                        radar_position: PlanarPoint::new(px, py),
                        offset_meters: PlanarPoint::new(projection.x, projection.y),
                        distance_meters: ranked.distance,
                        relative_angle: projection.relative_angle,
                        classification: ranked.entity.classification,
                        speed: ranked.entity.speed,
                        relative_heading: ranked
                            .entity
                            .yaw
                            .map(|yaw| GeometryKernel::normalize_angle(yaw - frame.player.yaw)),
                    }
                })
                .collect();

        let update = FrameUpdate {
            player_yaw,
            angles: projections
                .iter()
                .map(|(key, projection)| {
                    let angle = (!projection.degenerate).then_some(projection.relative_angle);
                    (*key, angle)
                })
                .collect(),
        };
        let evicted = self
            .continuity
            .commit(update, self.config.eviction_grace_frames);
        if evicted > 0 {
            debug!("evicted {} stale continuity entries", evicted);
        }

        self.frames_ingested += 1;
        trace!(
            "frame {} -> {} of {} cars on radar, yaw {:.3}",
            self.frames_ingested,
            entities.len(),
            frame.cars.len(),
            player_yaw
        );

        RadarFrame {
            player: RadarPlayer {
                position: frame.player.position,
                yaw: player_yaw,
            },
            entities,
        }
    }

    /// Drops all continuity history; the next frame seeds a new sequence.
    pub fn reset(&mut self) {
        info!(
            "resetting radar session after {} frames",
            self.frames_ingested
        );
        self.continuity.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector3;
    use crate::interface::frame::{CarState, Classification, PlayerState};

    fn car_at(x: f64, y: f64, z: f64) -> CarState {
        CarState {
            position: Vector3::new(x, y, z),
            classification: Classification::C,
            ..Default::default()
        }
    }

    fn car_at_bearing(bearing: f64, range: f64) -> CarState {
        car_at(range * bearing.cos(), range * bearing.sin(), 0.0)
    }

    fn frame(yaw: f64, cars: Vec<CarState>) -> TelemetryFrame {
        TelemetryFrame::new(
            PlayerState {
                position: Vector3::ZERO,
                yaw,
            },
            cars,
        )
    }

    fn session(radius: f64) -> UpdateSession {
        UpdateSession::new(EngineConfig::new(radius, 100.0).unwrap()).unwrap()
    }

    #[test]
    fn invalid_config_fails_at_construction() {
        let config = EngineConfig {
            radius_meters: 0.0,
            ..Default::default()
        };
        assert!(UpdateSession::new(config).is_err());
    }

    #[test]
    fn first_frame_moves_session_to_tracking() {
        let mut session = session(20.0);
        assert_eq!(session.state(), SessionState::Fresh);
        session.ingest(&frame(0.0, vec![]));
        assert_eq!(session.state(), SessionState::Tracking);
        assert_eq!(session.frames_ingested(), 1);
    }

    #[test]
    fn bearing_stays_continuous_across_boundary() {
        let mut session = session(20.0);
        let first = session.ingest(&frame(3.0, vec![car_at_bearing(-3.1, 10.0)]));
        let second = session.ingest(&frame(3.0, vec![car_at_bearing(3.1, 10.0)]));
        let a = first.entities[0].relative_angle;
        let b = second.entities[0].relative_angle;
        assert!((a - b).abs() < 0.2, "jumped from {} to {}", a, b);
    }

    #[test]
    fn player_yaw_is_unwrapped() {
        let mut session = session(20.0);
        session.ingest(&frame(3.1, vec![]));
        let radar = session.ingest(&frame(-3.1, vec![]));
        assert!((radar.player.yaw - 3.1).abs() < 0.1);
        assert!(radar.player.yaw > std::f64::consts::PI);
    }

    #[test]
    fn car_directly_above_sits_at_centre() {
        let mut session = session(20.0);
        let radar = session.ingest(&frame(0.7, vec![car_at(0.0, 0.0, 5.0)]));
        let entity = &radar.entities[0];
        assert_eq!(entity.radar_position, PlanarPoint::new(0.0, 0.0));
        assert_eq!(entity.distance_meters, 5.0);
    }

    #[test]
    fn overhead_pass_keeps_the_stored_bearing() {
        let mut session = session(20.0);
        session.ingest(&frame(0.0, vec![car_at_bearing(3.0, 10.0)]));
        let overhead = session.ingest(&frame(0.0, vec![car_at(0.0, 0.0, 4.0)]));
        assert_eq!(overhead.entities[0].relative_angle, 0.0);
        let radar = session.ingest(&frame(0.0, vec![car_at_bearing(-3.0, 10.0)]));
        let angle = radar.entities[0].relative_angle;
        assert!((angle - (-3.0 + 2.0 * std::f64::consts::PI)).abs() < 1e-9);
    }

    #[test]
    fn radius_filter_orders_and_drops() {
        let mut session = session(20.0);
        let radar = session.ingest(&frame(
            0.0,
            vec![
                car_at(5.0, 5.0, 0.0),
                car_at(3.0, 8.0, 0.0),
                car_at(10.0, 10.0, 0.0),
                car_at(15.0, 20.0, 0.0),
            ],
        ));
        let distances: Vec<f64> = radar
            .entities
            .iter()
            .map(|e| (e.distance_meters * 100.0).round() / 100.0)
            .collect();
        assert_eq!(distances, vec![7.07, 8.54, 14.14]);
    }

    #[test]
    fn pixels_scale_with_configured_radius() {
        let mut session = session(20.0);
        let radar = session.ingest(&frame(0.0, vec![car_at(10.0, 0.0, 0.0)]));
        let entity = &radar.entities[0];
        assert!((entity.radar_position.y - 50.0).abs() < 1e-9);
        assert!(entity.radar_position.x.abs() < 1e-9);
    }

    #[test]
    fn relative_heading_is_normalized() {
        let mut session = session(20.0);
        let mut car = car_at(5.0, 0.0, 0.0);
        car.yaw = Some(-3.0);
        let radar = session.ingest(&frame(3.0, vec![car]));
        let heading = radar.entities[0].relative_heading.unwrap();
        assert!((heading - (-6.0 + 2.0 * std::f64::consts::PI)).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_cars_still_keep_continuity() {
        let mut session = session(20.0);
        session.ingest(&frame(0.0, vec![car_at_bearing(3.1, 50.0)]));
        assert_eq!(session.tracked_entities(), 1);
        let radar = session.ingest(&frame(0.0, vec![car_at_bearing(-3.1, 10.0)]));
        assert!((radar.entities[0].relative_angle - 3.1).abs() < 0.2);
    }

    #[test]
    fn stable_ids_survive_reordering() {
        let mut session = session(30.0);
        let mut a = car_at_bearing(3.1, 10.0);
        a.id = Some(1);
        let mut b = car_at_bearing(0.0, 12.0);
        b.id = Some(2);
        session.ingest(&frame(0.0, vec![a.clone(), b.clone()]));

        let mut a_next = car_at_bearing(-3.1, 10.0);
        a_next.id = Some(1);
        let radar = session.ingest(&frame(0.0, vec![b, a_next]));
        let tracked = radar.entities.iter().find(|e| e.id == Some(1)).unwrap();
        assert_eq!(tracked.slot, 1);
        assert!((tracked.relative_angle - 3.1).abs() < 0.2);
    }

    #[test]
    fn reset_reproduces_seed_output() {
        let seed = frame(3.0, vec![car_at_bearing(-3.1, 10.0), car_at(4.0, -2.0, 1.0)]);
        let mut session = session(20.0);
        let original = session.ingest(&seed);
        for step in 1..6 {
            let yaw = 3.0 + 0.1 * step as f64;
            session.ingest(&frame(
                yaw,
                vec![car_at_bearing(-3.1 + 0.2 * step as f64, 10.0)],
            ));
        }
        session.reset();
        assert_eq!(session.state(), SessionState::Fresh);
        assert_eq!(session.tracked_entities(), 0);
        assert_eq!(session.ingest(&seed), original);
    }
}
