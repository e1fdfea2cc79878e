use crate::continuity::unwrap_angle;
use crate::geometry::GeometryKernel;
use crate::interface::frame::{CarState, PlayerState};
use crate::prelude::DEGENERATE_EPSILON;

/// Radar-space placement of one car, in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Lateral component; `h·sin(radar_angle)`.
    pub x: f64,
    /// Component along the player's heading; `h·cos(radar_angle)`.
    pub y: f64,
    pub distance: f64,
    /// Unwrapped world bearing, to be fed back as the next frame's previous angle.
    pub relative_angle: f64,
    /// Set when the car sits directly above or below the player.
    pub degenerate: bool,
}

/// Projects a car into the player's heading-aligned frame.
///
/// `unwrapped_player_yaw` must already be continuous with the previous frame;
/// `previous_relative_angle` is the car's bearing from the last frame, if any.
pub fn transform(
    entity: &CarState,
    player: &PlayerState,
    unwrapped_player_yaw: f64,
    previous_relative_angle: Option<f64>,
) -> Projection {
    let offset = player.position.offset_to(&entity.position);
    let distance = offset.length();
    let horizontal = offset.horizontal_length();

    if horizontal < DEGENERATE_EPSILON {
        return Projection {
            x: 0.0,
            y: 0.0,
            distance,
            relative_angle: 0.0,
            degenerate: true,
        };
    }

    let raw_bearing = offset.y.atan2(offset.x);
    let relative_angle = unwrap_angle(raw_bearing, previous_relative_angle);

    let (forward, lateral) = GeometryKernel::rotate_inverse(
        horizontal * relative_angle.cos(),
        horizontal * relative_angle.sin(),
        unwrapped_player_yaw,
    );

    Projection {
        x: lateral,
        y: forward,
        distance,
        relative_angle,
        degenerate: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector3;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn car_at(x: f64, y: f64, z: f64) -> CarState {
        CarState {
            position: Vector3::new(x, y, z),
            ..Default::default()
        }
    }

    fn player(yaw: f64) -> PlayerState {
        PlayerState {
            position: Vector3::ZERO,
            yaw,
        }
    }

    #[test]
    fn directly_above_short_circuits() {
        let projection = transform(&car_at(0.0, 0.0, 5.0), &player(1.0), 1.0, Some(2.0));
        assert_eq!(projection.x, 0.0);
        assert_eq!(projection.y, 0.0);
        assert_eq!(projection.distance, 5.0);
        assert_eq!(projection.relative_angle, 0.0);
        assert!(projection.degenerate);
    }

    #[test]
    fn car_ahead_renders_at_top() {
        // heading north, car 10 m north
        let projection = transform(&car_at(0.0, 10.0, 0.0), &player(FRAC_PI_2), FRAC_PI_2, None);
        assert!(projection.x.abs() < 1e-9);
        assert!((projection.y - 10.0).abs() < 1e-9);
        assert!(!projection.degenerate);
    }

    #[test]
    fn car_behind_renders_at_bottom() {
        let projection = transform(&car_at(-8.0, 0.0, 0.0), &player(0.0), 0.0, None);
        assert!((projection.y + 8.0).abs() < 1e-9);
        assert!(projection.x.abs() < 1e-9);
    }

    #[test]
    fn lateral_component_follows_sine_of_radar_angle() {
        let projection = transform(&car_at(0.0, 6.0, 0.0), &player(0.0), 0.0, None);
        assert!((projection.x - 6.0 * FRAC_PI_2.sin()).abs() < 1e-9);
        assert!(projection.y.abs() < 1e-9);
    }

    #[test]
    fn distance_includes_height_but_placement_does_not() {
        let projection = transform(&car_at(3.0, 0.0, 4.0), &player(0.0), 0.0, None);
        assert_eq!(projection.distance, 5.0);
        assert!((projection.y - 3.0).abs() < 1e-9);
    }

    #[test]
    fn bearing_is_unwrapped_against_previous() {
        let projection = transform(&car_at(-10.0, -0.01, 0.0), &player(0.0), 0.0, Some(PI - 0.01));
        assert!(projection.relative_angle > PI);
        assert!((projection.relative_angle - (PI - 0.01)).abs() < 0.1);
    }

    #[test]
    fn unwrapped_inputs_place_car_like_raw_inputs() {
        let car = car_at(-10.0, -1.0, 0.0);
        let raw = transform(&car, &player(3.0), 3.0, None);
        let wrapped = transform(&car, &player(3.0), 3.0 + 2.0 * PI, Some(3.0));
        assert!((raw.x - wrapped.x).abs() < 1e-9);
        assert!((raw.y - wrapped.y).abs() < 1e-9);
    }
}
