use crate::geometry::scale::PixelScale;
use crate::geometry::vector::Vector3;
use crate::prelude::EngineResult;
use std::f64::consts::{PI, TAU};

/// Stateless vector math shared by the projection stages.
pub struct GeometryKernel;

impl GeometryKernel {
    /// Euclidean distance between two world positions.
    pub fn distance_3d(a: &Vector3, b: &Vector3) -> f64 {
        a.offset_to(b).length()
    }

    /// Applies the rotation for `-yaw` to a world-frame offset.
    ///
    /// The result is expressed in the heading-aligned frame: `x'` along the
    /// heading, `y'` ninety degrees counter-clockwise from it.
    pub fn rotate_inverse(dx: f64, dy: f64, yaw: f64) -> (f64, f64) {
        let (sin, cos) = yaw.sin_cos();
        (dx * cos + dy * sin, -dx * sin + dy * cos)
    }

    /// Uniformly scales radar metres to display pixels. No clamping.
    pub fn world_to_pixel(
        x: f64,
        y: f64,
        world_radius: f64,
        pixel_radius: f64,
    ) -> EngineResult<(f64, f64)> {
        let scale = PixelScale::new(world_radius, pixel_radius)?;
        Ok(scale.apply(x, y))
    }

    /// Maps an angle into `(-π, π]`.
    pub fn normalize_angle(angle: f64) -> f64 {
        if !angle.is_finite() {
            return angle;
        }
        let wrapped = (angle + PI).rem_euclid(TAU) - PI;
        if wrapped <= -PI {
            wrapped + TAU
        } else {
            wrapped
        }
    }
}
