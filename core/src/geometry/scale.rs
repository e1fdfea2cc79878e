use crate::prelude::{EngineError, EngineResult};

/// Validated metres-to-pixels scale for the radar display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScale {
    factor: f64,
}

impl PixelScale {
    pub fn new(world_radius: f64, pixel_radius: f64) -> EngineResult<Self> {
        if !(world_radius.is_finite() && world_radius > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "world radius must be positive, got {}",
                world_radius
            )));
        }
        if !(pixel_radius.is_finite() && pixel_radius > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "pixel radius must be positive, got {}",
                pixel_radius
            )));
        }
        Ok(Self {
            factor: pixel_radius / world_radius,
        })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.factor, y * self.factor)
    }
}
