use serde::{Deserialize, Serialize};

/// Horizontal offsets shorter than this (metres) have no usable bearing.
pub const DEGENERATE_EPSILON: f64 = 0.001;

/// Configuration accepted by the projection engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World-space inclusion radius in metres.
    pub radius_meters: f64,
    /// Display radius in pixels that `radius_meters` maps onto.
    pub pixel_radius: f64,
    /// Frames an entity may go unseen before its continuity entry is dropped.
    pub eviction_grace_frames: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            radius_meters: 30.0,
            pixel_radius: 150.0,
            eviction_grace_frames: 60,
        }
    }
}

impl EngineConfig {
    pub fn new(radius_meters: f64, pixel_radius: f64) -> EngineResult<Self> {
        let config = Self {
            radius_meters,
            pixel_radius,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_eviction_grace(mut self, frames: u64) -> Self {
        self.eviction_grace_frames = frames;
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.radius_meters.is_finite() && self.radius_meters > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "radius_meters must be a positive number, got {}",
                self.radius_meters
            )));
        }
        if !(self.pixel_radius.is_finite() && self.pixel_radius > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "pixel_radius must be a positive number, got {}",
                self.pixel_radius
            )));
        }
        Ok(())
    }
}

/// Common error type for the engine and its wire types.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
