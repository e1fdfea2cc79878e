use crate::geometry::{PlanarPoint, Vector3};
use crate::interface::frame::Classification;
use serde::{Deserialize, Serialize};

/// Player pose with its heading unwrapped across frames.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RadarPlayer {
    pub position: Vector3,
    pub yaw: f64,
}

/// A car positioned in radar space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarEntity {
    /// Index of the car in the frame it came from.
    pub slot: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    /// Display offset from the radar centre in pixels, +y towards the player's heading.
    pub radar_position: PlanarPoint,
    /// Same offset in metres.
    pub offset_meters: PlanarPoint,
    pub distance_meters: f64,
    /// Unwrapped world bearing from the player to the car.
    pub relative_angle: f64,
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Car heading relative to the player's, in `(-π, π]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_heading: Option<f64>,
}

/// Output of one ingested frame; entities are sorted nearest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RadarFrame {
    pub player: RadarPlayer,
    pub entities: Vec<RadarEntity>,
}

impl RadarFrame {
    pub fn nearest(&self) -> Option<&RadarEntity> {
        self.entities.first()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
