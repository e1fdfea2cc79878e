use crate::geometry::Vector3;
use crate::prelude::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Radar class of a tracked car.
///
/// Sources report the class as free text; anything unrecognised becomes
/// `Unknown` rather than failing the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Classification {
    /// Prototype top class (LMDh / Hypercar).
    A,
    /// LMP2.
    B,
    /// GT3.
    C,
    Safety,
    #[default]
    Unknown,
}

impl Classification {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "a" | "lmdh" | "hypercar" | "gtp" => Classification::A,
            "b" | "lmp2" => Classification::B,
            "c" | "lmgt3" | "gt3" => Classification::C,
            "safety" | "safetycar" | "safety car" | "safety_car" => Classification::Safety,
            _ => Classification::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::A => "A",
            Classification::B => "B",
            Classification::C => "C",
            Classification::Safety => "Safety",
            Classification::Unknown => "Unknown",
        }
    }

    /// Display colour as linear RGB in `0.0..=1.0`.
    pub fn color(&self) -> [f32; 3] {
        match self {
            Classification::A => [0.93, 0.22, 0.25],
            Classification::B => [0.22, 0.55, 0.95],
            Classification::C => [0.25, 0.80, 0.35],
            Classification::Safety => [0.98, 0.78, 0.10],
            Classification::Unknown => [0.70, 0.70, 0.72],
        }
    }
}

impl From<String> for Classification {
    fn from(value: String) -> Self {
        Classification::from_label(&value)
    }
}

impl From<Classification> for String {
    fn from(value: Classification) -> Self {
        value.label().to_string()
    }
}

/// Player pose as reported by the source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Vector3,
    /// Heading in radians, counter-clockwise from the world x axis.
    pub yaw: f64,
}

/// One tracked car as reported by the source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CarState {
    pub position: Vector3,
    #[serde(rename = "class", default)]
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

/// Raw telemetry frame: `{player, cars}` with absolute world positions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub player: PlayerState,
    pub cars: Vec<CarState>,
}

impl TelemetryFrame {
    pub fn new(player: PlayerState, cars: Vec<CarState>) -> Self {
        Self { player, cars }
    }

    /// Parses and validates a frame from JSON text.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        let frame: TelemetryFrame =
            serde_json::from_str(text).map_err(|e| EngineError::MalformedFrame(e.to_string()))?;
        frame.validate()?;
        Ok(frame)
    }

    /// Like [`TelemetryFrame::from_json`] for raw request bodies.
    pub fn from_slice(bytes: &[u8]) -> EngineResult<Self> {
        let frame: TelemetryFrame = serde_json::from_slice(bytes)
            .map_err(|e| EngineError::MalformedFrame(e.to_string()))?;
        frame.validate()?;
        Ok(frame)
    }

    /// Rejects non-finite numbers anywhere in the frame.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.player.position.is_finite() || !self.player.yaw.is_finite() {
            return Err(EngineError::MalformedFrame(
                "player pose contains non-finite values".into(),
            ));
        }
        for (slot, car) in self.cars.iter().enumerate() {
            let optional_ok = car.speed.map_or(true, f64::is_finite)
                && car.yaw.map_or(true, f64::is_finite);
            if !car.position.is_finite() || !optional_ok {
                return Err(EngineError::MalformedFrame(format!(
                    "car in slot {} contains non-finite values",
                    slot
                )));
            }
        }
        Ok(())
    }
}
