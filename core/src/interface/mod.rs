pub mod frame;
pub mod radar;

pub use frame::{CarState, Classification, PlayerState, TelemetryFrame};
pub use radar::{RadarEntity, RadarFrame, RadarPlayer};
