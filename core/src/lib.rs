//! Continuous angular projection engine for a player-centred racing radar.
//!
//! Raw `{player, cars}` telemetry goes in, a heading-aligned, distance-ordered
//! [`RadarFrame`] comes out. All continuity state lives in an
//! [`UpdateSession`]; everything else is pure.

pub mod continuity;
pub mod geometry;
pub mod interface;
pub mod link;
pub mod prelude;
pub mod projection;
pub mod session;
pub mod telemetry;

pub use interface::{RadarFrame, TelemetryFrame};
pub use prelude::{EngineConfig, EngineError, EngineResult};
pub use session::{SessionState, UpdateSession};
