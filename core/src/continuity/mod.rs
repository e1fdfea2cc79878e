pub mod state;
pub mod unwrap;

pub use state::{ContinuityState, EntityKey};
pub use unwrap::unwrap_angle;
