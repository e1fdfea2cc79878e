pub mod kernel;
pub mod scale;
pub mod vector;

pub use kernel::GeometryKernel;
pub use scale::PixelScale;
pub use vector::{PlanarPoint, Vector3};
