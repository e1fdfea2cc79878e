pub mod proximity;
pub mod transformer;

pub use proximity::{filter_and_sort, RankedEntity};
pub use transformer::{transform, Projection};
