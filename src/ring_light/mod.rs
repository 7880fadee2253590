mod geometry;
mod settings;
mod store;

pub use geometry::*;
pub use settings::*;
pub use store::*;
