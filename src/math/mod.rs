pub mod field;
pub mod mesh;

pub use field::{HeightBounds, sample_bounds};
