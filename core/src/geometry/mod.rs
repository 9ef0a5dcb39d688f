pub mod heading;
pub mod point;

pub use point::{Point2D, Rect};
