//! Geometry primitives for the subdivision tree.
//!
//! All types use scaled integer coordinates (1 unit = 1 micron). The
//! primitives here are deliberately small: the tree only needs points, line
//! segments, closed contours, 1D intervals and axis-aligned boxes.

mod bounding_box;
mod line;
mod point;
mod polygon;
mod range;

pub use bounding_box::{BoundingBox, BoundingBox3};
pub use line::LineSegment;
pub use point::{Point, Point3};
pub use polygon::Polygon;
pub use range::Range;
