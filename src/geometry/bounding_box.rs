//! Axis-aligned bounding boxes in 2D and 3D.

use super::{Point, Point3};
use serde::{Deserialize, Serialize};

/// A 2D axis-aligned bounding box with scaled integer coordinates.
///
/// A freshly created box is empty (`min > max` on both axes) and grows by
/// merging points into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Create a new empty bounding box.
    #[inline]
    pub fn new() -> Self {
        Self {
            min: Point::new(i64::MAX, i64::MAX),
            max: Point::new(i64::MIN, i64::MIN),
        }
    }

    /// Create a bounding box from min and max corners.
    #[inline]
    pub const fn from_min_max(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Whether no point has been merged yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Grow the box to include `p`.
    pub fn merge_point(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// The size as a point (width, height).
    #[inline]
    pub fn size(&self) -> Point {
        self.max - self.min
    }

    /// The center of the box.
    #[inline]
    pub fn center(&self) -> Point {
        (self.min + self.max) / 2
    }

    /// Whether `p` lies inside the box (inclusive).
    #[inline]
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

/// A 3D axis-aligned bounding box with scaled integer coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox3 {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox3 {
    /// Create a bounding box from min and max corners.
    #[inline]
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// The size along each axis.
    #[inline]
    pub fn size(&self) -> Point3 {
        self.max - self.min
    }

    /// The center of the box.
    #[inline]
    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) / 2,
            (self.min.y + self.max.y) / 2,
            (self.min.z + self.max.z) / 2,
        )
    }

    /// Project onto the xy plane.
    #[inline]
    pub fn flatten(&self) -> BoundingBox {
        BoundingBox::from_min_max(self.min.to_2d(), self.max.to_2d())
    }
}
