//! Oriented line segments.
//!
//! Segments are directed: the curve enters a triangle through its from-edge
//! and leaves through its to-edge, so the `from`/`to` orientation carries
//! meaning and collinearity checks are done on the supporting line.

use super::Point;
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};

/// A directed line segment between two points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineSegment {
    pub from: Point,
    pub to: Point,
}

impl LineSegment {
    /// Create a new segment from `from` to `to`.
    #[inline]
    pub const fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    /// Swap the endpoints in place.
    #[inline]
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
    }

    /// Return a copy with the endpoints swapped.
    #[inline]
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }

    /// The midpoint of the segment.
    #[inline]
    pub fn middle(&self) -> Point {
        (self.from + self.to) / 2
    }

    /// The direction vector `to - from`.
    #[inline]
    pub fn vector(&self) -> Point {
        self.to - self.from
    }

    /// Length of the segment, in scaled units.
    #[inline]
    pub fn length(&self) -> CoordF {
        self.from.distance(&self.to)
    }

    /// Check whether both endpoints of `other` lie on this segment's
    /// supporting line, allowing a perpendicular deviation of up to
    /// `tolerance` scaled units.
    ///
    /// A zero-length segment is collinear with nothing.
    pub fn is_collinear_with(&self, other: &LineSegment, tolerance: Coord) -> bool {
        let dir = self.vector();
        let len = dir.length();
        if len == 0.0 {
            return false;
        }
        let deviation = |p: Point| -> CoordF { (dir.cross(&(p - self.from)) as CoordF).abs() / len };
        deviation(other.from) <= tolerance as CoordF && deviation(other.to) <= tolerance as CoordF
    }
}
