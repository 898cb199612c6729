//! The oriented right triangle that forms a prism's footprint.

use crate::geometry::{LineSegment, Point, Polygon};
use serde::{Deserialize, Serialize};

/// Which pair of edges the space-filling curve uses to cross a triangle.
///
/// The names refer to the triangle's edges: `ab` is the edge between the two
/// non-right-angle corners, `ac` and `bc` are the edges from those corners
/// to the straight corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveDirection {
    /// Enter through `ab`, leave through `bc`.
    AbToBc,
    /// Enter through `ac`, leave through `ab`.
    AcToAb,
    /// Enter through `ac`, leave through `bc`.
    #[default]
    AcToBc,
}

/// A right triangle in the xy plane with the 90-degree corner at
/// `straight_corner`.
///
/// `straight_corner_is_left` records whether the right-angle corner lies on
/// the left-hand side when walking the curve through the triangle; it flips
/// on every subdivision, as does the winding of the corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub straight_corner: Point,
    pub a: Point,
    pub b: Point,
    pub direction: CurveDirection,
    pub straight_corner_is_left: bool,
}

impl Triangle {
    /// Create a new triangle.
    pub const fn new(
        straight_corner: Point,
        a: Point,
        b: Point,
        direction: CurveDirection,
        straight_corner_is_left: bool,
    ) -> Self {
        Self {
            straight_corner,
            a,
            b,
            direction,
            straight_corner_is_left,
        }
    }

    /// The oriented edge through which the curve enters this triangle.
    pub fn from_edge(&self) -> LineSegment {
        let mut ret = match self.direction {
            CurveDirection::AbToBc => LineSegment::new(self.a, self.b),
            CurveDirection::AcToAb => LineSegment::new(self.straight_corner, self.a),
            CurveDirection::AcToBc => LineSegment::new(self.straight_corner, self.a),
        };
        if !self.straight_corner_is_left {
            ret.reverse();
        }
        ret
    }

    /// The oriented edge through which the curve leaves this triangle.
    pub fn to_edge(&self) -> LineSegment {
        let mut ret = match self.direction {
            CurveDirection::AbToBc => LineSegment::new(self.straight_corner, self.b),
            CurveDirection::AcToAb => LineSegment::new(self.b, self.a),
            CurveDirection::AcToBc => LineSegment::new(self.straight_corner, self.b),
        };
        if !self.straight_corner_is_left {
            ret.reverse();
        }
        ret
    }

    /// The centroid, used as the polyline vertex for this triangle.
    #[inline]
    pub fn middle(&self) -> Point {
        (self.straight_corner + self.a + self.b) / 3
    }

    /// The triangle as a positively-oriented 3-point contour.
    pub fn to_polygon(&self) -> Polygon {
        let (second, third) = if self.straight_corner_is_left {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        };
        let ret = Polygon::from_points(vec![self.straight_corner, second, third]);
        debug_assert!(ret.signed_area() > 0.0);
        ret
    }

    /// Split into two children sharing a new straight corner at the midpoint
    /// of `ab`.
    ///
    /// Child 0 covers the entry half of the curve, child 1 the exit half.
    /// The child directions are the only transitions that keep the curve
    /// continuous: child 0 exits and child 1 enters through the shared
    /// segment between the new midpoint and the parent's straight corner.
    pub fn subdivide(&self) -> [Triangle; 2] {
        let middle = (self.a + self.b) / 2;
        let (dir0, dir1) = match self.direction {
            CurveDirection::AbToBc => (CurveDirection::AcToBc, CurveDirection::AcToAb),
            CurveDirection::AcToAb => (CurveDirection::AbToBc, CurveDirection::AcToBc),
            CurveDirection::AcToBc => (CurveDirection::AbToBc, CurveDirection::AcToAb),
        };
        [
            Triangle::new(
                middle,
                self.a,
                self.straight_corner,
                dir0,
                !self.straight_corner_is_left,
            ),
            Triangle::new(
                middle,
                self.straight_corner,
                self.b,
                dir1,
                !self.straight_corner_is_left,
            ),
        ]
    }
}
