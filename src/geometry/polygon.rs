//! Closed polygon contours.

use super::Point;
use crate::CoordF;
use serde::{Deserialize, Serialize};

/// A closed polygon defined by a sequence of points.
///
/// The polygon is implicitly closed: the last point connects back to the
/// first. Counter-clockwise orientation has positive signed area.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Create a new empty polygon.
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a polygon from a vector of points.
    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Create a polygon with the given capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// The points of this polygon.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the polygon has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a point.
    #[inline]
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Signed area in scaled units squared (shoelace formula). Positive for
    /// counter-clockwise orientation.
    pub fn signed_area(&self) -> CoordF {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut doubled: i128 = 0;
        for i in 0..self.points.len() {
            let j = (i + 1) % self.points.len();
            doubled += self.points[i].cross(&self.points[j]);
        }
        doubled as CoordF / 2.0
    }

    /// Absolute area in scaled units squared.
    #[inline]
    pub fn area(&self) -> CoordF {
        self.signed_area().abs()
    }

    /// Total length of the closed contour, in scaled units.
    pub fn perimeter(&self) -> CoordF {
        if self.points.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 0..self.points.len() {
            let j = (i + 1) % self.points.len();
            total += self.points[i].distance(&self.points[j]);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(side: i64) -> Polygon {
        Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(side, 0),
            Point::new(side, side),
            Point::new(0, side),
        ])
    }

    #[test]
    fn test_signed_area_orientation() {
        let ccw = unit_square(1_000);
        assert!((ccw.signed_area() - 1_000_000.0).abs() < 1e-9);

        let cw = Polygon::from_points(ccw.points().iter().rev().copied().collect());
        assert!((cw.signed_area() + 1_000_000.0).abs() < 1e-9);
        assert!((cw.area() - 1_000_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_area() {
        let mut poly = Polygon::new();
        poly.push(Point::new(0, 0));
        poly.push(Point::new(1_000, 0));
        assert_eq!(poly.signed_area(), 0.0);
    }

    #[test]
    fn test_perimeter() {
        let square = unit_square(1_000);
        assert!((square.perimeter() - 4_000.0).abs() < 1e-9);
    }
}
