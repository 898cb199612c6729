//! Polygon boolean operations via the geo-clipper library.
//!
//! The subdivision tree only needs one boolean query: the area of the
//! intersection of two triangle footprints, used to decide whether two
//! prisms are stacked on top of each other.

use crate::geometry::Polygon;
use crate::{unscale, CoordF, SCALING_FACTOR};
use geo::{Area, Coord as GeoCoord, LineString, Polygon as GeoPolygon};
use geo_clipper::Clipper;

/// Clipper works on floats scaled back to integers internally; this factor
/// preserves micron resolution for coordinates expressed in millimeters.
const CLIP_FACTOR: f64 = 1_000.0;

/// Convert our polygon to geo's polygon type, unscaling to millimeters.
pub fn polygon_to_geo(poly: &Polygon) -> GeoPolygon<f64> {
    let mut ring: Vec<GeoCoord<f64>> = poly
        .points()
        .iter()
        .map(|p| GeoCoord {
            x: unscale(p.x),
            y: unscale(p.y),
        })
        .collect();

    // Close the ring if needed
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last()) {
        if first != *last {
            ring.push(first);
        }
    }

    GeoPolygon::new(LineString::new(ring), vec![])
}

/// Area of the intersection of two contours, in scaled units squared.
pub fn intersection_area(a: &Polygon, b: &Polygon) -> CoordF {
    let a_geo = polygon_to_geo(a);
    let b_geo = polygon_to_geo(b);
    let result = a_geo.intersection(&b_geo, CLIP_FACTOR);
    result.unsigned_area() * SCALING_FACTOR * SCALING_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn square(x0: i64, y0: i64, side: i64) -> Polygon {
        Polygon::from_points(vec![
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ])
    }

    #[test]
    fn test_intersection_area_overlapping() {
        let a = square(0, 0, 1_000);
        let b = square(500, 0, 1_000);
        let area = intersection_area(&a, &b);
        // Overlap is 500 x 1000 microns
        assert!((area - 500_000.0).abs() < 1_000.0);
    }

    #[test]
    fn test_intersection_area_disjoint() {
        let a = square(0, 0, 1_000);
        let b = square(5_000, 5_000, 1_000);
        assert!(intersection_area(&a, &b) < 1.0);
    }

    #[test]
    fn test_intersection_area_contained() {
        let outer = square(0, 0, 4_000);
        let inner = square(1_000, 1_000, 1_000);
        let area = intersection_area(&outer, &inner);
        assert!((area - inner.area()).abs() < 1_000.0);
    }
}
