//! Triangular prisms: a 2D footprint extruded over a z interval.

use super::{Triangle, COORD_TOLERANCE};
use crate::geometry::Range;
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};

/// An upright triangular slab: a triangle footprint spanning `z_range`.
///
/// `is_expanding` tags whether the curve's cross-section widens as z
/// increases through this prism; it alternates between sibling cells and
/// between stacked z halves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prism {
    pub triangle: Triangle,
    pub z_range: Range,
    pub is_expanding: bool,
}

impl Prism {
    /// Create a new prism.
    pub const fn new(triangle: Triangle, z_min: Coord, z_max: Coord, is_expanding: bool) -> Self {
        Self {
            triangle,
            z_range: Range::new(z_min, z_max),
            is_expanding,
        }
    }

    /// The vertical extent of the prism.
    #[inline]
    pub const fn height(&self) -> Coord {
        self.z_range.size()
    }

    /// A prism is a half cube when its height matches the triangle edge from
    /// the straight corner to `b`. Half cubes subdivide into 2 children that
    /// keep the full z range.
    pub fn is_half_cube(&self) -> bool {
        let edge = self
            .triangle
            .straight_corner
            .distance(&self.triangle.b);
        (edge - self.height() as CoordF).abs() < COORD_TOLERANCE as CoordF
    }

    /// A prism is a quarter cube when its height matches the edge between
    /// `a` and `b`. Quarter cubes subdivide into 4 children, splitting the z
    /// range in half.
    pub fn is_quarter_cube(&self) -> bool {
        let edge = self.triangle.a.distance(&self.triangle.b);
        (edge - self.height() as CoordF).abs() < COORD_TOLERANCE as CoordF
    }
}
