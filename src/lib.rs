//! Cross 3D infill generator core.
//!
//! This crate builds a spatially-adaptive subdivision tree over the bounding
//! volume of a printed part and extracts a 3D space-filling curve from it.
//! The local width-per-volume of the curve follows a caller-supplied density
//! field, so stressed regions of a part receive more material than hollow
//! ones.
//!
//! The pipeline is:
//!
//! 1. [`tree::Cross3D::new`] recursively subdivides the bounding volume into
//!    triangular prisms down to a maximum depth, and aggregates the density
//!    field into per-cell volume allowances.
//! 2. [`tree::Cross3D::create_minimal_density_pattern`] activates cells until
//!    each one's actualized curve volume meets its required density, while
//!    keeping neighboring cells within one subdivision level of each other.
//! 3. [`walker::SliceWalker`] extracts the ordered ring of cells crossing a
//!    horizontal plane and advances it upward layer by layer;
//!    [`tree::Cross3D::generate_sierpinski`] turns the ring into a polyline.
//!
//! # Coordinates
//!
//! All coordinates are scaled integers with 1 unit = 1 micron
//! (`SCALING_FACTOR` units per millimeter). Areas and volumes cross over to
//! floating point millimeters via [`unscale`].

pub mod clipper;
pub mod density;
pub mod geometry;
pub mod svg;
pub mod tree;
pub mod walker;

/// Scaled integer coordinate type. 1 unit = 1 micron.
pub type Coord = i64;

/// Floating-point coordinate type, in millimeters.
pub type CoordF = f64;

/// Number of scaled units per millimeter.
pub const SCALING_FACTOR: CoordF = 1_000.0;

/// Convert millimeters to scaled integer units.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Convert scaled integer units to millimeters.
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

pub use density::{DensityProvider, UniformDensity};
pub use tree::{Cross3D, Cross3DError};
pub use walker::SliceWalker;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_roundtrip() {
        assert_eq!(scale(1.0), 1_000);
        assert_eq!(scale(0.45), 450);
        assert!((unscale(scale(12.345)) - 12.345).abs() < 1e-9);
    }

    #[test]
    fn test_unscale_is_millimeters() {
        assert!((unscale(10_000) - 10.0).abs() < 1e-12);
    }
}
