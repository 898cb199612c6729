//! Horizontal slice extraction.
//!
//! A [`SliceWalker`] is the ordered ring of leaf cells crossed by a
//! horizontal plane. It is created once at the bottom of the tree and then
//! advanced upward layer by layer: whenever the plane rises above a cell's
//! prism, the cell is replaced in place by its upstairs neighbors. The
//! ordering of the ring is the ordering of the space-filling curve, so the
//! slice polyline falls out by collecting triangle centroids.

use crate::geometry::Polygon;
use crate::tree::{CellIndex, Cross3D, Direction};
use crate::Coord;

/// An ordered horizontal sequence of leaf cells at some z.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceWalker {
    layer_sequence: Vec<CellIndex>,
}

impl SliceWalker {
    /// The cells of the current slice, in curve order.
    #[inline]
    pub fn sequence(&self) -> &[CellIndex] {
        &self.layer_sequence
    }

    /// Number of cells in the current slice.
    #[inline]
    pub fn len(&self) -> usize {
        self.layer_sequence.len()
    }

    /// Whether the walker holds no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layer_sequence.is_empty()
    }
}

impl Cross3D {
    /// The slice at the lowest z: descend first-child links to the leftmost
    /// leaf, then follow right-hand neighbor links until the curve leaves
    /// the volume.
    pub fn bottom_sequence(&self) -> SliceWalker {
        let mut last = 0usize;
        while self.cell_data[last].is_subdivided {
            match self.cell_data[last].children[0] {
                Some(child) => last = child,
                None => break,
            }
        }

        let mut layer_sequence = vec![last];
        while let Some(link) = self.cell_data[last].neighbors(Direction::Right).first() {
            last = link.to_index;
            layer_sequence.push(last);
        }
        SliceWalker { layer_sequence }
    }

    /// Advance the walker so that every cell's prism spans `new_z`.
    ///
    /// Cells whose prisms end below `new_z` are replaced in place by their
    /// upstairs neighbors, skipping neighbors already present as the
    /// immediately preceding or following cell (two horizontally adjacent
    /// cells may share one upstairs neighbor). The pass repeats until
    /// nothing is below `new_z`; if a pass cannot make progress the walker
    /// is left as it is and a warning is logged.
    pub fn advance_sequence(&self, walker: &mut SliceWalker, new_z: Coord) {
        let sequence = &mut walker.layer_sequence;
        loop {
            let mut replaced_any = false;
            let mut i = 0;
            while i < sequence.len() {
                let cell_idx = sequence[i];
                if self.cell_data[cell_idx].prism.z_range.max >= new_z {
                    i += 1;
                    continue;
                }

                let cell_before = if i > 0 { Some(sequence[i - 1]) } else { None };
                let cell_after = sequence.get(i + 1).copied();

                let neighbors_above = self.cell_data[cell_idx].neighbors(Direction::Up);
                if neighbors_above.is_empty() {
                    log::error!(
                        "cell {cell_idx} ends below z = {new_z} but has no upstairs neighbor"
                    );
                    debug_assert!(false, "walker cell without upstairs neighbors");
                    i += 1;
                    continue;
                }

                // The upstairs neighbors of the previous cell may already
                // cover this spot in the ring.
                let replacements: Vec<CellIndex> = neighbors_above
                    .iter()
                    .map(|link| link.to_index)
                    .filter(|&up| Some(up) != cell_before && Some(up) != cell_after)
                    .collect();
                if replacements.is_empty() {
                    log::debug!("all upstairs neighbors of cell {cell_idx} already in the slice");
                }

                let inserted = replacements.len();
                sequence.splice(i..=i, replacements);
                replaced_any = true;
                i += inserted;
            }

            let still_below = sequence
                .iter()
                .any(|&idx| self.cell_data[idx].prism.z_range.max < new_z);
            if !still_below {
                break;
            }
            log::warn!(
                "layers are higher than the prisms of the subdivision pattern; \
                 the pattern's fidelity does not match the layer height"
            );
            if !replaced_any {
                // No progress is possible; leave the walker in its last
                // valid state.
                break;
            }
        }
    }

    /// The slice polyline: the centroids of the walker's cells, in curve
    /// order.
    pub fn generate_sierpinski(&self, walker: &SliceWalker) -> Polygon {
        let mut poly = Polygon::with_capacity(walker.len());
        for &cell_idx in walker.sequence() {
            poly.push(self.cell_data[cell_idx].prism.triangle.middle());
        }
        poly
    }
}
