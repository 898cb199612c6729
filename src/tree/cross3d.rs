//! The density-driven subdivision engine.
//!
//! [`Cross3D`] owns the cell arena. Construction builds the full tree down
//! to `max_depth` and aggregates the density field; afterwards
//! [`Cross3D::create_minimal_density_pattern`] walks the tree and activates
//! subdivisions until every cell carries at least its requested material
//! density, keeping adjacent cells within one level of each other.
//!
//! Cells are addressed by index throughout: the arena grows while the tree
//! is created, so borrowed references must never be cached across a
//! mutation.

use std::collections::VecDeque;

use super::{
    Cell, CellIndex, Cross3DError, CurveDirection, Direction, Link, LinkPairId, Prism, Triangle,
    AREA_TOLERANCE, COORD_TOLERANCE,
};
use crate::clipper;
use crate::density::DensityProvider;
use crate::geometry::{BoundingBox, BoundingBox3, LineSegment, Point, Point3, Range};
use crate::{unscale, Coord, CoordF, SCALING_FACTOR};

/// Spatially-adaptive subdivision tree producing a 3D space-filling curve.
pub struct Cross3D {
    pub(crate) cell_data: Vec<Cell>,
    aabb: BoundingBox3,
    max_depth: usize,
    line_width: Coord,
    density_provider: Box<dyn DensityProvider>,
    next_pair_id: LinkPairId,
}

impl Cross3D {
    /// Build the subdivision tree over `aabb` (scaled units), with leaves no
    /// deeper than `max_depth` and a nominal extrusion width of
    /// `line_width`.
    ///
    /// The density provider is queried once per leaf prism; construction
    /// aggregates its answers bottom-up into per-cell volume allowances.
    pub fn new(
        aabb: BoundingBox3,
        max_depth: usize,
        line_width: Coord,
        density_provider: impl DensityProvider + 'static,
    ) -> Result<Self, Cross3DError> {
        let size = aabb.size();
        if size.x <= 0 || size.y <= 0 || size.z <= 0 {
            return Err(Cross3DError::DegenerateBounds(size.x, size.y, size.z));
        }
        if max_depth < 1 {
            return Err(Cross3DError::InvalidMaxDepth(max_depth));
        }
        if line_width <= 0 {
            return Err(Cross3DError::InvalidLineWidth(line_width));
        }

        let mut tree = Self {
            cell_data: Vec::new(),
            aabb,
            max_depth,
            line_width,
            density_provider: Box::new(density_provider),
            next_pair_id: 0,
        };
        tree.create_tree();

        #[cfg(debug_assertions)]
        {
            debug_assert_eq!(tree.debug_check_depths(), 0);
            debug_assert_eq!(tree.debug_check_volume_stats(), 0);
        }
        log::debug!(
            "created cross 3d tree with {} cells and max depth {}",
            tree.cell_data.len(),
            max_depth
        );
        Ok(tree)
    }

    /// The cell arena. Index 0 is the sentinel root.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cell_data
    }

    /// A single cell by index.
    #[inline]
    pub fn cell(&self, index: CellIndex) -> &Cell {
        &self.cell_data[index]
    }

    /// The bounding volume the tree was built over.
    #[inline]
    pub fn aabb(&self) -> &BoundingBox3 {
        &self.aabb
    }

    /// The depth cap leaves were built to.
    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The nominal extrusion width, in scaled units.
    #[inline]
    pub fn line_width(&self) -> Coord {
        self.line_width
    }

    // ------------------------------------------------------------------
    // Tree creation
    // ------------------------------------------------------------------

    fn create_tree(&mut self) {
        debug_assert!(self.cell_data.is_empty());
        self.cell_data.reserve(2 << (self.max_depth / 2));

        // Sentinel root: no valid prism, only aggregate stats.
        self.cell_data.push(Cell::new(Prism::default(), 0, 0));
        let size = self.aabb.size();
        self.cell_data[0].volume = unscale(size.x) * unscale(size.y) * unscale(size.z);

        // The footprint splits along its diagonal into an upper-left and a
        // lower-right triangle; together they host a closed curve.
        let aabb2d = self.aabb.flatten();
        let first_triangle = Triangle::new(
            Point::new(aabb2d.min.x, aabb2d.max.y),
            aabb2d.min,
            aabb2d.max,
            CurveDirection::AcToAb,
            true,
        );
        let first_idx = self.cell_data.len();
        self.cell_data[0].children[0] = Some(first_idx);
        self.cell_data.push(Cell::new(
            Prism::new(first_triangle, self.aabb.min.z, self.aabb.max.z, true),
            first_idx,
            1,
        ));
        self.create_subtree(first_idx);
        self.set_volume(first_idx);

        let second_triangle = Triangle::new(
            Point::new(aabb2d.max.x, aabb2d.min.y),
            aabb2d.max,
            aabb2d.min,
            CurveDirection::AbToBc,
            true,
        );
        let second_idx = self.cell_data.len();
        self.cell_data[0].children[1] = Some(second_idx);
        self.cell_data.push(Cell::new(
            Prism::new(second_triangle, self.aabb.min.z, self.aabb.max.z, true),
            second_idx,
            1,
        ));
        self.create_subtree(second_idx);
        self.set_volume(second_idx);

        self.set_specification_allowance(0);
    }

    fn create_subtree(&mut self, node_idx: CellIndex) {
        let parent_depth = self.cell_data[node_idx].depth;
        if parent_depth >= self.max_depth {
            return;
        }

        let parent_prism = self.cell_data[node_idx].prism;
        let xy_children = parent_prism.triangle.subdivide();

        let child_count = if parent_prism.is_half_cube() { 2 } else { 4 };
        let mut child_z_min = parent_prism.z_range.min;
        let mut child_z_max = if child_count == 2 {
            parent_prism.z_range.max
        } else {
            (parent_prism.z_range.min + parent_prism.z_range.max) / 2
        };

        for child_z_idx in 0..2usize {
            if child_z_idx == child_count / 2 {
                // Half cubes have no upper z pair; slots 2 and 3 stay empty.
                break;
            }
            for child_xy_idx in 0..2usize {
                let child_slot = child_z_idx * 2 + child_xy_idx;
                let mut is_expanding = if parent_prism.triangle.direction != CurveDirection::AcToBc
                    && child_xy_idx == 1
                {
                    !parent_prism.is_expanding
                } else {
                    parent_prism.is_expanding
                };
                if child_z_idx == 1 {
                    // The upper z half expands oppositely to the lower half.
                    is_expanding = !is_expanding;
                }

                let child_idx = self.cell_data.len();
                self.cell_data[node_idx].children[child_slot] = Some(child_idx);
                self.cell_data.push(Cell::new(
                    Prism::new(
                        xy_children[child_xy_idx],
                        child_z_min,
                        child_z_max,
                        is_expanding,
                    ),
                    child_idx,
                    parent_depth + 1,
                ));
                self.create_subtree(child_idx);
            }
            child_z_min = child_z_max;
            child_z_max = parent_prism.z_range.max;
        }
    }

    fn set_volume(&mut self, node_idx: CellIndex) {
        let prism = self.cell_data[node_idx].prism;
        let ac = prism.triangle.straight_corner - prism.triangle.a;
        let area_mm2 = 0.5 * ac.length_squared() as CoordF / (SCALING_FACTOR * SCALING_FACTOR);
        self.cell_data[node_idx].volume = area_mm2 * unscale(prism.height());

        let children = self.cell_data[node_idx].children;
        for child_idx in children.iter().flatten() {
            self.set_volume(*child_idx);
        }
    }

    fn set_specification_allowance(&mut self, node_idx: CellIndex) {
        let children = self.cell_data[node_idx].children;
        if children[0].is_some() {
            for child_idx in children.iter().flatten() {
                self.set_specification_allowance(*child_idx);
                let child = &self.cell_data[*child_idx];
                let (allowance, density) =
                    (child.filled_volume_allowance, child.minimally_required_density);
                let node = &mut self.cell_data[node_idx];
                node.filled_volume_allowance += allowance;
                node.minimally_required_density = node.minimally_required_density.max(density);
            }
        } else {
            let requested_density = self.density_for(node_idx);
            let node = &mut self.cell_data[node_idx];
            node.minimally_required_density = requested_density;
            node.filled_volume_allowance = node.volume * requested_density;
        }
    }

    /// The density requested for a cell's region, from the provider.
    fn density_for(&self, node_idx: CellIndex) -> CoordF {
        let cell = &self.cell_data[node_idx];
        let triangle = &cell.prism.triangle;
        let mut footprint = BoundingBox::new();
        footprint.merge_point(triangle.straight_corner);
        footprint.merge_point(triangle.a);
        footprint.merge_point(triangle.b);
        let region = BoundingBox3::new(
            Point3::new(footprint.min.x, footprint.min.y, cell.prism.z_range.min),
            Point3::new(footprint.max.x, footprint.max.y, cell.prism.z_range.max),
        );
        self.density_provider.density_at(&region)
    }

    // ------------------------------------------------------------------
    // Density-driven subdivision
    // ------------------------------------------------------------------

    /// Volume of the curve segment crossing `cell`, in cubic millimeters:
    /// the extrusion width times the distance between the midpoints of the
    /// entry and exit edges, times the prism height.
    pub fn actualized_volume(&self, cell: &Cell) -> CoordF {
        let triangle = &cell.prism.triangle;
        let ac_middle = (triangle.a + triangle.straight_corner) / 2;
        let bc_middle = (triangle.b + triangle.straight_corner) / 2;
        let ab_middle = (triangle.a + triangle.b) / 2;
        let (from_middle, to_middle) = match triangle.direction {
            CurveDirection::AcToAb => (ac_middle, ab_middle),
            CurveDirection::AcToBc => (ac_middle, bc_middle),
            CurveDirection::AbToBc => (ab_middle, bc_middle),
        };
        unscale(self.line_width)
            * (from_middle.distance(&to_middle) / SCALING_FACTOR)
            * unscale(cell.prism.height())
    }

    /// Whether the curve through a cell is too sparse for its requested
    /// density.
    fn should_be_subdivided(&self, cell_idx: CellIndex) -> bool {
        let cell = &self.cell_data[cell_idx];
        self.actualized_volume(cell) / cell.volume < cell.minimally_required_density
    }

    /// Subdivide cells until every one of them actualizes at least its
    /// minimally required density, or hits the depth cap.
    ///
    /// The queue is FIFO for normal progress; when a cell is constrained by
    /// a less-deep neighbor, the constraining neighbors are pushed to the
    /// front so they are handled first. The ordering is contractual: it
    /// determines the resulting tree when ties occur.
    pub fn create_minimal_density_pattern(&mut self) {
        let mut to_be_subdivided: VecDeque<CellIndex> = VecDeque::new();
        debug_assert!(!self.cell_data.is_empty());
        // The sentinel root is always subdivided first; it connects the two
        // whole-volume triangles.
        to_be_subdivided.push_back(0);

        while let Some(&cell_idx) = to_be_subdivided.front() {
            let cell = &self.cell_data[cell_idx];
            if cell.children[0].is_none() || cell.depth >= self.max_depth || cell.is_subdivided {
                // Leaf, or a constraint escalation already handled it.
                to_be_subdivided.pop_front();
                continue;
            }

            if !self.is_constrained(cell_idx) {
                to_be_subdivided.pop_front();
                self.subdivide(cell_idx);
                let children = self.cell_data[cell_idx].children;
                for child_idx in children.iter().flatten() {
                    if self.should_be_subdivided(*child_idx) {
                        to_be_subdivided.push_back(*child_idx);
                    }
                }
            } else {
                // Escalate: the constraining neighbors must catch up before
                // this cell may split.
                let mut constrainers: Vec<CellIndex> = Vec::new();
                let cell = &self.cell_data[cell_idx];
                for side in &cell.adjacent_cells {
                    for link in side {
                        if self.is_constrained_by(cell_idx, link.to_index) {
                            constrainers.push(link.to_index);
                        }
                    }
                }
                for neighbor_idx in constrainers {
                    to_be_subdivided.push_front(neighbor_idx);
                }
            }
        }
        log::debug!("minimal density pattern complete");
    }

    // ------------------------------------------------------------------
    // Adjacency management
    // ------------------------------------------------------------------

    fn next_pair(&mut self) -> LinkPairId {
        let id = self.next_pair_id;
        self.next_pair_id += 1;
        id
    }

    /// Connect two fresh sibling cells with a mutual link in `dir` (and its
    /// opposite), at the front of both lists.
    fn initial_connection(&mut self, before: CellIndex, after: CellIndex, dir: Direction) {
        let pair = self.next_pair();
        self.cell_data[before].adjacent_cells[dir as usize].insert(
            0,
            Link {
                to_index: after,
                pair,
            },
        );
        self.cell_data[after].adjacent_cells[dir.opposite() as usize].insert(
            0,
            Link {
                to_index: before,
                pair,
            },
        );
    }

    /// Whether `cell_idx` may be subdivided: not at the depth cap and not
    /// constrained by a less-deep neighbor.
    pub fn can_subdivide(&self, cell_idx: CellIndex) -> bool {
        self.cell_data[cell_idx].depth < self.max_depth && !self.is_constrained(cell_idx)
    }

    /// Whether any neighbor is less deep than this cell. Subdividing a
    /// constrained cell would break the one-level balance of the graph.
    pub fn is_constrained(&self, cell_idx: CellIndex) -> bool {
        let cell = &self.cell_data[cell_idx];
        cell.adjacent_cells
            .iter()
            .flatten()
            .any(|link| self.is_constrained_by(cell_idx, link.to_index))
    }

    /// Whether `constrainer` blocks subdivision of `constrainee`.
    /// Equal-depth neighbors never constrain.
    #[inline]
    pub fn is_constrained_by(&self, constrainee: CellIndex, constrainer: CellIndex) -> bool {
        self.cell_data[constrainer].depth < self.cell_data[constrainee].depth
    }

    /// Rewire the adjacency graph from `cell_idx` to its children.
    ///
    /// New sibling links are created first; every external link of the
    /// parent is then replayed against each child and distributed to the one
    /// or two children actually touching that neighbor. The neighbor's
    /// back-links to the children are inserted immediately before its old
    /// back-link to the parent, which is erased afterwards, so the
    /// neighbor's list order is preserved.
    pub(crate) fn subdivide(&mut self, cell_idx: CellIndex) {
        debug_assert!(self.can_subdivide(cell_idx));
        let children = self.cell_data[cell_idx].children;
        let (Some(child_lb), Some(child_rb)) = (children[0], children[1]) else {
            log::error!("subdivision of cell {cell_idx} without initialized children");
            debug_assert!(false, "children must be initialized for subdivision");
            return;
        };

        self.initial_connection(child_lb, child_rb, Direction::Right);
        if let (Some(child_lt), Some(child_rt)) = (children[2], children[3]) {
            self.initial_connection(child_lt, child_rt, Direction::Right);
            self.initial_connection(child_lb, child_lt, Direction::Up);
            self.initial_connection(child_rb, child_rt, Direction::Up);
        }

        for side in Direction::ALL {
            // A neighbor of the parent borders either one or two of the
            // children; each of its parent links is replaced by that many
            // child links.
            let parent_links = std::mem::take(&mut self.cell_data[cell_idx].adjacent_cells[side as usize]);
            for parent_link in &parent_links {
                let neighbor_idx = parent_link.to_index;
                for child_idx in children.iter().flatten().copied() {
                    if !self.is_next_to(child_idx, neighbor_idx, side) {
                        continue;
                    }
                    let pair = self.next_pair();
                    self.cell_data[child_idx].adjacent_cells[side as usize].insert(
                        0,
                        Link {
                            to_index: neighbor_idx,
                            pair,
                        },
                    );
                    let neighbor_links =
                        &mut self.cell_data[neighbor_idx].adjacent_cells[side.opposite() as usize];
                    let back_pos = neighbor_links
                        .iter()
                        .position(|l| l.pair == parent_link.pair)
                        .unwrap_or(neighbor_links.len());
                    neighbor_links.insert(
                        back_pos,
                        Link {
                            to_index: child_idx,
                            pair,
                        },
                    );
                }

                let neighbor_links =
                    &mut self.cell_data[neighbor_idx].adjacent_cells[side.opposite() as usize];
                if let Some(back_pos) = neighbor_links
                    .iter()
                    .position(|l| l.pair == parent_link.pair)
                {
                    neighbor_links.remove(back_pos);
                } else {
                    log::error!(
                        "missing back-link from cell {neighbor_idx} to cell {cell_idx}"
                    );
                    debug_assert!(false, "link pairing is broken");
                }
            }
        }

        self.cell_data[cell_idx].is_subdivided = true;
    }

    /// Whether cells `a` and `b` touch across side `side` of `a`.
    ///
    /// Along z the footprints must overlap almost completely (the smaller
    /// footprint is contained in the larger up to `AREA_TOLERANCE`) and the
    /// z ranges must meet within `COORD_TOLERANCE`. In the plane, the
    /// relevant entry/exit edges must be collinear and overlap by more than
    /// `COORD_TOLERANCE` along their shared line.
    pub fn is_next_to(&self, a: CellIndex, b: CellIndex, side: Direction) -> bool {
        let cell_a = &self.cell_data[a];
        let cell_b = &self.cell_data[b];
        let (a_edge, b_edge): (LineSegment, LineSegment) = match side {
            Direction::Up | Direction::Down => {
                if !cell_a
                    .prism
                    .z_range
                    .overlaps(&cell_b.prism.z_range.expanded(COORD_TOLERANCE))
                {
                    return false;
                }
                let a_polygon = cell_a.prism.triangle.to_polygon();
                let b_polygon = cell_b.prism.triangle.to_polygon();
                let smaller_area = a_polygon.area().min(b_polygon.area());
                let overlap = clipper::intersection_area(&a_polygon, &b_polygon);
                return (overlap - smaller_area).abs() < AREA_TOLERANCE;
            }
            Direction::Left => (
                cell_a.prism.triangle.from_edge(),
                cell_b.prism.triangle.to_edge(),
            ),
            Direction::Right => (
                cell_a.prism.triangle.to_edge(),
                cell_b.prism.triangle.from_edge(),
            ),
        };

        if !a_edge.is_collinear_with(&b_edge, COORD_TOLERANCE) {
            return false;
        }
        let a_vector = a_edge.vector();
        let a_size = a_edge.length().round() as Coord;
        debug_assert!(a_size > 0);
        if a_size <= 0 {
            return false;
        }
        let a_projected = Range::new(0, a_size);
        let mut b_projected = Range::empty();
        b_projected.include(((b_edge.from - a_edge.from).dot(&a_vector) / a_size as i128) as Coord);
        b_projected.include(((b_edge.to - a_edge.from).dot(&a_vector) / a_size as i128) as Coord);
        a_projected.intersection(&b_projected).size() > COORD_TOLERANCE
    }

    // ------------------------------------------------------------------
    // Invariant sweeps
    // ------------------------------------------------------------------

    /// Check that every child is exactly one level deeper than its parent.
    /// Returns the number of violations found (each is logged).
    pub fn debug_check_depths(&self) -> usize {
        let mut problems = 0;
        for cell in &self.cell_data {
            for child_idx in cell.present_children() {
                if self.cell_data[child_idx].depth != cell.depth + 1 {
                    problems += 1;
                    log::error!(
                        "cell at depth {} has a child at depth {}",
                        cell.depth,
                        self.cell_data[child_idx].depth
                    );
                }
            }
        }
        problems
    }

    /// Check per-cell volume bookkeeping: positive volumes, non-negative
    /// allowances and densities, and parents covering their children's
    /// allowances. Returns the number of violations found (each is logged).
    pub fn debug_check_volume_stats(&self) -> usize {
        const ALLOWANCE_SLACK: CoordF = 0.1;
        let mut problems = 0;
        for cell in &self.cell_data {
            if cell.volume <= 0.0 {
                problems += 1;
                log::error!("cell at depth {} has volume {}", cell.depth, cell.volume);
            }
            if cell.filled_volume_allowance < 0.0 {
                problems += 1;
                log::error!(
                    "cell at depth {} has filled volume allowance {}",
                    cell.depth,
                    cell.filled_volume_allowance
                );
            }
            if cell.minimally_required_density < 0.0 {
                problems += 1;
                log::error!(
                    "cell at depth {} has required density {}",
                    cell.depth,
                    cell.minimally_required_density
                );
            }
            let children_allowance: CoordF = cell
                .present_children()
                .map(|child_idx| self.cell_data[child_idx].filled_volume_allowance)
                .sum();
            if cell.filled_volume_allowance < children_allowance - ALLOWANCE_SLACK {
                problems += 1;
                log::error!(
                    "cell at depth {} allows less volume than its children",
                    cell.depth
                );
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::UniformDensity;

    fn cube_aabb(side: Coord) -> BoundingBox3 {
        BoundingBox3::new(Point3::new(0, 0, 0), Point3::new(side, side, side))
    }

    fn build(side: Coord, max_depth: usize, density: CoordF) -> Cross3D {
        Cross3D::new(
            cube_aabb(side),
            max_depth,
            500,
            UniformDensity::new(density),
        )
        .expect("valid configuration")
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let flat = BoundingBox3::new(Point3::new(0, 0, 0), Point3::new(1_000, 1_000, 0));
        assert!(matches!(
            Cross3D::new(flat, 2, 500, UniformDensity::new(0.5)),
            Err(Cross3DError::DegenerateBounds(..))
        ));
        assert!(matches!(
            Cross3D::new(cube_aabb(1_000), 0, 500, UniformDensity::new(0.5)),
            Err(Cross3DError::InvalidMaxDepth(0))
        ));
        assert!(matches!(
            Cross3D::new(cube_aabb(1_000), 2, 0, UniformDensity::new(0.5)),
            Err(Cross3DError::InvalidLineWidth(0))
        ));
    }

    #[test]
    fn test_level_one_layout() {
        let tree = build(8_000, 1, 0.5);
        // Sentinel root plus the two whole-volume triangles.
        assert_eq!(tree.cells().len(), 3);
        let root = tree.cell(0);
        assert_eq!(root.depth, 0);
        assert_eq!(root.children[0], Some(1));
        assert_eq!(root.children[1], Some(2));
        assert_eq!(root.child_count(), 2);

        let first = tree.cell(1);
        let second = tree.cell(2);
        assert_eq!(first.depth, 1);
        assert_eq!(first.prism.triangle.direction, CurveDirection::AcToAb);
        assert_eq!(second.prism.triangle.direction, CurveDirection::AbToBc);
        assert!(first.prism.triangle.straight_corner_is_left);
        // A cube bounding volume makes the level-1 prisms half cubes.
        assert!(first.prism.is_half_cube());
        assert!(second.prism.is_half_cube());
    }

    #[test]
    fn test_half_and_quarter_alternation() {
        let tree = build(8_000, 3, 0.5);
        let first = tree.cell(1);
        // Half cube: two children spanning the full z range.
        assert_eq!(first.child_count(), 2);
        let child_idx = first.children[0].unwrap();
        let child = tree.cell(child_idx);
        assert_eq!(child.prism.z_range, first.prism.z_range);
        // The grandchildren come from a quarter cube and split the z range.
        assert!(child.prism.is_quarter_cube());
        assert_eq!(child.child_count(), 4);
        let lower = tree.cell(child.children[0].unwrap());
        let upper = tree.cell(child.children[2].unwrap());
        assert_eq!(lower.prism.z_range, Range::new(0, 4_000));
        assert_eq!(upper.prism.z_range, Range::new(4_000, 8_000));
        // xy pairs share z slabs.
        assert_eq!(
            tree.cell(child.children[1].unwrap()).prism.z_range,
            lower.prism.z_range
        );
    }

    #[test]
    fn test_volumes_partition_the_bounding_volume() {
        let tree = build(8_000, 4, 0.5);
        let root_volume = tree.cell(0).volume;
        assert!((root_volume - 8.0 * 8.0 * 8.0).abs() < 1e-6);

        // Full-depth leaves tile the volume exactly.
        let leaf_sum: CoordF = tree
            .cells()
            .iter()
            .filter(|c| c.depth > 0 && c.children[0].is_none())
            .map(|c| c.volume)
            .sum();
        assert!((leaf_sum - root_volume).abs() < 1e-6);
    }

    #[test]
    fn test_allowance_aggregation() {
        let density = 0.3;
        let tree = build(8_000, 3, density);
        let root = tree.cell(0);
        assert!((root.filled_volume_allowance - root.volume * density).abs() < 1e-6);
        assert!((root.minimally_required_density - density).abs() < 1e-12);
        for cell in tree.cells() {
            let child_sum: CoordF = cell
                .present_children()
                .map(|i| tree.cell(i).filled_volume_allowance)
                .sum();
            if cell.children[0].is_some() {
                assert!((cell.filled_volume_allowance - child_sum).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_is_expanding_flips_for_second_xy_child() {
        let tree = build(8_000, 2, 0.5);
        let first = tree.cell(1);
        assert!(first.prism.is_expanding);
        // Direction AcToAb: the second xy child flips.
        let c0 = tree.cell(first.children[0].unwrap());
        let c1 = tree.cell(first.children[1].unwrap());
        assert!(c0.prism.is_expanding);
        assert!(!c1.prism.is_expanding);
    }

    #[test]
    fn test_level_one_cells_are_right_neighbors() {
        let mut tree = build(8_000, 2, 0.5);
        tree.subdivide(0);
        let first = tree.cell(1);
        let second = tree.cell(2);
        assert_eq!(first.neighbors(Direction::Right).len(), 1);
        assert_eq!(first.neighbors(Direction::Right)[0].to_index, 2);
        assert_eq!(second.neighbors(Direction::Left).len(), 1);
        assert_eq!(second.neighbors(Direction::Left)[0].to_index, 1);
        assert!(tree.cell(0).is_subdivided);
        // The exit edge of the first triangle meets the entry edge of the
        // second along the footprint diagonal.
        assert!(tree.is_next_to(1, 2, Direction::Right));
        assert!(tree.is_next_to(2, 1, Direction::Left));
    }

    #[test]
    fn test_subdivide_rewires_external_links() {
        let mut tree = build(8_000, 3, 0.5);
        tree.subdivide(0);
        // Subdivide the first triangle; the second must now link to its
        // children instead.
        tree.subdivide(1);
        assert!(tree.cell(1).adjacent_cells.iter().all(|side| side.is_empty()));
        let second = tree.cell(2);
        assert_eq!(second.neighbors(Direction::Left).len(), 1);
        let left_neighbor = second.neighbors(Direction::Left)[0].to_index;
        let children: Vec<_> = tree.cell(1).present_children().collect();
        assert!(children.contains(&left_neighbor));
        // Pairing stays intact on every link in the tree.
        for cell in tree.cells() {
            for side in Direction::ALL {
                for link in cell.neighbors(side) {
                    let reverse: Vec<_> = tree
                        .cell(link.to_index)
                        .neighbors(side.opposite())
                        .iter()
                        .filter(|l| l.pair == link.pair)
                        .collect();
                    assert_eq!(reverse.len(), 1);
                    assert_eq!(reverse[0].to_index, cell.index);
                }
            }
        }
    }

    #[test]
    fn test_constraint_blocks_deep_subdivision() {
        let mut tree = build(8_000, 3, 0.5);
        tree.subdivide(0);
        tree.subdivide(1);
        // Children of the first triangle that still border the unsubdivided
        // second triangle are one level deeper than it, so they may not
        // split again before it does.
        let mut saw_constrained = false;
        for child_idx in tree.cell(1).present_children().collect::<Vec<_>>() {
            let borders_second = tree
                .cell(child_idx)
                .adjacent_cells
                .iter()
                .flatten()
                .any(|l| l.to_index == 2);
            if borders_second {
                saw_constrained = true;
                assert!(tree.is_constrained(child_idx));
                assert!(!tree.can_subdivide(child_idx));
            }
        }
        assert!(saw_constrained);
    }

    #[test]
    fn test_minimal_density_pattern_balance() {
        let mut tree = build(10_000, 4, 0.4);
        tree.create_minimal_density_pattern();
        for cell in tree.cells() {
            for link in cell.adjacent_cells.iter().flatten() {
                let a = cell.depth as i64;
                let b = tree.cell(link.to_index).depth as i64;
                assert!((a - b).abs() <= 1, "neighbors {a} and {b} out of balance");
            }
        }
        // Every cell still in play either meets its density or sits at the
        // depth cap.
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let cell = tree.cell(idx);
            if cell.is_subdivided {
                stack.extend(cell.present_children());
            } else if cell.depth > 0 && cell.depth < tree.max_depth() {
                let ratio = tree.actualized_volume(cell) / cell.volume;
                assert!(ratio >= cell.minimally_required_density - 1e-9);
            }
        }
    }

    #[test]
    fn test_actualized_volume_formula() {
        let tree = build(8_000, 1, 0.5);
        let first = tree.cell(1);
        // Direction AcToAb: from the middle of ac to the middle of ab.
        let t = &first.prism.triangle;
        let expected_distance =
            ((t.a + t.straight_corner) / 2).distance(&((t.a + t.b) / 2)) / SCALING_FACTOR;
        let expected = 0.5 * expected_distance * 8.0;
        assert!((tree.actualized_volume(first) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_invariant_sweeps_are_clean() {
        let tree = build(10_000, 3, 0.8);
        assert_eq!(tree.debug_check_depths(), 0);
        assert_eq!(tree.debug_check_volume_stats(), 0);
    }
}
