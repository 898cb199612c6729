//! SVG rendering of the tree, for visual debugging.
//!
//! Everything here is a pure function of the tree: the canvas collects
//! shapes into a string buffer and [`SvgCanvas::finish`] wraps them in an
//! `<svg>` document. Coordinates are mapped from scaled units to
//! millimeters, with the y axis flipped so the drawing matches the part's
//! orientation on the build plate.

use std::fmt::Write;

use crate::geometry::{BoundingBox, Point, Polygon};
use crate::tree::{Cell, Cross3D, Direction, Link};
use crate::unscale;
use crate::walker::SliceWalker;

/// A string-backed SVG drawing surface over a 2D viewport.
pub struct SvgCanvas {
    viewport: BoundingBox,
    body: String,
}

impl SvgCanvas {
    /// Create a canvas covering `viewport` (scaled units).
    pub fn new(viewport: BoundingBox) -> Self {
        Self {
            viewport,
            body: String::new(),
        }
    }

    fn map(&self, p: Point) -> (f64, f64) {
        (
            unscale(p.x - self.viewport.min.x),
            unscale(self.viewport.max.y - p.y),
        )
    }

    /// Draw a closed contour outline.
    pub fn write_polygon(&mut self, poly: &Polygon, color: &str, stroke_width: f64) {
        if poly.is_empty() {
            return;
        }
        self.body.push_str("<polygon points=\"");
        for p in poly.points() {
            let (x, y) = self.map(*p);
            let _ = write!(self.body, "{x:.3},{y:.3} ");
        }
        let _ = writeln!(
            self.body,
            "\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{stroke_width:.3}\"/>"
        );
    }

    /// Draw a line segment.
    pub fn write_line(&mut self, from: Point, to: Point, color: &str, stroke_width: f64) {
        let (x1, y1) = self.map(from);
        let (x2, y2) = self.map(to);
        let _ = writeln!(
            self.body,
            "<line x1=\"{x1:.3}\" y1=\"{y1:.3}\" x2=\"{x2:.3}\" y2=\"{y2:.3}\" \
             stroke=\"{color}\" stroke-width=\"{stroke_width:.3}\"/>"
        );
    }

    /// Draw a dot.
    pub fn write_point(&mut self, p: Point, color: &str, radius: f64) {
        let (cx, cy) = self.map(p);
        let _ = writeln!(
            self.body,
            "<circle cx=\"{cx:.3}\" cy=\"{cy:.3}\" r=\"{radius:.3}\" fill=\"{color}\"/>"
        );
    }

    /// Wrap the collected shapes into a complete SVG document.
    pub fn finish(self) -> String {
        let size = self.viewport.size();
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {:.3} {:.3}\">\n{}</svg>\n",
            unscale(size.x),
            unscale(size.y),
            self.body
        )
    }
}

/// Draw every triangle of the arena.
pub fn draw_tree(tree: &Cross3D, canvas: &mut SvgCanvas) {
    for cell in tree.cells().iter().skip(1) {
        draw_triangle(tree, cell, canvas);
    }
}

fn draw_triangle(_tree: &Cross3D, cell: &Cell, canvas: &mut SvgCanvas) {
    let triangle = &cell.prism.triangle;
    canvas.write_polygon(&triangle.to_polygon(), "gray", 0.05);
    canvas.write_line(
        triangle.from_edge().middle(),
        triangle.to_edge().middle(),
        "red",
        0.05,
    );
}

fn draw_link(tree: &Cross3D, from_cell: &Cell, link: &Link, canvas: &mut SvgCanvas) {
    let a = from_cell.prism.triangle.middle();
    let b = tree.cell(link.to_index).prism.triangle.middle();
    canvas.write_line(a, b, "blue", 0.03);
    canvas.write_point(a, "blue", 0.08);
}

/// Draw one cell: its triangle, curve midline and neighbor links.
pub fn draw_cell(tree: &Cross3D, cell: &Cell, canvas: &mut SvgCanvas, horizontal_only: bool) {
    draw_triangle(tree, cell, canvas);
    for side in Direction::ALL {
        if horizontal_only && matches!(side, Direction::Up | Direction::Down) {
            continue;
        }
        for link in cell.neighbors(side) {
            draw_link(tree, cell, link, canvas);
        }
    }
}

/// Draw the cells of a slice with their in-plane connections.
pub fn draw_slice(tree: &Cross3D, walker: &SliceWalker, canvas: &mut SvgCanvas) {
    for &cell_idx in walker.sequence() {
        draw_cell(tree, tree.cell(cell_idx), canvas, true);
    }
}

/// Draw every current leaf with all of its connections.
pub fn draw_leaf_sequence(tree: &Cross3D, canvas: &mut SvgCanvas) {
    draw_leaves_below(tree, 0, canvas);
}

fn draw_leaves_below(tree: &Cross3D, cell_idx: usize, canvas: &mut SvgCanvas) {
    let cell = tree.cell(cell_idx);
    if cell.is_subdivided {
        for child_idx in cell.present_children() {
            draw_leaves_below(tree, child_idx, canvas);
        }
    } else {
        draw_cell(tree, cell, canvas, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::UniformDensity;
    use crate::geometry::{BoundingBox3, Point3};
    use crate::tree::Cross3D;

    fn small_tree() -> Cross3D {
        let aabb = BoundingBox3::new(Point3::new(0, 0, 0), Point3::new(8_000, 8_000, 8_000));
        let mut tree =
            Cross3D::new(aabb, 2, 500, UniformDensity::new(1.0)).expect("valid configuration");
        tree.create_minimal_density_pattern();
        tree
    }

    #[test]
    fn test_canvas_produces_svg_document() {
        let tree = small_tree();
        let mut canvas = SvgCanvas::new(tree.aabb().flatten());
        draw_tree(&tree, &mut canvas);
        let doc = canvas.finish();
        assert!(doc.starts_with("<svg"));
        assert!(doc.ends_with("</svg>\n"));
        assert!(doc.contains("<polygon"));
        assert!(doc.contains("<line"));
    }

    #[test]
    fn test_slice_rendering_covers_walker() {
        let tree = small_tree();
        let walker = tree.bottom_sequence();
        let mut canvas = SvgCanvas::new(tree.aabb().flatten());
        draw_slice(&tree, &walker, &mut canvas);
        let doc = canvas.finish();
        // One outline per cell in the slice.
        assert_eq!(doc.matches("<polygon").count(), walker.len());
    }

    #[test]
    fn test_leaf_sequence_visits_all_leaves() {
        let tree = small_tree();
        let mut canvas = SvgCanvas::new(tree.aabb().flatten());
        draw_leaf_sequence(&tree, &mut canvas);
        let doc = canvas.finish();
        let leaf_count = tree
            .cells()
            .iter()
            .filter(|c| {
                let mut idx = c.index;
                let mut reachable = !c.is_subdivided;
                // Count only leaves reachable from the root through
                // subdivided cells.
                while reachable && idx != 0 {
                    let parent = tree
                        .cells()
                        .iter()
                        .find(|p| p.present_children().any(|ch| ch == idx));
                    match parent {
                        Some(p) => {
                            reachable = p.is_subdivided;
                            idx = p.index;
                        }
                        None => reachable = false,
                    }
                }
                reachable
            })
            .count();
        assert_eq!(doc.matches("<polygon").count(), leaf_count);
    }
}
