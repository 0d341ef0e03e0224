//! Cut guides – crosshairs at every cut-line intersection plus border
//! ticks running from the page edge to the grid.

use crate::backend::{Color, Drawable, Point};
use crate::error::Result;
use crate::geometry::SheetLayout;

/// Shortest crosshair arm, used when cards touch (no bleed, no spacing).
pub const MIN_CROSSHAIR_ARM_PT: f32 = 3.6;

/// Cut positions along one axis.
///
/// Each of the `count + 1` grid lines at `offset + i * step` yields a cut
/// `distance` inside the neighbouring cell(s). The first line only cuts
/// forward and the last only backward.
pub fn cut_points(offset: f32, step: f32, count: u32, distance: f32) -> Vec<f32> {
    let mut points = Vec::with_capacity(2 * count as usize);
    for i in 0..=count {
        let line = offset + step * i as f32;
        if i != 0 {
            points.push(line - distance);
        }
        if i != count {
            points.push(line + distance);
        }
    }
    points
}

/// Draw the guides for the current page.
pub fn draw_guides(layout: &SheetLayout, backend: &mut dyn Drawable) -> Result<()> {
    let grid = &layout.grid;
    let paper = layout.paper;
    let d = layout.guide_distance();
    let arm = d.max(MIN_CROSSHAIR_ARM_PT);

    let columns = cut_points(grid.offset.width, grid.container.width, grid.columns, d);
    let rows = cut_points(grid.offset.height, grid.container.height, grid.rows, d);

    for &r in &rows {
        for &c in &columns {
            backend.line(Point::new(c - arm, r), Point::new(c + arm, r), Color::GUIDE_GRAY)?;
            backend.line(Point::new(c, r - arm), Point::new(c, r + arm), Color::GUIDE_GRAY)?;
        }
    }

    for &c in &columns {
        backend.line(Point::new(c, 0.0), Point::new(c, grid.offset.height), Color::BLACK)?;
        backend.line(
            Point::new(c, paper.height - grid.offset.height),
            Point::new(c, paper.height),
            Color::BLACK,
        )?;
    }
    for &r in &rows {
        backend.line(Point::new(0.0, r), Point::new(grid.offset.width, r), Color::BLACK)?;
        backend.line(
            Point::new(paper.width - grid.offset.width, r),
            Point::new(paper.width, r),
            Color::BLACK,
        )?;
    }
    Ok(())
}
