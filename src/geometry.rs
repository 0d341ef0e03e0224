//! Geometry – pure functions that size the card grid on a sheet.
//!
//! All values are PDF points (1 pt = 1/72 inch) measured from the top-left
//! corner of the page. Nothing in here holds state; the results are computed
//! once per print run and threaded through rendering via [`SheetLayout`].

use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, Result};

/// Extra width added to each bleed container so neighbouring art overlaps
/// instead of leaving a white seam after rasterisation.
pub const HAIRLINE_PT: f32 = 0.01;

/// Per-side crop applied on top of the bleed when no zoom is configured.
pub const DEFAULT_ZOOM_INSET_PT: f32 = 0.04 * 72.0;

/// A width/height pair in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub const ZERO: Dimensions = Dimensions {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The same length on both axes.
    pub const fn splat(v: f32) -> Self {
        Self {
            width: v,
            height: v,
        }
    }

    /// Component-wise product with a column/row count.
    pub fn scale(self, columns: u32, rows: u32) -> Self {
        Self {
            width: self.width * columns as f32,
            height: self.height * rows as f32,
        }
    }
}

impl Add for Dimensions {
    type Output = Dimensions;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.width + rhs.width, self.height + rhs.height)
    }
}

impl Sub for Dimensions {
    type Output = Dimensions;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.width - rhs.width, self.height - rhs.height)
    }
}

impl Mul<f32> for Dimensions {
    type Output = Dimensions;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.width * rhs, self.height * rhs)
    }
}

impl Div<f32> for Dimensions {
    type Output = Dimensions;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.width / rhs, self.height / rhs)
    }
}

/// Grid sizing derived from paper, card, spacing and bleed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub columns: u32,
    pub rows: u32,
    /// Footprint of one grid cell.
    pub container: Dimensions,
    /// Top-left corner of the grid, centring it on the page.
    pub offset: Dimensions,
}

impl GridSpec {
    pub fn cards_per_sheet(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Top-left corner of cell `(column, row)`.
    pub fn cell(&self, column: u32, row: u32) -> Dimensions {
        self.offset + self.container.scale(column, row)
    }
}

/// Space taken by `count` items of `size` with `count - 1` interior gaps.
///
/// For bleed layouts pass a `size` that already includes the margins and a
/// zero `spacing`.
pub fn occupied_space(size: Dimensions, columns: u32, rows: u32, spacing: Dimensions) -> Dimensions {
    let gaps = |n: u32| n.saturating_sub(1);
    size.scale(columns, rows) + spacing.scale(gaps(columns), gaps(rows))
}

/// Fit as many containers as possible onto the paper and centre the grid.
///
/// A positive `bleed` drops the spacing and grows each container by the
/// bleed on every side.
pub fn compute_grid(paper: Dimensions, card: Dimensions, spacing: f32, bleed: f32) -> Result<GridSpec> {
    let container = if bleed > 0.0 {
        card + Dimensions::splat(2.0 * bleed + HAIRLINE_PT)
    } else {
        card + Dimensions::splat(spacing)
    };

    if container.width <= 0.0 || container.height <= 0.0 {
        return Err(ProxyError::config(format!(
            "card container must be positive, got {:.2}x{:.2}pt",
            container.width, container.height
        )));
    }

    let columns = (paper.width / container.width).floor().max(0.0) as u32;
    let rows = (paper.height / container.height).floor().max(0.0) as u32;
    if columns == 0 || rows == 0 {
        return Err(ProxyError::LayoutInfeasible { paper, container });
    }

    Ok(GridSpec {
        columns,
        rows,
        container,
        offset: compute_offset(paper, columns, rows, container),
    })
}

/// Margin that centres a `columns x rows` grid of containers on the paper.
pub fn compute_offset(paper: Dimensions, columns: u32, rows: u32, container: Dimensions) -> Dimensions {
    (paper - occupied_space(container, columns, rows, Dimensions::ZERO)) / 2.0
}

/// Art rendered larger than the card and centre-cropped to its container,
/// pushing the printed border past the cut line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomCrop {
    /// Size the source art is resized to.
    pub render: Dimensions,
    /// Region kept after cropping (the grid container).
    pub keep: Dimensions,
    /// Amount trimmed from the left/top edge.
    pub inset: Dimensions,
}

impl ZoomCrop {
    pub fn new(card: Dimensions, container: Dimensions, zoom_margin: Dimensions) -> Self {
        let render = card + zoom_margin;
        Self {
            render,
            keep: container,
            inset: (render - container) / 2.0,
        }
    }

    /// Zoom margin used when bleed is on and none was configured.
    pub fn default_margin(bleed: f32) -> Dimensions {
        Dimensions::splat(2.0 * bleed + 2.0 * DEFAULT_ZOOM_INSET_PT)
    }
}

/// Convert points to whole pixels at `dpi`.
pub fn pt_to_px(pt: f32, dpi: f32) -> u32 {
    (pt * dpi / 72.0).round().max(1.0) as u32
}

/// Everything the renderer and guide drawer need about one print run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetLayout {
    pub paper: Dimensions,
    pub card: Dimensions,
    pub grid: GridSpec,
    /// Effective spacing (zero when bleed is on).
    pub spacing: f32,
    pub bleed: f32,
    pub zoom: Option<ZoomCrop>,
    pub show_guides: bool,
}

impl SheetLayout {
    /// Build the layout for a run, validating the grid and the zoom margin.
    pub fn new(
        paper: Dimensions,
        card: Dimensions,
        spacing: f32,
        bleed: f32,
        zoom_margin: Option<f32>,
        show_guides: bool,
    ) -> Result<Self> {
        if bleed < 0.0 || spacing < 0.0 {
            return Err(ProxyError::config("spacing and bleed must not be negative"));
        }
        let grid = compute_grid(paper, card, spacing, bleed)?;

        let zoom = if bleed > 0.0 {
            let margin = match zoom_margin {
                Some(z) if z < 2.0 * bleed => {
                    return Err(ProxyError::config(format!(
                        "zoom margin {z:.2}pt is smaller than twice the bleed ({:.2}pt)",
                        2.0 * bleed
                    )));
                }
                Some(z) => Dimensions::splat(z),
                None => ZoomCrop::default_margin(bleed),
            };
            Some(ZoomCrop::new(card, grid.container, margin))
        } else {
            None
        };

        Ok(Self {
            paper,
            card,
            grid,
            spacing: if bleed > 0.0 { 0.0 } else { spacing },
            bleed,
            zoom,
            show_guides,
        })
    }

    /// Top-left of the card art in cell `(column, row)`, centred in the cell.
    pub fn card_origin(&self, column: u32, row: u32) -> Dimensions {
        self.grid.cell(column, row) + (self.grid.container - self.card) / 2.0
    }

    /// Distance from a grid line to the nearest cut line.
    pub fn guide_distance(&self) -> f32 {
        if self.bleed > 0.0 {
            self.bleed
        } else {
            self.spacing / 2.0
        }
    }
}
