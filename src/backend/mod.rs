//! Drawing backends – the page/line/rect/image primitives the sheet
//! renderer drives.
//!
//! Two implementations exist:
//! - [`PdfBackend`] streams every page into one printpdf document.
//! - [`RasterBackend`] paints each page onto a bitmap and writes it to a
//!   numbered image file.
//!
//! Coordinates are page points with the origin at the top-left corner.

mod pdf;
mod raster;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{ProxyError, Result};
use crate::geometry::Dimensions;

pub use pdf::PdfBackend;
pub use raster::{PageTemplate, RasterBackend, RASTER_DPI};

/// Stroke width of every line, in points (0.3 mm).
pub const LINE_WIDTH_PT: f32 = 0.3 * 72.0 / 25.4;

/// A position on the page in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Dimensions> for Point {
    fn from(d: Dimensions) -> Self {
        Self::new(d.width, d.height)
    }
}

/// RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::gray(0.0);
    pub const WHITE: Color = Color::gray(1.0);
    pub const GUIDE_GRAY: Color = Color::gray(128.0 / 255.0);

    pub const fn gray(v: f32) -> Self {
        Self { r: v, g: v, b: v }
    }

    pub(crate) fn to_rgba8(self) -> image::Rgba<u8> {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        image::Rgba([c(self.r), c(self.g), c(self.b), 0xff])
    }
}

/// Page-level drawing primitives shared by every output format.
pub trait Drawable {
    /// Start a new, empty page.
    fn add_page(&mut self) -> Result<()>;

    fn line(&mut self, from: Point, to: Point, color: Color) -> Result<()>;

    fn filled_rect(&mut self, origin: Point, size: Dimensions, color: Color) -> Result<()>;

    /// Place the image file at `path`, stretched to `size`.
    fn draw_image(&mut self, path: &Path, origin: Point, size: Dimensions) -> Result<()>;

    /// Place an already decoded bitmap, stretched to `size`.
    ///
    /// `key` names the source the bitmap was derived from. Calls with the
    /// same key must pass the same bitmap, so a backend may embed it once.
    fn draw_in_memory_image(
        &mut self,
        key: &Path,
        image: &DynamicImage,
        origin: Point,
        size: Dimensions,
    ) -> Result<()>;

    /// Flush everything to disk and return the files written.
    fn finalize(&mut self) -> Result<Vec<PathBuf>>;

    /// Number of pages started so far.
    fn page_count(&self) -> usize;
}

/// Pick a backend from the output path's extension.
///
/// `.pdf` produces a single document; common raster extensions produce a
/// page sequence and require a `{}` page placeholder in the file name.
pub fn open_backend(path: &Path, page_size: Dimensions) -> Result<Box<dyn Drawable>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => Ok(Box::new(PdfBackend::new(path, page_size))),
        "png" | "jpg" | "jpeg" | "bmp" | "tif" | "tiff" => {
            Ok(Box::new(RasterBackend::new(path, page_size, RASTER_DPI)?))
        }
        _ => Err(ProxyError::config(format!(
            "cannot tell output format of {}; use .pdf or an image extension (.png, .jpg, ...)",
            path.display()
        ))),
    }
}
