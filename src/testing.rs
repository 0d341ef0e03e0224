//! In-memory backend for unit tests.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::backend::{Color, Drawable, Point};
use crate::error::Result;
use crate::geometry::Dimensions;

/// A placed image: page index (0-based), source path or in-memory key,
/// origin and size.
pub type Placement = (usize, Source, Point, Dimensions);

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    File(PathBuf),
    InMemory(PathBuf),
}

/// Records every primitive instead of drawing it.
#[derive(Default)]
pub struct RecordingBackend {
    pub pages: usize,
    pub lines: Vec<(Point, Point, Color)>,
    /// Page index of every line, parallel to `lines`.
    pub line_pages: Vec<usize>,
    pub rects: Vec<(usize, Point, Dimensions, Color)>,
    pub images: Vec<Placement>,
    pub finalized: bool,
}

impl RecordingBackend {
    fn page(&self) -> usize {
        self.pages.saturating_sub(1)
    }

    pub fn images_on(&self, page: usize) -> Vec<&Placement> {
        self.images.iter().filter(|p| p.0 == page).collect()
    }
}

impl Drawable for RecordingBackend {
    fn add_page(&mut self) -> Result<()> {
        self.pages += 1;
        Ok(())
    }

    fn line(&mut self, from: Point, to: Point, color: Color) -> Result<()> {
        self.lines.push((from, to, color));
        self.line_pages.push(self.page());
        Ok(())
    }

    fn filled_rect(&mut self, origin: Point, size: Dimensions, color: Color) -> Result<()> {
        self.rects.push((self.page(), origin, size, color));
        Ok(())
    }

    fn draw_image(&mut self, path: &Path, origin: Point, size: Dimensions) -> Result<()> {
        self.images.push((self.page(), Source::File(path.to_path_buf()), origin, size));
        Ok(())
    }

    fn draw_in_memory_image(
        &mut self,
        key: &Path,
        _image: &DynamicImage,
        origin: Point,
        size: Dimensions,
    ) -> Result<()> {
        self.images.push((self.page(), Source::InMemory(key.to_path_buf()), origin, size));
        Ok(())
    }

    fn finalize(&mut self) -> Result<Vec<PathBuf>> {
        self.finalized = true;
        Ok(Vec::new())
    }

    fn page_count(&self) -> usize {
        self.pages
    }
}
