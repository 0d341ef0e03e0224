//! Raster backend – one bitmap per page, written to a numbered file as
//! soon as the next page starts.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{overlay, FilterType};
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use super::{Color, Drawable, Point, LINE_WIDTH_PT};
use crate::error::{ProxyError, Result};
use crate::geometry::{pt_to_px, Dimensions};

/// Resolution of raster pages.
pub const RASTER_DPI: f32 = 300.0;

/// An output file name with a page-number placeholder: `{}` or a
/// zero-padded `{:0N}` such as `sheet_{:03}.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    prefix: String,
    suffix: String,
    width: usize,
}

impl PageTemplate {
    pub fn parse(path: &Path) -> Result<Self> {
        let text = path
            .to_str()
            .ok_or_else(|| ProxyError::config(format!("output path is not valid UTF-8: {}", path.display())))?;
        let missing = || {
            ProxyError::config(format!(
                "raster output {text:?} needs a page number placeholder such as {{}} or {{:03}}"
            ))
        };

        let start = text.rfind('{').ok_or_else(missing)?;
        let len = text[start..].find('}').ok_or_else(missing)?;
        let placeholder = &text[start + 1..start + len];
        let width = match placeholder {
            "" => 0,
            _ => placeholder
                .strip_prefix(":0")
                .and_then(|w| w.parse::<usize>().ok())
                .ok_or_else(missing)?,
        };

        Ok(Self {
            prefix: text[..start].to_string(),
            suffix: text[start + len + 1..].to_string(),
            width,
        })
    }

    /// File name for 1-based page `page`.
    pub fn render(&self, page: usize) -> PathBuf {
        PathBuf::from(format!("{}{:0width$}{}", self.prefix, page, self.suffix, width = self.width))
    }
}

/// Numbered raster pages at a fixed DPI on a white background.
pub struct RasterBackend {
    template: PageTemplate,
    page_px: (u32, u32),
    /// Pixels per point.
    scale: f32,
    canvas: Option<RgbaImage>,
    pages: usize,
    written: Vec<PathBuf>,
}

impl RasterBackend {
    pub fn new(path: &Path, page_size: Dimensions, dpi: f32) -> Result<Self> {
        let template = PageTemplate::parse(path)?;
        Ok(Self {
            template,
            page_px: (pt_to_px(page_size.width, dpi), pt_to_px(page_size.height, dpi)),
            scale: dpi / 72.0,
            canvas: None,
            pages: 0,
            written: Vec::new(),
        })
    }

    fn canvas(&mut self) -> Result<&mut RgbaImage> {
        self.canvas
            .as_mut()
            .ok_or(ProxyError::NoPage)
    }

    /// Pixel span `[start, end)` covering `pos..pos + len` points. Adjacent
    /// spans share their boundary so neighbouring cards leave no seam.
    fn span(&self, pos: f32, len: f32) -> (i32, u32) {
        let start = (pos * self.scale).round() as i32;
        let end = ((pos + len) * self.scale).round() as i32;
        (start, (end - start).max(0) as u32)
    }

    fn flush(&mut self) -> Result<()> {
        let Some(canvas) = self.canvas.take() else {
            return Ok(());
        };
        let path = self.template.render(self.pages);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ProxyError::io(parent, e))?;
            }
        }
        // JPEG cannot hold alpha; pages are opaque anyway.
        DynamicImage::ImageRgba8(canvas)
            .to_rgb8()
            .save(&path)
            .map_err(|e| ProxyError::image(&path, e))?;
        log::debug!("Wrote page {} to '{}'", self.pages, path.display());
        self.written.push(path);
        Ok(())
    }

    fn paste(&mut self, image: &DynamicImage, origin: Point, size: Dimensions) -> Result<()> {
        let (x, w) = self.span(origin.x, size.width);
        let (y, h) = self.span(origin.y, size.height);
        if w == 0 || h == 0 {
            return Ok(());
        }
        let pixels = if (image.width(), image.height()) == (w, h) {
            image.to_rgba8()
        } else {
            image.resize_exact(w, h, FilterType::Lanczos3).to_rgba8()
        };
        overlay(self.canvas()?, &pixels, x as i64, y as i64);
        Ok(())
    }
}

impl Drawable for RasterBackend {
    fn add_page(&mut self) -> Result<()> {
        self.flush()?;
        self.pages += 1;
        let (w, h) = self.page_px;
        self.canvas = Some(ImageBuffer::from_pixel(w, h, Color::WHITE.to_rgba8()));
        Ok(())
    }

    fn line(&mut self, from: Point, to: Point, color: Color) -> Result<()> {
        let thickness = (LINE_WIDTH_PT * self.scale).round().max(1.0) as u32;
        let half = thickness as f32 / (2.0 * self.scale);
        let rgba: Rgba<u8> = color.to_rgba8();

        let rect = if from.x == to.x {
            let (y, h) = self.span(from.y.min(to.y), (to.y - from.y).abs());
            let (x, _) = self.span(from.x - half, 0.0);
            Some(Rect::at(x, y).of_size(thickness, h.max(1)))
        } else if from.y == to.y {
            let (x, w) = self.span(from.x.min(to.x), (to.x - from.x).abs());
            let (y, _) = self.span(from.y - half, 0.0);
            Some(Rect::at(x, y).of_size(w.max(1), thickness))
        } else {
            None
        };

        let scale = self.scale;
        let canvas = self.canvas()?;
        match rect {
            Some(rect) => draw_filled_rect_mut(canvas, rect, rgba),
            None => draw_line_segment_mut(
                canvas,
                (from.x * scale, from.y * scale),
                (to.x * scale, to.y * scale),
                rgba,
            ),
        }
        Ok(())
    }

    fn filled_rect(&mut self, origin: Point, size: Dimensions, color: Color) -> Result<()> {
        let (x, w) = self.span(origin.x, size.width);
        let (y, h) = self.span(origin.y, size.height);
        let canvas = self.canvas()?;
        if w > 0 && h > 0 {
            draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(w, h), color.to_rgba8());
        }
        Ok(())
    }

    fn draw_image(&mut self, path: &Path, origin: Point, size: Dimensions) -> Result<()> {
        let image = image::open(path).map_err(|e| ProxyError::image(path, e))?;
        self.paste(&image, origin, size)
    }

    fn draw_in_memory_image(
        &mut self,
        _key: &Path,
        image: &DynamicImage,
        origin: Point,
        size: Dimensions,
    ) -> Result<()> {
        self.paste(image, origin, size)
    }

    fn finalize(&mut self) -> Result<Vec<PathBuf>> {
        self.flush()?;
        log::info!(
            "Wrote {} page image(s) to '{}{{n}}{}'",
            self.written.len(),
            self.template.prefix,
            self.template.suffix
        );
        Ok(self.written.clone())
    }

    fn page_count(&self) -> usize {
        self.pages
    }
}
