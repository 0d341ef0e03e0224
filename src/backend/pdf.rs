//! PDF backend – collects printpdf ops per page and writes the whole
//! document once in [`Drawable::finalize`].

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use printpdf::{
    Color as PdfColor, Line, LinePoint, Mm, Op, PaintMode, PdfDocument, PdfPage, PdfSaveOptions,
    PdfWarnMsg, Point as PdfPoint, Polygon, PolygonRing, Pt, RawImage, Rgb, WindingOrder,
    XObjectId, XObjectTransform,
};

use super::{Color, Drawable, Point, LINE_WIDTH_PT};
use crate::error::{ProxyError, Result};
use crate::geometry::Dimensions;

const PT_TO_MM: f32 = 0.352778;

/// A printpdf XObject together with the pixel dimensions of the source image.
#[derive(Clone)]
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Multi-page PDF output. Nothing touches the disk before `finalize`.
pub struct PdfBackend {
    path: PathBuf,
    page_size: Dimensions,
    doc: PdfDocument,
    pages: Vec<PdfPage>,
    current: Option<Vec<Op>>,
    /// Images registered once per source file and reused across pages.
    images: HashMap<PathBuf, ImageResource>,
    /// In-memory bitmaps, keyed by the source they were derived from.
    derived: HashMap<PathBuf, ImageResource>,
    warnings: Vec<PdfWarnMsg>,
    finalized: bool,
}

impl PdfBackend {
    pub fn new(path: &Path, page_size: Dimensions) -> Self {
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("proxy sheets");
        Self {
            path: path.to_path_buf(),
            page_size,
            doc: PdfDocument::new(title),
            pages: Vec::new(),
            current: None,
            images: HashMap::new(),
            derived: HashMap::new(),
            warnings: Vec::new(),
            finalized: false,
        }
    }

    fn ops(&mut self) -> Result<&mut Vec<Op>> {
        self.current
            .as_mut()
            .ok_or(ProxyError::NoPage)
    }

    /// Flip a top-left page coordinate into PDF's bottom-left space.
    fn pdf_point(&self, x: f32, y: f32) -> PdfPoint {
        PdfPoint {
            x: Pt(x),
            y: Pt(self.page_size.height - y),
        }
    }

    fn close_page(&mut self) {
        if let Some(ops) = self.current.take() {
            let page = PdfPage::new(
                Mm(self.page_size.width * PT_TO_MM),
                Mm(self.page_size.height * PT_TO_MM),
                ops,
            );
            self.pages.push(page);
        }
    }

    /// Register encoded image bytes as a reusable XObject.
    fn register(
        &mut self,
        bytes: &[u8],
        (px_width, px_height): (u32, u32),
        what: &Path,
    ) -> Result<ImageResource> {
        let raw = RawImage::decode_from_bytes(bytes, &mut self.warnings)
            .map_err(|e| ProxyError::Pdf(format!("cannot embed {}: {e}", what.display())))?;
        let xobj_id = self.doc.add_image(&raw);
        Ok(ImageResource {
            xobj_id,
            px_width,
            px_height,
        })
    }

    fn place(&mut self, res: &ImageResource, origin: Point, size: Dimensions) -> Result<()> {
        // At dpi=72 printpdf renders 1 px = 1 pt, so
        // scale = desired_pt / px_dim.
        let scale = |target: f32, px: u32| if px > 0 { target / px as f32 } else { 1.0 };
        let bottom = self.page_size.height - origin.y - size.height;
        let op = Op::UseXobject {
            id: res.xobj_id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(origin.x)),
                translate_y: Some(Pt(bottom)),
                dpi: Some(72.0),
                scale_x: Some(scale(size.width, res.px_width)),
                scale_y: Some(scale(size.height, res.px_height)),
                rotate: None,
            },
        };
        self.ops()?.push(op);
        Ok(())
    }
}

fn rgb(color: Color) -> PdfColor {
    PdfColor::Rgb(Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
        icc_profile: None,
    })
}

fn line_point(p: PdfPoint) -> LinePoint {
    LinePoint { p, bezier: false }
}

impl Drawable for PdfBackend {
    fn add_page(&mut self) -> Result<()> {
        self.close_page();
        self.current = Some(Vec::new());
        Ok(())
    }

    fn line(&mut self, from: Point, to: Point, color: Color) -> Result<()> {
        let points = vec![
            line_point(self.pdf_point(from.x, from.y)),
            line_point(self.pdf_point(to.x, to.y)),
        ];
        let ops = self.ops()?;
        ops.push(Op::SetOutlineColor { col: rgb(color) });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(LINE_WIDTH_PT),
        });
        ops.push(Op::DrawLine {
            line: Line {
                points,
                is_closed: false,
            },
        });
        Ok(())
    }

    fn filled_rect(&mut self, origin: Point, size: Dimensions, color: Color) -> Result<()> {
        let (x1, x2) = (origin.x, origin.x + size.width);
        let (y1, y2) = (origin.y, origin.y + size.height);
        let points = vec![
            line_point(self.pdf_point(x1, y2)),
            line_point(self.pdf_point(x2, y2)),
            line_point(self.pdf_point(x2, y1)),
            line_point(self.pdf_point(x1, y1)),
        ];
        let ops = self.ops()?;
        ops.push(Op::SetFillColor { col: rgb(color) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing { points }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
        Ok(())
    }

    fn draw_image(&mut self, path: &Path, origin: Point, size: Dimensions) -> Result<()> {
        let res = match self.images.get(path) {
            Some(res) => res.clone(),
            None => {
                let bytes = fs::read(path).map_err(|e| ProxyError::io(path, e))?;
                let dims = image::image_dimensions(path).map_err(|e| ProxyError::image(path, e))?;
                let res = self.register(&bytes, dims, path)?;
                self.images.insert(path.to_path_buf(), res.clone());
                res
            }
        };
        self.place(&res, origin, size)
    }

    fn draw_in_memory_image(
        &mut self,
        key: &Path,
        image: &DynamicImage,
        origin: Point,
        size: Dimensions,
    ) -> Result<()> {
        let res = match self.derived.get(key) {
            Some(res) => res.clone(),
            None => {
                let mut png = Vec::new();
                image
                    .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                    .map_err(|e| ProxyError::image(key, e))?;
                let res = self.register(&png, (image.width(), image.height()), key)?;
                self.derived.insert(key.to_path_buf(), res.clone());
                res
            }
        };
        self.place(&res, origin, size)
    }

    fn finalize(&mut self) -> Result<Vec<PathBuf>> {
        if self.finalized {
            return Ok(vec![self.path.clone()]);
        }
        self.close_page();
        if self.pages.is_empty() {
            self.current = Some(Vec::new());
            self.close_page();
        }

        self.doc.with_pages(std::mem::take(&mut self.pages));
        let bytes = self.doc.save(&PdfSaveOptions::default(), &mut self.warnings);
        for warning in &self.warnings {
            log::debug!("printpdf: {warning:?}");
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ProxyError::io(parent, e))?;
            }
        }
        fs::write(&self.path, &bytes).map_err(|e| ProxyError::io(&self.path, e))?;
        self.finalized = true;
        log::info!("Wrote '{}' ({} bytes)", self.path.display(), bytes.len());
        Ok(vec![self.path.clone()])
    }

    fn page_count(&self) -> usize {
        self.pages.len() + usize::from(self.current.is_some())
    }
}
