//! Sheet renderer – walks a slot sequence, starting a page every
//! `cards_per_sheet` slots and placing each card in its grid cell.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::arrange::{DrawMode, Slot};
use crate::backend::{Color, Drawable, Point};
use crate::error::{ProxyError, Result};
use crate::geometry::{pt_to_px, SheetLayout, ZoomCrop};
use crate::guides::draw_guides;

/// Resolution the art is resampled at before zoom-cropping.
pub const ZOOM_DPI: f32 = 300.0;

/// Grid cell of slot `index`, with the column mirrored on back sheets so a
/// duplex print lines up when flipped along its vertical edge.
pub fn slot_cell(index: usize, layout: &SheetLayout, mode: DrawMode) -> (u32, u32) {
    let per_sheet = layout.grid.cards_per_sheet();
    let columns = layout.grid.columns as usize;
    let pos = index % per_sheet;
    let (column, row) = ((pos % columns) as u32, (pos / columns) as u32);

    let mirrored = match mode {
        DrawMode::Normal => false,
        DrawMode::Back => true,
        DrawMode::Double => index % (2 * per_sheet) >= per_sheet,
    };
    if mirrored {
        (layout.grid.columns - 1 - column, row)
    } else {
        (column, row)
    }
}

/// Render `sequence` through `backend` and finalize it.
///
/// Returns the files the backend wrote.
pub fn render_sheets(
    sequence: &[Slot<'_>],
    mode: DrawMode,
    layout: &SheetLayout,
    backend: &mut dyn Drawable,
) -> Result<Vec<PathBuf>> {
    let per_sheet = layout.grid.cards_per_sheet();
    let mut placed = 0usize;
    // Zoom-cropped art per source image; repeated cards reuse one bitmap.
    let mut crops = HashMap::new();

    for (i, slot) in sequence.iter().enumerate() {
        if i % per_sheet == 0 {
            if i != 0 && layout.show_guides {
                draw_guides(layout, backend)?;
            }
            backend.add_page()?;
            log::debug!("Plotting sheet {}", i / per_sheet + 1);
        }

        let Some(path) = *slot else { continue };
        let (column, row) = slot_cell(i, layout, mode);
        place_card(path, column, row, layout, &mut crops, backend)?;
        placed += 1;
    }

    if layout.show_guides && backend.page_count() > 0 {
        draw_guides(layout, backend)?;
    }

    log::info!(
        "Placed {placed} card image(s) on {} sheet(s)",
        backend.page_count()
    );
    backend.finalize()
}

fn place_card<'a>(
    path: &'a Path,
    column: u32,
    row: u32,
    layout: &SheetLayout,
    crops: &mut HashMap<&'a Path, DynamicImage>,
    backend: &mut dyn Drawable,
) -> Result<()> {
    match &layout.zoom {
        Some(zoom) => {
            let origin: Point = layout.grid.cell(column, row).into();
            let size = layout.grid.container;
            backend.filled_rect(origin, size, Color::BLACK)?;
            let cropped = match crops.entry(path) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(zoom_crop(path, zoom)?),
            };
            backend.draw_in_memory_image(path, cropped, origin, size)
        }
        None => {
            let origin: Point = layout.card_origin(column, row).into();
            // Black underlay so the bleed edge makes sense for most cards.
            backend.filled_rect(origin, layout.card, Color::BLACK)?;
            backend.draw_image(path, origin, layout.card)
        }
    }
}

/// Resize the art to the zoomed size and keep the centred container area.
fn zoom_crop(path: &Path, zoom: &ZoomCrop) -> Result<DynamicImage> {
    let art = image::open(path).map_err(|e| ProxyError::image(path, e))?;
    let render_w = pt_to_px(zoom.render.width, ZOOM_DPI);
    let render_h = pt_to_px(zoom.render.height, ZOOM_DPI);
    let keep_w = pt_to_px(zoom.keep.width, ZOOM_DPI).min(render_w);
    let keep_h = pt_to_px(zoom.keep.height, ZOOM_DPI).min(render_h);
    let x = (render_w - keep_w) / 2;
    let y = (render_h - keep_h) / 2;

    let resized = art.resize_exact(render_w, render_h, image::imageops::FilterType::Lanczos3);
    Ok(resized.crop_imm(x, y, keep_w, keep_h))
}
