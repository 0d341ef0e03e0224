//! Pipeline – ties together geometry, arrangement and rendering into a
//! single function call.

use std::path::{Path, PathBuf};

use crate::arrange::{arrange, CardUnit, DrawMode};
use crate::backend::open_backend;
use crate::config::{DfcMode, PrintConfig};
use crate::error::Result;
use crate::resolver::CardResolver;
use crate::sheet::render_sheets;

/// Files produced by one print run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrintReport {
    /// The document or page images holding the fronts (and, in
    /// `double_sided` mode, the interleaved backs).
    pub primary: Vec<PathBuf>,
    /// Back-face output of `split_sides`; empty when nothing had a back.
    pub backs: Vec<PathBuf>,
    pub cards_per_sheet: usize,
}

/// Lay out `units` and write the output file(s) described by `config`.
///
/// The layout is validated before anything is drawn, so an infeasible
/// paper size or bad output path leaves no files behind.
pub fn print_cards(units: &[CardUnit], config: &PrintConfig) -> Result<PrintReport> {
    let layout = config.layout()?;
    let cards_per_sheet = layout.grid.cards_per_sheet();
    log::debug!(
        "Grid {}x{} ({} per sheet), container {:.2}x{:.2}pt, offset {:.2}x{:.2}pt",
        layout.grid.columns,
        layout.grid.rows,
        cards_per_sheet,
        layout.grid.container.width,
        layout.grid.container.height,
        layout.grid.offset.width,
        layout.grid.offset.height
    );

    let arrangement = arrange(units, config.dfc_mode, cards_per_sheet)?;

    let mut primary_backend = open_backend(&config.output, layout.paper)?;
    let back_target = match (&arrangement.backs, config.dfc_mode) {
        (Some(_), DfcMode::SplitSides) => Some(back_output_path(config)),
        _ => None,
    };
    let mut back_backend = back_target
        .as_deref()
        .map(|path| open_backend(path, layout.paper))
        .transpose()?;

    log::info!("Plotting cards to '{}'", config.output.display());
    let primary = render_sheets(
        &arrangement.primary,
        arrangement.draw_mode,
        &layout,
        primary_backend.as_mut(),
    )?;

    let backs = match (&arrangement.backs, back_backend.as_mut()) {
        (Some(backs), Some(backend)) => {
            log::info!(
                "Plotting back faces to '{}'",
                back_target.as_deref().unwrap_or(Path::new("")).display()
            );
            render_sheets(backs, DrawMode::Back, &layout, backend.as_mut())?
        }
        _ => Vec::new(),
    };

    Ok(PrintReport {
        primary,
        backs,
        cards_per_sheet,
    })
}

/// Resolve a deck and print it.
pub fn print_deck(resolver: &dyn CardResolver, config: &PrintConfig) -> Result<PrintReport> {
    let units = resolver.resolve()?;
    print_cards(&units, config)
}

/// Configured back-face output, or `<stem>_backs.<ext>` next to the
/// primary output.
fn back_output_path(config: &PrintConfig) -> PathBuf {
    if let Some(path) = &config.back_output {
        return path.clone();
    }
    let primary = &config.output;
    let stem = primary
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("cards");
    let name = match primary.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_backs.{ext}"),
        None => format!("{stem}_backs"),
    };
    let derived = primary.with_file_name(name);
    log::info!(
        "No back output configured, writing back faces to '{}'",
        derived.display()
    );
    derived
}
