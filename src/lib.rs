//! # proxy-sheets – card images → printable sheets
//!
//! Lays resolved card images out on a fixed grid and writes them as a PDF
//! document or a numbered sequence of raster pages. The pipeline stages are:
//!
//! 1. **Resolve** – deck source → card units ([`resolver`])
//! 2. **Measure** – paper/card/spacing/bleed → grid ([`geometry`], [`config`])
//! 3. **Arrange** – place double-faced cards per DFC mode ([`arrange`])
//! 4. **Render** – drive a drawing backend sheet by sheet ([`sheet`], [`guides`])
//! 5. **Write** – PDF via printpdf or PNG/JPEG pages via `image` ([`backend`])

pub mod arrange;
pub mod backend;
pub mod config;
pub mod error;
pub mod geometry;
pub mod guides;
pub mod pipeline;
pub mod resolver;
pub mod sheet;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use arrange::{arrange, Arrangement, CardUnit, DrawMode};
pub use config::{DfcMode, PrintConfig};
pub use error::{ProxyError, Result};
pub use pipeline::{print_cards, print_deck, PrintReport};
