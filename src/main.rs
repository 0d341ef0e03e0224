//! proxy-sheets – lay card images out on printable sheets.
//!
//! Usage:
//!   proxy-sheets <deck.txt | image-dir> -o deck.pdf [--dfc-mode paired] [--guides]
//!
//! Raster output is chosen by giving an image extension with a page
//! placeholder, e.g. `-o out/sheet_{:03}.png`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use proxy_sheets::resolver::{CardResolver, DirectoryResolver, ManifestResolver};
use proxy_sheets::{print_deck, DfcMode, PrintConfig};

/// Lay out proxy card images onto printable PDF or raster sheets.
#[derive(Parser, Debug)]
#[command(name = "proxy-sheets", version, about)]
struct Cli {
    /// Card manifest (one image per line, `front | back` for DFCs) or a
    /// directory of images.
    input: PathBuf,

    /// Output `.pdf`, or an image name with a page placeholder (`sheet_{:03}.png`).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Back-face output for `--dfc-mode split_sides`.
    #[arg(long = "back-output")]
    back_output: Option<PathBuf>,

    /// JSON config file; command-line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Paper preset (a3, a4, a5, letter, legal) or WxH<unit>.
    #[arg(long)]
    paper: Option<String>,

    /// Card size as WxH<unit>.
    #[arg(long)]
    card: Option<String>,

    /// Gap between cards, e.g. 0.1in.
    #[arg(long)]
    spacing: Option<String>,

    /// Bleed around each card; disables spacing and zoom-crops the art.
    #[arg(long)]
    bleed: Option<String>,

    /// Extra size the art is zoomed by before cropping (bleed only).
    #[arg(long)]
    zoom: Option<String>,

    /// normal | paired | double_sided | split_sides
    #[arg(long = "dfc-mode")]
    dfc_mode: Option<DfcMode>,

    /// Draw cut guides.
    #[arg(long)]
    guides: bool,
}

impl Cli {
    fn into_config(self) -> Result<(PrintConfig, PathBuf)> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                PrintConfig::from_json(&json)?
            }
            None => PrintConfig::default(),
        };

        if let Some(v) = self.output {
            config.output = v;
        }
        if let Some(v) = self.back_output {
            config.back_output = Some(v);
        }
        if let Some(v) = self.paper {
            config.paper = v;
        }
        if let Some(v) = self.card {
            config.card = v;
        }
        if let Some(v) = self.spacing {
            config.spacing = v;
        }
        if let Some(v) = self.bleed {
            config.bleed = v;
        }
        if let Some(v) = self.zoom {
            config.zoom = Some(v);
        }
        if let Some(v) = self.dfc_mode {
            config.dfc_mode = v;
        }
        config.guides |= self.guides;

        Ok((config, self.input))
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let (config, input) = Cli::parse().into_config()?;

    let resolver: Box<dyn CardResolver> = if input.is_dir() {
        Box::new(DirectoryResolver::new(&input))
    } else {
        Box::new(ManifestResolver::new(&input))
    };

    let report = print_deck(resolver.as_ref(), &config)
        .with_context(|| format!("failed to print cards from {}", input.display()))?;

    for path in report.primary.iter().chain(&report.backs) {
        eprintln!("Wrote '{}'", path.display());
    }
    Ok(())
}
