//! Print configuration – paper presets, unit parsing and the serialisable
//! [`PrintConfig`] that drives a run.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, Result};
use crate::geometry::{Dimensions, SheetLayout};

pub const INCH: f32 = 72.0;
pub const CM: f32 = INCH / 2.54;
pub const MM: f32 = CM / 10.0;

/// Named paper sizes in points (portrait).
pub const PAPER_PRESETS: &[(&str, Dimensions)] = &[
    ("a3", Dimensions::new(841.89, 1190.55)),
    ("a4", Dimensions::new(595.28, 841.89)),
    ("a5", Dimensions::new(420.94, 595.28)),
    ("letter", Dimensions::new(612.0, 792.0)),
    ("legal", Dimensions::new(612.0, 1008.0)),
];

fn unit_factor(unit: &str) -> Option<f32> {
    match unit {
        "pt" => Some(1.0),
        "in" => Some(INCH),
        "cm" => Some(CM),
        "mm" => Some(MM),
        _ => None,
    }
}

/// Split `"2.5in"` into `("2.5", 72.0)`.
fn split_unit(s: &str) -> Result<(&str, f32)> {
    let s = s.trim();
    let number = s.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let unit = &s[number.len()..];
    if unit.is_empty() {
        return Err(ProxyError::config(format!("missing unit suffix (in|cm|mm|pt) in {s:?}")));
    }
    let factor = unit_factor(unit)
        .ok_or_else(|| ProxyError::config(format!("unknown unit {unit:?} in {s:?}, expected in|cm|mm|pt")))?;
    Ok((number.trim(), factor))
}

fn parse_number(s: &str, whole: &str) -> Result<f32> {
    let v: f32 = s
        .parse()
        .map_err(|_| ProxyError::config(format!("invalid number {s:?} in {whole:?}")))?;
    if !v.is_finite() || v < 0.0 {
        return Err(ProxyError::config(format!("length must be a non-negative number: {whole:?}")));
    }
    Ok(v)
}

/// Parse a single length such as `0.1in` or `3mm`. A bare `0` is allowed.
pub fn parse_length(s: &str) -> Result<f32> {
    if s.trim().parse::<f32>() == Ok(0.0) {
        return Ok(0.0);
    }
    let (number, factor) = split_unit(s)?;
    Ok(parse_number(number, s)? * factor)
}

/// Parse `WxH<unit>` (e.g. `2.5x3.5in`, `210x297mm`).
pub fn parse_size(s: &str) -> Result<Dimensions> {
    let (numbers, factor) = split_unit(s)?;
    let (w, h) = numbers
        .split_once(['x', 'X'])
        .ok_or_else(|| ProxyError::config(format!("expected WIDTHxHEIGHT<unit>, got {s:?}")))?;
    Ok(Dimensions::new(
        parse_number(w.trim(), s)? * factor,
        parse_number(h.trim(), s)? * factor,
    ))
}

/// Parse a paper preset name or an explicit size.
pub fn parse_paper(s: &str) -> Result<Dimensions> {
    let key = s.trim().to_ascii_lowercase();
    if let Some((_, dims)) = PAPER_PRESETS.iter().find(|(name, _)| *name == key) {
        return Ok(*dims);
    }
    parse_size(s).map_err(|_| {
        let names: Vec<&str> = PAPER_PRESETS.iter().map(|(n, _)| *n).collect();
        ProxyError::config(format!(
            "unknown paper size {s:?}; use one of {} or WIDTHxHEIGHT<unit>",
            names.join(", ")
        ))
    })
}

/// How double-faced cards are placed on sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DfcMode {
    /// Both faces printed one after the other like ordinary cards.
    #[default]
    Normal,
    /// Each DFC's faces side by side, followed by one single-faced card.
    Paired,
    /// Alternating front and back sheets for duplex printing.
    DoubleSided,
    /// All fronts in one output, the back faces in a second output.
    SplitSides,
}

impl FromStr for DfcMode {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "normal" => Ok(Self::Normal),
            "paired" => Ok(Self::Paired),
            "double_sided" => Ok(Self::DoubleSided),
            "split_sides" => Ok(Self::SplitSides),
            other => Err(ProxyError::config(format!(
                "unknown DFC mode {other:?}; expected normal, paired, double_sided or split_sides"
            ))),
        }
    }
}

/// Settings for one `print_cards` run.
///
/// Sizes are kept as the user wrote them (`"letter"`, `"2.5x3.5in"`,
/// `"0.1in"`) and parsed in [`PrintConfig::layout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Preset name or `WxH<unit>` (default: letter).
    pub paper: String,
    /// Card trim size (default: 2.5x3.5in).
    pub card: String,
    /// Gap between cards; ignored when bleed is on (default: 0.1in).
    pub spacing: String,
    pub dfc_mode: DfcMode,
    /// Bleed width around each card; `0` disables bleed (default).
    pub bleed: String,
    /// Extra size the art is zoomed by before cropping (bleed only).
    pub zoom: Option<String>,
    /// Draw cut guides between sheets.
    pub guides: bool,
    /// Primary output: `.pdf`, or a raster name with a `{}` page placeholder.
    pub output: PathBuf,
    /// Back-face output for `split_sides`.
    pub back_output: Option<PathBuf>,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            paper: "letter".to_string(),
            card: "2.5x3.5in".to_string(),
            spacing: "0.1in".to_string(),
            dfc_mode: DfcMode::Normal,
            bleed: "0".to_string(),
            zoom: None,
            guides: false,
            output: PathBuf::from("cards.pdf"),
            back_output: None,
        }
    }
}

impl PrintConfig {
    /// Parse every size and compute the sheet geometry.
    pub fn layout(&self) -> Result<SheetLayout> {
        let zoom = self.zoom.as_deref().map(parse_length).transpose()?;
        SheetLayout::new(
            parse_paper(&self.paper)?,
            parse_size(&self.card)?,
            parse_length(&self.spacing)?,
            parse_length(&self.bleed)?,
            zoom,
            self.guides,
        )
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ProxyError::config(format!("invalid config JSON: {e}")))
    }
}
