//! Arrangement engine – turns resolved card units into the flat slot
//! sequences the sheet renderer consumes.
//!
//! A slot is either an image path or a blank (`None`). Double-faced cards
//! are reordered, padded or split into a second sequence depending on the
//! [`DfcMode`].

use std::path::{Path, PathBuf};

use crate::config::DfcMode;
use crate::error::{ProxyError, Result};

/// One physical card: a front face and, for double-faced cards, a back face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardUnit {
    faces: Vec<PathBuf>,
}

impl CardUnit {
    pub fn single(front: impl Into<PathBuf>) -> Self {
        Self {
            faces: vec![front.into()],
        }
    }

    pub fn double(front: impl Into<PathBuf>, back: impl Into<PathBuf>) -> Self {
        Self {
            faces: vec![front.into(), back.into()],
        }
    }

    /// Build a unit from an arbitrary face list. The arrangement engine
    /// rejects anything other than one or two faces.
    pub fn from_faces(faces: Vec<PathBuf>) -> Self {
        Self { faces }
    }

    pub fn faces(&self) -> &[PathBuf] {
        &self.faces
    }

    pub fn front(&self) -> Option<&Path> {
        self.faces.first().map(PathBuf::as_path)
    }

    pub fn back(&self) -> Option<&Path> {
        self.faces.get(1).map(PathBuf::as_path)
    }

    pub fn is_double_faced(&self) -> bool {
        self.faces.len() == 2
    }
}

/// A sheet position: an image or a blank.
pub type Slot<'a> = Option<&'a Path>;

/// How the renderer mirrors columns for a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Columns left to right.
    Normal,
    /// Every sheet is a back side; columns mirrored.
    Back,
    /// Sheets alternate front/back; odd sheets mirrored.
    Double,
}

/// Output of [`arrange`]: the primary slot sequence and, for
/// `split_sides`, a separate back-face sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement<'a> {
    pub primary: Vec<Slot<'a>>,
    pub draw_mode: DrawMode,
    /// Back faces rendered with [`DrawMode::Back`]; `None` when there are none.
    pub backs: Option<Vec<Slot<'a>>>,
}

/// Arrange `units` into slot sequences for `mode`.
pub fn arrange(units: &[CardUnit], mode: DfcMode, cards_per_sheet: usize) -> Result<Arrangement<'_>> {
    validate(units)?;
    if cards_per_sheet == 0 {
        return Err(ProxyError::ArrangementInvariant(
            "cards per sheet must be at least 1".to_string(),
        ));
    }

    let arrangement = match mode {
        DfcMode::Normal => Arrangement {
            primary: arrange_normal(units),
            draw_mode: DrawMode::Normal,
            backs: None,
        },
        DfcMode::Paired => Arrangement {
            primary: arrange_paired(units),
            draw_mode: DrawMode::Normal,
            backs: None,
        },
        DfcMode::DoubleSided => {
            let (primary, any_back) = arrange_double_sided(units, cards_per_sheet);
            // Without back sheets nothing alternates, so nothing is mirrored.
            let draw_mode = if any_back { DrawMode::Double } else { DrawMode::Normal };
            Arrangement {
                primary,
                draw_mode,
                backs: None,
            }
        }
        DfcMode::SplitSides => {
            let (primary, backs) = arrange_split_sides(units, cards_per_sheet)?;
            Arrangement {
                primary,
                draw_mode: DrawMode::Normal,
                backs,
            }
        }
    };

    log::debug!(
        "Arranged {} card(s) in {:?} mode into {} slot(s){}",
        units.len(),
        mode,
        arrangement.primary.len(),
        match &arrangement.backs {
            Some(b) => format!(" plus {} back slot(s)", b.len()),
            None => String::new(),
        }
    );
    Ok(arrangement)
}

fn validate(units: &[CardUnit]) -> Result<()> {
    for (idx, unit) in units.iter().enumerate() {
        let n = unit.faces.len();
        if !(1..=2).contains(&n) {
            return Err(ProxyError::ArrangementInvariant(format!(
                "card #{idx} has {n} faces; a card must have one or two"
            )));
        }
    }
    Ok(())
}

/// Stable split into (double-faced, single-faced).
fn segregate(units: &[CardUnit]) -> (Vec<&CardUnit>, Vec<&CardUnit>) {
    units.iter().partition(|u| u.is_double_faced())
}

fn faces(unit: &CardUnit) -> impl Iterator<Item = Slot<'_>> {
    unit.faces.iter().map(|p| Some(p.as_path()))
}

fn arrange_normal(units: &[CardUnit]) -> Vec<Slot<'_>> {
    units.iter().flat_map(faces).collect()
}

fn arrange_paired(units: &[CardUnit]) -> Vec<Slot<'_>> {
    let (dfcs, singles) = segregate(units);
    let mut singles = singles.into_iter();
    let mut out = Vec::with_capacity(units.len() + dfcs.len());

    for dfc in dfcs {
        out.extend(faces(dfc));
        out.push(singles.next().and_then(CardUnit::front));
    }
    out.extend(singles.flat_map(faces));
    out
}

/// Front and back arrays for one sheet-sized group.
fn sheet_pair<'a>(group: &[&'a CardUnit], cards_per_sheet: usize) -> (Vec<Slot<'a>>, Vec<Slot<'a>>, bool) {
    let mut fronts = vec![None; cards_per_sheet];
    let mut backs = vec![None; cards_per_sheet];
    let mut has_dfc = false;
    for (idx, &unit) in group.iter().enumerate() {
        fronts[idx] = unit.front();
        if let Some(back) = unit.back() {
            backs[idx] = Some(back);
            has_dfc = true;
        }
    }
    (fronts, backs, has_dfc)
}

fn dfcs_first(units: &[CardUnit]) -> Vec<&CardUnit> {
    let (mut ordered, singles) = segregate(units);
    ordered.extend(singles);
    ordered
}

/// Interleaved front/back sheets, or the padded fronts alone when no unit
/// has a back. The flag reports which one was produced.
fn arrange_double_sided(units: &[CardUnit], cards_per_sheet: usize) -> (Vec<Slot<'_>>, bool) {
    let ordered = dfcs_first(units);
    let mut fronts_only = Vec::new();
    let mut interleaved = Vec::new();
    let mut any_back = false;

    for group in ordered.chunks(cards_per_sheet) {
        let (fronts, backs, has_dfc) = sheet_pair(group, cards_per_sheet);
        any_back |= has_dfc;
        fronts_only.extend_from_slice(&fronts);
        interleaved.extend(fronts);
        interleaved.extend(backs);
    }

    if any_back {
        (interleaved, true)
    } else {
        (fronts_only, false)
    }
}

type SplitSequences<'a> = (Vec<Slot<'a>>, Option<Vec<Slot<'a>>>);

fn arrange_split_sides(units: &[CardUnit], cards_per_sheet: usize) -> Result<SplitSequences<'_>> {
    split_groups(&dfcs_first(units), cards_per_sheet)
}

/// Split an already ordered unit list into front and back sequences.
/// Back sheets stop at the first group without a double-faced card, so a
/// double-faced card in any later group cannot be given a back.
fn split_groups<'a>(ordered: &[&'a CardUnit], cards_per_sheet: usize) -> Result<SplitSequences<'a>> {
    let mut fronts_out = Vec::new();
    let mut backs_out = Vec::new();
    let mut backs_done = false;

    for (sheet, group) in ordered.chunks(cards_per_sheet).enumerate() {
        let (fronts, backs, has_dfc) = sheet_pair(group, cards_per_sheet);
        if has_dfc && backs_done {
            return Err(ProxyError::ArrangementInvariant(format!(
                "sheet {} holds a double-faced card after a sheet without any",
                sheet + 1
            )));
        }
        if !has_dfc {
            backs_done = true;
        }

        fronts_out.extend(fronts);
        if !backs_done {
            backs_out.extend(backs);
        }
    }

    let backs_out = if backs_out.is_empty() { None } else { Some(backs_out) };
    Ok((fronts_out, backs_out))
}
