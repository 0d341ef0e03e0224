//! Card resolution – the boundary between deck sources and the layout
//! engine.
//!
//! A [`CardResolver`] turns some deck description into fully resolved
//! [`CardUnit`]s whose images exist on disk. Remote lookups live outside
//! this crate; the resolvers here read local files only.

use std::fs;
use std::path::{Path, PathBuf};

use crate::arrange::CardUnit;
use crate::error::{ProxyError, Result};

/// Produces the ordered card list for a print run.
pub trait CardResolver {
    fn resolve(&self) -> Result<Vec<CardUnit>>;
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reads a plain-text manifest, one card per line:
///
/// ```text
/// # comment
/// forest.png
/// 4 lightning_bolt.png
/// 2x delver_front.png | delver_back.png
/// ```
///
/// A leading `N` or `Nx` repeats the card. Relative paths are resolved
/// against the manifest's directory. Cards with missing images are
/// reported and dropped.
pub struct ManifestResolver {
    path: PathBuf,
}

impl ManifestResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse manifest text, resolving relative paths against `base`.
    pub fn parse(text: &str, base: &Path) -> Result<Vec<(usize, CardUnit)>> {
        let mut cards = Vec::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (count, rest) = split_count(line);
            let faces: Vec<PathBuf> = rest
                .split('|')
                .map(str::trim)
                .map(|f| base.join(f))
                .collect();
            if rest.split('|').any(|f| f.trim().is_empty()) {
                return Err(ProxyError::config(format!(
                    "manifest line {}: empty image path in {line:?}",
                    lineno + 1
                )));
            }
            if faces.len() > 2 {
                return Err(ProxyError::config(format!(
                    "manifest line {}: a card has at most two faces, got {}",
                    lineno + 1,
                    faces.len()
                )));
            }
            cards.push((count, CardUnit::from_faces(faces)));
        }
        Ok(cards)
    }
}

/// Split an optional `N ` / `Nx ` quantity prefix off a manifest line.
fn split_count(line: &str) -> (usize, &str) {
    if let Some((head, rest)) = line.split_once(char::is_whitespace) {
        let digits = head.strip_suffix(['x', 'X']).unwrap_or(head);
        if let Ok(n) = digits.parse::<usize>() {
            return (n, rest.trim_start());
        }
    }
    (1, line)
}

impl CardResolver for ManifestResolver {
    fn resolve(&self) -> Result<Vec<CardUnit>> {
        let text = fs::read_to_string(&self.path).map_err(|e| ProxyError::io(&self.path, e))?;
        let base = self.path.parent().unwrap_or_else(|| Path::new(""));

        let mut units = Vec::new();
        for (count, unit) in Self::parse(&text, base)? {
            if let Some(missing) = unit.faces().iter().find(|f| !f.is_file()) {
                log::warn!("Skipping card, image not found: {}", missing.display());
                continue;
            }
            units.extend(std::iter::repeat(unit).take(count));
        }
        log::info!("Resolved {} card(s) from '{}'", units.len(), self.path.display());
        Ok(units)
    }
}

/// Every image file in a directory, sorted by name, as single-faced cards.
pub struct DirectoryResolver {
    dir: PathBuf,
}

impl DirectoryResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CardResolver for DirectoryResolver {
    fn resolve(&self) -> Result<Vec<CardUnit>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| ProxyError::io(&self.dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ProxyError::io(&self.dir, e))?.path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        files.sort();
        log::info!("Found {} image(s) in '{}'", files.len(), self.dir.display());
        Ok(files.into_iter().map(CardUnit::single).collect())
    }
}
