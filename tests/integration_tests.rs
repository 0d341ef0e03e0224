//! Integration tests for the proxy-sheets pipeline.
//!
//! These tests validate:
//! - Page counts for PDF and raster outputs
//! - Card placement on raster pages
//! - DFC arrangements end to end
//! - Failure modes surface before anything is written

use std::fs;
use std::path::{Path, PathBuf};

use proxy_sheets::config::parse_size;
use proxy_sheets::geometry::{compute_grid, Dimensions};
use proxy_sheets::resolver::{CardResolver, ManifestResolver};
use proxy_sheets::{arrange, print_cards, print_deck, CardUnit, DfcMode, PrintConfig, ProxyError};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

// =====================================================================
// Helper
// =====================================================================

/// Write a solid-colour card image and return its path.
fn card_art(dir: &Path, name: &str, rgb: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::from_pixel(50, 70, image::Rgb(rgb))
        .save(&path)
        .unwrap();
    path
}

fn singles(dir: &Path, n: usize) -> Vec<CardUnit> {
    (0..n)
        .map(|i| CardUnit::single(card_art(dir, &format!("card{i}.png"), [200, 20, 20])))
        .collect()
}

/// 2.1in square paper with 0.9in cards and 0.1in spacing: a 2x2 grid.
fn small_config(output: PathBuf) -> PrintConfig {
    PrintConfig {
        paper: "2.1x2.1in".to_string(),
        card: "0.9x0.9in".to_string(),
        spacing: "0.1in".to_string(),
        output,
        ..PrintConfig::default()
    }
}

fn assert_valid_pdf(path: &Path) {
    let bytes = fs::read(path).unwrap();
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn is_card_pixel(p: image::Rgb<u8>) -> bool {
    p.0[0] > 150 && p.0[1] < 60
}

// =====================================================================
// Raster round trip
// =====================================================================

#[test]
fn full_sheet_produces_one_page() {
    let tmp = TempDir::new().unwrap();
    let units = singles(tmp.path(), 4);
    let config = small_config(tmp.path().join("out").join("page_{}.png"));

    let report = print_cards(&units, &config).unwrap();
    assert_eq!(report.cards_per_sheet, 4);
    assert_eq!(report.primary.len(), 1);
    assert!(report.backs.is_empty());
    assert!(tmp.path().join("out/page_1.png").exists());
}

#[test]
fn one_card_over_capacity_produces_second_page() {
    let tmp = TempDir::new().unwrap();
    let units = singles(tmp.path(), 5);
    let config = small_config(tmp.path().join("page_{:02}.png"));

    let report = print_cards(&units, &config).unwrap();
    assert_eq!(report.primary.len(), 2);

    let layout = config.layout().unwrap();
    let second = image::open(&report.primary[1]).unwrap().to_rgb8();
    let px = |pt: f32| (pt * 300.0 / 72.0) as u32;

    // Exactly one card, in the first cell.
    let mut occupied = Vec::new();
    for row in 0..2 {
        for col in 0..2 {
            let origin = layout.card_origin(col, row);
            let centre = origin + layout.card / 2.0;
            if is_card_pixel(*second.get_pixel(px(centre.width), px(centre.height))) {
                occupied.push((col, row));
            }
        }
    }
    assert_eq!(occupied, vec![(0, 0)]);
}

#[test]
fn letter_scenario_places_ten_cards_on_two_pages() {
    let tmp = TempDir::new().unwrap();
    let units = singles(tmp.path(), 10);
    let config = PrintConfig {
        output: tmp.path().join("letter_{}.png"),
        ..PrintConfig::default()
    };
    let layout = config.layout().unwrap();
    assert_eq!((layout.grid.columns, layout.grid.rows), (3, 3));

    let report = print_cards(&units, &config).unwrap();
    assert_eq!(report.primary.len(), 2);

    let px = |pt: f32| (pt * 300.0 / 72.0) as u32;
    let count_cards = |path: &Path| {
        let page = image::open(path).unwrap().to_rgb8();
        let mut n = 0;
        for row in 0..3 {
            for col in 0..3 {
                let centre = layout.card_origin(col, row) + layout.card / 2.0;
                if is_card_pixel(*page.get_pixel(px(centre.width), px(centre.height))) {
                    n += 1;
                }
            }
        }
        n
    };
    assert_eq!(count_cards(&report.primary[0]), 9);
    assert_eq!(count_cards(&report.primary[1]), 1);
}

#[test]
fn raster_output_is_deterministic() {
    let tmp = TempDir::new().unwrap();
    let units = singles(tmp.path(), 3);

    let hash_run = |name: &str| {
        let mut config = small_config(tmp.path().join(format!("{name}_{{}}.png")));
        config.guides = true;
        let report = print_cards(&units, &config).unwrap();
        Sha256::digest(fs::read(&report.primary[0]).unwrap())
    };
    assert_eq!(hash_run("first"), hash_run("second"));
}

#[test]
fn raster_output_without_placeholder_fails() {
    let tmp = TempDir::new().unwrap();
    let units = singles(tmp.path(), 1);
    let config = small_config(tmp.path().join("sheet.png"));
    let err = print_cards(&units, &config).unwrap_err();
    assert!(matches!(err, ProxyError::Configuration(_)));
    assert!(!tmp.path().join("sheet.png").exists());
}

// =====================================================================
// PDF output
// =====================================================================

#[test]
fn pdf_output_is_written_once() {
    let tmp = TempDir::new().unwrap();
    let units = singles(tmp.path(), 10);
    let output = tmp.path().join("pdf").join("deck.pdf");
    let config = PrintConfig {
        output: output.clone(),
        guides: true,
        ..PrintConfig::default()
    };

    let report = print_cards(&units, &config).unwrap();
    assert_eq!(report.primary, vec![output.clone()]);
    assert_valid_pdf(&output);
}

#[test]
fn bleed_output_renders_zoomed_cards() {
    let tmp = TempDir::new().unwrap();
    let units = singles(tmp.path(), 2);
    let output = tmp.path().join("bleed.pdf");
    let config = PrintConfig {
        bleed: "0.125in".to_string(),
        guides: true,
        output: output.clone(),
        ..PrintConfig::default()
    };
    print_cards(&units, &config).unwrap();
    assert_valid_pdf(&output);
}

#[test]
fn repeated_art_under_bleed_is_embedded_once() {
    let tmp = TempDir::new().unwrap();
    // Noise so the embedded bitmap cannot compress away.
    let mut seed = 0x2545_f491_u32;
    let art = tmp.path().join("forest.png");
    image::RgbImage::from_fn(120, 120, |_, _| {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let [r, g, b, _] = seed.to_le_bytes();
        image::Rgb([r, g, b])
    })
    .save(&art)
    .unwrap();

    let print = |copies: usize, name: &str| {
        let output = tmp.path().join(name);
        let config = PrintConfig {
            paper: "3.1x3.1in".to_string(),
            card: "0.9x0.9in".to_string(),
            bleed: "0.05in".to_string(),
            output: output.clone(),
            ..PrintConfig::default()
        };
        let units = vec![CardUnit::single(art.clone()); copies];
        let report = print_cards(&units, &config).unwrap();
        assert_eq!(report.cards_per_sheet, 9);
        fs::metadata(&output).unwrap().len()
    };

    let one = print(1, "one.pdf");
    let nine = print(9, "nine.pdf");
    assert!(nine < one * 2, "9 copies took {nine} bytes, 1 copy took {one}");
}

#[test]
fn double_sided_without_dfcs_keeps_columns_unmirrored() {
    let tmp = TempDir::new().unwrap();
    let units = singles(tmp.path(), 5);
    let mut config = small_config(tmp.path().join("fronts_{}.png"));
    config.dfc_mode = DfcMode::DoubleSided;

    let report = print_cards(&units, &config).unwrap();
    assert_eq!(report.primary.len(), 2);

    let layout = config.layout().unwrap();
    let px = |pt: f32| (pt * 300.0 / 72.0) as u32;
    let page = image::open(&report.primary[1]).unwrap().to_rgb8();
    let occupied = |col: u32| {
        let centre = layout.card_origin(col, 0) + layout.card / 2.0;
        is_card_pixel(*page.get_pixel(px(centre.width), px(centre.height)))
    };
    assert!(occupied(0));
    assert!(!occupied(1));
}

#[test]
fn split_sides_writes_separate_back_document() {
    let tmp = TempDir::new().unwrap();
    let mut units = singles(tmp.path(), 3);
    units.push(CardUnit::double(
        card_art(tmp.path(), "front.png", [200, 20, 20]),
        card_art(tmp.path(), "back.png", [20, 20, 200]),
    ));
    let config = PrintConfig {
        dfc_mode: DfcMode::SplitSides,
        output: tmp.path().join("fronts.pdf"),
        ..PrintConfig::default()
    };

    let report = print_cards(&units, &config).unwrap();
    assert_eq!(report.backs, vec![tmp.path().join("fronts_backs.pdf")]);
    assert_valid_pdf(&report.primary[0]);
    assert_valid_pdf(&report.backs[0]);
}

#[test]
fn split_sides_without_dfcs_skips_back_output() {
    let tmp = TempDir::new().unwrap();
    let units = singles(tmp.path(), 3);
    let back = tmp.path().join("backs.pdf");
    let config = PrintConfig {
        dfc_mode: DfcMode::SplitSides,
        output: tmp.path().join("fronts.pdf"),
        back_output: Some(back.clone()),
        ..PrintConfig::default()
    };

    let report = print_cards(&units, &config).unwrap();
    assert!(report.backs.is_empty());
    assert!(!back.exists());
}

#[test]
fn double_sided_raster_mirrors_back_sheet() {
    let tmp = TempDir::new().unwrap();
    let units = vec![CardUnit::double(
        card_art(tmp.path(), "front.png", [200, 20, 20]),
        card_art(tmp.path(), "back.png", [200, 20, 20]),
    )];
    let mut config = small_config(tmp.path().join("duplex_{}.png"));
    config.dfc_mode = DfcMode::DoubleSided;

    let report = print_cards(&units, &config).unwrap();
    assert_eq!(report.primary.len(), 2);

    let layout = config.layout().unwrap();
    let px = |pt: f32| (pt * 300.0 / 72.0) as u32;
    let occupied = |path: &Path, col: u32| {
        let page = image::open(path).unwrap().to_rgb8();
        let centre = layout.card_origin(col, 0) + layout.card / 2.0;
        is_card_pixel(*page.get_pixel(px(centre.width), px(centre.height)))
    };
    assert!(occupied(&report.primary[0], 0));
    assert!(!occupied(&report.primary[0], 1));
    assert!(occupied(&report.primary[1], 1));
    assert!(!occupied(&report.primary[1], 0));
}

// =====================================================================
// Arrangement properties
// =====================================================================

#[test]
fn double_sided_back_slots_match_front_slots() {
    let mut units: Vec<CardUnit> = (0..5)
        .map(|i| CardUnit::double(format!("f{i}.png"), format!("b{i}.png")))
        .collect();
    units.extend((0..7).map(|i| CardUnit::single(format!("s{i}.png"))));

    let per_sheet = 4;
    let arr = arrange(&units, DfcMode::DoubleSided, per_sheet).unwrap();
    assert_eq!(arr.primary.len() % (2 * per_sheet), 0);

    for pair in arr.primary.chunks(2 * per_sheet) {
        let (fronts, backs) = pair.split_at(per_sheet);
        for (front, back) in fronts.iter().zip(backs) {
            if let Some(back) = back {
                let f = front.unwrap().to_str().unwrap();
                let b = back.to_str().unwrap();
                assert_eq!(f.replace('f', "b"), b);
            }
        }
    }
}

#[test]
fn paired_faces_stay_adjacent() {
    let mut units: Vec<CardUnit> = (0..3).map(|i| CardUnit::single(format!("s{i}.png"))).collect();
    for i in 0..3 {
        units.insert(i * 2, CardUnit::double(format!("f{i}.png"), format!("b{i}.png")));
    }
    let arr = arrange(&units, DfcMode::Paired, 9).unwrap();
    assert_eq!(arr.primary.len(), 9);
    for i in 0..3 {
        let name = format!("f{i}.png");
        let front = arr
            .primary
            .iter()
            .position(|s| s.and_then(Path::to_str) == Some(name.as_str()))
            .unwrap();
        assert_eq!(
            arr.primary[front + 1].unwrap().to_str().unwrap(),
            format!("b{i}.png")
        );
    }
}

// =====================================================================
// Failure modes
// =====================================================================

#[test]
fn paper_too_small_is_infeasible() {
    let err = compute_grid(
        Dimensions::new(200.0, 200.0),
        parse_size("300x400pt").unwrap(),
        7.2,
        0.0,
    )
    .unwrap_err();
    assert!(matches!(err, ProxyError::LayoutInfeasible { .. }));
}

#[test]
fn three_faced_card_fails_before_output() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("deck.pdf");
    let units = vec![CardUnit::from_faces(vec![
        "a.png".into(),
        "b.png".into(),
        "c.png".into(),
    ])];
    let config = PrintConfig {
        output: output.clone(),
        ..PrintConfig::default()
    };
    let err = print_cards(&units, &config).unwrap_err();
    assert!(matches!(err, ProxyError::ArrangementInvariant(_)));
    assert!(!output.exists());
}

// =====================================================================
// Resolver → pipeline
// =====================================================================

#[test]
fn manifest_deck_prints_end_to_end() {
    let tmp = TempDir::new().unwrap();
    card_art(tmp.path(), "bolt.png", [200, 20, 20]);
    card_art(tmp.path(), "day.png", [200, 20, 20]);
    card_art(tmp.path(), "night.png", [20, 20, 200]);
    let manifest = tmp.path().join("deck.txt");
    fs::write(&manifest, "# test deck\n4 bolt.png\nday.png | night.png\n").unwrap();

    let resolver = ManifestResolver::new(&manifest);
    assert_eq!(resolver.resolve().unwrap().len(), 5);

    let mut config = small_config(tmp.path().join("paired_{}.png"));
    config.dfc_mode = DfcMode::Paired;
    let report = print_deck(&resolver, &config).unwrap();
    // 2 DFC faces + 4 singles = 6 slots on a 4-card sheet.
    assert_eq!(report.primary.len(), 2);
}
