//! Integration tests for distance field generation and the font system.

use std::io::Write;
use std::sync::Arc;

use lumina_core::math::vec2;
use lumina_font::{
    Font, FontError, FontId, FontSystem, FontSystemConfig, GlyphAtlas, GlyphKey, HeadlessAtlas,
    SdfConfig, SdfGenerator, SdfMode, Tag, TextCacheKey, outline_to_shape, signed_distance,
};
use lumina_test_utils::fixtures::{self, gid};

fn basic() -> Font {
    Font::from_bytes(FontId(0), fixtures::basic_font()).expect("basic font loads")
}

fn system_with(capacity: usize) -> (FontSystem, FontId) {
    let mut system = FontSystem::new(FontSystemConfig::new().with_run_cache_capacity(capacity));
    let id = system.load_font(fixtures::basic_font()).unwrap();
    (system, id)
}

fn key(id: FontId, text: &str) -> TextCacheKey {
    TextCacheKey::new(id, 24.0, text, 0)
}

// ========================================
// Distance Fields
// ========================================

#[test]
fn test_signed_distance_sign() {
    let mut font = basic();
    let outline = font.glyph_outline(gid::SQUARE).unwrap();
    let shape = outline_to_shape(&outline, 1.0);

    let inside = signed_distance(&shape, vec2(350.0, 250.0));
    assert!(inside < 0.0);
    assert!((inside + 250.0).abs() < 0.01);

    let outside = signed_distance(&shape, vec2(50.0, 250.0));
    assert!(outside > 0.0);
    assert!((outside - 50.0).abs() < 0.01);
}

#[test]
fn test_signed_distance_in_counter() {
    let mut font = basic();
    let outline = font.glyph_outline(gid::RING).unwrap();
    let shape = outline_to_shape(&outline, 1.0);
    // Center of the hole is outside the filled area.
    assert!(signed_distance(&shape, vec2(300.0, 300.0)) > 0.0);
    // Between the outer edge and the hole is inside.
    assert!(signed_distance(&shape, vec2(100.0, 300.0)) < 0.0);
}

#[test]
fn test_square_bitmap_dimensions() {
    let mut font = basic();
    let outline = font.glyph_outline(gid::SQUARE).unwrap();
    let generator = SdfGenerator::new(SdfConfig::default());
    let bitmap = generator.generate(&outline, 32.0, font.units_per_em());

    let side = (32.0f32 * 500.0 / 1000.0).round() as u32;
    assert_eq!(bitmap.width - 2 * bitmap.padding, side);
    assert_eq!(bitmap.height - 2 * bitmap.padding, side);
    assert_eq!(bitmap.data.len(), (bitmap.width * bitmap.height) as usize);
    assert!((bitmap.advance - 22.4).abs() < 1e-4);

    // Inside reads above the edge value, the padding corner below it.
    let center = bitmap.pixel(bitmap.width / 2, bitmap.height / 2).unwrap()[0];
    assert!(center > 128);
    assert!(bitmap.pixel(0, 0).unwrap()[0] < 128);
}

#[test]
fn test_msdf_channels() {
    let mut font = basic();
    let outline = font.glyph_outline(gid::CURVE).unwrap();
    let generator = SdfGenerator::new(SdfConfig::msdf());
    let bitmap = generator.generate(&outline, 48.0, font.units_per_em());
    assert_eq!(bitmap.channels, 3);
    assert_eq!(bitmap.data.len(), (bitmap.width * bitmap.height * 3) as usize);

    let mtsdf = SdfGenerator::new(SdfConfig::default().with_mode(SdfMode::Mtsdf))
        .generate(&outline, 48.0, font.units_per_em());
    assert_eq!(mtsdf.channels, 4);
    assert_eq!((mtsdf.width, mtsdf.height), (bitmap.width, bitmap.height));
}

#[test]
fn test_empty_glyph_bitmap() {
    let mut font = basic();
    let outline = font.glyph_outline(gid::SPACE).unwrap();
    let bitmap = SdfGenerator::new(SdfConfig::default()).generate(&outline, 32.0, 1000);
    assert!(bitmap.is_empty());
    assert_eq!(bitmap.advance, 8.0);
}

// ========================================
// Text Runs
// ========================================

#[test]
fn test_text_run_layout() {
    let (mut system, id) = system_with(16);
    let mut atlas = HeadlessAtlas::default();
    let run = system.text_run(id, 24.0, "AB A", &mut atlas).unwrap();

    let ids: Vec<u16> = run.glyphs.iter().map(|g| g.glyph_id).collect();
    assert_eq!(ids, vec![gid::SQUARE, gid::CURVE, gid::SPACE, gid::SQUARE]);
    let expected_width = (700.0 + 450.0 + 250.0 + 700.0) * 24.0 / 1000.0;
    assert!((run.width - expected_width).abs() < 1e-3);
    assert!((run.glyphs[1].x - 700.0 * 0.024).abs() < 1e-3);
    assert!((run.ascender - 800.0 * 0.024).abs() < 1e-3);

    // The space has no image; the two squares share one.
    assert!(run.glyphs[2].placement.is_none());
    assert_eq!(run.glyphs[0].placement, run.glyphs[3].placement);
    assert_eq!(atlas.len(), 2);
    assert!(atlas.has_glyph(&GlyphKey {
        font_id: id,
        glyph_id: gid::CURVE,
        variation_hash: 0,
    }));
}

#[test]
fn test_text_run_is_cached() {
    let (mut system, id) = system_with(16);
    let mut atlas = HeadlessAtlas::default();
    let first = system.text_run(id, 24.0, "AB", &mut atlas).unwrap();
    let second = system.text_run(id, 24.0, "AB", &mut atlas).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let stats = system.run_cache().stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);

    // A different size is a different run.
    let larger = system.text_run(id, 32.0, "AB", &mut atlas).unwrap();
    assert!(!Arc::ptr_eq(&first, &larger));
    assert_eq!(system.run_cache().len(), 2);
}

#[test]
fn test_run_cache_evicts_least_recently_used() {
    let (mut system, id) = system_with(2);
    let mut atlas = HeadlessAtlas::default();
    for text in ["A", "B", "C"] {
        system.text_run(id, 24.0, text, &mut atlas).unwrap();
    }
    assert!(!system.run_cache().contains(&key(id, "A")));
    assert!(system.run_cache().contains(&key(id, "B")));
    assert!(system.run_cache().contains(&key(id, "C")));
    assert_eq!(system.run_cache().stats().evictions, 1);
}

#[test]
fn test_run_cache_access_refreshes_recency() {
    let (mut system, id) = system_with(2);
    let mut atlas = HeadlessAtlas::default();
    for text in ["A", "B", "A", "C"] {
        system.text_run(id, 24.0, text, &mut atlas).unwrap();
    }
    assert!(system.run_cache().contains(&key(id, "A")));
    assert!(!system.run_cache().contains(&key(id, "B")));
    assert!(system.run_cache().contains(&key(id, "C")));
}

#[test]
fn test_variation_changes_run_key() {
    let mut system = FontSystem::default();
    let id = system.load_font(fixtures::variable_font()).unwrap();
    let mut atlas = HeadlessAtlas::default();

    let regular = system.text_run(id, 24.0, "A", &mut atlas).unwrap();
    system
        .font_mut(id)
        .unwrap()
        .set_axis_value(Tag::new(b"wght"), 900.0)
        .unwrap();
    let bold = system.text_run(id, 24.0, "A", &mut atlas).unwrap();

    assert!(!Arc::ptr_eq(&regular, &bold));
    // The bold square renders wider.
    let regular_width = regular.glyphs[0].placement.unwrap().width;
    assert!(bold.glyphs[0].placement.unwrap().width > regular_width);
    assert_eq!(system.run_cache().len(), 2);
    // Each variation state gets its own atlas image.
    assert_eq!(atlas.len(), 2);
}

#[test]
fn test_atlas_full_is_reported() {
    let (mut system, id) = system_with(4);
    let mut atlas = HeadlessAtlas::new(8, 1);
    let result = system.text_run(id, 24.0, "A", &mut atlas);
    assert!(matches!(result, Err(FontError::AtlasFull { .. })));
    // Nothing is cached for a failed run.
    assert!(system.run_cache().is_empty());
}

#[test]
fn test_unload_invalidates_runs() {
    let (mut system, id) = system_with(8);
    let other = system.load_font(fixtures::cff_font()).unwrap();
    let mut atlas = HeadlessAtlas::default();
    system.text_run(id, 24.0, "A", &mut atlas).unwrap();
    system.text_run(other, 24.0, "A", &mut atlas).unwrap();
    assert_eq!(system.run_cache().len(), 2);

    system.unload_font(id).unwrap();
    assert_eq!(system.run_cache().len(), 1);
    assert_eq!(system.font_ids(), vec![other]);
    assert!(matches!(
        system.text_run(id, 24.0, "A", &mut atlas),
        Err(FontError::FontNotFound(_))
    ));
}

#[test]
fn test_frames_and_stale_runs() {
    let (mut system, id) = system_with(8);
    let mut atlas = HeadlessAtlas::default();
    system.text_run(id, 24.0, "old", &mut atlas).unwrap();
    for _ in 0..3 {
        system.new_frame();
    }
    system.text_run(id, 24.0, "new", &mut atlas).unwrap();

    let stale = system.run_cache().stale_keys(2);
    assert_eq!(stale, vec![key(id, "old")]);
}

#[test]
fn test_render_glyph() {
    let (mut system, id) = system_with(8);
    let bitmap = system.render_glyph(id, gid::SQUARE, 32.0).unwrap();
    assert_eq!(bitmap.width - 2 * bitmap.padding, 16);
    assert!(matches!(
        system.render_glyph(id, 500, 32.0),
        Err(FontError::GlyphOutOfRange { .. })
    ));
}

// ========================================
// File Loading
// ========================================

#[test]
fn test_load_font_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&fixtures::basic_font()).unwrap();
    file.flush().unwrap();

    let mut system = FontSystem::default();
    let id = system.load_font_file(file.path()).unwrap();
    assert_eq!(system.font(id).unwrap().family_name(), "Lumina Test");
    assert_eq!(system.len(), 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Font::from_file(FontId(0), dir.path().join("missing.ttf"));
    assert!(matches!(result, Err(FontError::Io(_))));
}
