//! Integration tests for CFF (Type2 charstring) outlines.

use lumina_font::{CurveKind, Font, FontError, FontFormat, FontId, OutlinePoint};
use lumina_test_utils::{CffFontBuilder, Charstring, fixtures};

fn cff() -> Font {
    Font::from_bytes(FontId(0), fixtures::cff_font()).expect("CFF font loads")
}

#[test]
fn test_format_and_metadata() {
    let font = cff();
    assert_eq!(font.format(), FontFormat::OpenType);
    assert_eq!(font.curve_kind(), CurveKind::Cubic);
    assert_eq!(font.glyph_count(), 4);
    assert_eq!(font.glyph_id('B' as u32), 2);
}

#[test]
fn test_square_charstring() {
    let mut font = cff();
    let outline = font.glyph_outline(1).unwrap();
    assert_eq!(outline.contours.len(), 1);
    assert_eq!(
        outline.contours[0].points,
        vec![
            OutlinePoint::on(100.0, 0.0),
            OutlinePoint::on(100.0, 500.0),
            OutlinePoint::on(600.0, 500.0),
            OutlinePoint::on(600.0, 0.0),
        ]
    );
    // Advance comes from hmtx, not the charstring width.
    assert_eq!(outline.advance_width, 700.0);
}

#[test]
fn test_subroutines_match_inlined_outline() {
    let mut font = cff();
    let inlined = font.glyph_outline(1).unwrap();
    let via_local = font.glyph_outline(2).unwrap();
    let via_global = font.glyph_outline(3).unwrap();
    assert_eq!(inlined.contours, via_local.contours);
    assert_eq!(inlined.contours, via_global.contours);
    assert_eq!(inlined.bounds, via_global.bounds);
}

#[test]
fn test_empty_charstring() {
    let mut font = cff();
    assert!(font.glyph_outline(0).unwrap().is_empty());
}

#[test]
fn test_cubic_segments() {
    let bytes = CffFontBuilder::new()
        .glyph(Charstring::new().endchar().build(), 500)
        .glyph(
            Charstring::new()
                .rmoveto(0, 0)
                .rrcurveto(0, 100, 100, 100, 100, 0)
                .endchar()
                .build(),
            500,
        )
        .build();
    let mut font = Font::from_bytes(FontId(0), bytes).unwrap();
    let points = font.glyph_outline(1).unwrap().contours[0].points.clone();
    assert_eq!(
        points,
        vec![
            OutlinePoint::on(0.0, 0.0),
            OutlinePoint::off(0.0, 100.0),
            OutlinePoint::off(100.0, 200.0),
            OutlinePoint::on(200.0, 200.0),
        ]
    );
}

#[test]
fn test_width_operand_is_skipped() {
    // A leading odd operand before rmoveto is the advance width delta.
    let bytes = CffFontBuilder::new()
        .glyph(Charstring::new().endchar().build(), 500)
        .glyph(
            Charstring::new()
                .num(250)
                .rmoveto(10, 20)
                .rlineto(&[(30, 0), (0, 30)])
                .endchar()
                .build(),
            500,
        )
        .build();
    let mut font = Font::from_bytes(FontId(0), bytes).unwrap();
    let outline = font.glyph_outline(1).unwrap();
    assert_eq!(outline.contours[0].points[0], OutlinePoint::on(10.0, 20.0));
    assert_eq!(outline.contours[0].points.len(), 3);
}

#[test]
fn test_runaway_subroutine_recursion() {
    // Subroutine 0 calls itself forever.
    let recursive = Charstring::new().callsubr(0, 1).build();
    let bytes = CffFontBuilder::new()
        .glyph(Charstring::new().endchar().build(), 500)
        .glyph(Charstring::new().rmoveto(0, 0).callsubr(0, 1).endchar().build(), 500)
        .local_subr(recursive)
        .build();
    let mut font = Font::from_bytes(FontId(0), bytes).unwrap();
    assert_eq!(
        font.glyph_outline(1).unwrap_err(),
        FontError::SubroutineDepthExceeded
    );
}

#[test]
fn test_missing_cff_table() {
    let bytes = CffFontBuilder::new()
        .glyph(Charstring::new().endchar().build(), 500)
        .sfnt()
        .without(b"CFF ")
        .build();
    assert!(matches!(
        Font::from_bytes(FontId(0), bytes),
        Err(FontError::MissingTable(_))
    ));
}
