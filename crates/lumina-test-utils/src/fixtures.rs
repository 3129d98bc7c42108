//! Ready-made fonts used across the test suites.

use crate::cff::Charstring;
use crate::glyf::{Component, Point, TestGlyph};
use crate::variation::{Axis, Instance, Tuple, identity_map};
use crate::{CffFontBuilder, TrueTypeFontBuilder};

/// Glyph ids of [`basic_font`].
pub mod gid {
    pub const NOTDEF: u16 = 0;
    pub const SQUARE: u16 = 1;
    pub const SPACE: u16 = 2;
    pub const CURVE: u16 = 3;
    pub const COMPOSITE: u16 = 4;
    pub const RING: u16 = 5;
}

/// 500 x 500 square starting at (100, 0).
pub fn square() -> TestGlyph {
    TestGlyph::rect(100, 0, 600, 500)
}

/// A bowl with an implied on-curve midpoint between two off-curve points.
pub fn curve() -> TestGlyph {
    TestGlyph::Simple(vec![vec![
        Point::on(0, 0),
        Point::off(0, 400),
        Point::off(400, 400),
        Point::on(400, 0),
    ]])
}

/// Outer square with a counter-wound hole.
pub fn ring() -> TestGlyph {
    TestGlyph::Simple(vec![
        vec![
            Point::on(0, 0),
            Point::on(0, 600),
            Point::on(600, 600),
            Point::on(600, 0),
        ],
        vec![
            Point::on(200, 200),
            Point::on(400, 200),
            Point::on(400, 400),
            Point::on(200, 400),
        ],
    ])
}

/// Static TrueType font, upem 1000:
///
/// | id | glyph | mapped from |
/// |----|-------|-------------|
/// | 0 | `.notdef` (empty) | |
/// | 1 | [`square`] | `A` |
/// | 2 | space (empty) | ` ` |
/// | 3 | [`curve`] | `B` |
/// | 4 | square + curve shifted 700 right | `C` |
/// | 5 | [`ring`] | `O` |
pub fn basic_font() -> Vec<u8> {
    basic_builder().build()
}

pub fn basic_builder() -> TrueTypeFontBuilder {
    TrueTypeFontBuilder::new()
        .family("Lumina Test", "Regular")
        .glyph(TestGlyph::Empty, 500)
        .glyph(square(), 700)
        .glyph(TestGlyph::Empty, 250)
        .glyph(curve(), 450)
        .glyph(
            TestGlyph::Composite(vec![
                Component::new(gid::SQUARE, 0, 0),
                Component::new(gid::CURVE, 700, 0),
            ]),
            1200,
        )
        .glyph(ring(), 650)
        .map('A', gid::SQUARE)
        .map(' ', gid::SPACE)
        .map('B', gid::CURVE)
        .map('C', gid::COMPOSITE)
        .map('O', gid::RING)
}

/// Glyphs 1 and 2 reference each other.
pub fn cyclic_composite_font() -> Vec<u8> {
    TrueTypeFontBuilder::new()
        .glyph(TestGlyph::Empty, 500)
        .glyph(TestGlyph::Composite(vec![Component::new(2, 0, 0)]), 500)
        .glyph(
            TestGlyph::Composite(vec![Component::new(3, 0, 0), Component::new(1, 10, 0)]),
            500,
        )
        .glyph(square(), 500)
        .map('A', 1)
        .build()
}

/// Variable font with a `wght` axis (100..400..900) and a `Bold` instance at 700.
///
/// Glyph 1 is [`square`]. Its only tuple (peak `wght` = +1) moves the right
/// edge and the advance phantom point 100 units right, so at `wght` = 900 the
/// square is 600 wide with an advance of 800.
///
/// Glyph 2 is the same square with a sparse tuple touching only the top
/// corners (points 1 and 2). The bottom corners are inferred, which gives the
/// same outline as glyph 1.
pub fn variable_font() -> Vec<u8> {
    variable_builder().build()
}

pub fn variable_builder() -> TrueTypeFontBuilder {
    // Square points: (100,0) (100,500) (600,500) (600,0), then 4 phantoms.
    let widen = vec![(0, 0), (0, 0), (100, 0), (100, 0), (0, 0), (100, 0), (0, 0), (0, 0)];
    TrueTypeFontBuilder::new()
        .family("Lumina Variable", "Regular")
        .glyph(TestGlyph::Empty, 500)
        .glyph(square(), 700)
        .glyph(square(), 700)
        .map('A', 1)
        .map('S', 2)
        .axis(Axis::weight())
        .instance(Instance::new(258, vec![700.0]))
        .avar(vec![identity_map()])
        .variation(1, vec![Tuple::new(vec![1.0], widen)])
        .variation(
            2,
            vec![Tuple::new(vec![1.0], vec![(0, 0), (100, 0)]).with_points(vec![1, 2])],
        )
}

/// CFF font whose glyphs 1 and 2 draw the same square, glyph 2 through a
/// local subroutine and glyph 3 through a global one.
pub fn cff_font() -> Vec<u8> {
    let square = Charstring::new()
        .rmoveto(100, 0)
        .rlineto(&[(0, 500), (500, 0), (0, -500)])
        .endchar()
        .build();
    let square_body = Charstring::new()
        .rlineto(&[(0, 500), (500, 0), (0, -500)])
        .ret()
        .build();
    let via_local = Charstring::new().rmoveto(100, 0).callsubr(0, 1).endchar().build();
    let via_global = Charstring::new().rmoveto(100, 0).callgsubr(0, 1).endchar().build();

    CffFontBuilder::new()
        .glyph(Charstring::new().endchar().build(), 500)
        .glyph(square, 700)
        .glyph(via_local, 700)
        .glyph(via_global, 700)
        .local_subr(square_body.clone())
        .global_subr(square_body)
        .map('A', 1)
        .map('B', 2)
        .map('C', 3)
        .build()
}
