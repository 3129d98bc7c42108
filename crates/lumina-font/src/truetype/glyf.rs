//! `loca` offsets and `glyf` glyph records.

use bitflags::bitflags;

use crate::cursor::ByteCursor;
use crate::error::{FontError, FontResult};
use crate::outline::{BoundingBox, Contour, OutlinePoint};
use crate::tables::Tag;

bitflags! {
    /// Per-point flags of a simple glyph.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SimpleGlyphFlags: u8 {
        const ON_CURVE_POINT = 0x01;
        const X_SHORT_VECTOR = 0x02;
        const Y_SHORT_VECTOR = 0x04;
        const REPEAT_FLAG = 0x08;
        const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR = 0x10;
        const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR = 0x20;
        const OVERLAP_SIMPLE = 0x40;
    }
}

bitflags! {
    /// Flags of a composite glyph component record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompositeGlyphFlags: u16 {
        const ARG_1_AND_2_ARE_WORDS = 0x0001;
        const ARGS_ARE_XY_VALUES = 0x0002;
        const ROUND_XY_TO_GRID = 0x0004;
        const WE_HAVE_A_SCALE = 0x0008;
        const MORE_COMPONENTS = 0x0020;
        const WE_HAVE_AN_X_AND_Y_SCALE = 0x0040;
        const WE_HAVE_A_TWO_BY_TWO = 0x0080;
        const WE_HAVE_INSTRUCTIONS = 0x0100;
        const USE_MY_METRICS = 0x0200;
        const OVERLAP_COMPOUND = 0x0400;
        const SCALED_COMPONENT_OFFSET = 0x0800;
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

/// Parse `loca` into `glyph_count + 1` byte offsets into `glyf`.
pub fn parse_loca(data: &[u8], glyph_count: u16, long: bool, glyf_len: usize) -> FontResult<Vec<u32>> {
    let entries = glyph_count as usize + 1;
    let mut c = ByteCursor::new(data);
    let mut offsets = Vec::with_capacity(entries);
    for _ in 0..entries {
        let offset = if long {
            c.read_u32()?
        } else {
            c.read_u16()? as u32 * 2
        };
        offsets.push(offset);
    }

    for (i, pair) in offsets.windows(2).enumerate() {
        if pair[1] < pair[0] {
            return Err(FontError::malformed(
                Tag::LOCA,
                format!("offset for glyph {} decreases ({} -> {})", i + 1, pair[0], pair[1]),
            ));
        }
    }
    if let Some(&last) = offsets.last()
        && last as usize > glyf_len
    {
        return Err(FontError::malformed(
            Tag::LOCA,
            format!("final offset {} is past the end of glyf ({} bytes)", last, glyf_len),
        ));
    }
    Ok(offsets)
}

/// 2x2 component transform plus translation, applied as
/// `x' = xx*x + yx*y + dx`, `y' = xy*x + yy*y + dy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentTransform {
    pub xx: f32,
    pub xy: f32,
    pub yx: f32,
    pub yy: f32,
}

impl ComponentTransform {
    pub const IDENTITY: Self = Self {
        xx: 1.0,
        xy: 0.0,
        yx: 0.0,
        yy: 1.0,
    };

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.xx * x + self.yx * y, self.xy * x + self.yy * y)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// How a component is positioned in its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentAnchor {
    /// Translate by an offset in font units.
    Offset { dx: f32, dy: f32 },
    /// Align the component's `child` point with the parent's `parent` point.
    Points { parent: u16, child: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    pub glyph_id: u16,
    pub flags: CompositeGlyphFlags,
    pub transform: ComponentTransform,
    pub anchor: ComponentAnchor,
}

/// Decoded contents of a single `glyf` record, before composite resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum GlyphRecord {
    Empty,
    Simple {
        contours: Vec<Contour>,
        bounds: BoundingBox,
    },
    Composite {
        components: Vec<Component>,
        bounds: BoundingBox,
    },
}

impl GlyphRecord {
    pub fn parse(data: &[u8]) -> FontResult<Self> {
        if data.is_empty() {
            return Ok(GlyphRecord::Empty);
        }

        let mut c = ByteCursor::new(data);
        let number_of_contours = c.read_i16()?;
        let bounds = BoundingBox {
            x_min: c.read_i16()? as f32,
            y_min: c.read_i16()? as f32,
            x_max: c.read_i16()? as f32,
            y_max: c.read_i16()? as f32,
        };

        if number_of_contours >= 0 {
            let contours = parse_simple(&mut c, number_of_contours as usize)?;
            Ok(GlyphRecord::Simple { contours, bounds })
        } else {
            let components = parse_components(&mut c)?;
            Ok(GlyphRecord::Composite { components, bounds })
        }
    }
}

fn parse_simple(c: &mut ByteCursor<'_>, number_of_contours: usize) -> FontResult<Vec<Contour>> {
    let mut end_points = Vec::with_capacity(number_of_contours);
    for _ in 0..number_of_contours {
        let end = c.read_u16()?;
        if end_points.last().is_some_and(|&prev: &u16| end < prev) {
            return Err(FontError::malformed(Tag::GLYF, "contour end points decrease"));
        }
        end_points.push(end);
    }
    let num_points = end_points.last().map(|&e| e as usize + 1).unwrap_or(0);

    let instruction_length = c.read_u16()? as usize;
    c.skip(instruction_length)?;

    let mut flags = Vec::with_capacity(num_points);
    while flags.len() < num_points {
        let flag = SimpleGlyphFlags::from_bits_retain(c.read_u8()?);
        flags.push(flag);
        if flag.contains(SimpleGlyphFlags::REPEAT_FLAG) {
            let repeat = c.read_u8()?;
            for _ in 0..repeat {
                if flags.len() == num_points {
                    break;
                }
                flags.push(flag);
            }
        }
    }

    let xs = read_coordinates(
        c,
        &flags,
        SimpleGlyphFlags::X_SHORT_VECTOR,
        SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
    )?;
    let ys = read_coordinates(
        c,
        &flags,
        SimpleGlyphFlags::Y_SHORT_VECTOR,
        SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
    )?;

    let mut contours = Vec::with_capacity(number_of_contours);
    let mut start = 0usize;
    for &end in &end_points {
        let end = end as usize;
        let points = (start..=end)
            .map(|i| OutlinePoint {
                x: xs[i] as f32,
                y: ys[i] as f32,
                on_curve: flags[i].contains(SimpleGlyphFlags::ON_CURVE_POINT),
            })
            .collect();
        contours.push(Contour { points });
        start = end + 1;
    }
    Ok(contours)
}

/// Decode one axis of delta-coded coordinates into absolute values.
fn read_coordinates(
    c: &mut ByteCursor<'_>,
    flags: &[SimpleGlyphFlags],
    short: SimpleGlyphFlags,
    same_or_positive: SimpleGlyphFlags,
) -> FontResult<Vec<i32>> {
    let mut values = Vec::with_capacity(flags.len());
    let mut value = 0i32;
    for &flag in flags {
        let delta = if flag.contains(short) {
            let magnitude = c.read_u8()? as i32;
            if flag.contains(same_or_positive) {
                magnitude
            } else {
                -magnitude
            }
        } else if flag.contains(same_or_positive) {
            0
        } else {
            c.read_i16()? as i32
        };
        value += delta;
        values.push(value);
    }
    Ok(values)
}

fn parse_components(c: &mut ByteCursor<'_>) -> FontResult<Vec<Component>> {
    let mut components = Vec::new();
    loop {
        let flags = CompositeGlyphFlags::from_bits_retain(c.read_u16()?);
        let glyph_id = c.read_u16()?;

        let words = flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS);
        let xy_values = flags.contains(CompositeGlyphFlags::ARGS_ARE_XY_VALUES);
        let anchor = match (words, xy_values) {
            (true, true) => ComponentAnchor::Offset {
                dx: c.read_i16()? as f32,
                dy: c.read_i16()? as f32,
            },
            (false, true) => ComponentAnchor::Offset {
                dx: c.read_i8()? as f32,
                dy: c.read_i8()? as f32,
            },
            (true, false) => ComponentAnchor::Points {
                parent: c.read_u16()?,
                child: c.read_u16()?,
            },
            (false, false) => ComponentAnchor::Points {
                parent: c.read_u8()? as u16,
                child: c.read_u8()? as u16,
            },
        };

        let transform = if flags.contains(CompositeGlyphFlags::WE_HAVE_A_SCALE) {
            let scale = c.read_f2dot14()?;
            ComponentTransform {
                xx: scale,
                yy: scale,
                ..ComponentTransform::IDENTITY
            }
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
            ComponentTransform {
                xx: c.read_f2dot14()?,
                yy: c.read_f2dot14()?,
                ..ComponentTransform::IDENTITY
            }
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_A_TWO_BY_TWO) {
            ComponentTransform {
                xx: c.read_f2dot14()?,
                xy: c.read_f2dot14()?,
                yx: c.read_f2dot14()?,
                yy: c.read_f2dot14()?,
            }
        } else {
            ComponentTransform::IDENTITY
        };

        components.push(Component {
            glyph_id,
            flags,
            transform,
            anchor,
        });

        if !flags.contains(CompositeGlyphFlags::MORE_COMPONENTS) {
            break;
        }
    }
    // Trailing composite instructions are not needed for outlines.
    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loca_short_doubles_offsets() {
        let data = [0u8, 0, 0, 10, 0, 10, 0, 30];
        let loca = parse_loca(&data, 3, false, 60).unwrap();
        assert_eq!(loca, vec![0, 20, 20, 60]);
    }

    #[test]
    fn test_loca_rejects_decreasing() {
        let mut data = Vec::new();
        for v in [0u32, 40, 20] {
            data.extend_from_slice(&v.to_be_bytes());
        }
        assert!(matches!(
            parse_loca(&data, 2, true, 100),
            Err(FontError::MalformedTable { table: Tag::LOCA, .. })
        ));
    }

    #[test]
    fn test_loca_rejects_past_glyf() {
        let data = [0u8, 0, 0, 0, 0, 0, 0, 200];
        assert!(parse_loca(&data, 1, true, 100).is_err());
    }

    #[test]
    fn test_simple_triangle_with_repeat_flag() {
        let mut g = Vec::new();
        g.extend_from_slice(&1i16.to_be_bytes());
        for v in [0i16, 0, 100, 100] {
            g.extend_from_slice(&v.to_be_bytes());
        }
        g.extend_from_slice(&2u16.to_be_bytes()); // end point
        g.extend_from_slice(&0u16.to_be_bytes()); // no instructions
        // All three on-curve with word deltas, one flag + repeat 2.
        g.push(0x01 | 0x08);
        g.push(2);
        for x in [0i16, 100, -50] {
            g.extend_from_slice(&x.to_be_bytes());
        }
        for y in [0i16, 0, 100] {
            g.extend_from_slice(&y.to_be_bytes());
        }

        let GlyphRecord::Simple { contours, bounds } = GlyphRecord::parse(&g).unwrap() else {
            panic!("expected a simple glyph");
        };
        assert_eq!(bounds.x_max, 100.0);
        assert_eq!(
            contours[0].points,
            vec![
                OutlinePoint::on(0.0, 0.0),
                OutlinePoint::on(100.0, 0.0),
                OutlinePoint::on(50.0, 100.0),
            ]
        );
    }

    #[test]
    fn test_short_vectors_and_same_flag() {
        let mut g = Vec::new();
        g.extend_from_slice(&1i16.to_be_bytes());
        g.extend_from_slice(&[0; 8]);
        g.extend_from_slice(&1u16.to_be_bytes());
        g.extend_from_slice(&0u16.to_be_bytes());
        // p0: x short positive 10, y short negative 5, on-curve
        g.push(0x01 | 0x02 | 0x10 | 0x04);
        // p1: x same, y short positive 7, off-curve
        g.push(0x10 | 0x04 | 0x20);
        g.push(10); // x p0
        g.push(5); // y p0
        g.push(7); // y p1

        let GlyphRecord::Simple { contours, .. } = GlyphRecord::parse(&g).unwrap() else {
            panic!("expected a simple glyph");
        };
        assert_eq!(
            contours[0].points,
            vec![OutlinePoint::on(10.0, -5.0), OutlinePoint::off(10.0, 2.0)]
        );
    }

    #[test]
    fn test_composite_components() {
        let mut g = Vec::new();
        g.extend_from_slice(&(-1i16).to_be_bytes());
        g.extend_from_slice(&[0; 8]);
        let flags = CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS
            | CompositeGlyphFlags::ARGS_ARE_XY_VALUES
            | CompositeGlyphFlags::WE_HAVE_A_SCALE
            | CompositeGlyphFlags::MORE_COMPONENTS;
        g.extend_from_slice(&flags.bits().to_be_bytes());
        g.extend_from_slice(&3u16.to_be_bytes());
        g.extend_from_slice(&100i16.to_be_bytes());
        g.extend_from_slice(&(-20i16).to_be_bytes());
        g.extend_from_slice(&0x2000u16.to_be_bytes()); // 0.5
        let flags = CompositeGlyphFlags::ARGS_ARE_XY_VALUES;
        g.extend_from_slice(&flags.bits().to_be_bytes());
        g.extend_from_slice(&4u16.to_be_bytes());
        g.push(5);
        g.push(6);

        let GlyphRecord::Composite { components, .. } = GlyphRecord::parse(&g).unwrap() else {
            panic!("expected a composite glyph");
        };
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].glyph_id, 3);
        assert_eq!(components[0].anchor, ComponentAnchor::Offset { dx: 100.0, dy: -20.0 });
        assert_eq!(components[0].transform.xx, 0.5);
        assert_eq!(components[1].anchor, ComponentAnchor::Offset { dx: 5.0, dy: 6.0 });
        assert!(components[1].transform.is_identity());
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(GlyphRecord::parse(&[]).unwrap(), GlyphRecord::Empty);
    }
}
