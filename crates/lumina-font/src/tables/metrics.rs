//! `head`, `hhea`, `maxp` and `hmtx`.

use crate::cursor::ByteCursor;
use crate::error::{FontError, FontResult};

use super::Tag;

/// Parsed `head` table.
#[derive(Debug, Clone)]
pub struct HeadTable {
    pub units_per_em: u16,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    /// 0 = short (u16 / 2) offsets, 1 = long (u32) offsets
    pub index_to_loc_format: i16,
    pub mac_style: u16,
    pub flags: u16,
}

impl HeadTable {
    const MAGIC: u32 = 0x5F0F3CF5;

    pub fn parse(data: &[u8]) -> FontResult<Self> {
        let mut c = ByteCursor::new(data);
        c.skip(4)?; // major + minor version
        let _font_revision = c.read_u32()?;
        let _checksum_adjustment = c.read_u32()?;
        let magic = c.read_u32()?;
        if magic != Self::MAGIC {
            return Err(FontError::malformed(
                Tag::HEAD,
                format!("bad magic number {:#010x}", magic),
            ));
        }
        let flags = c.read_u16()?;
        let units_per_em = c.read_u16()?;
        c.skip(16)?; // created + modified
        let x_min = c.read_i16()?;
        let y_min = c.read_i16()?;
        let x_max = c.read_i16()?;
        let y_max = c.read_i16()?;
        let mac_style = c.read_u16()?;
        let _lowest_rec_ppem = c.read_u16()?;
        let _font_direction_hint = c.read_i16()?;
        let index_to_loc_format = c.read_i16()?;

        if units_per_em == 0 {
            return Err(FontError::malformed(Tag::HEAD, "unitsPerEm is zero"));
        }
        if !(0..=1).contains(&index_to_loc_format) {
            return Err(FontError::malformed(
                Tag::HEAD,
                format!("unknown indexToLocFormat {}", index_to_loc_format),
            ));
        }

        Ok(Self {
            units_per_em,
            x_min,
            y_min,
            x_max,
            y_max,
            index_to_loc_format,
            mac_style,
            flags,
        })
    }

    pub fn uses_long_offsets(&self) -> bool {
        self.index_to_loc_format == 1
    }
}

/// Parsed `hhea` table.
#[derive(Debug, Clone, Default)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub number_of_h_metrics: u16,
}

impl HheaTable {
    pub fn parse(data: &[u8]) -> FontResult<Self> {
        let mut c = ByteCursor::new(data);
        c.skip(4)?; // version
        let ascender = c.read_i16()?;
        let descender = c.read_i16()?;
        let line_gap = c.read_i16()?;
        let advance_width_max = c.read_u16()?;
        c.skip(22)?; // extents, caret fields, reserved, metricDataFormat
        let number_of_h_metrics = c.read_u16()?;

        Ok(Self {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            number_of_h_metrics,
        })
    }
}

/// Parsed `maxp` table. Only the glyph count is needed for outline access.
#[derive(Debug, Clone)]
pub struct MaxpTable {
    pub num_glyphs: u16,
}

impl MaxpTable {
    pub fn parse(data: &[u8]) -> FontResult<Self> {
        let mut c = ByteCursor::new(data);
        let _version = c.read_u32()?;
        let num_glyphs = c.read_u16()?;
        Ok(Self { num_glyphs })
    }
}

/// Horizontal metrics of one glyph, in font units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    pub advance_width: u16,
    pub left_side_bearing: i16,
}

/// Parsed `hmtx` table.
///
/// Glyphs past `numberOfHMetrics` share the last advance width and take their
/// left side bearing from the trailing array.
#[derive(Debug, Clone, Default)]
pub struct HmtxTable {
    h_metrics: Vec<GlyphMetrics>,
    left_side_bearings: Vec<i16>,
}

impl HmtxTable {
    pub fn parse(data: &[u8], number_of_h_metrics: u16, num_glyphs: u16) -> FontResult<Self> {
        if number_of_h_metrics == 0 && num_glyphs > 0 {
            return Err(FontError::malformed(Tag::HMTX, "numberOfHMetrics is zero"));
        }

        let mut c = ByteCursor::new(data);
        let mut h_metrics = Vec::with_capacity(number_of_h_metrics as usize);
        for _ in 0..number_of_h_metrics {
            h_metrics.push(GlyphMetrics {
                advance_width: c.read_u16()?,
                left_side_bearing: c.read_i16()?,
            });
        }

        let trailing = num_glyphs.saturating_sub(number_of_h_metrics);
        let mut left_side_bearings = Vec::with_capacity(trailing as usize);
        for _ in 0..trailing {
            // Some fonts truncate the trailing array; missing entries read as zero.
            match c.read_i16() {
                Ok(lsb) => left_side_bearings.push(lsb),
                Err(_) => break,
            }
        }

        Ok(Self {
            h_metrics,
            left_side_bearings,
        })
    }

    pub fn metrics(&self, glyph_id: u16) -> GlyphMetrics {
        let id = glyph_id as usize;
        if let Some(m) = self.h_metrics.get(id) {
            return *m;
        }
        let advance_width = self.h_metrics.last().map(|m| m.advance_width).unwrap_or(0);
        let left_side_bearing = id
            .checked_sub(self.h_metrics.len())
            .and_then(|i| self.left_side_bearings.get(i))
            .copied()
            .unwrap_or(0);
        GlyphMetrics {
            advance_width,
            left_side_bearing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hmtx_bytes(metrics: &[(u16, i16)], lsbs: &[i16]) -> Vec<u8> {
        let mut out = Vec::new();
        for (aw, lsb) in metrics {
            out.extend_from_slice(&aw.to_be_bytes());
            out.extend_from_slice(&lsb.to_be_bytes());
        }
        for lsb in lsbs {
            out.extend_from_slice(&lsb.to_be_bytes());
        }
        out
    }

    #[test]
    fn test_hmtx_reuses_last_advance() {
        let data = hmtx_bytes(&[(500, 10), (600, 20)], &[30, 40]);
        let hmtx = HmtxTable::parse(&data, 2, 4).unwrap();

        assert_eq!(hmtx.metrics(0), GlyphMetrics { advance_width: 500, left_side_bearing: 10 });
        assert_eq!(hmtx.metrics(1), GlyphMetrics { advance_width: 600, left_side_bearing: 20 });
        assert_eq!(hmtx.metrics(2), GlyphMetrics { advance_width: 600, left_side_bearing: 30 });
        assert_eq!(hmtx.metrics(3), GlyphMetrics { advance_width: 600, left_side_bearing: 40 });
    }

    #[test]
    fn test_hmtx_truncated_trailing_lsb() {
        let data = hmtx_bytes(&[(500, 10)], &[]);
        let hmtx = HmtxTable::parse(&data, 1, 3).unwrap();
        assert_eq!(hmtx.metrics(2).advance_width, 500);
        assert_eq!(hmtx.metrics(2).left_side_bearing, 0);
    }

    #[test]
    fn test_hmtx_rejects_zero_metric_count() {
        assert!(HmtxTable::parse(&[], 0, 5).is_err());
    }

    #[test]
    fn test_maxp_too_short() {
        assert!(matches!(
            MaxpTable::parse(&[0, 0, 0x50, 0]),
            Err(FontError::UnexpectedEof { .. })
        ));
    }
}
