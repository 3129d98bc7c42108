//! `cmap` character-to-glyph mapping.
//!
//! The Windows Unicode BMP subtable (platform 3, encoding 1) in format 4 is
//! preferred, falling back to a Unicode-platform format 4 subtable. A format 12
//! subtable, when present, is consulted for codepoints the format 4 map does not
//! cover (astral planes in practice).

use crate::cursor::ByteCursor;
use crate::error::{FontError, FontResult};

use super::Tag;

/// One format 4 segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    start: u16,
    end: u16,
    id_delta: i16,
    /// Index into `glyph_ids` of the segment's first code, or `None` when the
    /// segment maps through `id_delta` alone.
    glyph_index_base: Option<usize>,
}

/// One format 12 sequential map group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SequentialGroup {
    start: u32,
    end: u32,
    start_glyph: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CmapTable {
    segments: Vec<Segment>,
    glyph_ids: Vec<u16>,
    groups: Vec<SequentialGroup>,
}

impl CmapTable {
    pub fn parse(data: &[u8]) -> FontResult<Self> {
        let mut c = ByteCursor::new(data);
        let _version = c.read_u16()?;
        let num_tables = c.read_u16()?;

        let mut format4: Option<(u8, u32)> = None;
        let mut format12: Option<u32> = None;
        for _ in 0..num_tables {
            let platform_id = c.read_u16()?;
            let encoding_id = c.read_u16()?;
            let offset = c.read_u32()?;
            let format = ByteCursor::at(data, offset as usize)?.read_u16()?;

            // Lower rank wins.
            let rank = match (platform_id, encoding_id) {
                (3, 1) => 0,
                (0, _) => 1,
                _ => 2,
            };
            match format {
                4 if rank < 2 && format4.is_none_or(|(best, _)| rank < best) => {
                    format4 = Some((rank, offset));
                }
                12 if matches!((platform_id, encoding_id), (3, 10) | (0, 4) | (0, 6)) => {
                    format12.get_or_insert(offset);
                }
                _ => {}
            }
        }

        let mut table = CmapTable::default();
        if let Some((_, offset)) = format4 {
            table.parse_format4(data, offset as usize)?;
        }
        if let Some(offset) = format12 {
            table.parse_format12(data, offset as usize)?;
        }
        if format4.is_none() && format12.is_none() {
            tracing::warn!("cmap has no Unicode subtable; all codepoints map to .notdef");
        }
        Ok(table)
    }

    fn parse_format4(&mut self, data: &[u8], offset: usize) -> FontResult<()> {
        let mut c = ByteCursor::at(data, offset)?;
        let _format = c.read_u16()?;
        let length = c.read_u16()? as usize;
        let _language = c.read_u16()?;
        let seg_count_x2 = c.read_u16()? as usize;
        if seg_count_x2 % 2 != 0 {
            return Err(FontError::malformed(Tag::CMAP, "odd segCountX2"));
        }
        let seg_count = seg_count_x2 / 2;
        c.skip(6)?; // searchRange, entrySelector, rangeShift

        let mut ends = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            ends.push(c.read_u16()?);
        }
        c.skip(2)?; // reservedPad
        let mut starts = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            starts.push(c.read_u16()?);
        }
        let mut deltas = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            deltas.push(c.read_i16()?);
        }
        let mut range_offsets = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            range_offsets.push(c.read_u16()?);
        }

        // glyphIdArray runs from here to the end of the subtable.
        let array_start = c.tell();
        let subtable_end = (offset + length).min(data.len());
        let array_len = subtable_end.saturating_sub(array_start) / 2;
        let mut glyph_ids = Vec::with_capacity(array_len);
        for _ in 0..array_len {
            glyph_ids.push(c.read_u16()?);
        }

        let mut segments = Vec::with_capacity(seg_count);
        for i in 0..seg_count {
            if starts[i] > ends[i] {
                return Err(FontError::malformed(
                    Tag::CMAP,
                    format!("segment {} starts after it ends", i),
                ));
            }
            // idRangeOffset is relative to its own slot; convert it to an index
            // into glyphIdArray, which starts `seg_count - i` slots later.
            let glyph_index_base = match range_offsets[i] {
                0 => None,
                ro => Some(((ro / 2) as usize).checked_sub(seg_count - i).ok_or_else(|| {
                    FontError::malformed(Tag::CMAP, format!("segment {} idRangeOffset underflows", i))
                })?),
            };
            segments.push(Segment {
                start: starts[i],
                end: ends[i],
                id_delta: deltas[i],
                glyph_index_base,
            });
        }

        self.segments = segments;
        self.glyph_ids = glyph_ids;
        Ok(())
    }

    fn parse_format12(&mut self, data: &[u8], offset: usize) -> FontResult<()> {
        let mut c = ByteCursor::at(data, offset)?;
        let _format = c.read_u16()?;
        c.skip(2)?; // reserved
        let _length = c.read_u32()?;
        let _language = c.read_u32()?;
        let num_groups = c.read_u32()?;

        let mut groups = Vec::with_capacity((num_groups as usize).min(c.remaining() / 12));
        for _ in 0..num_groups {
            let group = SequentialGroup {
                start: c.read_u32()?,
                end: c.read_u32()?,
                start_glyph: c.read_u32()?,
            };
            if group.start > group.end {
                return Err(FontError::malformed(Tag::CMAP, "format 12 group starts after it ends"));
            }
            groups.push(group);
        }
        self.groups = groups;
        Ok(())
    }

    /// Map a codepoint to a glyph id; unmapped codepoints return 0 (`.notdef`).
    pub fn glyph_id(&self, codepoint: u32) -> u16 {
        self.lookup_format4(codepoint)
            .or_else(|| self.lookup_format12(codepoint))
            .unwrap_or(0)
    }

    fn lookup_format4(&self, codepoint: u32) -> Option<u16> {
        let code = u16::try_from(codepoint).ok()?;
        // Segments are sorted by end code.
        let idx = self.segments.partition_point(|s| s.end < code);
        let seg = self.segments.get(idx)?;
        if code < seg.start {
            return None;
        }
        let glyph = match seg.glyph_index_base {
            None => (code as i32 + seg.id_delta as i32) as u16,
            Some(base) => {
                let raw = *self.glyph_ids.get(base + (code - seg.start) as usize)?;
                if raw == 0 {
                    return None;
                }
                (raw as i32 + seg.id_delta as i32) as u16
            }
        };
        (glyph != 0).then_some(glyph)
    }

    fn lookup_format12(&self, codepoint: u32) -> Option<u16> {
        let idx = self.groups.partition_point(|g| g.end < codepoint);
        let group = self.groups.get(idx)?;
        if codepoint < group.start {
            return None;
        }
        u16::try_from(group.start_glyph + (codepoint - group.start)).ok()
    }

    /// All `(codepoint, glyph id)` pairs with a non-zero glyph.
    pub fn mappings(&self) -> Vec<(u32, u16)> {
        let mut out = Vec::new();
        for seg in &self.segments {
            for code in seg.start..=seg.end {
                if let Some(glyph) = self.lookup_format4(code as u32) {
                    out.push((code as u32, glyph));
                }
            }
        }
        for group in &self.groups {
            for cp in group.start..=group.end.min(group.start.saturating_add(0xFFFF)) {
                if self.lookup_format4(cp).is_none()
                    && let Some(glyph) = self.lookup_format12(cp)
                {
                    out.push((cp, glyph));
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.groups.is_empty()
    }
}
