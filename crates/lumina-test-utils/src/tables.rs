//! Builders for the metadata tables: `head`, `hhea`, `maxp`, `hmtx`, `cmap`, `name`.

use crate::write::PutBe;

/// Font bounding box in font units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FontBox {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

pub fn head_table(units_per_em: u16, bbox: FontBox, long_loca: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(54);
    out.put_u32(0x0001_0000);
    out.put_u32(0x0001_0000); // fontRevision
    out.put_u32(0); // checksumAdjustment
    out.put_u32(0x5F0F_3CF5);
    out.put_u16(0x000B); // flags
    out.put_u16(units_per_em);
    out.extend_from_slice(&[0; 16]); // created, modified
    out.put_i16(bbox.x_min);
    out.put_i16(bbox.y_min);
    out.put_i16(bbox.x_max);
    out.put_i16(bbox.y_max);
    out.put_u16(0); // macStyle
    out.put_u16(8); // lowestRecPPEM
    out.put_i16(2); // fontDirectionHint
    out.put_i16(if long_loca { 1 } else { 0 });
    out.put_i16(0); // glyphDataFormat
    out
}

pub fn hhea_table(ascender: i16, descender: i16, line_gap: i16, advance_max: u16, number_of_h_metrics: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(36);
    out.put_u32(0x0001_0000);
    out.put_i16(ascender);
    out.put_i16(descender);
    out.put_i16(line_gap);
    out.put_u16(advance_max);
    out.put_i16(0); // minLeftSideBearing
    out.put_i16(0); // minRightSideBearing
    out.put_i16(0); // xMaxExtent
    out.put_i16(1); // caretSlopeRise
    out.put_i16(0); // caretSlopeRun
    out.put_i16(0); // caretOffset
    out.extend_from_slice(&[0; 8]);
    out.put_i16(0); // metricDataFormat
    out.put_u16(number_of_h_metrics);
    out
}

/// Version 0.5 `maxp`, as used by CFF fonts; the parser only reads the glyph count.
pub fn maxp_table(num_glyphs: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(6);
    out.put_u32(0x0000_5000);
    out.put_u16(num_glyphs);
    out
}

/// One long metric per glyph: `(advance_width, left_side_bearing)`.
pub fn hmtx_table(metrics: &[(u16, i16)]) -> Vec<u8> {
    let mut out = Vec::with_capacity(metrics.len() * 4);
    for &(advance, lsb) in metrics {
        out.put_u16(advance);
        out.put_i16(lsb);
    }
    out
}

/// `cmap` with a Windows BMP format 4 subtable, plus a format 12 subtable
/// when any codepoint lies outside the BMP.
pub fn cmap_table(mapping: &[(u32, u16)]) -> Vec<u8> {
    let mut sorted = mapping.to_vec();
    sorted.sort_by_key(|&(cp, _)| cp);
    sorted.dedup_by_key(|&mut (cp, _)| cp);

    let bmp: Vec<(u16, u16)> = sorted
        .iter()
        .filter(|&&(cp, _)| cp < 0xFFFF)
        .map(|&(cp, gid)| (cp as u16, gid))
        .collect();
    let needs_full = sorted.iter().any(|&(cp, _)| cp > 0xFFFF);

    let mut subtables = vec![(3u16, 1u16, cmap_format4(&bmp))];
    if needs_full {
        subtables.push((3, 10, cmap_format12(&sorted)));
    }

    let mut out = Vec::new();
    out.put_u16(0);
    out.put_u16(subtables.len() as u16);
    let mut offset = 4 + 8 * subtables.len();
    for (platform, encoding, data) in &subtables {
        out.put_u16(*platform);
        out.put_u16(*encoding);
        out.put_u32(offset as u32);
        offset += data.len();
    }
    for (_, _, data) in subtables {
        out.extend_from_slice(&data);
    }
    out
}

/// Runs of consecutive codepoints mapping to consecutive glyphs.
fn segments<T: Copy + Into<u32>>(mapping: &[(T, u16)]) -> Vec<(u32, u32, u16)> {
    let mut segments: Vec<(u32, u32, u16)> = Vec::new();
    for &(cp, gid) in mapping {
        let cp = cp.into();
        match segments.last_mut() {
            Some((start, end, first)) if *end + 1 == cp && u32::from(*first) + (cp - *start) == u32::from(gid) => {
                *end = cp;
            }
            _ => segments.push((cp, cp, gid)),
        }
    }
    segments
}

fn cmap_format4(mapping: &[(u16, u16)]) -> Vec<u8> {
    let mut segs = segments(mapping);
    segs.push((0xFFFF, 0xFFFF, 0));
    let seg_count = segs.len() as u16;
    let entry_selector = 15 - seg_count.leading_zeros() as u16;
    let search_range = 2 * (1u16 << entry_selector);

    let mut out = Vec::new();
    out.put_u16(4);
    out.put_u16(16 + 8 * seg_count);
    out.put_u16(0); // language
    out.put_u16(seg_count * 2);
    out.put_u16(search_range);
    out.put_u16(entry_selector);
    out.put_u16(seg_count * 2 - search_range);
    for &(_, end, _) in &segs {
        out.put_u16(end as u16);
    }
    out.put_u16(0); // reservedPad
    for &(start, _, _) in &segs {
        out.put_u16(start as u16);
    }
    for &(start, end, gid) in &segs {
        let delta = if start == 0xFFFF && end == 0xFFFF {
            1
        } else {
            gid.wrapping_sub(start as u16)
        };
        out.put_u16(delta);
    }
    for _ in &segs {
        out.put_u16(0); // idRangeOffset
    }
    out
}

fn cmap_format12(mapping: &[(u32, u16)]) -> Vec<u8> {
    let groups = segments(mapping);
    let mut out = Vec::new();
    out.put_u16(12);
    out.put_u16(0);
    out.put_u32(16 + 12 * groups.len() as u32);
    out.put_u32(0); // language
    out.put_u32(groups.len() as u32);
    for (start, end, gid) in groups {
        out.put_u32(start);
        out.put_u32(end);
        out.put_u32(u32::from(gid));
    }
    out
}

/// `name` table with Windows Unicode records for family (1), subfamily (2)
/// and full name (4), plus any extra `(name_id, string)` pairs.
pub fn name_table(family: &str, subfamily: &str, extra: &[(u16, String)]) -> Vec<u8> {
    let full = format!("{} {}", family, subfamily);
    let mut records: Vec<(u16, Vec<u8>)> = vec![
        (1, utf16_be(family)),
        (2, utf16_be(subfamily)),
        (4, utf16_be(&full)),
    ];
    records.extend(extra.iter().map(|(id, s)| (*id, utf16_be(s))));

    let mut out = Vec::new();
    out.put_u16(0);
    out.put_u16(records.len() as u16);
    out.put_u16(6 + 12 * records.len() as u16);
    let mut offset = 0u16;
    for (name_id, bytes) in &records {
        out.put_u16(3);
        out.put_u16(1);
        out.put_u16(0x0409);
        out.put_u16(*name_id);
        out.put_u16(bytes.len() as u16);
        out.put_u16(offset);
        offset += bytes.len() as u16;
    }
    for (_, bytes) in records {
        out.extend_from_slice(&bytes);
    }
    out
}

fn utf16_be(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_merge_runs() {
        let segs = segments(&[(65u16, 1), (66, 2), (67, 3), (70, 9)]);
        assert_eq!(segs, vec![(65, 67, 1), (70, 70, 9)]);
    }

    #[test]
    fn test_cmap_adds_format12_for_astral() {
        let bmp_only = cmap_table(&[(65, 1)]);
        assert_eq!(u16::from_be_bytes([bmp_only[2], bmp_only[3]]), 1);
        let astral = cmap_table(&[(65, 1), (0x1F600, 2)]);
        assert_eq!(u16::from_be_bytes([astral[2], astral[3]]), 2);
    }

    #[test]
    fn test_head_size() {
        assert_eq!(head_table(1000, FontBox::default(), false).len(), 54);
        assert_eq!(hhea_table(800, -200, 0, 600, 2).len(), 36);
    }
}
