//! `gvar` glyph variation data.
//!
//! Decodes the tuple variation store of one glyph into [`GlyphVariation`]s:
//! the region each tuple applies to, the points it touches and their deltas.

use crate::cursor::{ByteCursor, slice};
use crate::error::{FontError, FontResult};
use crate::tables::Tag;

const SHARED_POINT_NUMBERS: u16 = 0x8000;
const COUNT_MASK: u16 = 0x0FFF;

const EMBEDDED_PEAK_TUPLE: u16 = 0x8000;
const INTERMEDIATE_REGION: u16 = 0x4000;
const PRIVATE_POINT_NUMBERS: u16 = 0x2000;
const TUPLE_INDEX_MASK: u16 = 0x0FFF;

const POINTS_ARE_WORDS: u8 = 0x80;
const POINT_RUN_COUNT_MASK: u8 = 0x7F;

const DELTAS_ARE_ZERO: u8 = 0x80;
const DELTAS_ARE_WORDS: u8 = 0x40;
const DELTA_RUN_COUNT_MASK: u8 = 0x3F;

/// Variation deltas of one tuple for one glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphVariation {
    /// Normalized peak coordinate per axis.
    pub peak: Vec<f32>,
    /// Explicit `(start, end)` region, when the tuple has one.
    pub intermediate: Option<(Vec<f32>, Vec<f32>)>,
    /// Referenced point numbers, or `None` when every point has a delta.
    pub points: Option<Vec<u16>>,
    pub x_deltas: Vec<f32>,
    pub y_deltas: Vec<f32>,
}

impl GlyphVariation {
    /// How strongly this tuple applies at `coords`.
    ///
    /// Without an intermediate region each axis with a non-zero peak
    /// contributes `clamp(|coord / peak|, 0, 1)`, or zero when the signs
    /// disagree. With one, each axis follows the start/peak/end tent.
    pub fn scalar(&self, coords: &[f32]) -> f32 {
        let mut scalar = 1.0f32;
        for (i, &peak) in self.peak.iter().enumerate() {
            if peak == 0.0 {
                continue;
            }
            let coord = coords.get(i).copied().unwrap_or(0.0);
            if coord == 0.0 || coord.signum() != peak.signum() {
                return 0.0;
            }

            match &self.intermediate {
                Some((start, end)) => {
                    let start = start.get(i).copied().unwrap_or(peak.min(0.0));
                    let end = end.get(i).copied().unwrap_or(peak.max(0.0));
                    if start > peak || peak > end {
                        continue;
                    }
                    if coord < start || coord > end {
                        return 0.0;
                    }
                    if coord < peak {
                        scalar *= (coord - start) / (peak - start);
                    } else if coord > peak {
                        scalar *= (end - coord) / (end - peak);
                    }
                }
                None => scalar *= (coord / peak).abs().clamp(0.0, 1.0),
            }
        }
        scalar
    }
}

/// Parsed `gvar` table. Owns a copy of the table bytes.
#[derive(Debug, Clone)]
pub struct GvarTable {
    data: Vec<u8>,
    axis_count: usize,
    shared_tuples: Vec<Vec<f32>>,
    data_array_offset: usize,
    glyph_offsets: Vec<u32>,
}

impl GvarTable {
    pub fn parse(data: &[u8]) -> FontResult<Self> {
        let mut c = ByteCursor::new(data);
        let major = c.read_u16()?;
        let _minor = c.read_u16()?;
        if major != 1 {
            return Err(FontError::malformed(
                Tag::GVAR,
                format!("unsupported version {}", major),
            ));
        }
        let axis_count = c.read_u16()? as usize;
        let shared_tuple_count = c.read_u16()? as usize;
        let shared_tuples_offset = c.read_u32()? as usize;
        let glyph_count = c.read_u16()? as usize;
        let flags = c.read_u16()?;
        let data_array_offset = c.read_u32()? as usize;

        let long_offsets = flags & 1 != 0;
        let mut glyph_offsets = Vec::with_capacity(glyph_count + 1);
        for _ in 0..=glyph_count {
            let offset = if long_offsets {
                c.read_u32()?
            } else {
                c.read_u16()? as u32 * 2
            };
            glyph_offsets.push(offset);
        }
        if glyph_offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err(FontError::malformed(Tag::GVAR, "glyph data offsets decrease"));
        }

        let mut t = ByteCursor::at(data, shared_tuples_offset)?;
        let mut shared_tuples = Vec::with_capacity(shared_tuple_count);
        for _ in 0..shared_tuple_count {
            shared_tuples.push(read_tuple(&mut t, axis_count)?);
        }

        Ok(Self {
            data: data.to_vec(),
            axis_count,
            shared_tuples,
            data_array_offset,
            glyph_offsets,
        })
    }

    pub fn axis_count(&self) -> usize {
        self.axis_count
    }

    pub fn glyph_count(&self) -> usize {
        self.glyph_offsets.len().saturating_sub(1)
    }

    /// Decode every tuple variation of a glyph.
    ///
    /// `point_count` includes the four phantom points. Glyphs without data
    /// have no variations.
    pub fn glyph_variations(&self, glyph_id: u16, point_count: usize) -> FontResult<Vec<GlyphVariation>> {
        let id = glyph_id as usize;
        let (Some(&start), Some(&end)) = (self.glyph_offsets.get(id), self.glyph_offsets.get(id + 1))
        else {
            return Ok(Vec::new());
        };
        if start == end {
            return Ok(Vec::new());
        }
        let glyph_data = slice(
            &self.data,
            self.data_array_offset + start as usize,
            (end - start) as usize,
        )?;
        self.decode(glyph_data, point_count)
    }

    fn decode(&self, glyph_data: &[u8], point_count: usize) -> FontResult<Vec<GlyphVariation>> {
        let mut headers = ByteCursor::new(glyph_data);
        let tuple_count = headers.read_u16()?;
        let data_offset = headers.read_u16()? as usize;

        let mut serialized = ByteCursor::at(glyph_data, data_offset)?;
        let shared_points = if tuple_count & SHARED_POINT_NUMBERS != 0 {
            read_packed_points(&mut serialized)?
        } else {
            None
        };

        let count = (tuple_count & COUNT_MASK) as usize;
        let mut variations = Vec::with_capacity(count);
        for _ in 0..count {
            let data_size = headers.read_u16()? as usize;
            let tuple_index = headers.read_u16()?;

            let peak = if tuple_index & EMBEDDED_PEAK_TUPLE != 0 {
                read_tuple(&mut headers, self.axis_count)?
            } else {
                let index = (tuple_index & TUPLE_INDEX_MASK) as usize;
                self.shared_tuples.get(index).cloned().ok_or_else(|| {
                    FontError::malformed(Tag::GVAR, format!("shared tuple {} out of range", index))
                })?
            };
            let intermediate = if tuple_index & INTERMEDIATE_REGION != 0 {
                let start = read_tuple(&mut headers, self.axis_count)?;
                let end = read_tuple(&mut headers, self.axis_count)?;
                Some((start, end))
            } else {
                None
            };

            let tuple_data = serialized.read_bytes(data_size)?;
            let mut d = ByteCursor::new(tuple_data);
            let points = if tuple_index & PRIVATE_POINT_NUMBERS != 0 {
                read_packed_points(&mut d)?
            } else {
                shared_points.clone()
            };

            let delta_count = points.as_ref().map_or(point_count, Vec::len);
            let mut deltas = read_packed_deltas(&mut d, delta_count * 2)?;
            let y_deltas = deltas.split_off(delta_count);

            variations.push(GlyphVariation {
                peak,
                intermediate,
                points,
                x_deltas: deltas,
                y_deltas,
            });
        }
        Ok(variations)
    }
}

fn read_tuple(c: &mut ByteCursor<'_>, axis_count: usize) -> FontResult<Vec<f32>> {
    (0..axis_count).map(|_| c.read_f2dot14()).collect()
}

/// Packed point numbers. `None` means every point of the glyph.
pub fn read_packed_points(c: &mut ByteCursor<'_>) -> FontResult<Option<Vec<u16>>> {
    let first = c.read_u8()?;
    if first == 0 {
        return Ok(None);
    }
    let count = if first & POINTS_ARE_WORDS != 0 {
        ((first & POINT_RUN_COUNT_MASK) as usize) << 8 | c.read_u8()? as usize
    } else {
        first as usize
    };

    let mut points = Vec::with_capacity(count);
    let mut last = 0u16;
    while points.len() < count {
        let control = c.read_u8()?;
        let run = (control & POINT_RUN_COUNT_MASK) as usize + 1;
        for _ in 0..run.min(count - points.len()) {
            let delta = if control & POINTS_ARE_WORDS != 0 {
                c.read_u16()?
            } else {
                c.read_u8()? as u16
            };
            last = last.wrapping_add(delta);
            points.push(last);
        }
    }
    Ok(Some(points))
}

/// `count` packed delta values.
pub fn read_packed_deltas(c: &mut ByteCursor<'_>, count: usize) -> FontResult<Vec<f32>> {
    let mut deltas = Vec::with_capacity(count);
    while deltas.len() < count {
        let control = c.read_u8()?;
        let run = (control & DELTA_RUN_COUNT_MASK) as usize + 1;
        for _ in 0..run.min(count - deltas.len()) {
            let value = if control & DELTAS_ARE_ZERO != 0 {
                0.0
            } else if control & DELTAS_ARE_WORDS != 0 {
                c.read_i16()? as f32
            } else {
                c.read_i8()? as f32
            };
            deltas.push(value);
        }
    }
    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_points_all() {
        let mut c = ByteCursor::new(&[0]);
        assert_eq!(read_packed_points(&mut c).unwrap(), None);
    }

    #[test]
    fn test_packed_points_runs() {
        // 4 points: byte run [1, 2] then word run [300, 5]
        let data = [4, 0x01, 1, 2, 0x81, 0x01, 0x2C, 0x00, 0x05];
        let mut c = ByteCursor::new(&data);
        assert_eq!(read_packed_points(&mut c).unwrap(), Some(vec![1, 3, 303, 308]));
        assert!(c.eof());
    }

    #[test]
    fn test_packed_points_word_count() {
        let data = [0x80, 0x02, 0x01, 0, 1];
        let mut c = ByteCursor::new(&data);
        assert_eq!(read_packed_points(&mut c).unwrap(), Some(vec![0, 1]));
    }

    #[test]
    fn test_packed_deltas() {
        // zero run of 3, byte run [-2, 5], word run [1000]
        let data = [0x82, 0x01, 0xFE, 0x05, 0x40, 0x03, 0xE8];
        let mut c = ByteCursor::new(&data);
        assert_eq!(
            read_packed_deltas(&mut c, 6).unwrap(),
            vec![0.0, 0.0, 0.0, -2.0, 5.0, 1000.0]
        );
    }

    fn variation(peak: &[f32], intermediate: Option<(&[f32], &[f32])>) -> GlyphVariation {
        GlyphVariation {
            peak: peak.to_vec(),
            intermediate: intermediate.map(|(s, e)| (s.to_vec(), e.to_vec())),
            points: None,
            x_deltas: Vec::new(),
            y_deltas: Vec::new(),
        }
    }

    #[test]
    fn test_scalar_peak_only() {
        let v = variation(&[1.0, 0.0], None);
        assert_eq!(v.scalar(&[0.5, 0.7]), 0.5);
        assert_eq!(v.scalar(&[1.0, -1.0]), 1.0);
        assert_eq!(v.scalar(&[-0.5, 0.0]), 0.0);
        assert_eq!(v.scalar(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_scalar_multiplies_axes() {
        let v = variation(&[1.0, -0.5], None);
        assert_eq!(v.scalar(&[0.5, -0.25]), 0.25);
        assert_eq!(v.scalar(&[0.5, -1.0]), 0.5);
    }

    #[test]
    fn test_scalar_intermediate_tent() {
        let v = variation(&[0.5], Some((&[0.25], &[1.0])));
        assert_eq!(v.scalar(&[0.5]), 1.0);
        assert_eq!(v.scalar(&[0.375]), 0.5);
        assert_eq!(v.scalar(&[0.75]), 0.5);
        assert_eq!(v.scalar(&[0.1]), 0.0);
    }
}
