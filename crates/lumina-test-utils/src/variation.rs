//! `fvar`, `avar` and `gvar` builders.

use crate::write::PutBe;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub tag: [u8; 4],
    pub min: f32,
    pub default: f32,
    pub max: f32,
    pub name_id: u16,
}

impl Axis {
    pub fn new(tag: &[u8; 4], min: f32, default: f32, max: f32) -> Self {
        Self {
            tag: *tag,
            min,
            default,
            max,
            name_id: 256,
        }
    }

    /// `wght` 100..400..900.
    pub fn weight() -> Self {
        Self::new(b"wght", 100.0, 400.0, 900.0)
    }

    /// `wdth` 75..100..125.
    pub fn width() -> Self {
        Self::new(b"wdth", 75.0, 100.0, 125.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub subfamily_name_id: u16,
    pub coordinates: Vec<f32>,
}

impl Instance {
    pub fn new(subfamily_name_id: u16, coordinates: Vec<f32>) -> Self {
        Self {
            subfamily_name_id,
            coordinates,
        }
    }
}

pub fn fvar_table(axes: &[Axis], instances: &[Instance]) -> Vec<u8> {
    let axis_count = axes.len() as u16;
    // subfamilyNameID, flags, coordinates, postScriptNameID
    let instance_size = 4 + 4 * axis_count + 2;

    let mut out = Vec::new();
    out.put_u16(1);
    out.put_u16(0);
    out.put_u16(16); // axesArrayOffset
    out.put_u16(2);
    out.put_u16(axis_count);
    out.put_u16(20);
    out.put_u16(instances.len() as u16);
    out.put_u16(instance_size);

    for axis in axes {
        out.extend_from_slice(&axis.tag);
        out.put_fixed(axis.min);
        out.put_fixed(axis.default);
        out.put_fixed(axis.max);
        out.put_u16(0);
        out.put_u16(axis.name_id);
    }
    for (i, instance) in instances.iter().enumerate() {
        out.put_u16(instance.subfamily_name_id);
        out.put_u16(0);
        for k in 0..axes.len() {
            out.put_fixed(instance.coordinates.get(k).copied().unwrap_or(axes[k].default));
        }
        out.put_u16(300 + i as u16);
    }
    out
}

/// One segment map per axis, as `(from, to)` normalized pairs.
pub fn avar_table(maps: &[Vec<(f32, f32)>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.put_u16(1);
    out.put_u16(0);
    out.put_u16(0);
    out.put_u16(maps.len() as u16);
    for map in maps {
        out.put_u16(map.len() as u16);
        for &(from, to) in map {
            out.put_f2dot14(from);
            out.put_f2dot14(to);
        }
    }
    out
}

/// The identity map every well-formed `avar` segment map starts from.
pub fn identity_map() -> Vec<(f32, f32)> {
    vec![(-1.0, -1.0), (0.0, 0.0), (1.0, 1.0)]
}

/// One tuple variation of a glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub peak: Vec<f32>,
    pub intermediate: Option<(Vec<f32>, Vec<f32>)>,
    /// Point numbers the deltas apply to; `None` means every point,
    /// phantom points included.
    pub points: Option<Vec<u16>>,
    pub deltas: Vec<(i16, i16)>,
}

impl Tuple {
    pub fn new(peak: Vec<f32>, deltas: Vec<(i16, i16)>) -> Self {
        Self {
            peak,
            intermediate: None,
            points: None,
            deltas,
        }
    }

    pub fn with_points(mut self, points: Vec<u16>) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_intermediate(mut self, start: Vec<f32>, end: Vec<f32>) -> Self {
        self.intermediate = Some((start, end));
        self
    }
}

const EMBEDDED_PEAK_TUPLE: u16 = 0x8000;
const INTERMEDIATE_REGION: u16 = 0x4000;
const PRIVATE_POINT_NUMBERS: u16 = 0x2000;

/// `gvar` with long offsets and embedded peak tuples.
///
/// `variations` lists `(glyph_id, tuples)`; glyphs not listed have no data.
pub fn gvar_table(axis_count: u16, glyph_count: u16, variations: &[(u16, Vec<Tuple>)]) -> Vec<u8> {
    let mut array = Vec::new();
    let mut offsets = Vec::with_capacity(glyph_count as usize + 1);
    for glyph_id in 0..glyph_count {
        offsets.push(array.len() as u32);
        if let Some((_, tuples)) = variations.iter().find(|(id, _)| *id == glyph_id)
            && !tuples.is_empty()
        {
            array.extend_from_slice(&glyph_variation_data(tuples));
        }
    }
    offsets.push(array.len() as u32);

    let header_size = 20 + 4 * offsets.len() as u32;
    let mut out = Vec::new();
    out.put_u16(1);
    out.put_u16(0);
    out.put_u16(axis_count);
    out.put_u16(0); // sharedTupleCount
    out.put_u32(header_size); // sharedTuplesOffset
    out.put_u16(glyph_count);
    out.put_u16(1); // long offsets
    out.put_u32(header_size);
    for offset in offsets {
        out.put_u32(offset);
    }
    out.extend_from_slice(&array);
    out
}

fn glyph_variation_data(tuples: &[Tuple]) -> Vec<u8> {
    let mut headers = Vec::new();
    let mut serialized = Vec::new();
    for tuple in tuples {
        let mut data = Vec::new();
        let mut index = EMBEDDED_PEAK_TUPLE;
        if let Some(points) = &tuple.points {
            index |= PRIVATE_POINT_NUMBERS;
            data.extend_from_slice(&packed_points(points));
        }
        let xs: Vec<i16> = tuple.deltas.iter().map(|d| d.0).collect();
        let ys: Vec<i16> = tuple.deltas.iter().map(|d| d.1).collect();
        data.extend_from_slice(&packed_deltas(&xs));
        data.extend_from_slice(&packed_deltas(&ys));

        if tuple.intermediate.is_some() {
            index |= INTERMEDIATE_REGION;
        }
        headers.put_u16(data.len() as u16);
        headers.put_u16(index);
        for &v in &tuple.peak {
            headers.put_f2dot14(v);
        }
        if let Some((start, end)) = &tuple.intermediate {
            for &v in start.iter().chain(end) {
                headers.put_f2dot14(v);
            }
        }
        serialized.extend_from_slice(&data);
    }

    let mut out = Vec::new();
    out.put_u16(tuples.len() as u16);
    out.put_u16(4 + headers.len() as u16);
    out.extend_from_slice(&headers);
    out.extend_from_slice(&serialized);
    out
}

/// Packed point numbers, always as word runs of up to 128 deltas.
pub fn packed_points(points: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    let count = points.len();
    if count < 0x80 {
        out.put_u8(count as u8);
    } else {
        out.put_u16(0x8000 | count as u16);
    }
    let mut prev = 0u16;
    for run in points.chunks(128) {
        out.put_u8(0x80 | (run.len() as u8 - 1));
        for &p in run {
            out.put_u16(p.wrapping_sub(prev));
            prev = p;
        }
    }
    out
}

/// Packed deltas, always as word runs of up to 64 values.
pub fn packed_deltas(deltas: &[i16]) -> Vec<u8> {
    let mut out = Vec::new();
    for run in deltas.chunks(64) {
        out.put_u8(0x40 | (run.len() as u8 - 1));
        for &d in run {
            out.put_i16(d);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_points_deltas_are_relative() {
        assert_eq!(packed_points(&[1, 4]), vec![2, 0x81, 0, 1, 0, 3]);
        assert_eq!(packed_points(&[]), vec![0]);
    }

    #[test]
    fn test_packed_deltas_runs() {
        let bytes = packed_deltas(&[-1; 65]);
        assert_eq!(bytes[0], 0x40 | 63);
        assert_eq!(bytes[1 + 128], 0x40);
        assert_eq!(bytes.len(), 2 + 65 * 2);
    }

    #[test]
    fn test_gvar_offsets_cover_glyphs() {
        let table = gvar_table(1, 3, &[(1, vec![Tuple::new(vec![1.0], vec![(10, 0); 8])])]);
        let offset = |i: usize| {
            let at = 20 + 4 * i;
            u32::from_be_bytes([table[at], table[at + 1], table[at + 2], table[at + 3]])
        };
        assert_eq!(offset(0), 0);
        assert_eq!(offset(1), 0);
        assert!(offset(2) > 0);
        assert_eq!(offset(3), offset(2));
    }
}
