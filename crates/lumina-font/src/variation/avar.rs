//! `avar` axis value remapping.

use crate::cursor::ByteCursor;
use crate::error::{FontError, FontResult};
use crate::tables::Tag;

/// One `(from, to)` pair of a segment map, in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisValueMap {
    pub from_coordinate: f32,
    pub to_coordinate: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvarTable {
    segment_maps: Vec<Vec<AxisValueMap>>,
}

impl AvarTable {
    pub fn parse(data: &[u8]) -> FontResult<Self> {
        let mut c = ByteCursor::new(data);
        let major = c.read_u16()?;
        let _minor = c.read_u16()?;
        if major != 1 {
            return Err(FontError::malformed(
                Tag::AVAR,
                format!("unsupported version {}", major),
            ));
        }
        let _reserved = c.read_u16()?;
        let axis_count = c.read_u16()?;

        let mut segment_maps = Vec::with_capacity(axis_count as usize);
        for _ in 0..axis_count {
            let count = c.read_u16()?;
            let mut map = Vec::with_capacity(count as usize);
            for _ in 0..count {
                map.push(AxisValueMap {
                    from_coordinate: c.read_f2dot14()?,
                    to_coordinate: c.read_f2dot14()?,
                });
            }
            if map.windows(2).any(|w| w[1].from_coordinate < w[0].from_coordinate) {
                return Err(FontError::malformed(Tag::AVAR, "segment map is not sorted"));
            }
            segment_maps.push(map);
        }
        Ok(Self { segment_maps })
    }

    pub fn segment_map(&self, axis_index: usize) -> &[AxisValueMap] {
        self.segment_maps
            .get(axis_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Piecewise-linear remap of a normalized coordinate. Axes without a
    /// usable map pass through unchanged.
    pub fn map(&self, axis_index: usize, value: f32) -> f32 {
        let map = self.segment_map(axis_index);
        if map.len() < 2 {
            return value;
        }

        let upper = map.partition_point(|m| m.from_coordinate < value);
        match upper {
            0 => {
                let first = map[0];
                value - first.from_coordinate + first.to_coordinate
            }
            n if n == map.len() => {
                let last = map[n - 1];
                value - last.from_coordinate + last.to_coordinate
            }
            n => {
                let lo = map[n - 1];
                let hi = map[n];
                let span = hi.from_coordinate - lo.from_coordinate;
                if span == 0.0 {
                    return hi.to_coordinate;
                }
                let t = (value - lo.from_coordinate) / span;
                lo.to_coordinate + t * (hi.to_coordinate - lo.to_coordinate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f2dot14(v: f32) -> [u8; 2] {
        ((v * 16384.0) as i16).to_be_bytes()
    }

    fn avar(pairs: &[(f32, f32)]) -> Vec<u8> {
        let mut out = Vec::new();
        for v in [1u16, 0, 0, 1, pairs.len() as u16] {
            out.extend_from_slice(&v.to_be_bytes());
        }
        for &(from, to) in pairs {
            out.extend_from_slice(&f2dot14(from));
            out.extend_from_slice(&f2dot14(to));
        }
        out
    }

    #[test]
    fn test_piecewise_map() {
        let table = AvarTable::parse(&avar(&[(-1.0, -1.0), (0.0, 0.0), (0.5, 0.75), (1.0, 1.0)]))
            .unwrap();
        assert_eq!(table.map(0, 0.0), 0.0);
        assert_eq!(table.map(0, 0.5), 0.75);
        assert!((table.map(0, 0.25) - 0.375).abs() < 1e-4);
        assert!((table.map(0, 0.75) - 0.875).abs() < 1e-4);
        assert_eq!(table.map(0, 1.0), 1.0);
        assert_eq!(table.map(0, -0.5), -0.5);
    }

    #[test]
    fn test_missing_axis_is_identity() {
        let table = AvarTable::parse(&avar(&[])).unwrap();
        assert_eq!(table.map(0, 0.3), 0.3);
        assert_eq!(table.map(4, -0.3), -0.3);
    }

    #[test]
    fn test_unsorted_map_rejected() {
        assert!(AvarTable::parse(&avar(&[(0.5, 0.5), (0.0, 0.0)])).is_err());
    }
}
