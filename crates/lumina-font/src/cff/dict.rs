//! CFF DICT decoding: Top DICT, Private DICT, FDSelect.

use crate::cursor::ByteCursor;
use crate::error::{FontError, FontResult};
use crate::tables::Tag;

/// DICT operator. Two-byte operators are `12 << 8 | b1`.
pub type DictOp = u16;

pub mod ops {
    use super::DictOp;

    pub const CHARSTRINGS: DictOp = 17;
    pub const PRIVATE: DictOp = 18;
    pub const SUBRS: DictOp = 19;
    pub const DEFAULT_WIDTH_X: DictOp = 20;
    pub const NOMINAL_WIDTH_X: DictOp = 21;
    pub const CHARSTRING_TYPE: DictOp = 12 << 8 | 6;
    pub const ROS: DictOp = 12 << 8 | 30;
    pub const FD_ARRAY: DictOp = 12 << 8 | 36;
    pub const FD_SELECT: DictOp = 12 << 8 | 37;
}

/// Operator/operand pairs in DICT order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: Vec<(DictOp, Vec<f64>)>,
}

impl Dict {
    pub fn parse(data: &[u8]) -> FontResult<Self> {
        let mut c = ByteCursor::new(data);
        let mut entries = Vec::new();
        let mut operands = Vec::new();

        while !c.eof() {
            let b0 = c.read_u8()?;
            match b0 {
                0..=11 | 13..=21 => entries.push((b0 as DictOp, std::mem::take(&mut operands))),
                12 => {
                    let b1 = c.read_u8()?;
                    entries.push((12 << 8 | b1 as DictOp, std::mem::take(&mut operands)));
                }
                28 => operands.push(c.read_i16()? as f64),
                29 => operands.push(c.read_i32()? as f64),
                30 => operands.push(parse_real(&mut c)?),
                32..=246 => operands.push(b0 as f64 - 139.0),
                247..=250 => {
                    let b1 = c.read_u8()? as f64;
                    operands.push((b0 as f64 - 247.0) * 256.0 + b1 + 108.0);
                }
                251..=254 => {
                    let b1 = c.read_u8()? as f64;
                    operands.push(-(b0 as f64 - 251.0) * 256.0 - b1 - 108.0);
                }
                _ => {
                    return Err(FontError::malformed(
                        Tag::CFF,
                        format!("reserved DICT byte {}", b0),
                    ));
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, op: DictOp) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(o, _)| *o == op)
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains(&self, op: DictOp) -> bool {
        self.get(op).is_some()
    }

    /// First operand of `op` as a non-negative offset or size.
    pub fn offset(&self, op: DictOp) -> FontResult<Option<usize>> {
        match self.get(op) {
            None => Ok(None),
            Some([v, ..]) if *v >= 0.0 => Ok(Some(*v as usize)),
            Some(_) => Err(FontError::malformed(
                Tag::CFF,
                format!("DICT operator {} has a bad operand", op),
            )),
        }
    }

    /// `(size, offset)` pair of the Private operator.
    pub fn private_range(&self) -> FontResult<Option<(usize, usize)>> {
        match self.get(ops::PRIVATE) {
            None => Ok(None),
            Some([size, offset]) if *size >= 0.0 && *offset >= 0.0 => {
                Ok(Some((*size as usize, *offset as usize)))
            }
            Some(_) => Err(FontError::malformed(Tag::CFF, "Private operator needs size and offset")),
        }
    }
}

/// Packed BCD real number.
fn parse_real(c: &mut ByteCursor<'_>) -> FontResult<f64> {
    let mut text = String::new();
    'outer: loop {
        let byte = c.read_u8()?;
        for nibble in [byte >> 4, byte & 0x0F] {
            match nibble {
                0..=9 => text.push((b'0' + nibble) as char),
                0xA => text.push('.'),
                0xB => text.push('E'),
                0xC => text.push_str("E-"),
                0xE => text.push('-'),
                0xF => break 'outer,
                _ => {}
            }
        }
    }
    text.parse::<f64>()
        .map_err(|_| FontError::malformed(Tag::CFF, format!("bad real number '{}'", text)))
}

/// Values of the Private DICT the outline code needs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PrivateDict {
    /// Absolute offset of the local Subrs INDEX.
    pub subrs_offset: Option<usize>,
    pub default_width_x: f64,
    pub nominal_width_x: f64,
}

impl PrivateDict {
    /// Parse the Private DICT at `[offset, offset + size)` of `data`.
    pub fn parse(data: &[u8], size: usize, offset: usize) -> FontResult<Self> {
        let bytes = crate::cursor::slice(data, offset, size)?;
        let dict = Dict::parse(bytes)?;
        let first = |op| dict.get(op).and_then(|v| v.first().copied()).unwrap_or(0.0);
        Ok(Self {
            // Subrs is relative to the start of the Private DICT.
            subrs_offset: dict.offset(ops::SUBRS)?.map(|o| offset + o),
            default_width_x: first(ops::DEFAULT_WIDTH_X),
            nominal_width_x: first(ops::NOMINAL_WIDTH_X),
        })
    }
}

/// Maps glyphs to Font DICTs in CID-keyed fonts.
#[derive(Debug, Clone, PartialEq)]
pub enum FdSelect {
    Format0(Vec<u8>),
    Format3 {
        ranges: Vec<(u16, u8)>,
        sentinel: u16,
    },
}

impl FdSelect {
    pub fn parse(data: &[u8], offset: usize, glyph_count: usize) -> FontResult<Self> {
        let mut c = ByteCursor::at(data, offset)?;
        match c.read_u8()? {
            0 => Ok(FdSelect::Format0(c.read_bytes(glyph_count)?.to_vec())),
            3 => {
                let n_ranges = c.read_u16()?;
                let mut ranges = Vec::with_capacity(n_ranges as usize);
                for _ in 0..n_ranges {
                    let first = c.read_u16()?;
                    let fd = c.read_u8()?;
                    if ranges.last().is_some_and(|&(prev, _): &(u16, u8)| first < prev) {
                        return Err(FontError::malformed(Tag::CFF, "FDSelect ranges out of order"));
                    }
                    ranges.push((first, fd));
                }
                let sentinel = c.read_u16()?;
                Ok(FdSelect::Format3 { ranges, sentinel })
            }
            format => Err(FontError::malformed(
                Tag::CFF,
                format!("unsupported FDSelect format {}", format),
            )),
        }
    }

    /// Font DICT index for a glyph.
    pub fn font_dict(&self, glyph_id: u16) -> Option<usize> {
        match self {
            FdSelect::Format0(fds) => fds.get(glyph_id as usize).map(|&fd| fd as usize),
            FdSelect::Format3 { ranges, sentinel } => {
                if glyph_id >= *sentinel {
                    return None;
                }
                let idx = ranges.partition_point(|&(first, _)| first <= glyph_id);
                idx.checked_sub(1).map(|i| ranges[i].1 as usize)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_encodings() {
        // 100 (1 byte), 500 (2 bytes), -500, 1000 (28), 100000 (29), op 17
        let mut data = vec![139 + 100];
        data.extend_from_slice(&[247 + 1, 500u16.wrapping_sub(108 + 256) as u8]);
        data.extend_from_slice(&[251 + 1, 500u16.wrapping_sub(108 + 256) as u8]);
        data.push(28);
        data.extend_from_slice(&1000i16.to_be_bytes());
        data.push(29);
        data.extend_from_slice(&100_000i32.to_be_bytes());
        data.push(17);

        let dict = Dict::parse(&data).unwrap();
        assert_eq!(
            dict.get(ops::CHARSTRINGS).unwrap(),
            &[100.0, 500.0, -500.0, 1000.0, 100_000.0]
        );
    }

    #[test]
    fn test_real_operand() {
        // -2.25 => e2 a2 5f, then escape op ROS
        let data = [30, 0xe2, 0xa2, 0x5f, 12, 30];
        let dict = Dict::parse(&data).unwrap();
        assert_eq!(dict.get(ops::ROS).unwrap(), &[-2.25]);
    }

    #[test]
    fn test_private_range_and_subrs() {
        // Private DICT placed at offset 4: Subrs 10 relative
        let mut data = vec![0u8; 4];
        data.extend_from_slice(&[139 + 10, 19, 139 + 50, 21]);
        let private = PrivateDict::parse(&data, 4, 4).unwrap();
        assert_eq!(private.subrs_offset, Some(14));
        assert_eq!(private.nominal_width_x, 50.0);
        assert_eq!(private.default_width_x, 0.0);
    }

    #[test]
    fn test_fd_select_format3() {
        let mut data = vec![3u8];
        data.extend_from_slice(&2u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.push(0);
        data.extend_from_slice(&5u16.to_be_bytes());
        data.push(1);
        data.extend_from_slice(&8u16.to_be_bytes());

        let fd = FdSelect::parse(&data, 0, 8).unwrap();
        assert_eq!(fd.font_dict(0), Some(0));
        assert_eq!(fd.font_dict(4), Some(0));
        assert_eq!(fd.font_dict(5), Some(1));
        assert_eq!(fd.font_dict(8), None);
    }

    #[test]
    fn test_fd_select_format0() {
        let data = [0u8, 0, 1, 1];
        let fd = FdSelect::parse(&data, 0, 3).unwrap();
        assert_eq!(fd.font_dict(2), Some(1));
    }
}
