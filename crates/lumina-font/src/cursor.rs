//! Big-endian reader over an immutable byte buffer.
//!
//! Every sfnt and CFF structure is big-endian. Reads that would run past the end
//! of the buffer fail with [`FontError::UnexpectedEof`] and leave the position
//! untouched, so a caller can abandon a table without corrupting what it has
//! already parsed.

use crate::error::{FontError, FontResult};
use crate::tables::Tag;

/// Cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a cursor positioned at `offset`.
    pub fn at(data: &'a [u8], offset: usize) -> FontResult<Self> {
        let mut cursor = Self::new(data);
        cursor.seek(offset)?;
        Ok(cursor)
    }

    /// Current position.
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Move to an absolute position. Seeking exactly to the end is allowed.
    pub fn seek(&mut self, pos: usize) -> FontResult<()> {
        if pos > self.data.len() {
            return Err(self.eof_error(pos.saturating_sub(self.pos)));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> FontResult<()> {
        self.take(n).map(|_| ())
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// The whole underlying buffer.
    pub fn buffer(&self) -> &'a [u8] {
        self.data
    }

    pub fn read_u8(&mut self) -> FontResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> FontResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> FontResult<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub fn read_i16(&mut self) -> FontResult<i16> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    pub fn read_u24(&mut self) -> FontResult<u32> {
        let [a, b, c] = self.array()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    pub fn read_u32(&mut self) -> FontResult<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub fn read_i32(&mut self) -> FontResult<i32> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    /// 16.16 signed fixed-point.
    pub fn read_fixed(&mut self) -> FontResult<f32> {
        Ok(fixed_to_f32(self.read_i32()?))
    }

    /// 2.14 signed fixed-point.
    pub fn read_f2dot14(&mut self) -> FontResult<f32> {
        Ok(f2dot14_to_f32(self.read_i16()?))
    }

    pub fn read_tag(&mut self) -> FontResult<Tag> {
        Ok(Tag(self.array()?))
    }

    /// Unsigned offset of `size` bytes (1..=4), as used by CFF INDEX and FDSelect.
    pub fn read_offset(&mut self, size: u8) -> FontResult<u32> {
        let bytes = self.take(size as usize)?;
        Ok(bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
    }

    pub fn read_bytes(&mut self, n: usize) -> FontResult<&'a [u8]> {
        self.take(n)
    }

    fn array<const N: usize>(&mut self) -> FontResult<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn take(&mut self, n: usize) -> FontResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.eof_error(n))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn eof_error(&self, requested: usize) -> FontError {
        FontError::UnexpectedEof {
            offset: self.pos,
            requested,
            len: self.data.len(),
        }
    }
}

pub fn fixed_to_f32(raw: i32) -> f32 {
    raw as f32 / 65536.0
}

pub fn f2dot14_to_f32(raw: i16) -> f32 {
    raw as f32 / 16384.0
}

/// Bounds-checked sub-slice, reported as an EOF error on failure.
pub(crate) fn slice(data: &[u8], offset: usize, len: usize) -> FontResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(FontError::UnexpectedEof {
            offset,
            requested: len,
            len: data.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian() {
        let data = [0x12, 0x34, 0xFF, 0xFE, 0x00, 0x01, 0x00, 0x00];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u16().unwrap(), 0x1234);
        assert_eq!(c.read_i16().unwrap(), -2);
        assert_eq!(c.read_fixed().unwrap(), 1.0);
        assert!(c.eof());
    }

    #[test]
    fn test_read_past_end_fails_without_moving() {
        let data = [0x00, 0x01, 0x02];
        let mut c = ByteCursor::new(&data);
        c.skip(2).unwrap();
        let err = c.read_u16().unwrap_err();
        assert!(matches!(err, FontError::UnexpectedEof { offset: 2, requested: 2, len: 3 }));
        assert_eq!(c.tell(), 2);
        assert_eq!(c.read_u8().unwrap(), 0x02);
    }

    #[test]
    fn test_seek_bounds() {
        let data = [0u8; 4];
        let mut c = ByteCursor::new(&data);
        assert!(c.seek(4).is_ok());
        assert!(c.eof());
        assert!(c.seek(5).is_err());
        assert_eq!(c.tell(), 4);
    }

    #[test]
    fn test_variable_width_offsets() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_offset(1).unwrap(), 0x01);
        assert_eq!(c.read_offset(3).unwrap(), 0x020304);
        assert_eq!(c.read_offset(2).unwrap(), 0x0506);
    }

    #[test]
    fn test_f2dot14() {
        assert_eq!(f2dot14_to_f32(0x4000), 1.0);
        assert_eq!(f2dot14_to_f32(-0x4000), -1.0);
        assert_eq!(f2dot14_to_f32(0x2000), 0.5);
    }

    #[test]
    fn test_slice_bounds() {
        let data = [1u8, 2, 3];
        assert_eq!(slice(&data, 1, 2).unwrap(), &[2, 3]);
        assert!(slice(&data, 2, 2).is_err());
        assert!(slice(&data, usize::MAX, 2).is_err());
    }
}
