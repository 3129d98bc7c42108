//! CFF INDEX structures.

use std::ops::Range;

use crate::cursor::ByteCursor;
use crate::error::{FontError, FontResult};

/// A parsed INDEX: the byte range of every item within the CFF buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    items: Vec<Range<usize>>,
    end: usize,
}

impl Index {
    /// Parse the INDEX that starts at `offset` in `data`.
    pub fn parse(data: &[u8], offset: usize) -> FontResult<Self> {
        let mut c = ByteCursor::at(data, offset)?;
        let count = c.read_u16()? as usize;
        if count == 0 {
            return Ok(Self {
                items: Vec::new(),
                end: c.tell(),
            });
        }

        let off_size = c.read_u8()?;
        if !(1..=4).contains(&off_size) {
            return Err(FontError::InvalidIndex(format!(
                "offSize {} at offset {} is not in 1..=4",
                off_size, offset
            )));
        }

        let mut offsets = Vec::with_capacity(count + 1);
        for _ in 0..=count {
            offsets.push(c.read_offset(off_size)? as usize);
        }
        if offsets[0] != 1 {
            return Err(FontError::InvalidIndex(format!(
                "first offset is {}, expected 1",
                offsets[0]
            )));
        }
        if offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err(FontError::InvalidIndex(format!(
                "offsets decrease in INDEX at offset {}",
                offset
            )));
        }

        // Offsets are 1-based from the byte before the data blob.
        let base = c.tell() - 1;
        let end = base + offsets[count];
        if end > data.len() {
            return Err(FontError::InvalidIndex(format!(
                "INDEX data ends at {} but the table is {} bytes",
                end,
                data.len()
            )));
        }

        let items = offsets
            .windows(2)
            .map(|w| base + w[0]..base + w[1])
            .collect();
        Ok(Self { items, end })
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Offset of the first byte after this INDEX.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Bytes of item `i`.
    pub fn get<'a>(&self, data: &'a [u8], i: usize) -> FontResult<&'a [u8]> {
        let range = self.items.get(i).ok_or_else(|| {
            FontError::InvalidIndex(format!("item {} out of range (count {})", i, self.count()))
        })?;
        data.get(range.clone())
            .ok_or_else(|| FontError::InvalidIndex(format!("item {} lies outside the table", i)))
    }

    /// Bias added to subroutine numbers for an INDEX of subroutines.
    pub fn subr_bias(&self) -> i32 {
        match self.count() {
            n if n < 1240 => 107,
            n if n < 33900 => 1131,
            _ => 32768,
        }
    }
}
