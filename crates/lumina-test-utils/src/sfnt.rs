//! sfnt container assembly.

use crate::write::{PutBe, pad_to};

/// `sfntVersion` for TrueType outlines.
pub const TRUETYPE_VERSION: u32 = 0x0001_0000;
/// `sfntVersion` for CFF outlines (`OTTO`).
pub const OPENTYPE_VERSION: u32 = 0x4F54_544F;

/// Collects raw tables and writes them behind a table directory.
///
/// Tables are sorted by tag, 4-byte aligned and checksummed the way real
/// font files are.
#[derive(Debug, Clone)]
pub struct SfntBuilder {
    version: u32,
    tables: Vec<([u8; 4], Vec<u8>)>,
}

impl SfntBuilder {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            tables: Vec::new(),
        }
    }

    pub fn truetype() -> Self {
        Self::new(TRUETYPE_VERSION)
    }

    pub fn opentype() -> Self {
        Self::new(OPENTYPE_VERSION)
    }

    /// Add or replace a table.
    pub fn table(mut self, tag: &[u8; 4], data: Vec<u8>) -> Self {
        self.tables.retain(|(t, _)| t != tag);
        self.tables.push((*tag, data));
        self
    }

    /// Drop a table, e.g. to test a missing mandatory table.
    pub fn without(mut self, tag: &[u8; 4]) -> Self {
        self.tables.retain(|(t, _)| t != tag);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut tables = self.tables.clone();
        tables.sort_by(|a, b| a.0.cmp(&b.0));

        let num_tables = tables.len() as u16;
        let entry_selector = if num_tables == 0 {
            0
        } else {
            15 - num_tables.leading_zeros() as u16
        };
        let search_range = (1u16 << entry_selector) * 16;
        let range_shift = (num_tables * 16).saturating_sub(search_range);

        let mut out = Vec::new();
        out.put_u32(self.version);
        out.put_u16(num_tables);
        out.put_u16(search_range);
        out.put_u16(entry_selector);
        out.put_u16(range_shift);

        let mut offset = 12 + 16 * tables.len();
        let mut body = Vec::new();
        for (tag, data) in &tables {
            out.extend_from_slice(tag);
            out.put_u32(checksum(data));
            out.put_u32(offset as u32);
            out.put_u32(data.len() as u32);

            body.extend_from_slice(data);
            pad_to(&mut body, 4);
            offset = 12 + 16 * tables.len() + body.len();
        }
        out.extend_from_slice(&body);
        out
    }
}

/// Table checksum: the wrapping sum of big-endian u32 words, zero padded.
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}
