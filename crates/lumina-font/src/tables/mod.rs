//! sfnt container parsing.
//!
//! [`SfntTables`] owns the font bytes and the tables shared by both outline
//! formats: the table directory, `head`, `hhea`, `hmtx`, `maxp`, `cmap` and
//! `name`. The outline-specific parsers (`glyf`/`loca` and `CFF `) build on top of it.

pub mod cmap;
pub mod metrics;
pub mod name;

use std::ops::Range;

use lumina_core::profiling::profile_function;

use crate::cursor::ByteCursor;
use crate::error::{FontError, FontResult};

pub use cmap::CmapTable;
pub use metrics::{GlyphMetrics, HeadTable, HheaTable, HmtxTable, MaxpTable};
pub use name::{NameId, NameTable};

/// A 4-byte table or axis tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const HEAD: Self = Self(*b"head");
    pub const HHEA: Self = Self(*b"hhea");
    pub const HMTX: Self = Self(*b"hmtx");
    pub const MAXP: Self = Self(*b"maxp");
    pub const LOCA: Self = Self(*b"loca");
    pub const GLYF: Self = Self(*b"glyf");
    pub const CMAP: Self = Self(*b"cmap");
    pub const NAME: Self = Self(*b"name");
    pub const CFF: Self = Self(*b"CFF ");
    pub const FVAR: Self = Self(*b"fvar");
    pub const AVAR: Self = Self(*b"avar");
    pub const GVAR: Self = Self(*b"gvar");

    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    /// Build a tag from a string, padding short tags with spaces as the format does.
    pub fn from_str_padded(s: &str) -> Self {
        let mut bytes = [b' '; 4];
        for (dst, src) in bytes.iter_mut().zip(s.bytes()) {
            *dst = src;
        }
        Self(bytes)
    }
}

impl std::fmt::Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag('{}')", self)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = std::str::from_utf8(&self.0).unwrap_or("????");
        write!(f, "{}", s)
    }
}

/// A single entry in the sfnt table directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

impl TableRecord {
    fn range(&self, file_len: usize) -> FontResult<Range<usize>> {
        let start = self.offset as usize;
        start
            .checked_add(self.length as usize)
            .filter(|&end| end <= file_len)
            .map(|end| start..end)
            .ok_or(FontError::TableOutOfBounds {
                tag: self.tag,
                offset: self.offset,
                length: self.length,
                file_len,
            })
    }
}

/// Detected font file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    /// TrueType outlines (`0x00010000` or `true`)
    TrueType,
    /// CFF outlines (`OTTO`)
    OpenType,
    /// Web Open Font Format
    Woff,
    /// Web Open Font Format 2
    Woff2,
    /// TrueType/OpenType collection
    Collection,
    Unknown,
}

impl FontFormat {
    /// Detect font format from the magic bytes.
    pub fn detect(data: &[u8]) -> Self {
        if data.len() < 4 {
            return FontFormat::Unknown;
        }

        match &data[0..4] {
            [0x00, 0x01, 0x00, 0x00] | [b't', b'r', b'u', b'e'] => FontFormat::TrueType,
            [b'O', b'T', b'T', b'O'] => FontFormat::OpenType,
            [b'w', b'O', b'F', b'F'] => FontFormat::Woff,
            [b'w', b'O', b'F', b'2'] => FontFormat::Woff2,
            [b't', b't', b'c', b'f'] => FontFormat::Collection,
            _ => FontFormat::Unknown,
        }
    }

    /// Reject containers that have to be unwrapped before they can be parsed.
    pub(crate) fn ensure_sfnt(data: &[u8]) -> FontResult<Self> {
        match Self::detect(data) {
            format @ (FontFormat::TrueType | FontFormat::OpenType) => Ok(format),
            FontFormat::Woff => Err(FontError::UnsupportedFormat("WOFF")),
            FontFormat::Woff2 => Err(FontError::UnsupportedFormat("WOFF2")),
            FontFormat::Collection => Err(FontError::UnsupportedFormat("font collection")),
            FontFormat::Unknown => {
                let magic = data
                    .get(0..4)
                    .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
                    .unwrap_or(0);
                Err(FontError::InvalidMagic(magic))
            }
        }
    }
}

/// Source of raw sfnt table bytes.
///
/// Implemented by the outline parsers so that table consumers such as the
/// variation engine do not need to know which outline format backs a font.
pub trait TableProvider {
    fn table_data(&self, tag: Tag) -> Option<&[u8]>;
}

/// Shared sfnt tables, owning the font bytes.
pub struct SfntTables {
    data: Vec<u8>,
    format: FontFormat,
    directory: Vec<TableRecord>,
    pub head: HeadTable,
    pub hhea: HheaTable,
    pub maxp: MaxpTable,
    pub hmtx: HmtxTable,
    pub cmap: CmapTable,
    pub names: NameTable,
}

impl SfntTables {
    /// Parse the table directory and the metadata tables.
    ///
    /// `head` and `maxp` are mandatory; `hhea`/`hmtx`, `cmap` and `name` degrade to
    /// empty defaults when absent or malformed.
    pub fn parse(data: Vec<u8>) -> FontResult<Self> {
        profile_function!();

        let format = FontFormat::ensure_sfnt(&data)?;
        let directory = parse_directory(&data)?;

        let head = {
            let bytes = required(&data, &directory, Tag::HEAD)?;
            HeadTable::parse(bytes)?
        };
        let maxp = {
            let bytes = required(&data, &directory, Tag::MAXP)?;
            MaxpTable::parse(bytes)?
        };

        let hhea = optional(&data, &directory, Tag::HHEA, HheaTable::parse).unwrap_or_default();
        let hmtx = optional(&data, &directory, Tag::HMTX, |bytes| {
            HmtxTable::parse(bytes, hhea.number_of_h_metrics, maxp.num_glyphs)
        })
        .unwrap_or_default();
        let cmap = optional(&data, &directory, Tag::CMAP, CmapTable::parse).unwrap_or_default();
        let names = optional(&data, &directory, Tag::NAME, NameTable::parse).unwrap_or_default();

        tracing::debug!(
            "Parsed sfnt directory: {} tables, {} glyphs, {} units/em",
            directory.len(),
            maxp.num_glyphs,
            head.units_per_em
        );

        Ok(Self {
            data,
            format,
            directory,
            head,
            hhea,
            maxp,
            hmtx,
            cmap,
            names,
        })
    }

    pub fn format(&self) -> FontFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn directory(&self) -> &[TableRecord] {
        &self.directory
    }

    pub fn record(&self, tag: Tag) -> Option<&TableRecord> {
        self.directory.iter().find(|r| r.tag == tag)
    }

    /// Bytes of a mandatory table.
    pub fn require(&self, tag: Tag) -> FontResult<&[u8]> {
        required(&self.data, &self.directory, tag)
    }

    /// Byte range of a mandatory table within [`Self::data`].
    pub fn require_range(&self, tag: Tag) -> FontResult<Range<usize>> {
        self.record(tag)
            .ok_or(FontError::MissingTable(tag))?
            .range(self.data.len())
    }

    pub fn glyph_count(&self) -> u16 {
        self.maxp.num_glyphs
    }

    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    pub fn glyph_id(&self, codepoint: u32) -> u16 {
        self.cmap.glyph_id(codepoint)
    }

    pub fn glyph_metrics(&self, glyph_id: u16) -> GlyphMetrics {
        self.hmtx.metrics(glyph_id)
    }

    pub fn check_glyph(&self, glyph_id: u16) -> FontResult<()> {
        if glyph_id >= self.maxp.num_glyphs {
            return Err(FontError::GlyphOutOfRange {
                glyph_id,
                glyph_count: self.maxp.num_glyphs,
            });
        }
        Ok(())
    }
}

impl TableProvider for SfntTables {
    fn table_data(&self, tag: Tag) -> Option<&[u8]> {
        let record = self.record(tag)?;
        let range = record.range(self.data.len()).ok()?;
        self.data.get(range)
    }
}

fn parse_directory(data: &[u8]) -> FontResult<Vec<TableRecord>> {
    let mut c = ByteCursor::new(data);
    let _sfnt_version = c.read_u32()?;
    let num_tables = c.read_u16()?;
    c.skip(6)?; // searchRange, entrySelector, rangeShift

    let mut directory = Vec::with_capacity(num_tables as usize);
    for _ in 0..num_tables {
        directory.push(TableRecord {
            tag: c.read_tag()?,
            checksum: c.read_u32()?,
            offset: c.read_u32()?,
            length: c.read_u32()?,
        });
    }
    Ok(directory)
}

fn required<'a>(data: &'a [u8], directory: &[TableRecord], tag: Tag) -> FontResult<&'a [u8]> {
    let record = directory
        .iter()
        .find(|r| r.tag == tag)
        .ok_or(FontError::MissingTable(tag))?;
    let range = record.range(data.len())?;
    Ok(&data[range])
}

fn optional<T>(
    data: &[u8],
    directory: &[TableRecord],
    tag: Tag,
    parse: impl FnOnce(&[u8]) -> FontResult<T>,
) -> Option<T> {
    if !directory.iter().any(|r| r.tag == tag) {
        return None;
    }
    match required(data, directory, tag).and_then(parse) {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::warn!("Ignoring optional '{}' table: {}", tag, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_display() {
        assert_eq!(Tag::CFF.to_string(), "CFF ");
        assert_eq!(Tag::from_str_padded("wg"), Tag(*b"wg  "));
        assert_eq!(format!("{:?}", Tag::HEAD), "Tag('head')");
    }

    #[test]
    fn test_format_detect() {
        assert_eq!(FontFormat::detect(&[0, 1, 0, 0]), FontFormat::TrueType);
        assert_eq!(FontFormat::detect(b"OTTO"), FontFormat::OpenType);
        assert_eq!(FontFormat::detect(b"wOF2"), FontFormat::Woff2);
        assert_eq!(FontFormat::detect(b"ttcf"), FontFormat::Collection);
        assert_eq!(FontFormat::detect(&[1, 2]), FontFormat::Unknown);
    }

    #[test]
    fn test_unsupported_containers_rejected() {
        assert_eq!(
            FontFormat::ensure_sfnt(b"wOFF\0\0\0\0"),
            Err(FontError::UnsupportedFormat("WOFF"))
        );
        assert_eq!(
            FontFormat::ensure_sfnt(&[0xde, 0xad, 0xbe, 0xef]),
            Err(FontError::InvalidMagic(0xdeadbeef))
        );
    }

    #[test]
    fn test_record_out_of_bounds() {
        let record = TableRecord {
            tag: Tag::GLYF,
            checksum: 0,
            offset: 10,
            length: 20,
        };
        assert!(record.range(30).is_ok());
        assert!(matches!(
            record.range(29),
            Err(FontError::TableOutOfBounds { tag: Tag::GLYF, .. })
        ));
    }
}
