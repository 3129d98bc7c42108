use crate::tables::Tag;

/// Errors that can occur while loading fonts or producing glyph imagery.
#[derive(Debug, Clone, PartialEq)]
pub enum FontError {
    /// A read ran past the end of a buffer.
    UnexpectedEof {
        offset: usize,
        requested: usize,
        len: usize,
    },

    /// The sfnt version / magic bytes are not a font this crate understands.
    InvalidMagic(u32),

    /// The container is recognised but not supported (WOFF, collections, ...).
    UnsupportedFormat(&'static str),

    /// A mandatory table is absent.
    MissingTable(Tag),

    /// A table directory entry points outside the file.
    TableOutOfBounds {
        tag: Tag,
        offset: u32,
        length: u32,
        file_len: usize,
    },

    /// A table is present but its contents are inconsistent.
    MalformedTable { table: Tag, reason: String },

    /// Glyph id outside `[0, glyph_count)`.
    GlyphOutOfRange { glyph_id: u16, glyph_count: u16 },

    /// A composite glyph references itself, directly or indirectly.
    CyclicComposite { glyph_id: u16 },

    /// Composite nesting exceeded the supported depth.
    ComponentDepthExceeded { glyph_id: u16 },

    /// A CFF INDEX structure is malformed or an item index is out of range.
    InvalidIndex(String),

    /// A Type2 charstring could not be evaluated.
    InvalidCharstring(String),

    /// A charstring used an operator that is recognised but not supported.
    UnsupportedCharstringOperator(u16),

    /// The Type2 operand stack exceeded its limit.
    StackOverflow,

    /// An operator needed more operands than were on the stack.
    StackUnderflow,

    /// Subroutine calls nested too deeply.
    SubroutineDepthExceeded,

    /// No variation axis with this tag.
    UnknownAxis(Tag),

    /// Named instance index out of range.
    InvalidInstance(usize),

    /// The text shaper failed.
    ShapingFailed(String),

    /// The glyph atlas could not place a bitmap.
    AtlasFull { width: u32, height: u32 },

    /// No font is registered under this id.
    FontNotFound(u32),

    /// Generic IO error.
    Io(String),
}

impl FontError {
    pub(crate) fn malformed(table: Tag, reason: impl Into<String>) -> Self {
        FontError::MalformedTable {
            table,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FontError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontError::UnexpectedEof {
                offset,
                requested,
                len,
            } => write!(
                f,
                "Unexpected end of data: read of {} bytes at offset {} (buffer length {})",
                requested, offset, len
            ),
            FontError::InvalidMagic(magic) => write!(f, "Invalid sfnt version: {:#010x}", magic),
            FontError::UnsupportedFormat(format) => {
                write!(f, "Unsupported font container: {}", format)
            }
            FontError::MissingTable(tag) => write!(f, "Missing mandatory table '{}'", tag),
            FontError::TableOutOfBounds {
                tag,
                offset,
                length,
                file_len,
            } => write!(
                f,
                "Table '{}' ({} bytes at {}) lies outside the {}-byte file",
                tag, length, offset, file_len
            ),
            FontError::MalformedTable { table, reason } => {
                write!(f, "Malformed '{}' table: {}", table, reason)
            }
            FontError::GlyphOutOfRange {
                glyph_id,
                glyph_count,
            } => write!(
                f,
                "Glyph id {} out of range (font has {} glyphs)",
                glyph_id, glyph_count
            ),
            FontError::CyclicComposite { glyph_id } => {
                write!(f, "Composite glyph {} references itself", glyph_id)
            }
            FontError::ComponentDepthExceeded { glyph_id } => {
                write!(f, "Composite glyph {} nests too deeply", glyph_id)
            }
            FontError::InvalidIndex(msg) => write!(f, "Invalid CFF INDEX: {}", msg),
            FontError::InvalidCharstring(msg) => write!(f, "Invalid charstring: {}", msg),
            FontError::UnsupportedCharstringOperator(op) => {
                write!(f, "Unsupported charstring operator {}", op)
            }
            FontError::StackOverflow => write!(f, "Charstring operand stack overflow"),
            FontError::StackUnderflow => write!(f, "Charstring operand stack underflow"),
            FontError::SubroutineDepthExceeded => write!(f, "Subroutine nesting limit exceeded"),
            FontError::UnknownAxis(tag) => write!(f, "Unknown variation axis '{}'", tag),
            FontError::InvalidInstance(index) => write!(f, "No named instance {}", index),
            FontError::ShapingFailed(msg) => write!(f, "Text shaping failed: {}", msg),
            FontError::AtlasFull { width, height } => {
                write!(f, "Glyph atlas is full: cannot place {}x{} bitmap", width, height)
            }
            FontError::FontNotFound(id) => write!(f, "Font {} is not loaded", id),
            FontError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for FontError {}

impl From<std::io::Error> for FontError {
    fn from(err: std::io::Error) -> Self {
        FontError::Io(err.to_string())
    }
}

/// Result type for font operations.
pub type FontResult<T> = Result<T, FontError>;
