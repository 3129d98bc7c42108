//! Lumina Font - glyph outlines and distance fields from raw font bytes
//!
//! This crate turns TrueType/OpenType files into scalable glyph imagery:
//! - sfnt table parsing with `glyf`/`loca` and `CFF ` (Type2) outlines
//! - Variable fonts: `fvar` axes, `avar` remapping and `gvar` interpolation
//! - SDF, MSDF and MTSDF generation from vector outlines
//! - An LRU cache of shaped and positioned text runs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumina_font::{FontSystem, FontSystemConfig, HeadlessAtlas};
//!
//! let mut fonts = FontSystem::new(FontSystemConfig::default());
//! let id = fonts.load_font_file("assets/Inter.ttf")?;
//!
//! let mut atlas = HeadlessAtlas::default();
//! let run = fonts.text_run(id, 24.0, "Hello, World!", &mut atlas)?;
//! println!("{} glyphs, {:.1}px wide", run.glyphs.len(), run.width);
//! # Ok::<(), lumina_font::FontError>(())
//! ```
//!
//! ## Variable Fonts
//!
//! ```rust,no_run
//! use lumina_font::{Font, FontId, Tag};
//!
//! let mut font = Font::from_file(FontId(0), "assets/Inter-Variable.ttf")?;
//! font.set_axis_value(Tag::new(b"wght"), 700.0)?;
//! let bold_a = font.glyph_outline(font.glyph_id('a' as u32))?;
//! # Ok::<(), lumina_font::FontError>(())
//! ```

pub mod atlas;
pub mod cache;
pub mod cff;
pub mod config;
pub mod cursor;
pub mod error;
pub mod font;
pub mod outline;
pub mod sdf;
pub mod shaping;
pub mod system;
pub mod tables;
pub mod truetype;
pub mod variation;

// Re-export main types
pub use atlas::{AtlasPlacement, GlyphAtlas, GlyphKey, HeadlessAtlas};
pub use cache::{
    CacheStats, CachedTextRun, PositionedGlyph, RunContext, TextCacheKey, TextRunCache,
};
pub use cff::{CffParser, OpenTypeParser};
pub use config::FontSystemConfig;
pub use cursor::ByteCursor;
pub use error::{FontError, FontResult};
pub use font::{Font, FontId};
pub use outline::{BoundingBox, Contour, CurveKind, GlyphOutline, OutlinePoint, OutlineSource};
pub use sdf::{
    EdgeColor, SdfConfig, SdfGenerator, SdfGlyphBitmap, SdfMode, Shape, color_edges,
    outline_to_shape, signed_distance,
};
pub use shaping::{NominalShaper, ShapedGlyph, TextShaper};
pub use system::FontSystem;
pub use tables::{FontFormat, GlyphMetrics, SfntTables, TableProvider, TableRecord, Tag};
pub use truetype::TrueTypeParser;
pub use variation::{AxisValueMap, FontAxis, FontInstance, GlyphVariation, VariationEngine};
