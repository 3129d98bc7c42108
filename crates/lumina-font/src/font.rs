//! Loaded font faces.

use std::path::Path;
use std::sync::Arc;

use lumina_core::alloc::HashMap;
use lumina_core::profiling::profile_function;

use crate::cff::OpenTypeParser;
use crate::error::{FontError, FontResult};
use crate::outline::{CurveKind, GlyphOutline, OutlineSource};
use crate::tables::{FontFormat, GlyphMetrics, Tag};
use crate::truetype::TrueTypeParser;
use crate::variation::{FontAxis, FontInstance, VariationEngine};

/// Handle to a font owned by a [`crate::FontSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(pub u32);

impl std::fmt::Display for FontId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parsed face with TrueType or CFF outlines.
///
/// Variable fonts carry a [`VariationEngine`]; [`Font::glyph_outline`] returns
/// outlines interpolated for the current axis values and caches them until
/// the variation state changes.
pub struct Font {
    id: FontId,
    format: FontFormat,
    source: Box<dyn OutlineSource + Send + Sync>,
    variations: Option<VariationEngine>,
    /// Interpolated outlines for `instance_hash`.
    instance_cache: HashMap<u16, Arc<GlyphOutline>>,
    instance_hash: u64,
}

impl Font {
    /// Parse a font from bytes.
    ///
    /// WOFF, WOFF2 and collections are rejected with
    /// [`FontError::UnsupportedFormat`].
    pub fn from_bytes(id: FontId, data: Vec<u8>) -> FontResult<Self> {
        profile_function!();

        let format = FontFormat::ensure_sfnt(&data)?;
        let source: Box<dyn OutlineSource + Send + Sync> = match format {
            FontFormat::OpenType => Box::new(OpenTypeParser::load(data)?),
            _ => Box::new(TrueTypeParser::load(data)?),
        };

        let engine = VariationEngine::load(source.as_ref())?;
        let variations = engine.is_variable().then_some(engine);
        if let Some(engine) = &variations {
            tracing::debug!(
                "Font {} '{}' is variable with {} axes",
                id,
                source.family_name(),
                engine.axes().len()
            );
        }

        Ok(Self {
            id,
            format,
            source,
            variations,
            instance_cache: HashMap::default(),
            instance_hash: 0,
        })
    }

    /// Read and parse a `.ttf` or `.otf` file.
    pub fn from_file(id: FontId, path: impl AsRef<Path>) -> FontResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        tracing::debug!("Read font file {} ({} bytes)", path.display(), data.len());
        Self::from_bytes(id, data)
    }

    pub fn id(&self) -> FontId {
        self.id
    }

    pub fn format(&self) -> FontFormat {
        self.format
    }

    pub fn curve_kind(&self) -> CurveKind {
        self.source.curve_kind()
    }

    pub fn family_name(&self) -> &str {
        self.source.family_name()
    }

    pub fn full_name(&self) -> &str {
        self.source.full_name()
    }

    pub fn units_per_em(&self) -> u16 {
        self.source.units_per_em()
    }

    pub fn ascender(&self) -> i16 {
        self.source.ascender()
    }

    pub fn descender(&self) -> i16 {
        self.source.descender()
    }

    pub fn line_gap(&self) -> i16 {
        self.source.line_gap()
    }

    pub fn glyph_count(&self) -> u16 {
        self.source.glyph_count()
    }

    /// Glyph for a codepoint, 0 (`.notdef`) when unmapped.
    pub fn glyph_id(&self, codepoint: u32) -> u16 {
        self.source.glyph_id(codepoint)
    }

    pub fn glyph_metrics(&self, glyph_id: u16) -> GlyphMetrics {
        self.source.glyph_metrics(glyph_id)
    }

    /// Outline for the current variation state, in font units.
    pub fn glyph_outline(&mut self, glyph_id: u16) -> FontResult<Arc<GlyphOutline>> {
        let Some(engine) = &self.variations else {
            return self.source.glyph_outline(glyph_id);
        };
        if engine.is_default() {
            return self.source.glyph_outline(glyph_id);
        }

        let hash = engine.variation_hash();
        if hash != self.instance_hash {
            self.instance_cache.clear();
            self.instance_hash = hash;
        }
        if let Some(outline) = self.instance_cache.get(&glyph_id) {
            return Ok(Arc::clone(outline));
        }

        let outline = Arc::new(self.source.varied_outline(glyph_id, engine)?);
        self.instance_cache.insert(glyph_id, Arc::clone(&outline));
        Ok(outline)
    }

    // ========================================
    // Variations
    // ========================================

    pub fn is_variable(&self) -> bool {
        self.variations.is_some()
    }

    pub fn variations(&self) -> Option<&VariationEngine> {
        self.variations.as_ref()
    }

    pub fn axes(&self) -> &[FontAxis] {
        self.variations.as_ref().map(|v| v.axes()).unwrap_or(&[])
    }

    pub fn instances(&self) -> &[FontInstance] {
        self.variations.as_ref().map(|v| v.instances()).unwrap_or(&[])
    }

    /// Set an axis in user-space units; values are clamped to the axis range.
    pub fn set_axis_value(&mut self, tag: Tag, value: f32) -> FontResult<()> {
        self.variations
            .as_mut()
            .ok_or(FontError::UnknownAxis(tag))?
            .set_axis_value(tag, value)
    }

    pub fn axis_value(&self, tag: Tag) -> FontResult<f32> {
        self.variations
            .as_ref()
            .ok_or(FontError::UnknownAxis(tag))?
            .axis_value(tag)
    }

    pub fn apply_instance(&mut self, index: usize) -> FontResult<()> {
        self.variations
            .as_mut()
            .ok_or(FontError::InvalidInstance(index))?
            .apply_instance(index)
    }

    /// Return every axis to its default.
    pub fn reset_variations(&mut self) {
        if let Some(engine) = &mut self.variations {
            engine.reset();
        }
    }

    /// Hash of the current axis values; 0 for non-variable fonts.
    pub fn variation_hash(&self) -> u64 {
        self.variations
            .as_ref()
            .map(VariationEngine::variation_hash)
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("id", &self.id)
            .field("family", &self.family_name())
            .field("format", &self.format)
            .field("glyphs", &self.glyph_count())
            .field("variable", &self.is_variable())
            .finish()
    }
}
