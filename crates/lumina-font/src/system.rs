//! Font management system.

use std::path::Path;
use std::sync::Arc;

use lumina_core::alloc::HashMap;
use lumina_core::profiling::{self, profile_function};

use crate::atlas::GlyphAtlas;
use crate::cache::{CachedTextRun, RunContext, TextRunCache};
use crate::config::FontSystemConfig;
use crate::error::{FontError, FontResult};
use crate::font::{Font, FontId};
use crate::sdf::{SdfGenerator, SdfGlyphBitmap};
use crate::shaping::{NominalShaper, TextShaper};

/// Owns loaded fonts, the text run cache and the distance field generator.
///
/// Each instance is independent; there is no process-wide state.
pub struct FontSystem {
    fonts: HashMap<FontId, Font>,
    next_id: u32,
    run_cache: TextRunCache,
    generator: SdfGenerator,
    shaper: Box<dyn TextShaper>,
}

impl FontSystem {
    /// Create a font system using [`NominalShaper`].
    pub fn new(config: FontSystemConfig) -> Self {
        Self::with_shaper(config, Box::new(NominalShaper))
    }

    pub fn with_shaper(config: FontSystemConfig, shaper: Box<dyn TextShaper>) -> Self {
        Self {
            fonts: HashMap::default(),
            next_id: 0,
            run_cache: TextRunCache::new(config.run_cache_capacity),
            generator: SdfGenerator::new(config.sdf),
            shaper,
        }
    }

    /// Parse and register a font from bytes.
    pub fn load_font(&mut self, data: Vec<u8>) -> FontResult<FontId> {
        let id = FontId(self.next_id);
        let font = Font::from_bytes(id, data)?;
        Ok(self.register(font))
    }

    /// Load a font from a .ttf or .otf file.
    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> FontResult<FontId> {
        let id = FontId(self.next_id);
        let font = Font::from_file(id, path)?;
        Ok(self.register(font))
    }

    fn register(&mut self, font: Font) -> FontId {
        let id = font.id();
        tracing::info!("Loaded font {} '{}'", id, font.family_name());
        self.fonts.insert(id, font);
        self.next_id += 1;
        id
    }

    /// Remove a font and every cached run that used it.
    pub fn unload_font(&mut self, id: FontId) -> FontResult<()> {
        self.fonts.remove(&id).ok_or(FontError::FontNotFound(id.0))?;
        self.run_cache.invalidate_font(id);
        Ok(())
    }

    pub fn font(&self, id: FontId) -> Option<&Font> {
        self.fonts.get(&id)
    }

    pub fn font_mut(&mut self, id: FontId) -> Option<&mut Font> {
        self.fonts.get_mut(&id)
    }

    /// Ids of every loaded font in load order.
    pub fn font_ids(&self) -> Vec<FontId> {
        let mut ids: Vec<FontId> = self.fonts.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Get the number of fonts loaded.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Check if no fonts are loaded.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Shaped and placed run for `text`, from the cache when possible.
    pub fn text_run(
        &mut self,
        id: FontId,
        font_size: f32,
        text: &str,
        atlas: &mut dyn GlyphAtlas,
    ) -> FontResult<Arc<CachedTextRun>> {
        let font = self.fonts.get_mut(&id).ok_or(FontError::FontNotFound(id.0))?;
        let mut ctx = RunContext {
            shaper: self.shaper.as_mut(),
            atlas,
            generator: &self.generator,
        };
        self.run_cache.get(font, font_size, text, &mut ctx)
    }

    /// Render one glyph's distance field at `font_size` pixels per em.
    pub fn render_glyph(
        &mut self,
        id: FontId,
        glyph_id: u16,
        font_size: f32,
    ) -> FontResult<SdfGlyphBitmap> {
        profile_function!();

        let font = self.fonts.get_mut(&id).ok_or(FontError::FontNotFound(id.0))?;
        let outline = font.glyph_outline(glyph_id)?;
        Ok(self
            .generator
            .generate(&outline, font_size, font.units_per_em()))
    }

    /// Advance the run cache frame counter and the profiler frame.
    pub fn new_frame(&mut self) {
        self.run_cache.new_frame();
        profiling::new_frame();
    }

    pub fn run_cache(&self) -> &TextRunCache {
        &self.run_cache
    }

    pub fn run_cache_mut(&mut self) -> &mut TextRunCache {
        &mut self.run_cache
    }

    pub fn generator(&self) -> &SdfGenerator {
        &self.generator
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new(FontSystemConfig::default())
    }
}

impl std::fmt::Debug for FontSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSystem")
            .field("fonts", &self.font_ids())
            .field("run_cache", &self.run_cache)
            .field("generator", &self.generator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_font_errors() {
        let mut system = FontSystem::default();
        assert_eq!(system.unload_font(FontId(3)), Err(FontError::FontNotFound(3)));
        assert!(system.font(FontId(0)).is_none());
        let mut atlas = crate::atlas::HeadlessAtlas::default();
        assert!(matches!(
            system.text_run(FontId(0), 12.0, "hi", &mut atlas),
            Err(FontError::FontNotFound(0))
        ));
        assert!(matches!(
            system.render_glyph(FontId(0), 1, 12.0),
            Err(FontError::FontNotFound(0))
        ));
    }

    #[test]
    fn test_bad_bytes_do_not_register() {
        let mut system = FontSystem::default();
        assert!(system.load_font(vec![0xde, 0xad, 0xbe, 0xef]).is_err());
        assert!(system.is_empty());
    }
}
