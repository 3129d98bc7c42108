//! Shaped text run cache.
//!
//! Shaping a run and placing its glyphs in the atlas is expensive, while the
//! same strings are drawn every frame. Runs are cached under the exact font,
//! size, text and variation state, with strict LRU eviction.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use lumina_core::alloc::RandomState;
use lumina_core::profiling::profile_function;

use crate::atlas::{AtlasPlacement, GlyphAtlas, GlyphKey};
use crate::error::FontResult;
use crate::font::{Font, FontId};
use crate::sdf::SdfGenerator;
use crate::shaping::TextShaper;

/// Key for a cached text run.
///
/// Sizes compare by bit pattern, so `12.0` and `12.000001` are different runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextCacheKey {
    pub font_id: FontId,
    pub size_bits: u32,
    pub text: String,
    pub variation_hash: u64,
}

impl TextCacheKey {
    pub fn new(font_id: FontId, font_size: f32, text: &str, variation_hash: u64) -> Self {
        Self {
            font_id,
            size_bits: font_size.to_bits(),
            text: text.to_owned(),
            variation_hash,
        }
    }

    pub fn font_size(&self) -> f32 {
        f32::from_bits(self.size_bits)
    }
}

/// A glyph placed within a run, in pixels relative to the run origin on the
/// baseline, y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    pub glyph_id: u16,
    pub cluster: u32,
    pub x: f32,
    pub y: f32,
    pub advance: f32,
    /// `None` for glyphs without ink, such as spaces
    pub placement: Option<AtlasPlacement>,
    /// Ratio of the run size to the size the atlas bitmap was rendered at
    pub atlas_scale: f32,
}

impl PositionedGlyph {
    /// Screen rectangle `(x0, y_top, x1, y_bottom)` of the glyph quad.
    pub fn quad(&self) -> Option<[f32; 4]> {
        let p = self.placement?;
        let x0 = self.x + p.bearing_x * self.atlas_scale;
        let top = self.y + p.bearing_y * self.atlas_scale;
        Some([
            x0,
            top,
            x0 + p.width as f32 * self.atlas_scale,
            top - p.height as f32 * self.atlas_scale,
        ])
    }
}

/// Immutable result of shaping and placing one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CachedTextRun {
    pub glyphs: Vec<PositionedGlyph>,
    pub width: f32,
    /// Line height: ascender - descender + line gap
    pub height: f32,
    pub ascender: f32,
    /// Negative below the baseline
    pub descender: f32,
}

/// Collaborators needed to build a run on a cache miss.
pub struct RunContext<'a> {
    pub shaper: &'a mut dyn TextShaper,
    pub atlas: &'a mut dyn GlyphAtlas,
    pub generator: &'a SdfGenerator,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    run: Arc<CachedTextRun>,
    last_access_frame: u64,
}

/// Cache hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

/// Bounded LRU cache of shaped text runs.
pub struct TextRunCache {
    entries: LruCache<TextCacheKey, CacheEntry, RandomState>,
    frame: u64,
    stats: CacheStats,
}

impl TextRunCache {
    /// Create a cache holding at most `capacity` runs (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::with_hasher(capacity, RandomState::new()),
            frame: 0,
            stats: CacheStats::default(),
        }
    }

    /// Return the cached run, shaping and placing it on a miss.
    ///
    /// A miss inserts the new run as most recently used, evicting the least
    /// recently used run when full. Shaping or placement errors are returned
    /// without touching the cache.
    pub fn get(
        &mut self,
        font: &mut Font,
        font_size: f32,
        text: &str,
        ctx: &mut RunContext<'_>,
    ) -> FontResult<Arc<CachedTextRun>> {
        let key = TextCacheKey::new(font.id(), font_size, text, font.variation_hash());
        if let Some(run) = self.lookup(&key) {
            return Ok(run);
        }

        let run = build_run(font, font_size, text, ctx)?;
        Ok(self.insert(key, run))
    }

    /// Return a cached run and promote it to most recently used.
    pub fn lookup(&mut self, key: &TextCacheKey) -> Option<Arc<CachedTextRun>> {
        let frame = self.frame;
        let Some(entry) = self.entries.get_mut(key) else {
            self.stats.misses += 1;
            return None;
        };
        entry.last_access_frame = frame;
        self.stats.hits += 1;
        tracing::trace!("Text run cache hit: {:?}", key.text);
        Some(Arc::clone(&entry.run))
    }

    /// Insert a run as most recently used, evicting the LRU run when full.
    pub fn insert(&mut self, key: TextCacheKey, run: CachedTextRun) -> Arc<CachedTextRun> {
        let run = Arc::new(run);
        let entry = CacheEntry {
            run: Arc::clone(&run),
            last_access_frame: self.frame,
        };
        if let Some((evicted, _)) = self.entries.push(key.clone(), entry)
            && evicted != key
        {
            self.stats.evictions += 1;
            tracing::trace!("Evicted text run {:?}", evicted.text);
        }
        run
    }

    /// Check for a run without promoting it.
    pub fn contains(&self, key: &TextCacheKey) -> bool {
        self.entries.contains(key)
    }

    pub fn invalidate(&mut self, key: &TextCacheKey) -> bool {
        self.entries.pop(key).is_some()
    }

    /// Drop every run of one font. Returns how many were removed.
    pub fn invalidate_font(&mut self, font_id: FontId) -> usize {
        let keys: Vec<TextCacheKey> = self
            .entries
            .iter()
            .filter(|(k, _)| k.font_id == font_id)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            self.entries.pop(key);
        }
        if !keys.is_empty() {
            tracing::debug!("Invalidated {} text runs of font {}", keys.len(), font_id);
        }
        keys.len()
    }

    /// Drop every run and reset the statistics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = CacheStats::default();
    }

    /// Advance the frame counter. Never evicts.
    pub fn new_frame(&mut self) {
        self.frame += 1;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Frame in which a run was last inserted or hit.
    pub fn last_access_frame(&self, key: &TextCacheKey) -> Option<u64> {
        self.entries.peek(key).map(|e| e.last_access_frame)
    }

    /// Runs not accessed during the last `max_age` frames.
    pub fn stale_keys(&self, max_age: u64) -> Vec<TextCacheKey> {
        self.entries
            .iter()
            .filter(|(_, e)| self.frame.saturating_sub(e.last_access_frame) > max_age)
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn hit_rate(&self) -> f32 {
        self.stats.hit_rate()
    }

    /// Get cache statistics as a formatted string.
    pub fn stats_string(&self) -> String {
        format!(
            "TextRunCache: {}/{} runs, {:.1}% hit rate ({} hits, {} misses, {} evictions), frame {}",
            self.len(),
            self.capacity(),
            self.hit_rate() * 100.0,
            self.stats.hits,
            self.stats.misses,
            self.stats.evictions,
            self.frame
        )
    }
}

impl std::fmt::Debug for TextRunCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRunCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("frame", &self.frame)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Shape `text`, render missing glyphs into the atlas and lay the run out.
fn build_run(
    font: &mut Font,
    font_size: f32,
    text: &str,
    ctx: &mut RunContext<'_>,
) -> FontResult<CachedTextRun> {
    profile_function!();

    let shaped = ctx.shaper.shape(font, text)?;
    let scale = font_size / font.units_per_em() as f32;
    let atlas_scale = font_size / ctx.generator.config().base_size;

    let mut glyphs = Vec::with_capacity(shaped.len());
    let mut pen_x = 0.0f32;
    let mut pen_y = 0.0f32;
    for glyph in &shaped {
        let placement = place_glyph(font, glyph.glyph_id, ctx)?;
        glyphs.push(PositionedGlyph {
            glyph_id: glyph.glyph_id,
            cluster: glyph.cluster,
            x: pen_x + glyph.x_offset * scale,
            y: pen_y + glyph.y_offset * scale,
            advance: glyph.x_advance * scale,
            placement,
            atlas_scale,
        });
        pen_x += glyph.x_advance * scale;
        pen_y += glyph.y_advance * scale;
    }

    let ascender = font.ascender() as f32 * scale;
    let descender = font.descender() as f32 * scale;
    Ok(CachedTextRun {
        glyphs,
        width: pen_x,
        height: ascender - descender + font.line_gap() as f32 * scale,
        ascender,
        descender,
    })
}

fn place_glyph(
    font: &mut Font,
    glyph_id: u16,
    ctx: &mut RunContext<'_>,
) -> FontResult<Option<AtlasPlacement>> {
    let key = GlyphKey {
        font_id: font.id(),
        glyph_id,
        variation_hash: font.variation_hash(),
    };
    if ctx.atlas.has_glyph(&key) {
        return Ok(ctx.atlas.get_glyph(&key));
    }

    let outline = font.glyph_outline(glyph_id)?;
    if outline.is_empty() {
        return Ok(None);
    }
    let bitmap = ctx
        .generator
        .generate(&outline, ctx.generator.config().base_size, font.units_per_em());
    if bitmap.is_empty() {
        return Ok(None);
    }
    ctx.atlas.add_glyph(key, &bitmap).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str) -> TextCacheKey {
        TextCacheKey::new(FontId(1), 16.0, text, 0)
    }

    fn run(width: f32) -> CachedTextRun {
        CachedTextRun {
            width,
            ..Default::default()
        }
    }

    // ========================================
    // Key Tests
    // ========================================

    #[test]
    fn test_key_equality_is_exact() {
        assert_eq!(key("abc"), key("abc"));
        assert_ne!(key("abc"), key("abd"));
        assert_ne!(
            TextCacheKey::new(FontId(1), 16.0, "a", 0),
            TextCacheKey::new(FontId(1), 16.01, "a", 0)
        );
        assert_ne!(
            TextCacheKey::new(FontId(1), 16.0, "a", 0),
            TextCacheKey::new(FontId(1), 16.0, "a", 7)
        );
        assert_eq!(key("x").font_size(), 16.0);
    }

    // ========================================
    // Eviction Tests
    // ========================================

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = TextRunCache::new(2);
        cache.insert(key("A"), run(1.0));
        cache.insert(key("B"), run(2.0));
        cache.insert(key("C"), run(3.0));
        assert!(!cache.contains(&key("A")));
        assert!(cache.contains(&key("B")));
        assert!(cache.contains(&key("C")));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_access_promotes_entry() {
        let mut cache = TextRunCache::new(2);
        cache.insert(key("A"), run(1.0));
        cache.insert(key("B"), run(2.0));
        assert!(cache.lookup(&key("A")).is_some());
        cache.insert(key("C"), run(3.0));
        assert!(cache.contains(&key("A")));
        assert!(!cache.contains(&key("B")));
    }

    #[test]
    fn test_reinsert_same_key_is_not_eviction() {
        let mut cache = TextRunCache::new(1);
        cache.insert(key("A"), run(1.0));
        cache.insert(key("A"), run(5.0));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.lookup(&key("A")).map(|r| r.width), Some(5.0));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = TextRunCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    // ========================================
    // Invalidation Tests
    // ========================================

    #[test]
    fn test_invalidate() {
        let mut cache = TextRunCache::new(4);
        cache.insert(key("A"), run(1.0));
        assert!(cache.invalidate(&key("A")));
        assert!(!cache.invalidate(&key("A")));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_font() {
        let mut cache = TextRunCache::new(8);
        cache.insert(TextCacheKey::new(FontId(1), 12.0, "a", 0), run(1.0));
        cache.insert(TextCacheKey::new(FontId(1), 14.0, "a", 0), run(1.0));
        cache.insert(TextCacheKey::new(FontId(2), 12.0, "a", 0), run(1.0));
        assert_eq!(cache.invalidate_font(FontId(1)), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.invalidate_font(FontId(9)), 0);
    }

    #[test]
    fn test_clear_resets_stats() {
        let mut cache = TextRunCache::new(4);
        cache.insert(key("A"), run(1.0));
        cache.lookup(&key("A"));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    // ========================================
    // Frame Tests
    // ========================================

    #[test]
    fn test_new_frame_never_evicts() {
        let mut cache = TextRunCache::new(4);
        cache.insert(key("A"), run(1.0));
        for _ in 0..100 {
            cache.new_frame();
        }
        assert!(cache.contains(&key("A")));
        assert_eq!(cache.frame(), 100);
        assert_eq!(cache.last_access_frame(&key("A")), Some(0));
        assert_eq!(cache.stale_keys(10), vec![key("A")]);

        cache.lookup(&key("A"));
        assert_eq!(cache.last_access_frame(&key("A")), Some(100));
        assert!(cache.stale_keys(10).is_empty());
    }

    #[test]
    fn test_hit_rate_and_stats_string() {
        let mut cache = TextRunCache::new(4);
        assert_eq!(cache.hit_rate(), 0.0);
        cache.insert(key("A"), run(1.0));
        cache.lookup(&key("A"));
        assert!(cache.lookup(&key("B")).is_none());
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.hit_rate(), 0.5);
        assert!(cache.stats_string().contains("TextRunCache: 1/4 runs"));
    }

    #[test]
    fn test_quad_scales_placement() {
        let glyph = PositionedGlyph {
            glyph_id: 3,
            cluster: 0,
            x: 10.0,
            y: 0.0,
            advance: 8.0,
            placement: Some(AtlasPlacement {
                page: 0,
                uv: [0.0; 4],
                width: 20,
                height: 30,
                bearing_x: -4.0,
                bearing_y: 26.0,
            }),
            atlas_scale: 0.5,
        };
        assert_eq!(glyph.quad(), Some([8.0, 13.0, 18.0, -2.0]));
    }
}
