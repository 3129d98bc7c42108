//! Glyph atlas seam.
//!
//! The renderer owns the atlas textures; the run cache only needs to know
//! where a glyph's distance field landed.

use lumina_core::alloc::HashMap;

use crate::error::{FontError, FontResult};
use crate::font::FontId;
use crate::sdf::SdfGlyphBitmap;

/// Identifies one rendered glyph image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub font_id: FontId,
    pub glyph_id: u16,
    pub variation_hash: u64,
}

/// Where a glyph bitmap lives in the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasPlacement {
    /// Atlas page (texture layer) index
    pub page: u32,
    /// `(u0, v0, u1, v1)` in normalized texture coordinates
    pub uv: [f32; 4],
    /// Bitmap size in pixels
    pub width: u32,
    pub height: u32,
    /// Bitmap bearing in pixels at the size it was rendered at
    pub bearing_x: f32,
    pub bearing_y: f32,
}

/// Stores distance field bitmaps for rendering.
pub trait GlyphAtlas {
    fn has_glyph(&self, key: &GlyphKey) -> bool;

    /// Place `bitmap` and return its location. Fails with
    /// [`FontError::AtlasFull`] when there is no room.
    fn add_glyph(&mut self, key: GlyphKey, bitmap: &SdfGlyphBitmap) -> FontResult<AtlasPlacement>;

    fn get_glyph(&self, key: &GlyphKey) -> Option<AtlasPlacement>;
}

/// Row-based packing over a fixed number of square pages.
#[derive(Debug, Clone)]
struct RowPacker {
    size: u32,
    current_x: u32,
    current_y: u32,
    row_height: u32,
}

impl RowPacker {
    fn new(size: u32) -> Self {
        Self {
            size,
            current_x: 0,
            current_y: 0,
            row_height: 0,
        }
    }

    fn pack(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        if self.current_x + width > self.size {
            self.current_x = 0;
            self.current_y += self.row_height;
            self.row_height = 0;
        }
        if self.current_y + height > self.size {
            return None;
        }

        let origin = (self.current_x, self.current_y);
        self.current_x += width;
        self.row_height = self.row_height.max(height);
        Some(origin)
    }
}

/// Atlas that tracks placements without owning pixel storage.
///
/// Useful headless and in tests; a GPU atlas uploads `bitmap.data` at the
/// rectangle it hands back.
#[derive(Debug, Clone)]
pub struct HeadlessAtlas {
    page_size: u32,
    max_pages: usize,
    pages: Vec<RowPacker>,
    placements: HashMap<GlyphKey, AtlasPlacement>,
}

impl HeadlessAtlas {
    pub fn new(page_size: u32, max_pages: usize) -> Self {
        Self {
            page_size,
            max_pages: max_pages.max(1),
            pages: Vec::new(),
            placements: HashMap::default(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Forget every placement.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.placements.clear();
    }

    fn allocate(&mut self, width: u32, height: u32) -> Option<(u32, u32, u32)> {
        if let Some(page) = self.pages.last_mut()
            && let Some((x, y)) = page.pack(width, height)
        {
            return Some((self.pages.len() as u32 - 1, x, y));
        }
        if self.pages.len() >= self.max_pages {
            return None;
        }
        let mut page = RowPacker::new(self.page_size);
        let (x, y) = page.pack(width, height)?;
        self.pages.push(page);
        Some((self.pages.len() as u32 - 1, x, y))
    }
}

impl Default for HeadlessAtlas {
    fn default() -> Self {
        Self::new(2048, 4)
    }
}

impl GlyphAtlas for HeadlessAtlas {
    fn has_glyph(&self, key: &GlyphKey) -> bool {
        self.placements.contains_key(key)
    }

    fn add_glyph(&mut self, key: GlyphKey, bitmap: &SdfGlyphBitmap) -> FontResult<AtlasPlacement> {
        if let Some(existing) = self.placements.get(&key) {
            return Ok(*existing);
        }

        let full = FontError::AtlasFull {
            width: bitmap.width,
            height: bitmap.height,
        };
        if bitmap.width > self.page_size || bitmap.height > self.page_size {
            return Err(full);
        }
        let (page, x, y) = self.allocate(bitmap.width, bitmap.height).ok_or(full)?;

        let size = self.page_size as f32;
        let placement = AtlasPlacement {
            page,
            uv: [
                x as f32 / size,
                y as f32 / size,
                (x + bitmap.width) as f32 / size,
                (y + bitmap.height) as f32 / size,
            ],
            width: bitmap.width,
            height: bitmap.height,
            bearing_x: bitmap.bearing_x,
            bearing_y: bitmap.bearing_y,
        };
        self.placements.insert(key, placement);
        tracing::trace!("Placed glyph {:?} on page {} at ({}, {})", key, page, x, y);
        Ok(placement)
    }

    fn get_glyph(&self, key: &GlyphKey) -> Option<AtlasPlacement> {
        self.placements.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(glyph_id: u16) -> GlyphKey {
        GlyphKey {
            font_id: FontId(0),
            glyph_id,
            variation_hash: 0,
        }
    }

    fn bitmap(width: u32, height: u32) -> SdfGlyphBitmap {
        SdfGlyphBitmap {
            data: vec![0; (width * height) as usize],
            width,
            height,
            channels: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_row_packing() {
        let mut atlas = HeadlessAtlas::new(64, 1);
        let a = atlas.add_glyph(key(1), &bitmap(40, 20)).unwrap();
        let b = atlas.add_glyph(key(2), &bitmap(40, 10)).unwrap();
        assert_eq!(a.uv[0], 0.0);
        // Second glyph wraps to the next row.
        assert_eq!(b.uv[1], 20.0 / 64.0);
        assert!(atlas.has_glyph(&key(1)));
        assert_eq!(atlas.get_glyph(&key(2)), Some(b));
    }

    #[test]
    fn test_new_page_then_full() {
        let mut atlas = HeadlessAtlas::new(32, 2);
        atlas.add_glyph(key(1), &bitmap(32, 32)).unwrap();
        let second = atlas.add_glyph(key(2), &bitmap(32, 32)).unwrap();
        assert_eq!(second.page, 1);
        assert_eq!(
            atlas.add_glyph(key(3), &bitmap(8, 8)),
            Err(FontError::AtlasFull { width: 8, height: 8 })
        );
        assert!(atlas.add_glyph(key(4), &bitmap(33, 1)).is_err());
    }

    #[test]
    fn test_re_adding_returns_existing() {
        let mut atlas = HeadlessAtlas::default();
        let first = atlas.add_glyph(key(7), &bitmap(10, 10)).unwrap();
        let again = atlas.add_glyph(key(7), &bitmap(10, 10)).unwrap();
        assert_eq!(first, again);
        assert_eq!(atlas.len(), 1);
    }
}
