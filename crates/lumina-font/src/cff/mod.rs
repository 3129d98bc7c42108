//! CFF outlines: the `CFF ` table and the `OTTO` container around it.

pub mod charstring;
pub mod dict;
pub mod index;

use std::sync::Arc;

use lumina_core::alloc::HashMap;
use lumina_core::profiling::profile_function;

use crate::cursor::ByteCursor;
use crate::error::{FontError, FontResult};
use crate::outline::{Contour, CurveKind, GlyphOutline, OutlinePoint, OutlineSource};
use crate::tables::{SfntTables, TableProvider, Tag};

use charstring::{CharstringState, OperandStack, OutlineSink, Subroutines};
use dict::{Dict, FdSelect, PrivateDict, ops};
use index::Index;

/// Parsed `CFF ` table.
///
/// Owns a copy of the table bytes; every INDEX stores ranges into it.
#[derive(Debug, Clone)]
pub struct CffParser {
    data: Vec<u8>,
    names: Index,
    strings: Index,
    global_subrs: Index,
    charstrings: Index,
    /// One entry per Font DICT (a single entry for non-CID fonts).
    privates: Vec<PrivateDict>,
    local_subrs: Vec<Option<Index>>,
    fd_select: Option<FdSelect>,
}

impl CffParser {
    /// Parse the CFF table found at `[offset, offset + length)` of `data`.
    pub fn parse_cff(data: &[u8], offset: usize, length: usize) -> FontResult<Self> {
        profile_function!();

        let data = crate::cursor::slice(data, offset, length)?.to_vec();

        let mut c = ByteCursor::new(&data);
        let major = c.read_u8()?;
        let _minor = c.read_u8()?;
        let header_size = c.read_u8()? as usize;
        let _off_size = c.read_u8()?;
        if major != 1 {
            return Err(FontError::malformed(
                Tag::CFF,
                format!("unsupported CFF major version {}", major),
            ));
        }

        let names = Index::parse(&data, header_size)?;
        let top_dicts = Index::parse(&data, names.end())?;
        let strings = Index::parse(&data, top_dicts.end())?;
        let global_subrs = Index::parse(&data, strings.end())?;

        // Only the first font of a FontSet is used.
        let top = Dict::parse(top_dicts.get(&data, 0)?)?;
        if let Some(&[kind, ..]) = top.get(ops::CHARSTRING_TYPE)
            && kind != 2.0
        {
            return Err(FontError::malformed(
                Tag::CFF,
                format!("charstring type {} is not Type2", kind),
            ));
        }

        let charstrings_offset = top
            .offset(ops::CHARSTRINGS)?
            .ok_or_else(|| FontError::malformed(Tag::CFF, "Top DICT has no CharStrings"))?;
        let charstrings = Index::parse(&data, charstrings_offset)?;

        let (privates, fd_select) = if top.contains(ops::ROS) {
            let fd_array_offset = top
                .offset(ops::FD_ARRAY)?
                .ok_or_else(|| FontError::malformed(Tag::CFF, "CID font has no FDArray"))?;
            let fd_select_offset = top
                .offset(ops::FD_SELECT)?
                .ok_or_else(|| FontError::malformed(Tag::CFF, "CID font has no FDSelect"))?;

            let fd_array = Index::parse(&data, fd_array_offset)?;
            let mut privates = Vec::with_capacity(fd_array.count());
            for i in 0..fd_array.count() {
                let font_dict = Dict::parse(fd_array.get(&data, i)?)?;
                privates.push(read_private(&data, &font_dict)?);
            }
            let fd_select = FdSelect::parse(&data, fd_select_offset, charstrings.count())?;
            (privates, Some(fd_select))
        } else {
            (vec![read_private(&data, &top)?], None)
        };

        let local_subrs = privates
            .iter()
            .map(|p| p.subrs_offset.map(|o| Index::parse(&data, o)).transpose())
            .collect::<FontResult<Vec<_>>>()?;

        tracing::debug!(
            "Parsed CFF table: {} charstrings, {} global subrs, {} font dicts",
            charstrings.count(),
            global_subrs.count(),
            privates.len()
        );

        Ok(Self {
            data,
            names,
            strings,
            global_subrs,
            charstrings,
            privates,
            local_subrs,
            fd_select,
        })
    }

    pub fn glyph_count(&self) -> usize {
        self.charstrings.count()
    }

    pub fn is_cid(&self) -> bool {
        self.fd_select.is_some()
    }

    /// PostScript name of the font from the Name INDEX.
    pub fn font_name(&self) -> Option<&str> {
        let bytes = self.names.get(&self.data, 0).ok()?;
        std::str::from_utf8(bytes).ok()
    }

    pub fn string_count(&self) -> usize {
        self.strings.count()
    }

    /// Run the glyph's charstring and collect its contours.
    ///
    /// The advance comes from the charstring width; callers with an `hmtx`
    /// table override it.
    pub fn glyph(&self, glyph_id: u16) -> FontResult<GlyphOutline> {
        profile_function!();

        let charstring = self.charstrings.get(&self.data, glyph_id as usize)?;
        let fd = match &self.fd_select {
            Some(select) => select.font_dict(glyph_id).ok_or_else(|| {
                FontError::malformed(Tag::CFF, format!("glyph {} has no Font DICT", glyph_id))
            })?,
            None => 0,
        };
        let local = self.local_subrs.get(fd).and_then(Option::as_ref);

        let subrs = Subroutines {
            data: &self.data,
            global: &self.global_subrs,
            local,
        };
        let mut stack = OperandStack::new();
        let mut state = CharstringState::default();
        let mut builder = ContourBuilder::default();
        charstring::evaluate(charstring, subrs, &mut stack, &mut state, &mut builder)?;

        let mut outline = GlyphOutline {
            contours: builder.finish(),
            advance_width: self.advance_width(fd, state.width),
            curve_kind: CurveKind::Cubic,
            ..Default::default()
        };
        outline.recompute_bounds();
        Ok(outline)
    }

    fn advance_width(&self, fd: usize, width: Option<f32>) -> f32 {
        let private = self.privates.get(fd).copied().unwrap_or_default();
        match width {
            Some(w) => (private.nominal_width_x + w as f64) as f32,
            None => private.default_width_x as f32,
        }
    }
}

fn read_private(data: &[u8], dict: &Dict) -> FontResult<PrivateDict> {
    match dict.private_range()? {
        Some((size, offset)) => PrivateDict::parse(data, size, offset),
        None => Ok(PrivateDict::default()),
    }
}

/// Collects charstring path commands into cubic contours.
#[derive(Debug, Default)]
struct ContourBuilder {
    contours: Vec<Contour>,
    current: Vec<OutlinePoint>,
}

impl ContourBuilder {
    fn finish(mut self) -> Vec<Contour> {
        self.close();
        self.contours
    }
}

impl OutlineSink for ContourBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.close();
        self.current.push(OutlinePoint::on(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.current.push(OutlinePoint::on(x, y));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.current.push(OutlinePoint::off(cx0, cy0));
        self.current.push(OutlinePoint::off(cx1, cy1));
        self.current.push(OutlinePoint::on(x, y));
    }

    fn close(&mut self) {
        if self.current.len() > 1 {
            // Contours are implicitly closed; drop an explicit return to the start.
            if let (Some(first), Some(last)) = (self.current.first(), self.current.last())
                && first.x == last.x
                && first.y == last.y
                && last.on_curve
            {
                self.current.pop();
            }
        }
        if !self.current.is_empty() {
            self.contours.push(Contour {
                points: std::mem::take(&mut self.current),
            });
        }
    }
}

/// Parser for `OTTO` fonts: sfnt metadata tables plus CFF outlines.
pub struct OpenTypeParser {
    sfnt: SfntTables,
    cff: CffParser,
    cache: HashMap<u16, Arc<GlyphOutline>>,
}

impl OpenTypeParser {
    pub fn load(data: Vec<u8>) -> FontResult<Self> {
        profile_function!();

        let sfnt = SfntTables::parse(data)?;
        let range = sfnt.require_range(Tag::CFF)?;
        let cff = CffParser::parse_cff(sfnt.data(), range.start, range.len())?;

        if cff.glyph_count() != sfnt.glyph_count() as usize {
            tracing::warn!(
                "CFF has {} charstrings but maxp declares {} glyphs",
                cff.glyph_count(),
                sfnt.glyph_count()
            );
        }
        tracing::debug!(
            "Loaded CFF font '{}' ({} glyphs)",
            sfnt.names.family_name(),
            sfnt.glyph_count()
        );

        Ok(Self {
            sfnt,
            cff,
            cache: HashMap::default(),
        })
    }

    pub fn cff(&self) -> &CffParser {
        &self.cff
    }
}

impl TableProvider for OpenTypeParser {
    fn table_data(&self, tag: Tag) -> Option<&[u8]> {
        self.sfnt.table_data(tag)
    }
}

impl OutlineSource for OpenTypeParser {
    fn sfnt(&self) -> &SfntTables {
        &self.sfnt
    }

    fn glyph_outline(&mut self, glyph_id: u16) -> FontResult<Arc<GlyphOutline>> {
        if let Some(outline) = self.cache.get(&glyph_id) {
            return Ok(Arc::clone(outline));
        }

        self.sfnt.check_glyph(glyph_id)?;
        let mut outline = self.cff.glyph(glyph_id)?;
        let metrics = self.sfnt.glyph_metrics(glyph_id);
        outline.advance_width = metrics.advance_width as f32;
        outline.left_side_bearing = metrics.left_side_bearing as f32;

        let outline = Arc::new(outline);
        self.cache.insert(glyph_id, Arc::clone(&outline));
        Ok(outline)
    }

    fn curve_kind(&self) -> CurveKind {
        CurveKind::Cubic
    }
}
