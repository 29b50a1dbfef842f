//! Font loading on top of an external glyph shaper, and the manager that
//! places every font's glyphs into a shared [`Atlas`].

use std::ops::Range;
use std::path::Path;

use crate::atlas::{self, Atlas, AtlasId, AtlasSlice};
use crate::config::AtlasConfig;
use crate::errors::{Error, Result};
use crate::math::Vector2;
use crate::pool::{Handle, Pool};

pub type FontId = Handle;

/// Distance field generation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SdfParams {
    /// Extra pixels around each glyph the field extends into.
    pub padding: u32,
    /// Field value exactly on the outline.
    pub on_edge_value: u8,
    /// Field change per pixel of distance.
    pub pixel_dist_scale: f32,
}

impl Default for SdfParams {
    fn default() -> Self {
        Self {
            padding: 3,
            on_edge_value: 128,
            pixel_dist_scale: 32.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShapeRequest<'a> {
    pub font_data: &'a [u8],
    pub size: f32,
    /// Codepoints to shape, end exclusive.
    pub range: Range<u32>,
    pub sdf: Option<SdfParams>,
}

/// Shaper output for one codepoint. Metrics are in pixels before the font's
/// scale is applied; `pixels` is `width * height` bytes, row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedGlyph {
    pub width: u32,
    pub height: u32,
    pub x_offset: f32,
    /// Offset from the baseline to the glyph's top edge, negative upward.
    pub y_offset: f32,
    pub advance_x: f32,
    pub left_bearing: f32,
    /// Extra advance before each codepoint of the range when it follows this one.
    pub kerning: Vec<f32>,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedFont {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
    pub scale: f32,
    /// One entry per codepoint of the requested range, in order.
    pub glyphs: Vec<ShapedGlyph>,
}

/// Turns font bytes into glyph metrics and bitmaps. Implemented outside the
/// core, e.g. by [`FontdueShaper`](crate::shapers::fontdue::FontdueShaper).
pub trait GlyphShaper {
    fn shape(&mut self, request: &ShapeRequest) -> Result<ShapedFont>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub advance_x: f32,
    pub left_bearing: f32,
    kerning: Vec<f32>,
    pub atlas_x: u32,
    pub atlas_y: u32,
    pub uv_min: Vector2,
    pub uv_max: Vector2,
}

#[derive(Debug, Clone)]
pub struct Font {
    range: Range<u32>,
    pub size: f32,
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
    pub scale: f32,
    sdf: bool,
    glyphs: Vec<Glyph>,
    atlas: AtlasId,
    slice: AtlasSlice,
}

impl Font {
    pub fn range(&self) -> Range<u32> {
        self.range.clone()
    }

    pub fn is_sdf(&self) -> bool {
        self.sdf
    }

    pub fn atlas(&self) -> AtlasId {
        self.atlas
    }

    pub fn atlas_slice(&self) -> AtlasSlice {
        self.slice
    }

    /// Glyph for a single byte of text, if the font covers it.
    pub fn glyph(&self, byte: u8) -> Option<&Glyph> {
        let index = (byte as u32).checked_sub(self.range.start)?;
        self.glyphs.get(index as usize)
    }

    /// Unscaled kerning applied between `prev` and `next`.
    pub fn kerning(&self, prev: u8, next: u8) -> f32 {
        let Some(glyph) = self.glyph(prev) else {
            return 0.0;
        };
        (next as u32)
            .checked_sub(self.range.start)
            .and_then(|i| glyph.kerning.get(i as usize))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn line_height(&self) -> f32 {
        (self.ascent - self.descent + self.line_gap) * self.scale
    }
}

pub type AtlasCallback = Box<dyn FnMut(AtlasId, &Atlas)>;

#[derive(Default)]
struct AtlasCallbacks {
    created: Option<AtlasCallback>,
    updated: Option<AtlasCallback>,
    destroyed: Option<AtlasCallback>,
}

pub struct FontManager {
    fonts: Pool<Font>,
    atlases: Vec<(AtlasId, Atlas)>,
    next_atlas: u32,
    config: AtlasConfig,
    shaper: Box<dyn GlyphShaper>,
    callbacks: AtlasCallbacks,
}

impl FontManager {
    pub fn new(config: AtlasConfig, max_fonts: usize, shaper: Box<dyn GlyphShaper>) -> Self {
        Self {
            fonts: Pool::new(max_fonts),
            atlases: Vec::new(),
            next_atlas: 0,
            config,
            shaper,
            callbacks: AtlasCallbacks::default(),
        }
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn on_atlas_created(&mut self, f: impl FnMut(AtlasId, &Atlas) + 'static) {
        self.callbacks.created = Some(Box::new(f));
    }

    pub fn on_atlas_updated(&mut self, f: impl FnMut(AtlasId, &Atlas) + 'static) {
        self.callbacks.updated = Some(Box::new(f));
    }

    pub fn on_atlas_destroyed(&mut self, f: impl FnMut(AtlasId, &Atlas) + 'static) {
        self.callbacks.destroyed = Some(Box::new(f));
    }

    pub fn get(&self, id: FontId) -> Option<&Font> {
        self.fonts.get(id)
    }

    pub fn atlas(&self, id: AtlasId) -> Option<&Atlas> {
        self.atlases.iter().find(|(a, _)| *a == id).map(|(_, atlas)| atlas)
    }

    pub fn atlases(&self) -> impl Iterator<Item = (AtlasId, &Atlas)> {
        self.atlases.iter().map(|(id, atlas)| (*id, atlas))
    }

    /// Coverage-bitmap font. Failures are logged and yield `None`.
    pub fn load_font(&mut self, data: &[u8], size: f32, range: Range<u32>) -> Option<FontId> {
        self.load_logged(data, size, range, None)
    }

    /// Signed-distance font. Failures are logged and yield `None`.
    pub fn load_sdf_font(&mut self, data: &[u8], size: f32, range: Range<u32>, sdf: SdfParams) -> Option<FontId> {
        self.load_logged(data, size, range, Some(sdf))
    }

    /// Reads the font from disk first. Failures are logged and yield `None`.
    pub fn load_font_file(&mut self, path: impl AsRef<Path>, size: f32, range: Range<u32>) -> Option<FontId> {
        let path = path.as_ref();
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(source) => {
                let err = Error::Io {
                    path: path.to_path_buf(),
                    source,
                };
                log::error!("{err}");
                return None;
            }
        };
        self.load_logged(&data, size, range, None)
    }

    fn load_logged(&mut self, data: &[u8], size: f32, range: Range<u32>, sdf: Option<SdfParams>) -> Option<FontId> {
        match self.try_load(data, size, range, sdf) {
            Ok(id) => Some(id),
            Err(err) => {
                log::error!("font load failed: {err}");
                None
            }
        }
    }

    /// Shapes the range, reserves an atlas band and copies the glyphs in.
    ///
    /// # Panics
    /// When the font pool is full, or when a freshly created atlas still
    /// cannot hold the band.
    pub fn try_load(&mut self, data: &[u8], size: f32, range: Range<u32>, sdf: Option<SdfParams>) -> Result<FontId> {
        if range.start >= range.end {
            return Err(Error::GlyphRange {
                start: range.start,
                end: range.end,
            });
        }

        let shaped = self.shaper.shape(&ShapeRequest {
            font_data: data,
            size,
            range: range.clone(),
            sdf,
        })?;

        let width = self.config.width;
        if let Some(wide) = shaped.glyphs.iter().find(|g| g.width + 2 * atlas::GLYPH_PADDING > width) {
            return Err(Error::AtlasTooSmall {
                required: wide.width + 2 * atlas::GLYPH_PADDING,
                available: width,
            });
        }
        let sizes = || shaped.glyphs.iter().map(|g| (g.width, g.height));
        let required = atlas::required_height(sizes(), width);
        if required > self.config.height {
            return Err(Error::AtlasTooSmall {
                required,
                available: self.config.height,
            });
        }

        let is_sdf = sdf.is_some();
        let (atlas_id, slice) = self.find_atlas(required, is_sdf);

        let atlas_index = self.atlas_index(atlas_id);
        let atlas = &mut self.atlases[atlas_index].1;
        let (aw, ah) = (atlas.width() as f32, atlas.height() as f32);
        let mut glyphs: Vec<Glyph> = Vec::with_capacity(shaped.glyphs.len());
        atlas::pack_rows(sizes(), width, |i, x, y, _| {
            let g = &shaped.glyphs[i];
            let atlas_y = slice.pos_y + y;
            atlas.blit(x, atlas_y, g.width, g.height, &g.pixels);
            glyphs.push(Glyph {
                width: g.width,
                height: g.height,
                x_offset: g.x_offset,
                y_offset: g.y_offset,
                advance_x: g.advance_x,
                left_bearing: g.left_bearing,
                kerning: g.kerning.clone(),
                atlas_x: x,
                atlas_y,
                uv_min: Vector2::new(x as f32 / aw, atlas_y as f32 / ah),
                uv_max: Vector2::new((x + g.width) as f32 / aw, (atlas_y + g.height) as f32 / ah),
            });
        });
        atlas.font_count += 1;

        if let Some(cb) = self.callbacks.updated.as_mut() {
            cb(atlas_id, atlas);
        }

        let id = self.fonts.allocate(Font {
            range,
            size,
            ascent: shaped.ascent,
            descent: shaped.descent,
            line_gap: shaped.line_gap,
            scale: shaped.scale,
            sdf: is_sdf,
            glyphs,
            atlas: atlas_id,
            slice,
        });
        log::debug!(
            "loaded font {:?}: {} glyphs, band {}px in atlas {:?}",
            id,
            self.fonts[id].glyphs.len(),
            required,
            atlas_id
        );
        Ok(id)
    }

    /// Best-fit band across the atlases of the matching kind, creating a new
    /// atlas when none has room.
    fn find_atlas(&mut self, required: u32, sdf: bool) -> (AtlasId, AtlasSlice) {
        for (id, atlas) in self.atlases.iter_mut().filter(|(_, a)| a.is_sdf() == sdf) {
            if let Some(slice) = atlas.allocate_slice(required) {
                return (*id, slice);
            }
        }

        let id = Handle::new(self.next_atlas, 0);
        self.next_atlas += 1;
        let mut atlas = Atlas::new(self.config.width, self.config.height, sdf);
        log::debug!("creating atlas {:?} ({}x{})", id, atlas.width(), atlas.height());
        if let Some(cb) = self.callbacks.created.as_mut() {
            cb(id, &atlas);
        }
        let Some(slice) = atlas.allocate_slice(required) else {
            panic!(
                "a fresh {}x{} atlas cannot hold a band of {required}px",
                atlas.width(),
                atlas.height()
            );
        };
        self.atlases.push((id, atlas));
        (id, slice)
    }

    fn atlas_index(&self, id: AtlasId) -> usize {
        match self.atlases.iter().position(|(a, _)| *a == id) {
            Some(i) => i,
            None => panic!("atlas {id:?} is not loaded"),
        }
    }

    /// Releases the font's atlas band; the atlas goes away with its last font.
    ///
    /// # Panics
    /// When `id` is stale.
    pub fn unload_font(&mut self, id: FontId) {
        let font = self.fonts.deallocate(id);
        let index = self.atlas_index(font.atlas);
        let coalesce = self.config.coalesce_free_slices;
        let (atlas_id, atlas) = &mut self.atlases[index];

        atlas.clear_slice(font.slice);
        atlas.release_slice(font.slice);
        if coalesce {
            atlas.coalesce();
        }
        atlas.font_count -= 1;

        if atlas.font_count > 0 {
            if let Some(cb) = self.callbacks.updated.as_mut() {
                cb(*atlas_id, atlas);
            }
            return;
        }

        let (atlas_id, atlas) = self.atlases.remove(index);
        log::debug!("destroying atlas {:?}", atlas_id);
        if let Some(cb) = self.callbacks.destroyed.as_mut() {
            cb(atlas_id, &atlas);
        }
    }
}

/// Converts a coverage bitmap into a signed distance field that is
/// `2 * padding` pixels larger on each axis. Pixels at or above half
/// coverage count as inside; the search for the nearest opposite pixel is
/// bounded by `padding + 1`, beyond which the field saturates.
pub fn sdf_from_coverage(coverage: &[u8], width: u32, height: u32, params: &SdfParams) -> (Vec<u8>, u32, u32) {
    let pad = params.padding as i64;
    let (w, h) = (width as i64, height as i64);
    let (out_w, out_h) = (w + 2 * pad, h + 2 * pad);
    let inside = |x: i64, y: i64| -> bool {
        x >= 0 && y >= 0 && x < w && y < h && coverage.get((y * w + x) as usize).is_some_and(|c| *c >= 128)
    };

    let radius = pad + 1;
    let mut out = Vec::with_capacity((out_w * out_h) as usize);
    for oy in 0..out_h {
        for ox in 0..out_w {
            let (x, y) = (ox - pad, oy - pad);
            let here = inside(x, y);
            let mut best = (radius * radius) as f32;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if inside(x + dx, y + dy) != here {
                        best = best.min((dx * dx + dy * dy) as f32);
                    }
                }
            }
            let dist = best.sqrt() - 0.5;
            let signed = if here { dist } else { -dist };
            let value = params.on_edge_value as f32 + signed * params.pixel_dist_scale;
            out.push(value.clamp(0.0, 255.0) as u8);
        }
    }
    (out, out_w as u32, out_h as u32)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Deterministic shaper: every glyph is a solid `width` x `height` block
    /// whose advance equals its width. `A` followed by `V` kerns by -1.
    #[derive(Debug, Clone)]
    pub struct FixedShaper {
        pub width: u32,
        pub height: u32,
    }

    impl Default for FixedShaper {
        fn default() -> Self {
            Self { width: 8, height: 10 }
        }
    }

    impl GlyphShaper for FixedShaper {
        fn shape(&mut self, request: &ShapeRequest) -> Result<ShapedFont> {
            if request.font_data.is_empty() {
                return Err(Error::FontParse("empty font data".into()));
            }
            let count = (request.range.end - request.range.start) as usize;
            let glyphs = request
                .range
                .clone()
                .map(|c| {
                    let mut kerning = vec![0.0; count];
                    if c == 'A' as u32 {
                        if let Some(k) = ('V' as u32)
                            .checked_sub(request.range.start)
                            .and_then(|i| kerning.get_mut(i as usize))
                        {
                            *k = -1.0;
                        }
                    }
                    ShapedGlyph {
                        width: self.width,
                        height: self.height,
                        x_offset: 0.0,
                        y_offset: -(self.height as f32),
                        advance_x: self.width as f32,
                        left_bearing: 0.0,
                        kerning,
                        pixels: vec![255; (self.width * self.height) as usize],
                    }
                })
                .collect();
            Ok(ShapedFont {
                ascent: self.height as f32,
                descent: -2.0,
                line_gap: 1.0,
                scale: 1.0,
                glyphs,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FixedShaper;
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manager(width: u32, height: u32) -> FontManager {
        let config = AtlasConfig {
            width,
            height,
            ..Default::default()
        };
        FontManager::new(config, 8, Box::new(FixedShaper::default()))
    }

    #[test]
    fn glyphs_get_normalized_uvs() {
        let mut fonts = manager(64, 64);
        let id = fonts.load_font(b"font", 16.0, 65..70).unwrap();
        let font = fonts.get(id).unwrap();
        let g = font.glyph(b'A').unwrap();
        assert_eq!((g.atlas_x, g.atlas_y), (1, 1));
        assert_eq!(g.uv_min, Vector2::new(1.0 / 64.0, 1.0 / 64.0));
        assert_eq!(g.uv_max, Vector2::new(9.0 / 64.0, 11.0 / 64.0));
        assert!(font.glyph(b'z').is_none());
        assert_eq!(font.kerning(b'A', b'V'), 0.0);

        let atlas = fonts.atlas(font.atlas()).unwrap();
        assert_eq!(atlas.pixels()[64 + 1], 255);
        assert_eq!(atlas.pixels()[0], 0);
    }

    #[test]
    fn kerning_lookup() {
        let mut fonts = manager(256, 64);
        let id = fonts.load_font(b"font", 16.0, 65..91).unwrap();
        let font = fonts.get(id).unwrap();
        assert_eq!(font.kerning(b'A', b'V'), -1.0);
        assert_eq!(font.kerning(b'V', b'A'), 0.0);
    }

    #[test]
    fn fonts_share_an_atlas_until_full() {
        let mut fonts = manager(64, 24);
        let created = Rc::new(RefCell::new(0));
        let counter = created.clone();
        fonts.on_atlas_created(move |_, _| *counter.borrow_mut() += 1);

        // 5 glyphs of 8px fit one row: band of 12px
        let a = fonts.load_font(b"font", 16.0, 65..70).unwrap();
        let b = fonts.load_font(b"font", 16.0, 65..70).unwrap();
        assert_eq!(fonts.get(a).unwrap().atlas(), fonts.get(b).unwrap().atlas());
        assert_eq!(*created.borrow(), 1);

        let c = fonts.load_font(b"font", 16.0, 65..70).unwrap();
        assert_ne!(fonts.get(c).unwrap().atlas(), fonts.get(a).unwrap().atlas());
        assert_eq!(*created.borrow(), 2);
    }

    #[test]
    fn sdf_and_bitmap_fonts_use_separate_atlases() {
        let mut fonts = manager(64, 64);
        let a = fonts.load_font(b"font", 16.0, 65..66).unwrap();
        let b = fonts.load_sdf_font(b"font", 16.0, 65..66, SdfParams::default()).unwrap();
        assert_ne!(fonts.get(a).unwrap().atlas(), fonts.get(b).unwrap().atlas());
        assert!(fonts.get(b).unwrap().is_sdf());
    }

    #[test]
    fn last_unload_destroys_atlas() {
        let mut fonts = manager(64, 64);
        let destroyed = Rc::new(RefCell::new(Vec::new()));
        let sink = destroyed.clone();
        fonts.on_atlas_destroyed(move |id, _| sink.borrow_mut().push(id));

        let a = fonts.load_font(b"font", 16.0, 65..70).unwrap();
        let b = fonts.load_font(b"font", 16.0, 65..70).unwrap();
        let atlas = fonts.get(a).unwrap().atlas();

        fonts.unload_font(a);
        assert!(fonts.atlas(atlas).is_some());
        assert!(destroyed.borrow().is_empty());

        fonts.unload_font(b);
        assert!(fonts.atlas(atlas).is_none());
        assert_eq!(*destroyed.borrow(), vec![atlas]);
        assert!(fonts.get(a).is_none());
    }

    #[test]
    fn coalescing_is_opt_in() {
        for coalesce in [false, true] {
            let config = AtlasConfig {
                width: 64,
                height: 64,
                coalesce_free_slices: coalesce,
            };
            let mut fonts = FontManager::new(config, 8, Box::new(FixedShaper::default()));
            let a = fonts.load_font(b"font", 16.0, 65..70).unwrap();
            let b = fonts.load_font(b"font", 16.0, 65..70).unwrap();
            let _keep = fonts.load_font(b"font", 16.0, 65..70).unwrap();
            let atlas = fonts.get(a).unwrap().atlas();
            fonts.unload_font(a);
            fonts.unload_font(b);

            let free = fonts.atlas(atlas).unwrap().free_slices().len();
            assert_eq!(free, if coalesce { 2 } else { 3 });
        }
    }

    #[test]
    fn load_errors_are_logged_and_return_none() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut fonts = manager(64, 64);
        assert!(fonts.load_font(b"", 16.0, 65..70).is_none());
        assert!(fonts.load_font(b"font", 16.0, 70..65).is_none());
        assert!(fonts.load_font_file("/nonexistent/font.ttf", 16.0, 65..70).is_none());
        assert!(matches!(
            fonts.try_load(b"font", 16.0, 0..200, None),
            Err(Error::AtlasTooSmall { .. })
        ));
        assert_eq!(fonts.atlases().count(), 0);
    }

    #[test]
    fn sdf_field_is_signed_around_edge() {
        let params = SdfParams {
            padding: 2,
            on_edge_value: 128,
            pixel_dist_scale: 40.0,
        };
        let coverage = vec![255u8; 4 * 4];
        let (field, w, h) = sdf_from_coverage(&coverage, 4, 4, &params);
        assert_eq!((w, h), (8, 8));
        let at = |x: usize, y: usize| field[y * 8 + x];
        // centre is inside, corner of the padding is outside
        assert!(at(4, 4) > 128);
        assert!(at(0, 0) < 128);
        // just inside the edge vs just outside it
        assert!(at(2, 4) > 128 && at(1, 4) < 128);
    }
}
