//! Shared single-channel glyph bitmaps, handed out to fonts as horizontal
//! bands (slices) spanning the full atlas width.

use crate::pool::Handle;

pub type AtlasId = Handle;

/// Pixels left between packed glyphs, horizontally and vertically.
pub const GLYPH_PADDING: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasSlice {
    pub pos_y: u32,
    pub height: u32,
}

impl AtlasSlice {
    fn end(&self) -> u32 {
        self.pos_y + self.height
    }
}

#[derive(Debug, Clone)]
pub struct Atlas {
    width: u32,
    height: u32,
    sdf: bool,
    pixels: Vec<u8>,
    free_slices: Vec<AtlasSlice>,
    pub(crate) font_count: usize,
}

impl Atlas {
    /// Zeroed atlas with a single free slice covering it.
    pub fn new(width: u32, height: u32, sdf: bool) -> Self {
        Self {
            width,
            height,
            sdf,
            pixels: vec![0; width as usize * height as usize],
            free_slices: vec![AtlasSlice { pos_y: 0, height }],
            font_count: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the atlas holds signed-distance glyphs.
    pub fn is_sdf(&self) -> bool {
        self.sdf
    }

    /// Row-major, one byte per pixel.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn free_slices(&self) -> &[AtlasSlice] {
        &self.free_slices
    }

    pub fn font_count(&self) -> usize {
        self.font_count
    }

    /// Carves a band of `height` rows out of the smallest free slice that can
    /// hold it. An exact fit consumes the slice, otherwise the slice shrinks
    /// from its start. Returns `None` and leaves the atlas untouched when no
    /// slice is tall enough.
    pub fn allocate_slice(&mut self, height: u32) -> Option<AtlasSlice> {
        let (index, _) = self
            .free_slices
            .iter()
            .enumerate()
            .filter(|(_, s)| s.height >= height)
            .min_by_key(|(_, s)| s.height)?;

        let slice = &mut self.free_slices[index];
        let granted = AtlasSlice {
            pos_y: slice.pos_y,
            height,
        };
        if slice.height == height {
            self.free_slices.remove(index);
        } else {
            slice.pos_y += height;
            slice.height -= height;
        }
        Some(granted)
    }

    /// Returns a band to the free list. Neighbouring free slices are left
    /// separate; see [`Atlas::coalesce`].
    pub fn release_slice(&mut self, slice: AtlasSlice) {
        debug_assert!(
            self.free_slices
                .iter()
                .all(|s| s.end() <= slice.pos_y || slice.end() <= s.pos_y),
            "released slice overlaps a free slice"
        );
        self.free_slices.push(slice);
    }

    /// Merges free slices that touch each other.
    pub fn coalesce(&mut self) {
        self.free_slices.sort_by_key(|s| s.pos_y);
        let mut merged: Vec<AtlasSlice> = Vec::with_capacity(self.free_slices.len());
        for slice in self.free_slices.drain(..) {
            match merged.last_mut() {
                Some(last) if last.end() == slice.pos_y => last.height += slice.height,
                _ => merged.push(slice),
            }
        }
        self.free_slices = merged;
    }

    /// Copies a `width` x `height` bitmap to `(x, y)`. Rows falling outside
    /// the atlas are cut off.
    pub(crate) fn blit(&mut self, x: u32, y: u32, width: u32, height: u32, src: &[u8]) {
        let w = width.min(self.width.saturating_sub(x)) as usize;
        for row in 0..height.min(self.height.saturating_sub(y)) {
            let src_start = (row * width) as usize;
            let Some(src_row) = src.get(src_start..src_start + w) else {
                break;
            };
            let dst_start = ((y + row) * self.width + x) as usize;
            self.pixels[dst_start..dst_start + w].copy_from_slice(src_row);
        }
    }

    /// Zeroes a band, so a released region does not leak old glyphs.
    pub(crate) fn clear_slice(&mut self, slice: AtlasSlice) {
        let start = (slice.pos_y * self.width) as usize;
        let end = (slice.end().min(self.height) * self.width) as usize;
        self.pixels[start..end].fill(0);
    }
}

/// Band height needed to pack glyphs of the given sizes left to right,
/// wrapping at `atlas_width`. Mirrors the placement done by [`pack_rows`].
pub fn required_height(sizes: impl IntoIterator<Item = (u32, u32)>, atlas_width: u32) -> u32 {
    let mut height = 0;
    pack_rows(sizes, atlas_width, |_, _, y, h| height = height.max(y + h + GLYPH_PADDING));
    height
}

/// Row-fill placement. Calls `place(index, x, y, height)` with coordinates
/// relative to the band's top-left corner.
pub fn pack_rows(
    sizes: impl IntoIterator<Item = (u32, u32)>,
    atlas_width: u32,
    mut place: impl FnMut(usize, u32, u32, u32),
) {
    let mut x = GLYPH_PADDING;
    let mut y = GLYPH_PADDING;
    let mut row_height = 0;
    for (i, (w, h)) in sizes.into_iter().enumerate() {
        if w == 0 || h == 0 {
            place(i, 0, 0, 0);
            continue;
        }
        if x + w + GLYPH_PADDING > atlas_width && x > GLYPH_PADDING {
            x = GLYPH_PADDING;
            y += row_height + GLYPH_PADDING;
            row_height = 0;
        }
        place(i, x, y, h);
        x += w + GLYPH_PADDING;
        row_height = row_height.max(h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_fit_consumes_slice() {
        let mut atlas = Atlas::new(16, 64, false);
        let slice = atlas.allocate_slice(64).unwrap();
        assert_eq!(slice, AtlasSlice { pos_y: 0, height: 64 });
        assert!(atlas.free_slices().is_empty());
    }

    #[test]
    fn too_tall_request_leaves_atlas_unchanged() {
        let mut atlas = Atlas::new(16, 64, false);
        atlas.allocate_slice(10).unwrap();
        let before = atlas.free_slices().to_vec();
        assert!(atlas.allocate_slice(60).is_none());
        assert_eq!(atlas.free_slices(), &before[..]);
    }

    #[test]
    fn best_fit_prefers_smallest_slice() {
        let mut atlas = Atlas::new(16, 100, false);
        let a = atlas.allocate_slice(30).unwrap();
        let _b = atlas.allocate_slice(10).unwrap();
        let c = atlas.allocate_slice(20).unwrap();
        atlas.release_slice(a);
        atlas.release_slice(c);
        // free: [60..100), [0..30), [40..60)
        let got = atlas.allocate_slice(15).unwrap();
        assert_eq!(got, AtlasSlice { pos_y: 40, height: 15 });
    }

    #[test]
    fn release_does_not_merge_until_coalesced() {
        let mut atlas = Atlas::new(16, 100, false);
        let a = atlas.allocate_slice(50).unwrap();
        let b = atlas.allocate_slice(50).unwrap();
        atlas.release_slice(a);
        atlas.release_slice(b);
        assert_eq!(atlas.free_slices().len(), 2);
        assert!(atlas.allocate_slice(100).is_none());

        atlas.coalesce();
        assert_eq!(atlas.free_slices(), &[AtlasSlice { pos_y: 0, height: 100 }]);
    }

    #[test]
    fn rows_wrap_at_atlas_width() {
        let sizes = [(4, 3), (4, 5), (4, 2)];
        let mut places = Vec::new();
        pack_rows(sizes, 11, |i, x, y, _| places.push((i, x, y)));
        assert_eq!(places, vec![(0, 1, 1), (1, 6, 1), (2, 1, 7)]);
        assert_eq!(required_height(sizes, 11), 10);
    }

    #[test]
    fn blit_copies_rows() {
        let mut atlas = Atlas::new(4, 4, false);
        atlas.blit(1, 2, 2, 2, &[1, 2, 3, 4]);
        assert_eq!(&atlas.pixels()[8..16], &[0, 1, 2, 0, 0, 3, 4, 0]);
        atlas.clear_slice(AtlasSlice { pos_y: 2, height: 2 });
        assert!(atlas.pixels().iter().all(|p| *p == 0));
    }
}
