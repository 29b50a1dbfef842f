//! Single-line text measurement and glyph quad emission.
//!
//! Strings are walked byte by byte against the font's codepoint range, so
//! only single-byte text renders. Measurement and emission share one walk,
//! which keeps a widget sized by [`measure`] exactly around the quads
//! [`emit`] produces.

use crate::draw::{MeshWriter, Vertex};
use crate::font::{Font, Glyph};
use crate::math::{BoundingBox, Vector2};
use crate::tessellate::{Paint, VisualState};
use crate::widget::TextGfx;

/// Calls `place(glyph, pen_x)` for every byte the font covers and returns the
/// pen position after the last advance.
fn walk<'f>(font: &'f Font, text: &str, spacing: f32, mut place: impl FnMut(&'f Glyph, f32)) -> f32 {
    let mut pen = 0.0;
    let mut prev: Option<u8> = None;
    for byte in text.bytes() {
        if let Some(p) = prev {
            pen += font.kerning(p, byte) * font.scale;
        }
        let Some(glyph) = font.glyph(byte) else {
            log::trace!("byte {byte:#x} outside font range {:?}", font.range());
            prev = None;
            continue;
        };
        place(glyph, pen);
        pen += glyph.advance_x * font.scale + spacing;
        prev = Some(byte);
    }
    pen
}

/// Width up to the last glyph's advance (trailing spacing excluded) and the
/// tallest glyph's height.
pub fn measure(font: &Font, text: &str, spacing: f32) -> Vector2 {
    let mut height = 0.0f32;
    let mut placed = false;
    let pen = walk(font, text, spacing, |glyph, _| {
        height = height.max(glyph.height as f32);
        placed = true;
    });
    let width = if placed { pen - spacing } else { 0.0 };
    Vector2::new(width, height)
}

/// Two triangles per glyph, placed on a baseline `ascent` below `rect`'s top.
/// Colors come from the payload's gradient across `rect`.
pub fn emit(writer: &mut MeshWriter, font: &Font, gfx: &TextGfx, rect: BoundingBox, state: VisualState) {
    let paint = Paint::new(gfx.gradient, gfx.state, state, rect);
    let baseline = rect.y + font.ascent * font.scale;

    walk(font, gfx.text(), gfx.spacing(), |glyph, pen| {
        if glyph.width == 0 || glyph.height == 0 {
            return;
        }
        let x0 = rect.x + pen + glyph.x_offset * font.scale;
        let y0 = baseline + glyph.y_offset * font.scale;
        let x1 = x0 + glyph.width as f32;
        let y1 = y0 + glyph.height as f32;

        let corners = [
            (Vector2::new(x0, y0), glyph.uv_min),
            (Vector2::new(x1, y0), Vector2::new(glyph.uv_max.x, glyph.uv_min.y)),
            (Vector2::new(x1, y1), glyph.uv_max),
            (Vector2::new(x0, y1), Vector2::new(glyph.uv_min.x, glyph.uv_max.y)),
        ];
        let mut idx = [0u16; 4];
        for (slot, (pos, uv)) in idx.iter_mut().zip(corners) {
            let color = paint.color_at(paint.uv(pos));
            *slot = writer.push_vertex(Vertex::new(pos, uv, color));
        }
        writer.push_triangle(idx[0], idx[1], idx[2]);
        writer.push_triangle(idx[0], idx[2], idx[3]);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::config::{AtlasConfig, EngineConfig};
    use crate::draw::{BatchKey, DrawBatcher};
    use crate::font::testing::FixedShaper;
    use crate::font::FontManager;
    use crate::widget::Gradient;

    fn fonts() -> (FontManager, crate::font::FontId) {
        let mut fonts = FontManager::new(AtlasConfig::default(), 4, Box::new(FixedShaper::default()));
        let id = fonts.load_font(b"font", 16.0, 32..127).unwrap();
        (fonts, id)
    }

    fn emitted(font: &Font, gfx: &TextGfx, rect: BoundingBox) -> Vec<Vertex> {
        let mut batcher = DrawBatcher::new(&EngineConfig {
            buffer_count: 1,
            ..Default::default()
        });
        let buffer = batcher.get_draw_buffer(
            BatchKey {
                clip: rect,
                draw_order: 0,
                user_data: 0,
                font: None,
            },
            None,
        );
        emit(&mut batcher.writer(buffer), font, gfx, rect, VisualState::default());
        let mut out = Vec::new();
        batcher.flush(|b| out = b.vertices.to_vec());
        out
    }

    #[test]
    fn measure_excludes_trailing_spacing() {
        let (fonts, id) = fonts();
        let font = fonts.get(id).unwrap();
        assert_eq!(measure(font, "abc", 2.0), Vector2::new(8.0 * 3.0 + 2.0 * 2.0, 10.0));
        assert_eq!(measure(font, "", 2.0), Vector2::ZERO);
    }

    #[test]
    fn measure_applies_kerning() {
        let (fonts, id) = fonts();
        let font = fonts.get(id).unwrap();
        assert_eq!(measure(font, "AV", 0.0).x, 15.0);
        assert_eq!(measure(font, "VA", 0.0).x, 16.0);
    }

    #[test]
    fn emitted_quads_span_measured_width() {
        let (fonts, id) = fonts();
        let font = fonts.get(id).unwrap();
        for (text, spacing) in [("Hello", 0.0), ("AVAV", 3.0), ("x", 1.5)] {
            let mut gfx = TextGfx::default();
            gfx.set_text(text).set_spacing(spacing);
            let rect = BoundingBox::new(20.0, 5.0, 100.0, 20.0);
            let vertices = emitted(font, &gfx, rect);
            assert_eq!(vertices.len(), text.len() * 4);

            let min = vertices.iter().map(|v| v.pos.x).fold(f32::MAX, f32::min);
            let max = vertices.iter().map(|v| v.pos.x).fold(f32::MIN, f32::max);
            assert!((max - min - measure(font, text, spacing).x).abs() < 1e-4);
            assert_eq!(min, 20.0);
        }
    }

    #[test]
    fn quads_sit_on_baseline_with_glyph_uvs() {
        let (fonts, id) = fonts();
        let font = fonts.get(id).unwrap();
        let mut gfx = TextGfx::default();
        gfx.set_text("A");
        gfx.gradient = Gradient::solid(Color::WHITE);
        let vertices = emitted(font, &gfx, BoundingBox::new(0.0, 0.0, 8.0, 10.0));

        let glyph = font.glyph(b'A').unwrap();
        // ascent 10, glyph top 10 above the baseline
        assert_eq!(vertices[0].pos, Vector2::new(0.0, 0.0));
        assert_eq!(vertices[2].pos, Vector2::new(8.0, 10.0));
        assert_eq!(vertices[0].uv, glyph.uv_min);
        assert_eq!(vertices[2].uv, glyph.uv_max);
        assert!(vertices.iter().all(|v| v.color == Color::WHITE));
    }

    #[test]
    fn bytes_outside_range_are_skipped() {
        let (fonts, id) = fonts();
        let font = fonts.get(id).unwrap();
        assert_eq!(measure(font, "a\u{7f}b", 0.0).x, 16.0);
    }
}
