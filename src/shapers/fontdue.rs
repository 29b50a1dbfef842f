use ::fontdue::{Font, FontSettings};

use crate::errors::{Error, Result};
use crate::font::{sdf_from_coverage, GlyphShaper, ShapeRequest, ShapedFont, ShapedGlyph};

/// Rasterizes glyphs with `fontdue`. Metrics come out in pixels, so the
/// shaped font's scale is always `1.0`.
///
/// SDF requests rasterize coverage first and convert it with
/// [`sdf_from_coverage`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FontdueShaper;

impl FontdueShaper {
    pub fn new() -> Self {
        Self
    }
}

impl GlyphShaper for FontdueShaper {
    fn shape(&mut self, request: &ShapeRequest) -> Result<ShapedFont> {
        let settings = FontSettings {
            scale: request.size,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(request.font_data, settings).map_err(|e| Error::FontParse(e.to_string()))?;
        let line = font
            .horizontal_line_metrics(request.size)
            .ok_or_else(|| Error::FontParse("font has no horizontal line metrics".into()))?;

        let chars: Vec<Option<char>> = request.range.clone().map(char::from_u32).collect();
        let glyphs = chars
            .iter()
            .map(|c| match c {
                Some(c) => rasterize(&font, *c, &chars, request),
                None => ShapedGlyph {
                    kerning: vec![0.0; chars.len()],
                    ..Default::default()
                },
            })
            .collect();

        Ok(ShapedFont {
            ascent: line.ascent,
            descent: line.descent,
            line_gap: line.line_gap,
            scale: 1.0,
            glyphs,
        })
    }
}

fn rasterize(font: &Font, c: char, chars: &[Option<char>], request: &ShapeRequest) -> ShapedGlyph {
    let (metrics, coverage) = font.rasterize(c, request.size);
    let kerning = chars
        .iter()
        .map(|next| next.and_then(|n| font.horizontal_kern(c, n, request.size)).unwrap_or(0.0))
        .collect();

    let mut glyph = ShapedGlyph {
        width: metrics.width as u32,
        height: metrics.height as u32,
        x_offset: metrics.xmin as f32,
        y_offset: -(metrics.ymin as f32 + metrics.height as f32),
        advance_x: metrics.advance_width,
        left_bearing: metrics.bounds.xmin,
        kerning,
        pixels: coverage,
    };

    if let Some(params) = &request.sdf {
        if glyph.width > 0 && glyph.height > 0 {
            let (pixels, width, height) = sdf_from_coverage(&glyph.pixels, glyph.width, glyph.height, params);
            let pad = params.padding as f32;
            glyph.pixels = pixels;
            glyph.width = width;
            glyph.height = height;
            glyph.x_offset -= pad;
            glyph.y_offset -= pad;
        }
    }
    glyph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let request = ShapeRequest {
            font_data: b"definitely not a font",
            size: 16.0,
            range: 32..127,
            sdf: None,
        };
        assert!(matches!(FontdueShaper::new().shape(&request), Err(Error::FontParse(_))));
    }
}
