//! Path building, offsetting and filling for rectangle payloads.
//!
//! Paths run top-left, top-right, bottom-right, bottom-left, which is
//! clockwise on a y-down screen. Positive offsets move outward.

use crate::color::Color;
use crate::draw::{MeshWriter, Vertex};
use crate::math::{BoundingBox, Vector2};
use crate::widget::{FilledRect, Gradient, StateColors, StrokedRect};

/// Interaction state of the widget being drawn, used for color overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisualState {
    pub hovered: bool,
    pub pressed: bool,
}

/// Triangle orientation of a strip between two rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

/// Coloring and UV mapping for the vertices of one shape.
#[derive(Debug, Clone, Copy)]
pub struct Paint {
    gradient: Gradient,
    state_colors: StateColors,
    state: VisualState,
    bounds: BoundingBox,
}

impl Paint {
    pub fn new(gradient: Gradient, state_colors: StateColors, state: VisualState, bounds: BoundingBox) -> Self {
        Self {
            gradient,
            state_colors,
            state,
            bounds,
        }
    }

    pub fn solid(color: Color, bounds: BoundingBox) -> Self {
        Self::new(Gradient::solid(color), StateColors::default(), VisualState::default(), bounds)
    }

    /// Position remapped into the bounding box, `(0, 0)` at its top-left.
    pub fn uv(&self, pos: Vector2) -> Vector2 {
        let ratio = |v: f32, start: f32, extent: f32| {
            if extent.abs() <= f32::EPSILON {
                0.0
            } else {
                (v - start) / extent
            }
        };
        Vector2::new(
            ratio(pos.x, self.bounds.x, self.bounds.width),
            ratio(pos.y, self.bounds.y, self.bounds.height),
        )
    }

    pub fn color_at(&self, uv: Vector2) -> Color {
        if self.state.pressed && self.state_colors.pressed.a > 0.0 {
            self.state_colors.pressed
        } else if self.state.hovered && self.state_colors.hovered.a > 0.0 {
            self.state_colors.hovered
        } else {
            self.gradient.color_at(uv)
        }
    }

    fn vertex(&self, pos: Vector2, transparent: bool) -> Vertex {
        let uv = self.uv(pos);
        let mut color = self.color_at(uv);
        if transparent {
            color.a = 0.0;
        }
        Vertex::new(pos, uv, color)
    }
}

// ===== Paths =====

/// Largest usable corner radius for `rect`.
pub fn clamp_rounding(rect: BoundingBox, rounding: f32) -> f32 {
    rounding.clamp(0.0, (rect.width.min(rect.height) * 0.5).max(0.0))
}

/// Closed outline of `rect`. With a positive radius each corner becomes an
/// arc of `segments + 1` points; points coinciding with their predecessor are
/// dropped.
pub fn rect_path(rect: BoundingBox, rounding: f32, segments: u32, out: &mut Vec<Vector2>) {
    out.clear();
    let r = clamp_rounding(rect, rounding);
    let (x0, y0) = (rect.x, rect.y);
    let (x1, y1) = (rect.x + rect.width, rect.y + rect.height);

    if r <= 0.0 {
        out.extend_from_slice(&[
            Vector2::new(x0, y0),
            Vector2::new(x1, y0),
            Vector2::new(x1, y1),
            Vector2::new(x0, y1),
        ]);
        return;
    }

    let segments = segments.max(1);
    let corners = [
        (Vector2::new(x0 + r, y0 + r), 180.0f32),
        (Vector2::new(x1 - r, y0 + r), 270.0),
        (Vector2::new(x1 - r, y1 - r), 0.0),
        (Vector2::new(x0 + r, y1 - r), 90.0),
    ];
    for (center, start) in corners {
        for i in 0..=segments {
            let angle = (start + 90.0 * i as f32 / segments as f32).to_radians();
            let p = Vector2::new(center.x + r * angle.cos(), center.y + r * angle.sin());
            push_distinct(out, p);
        }
    }
    if out.len() > 1 && same_point(out[0], out[out.len() - 1]) {
        out.pop();
    }
}

fn same_point(a: Vector2, b: Vector2) -> bool {
    (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
}

fn push_distinct(out: &mut Vec<Vector2>, p: Vector2) {
    if out.last().is_some_and(|last| same_point(*last, p)) {
        return;
    }
    out.push(p);
}

/// Outward normal of the edge `from -> to`.
fn edge_normal(from: Vector2, to: Vector2) -> Vector2 {
    let d = to - from;
    Vector2::new(d.y, -d.x).normalized()
}

/// Moves every point of the closed `path` along the averaged normal of its
/// two edges, scaled so straight edges end up exactly `distance` away.
pub fn offset_path(path: &[Vector2], distance: f32, out: &mut Vec<Vector2>) {
    out.clear();
    let n = path.len();
    if n < 3 {
        out.extend_from_slice(path);
        return;
    }
    for i in 0..n {
        let prev = path[(i + n - 1) % n];
        let cur = path[i];
        let next = path[(i + 1) % n];

        let n0 = edge_normal(prev, cur);
        let n1 = edge_normal(cur, next);
        let avg = (n0 + n1).normalized();
        let reference = if n0 == Vector2::ZERO { n1 } else { n0 };
        let cos = avg.dot(reference);
        let scale = if cos > 0.1 { 1.0 / cos } else { 1.0 };
        out.push(cur + avg * (distance * scale));
    }
}

// ===== Emission =====

fn emit_ring(writer: &mut MeshWriter, ring: &[Vector2], paint: &Paint, transparent: bool) -> u16 {
    let base = writer.vertex_count() as u16;
    for p in ring {
        writer.push_vertex(paint.vertex(*p, transparent));
    }
    base
}

/// Fills a convex closed path. Four-point paths become two triangles, longer
/// ones a fan around their centroid.
pub fn fill_convex(writer: &mut MeshWriter, path: &[Vector2], paint: &Paint) {
    let n = path.len();
    if n < 3 {
        return;
    }
    if n == 4 {
        let b = emit_ring(writer, path, paint, false);
        writer.push_triangle(b, b + 1, b + 2);
        writer.push_triangle(b, b + 2, b + 3);
        return;
    }

    let sum = path.iter().fold(Vector2::ZERO, |acc, p| acc + *p);
    let centroid = sum * (1.0 / n as f32);
    let c = writer.push_vertex(paint.vertex(centroid, false));
    let b = emit_ring(writer, path, paint, false);
    for i in 0..n as u16 {
        let j = (i + 1) % n as u16;
        writer.push_triangle(c, b + i, b + j);
    }
}

/// Triangle strip closing the band between two rings of equal length.
pub fn fill_strip(
    writer: &mut MeshWriter,
    outer: (&[Vector2], &Paint, bool),
    inner: (&[Vector2], &Paint, bool),
    winding: Winding,
) {
    let n = outer.0.len();
    debug_assert_eq!(n, inner.0.len());
    if n < 2 {
        return;
    }
    let o = emit_ring(writer, outer.0, outer.1, outer.2);
    let i = emit_ring(writer, inner.0, inner.1, inner.2);
    for k in 0..n as u16 {
        let l = (k + 1) % n as u16;
        match winding {
            Winding::Clockwise => {
                writer.push_triangle(o + k, o + l, i + l);
                writer.push_triangle(o + k, i + l, i + k);
            }
            Winding::CounterClockwise => {
                writer.push_triangle(o + k, i + l, o + l);
                writer.push_triangle(o + k, i + k, i + l);
            }
        }
    }
}

pub fn filled_rect(writer: &mut MeshWriter, rect: BoundingBox, gfx: &FilledRect, state: VisualState) {
    let paint = Paint::new(gfx.gradient, gfx.state, state, rect);
    let mut path = Vec::new();
    let mut ring = Vec::new();
    let mut fringe = Vec::new();
    rect_path(rect, gfx.rounding, gfx.segments, &mut path);

    if gfx.outline_thickness > 0.0 {
        let outline = Paint::solid(gfx.outline_color, rect);
        offset_path(&path, gfx.outline_thickness, &mut ring);
        fill_strip(
            writer,
            (&ring, &outline, false),
            (&path, &outline, false),
            Winding::Clockwise,
        );
        if gfx.aa_thickness > 0.0 {
            offset_path(&path, gfx.outline_thickness + gfx.aa_thickness, &mut fringe);
            fill_strip(
                writer,
                (&fringe, &outline, true),
                (&ring, &outline, false),
                Winding::CounterClockwise,
            );
        }
    }

    fill_convex(writer, &path, &paint);

    if gfx.outline_thickness <= 0.0 && gfx.aa_thickness > 0.0 {
        offset_path(&path, gfx.aa_thickness, &mut fringe);
        fill_strip(
            writer,
            (&fringe, &paint, true),
            (&path, &paint, false),
            Winding::CounterClockwise,
        );
    }
}

pub fn stroked_rect(writer: &mut MeshWriter, rect: BoundingBox, gfx: &StrokedRect, state: VisualState) {
    if gfx.thickness <= 0.0 {
        return;
    }
    let paint = Paint::new(gfx.gradient, gfx.state, state, rect);
    let mut path = Vec::new();
    let mut inner = Vec::new();
    let mut fringe = Vec::new();
    rect_path(rect, gfx.rounding, gfx.segments, &mut path);
    offset_path(&path, -gfx.thickness, &mut inner);

    fill_strip(
        writer,
        (&path, &paint, false),
        (&inner, &paint, false),
        Winding::Clockwise,
    );

    if gfx.aa_thickness > 0.0 {
        offset_path(&path, gfx.aa_thickness, &mut fringe);
        fill_strip(
            writer,
            (&fringe, &paint, true),
            (&path, &paint, false),
            Winding::CounterClockwise,
        );
        offset_path(&path, -gfx.thickness - gfx.aa_thickness, &mut fringe);
        fill_strip(
            writer,
            (&inner, &paint, false),
            (&fringe, &paint, true),
            Winding::CounterClockwise,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::draw::{BatchKey, DrawBatcher};

    fn capture(f: impl FnOnce(&mut MeshWriter)) -> (Vec<Vertex>, Vec<u16>) {
        let mut batcher = DrawBatcher::new(&EngineConfig {
            buffer_count: 1,
            ..Default::default()
        });
        let buffer = batcher.get_draw_buffer(
            BatchKey {
                clip: BoundingBox::new(0.0, 0.0, 1000.0, 1000.0),
                draw_order: 0,
                user_data: 0,
                font: None,
            },
            None,
        );
        f(&mut batcher.writer(buffer));
        let mut out = (Vec::new(), Vec::new());
        batcher.flush(|b| out = (b.vertices.to_vec(), b.indices.to_vec()));
        out
    }

    fn signed_area(a: Vector2, b: Vector2, c: Vector2) -> f32 {
        (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
    }

    const RECT: BoundingBox = BoundingBox::new(10.0, 20.0, 100.0, 50.0);

    #[test]
    fn sharp_path_is_clockwise_corners() {
        let mut path = Vec::new();
        rect_path(RECT, 0.0, 4, &mut path);
        assert_eq!(
            path,
            vec![
                Vector2::new(10.0, 20.0),
                Vector2::new(110.0, 20.0),
                Vector2::new(110.0, 70.0),
                Vector2::new(10.0, 70.0),
            ]
        );
    }

    #[test]
    fn rounded_path_has_arc_points() {
        let mut path = Vec::new();
        rect_path(RECT, 5.0, 4, &mut path);
        assert_eq!(path.len(), 4 * 5);
        let slack = BoundingBox::new(9.99, 19.99, 100.02, 50.02);
        assert!(path.iter().all(|p| slack.contains(*p)));

        // radius clamps to half the short side: arcs meet on the short edges
        rect_path(RECT, 1000.0, 4, &mut path);
        assert_eq!(path.len(), 4 * 5 - 2);
        assert_eq!(clamp_rounding(RECT, 1000.0), 25.0);
    }

    #[test]
    fn offset_moves_edges_by_distance() {
        let mut path = Vec::new();
        let mut out = Vec::new();
        rect_path(RECT, 0.0, 1, &mut path);
        offset_path(&path, 2.0, &mut out);
        assert!((out[0].x - 8.0).abs() < 1e-4 && (out[0].y - 18.0).abs() < 1e-4);
        assert!((out[2].x - 112.0).abs() < 1e-4 && (out[2].y - 72.0).abs() < 1e-4);

        offset_path(&path, -2.0, &mut out);
        assert!((out[0].x - 12.0).abs() < 1e-4 && (out[0].y - 22.0).abs() < 1e-4);
    }

    #[test]
    fn sharp_fill_is_two_triangles() {
        let gfx = FilledRect {
            gradient: Gradient::solid(Color::WHITE),
            ..Default::default()
        };
        let (vertices, indices) = capture(|w| filled_rect(w, RECT, &gfx, VisualState::default()));
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(vertices[0].uv, Vector2::new(0.0, 0.0));
        assert_eq!(vertices[2].uv, Vector2::new(1.0, 1.0));
    }

    #[test]
    fn rounded_fill_is_a_centroid_fan() {
        let gfx = FilledRect {
            rounding: 5.0,
            segments: 3,
            ..Default::default()
        };
        let (vertices, indices) = capture(|w| filled_rect(w, RECT, &gfx, VisualState::default()));
        let ring = 4 * 4;
        assert_eq!(vertices.len(), ring + 1);
        assert_eq!(indices.len(), ring * 3);
        assert!(indices.chunks(3).all(|t| t[0] == 0));
        assert!((vertices[0].pos - Vector2::new(60.0, 45.0)).length() < 1e-3);
    }

    #[test]
    fn fringe_is_transparent() {
        let gfx = FilledRect {
            gradient: Gradient::solid(Color::WHITE),
            aa_thickness: 1.0,
            ..Default::default()
        };
        let (vertices, indices) = capture(|w| filled_rect(w, RECT, &gfx, VisualState::default()));
        // fill quad, then fringe ring and its inner copy
        assert_eq!(vertices.len(), 4 + 8);
        assert_eq!(indices.len(), 6 + 4 * 6);
        assert!(vertices[4..8].iter().all(|v| v.color.a == 0.0));
        assert!(vertices[8..].iter().all(|v| v.color.a == 1.0));
    }

    #[test]
    fn strip_winding_is_selectable() {
        let mut outer = Vec::new();
        let mut inner = Vec::new();
        rect_path(RECT, 0.0, 1, &mut outer);
        offset_path(&outer, -2.0, &mut inner);
        let paint = Paint::solid(Color::WHITE, RECT);

        for (winding, positive) in [(Winding::Clockwise, true), (Winding::CounterClockwise, false)] {
            let (v, i) = capture(|w| fill_strip(w, (&outer, &paint, false), (&inner, &paint, false), winding));
            for t in i.chunks(3) {
                let area = signed_area(v[t[0] as usize].pos, v[t[1] as usize].pos, v[t[2] as usize].pos);
                assert_eq!(area > 0.0, positive);
            }
        }
    }

    #[test]
    fn stroke_ring_has_inner_edge() {
        let gfx = StrokedRect {
            thickness: 3.0,
            ..Default::default()
        };
        let (vertices, indices) = capture(|w| stroked_rect(w, RECT, &gfx, VisualState::default()));
        assert_eq!(vertices.len(), 8);
        assert_eq!(indices.len(), 24);
        assert!((vertices[4].pos - Vector2::new(13.0, 23.0)).length() < 1e-3);
    }

    #[test]
    fn state_colors_override_gradient() {
        let colors = StateColors {
            hovered: Color::rgb(0.0, 1.0, 0.0),
            pressed: Color::rgb(1.0, 0.0, 0.0),
        };
        let gradient = Gradient {
            start: Color::BLACK,
            end: Color::WHITE,
            direction: crate::widget::GradientDirection::Vertical,
        };
        let idle = Paint::new(gradient, colors, VisualState::default(), RECT);
        assert_eq!(idle.color_at(Vector2::new(0.0, 0.5)), Color::rgb(0.5, 0.5, 0.5));

        let both = VisualState {
            hovered: true,
            pressed: true,
        };
        assert_eq!(Paint::new(gradient, colors, both, RECT).color_at(Vector2::ZERO), colors.pressed);

        let unset_pressed = StateColors {
            pressed: Color::TRANSPARENT,
            ..colors
        };
        assert_eq!(
            Paint::new(gradient, unset_pressed, both, RECT).color_at(Vector2::ZERO),
            colors.hovered
        );
    }
}
