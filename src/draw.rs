//! Per-frame geometry storage: the clip stack, the batch arena and the draw
//! walk that fills it.

use bytemuck::{Pod, Zeroable};

use crate::atlas::AtlasId;
use crate::color::Color;
use crate::config::EngineConfig;
use crate::engine::UiContext;
use crate::font::FontId;
use crate::math::{BoundingBox, Vector2};
use crate::tessellate::{self, VisualState};
use crate::widget::{Gfx, WidgetId};

#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub pos: Vector2,
    pub uv: Vector2,
    pub color: Color,
}

impl Vertex {
    pub const fn new(pos: Vector2, uv: Vector2, color: Color) -> Self {
        Self { pos, uv, color }
    }
}

// ===== Clip stack =====

/// Nested clip rectangles, each intersected with the one below it. The bottom
/// entry is the screen and cannot be popped.
#[derive(Debug, Clone)]
pub struct ClipStack {
    stack: Vec<BoundingBox>,
}

impl ClipStack {
    pub fn new(screen: BoundingBox) -> Self {
        Self {
            stack: vec![screen],
        }
    }

    pub(crate) fn reset(&mut self, screen: BoundingBox) {
        self.stack.clear();
        self.stack.push(screen);
    }

    /// Pushes `rect` intersected with the current clip and reports whether the
    /// result is degenerate, in which case nothing inside it can be visible.
    /// The entry is pushed either way and must be popped by the caller.
    pub fn push(&mut self, rect: BoundingBox) -> bool {
        let clipped = self.current().intersect(&rect);
        self.stack.push(clipped);
        clipped.is_degenerate()
    }

    /// # Panics
    /// When only the screen entry is left.
    pub fn pop(&mut self) {
        assert!(self.stack.len() > 1, "popping the root clip entry");
        self.stack.pop();
    }

    pub fn current(&self) -> BoundingBox {
        // never empty, the root entry cannot be popped
        self.stack[self.stack.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

// ===== Draw batcher =====

/// Everything geometry has to agree on to share a draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchKey {
    pub clip: BoundingBox,
    pub draw_order: i32,
    pub user_data: u64,
    pub font: Option<FontId>,
}

impl BatchKey {
    fn matches(&self, other: &BatchKey) -> bool {
        self.draw_order == other.draw_order
            && self.user_data == other.user_data
            && self.font == other.font
            && self.clip.approx_eq(&other.clip)
    }
}

#[derive(Debug, Clone)]
struct DrawBuffer {
    key: BatchKey,
    atlas: Option<AtlasId>,
    partition: usize,
    vertex_count: usize,
    index_count: usize,
}

/// One draw call handed to the renderer. The slices borrow the batch arena
/// and are only valid inside the flush callback.
#[derive(Debug)]
pub struct DrawBatch<'a> {
    pub clip: BoundingBox,
    pub draw_order: i32,
    pub user_data: u64,
    pub font: Option<FontId>,
    /// Atlas texture the font's glyphs live in.
    pub atlas: Option<AtlasId>,
    pub vertices: &'a [Vertex],
    /// Triangle list, indexing into `vertices`.
    pub indices: &'a [u16],
}

/// Fixed vertex and index arenas split into equal partitions, one per batch.
#[derive(Debug)]
pub struct DrawBatcher {
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
    vertices_per_batch: usize,
    indices_per_batch: usize,
    buffer_count: usize,
    buffers: Vec<DrawBuffer>,
}

impl DrawBatcher {
    pub fn new(config: &EngineConfig) -> Self {
        let buffer_count = config.buffer_count.max(1);
        let vertices_per_batch = config.vertices_per_batch();
        let indices_per_batch = config.indices_per_batch();
        Self {
            vertices: vec![Vertex::zeroed(); vertices_per_batch * buffer_count],
            indices: vec![0; indices_per_batch * buffer_count],
            vertices_per_batch,
            indices_per_batch,
            buffer_count,
            buffers: Vec::with_capacity(buffer_count),
        }
    }

    /// Drops every batch of the previous frame.
    pub fn reset(&mut self) {
        self.buffers.clear();
    }

    pub fn batch_count(&self) -> usize {
        self.buffers.len()
    }

    /// Index of the batch matching `key`, opening a new one if none does.
    ///
    /// # Panics
    /// When a new batch is needed and every partition is taken.
    pub fn get_draw_buffer(&mut self, key: BatchKey, atlas: Option<AtlasId>) -> usize {
        if let Some(i) = self.buffers.iter().position(|b| b.key.matches(&key)) {
            return i;
        }
        assert!(
            self.buffers.len() < self.buffer_count,
            "all {} draw buffers are in use",
            self.buffer_count
        );
        self.buffers.push(DrawBuffer {
            key,
            atlas,
            partition: self.buffers.len(),
            vertex_count: 0,
            index_count: 0,
        });
        self.buffers.len() - 1
    }

    pub fn writer(&mut self, buffer: usize) -> MeshWriter<'_> {
        let b = &mut self.buffers[buffer];
        let vstart = b.partition * self.vertices_per_batch;
        let istart = b.partition * self.indices_per_batch;
        MeshWriter {
            vertices: &mut self.vertices[vstart..vstart + self.vertices_per_batch],
            indices: &mut self.indices[istart..istart + self.indices_per_batch],
            vertex_count: &mut b.vertex_count,
            index_count: &mut b.index_count,
        }
    }

    /// Hands every non-empty batch to `f`, ascending by draw order. Batches
    /// sharing an order keep their creation order.
    pub fn flush(&mut self, mut f: impl FnMut(&DrawBatch)) {
        self.buffers.sort_by_key(|b| b.key.draw_order);
        for b in &self.buffers {
            if b.index_count == 0 {
                continue;
            }
            let vstart = b.partition * self.vertices_per_batch;
            let istart = b.partition * self.indices_per_batch;
            f(&DrawBatch {
                clip: b.key.clip,
                draw_order: b.key.draw_order,
                user_data: b.key.user_data,
                font: b.key.font,
                atlas: b.atlas,
                vertices: &self.vertices[vstart..vstart + b.vertex_count],
                indices: &self.indices[istart..istart + b.index_count],
            });
        }
    }
}

/// Append-only view of one batch partition. Indices are local to the batch.
pub struct MeshWriter<'a> {
    vertices: &'a mut [Vertex],
    indices: &'a mut [u16],
    vertex_count: &'a mut usize,
    index_count: &'a mut usize,
}

impl MeshWriter<'_> {
    pub fn vertex_count(&self) -> usize {
        *self.vertex_count
    }

    /// # Panics
    /// When the partition is full.
    pub fn push_vertex(&mut self, vertex: Vertex) -> u16 {
        let at = *self.vertex_count;
        assert!(
            at < self.vertices.len(),
            "draw batch vertex capacity of {} exceeded",
            self.vertices.len()
        );
        self.vertices[at] = vertex;
        *self.vertex_count += 1;
        at as u16
    }

    /// # Panics
    /// When the partition is full.
    pub fn push_triangle(&mut self, a: u16, b: u16, c: u16) {
        let at = *self.index_count;
        assert!(
            at + 3 <= self.indices.len(),
            "draw batch index capacity of {} exceeded",
            self.indices.len()
        );
        self.indices[at..at + 3].copy_from_slice(&[a, b, c]);
        *self.index_count += 3;
    }
}

// ===== Draw walk =====

impl UiContext {
    /// Emits geometry for `id` and its visible descendants.
    pub(crate) fn draw_pass(&mut self, id: WidgetId) {
        let Some(w) = self.widgets.get(id) else {
            return;
        };
        let rect = w.final_rect();
        let state = VisualState {
            hovered: w.hovered,
            pressed: w.pressed_buttons != 0,
        };
        let mut key = BatchKey {
            clip: self.clip_stack.current(),
            draw_order: w.draw_order,
            user_data: w.user_data,
            font: None,
        };

        match &w.gfx {
            Gfx::None => {}
            Gfx::FilledRect(r) => {
                let buffer = self.batcher.get_draw_buffer(key, None);
                tessellate::filled_rect(&mut self.batcher.writer(buffer), rect, r, state);
            }
            Gfx::StrokedRect(r) => {
                let buffer = self.batcher.get_draw_buffer(key, None);
                tessellate::stroked_rect(&mut self.batcher.writer(buffer), rect, r, state);
            }
            Gfx::Text(t) => match t.font().and_then(|f| self.fonts.get(f).map(|font| (f, font))) {
                Some((font_id, font)) => {
                    key.font = Some(font_id);
                    let buffer = self.batcher.get_draw_buffer(key, Some(font.atlas()));
                    crate::text::emit(&mut self.batcher.writer(buffer), font, t, rect, state);
                }
                // reported once by the size pass when the payload was re-measured
                None => log::trace!("skipping text {:?} without a font", w.debug_name),
            },
        }

        let clip_children = w.gfx.clip_children();
        if clip_children && self.clip_stack.push(rect) {
            self.clip_stack.pop();
            return;
        }

        let count = w.children.len();
        for i in 0..count {
            let child = self.widgets[id].children[i];
            let visible = self
                .widgets
                .get(child)
                .is_some_and(|c| c.final_rect().overlaps(&self.clip_stack.current()));
            if visible {
                self.draw_pass(child);
            }
        }

        if clip_children {
            self.clip_stack.pop();
        }
    }
}
