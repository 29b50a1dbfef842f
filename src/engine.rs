//! The context owning the widget tree, the per-frame geometry arena and the
//! font atlases.

use rustc_hash::FxHashMap;

use crate::config::EngineConfig;
use crate::draw::{ClipStack, DrawBatch, DrawBatcher};
use crate::font::{FontId, FontManager, GlyphShaper};
use crate::input::{InputCallbacks, InputEvent, InputResult, InputState};
use crate::layout::LayoutHooks;
use crate::math::{BoundingBox, Vector2};
use crate::pool::Pool;
use crate::widget::{Gfx, Widget, WidgetId};

// ============================================================================
// UiContext
// ============================================================================

/// Everything a frame needs: widgets, hooks, input state, the draw batcher and
/// the fonts.
///
/// A frame is `build` followed by `flush`. Batches produced by one `build` are
/// only valid until the next one.
pub struct UiContext {
    config: EngineConfig,
    pub(crate) widgets: Pool<Widget>,
    root: WidgetId,
    pub(crate) screen_size: Vector2,
    pub(crate) layout_hooks: FxHashMap<WidgetId, LayoutHooks>,
    pub(crate) input: InputState,
    pub(crate) input_callbacks: FxHashMap<WidgetId, InputCallbacks>,
    pub(crate) clip_stack: ClipStack,
    pub(crate) batcher: DrawBatcher,
    pub(crate) fonts: FontManager,
}

impl UiContext {
    /// Sizes every fixed-capacity store from `config` and allocates an empty
    /// root widget.
    pub fn new(config: EngineConfig, shaper: impl GlyphShaper + 'static) -> Self {
        let mut widgets: Pool<Widget> = Pool::with_byte_budget(config.widget_buffer_size);
        let root = widgets.allocate(Widget {
            debug_name: "root".to_owned(),
            ..Default::default()
        });
        log::debug!(
            "context created: {} widgets, {} batches of {} vertices",
            widgets.capacity(),
            config.buffer_count,
            config.vertices_per_batch()
        );

        Self {
            widgets,
            root,
            screen_size: Vector2::ZERO,
            layout_hooks: FxHashMap::default(),
            input: InputState::default(),
            input_callbacks: FxHashMap::default(),
            clip_stack: ClipStack::new(BoundingBox::default()),
            batcher: DrawBatcher::new(&config),
            fonts: FontManager::new(config.atlas, config.max_fonts, Box::new(shaper)),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn root(&self) -> WidgetId {
        self.root
    }

    /// Makes another live widget the root laid out and drawn by [`build`].
    ///
    /// [`build`]: UiContext::build
    pub fn set_root(&mut self, root: WidgetId) {
        assert!(self.widgets.is_alive(root), "setting a dead widget as root");
        self.root = root;
    }

    // ===== Tree =====

    /// A detached widget with default settings.
    ///
    /// # Panics
    /// When the widget pool is full.
    pub fn allocate(&mut self) -> WidgetId {
        self.widgets.allocate(Widget::default())
    }

    /// Frees `id` and its whole subtree, children first, detaching it from its
    /// parent and dropping every callback registered on the freed widgets.
    ///
    /// # Panics
    /// When `id` is not alive.
    pub fn deallocate(&mut self, id: WidgetId) {
        assert!(self.widgets.is_alive(id), "deallocating dead widget {id:?}");
        if let Some(parent) = self.widgets[id].parent {
            if let Some(p) = self.widgets.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: WidgetId) {
        let children = std::mem::take(&mut self.widgets[id].children);
        for child in children {
            self.free_subtree(child);
        }

        self.layout_hooks.remove(&id);
        self.input_callbacks.remove(&id);
        self.input.pressed.retain(|(p, _)| *p != id);
        if let Some(i) = self.input.layers.iter().position(|l| l.root == id) {
            log::warn!("input layer {} lost its root", self.input.layers[i].priority);
            self.input.layers.remove(i);
        }
        if id == self.root {
            log::warn!("root widget deallocated");
        }

        let widget = self.widgets.deallocate(id);
        log::trace!("freed widget {id:?} {:?}", widget.debug_name);
    }

    /// Appends `child` to `parent`'s children, detaching it from its previous
    /// parent first.
    ///
    /// # Panics
    /// When either handle is dead, or `child` is `parent` or one of its
    /// ancestors.
    pub fn add_child(&mut self, parent: WidgetId, child: WidgetId) {
        assert!(self.widgets.is_alive(parent), "adding a child to dead widget {parent:?}");
        assert!(self.widgets.is_alive(child), "adding dead widget {child:?} as a child");
        assert_ne!(parent, child, "a widget cannot be its own child");
        assert!(
            !self.is_ancestor(child, parent),
            "adding ancestor {child:?} under its descendant {parent:?}"
        );

        if let Some(old) = self.widgets[child].parent {
            self.remove_child(old, child);
        }
        self.widgets[child].parent = Some(parent);
        self.widgets[parent].children.push(child);
    }

    fn is_ancestor(&self, ancestor: WidgetId, mut id: WidgetId) -> bool {
        while let Some(parent) = self.widgets.get(id).and_then(|w| w.parent) {
            if parent == ancestor {
                return true;
            }
            id = parent;
        }
        false
    }

    /// Detaches `child` from `parent` without freeing it. Returns whether it
    /// was a child of `parent`.
    pub fn remove_child(&mut self, parent: WidgetId, child: WidgetId) -> bool {
        let Some(p) = self.widgets.get_mut(parent) else {
            return false;
        };
        let before = p.children.len();
        p.children.retain(|c| *c != child);
        let removed = p.children.len() != before;
        if removed {
            if let Some(c) = self.widgets.get_mut(child) {
                c.parent = None;
            }
        }
        removed
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.get(id)
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.widgets.get_mut(id)
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn fonts(&self) -> &FontManager {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontManager {
        &mut self.fonts
    }

    /// Unloads `font` and marks every text payload using it for
    /// re-measurement, so those labels collapse to zero on the next build.
    ///
    /// # Panics
    /// When `font` is stale.
    pub fn unload_font(&mut self, font: FontId) {
        self.fonts.unload_font(font);
        for (_, w) in self.widgets.iter_mut() {
            if let Gfx::Text(text) = &mut w.gfx {
                if text.font() == Some(font) {
                    text.mark_dirty();
                }
            }
        }
    }

    // ===== Callbacks =====

    /// Runs right after `id`'s own size is resolved, before its children are
    /// sized.
    pub fn on_size_pass(&mut self, id: WidgetId, f: impl FnMut(&mut Widget) + 'static) {
        self.layout_hooks.entry(id).or_default().size_pass = Some(Box::new(f));
    }

    /// Runs right after `id`'s own position is resolved.
    pub fn on_pos_pass(&mut self, id: WidgetId, f: impl FnMut(&mut Widget) + 'static) {
        self.layout_hooks.entry(id).or_default().pos_pass = Some(Box::new(f));
    }

    pub fn on_hover_begin(&mut self, id: WidgetId, f: impl FnMut(WidgetId) + 'static) {
        self.input_callbacks.entry(id).or_default().hover_begin = Some(Box::new(f));
    }

    pub fn on_hover_end(&mut self, id: WidgetId, f: impl FnMut(WidgetId) + 'static) {
        self.input_callbacks.entry(id).or_default().hover_end = Some(Box::new(f));
    }

    /// Receives the clicking button.
    pub fn on_click(&mut self, id: WidgetId, f: impl FnMut(WidgetId, u32) + 'static) {
        self.input_callbacks.entry(id).or_default().click = Some(Box::new(f));
    }

    pub fn on_drag(&mut self, id: WidgetId, f: impl FnMut(WidgetId, Vector2, Vector2, u32) + 'static) {
        self.input_callbacks.entry(id).or_default().drag = Some(Box::new(f));
    }

    /// Custom handler offered every event; returning
    /// [`InputResult::Handled`] stops the broadcast.
    pub fn on_input(&mut self, id: WidgetId, f: impl FnMut(WidgetId, &InputEvent) -> InputResult + 'static) {
        self.input_callbacks.entry(id).or_default().input = Some(Box::new(f));
    }

    // ===== Frame =====

    /// Lays out the tree below the root against `screen_size` and tessellates
    /// it into draw batches, discarding the previous frame's batches.
    ///
    /// # Panics
    /// When the root widget has been freed, or a frame needs more draw batches
    /// or vertices than configured.
    pub fn build(&mut self, screen_size: Vector2) {
        assert!(self.widgets.is_alive(self.root), "no root widget");
        self.screen_size = screen_size;
        self.batcher.reset();
        self.clip_stack.reset(BoundingBox::from_pos_size(Vector2::ZERO, screen_size));

        self.layout(self.root, screen_size);
        self.draw_pass(self.root);
        log::trace!("frame built into {} batches", self.batcher.batch_count());
    }

    /// Hands the batches of the last [`build`] to `f`, ordered by draw order.
    ///
    /// [`build`]: UiContext::build
    pub fn flush(&mut self, f: impl FnMut(&DrawBatch)) {
        self.batcher.flush(f);
    }
}
