use crate::engine::UiContext;
use crate::math::Vector2;
use crate::widget::{Gfx, Margins, Widget, WidgetFlags, WidgetId, AXIS_FLAGS};

/// Sizing rule for one axis of a widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Fixed size in pixels.
    Absolute(f32),
    /// Fraction of the parent's content size on the same axis.
    Relative(f32),
    /// Share of the parent's content left over after non-fill siblings.
    Fill,
    /// Margins plus the largest child on this axis.
    MaxChildren,
    /// Margins plus every child on this axis, separated by spacing.
    TotalChildren,
    /// The other axis's final size scaled by the given factor.
    CopyOther(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    /// Literal screen-space coordinate, independent of the parent.
    Absolute(f32),
    /// Fraction of the parent's content size, from the parent's content origin.
    Relative(f32),
}

/// Which point of the widget the resolved position refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Start,
    Center,
    End,
}

/// Closure invoked on a widget right after its own size or position was
/// resolved. It may adjust the widget's computed rectangle.
pub type LayoutHook = Box<dyn FnMut(&mut Widget)>;

#[derive(Default)]
pub(crate) struct LayoutHooks {
    pub size_pass: Option<LayoutHook>,
    pub pos_pass: Option<LayoutHook>,
}

/// Parent data the position pass resolves children against.
#[derive(Debug, Clone, Copy)]
struct ParentFrame {
    pos: Vector2,
    margins: Margins,
    content: Vector2,
}

impl ParentFrame {
    fn of(widget: &Widget) -> Self {
        Self {
            pos: widget.final_pos,
            margins: widget.margins,
            content: widget.content_size(),
        }
    }

    fn origin(&self, axis: usize) -> f32 {
        self.pos.axis(axis) + self.margins.start(axis)
    }
}

/// Fill axes of a child. Text takes its measured extent and never fills.
fn fill_axes(widget: &Widget) -> [bool; 2] {
    if matches!(widget.gfx, Gfx::Text(_)) {
        return [false, false];
    }
    [
        widget.flags.contains(WidgetFlags::SIZE_X_FILL),
        widget.flags.contains(WidgetFlags::SIZE_Y_FILL),
    ]
}

fn size_copy_check(widget: &mut Widget) {
    if widget.flags.contains(WidgetFlags::SIZE_X_COPY_Y) {
        let scale = if widget.flags.contains(WidgetFlags::SIZE_X_RELATIVE) {
            widget.size.x
        } else {
            1.0
        };
        widget.final_size.x = widget.final_size.y * scale;
    } else if widget.flags.contains(WidgetFlags::SIZE_Y_COPY_X) {
        let scale = if widget.flags.contains(WidgetFlags::SIZE_Y_RELATIVE) {
            widget.size.y
        } else {
            1.0
        };
        widget.final_size.y = widget.final_size.x * scale;
    }
}

impl UiContext {
    // ===== Size pass =====

    /// Runs both passes over the tree below `root`, which is pinned to
    /// `screen_size` at the origin.
    pub(crate) fn layout(&mut self, root: WidgetId, screen_size: Vector2) {
        let Some(w) = self.widgets.get_mut(root) else {
            return;
        };
        w.final_pos = Vector2::ZERO;
        w.final_size = screen_size;

        self.size_pass_children(root);
        self.distribute_fill(root);
        self.pos_pass_children(root);
    }

    /// Literal resolution of one widget against its parent's content size,
    /// followed by its size hook.
    fn size_pass(&mut self, id: WidgetId, parent_content: Vector2) {
        let Some(w) = self.widgets.get_mut(id) else {
            return;
        };

        if let Gfx::Text(text) = &mut w.gfx {
            if text.dirty {
                text.measured = match text.font().and_then(|f| self.fonts.get(f)) {
                    Some(font) => crate::text::measure(font, text.text(), text.spacing()),
                    None => {
                        log::error!("text widget {:?} has no loaded font", w.debug_name);
                        Vector2::ZERO
                    }
                };
                text.dirty = false;
            }
            w.final_size = text.measured;
        } else {
            for (axis, f) in AXIS_FLAGS.iter().enumerate() {
                let raw = w.size.axis(axis);
                let value = if w
                    .flags
                    .intersects(f.size_copy_other | f.size_fill | f.size_max_children | f.size_total_children)
                {
                    0.0
                } else if w.flags.contains(f.size_relative) {
                    parent_content.axis(axis) * raw
                } else {
                    raw
                };
                *w.final_size.axis_mut(axis) = value;
            }
            size_copy_check(w);
        }

        if let Some(hook) = self
            .layout_hooks
            .get_mut(&id)
            .and_then(|h| h.size_pass.as_mut())
        {
            hook(w);
        }
    }

    /// Sizes every child of `id` and its subtree, bottom-up.
    fn size_pass_children(&mut self, id: WidgetId) {
        let Some(parent) = self.widgets.get(id) else {
            return;
        };
        let content = parent.content_size();
        let count = parent.children.len();

        for i in 0..count {
            let child = self.widgets[id].children[i];
            self.size_pass(child, content);
            self.size_pass_children(child);
            self.size_pass_post(child);
        }
    }

    /// Children-driven sizing once the children have their literal sizes:
    /// max/total aggregation, the copy-other re-check, then fill shares.
    fn size_pass_post(&mut self, id: WidgetId) {
        let Some(w) = self.widgets.get(id) else {
            return;
        };
        if matches!(w.gfx, Gfx::Text(_)) {
            return;
        }

        let mut aggregated = [None::<f32>; 2];
        for (axis, f) in AXIS_FLAGS.iter().enumerate() {
            let max = w.flags.contains(f.size_max_children);
            let total = w.flags.contains(f.size_total_children);
            if !max && !total {
                continue;
            }

            let mut value = 0.0f32;
            for child in &w.children {
                let Some(c) = self.widgets.get(*child) else {
                    continue;
                };
                let size = c.final_size.axis(axis);
                if max {
                    value = value.max(size);
                } else {
                    value += size + w.spacing;
                }
            }
            if total && !w.children.is_empty() {
                value -= w.spacing;
            }
            aggregated[axis] = Some(w.margins.total(axis) + value);
        }

        let Some(w) = self.widgets.get_mut(id) else {
            return;
        };
        for (axis, value) in aggregated.into_iter().enumerate() {
            if let Some(value) = value {
                *w.final_size.axis_mut(axis) = value;
            }
        }
        // aggregation may have produced the axis being copied
        size_copy_check(w);

        self.distribute_fill(id);
    }

    /// Hands the content space left by non-fill children to the children
    /// that fill an axis, then re-sizes the subtrees of those children.
    fn distribute_fill(&mut self, id: WidgetId) {
        let Some(parent) = self.widgets.get(id) else {
            return;
        };
        let content = parent.content_size();
        let spacing = parent.spacing;
        let count = parent.children.len();

        let mut fill_count = [0usize; 2];
        let mut non_fill_total = [0.0f32; 2];
        for child in &parent.children {
            let Some(w) = self.widgets.get(*child) else {
                continue;
            };
            let fills = fill_axes(w);
            for axis in 0..2 {
                if fills[axis] {
                    fill_count[axis] += 1;
                } else {
                    non_fill_total[axis] += w.final_size.axis(axis);
                }
            }
        }

        if fill_count == [0, 0] {
            return;
        }

        let gaps = count.saturating_sub(1) as f32 * spacing;
        let mut shares = [0.0f32; 2];
        for axis in 0..2 {
            if fill_count[axis] > 0 {
                shares[axis] =
                    (content.axis(axis) - non_fill_total[axis] - gaps) / fill_count[axis] as f32;
            }
        }

        for i in 0..count {
            let child = self.widgets[id].children[i];
            let Some(w) = self.widgets.get_mut(child) else {
                continue;
            };
            let fills = fill_axes(w);
            if !fills[0] && !fills[1] {
                continue;
            }
            for axis in 0..2 {
                if fills[axis] {
                    *w.final_size.axis_mut(axis) = shares[axis];
                }
            }
            size_copy_check(w);
            log::trace!("fill {:?} -> {:?}", w.debug_name, w.final_size);

            // its children were sized against the literal (zero) extent
            self.size_pass_children(child);
            self.size_pass_post(child);
        }
    }

    // ===== Position pass =====

    fn pos_pass(&mut self, id: WidgetId, parent: ParentFrame) {
        let Some(w) = self.widgets.get_mut(id) else {
            return;
        };

        for (axis, f) in AXIS_FLAGS.iter().enumerate() {
            let raw = w.pos.axis(axis);
            let mut value = if w.flags.contains(f.pos_relative) {
                parent.origin(axis) + raw * parent.content.axis(axis)
            } else {
                raw
            };
            if w.flags.contains(f.anchor_center) {
                value -= w.final_size.axis(axis) * 0.5;
            } else if w.flags.contains(f.anchor_end) {
                value -= w.final_size.axis(axis);
            }
            *w.final_pos.axis_mut(axis) = value;
        }

        if let Some(hook) = self
            .layout_hooks
            .get_mut(&id)
            .and_then(|h| h.pos_pass.as_mut())
        {
            hook(w);
        }
    }

    /// Positions the children of an already-positioned widget, arranges them
    /// along its row or column axis, applies its scroll offset and recurses.
    fn pos_pass_children(&mut self, id: WidgetId) {
        let Some(parent) = self.widgets.get(id) else {
            return;
        };
        let frame = ParentFrame::of(parent);
        let spacing = parent.spacing;
        let scroll = parent.scroll_offset;
        let main_axis = parent.child_positioning.axis();
        let count = parent.children.len();

        for i in 0..count {
            let child = self.widgets[id].children[i];
            self.pos_pass(child, frame);
        }

        let mut cursor = main_axis.map(|axis| frame.origin(axis));
        for i in 0..count {
            let child = self.widgets[id].children[i];
            let Some(w) = self.widgets.get_mut(child) else {
                continue;
            };
            if let (Some(axis), Some(at)) = (main_axis, cursor.as_mut()) {
                *w.final_pos.axis_mut(axis) = *at;
                *at += w.final_size.axis(axis) + spacing;
            }
            w.final_pos += scroll;
        }

        for i in 0..count {
            let child = self.widgets[id].children[i];
            self.pos_pass_children(child);
        }
    }
}

/// Shorthand macro for [`Sizing::Absolute`].
#[macro_export]
macro_rules! absolute {
    ($val:expr) => {
        $crate::layout::Sizing::Absolute($val)
    };
}

/// Shorthand macro for [`Sizing::Relative`].
/// The value has to be in range `0.0..=1.0`.
#[macro_export]
macro_rules! relative {
    ($fraction:expr) => {{
        const _: () = assert!(
            $fraction >= 0.0 && $fraction <= 1.0,
            "Relative value must be between 0.0 and 1.0 inclusive!"
        );
        $crate::layout::Sizing::Relative($fraction)
    }};
}

/// Shorthand macro for [`Sizing::Fill`].
#[macro_export]
macro_rules! fill {
    () => {
        $crate::layout::Sizing::Fill
    };
}

/// Shorthand macro for [`Sizing::CopyOther`]. Defaults the factor to `1.0` if omitted.
#[macro_export]
macro_rules! copy_other {
    ($scale:expr) => {
        $crate::layout::Sizing::CopyOther($scale)
    };
    () => {
        $crate::copy_other!(1.0)
    };
}
