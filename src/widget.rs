//! Widget record stored in the context's pool: tree links, layout rules and the
//! graphics payload.

use bitflags::bitflags;

use crate::color::Color;
use crate::font::FontId;
use crate::layout::{Anchor, Position, Sizing};
use crate::math::{BoundingBox, Vector2};
use crate::pool::Handle;

/// Widgets are addressed by pool handle; the parent link is one too, so the
/// tree never holds pointers into the pool.
pub type WidgetId = Handle;

bitflags! {
    /// Layout rules per axis. A cleared bit means the absolute variant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct WidgetFlags: u32 {
        const POS_X_RELATIVE = 1 << 0;
        const POS_Y_RELATIVE = 1 << 1;
        const SIZE_X_RELATIVE = 1 << 2;
        const SIZE_Y_RELATIVE = 1 << 3;
        const SIZE_X_COPY_Y = 1 << 4;
        const SIZE_Y_COPY_X = 1 << 5;
        const SIZE_X_TOTAL_CHILDREN = 1 << 6;
        const SIZE_X_MAX_CHILDREN = 1 << 7;
        const SIZE_Y_TOTAL_CHILDREN = 1 << 8;
        const SIZE_Y_MAX_CHILDREN = 1 << 9;
        const SIZE_X_FILL = 1 << 10;
        const SIZE_Y_FILL = 1 << 11;
        const POS_X_ANCHOR_CENTER = 1 << 12;
        const POS_X_ANCHOR_END = 1 << 13;
        const POS_Y_ANCHOR_CENTER = 1 << 14;
        const POS_Y_ANCHOR_END = 1 << 15;

        const POS_X_MASK = Self::POS_X_RELATIVE.bits()
            | Self::POS_X_ANCHOR_CENTER.bits()
            | Self::POS_X_ANCHOR_END.bits();
        const POS_Y_MASK = Self::POS_Y_RELATIVE.bits()
            | Self::POS_Y_ANCHOR_CENTER.bits()
            | Self::POS_Y_ANCHOR_END.bits();
        const SIZE_X_MASK = Self::SIZE_X_RELATIVE.bits()
            | Self::SIZE_X_COPY_Y.bits()
            | Self::SIZE_X_TOTAL_CHILDREN.bits()
            | Self::SIZE_X_MAX_CHILDREN.bits()
            | Self::SIZE_X_FILL.bits();
        const SIZE_Y_MASK = Self::SIZE_Y_RELATIVE.bits()
            | Self::SIZE_Y_COPY_X.bits()
            | Self::SIZE_Y_TOTAL_CHILDREN.bits()
            | Self::SIZE_Y_MAX_CHILDREN.bits()
            | Self::SIZE_Y_FILL.bits();
    }
}

/// Per-axis flag lookup, `0` for x and `1` for y.
pub(crate) struct AxisFlags {
    pub pos_relative: WidgetFlags,
    pub anchor_center: WidgetFlags,
    pub anchor_end: WidgetFlags,
    pub size_relative: WidgetFlags,
    pub size_copy_other: WidgetFlags,
    pub size_total_children: WidgetFlags,
    pub size_max_children: WidgetFlags,
    pub size_fill: WidgetFlags,
}

pub(crate) const AXIS_FLAGS: [AxisFlags; 2] = [
    AxisFlags {
        pos_relative: WidgetFlags::POS_X_RELATIVE,
        anchor_center: WidgetFlags::POS_X_ANCHOR_CENTER,
        anchor_end: WidgetFlags::POS_X_ANCHOR_END,
        size_relative: WidgetFlags::SIZE_X_RELATIVE,
        size_copy_other: WidgetFlags::SIZE_X_COPY_Y,
        size_total_children: WidgetFlags::SIZE_X_TOTAL_CHILDREN,
        size_max_children: WidgetFlags::SIZE_X_MAX_CHILDREN,
        size_fill: WidgetFlags::SIZE_X_FILL,
    },
    AxisFlags {
        pos_relative: WidgetFlags::POS_Y_RELATIVE,
        anchor_center: WidgetFlags::POS_Y_ANCHOR_CENTER,
        anchor_end: WidgetFlags::POS_Y_ANCHOR_END,
        size_relative: WidgetFlags::SIZE_Y_RELATIVE,
        size_copy_other: WidgetFlags::SIZE_Y_COPY_X,
        size_total_children: WidgetFlags::SIZE_Y_TOTAL_CHILDREN,
        size_max_children: WidgetFlags::SIZE_Y_MAX_CHILDREN,
        size_fill: WidgetFlags::SIZE_Y_FILL,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Margins {
    pub const fn new(top: f32, bottom: f32, left: f32, right: f32) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    pub const fn all(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Leading margin on an axis (left or top).
    #[inline]
    pub fn start(&self, axis: usize) -> f32 {
        if axis == 0 {
            self.left
        } else {
            self.top
        }
    }

    /// Both margins on an axis combined.
    #[inline]
    pub fn total(&self, axis: usize) -> f32 {
        if axis == 0 {
            self.left + self.right
        } else {
            self.top + self.bottom
        }
    }
}

/// How a widget arranges its own children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildPositioning {
    #[default]
    None,
    Row,
    Column,
}

impl ChildPositioning {
    /// Axis children are laid out along.
    pub(crate) fn axis(self) -> Option<usize> {
        match self {
            ChildPositioning::None => None,
            ChildPositioning::Row => Some(0),
            ChildPositioning::Column => Some(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientDirection {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Gradient {
    pub start: Color,
    pub end: Color,
    pub direction: GradientDirection,
}

impl Gradient {
    pub const fn solid(color: Color) -> Self {
        Self {
            start: color,
            end: color,
            direction: GradientDirection::Horizontal,
        }
    }

    /// Color at a UV coordinate of the shape's bounding box.
    pub fn color_at(&self, uv: Vector2) -> Color {
        let t = match self.direction {
            GradientDirection::Horizontal => uv.x,
            GradientDirection::Vertical => uv.y,
        };
        self.start.lerp(self.end, t)
    }
}

/// Colors that replace the gradient while the widget is pressed or hovered.
/// An override with zero alpha is treated as unset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateColors {
    pub hovered: Color,
    pub pressed: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilledRect {
    pub gradient: Gradient,
    pub state: StateColors,
    pub outline_color: Color,
    pub outline_thickness: f32,
    pub aa_thickness: f32,
    pub rounding: f32,
    pub segments: u32,
    pub clip_children: bool,
}

impl Default for FilledRect {
    fn default() -> Self {
        Self {
            gradient: Gradient::default(),
            state: StateColors::default(),
            outline_color: Color::TRANSPARENT,
            outline_thickness: 0.0,
            aa_thickness: 0.0,
            rounding: 0.0,
            segments: 8,
            clip_children: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokedRect {
    pub gradient: Gradient,
    pub state: StateColors,
    pub thickness: f32,
    pub aa_thickness: f32,
    pub rounding: f32,
    pub segments: u32,
    pub clip_children: bool,
}

impl Default for StrokedRect {
    fn default() -> Self {
        Self {
            gradient: Gradient::default(),
            state: StateColors::default(),
            thickness: 1.0,
            aa_thickness: 0.0,
            rounding: 0.0,
            segments: 8,
            clip_children: false,
        }
    }
}

/// Text payload. Mutations go through the setters so the cached extent is
/// re-measured on the next size pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextGfx {
    text: String,
    font: Option<FontId>,
    spacing: f32,
    pub gradient: Gradient,
    pub state: StateColors,
    pub(crate) measured: Vector2,
    pub(crate) dirty: bool,
}

impl TextGfx {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font(&self) -> Option<FontId> {
        self.font
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = text.into();
        self.dirty = true;
        self
    }

    pub fn set_font(&mut self, font: FontId) -> &mut Self {
        self.font = Some(font);
        self.dirty = true;
        self
    }

    pub fn set_spacing(&mut self, spacing: f32) -> &mut Self {
        self.spacing = spacing;
        self.dirty = true;
        self
    }

    /// Forces re-measurement, e.g. after the font's glyph metrics changed.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gfx {
    #[default]
    None,
    FilledRect(FilledRect),
    StrokedRect(StrokedRect),
    Text(TextGfx),
}

impl Gfx {
    pub fn clip_children(&self) -> bool {
        match self {
            Gfx::FilledRect(r) => r.clip_children,
            Gfx::StrokedRect(r) => r.clip_children,
            Gfx::None | Gfx::Text(_) => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Widget {
    pub(crate) parent: Option<WidgetId>,
    pub(crate) children: Vec<WidgetId>,
    pub flags: WidgetFlags,
    pub margins: Margins,
    /// Gap between consecutive children in row/column positioning and in
    /// children-total sizing.
    pub spacing: f32,
    pub child_positioning: ChildPositioning,
    /// Raw position; a pixel offset or a fraction depending on the flags.
    pub pos: Vector2,
    /// Raw size; pixels, a fraction or ignored depending on the flags.
    pub size: Vector2,
    pub(crate) final_pos: Vector2,
    pub(crate) final_size: Vector2,
    /// Added to every child's final position after the position pass.
    pub scroll_offset: Vector2,
    pub receive_input: bool,
    pub gfx: Gfx,
    pub draw_order: i32,
    /// Opaque tag handed to the renderer with every batch this widget draws into.
    pub user_data: u64,
    pub debug_name: String,
    pub(crate) hovered: bool,
    pub(crate) pressed_buttons: u32,
}

impl Widget {
    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    /// Valid after a completed [`build`](crate::UiContext::build).
    pub fn final_pos(&self) -> Vector2 {
        self.final_pos
    }

    pub fn final_size(&self) -> Vector2 {
        self.final_size
    }

    /// Overrides the computed position. Meant for layout hooks.
    pub fn set_final_pos(&mut self, pos: Vector2) {
        self.final_pos = pos;
    }

    /// Overrides the computed size. Meant for layout hooks.
    pub fn set_final_size(&mut self, size: Vector2) {
        self.final_size = size;
    }

    pub fn final_rect(&self) -> BoundingBox {
        BoundingBox::from_pos_size(self.final_pos, self.final_size)
    }

    /// Size available to children: final size minus margins.
    pub fn content_size(&self) -> Vector2 {
        Vector2::new(
            self.final_size.x - self.margins.total(0),
            self.final_size.y - self.margins.total(1),
        )
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_buttons != 0
    }

    pub fn is_pressed_by(&self, button: u32) -> bool {
        button < 32 && self.pressed_buttons & (1 << button) != 0
    }

    pub fn set_pos_x(&mut self, position: Position, anchor: Anchor) -> &mut Self {
        self.set_pos_axis(0, position, anchor);
        self
    }

    pub fn set_pos_y(&mut self, position: Position, anchor: Anchor) -> &mut Self {
        self.set_pos_axis(1, position, anchor);
        self
    }

    pub fn set_width(&mut self, sizing: Sizing) -> &mut Self {
        self.set_size_axis(0, sizing);
        self
    }

    pub fn set_height(&mut self, sizing: Sizing) -> &mut Self {
        self.set_size_axis(1, sizing);
        self
    }

    fn set_pos_axis(&mut self, axis: usize, position: Position, anchor: Anchor) {
        let f = &AXIS_FLAGS[axis];
        let mask = if axis == 0 {
            WidgetFlags::POS_X_MASK
        } else {
            WidgetFlags::POS_Y_MASK
        };
        self.flags.remove(mask);
        let value = match position {
            Position::Absolute(v) => v,
            Position::Relative(v) => {
                self.flags.insert(f.pos_relative);
                v
            }
        };
        *self.pos.axis_mut(axis) = value;
        match anchor {
            Anchor::Start => {}
            Anchor::Center => self.flags.insert(f.anchor_center),
            Anchor::End => self.flags.insert(f.anchor_end),
        }
    }

    fn set_size_axis(&mut self, axis: usize, sizing: Sizing) {
        let f = &AXIS_FLAGS[axis];
        let mask = if axis == 0 {
            WidgetFlags::SIZE_X_MASK
        } else {
            WidgetFlags::SIZE_Y_MASK
        };
        self.flags.remove(mask);
        let value = match sizing {
            Sizing::Absolute(v) => v,
            Sizing::Relative(v) => {
                self.flags.insert(f.size_relative);
                v
            }
            Sizing::Fill => {
                self.flags.insert(f.size_fill);
                0.0
            }
            Sizing::MaxChildren => {
                self.flags.insert(f.size_max_children);
                0.0
            }
            Sizing::TotalChildren => {
                self.flags.insert(f.size_total_children);
                0.0
            }
            Sizing::CopyOther(scale) => {
                self.flags.insert(f.size_copy_other | f.size_relative);
                scale
            }
        };
        *self.size.axis_mut(axis) = value;
    }

    /// Replaces the payload with a default filled rect and returns it.
    pub fn set_gfx_filled_rect(&mut self) -> &mut FilledRect {
        self.gfx = Gfx::FilledRect(FilledRect::default());
        match &mut self.gfx {
            Gfx::FilledRect(r) => r,
            _ => unreachable!(),
        }
    }

    pub fn set_gfx_stroked_rect(&mut self) -> &mut StrokedRect {
        self.gfx = Gfx::StrokedRect(StrokedRect::default());
        match &mut self.gfx {
            Gfx::StrokedRect(r) => r,
            _ => unreachable!(),
        }
    }

    pub fn set_gfx_text(&mut self) -> &mut TextGfx {
        self.gfx = Gfx::Text(TextGfx {
            dirty: true,
            ..Default::default()
        });
        match &mut self.gfx {
            Gfx::Text(t) => t,
            _ => unreachable!(),
        }
    }

    pub fn filled_rect_mut(&mut self) -> Option<&mut FilledRect> {
        match &mut self.gfx {
            Gfx::FilledRect(r) => Some(r),
            _ => None,
        }
    }

    pub fn stroked_rect_mut(&mut self) -> Option<&mut StrokedRect> {
        match &mut self.gfx {
            Gfx::StrokedRect(r) => Some(r),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextGfx> {
        match &mut self.gfx {
            Gfx::Text(t) => Some(t),
            _ => None,
        }
    }
}
