//! Ready-made widget configurations. Every helper returns a detached widget;
//! attach it with [`UiContext::add_child`].

use std::cell::Cell;
use std::rc::Rc;

use crate::color::Color;
use crate::engine::UiContext;
use crate::font::FontId;
use crate::layout::{Anchor, Position, Sizing};
use crate::widget::{Gfx, Gradient, WidgetId};

/// A checkbox built by [`UiContext::widget_checkbox`]. Clones share the
/// checked state.
#[derive(Debug, Clone)]
pub struct Checkbox {
    pub id: WidgetId,
    checked: Rc<Cell<bool>>,
}

impl Checkbox {
    pub fn is_checked(&self) -> bool {
        self.checked.get()
    }

    /// Takes effect on the next build.
    pub fn set_checked(&self, checked: bool) {
        self.checked.set(checked);
    }
}

impl UiContext {
    /// Full-width bar `thickness` pixels tall.
    pub fn widget_horizontal_divider(&mut self, thickness: f32, color: Color) -> WidgetId {
        let id = self.allocate();
        let w = &mut self.widgets[id];
        w.debug_name = "HorizontalDivider".to_owned();
        w.set_pos_x(Position::Relative(0.0), Anchor::Start)
            .set_width(Sizing::Relative(1.0))
            .set_height(Sizing::Absolute(thickness))
            .set_gfx_filled_rect()
            .gradient = Gradient::solid(color);
        id
    }

    /// Full-height bar `thickness` pixels wide.
    pub fn widget_vertical_divider(&mut self, thickness: f32, color: Color) -> WidgetId {
        let id = self.allocate();
        let w = &mut self.widgets[id];
        w.debug_name = "VerticalDivider".to_owned();
        w.set_pos_y(Position::Relative(0.0), Anchor::Start)
            .set_height(Sizing::Relative(1.0))
            .set_width(Sizing::Absolute(thickness))
            .set_gfx_filled_rect()
            .gradient = Gradient::solid(color);
        id
    }

    /// Single-line text sized to its measured extent.
    pub fn widget_label(&mut self, font: FontId, text: &str, color: Color) -> WidgetId {
        let id = self.allocate();
        let w = &mut self.widgets[id];
        w.debug_name = "Label".to_owned();
        let gfx = w.set_gfx_text();
        gfx.set_font(font).set_text(text);
        gfx.gradient = Gradient::solid(color);
        id
    }

    /// Full-width, `height` pixels tall input-receiving rectangle with a
    /// centered label as its only child.
    pub fn widget_button(
        &mut self,
        height: f32,
        font: FontId,
        text: &str,
        background: Color,
        foreground: Color,
    ) -> WidgetId {
        let button = self.allocate();
        {
            let w = &mut self.widgets[button];
            w.debug_name = "Button".to_owned();
            w.receive_input = true;
            w.set_pos_x(Position::Relative(0.0), Anchor::Start)
                .set_width(Sizing::Relative(1.0))
                .set_height(Sizing::Absolute(height))
                .set_gfx_filled_rect()
                .gradient = Gradient::solid(background);
        }

        let label = self.widget_label(font, text, foreground);
        self.widgets[label]
            .set_pos_x(Position::Relative(0.5), Anchor::Center)
            .set_pos_y(Position::Relative(0.5), Anchor::Center);
        self.add_child(button, label);
        button
    }

    /// Square `size` box that flips its checked state on every click. The
    /// check mark is a centered child drawn in `foreground` while checked.
    pub fn widget_checkbox(&mut self, size: f32, background: Color, foreground: Color) -> Checkbox {
        let id = self.allocate();
        {
            let w = &mut self.widgets[id];
            w.debug_name = "Checkbox".to_owned();
            w.receive_input = true;
            w.set_width(Sizing::Absolute(size))
                .set_height(Sizing::Absolute(size))
                .set_gfx_filled_rect()
                .gradient = Gradient::solid(background);
        }

        let mark = self.allocate();
        {
            let w = &mut self.widgets[mark];
            w.debug_name = "CheckMark".to_owned();
            w.set_pos_x(Position::Relative(0.5), Anchor::Center)
                .set_pos_y(Position::Relative(0.5), Anchor::Center)
                .set_width(Sizing::Relative(0.6))
                .set_height(Sizing::Relative(0.6));
        }
        self.add_child(id, mark);

        let checked = Rc::new(Cell::new(false));
        let state = checked.clone();
        self.on_click(id, move |_, _| state.set(!state.get()));
        let state = checked.clone();
        self.on_size_pass(mark, move |w| {
            if !state.get() {
                w.gfx = Gfx::None;
            } else if w.filled_rect_mut().is_none() {
                w.set_gfx_filled_rect().gradient = Gradient::solid(foreground);
            }
        });

        Checkbox { id, checked }
    }
}
