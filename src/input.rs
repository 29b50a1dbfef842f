//! Hit-testing, hover and press tracking, and the per-widget handler
//! broadcast, driven by events the host forwards.

use crate::engine::UiContext;
use crate::math::{BoundingBox, Vector2};
use crate::widget::WidgetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Pressed,
    Released,
    Repeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub action: InputAction,
    pub button: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub action: InputAction,
    pub key: u32,
    pub scan_code: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub amount: f32,
}

/// What a custom handler registered with [`UiContext::on_input`] receives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Mouse(MouseEvent),
    Key(KeyEvent),
    Wheel(WheelEvent),
    MouseMove(Vector2),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum InputResult {
    Handled,
    NotHandled,
}

impl InputResult {
    pub fn is_handled(self) -> bool {
        self == InputResult::Handled
    }

    fn or(self, other: InputResult) -> InputResult {
        if self.is_handled() {
            self
        } else {
            other
        }
    }
}

pub type HoverCallback = Box<dyn FnMut(WidgetId)>;
pub type ClickCallback = Box<dyn FnMut(WidgetId, u32)>;
/// Receives the cursor position, its movement since the last event and the
/// button holding the widget.
pub type DragCallback = Box<dyn FnMut(WidgetId, Vector2, Vector2, u32)>;
pub type InputCallback = Box<dyn FnMut(WidgetId, &InputEvent) -> InputResult>;

#[derive(Default)]
pub(crate) struct InputCallbacks {
    pub hover_begin: Option<HoverCallback>,
    pub hover_end: Option<HoverCallback>,
    pub click: Option<ClickCallback>,
    pub drag: Option<DragCallback>,
    pub input: Option<InputCallback>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct InputLayer {
    pub priority: i32,
    pub root: WidgetId,
}

#[derive(Debug, Default)]
pub(crate) struct InputState {
    /// Ascending by priority.
    pub layers: Vec<InputLayer>,
    pub mouse_position: Vector2,
    /// Widgets holding a button since the last release.
    pub pressed: Vec<(WidgetId, u32)>,
}

impl UiContext {
    // ===== Layers =====

    /// Registers `root` as an independently hit-tested tree. Layers are
    /// processed in ascending priority; reusing a priority replaces the layer.
    pub fn add_input_layer(&mut self, priority: i32, root: WidgetId) {
        let layers = &mut self.input.layers;
        match layers.binary_search_by_key(&priority, |l| l.priority) {
            Ok(i) => {
                log::warn!("input layer {priority} already registered, replacing it");
                layers[i].root = root;
            }
            Err(i) => layers.insert(i, InputLayer { priority, root }),
        }
    }

    pub fn remove_input_layer(&mut self, priority: i32) {
        let layers = &mut self.input.layers;
        match layers.binary_search_by_key(&priority, |l| l.priority) {
            Ok(i) => {
                layers.remove(i);
            }
            Err(_) => log::error!("no input layer with priority {priority}"),
        }
    }

    // ===== Queries =====

    pub fn mouse_position(&self) -> Vector2 {
        self.input.mouse_position
    }

    pub fn is_hovered(&self, id: WidgetId) -> bool {
        self.widgets.get(id).is_some_and(|w| w.hovered)
    }

    pub fn is_pressed(&self, id: WidgetId) -> bool {
        self.widgets.get(id).is_some_and(|w| w.pressed_buttons != 0)
    }

    /// Topmost widget under `point` in the subtree of `root` that accepts
    /// input. Later children win over earlier ones and over their parent;
    /// subtrees are pruned by clipping ancestors.
    pub fn find_widget_at(&self, root: WidgetId, point: Vector2) -> Option<WidgetId> {
        self.find_at(root, point, self.screen_rect())
    }

    fn find_at(&self, id: WidgetId, point: Vector2, clip: BoundingBox) -> Option<WidgetId> {
        let w = self.widgets.get(id)?;
        let rect = w.final_rect();
        let child_clip = if w.gfx.clip_children() {
            clip.intersect(&rect)
        } else {
            clip
        };

        if child_clip.contains(point) {
            for child in w.children.iter().rev() {
                if let Some(hit) = self.find_at(*child, point, child_clip) {
                    return Some(hit);
                }
            }
        }

        (w.receive_input && rect.contains(point) && clip.contains(point)).then_some(id)
    }

    fn screen_rect(&self) -> BoundingBox {
        BoundingBox::from_pos_size(Vector2::ZERO, self.screen_size)
    }

    fn first_hit(&self, point: Vector2) -> Option<WidgetId> {
        self.input
            .layers
            .iter()
            .find_map(|layer| self.find_at(layer.root, point, self.screen_rect()))
    }

    // ===== Dispatch =====

    /// Updates hover state across every layer, drags pressed widgets and
    /// broadcasts the move to custom handlers.
    pub fn on_mouse_move(&mut self, position: Vector2) -> InputResult {
        let delta = position - self.input.mouse_position;
        self.input.mouse_position = position;
        if self.input.layers.is_empty() {
            log::error!("mouse move dispatched without input layers");
            return InputResult::NotHandled;
        }

        let mut transitions = Vec::new();
        let screen = self.screen_rect();
        for i in 0..self.input.layers.len() {
            let root = self.input.layers[i].root;
            self.update_hover(root, position, screen, &mut transitions);
        }
        for (id, entered) in transitions {
            let callbacks = self.input_callbacks.get_mut(&id);
            let cb = callbacks.and_then(|c| if entered { c.hover_begin.as_mut() } else { c.hover_end.as_mut() });
            if let Some(cb) = cb {
                cb(id);
            }
        }

        for &(id, button) in &self.input.pressed {
            if let Some(cb) = self.input_callbacks.get_mut(&id).and_then(|c| c.drag.as_mut()) {
                cb(id, position, delta, button);
            }
        }

        self.dispatch_custom(&InputEvent::MouseMove(position))
    }

    fn update_hover(&mut self, id: WidgetId, point: Vector2, clip: BoundingBox, transitions: &mut Vec<(WidgetId, bool)>) {
        let Some(w) = self.widgets.get_mut(id) else {
            return;
        };
        let rect = w.final_rect();
        let hovered = w.receive_input && rect.contains(point) && clip.contains(point);
        if hovered != w.hovered {
            w.hovered = hovered;
            transitions.push((id, hovered));
        }

        let child_clip = if w.gfx.clip_children() {
            clip.intersect(&rect)
        } else {
            clip
        };
        for i in 0..self.widgets[id].children.len() {
            let child = self.widgets[id].children[i];
            self.update_hover(child, point, child_clip, transitions);
        }
    }

    /// Presses mark the widget under the cursor; a release over the widget
    /// holding the same button clicks it. Every release clears all presses.
    pub fn on_mouse_event(&mut self, event: MouseEvent) -> InputResult {
        if self.input.layers.is_empty() {
            log::error!("mouse event dispatched without input layers");
            return InputResult::NotHandled;
        }

        let hit = self.first_hit(self.input.mouse_position);
        let mut result = InputResult::NotHandled;
        match event.action {
            InputAction::Pressed => {
                if let Some(id) = hit {
                    if event.button < 32 {
                        self.widgets[id].pressed_buttons |= 1 << event.button;
                    } else {
                        log::warn!("mouse button {} cannot be tracked", event.button);
                    }
                    self.input.pressed.push((id, event.button));
                    result = InputResult::Handled;
                }
            }
            InputAction::Released => {
                if let Some(id) = hit {
                    if self.input.pressed.contains(&(id, event.button)) {
                        if let Some(cb) = self.input_callbacks.get_mut(&id).and_then(|c| c.click.as_mut()) {
                            cb(id, event.button);
                        }
                        result = InputResult::Handled;
                    }
                }
                for (id, _) in self.input.pressed.drain(..) {
                    if let Some(w) = self.widgets.get_mut(id) {
                        w.pressed_buttons = 0;
                    }
                }
            }
            InputAction::Repeated => {}
        }

        result.or(self.dispatch_custom(&InputEvent::Mouse(event)))
    }

    pub fn on_key_event(&mut self, event: KeyEvent) -> InputResult {
        if self.input.layers.is_empty() {
            log::error!("key event dispatched without input layers");
            return InputResult::NotHandled;
        }
        self.dispatch_custom(&InputEvent::Key(event))
    }

    pub fn on_mouse_wheel_event(&mut self, event: WheelEvent) -> InputResult {
        if self.input.layers.is_empty() {
            log::error!("wheel event dispatched without input layers");
            return InputResult::NotHandled;
        }
        self.dispatch_custom(&InputEvent::Wheel(event))
    }

    /// Offers the event to custom handlers layer by layer, depth first, until
    /// one handles it. Clipping is not consulted.
    fn dispatch_custom(&mut self, event: &InputEvent) -> InputResult {
        for i in 0..self.input.layers.len() {
            let root = self.input.layers[i].root;
            if self.dispatch_to(root, event).is_handled() {
                return InputResult::Handled;
            }
        }
        InputResult::NotHandled
    }

    fn dispatch_to(&mut self, id: WidgetId, event: &InputEvent) -> InputResult {
        if !self.widgets.is_alive(id) {
            return InputResult::NotHandled;
        }
        if let Some(cb) = self.input_callbacks.get_mut(&id).and_then(|c| c.input.as_mut()) {
            if cb(id, event).is_handled() {
                return InputResult::Handled;
            }
        }
        for i in 0..self.widgets[id].children.len() {
            let child = self.widgets[id].children[i];
            if self.dispatch_to(child, event).is_handled() {
                return InputResult::Handled;
            }
        }
        InputResult::NotHandled
    }
}
