//! A single import for everything building a UI needs.
//!
//! ```rust
//! use tessera::prelude::*;
//! ```

// Core types
pub use crate::color::Color;
pub use crate::config::{AtlasConfig, EngineConfig};
pub use crate::engine::UiContext;
pub use crate::widgets::Checkbox;
pub use crate::math::{BoundingBox, Vector2};
pub use crate::widget::{Widget, WidgetFlags, WidgetId};

// Layout
pub use crate::layout::{Anchor, Position, Sizing};
pub use crate::widget::{ChildPositioning, Margins};

// Macros
pub use crate::{absolute, copy_other, fill, relative};

// Graphics payloads
pub use crate::widget::{FilledRect, Gfx, Gradient, GradientDirection, StateColors, StrokedRect, TextGfx};

// Fonts
pub use crate::font::{FontId, GlyphShaper, SdfParams};

// Rendering
pub use crate::draw::{DrawBatch, Vertex};

// Input
pub use crate::input::{InputAction, InputEvent, InputResult, KeyEvent, MouseEvent, WheelEvent};

#[cfg(feature = "fontdue")]
pub use crate::shapers::fontdue::FontdueShaper;

#[cfg(feature = "macroquad")]
pub use crate::renderers::MacroquadRenderer;
