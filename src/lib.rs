//! Renderer-agnostic widget layout and geometry generation.
//!
//! A [`UiContext`] owns a tree of widgets stored in a fixed-capacity pool.
//! Each frame, [`UiContext::build`] sizes and positions the tree, then
//! tessellates every visible widget into draw batches the host receives
//! through [`UiContext::flush`]. Fonts are shaped by a pluggable
//! [`GlyphShaper`](font::GlyphShaper) and packed into shared glyph atlases;
//! input events forwarded by the host drive hover, click and drag callbacks.

pub mod atlas;
pub mod color;
pub mod config;
pub mod draw;
pub mod engine;
pub mod errors;
pub mod font;
pub mod input;
pub mod layout;
pub mod math;
pub mod pool;
pub mod prelude;
pub mod renderers;
pub mod shapers;
pub mod tessellate;
pub mod text;
pub mod widget;
mod widgets;

pub use color::Color;
pub use engine::UiContext;
pub use widgets::Checkbox;
pub use errors::{Error, Result};
