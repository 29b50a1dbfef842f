//! Adapters turning flushed draw batches into draw calls of a graphics
//! library.

#[cfg(feature = "macroquad")]
pub mod macroquad;
#[cfg(feature = "macroquad")]
pub use self::macroquad::MacroquadRenderer;
