//! [`GlyphShaper`](crate::font::GlyphShaper) implementations backed by font
//! rasterizer crates.

#[cfg(feature = "fontdue")]
pub mod fontdue;
