use std::path::PathBuf;

/// Recoverable failures. Fatal preconditions (capacity exhaustion, stale
/// handles passed to mutating operations) panic instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read font file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The shaping collaborator rejected the font bytes.
    #[error("failed to parse font: {0}")]
    FontParse(String),
    #[error("invalid codepoint range {start}..{end}")]
    GlyphRange { start: u32, end: u32 },
    #[error("glyphs need {required}px but the atlas only has {available}px")]
    AtlasTooSmall { required: u32, available: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
