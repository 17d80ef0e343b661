//! Burin Text - Text Shaping and Layout Engine
//!
//! This crate provides the text subsystem of the burin vector graphics
//! toolkit:
//! - Font face model over a pluggable font backend (ttf-parser + rustybuzz)
//! - Script itemization over externally computed bidi embedding levels
//! - Shaping of script/face homogeneous runs into glyphs
//! - Optimal line breaking (Knuth-Plass) over glyph advances
//! - Line assembly with alignment, justification, vertical writing modes
//!   and right-to-left reordering
//! - An immutable laid-out text model consumed by rendering backends

pub mod font;
pub mod shaping;
pub mod layout;
pub mod rich;
pub mod text;

#[cfg(test)]
pub(crate) mod testutil;

pub use font::face::{Decoration, LineHeights};
pub use font::{
    Feature, Font, FontBackend, FontFace, FontMetrics, FontStyle, FontVariant, Hinting, Paint,
    ScaledMetrics, SfntFont, ShapeOutput, ShapedGlyph,
};
pub use layout::{BreakPolicy, LayoutStyle, TextAlign, TextOrientation, VerticalAlign, WritingMode};
pub use rich::RichText;
pub use shaping::{Direction, Glyph, Rotation, Script, ScriptItem, VerticalTuning};
pub use text::{Drawable, Line, Rect, Renderer, Resolution, SpanContent, SpanObject, Text, TextSpan};

/// Text layout error types
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("Failed to parse font: {0}")]
    FontParsing(String),

    #[error("Shaping failed: {0}")]
    ShapingFailed(String),

    #[error("Glyph outline conversion failed: {0}")]
    PathConversion(String),

    #[error("Object rendering failed: {0}")]
    ObjectRender(String),
}

pub type Result<T> = std::result::Result<T, TextError>;
