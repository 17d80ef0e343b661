//! Font model and the external font/shaper boundary

pub mod face;
pub mod sfnt;

use std::fmt;
use std::sync::Arc;

pub use face::{Decoration, FontFace, Paint, ScaledMetrics};
pub use sfnt::SfntFont;

use crate::shaping::Direction;
use crate::Result;
use unicode_script::Script;

/// Font-wide metrics in font units. Descender and underline position are
/// negative below the baseline, following the SFNT convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub x_height: i16,
    pub cap_height: i16,
    pub underline_position: i16,
    pub underline_thickness: i16,
}

/// An OpenType feature setting applied during shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub tag: [u8; 4],
    pub value: u32,
}

impl Feature {
    pub fn new(tag: &[u8; 4], value: u32) -> Self {
        Self { tag: *tag, value }
    }
}

/// Hinting mode of a face; drives vertical pixel-grid snapping when text is
/// rendered at a known resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hinting {
    #[default]
    None,
    Vertical,
    Full,
}

/// Font style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

/// Font variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontVariant {
    #[default]
    Normal,
    SmallCaps,
    Subscript,
    Superscript,
}

/// A glyph as returned by the external shaper. Clusters are byte offsets
/// relative to the shaped substring; the shaping adapter rebases them onto
/// the full logical text.
#[derive(Debug, Clone, Copy)]
pub struct ShapedGlyph {
    pub id: u16,
    pub cluster: u32,
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
}

/// Result of shaping one script/face homogeneous run.
#[derive(Debug, Clone)]
pub struct ShapeOutput {
    pub glyphs: Vec<ShapedGlyph>,
    /// The direction the run was actually shaped with.
    pub direction: Direction,
}

/// External collaborator boundary: font tables plus the glyph shaper.
///
/// The production implementation is [`SfntFont`] (ttf-parser + rustybuzz);
/// tests and exotic integrations may provide their own. Implementations must
/// be safe under concurrent reads.
pub trait FontBackend: fmt::Debug + Send + Sync {
    /// Family or full name used for sorting and deduplication.
    fn name(&self) -> &str;

    /// Font-unit metrics.
    fn metrics(&self) -> &FontMetrics;

    /// Glyph index for a character, 0 (.notdef) when absent.
    fn glyph_index(&self, ch: char) -> u16;

    /// Horizontal advance of a glyph in font units.
    fn glyph_advance(&self, glyph_id: u16) -> u16;

    /// Write the outline of a glyph into `sink` in font units, y-up.
    /// Returns `Ok(false)` when the glyph has no outline.
    fn outline_glyph(
        &self,
        glyph_id: u16,
        sink: &mut dyn ttf_parser::OutlineBuilder,
    ) -> Result<bool>;

    /// Shape `text` at `ppem` pixels per em. `direction` of `None` lets the
    /// shaper resolve it from the script. Returned clusters are byte offsets
    /// into `text`.
    fn shape(
        &self,
        text: &str,
        ppem: f32,
        direction: Option<Direction>,
        script: Script,
        language: Option<&str>,
        features: &[Feature],
    ) -> Result<ShapeOutput>;
}

/// A font: a backend plus the feature settings shared by all its faces.
///
/// Fonts are shared read-only between faces, texts and callers via `Arc`.
#[derive(Debug)]
pub struct Font {
    backend: Box<dyn FontBackend>,
    features: Vec<Feature>,
}

impl Font {
    pub fn new(backend: Box<dyn FontBackend>) -> Self {
        Self {
            backend,
            features: Vec::new(),
        }
    }

    /// Parse an SFNT font (TTF/OTF) from raw data.
    pub fn from_data(data: Vec<u8>, index: u32) -> Result<Self> {
        Ok(Self::new(Box::new(SfntFont::from_data(data, index)?)))
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    pub fn metrics(&self) -> &FontMetrics {
        self.backend.metrics()
    }

    pub fn units_per_em(&self) -> u16 {
        self.backend.metrics().units_per_em
    }

    pub fn glyph_index(&self, ch: char) -> u16 {
        self.backend.glyph_index(ch)
    }

    pub fn glyph_advance(&self, glyph_id: u16) -> u16 {
        self.backend.glyph_advance(glyph_id)
    }

    pub fn outline_glyph(
        &self,
        glyph_id: u16,
        sink: &mut dyn ttf_parser::OutlineBuilder,
    ) -> Result<bool> {
        self.backend.outline_glyph(glyph_id, sink)
    }

    pub fn shape(
        &self,
        text: &str,
        ppem: f32,
        direction: Option<Direction>,
        script: Script,
        language: Option<&str>,
    ) -> Result<ShapeOutput> {
        self.backend
            .shape(text, ppem, direction, script, language, &self.features)
    }

    /// Create a face referencing this font at the given pixel size.
    pub fn face(self: &Arc<Self>, size: f32) -> FontFace {
        FontFace::new(self.clone(), size)
    }
}
