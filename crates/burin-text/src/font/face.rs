//! Font face: a font at a size with styling used by layout and rendering

use std::sync::Arc;

use tiny_skia::{Color, Path, PathBuilder, Rect};

use super::{Font, FontStyle, FontVariant, Hinting};
use crate::shaping::{Direction, Glyph};
use crate::Result;

/// Fill paint of a face or decoration. Compared structurally when merging
/// decoration paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
        }
    }
}

impl Paint {
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            color: Color::from_rgba8(r, g, b, a),
        }
    }
}

/// Text decoration drawn as a path alongside the glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    Underline,
    Overline,
    LineThrough,
}

impl Decoration {
    /// Build the decoration path for a run of the given width, in baseline
    /// coordinates (y-up, baseline at y = 0).
    pub fn decorate(self, metrics: &ScaledMetrics, width: f32) -> Option<Path> {
        if width <= 0.0 {
            return None;
        }
        let thickness = metrics.underline_thickness;
        let center = match self {
            Decoration::Underline => metrics.underline_position,
            Decoration::Overline => metrics.ascent,
            Decoration::LineThrough => metrics.x_height / 2.0,
        };
        let rect = Rect::from_ltrb(
            0.0,
            center - thickness / 2.0,
            width,
            center + thickness / 2.0,
        )?;
        Some(PathBuilder::from_rect(rect))
    }
}

/// Face metrics scaled to pixels. Ascent and descent are positive distances
/// from the baseline; underline position is negative below the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
    pub x_height: f32,
    pub cap_height: f32,
    pub underline_position: f32,
    pub underline_thickness: f32,
}

/// Line extents of a face: ascent/descent plus line-gap padded top/bottom.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineHeights {
    pub top: f32,
    pub ascent: f32,
    pub descent: f32,
    pub bottom: f32,
}

/// A font face: a shared font at a pixel size with fill, style and
/// decoration settings. Faces are cheap to clone and compared structurally
/// (same font by identity, same settings).
#[derive(Debug, Clone)]
pub struct FontFace {
    pub font: Arc<Font>,
    /// Size in pixels per em
    pub size: f32,
    pub style: FontStyle,
    pub variant: FontVariant,
    pub fill: Paint,
    pub decorations: Vec<Decoration>,
    /// Forced direction; `None` lets the shaper resolve it per script.
    pub direction: Option<Direction>,
    /// BCP 47 language tag handed to the shaper
    pub language: Option<String>,
    pub hinting: Hinting,
    /// Horizontal nudge in pixels applied when walking spans
    pub x_offset: f32,
    /// Vertical nudge in pixels applied when walking spans
    pub y_offset: f32,
}

impl PartialEq for FontFace {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.font, &other.font)
            && self.size == other.size
            && self.style == other.style
            && self.variant == other.variant
            && self.fill == other.fill
            && self.decorations == other.decorations
            && self.direction == other.direction
            && self.language == other.language
            && self.hinting == other.hinting
            && self.x_offset == other.x_offset
            && self.y_offset == other.y_offset
    }
}

impl FontFace {
    pub fn new(font: Arc<Font>, size: f32) -> Self {
        Self {
            font,
            size,
            style: FontStyle::default(),
            variant: FontVariant::default(),
            fill: Paint::default(),
            decorations: Vec::new(),
            direction: None,
            language: None,
            hinting: Hinting::default(),
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_variant(mut self, variant: FontVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_fill(mut self, fill: Paint) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decorations.push(decoration);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_hinting(mut self, hinting: Hinting) -> Self {
        self.hinting = hinting;
        self
    }

    /// Pixels per em the shaper runs at for this face.
    pub fn ppem(&self) -> f32 {
        self.size
    }

    /// Scale factor from font units to pixels.
    pub fn scale(&self) -> f32 {
        self.size / self.font.units_per_em().max(1) as f32
    }

    pub fn metrics(&self) -> ScaledMetrics {
        let m = self.font.metrics();
        let scale = self.scale();
        let ascent = m.ascender as f32 * scale;
        let x_height = if m.x_height > 0 {
            m.x_height as f32 * scale
        } else {
            ascent / 2.0
        };
        let cap_height = if m.cap_height > 0 {
            m.cap_height as f32 * scale
        } else {
            ascent
        };
        let underline_thickness = if m.underline_thickness > 0 {
            m.underline_thickness as f32 * scale
        } else {
            self.size / 14.0
        };
        let underline_position = if m.underline_position != 0 {
            m.underline_position as f32 * scale
        } else {
            -self.size / 10.0
        };
        ScaledMetrics {
            ascent,
            descent: -(m.descender as f32) * scale,
            line_gap: m.line_gap as f32 * scale,
            x_height,
            cap_height,
            underline_position,
            underline_thickness,
        }
    }

    /// Ascent/descent and line-gap padded top/bottom extents.
    pub fn heights(&self) -> LineHeights {
        let m = self.metrics();
        LineHeights {
            top: m.ascent + m.line_gap,
            ascent: m.ascent,
            descent: m.descent,
            bottom: m.descent + m.line_gap,
        }
    }

    /// Sum of shaped advances in pixels.
    pub fn text_width(&self, glyphs: &[Glyph]) -> f32 {
        crate::shaping::glyphs_width(glyphs)
    }

    /// Convert shaped glyphs to a single outline path in baseline
    /// coordinates (y-up, pen starting at the origin). Returns `Ok(None)`
    /// when none of the glyphs have outlines (e.g. whitespace only).
    pub fn to_path(&self, glyphs: &[Glyph]) -> Result<Option<Path>> {
        let mut pen = OutlinePen::new();
        let mut x = 0.0f32;
        let mut y = 0.0f32;
        for glyph in glyphs {
            let scale = glyph.scale();
            pen.place(
                scale,
                x + glyph.x_offset as f32 * scale,
                y + glyph.y_offset as f32 * scale,
            );
            self.font.outline_glyph(glyph.id, &mut pen)?;
            x += glyph.x_advance as f32 * scale;
            y += glyph.y_advance as f32 * scale;
        }
        Ok(pen.finish())
    }
}

/// Converts ttf-parser outlines to a tiny-skia path, scaling font units to
/// pixels and translating to the pen position.
struct OutlinePen {
    builder: PathBuilder,
    scale: f32,
    dx: f32,
    dy: f32,
}

impl OutlinePen {
    fn new() -> Self {
        Self {
            builder: PathBuilder::new(),
            scale: 1.0,
            dx: 0.0,
            dy: 0.0,
        }
    }

    fn place(&mut self, scale: f32, dx: f32, dy: f32) {
        self.scale = scale;
        self.dx = dx;
        self.dy = dy;
    }

    fn tx(&self, x: f32) -> f32 {
        self.dx + x * self.scale
    }

    fn ty(&self, y: f32) -> f32 {
        self.dy + y * self.scale
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl ttf_parser::OutlineBuilder for OutlinePen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(self.tx(x), self.ty(y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.tx(x), self.ty(y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder
            .quad_to(self.tx(x1), self.ty(y1), self.tx(x), self.ty(y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(
            self.tx(x1),
            self.ty(y1),
            self.tx(x2),
            self.ty(y2),
            self.tx(x),
            self.ty(y),
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
