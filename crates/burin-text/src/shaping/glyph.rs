//! Shaped glyph model

use unicode_script::Script;

/// A shaped glyph tagged with everything line breaking and assembly need.
///
/// Advances and offsets are in font units; `cluster` is the byte offset of
/// the first source rune in the full logical text. Cluster values stay valid
/// across the directional reversals applied for line breaking.
#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    /// Glyph ID in the font; for embedded objects this is the object index.
    pub id: u16,
    /// Byte offset into the full logical text.
    pub cluster: u32,
    /// Horizontal advance (font units)
    pub x_advance: i32,
    /// Vertical advance (font units, negative for downward layout)
    pub y_advance: i32,
    /// X offset from the pen position (font units)
    pub x_offset: i32,
    /// Y offset from the pen position (font units)
    pub y_offset: i32,
    /// First source rune the glyph represents
    pub ch: char,
    /// Font size in pixels the glyph was shaped at
    pub size: f32,
    /// Units per em of the source font
    pub units_per_em: u16,
    /// Script of the run the glyph came from
    pub script: Script,
    /// True when the glyph advances along the block (vertical) axis
    pub vertical: bool,
}

impl Glyph {
    /// Advance along the line axis in pixels.
    pub fn advance(&self) -> f32 {
        let upem = self.units_per_em.max(1) as f32;
        if self.vertical {
            -self.y_advance as f32 * self.size / upem
        } else {
            self.x_advance as f32 * self.size / upem
        }
    }

    /// Scale factor from font units to pixels.
    pub fn scale(&self) -> f32 {
        self.size / self.units_per_em.max(1) as f32
    }
}

/// Sum of glyph advances in pixels.
pub fn glyphs_width(glyphs: &[Glyph]) -> f32 {
    glyphs.iter().map(Glyph::advance).sum()
}
