//! Script analysis and glyph shaping

pub mod adapter;
pub mod glyph;
pub mod itemize;
pub mod script;

pub use adapter::VerticalTuning;
pub use glyph::{glyphs_width, Glyph};
pub use itemize::{itemize, ScriptItem};
pub use script::{
    embedding_levels, is_paragraph_separator, is_spaceless_script, is_vertical_script,
    script_rotation,
};

/// Unicode script property, as looked up per rune.
pub use unicode_script::Script;

/// Text direction along the inline axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

impl Direction {
    /// True for directions that run against the growing coordinate axis and
    /// are therefore reversed into logical order before line breaking.
    pub fn is_reversed(self) -> bool {
        matches!(self, Direction::RightToLeft | Direction::BottomToTop)
    }

    /// True for directions along the block (vertical) axis.
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::TopToBottom | Direction::BottomToTop)
    }
}

/// Forced glyph rotation for scripts laid out in vertical writing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    /// Rotate 90 degrees clockwise
    Clockwise,
    /// Rotate 90 degrees counter-clockwise
    CounterClockwise,
}

impl Rotation {
    /// Rotation angle in degrees, counter-clockwise positive.
    pub fn degrees(self) -> f32 {
        match self {
            Rotation::None => 0.0,
            Rotation::Clockwise => -90.0,
            Rotation::CounterClockwise => 90.0,
        }
    }
}
