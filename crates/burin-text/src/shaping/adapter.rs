//! Shaping adapter
//!
//! Shapes each face/script homogeneous run through its font backend,
//! synthesizes pseudo-glyphs for embedded objects, resolves run directions
//! and rotations for the writing mode, applies vertical baseline
//! corrections, rebases clusters onto the full logical text and reverses
//! right-to-left / bottom-to-top runs into logical order for line breaking
//! (the assembler reverses them back).

use std::sync::Arc;

use unicode_script::Script;

use super::script::{is_vertical_script, script_rotation};
use super::{Direction, Glyph, Rotation};
use crate::font::FontFace;
use crate::layout::{TextOrientation, WritingMode};
use crate::text::SpanObject;
use crate::Result;

/// One face/script homogeneous slice of the logical text. A `None` face
/// marks an embedded-object run of placeholder runes.
#[derive(Debug, Clone)]
pub(crate) struct RunInput {
    pub text: String,
    pub script: Script,
    pub face: Option<Arc<FontFace>>,
}

/// The full shaped glyph stream with per-run metadata.
#[derive(Debug)]
pub(crate) struct ShapedText {
    pub glyphs: Vec<Glyph>,
    /// Glyph index at which each run starts
    pub run_starts: Vec<usize>,
    pub faces: Vec<Option<Arc<FontFace>>>,
    pub directions: Vec<Direction>,
    pub rotations: Vec<Rotation>,
}

impl ShapedText {
    pub fn run_index(&self, glyph: usize) -> usize {
        if self.run_starts.is_empty() {
            return 0;
        }
        self.run_starts.partition_point(|&s| s <= glyph).max(1) - 1
    }

    pub fn face_at(&self, glyph: usize) -> Option<&Arc<FontFace>> {
        self.faces.get(self.run_index(glyph))?.as_ref()
    }
}

/// Heuristic corrections applied to glyphs in vertical writing modes; tied
/// to font metrics rather than hard law, so overridable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalTuning {
    /// Fraction of the x-height rotated runs are shifted down to center
    /// them on the vertical baseline
    pub rotated_center: f32,
    /// Fraction of (units-per-em + x-height) upright non-vertical-script
    /// glyphs are shifted down
    pub upright_center: f32,
    /// Shift Mongolian by the font descender
    pub mongolian_descender: bool,
}

impl Default for VerticalTuning {
    fn default() -> Self {
        Self {
            rotated_center: 0.5,
            upright_center: 0.5,
            mongolian_descender: true,
        }
    }
}

/// Resolve the direction a run is shaped with and the rotation applied to
/// it, from the writing mode, orientation, script and the face's configured
/// direction. `None` leaves the choice to the shaper.
pub(crate) fn script_direction(
    mode: WritingMode,
    orient: TextOrientation,
    script: Script,
    face_direction: Option<Direction>,
) -> (Option<Direction>, Rotation) {
    let mut direction = face_direction;
    if matches!(
        direction,
        Some(Direction::TopToBottom | Direction::BottomToTop)
    ) {
        direction = Some(if mode == WritingMode::HorizontalTb {
            Direction::LeftToRight
        } else {
            Direction::TopToBottom
        });
    } else if mode != WritingMode::HorizontalTb {
        direction = Some(Direction::TopToBottom);
    }

    let mut rotation = Rotation::None;
    if mode != WritingMode::HorizontalTb {
        if !is_vertical_script(script) && orient == TextOrientation::Natural {
            direction = Some(Direction::LeftToRight);
            rotation = Rotation::Clockwise;
        } else {
            rotation = script_rotation(script);
            if rotation != Rotation::None {
                direction = Some(Direction::LeftToRight);
            }
        }
    }
    (direction, rotation)
}

/// Shape all runs into one glyph stream.
pub(crate) fn shape_runs(
    runs: Vec<RunInput>,
    mode: WritingMode,
    orient: TextOrientation,
    objects: &[SpanObject],
    default_face: &Arc<FontFace>,
    tuning: &VerticalTuning,
) -> Result<ShapedText> {
    let mut shaped = ShapedText {
        glyphs: Vec::new(),
        run_starts: Vec::new(),
        faces: Vec::new(),
        directions: Vec::new(),
        rotations: Vec::new(),
    };

    let mut cluster_offset = 0u32;
    for run in runs {
        let mut direction = Direction::LeftToRight;
        let mut rotation = Rotation::None;
        let mut glyphs: Vec<Glyph> = Vec::new();

        match &run.face {
            None => {
                // Embedded objects: one pseudo-glyph per placeholder rune,
                // carrying the object's extent as its advance.
                let face = default_face;
                let upem = face.font.units_per_em();
                let to_units = upem as f32 / face.size.max(f32::MIN_POSITIVE);
                for (i, r) in run.text.char_indices() {
                    let object = &objects[r as usize];
                    let (x_advance, mut y_advance) = (object.width, object.height);
                    if mode.is_vertical() {
                        y_advance = -y_advance;
                    }
                    glyphs.push(Glyph {
                        id: r as u16,
                        cluster: cluster_offset + i as u32,
                        x_advance: (x_advance * to_units) as i32,
                        y_advance: (y_advance * to_units) as i32,
                        x_offset: 0,
                        y_offset: 0,
                        ch: r,
                        size: face.size,
                        units_per_em: upem,
                        script: run.script,
                        vertical: mode.is_vertical(),
                    });
                }
            }
            Some(face) => {
                let (shape_direction, rot) =
                    script_direction(mode, orient, run.script, face.direction);
                rotation = rot;
                let output = face.font.shape(
                    &run.text,
                    face.ppem(),
                    shape_direction,
                    run.script,
                    face.language.as_deref(),
                )?;
                direction = output.direction;
                let vertical = direction.is_vertical();
                let metrics = *face.font.metrics();
                let upem = metrics.units_per_em;
                for g in &output.glyphs {
                    let ch = run.text[g.cluster as usize..]
                        .chars()
                        .next()
                        .unwrap_or('\u{FFFD}');
                    let mut y_offset = g.y_offset;
                    if mode.is_vertical() {
                        if run.script == Script::Mongolian && tuning.mongolian_descender {
                            y_offset += metrics.descender as i32;
                        } else if rotation != Rotation::None {
                            // Center rotated horizontal text by the x-height.
                            y_offset -= (metrics.x_height as f32 * tuning.rotated_center) as i32;
                        } else if orient == TextOrientation::Upright
                            && !is_vertical_script(run.script)
                        {
                            // Center upright horizontal-script glyphs on the
                            // vertical baseline.
                            y_offset = -(((upem as f32 + metrics.x_height as f32)
                                * tuning.upright_center) as i32);
                        }
                    }
                    glyphs.push(Glyph {
                        id: g.id,
                        cluster: cluster_offset + g.cluster,
                        x_advance: g.x_advance,
                        y_advance: g.y_advance,
                        x_offset: g.x_offset,
                        y_offset,
                        ch,
                        size: face.size,
                        units_per_em: upem,
                        script: run.script,
                        vertical,
                    });
                }
                if direction.is_reversed() {
                    // Put right-to-left and bottom-to-top runs into logical
                    // order for line breaking; assembly undoes this.
                    glyphs.reverse();
                }
            }
        }

        shaped.run_starts.push(shaped.glyphs.len());
        shaped.glyphs.append(&mut glyphs);
        cluster_offset += run.text.len() as u32;
        shaped.faces.push(run.face);
        shaped.directions.push(direction);
        shaped.rotations.push(rotation);
    }

    Ok(shaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_mode_keeps_face_direction() {
        let (dir, rot) = script_direction(
            WritingMode::HorizontalTb,
            TextOrientation::Natural,
            Script::Latin,
            None,
        );
        assert_eq!(dir, None);
        assert_eq!(rot, Rotation::None);

        let (dir, _) = script_direction(
            WritingMode::HorizontalTb,
            TextOrientation::Natural,
            Script::Hebrew,
            Some(Direction::RightToLeft),
        );
        assert_eq!(dir, Some(Direction::RightToLeft));
    }

    #[test]
    fn test_vertical_directions_collapse_in_horizontal_mode() {
        let (dir, _) = script_direction(
            WritingMode::HorizontalTb,
            TextOrientation::Natural,
            Script::Latin,
            Some(Direction::TopToBottom),
        );
        assert_eq!(dir, Some(Direction::LeftToRight));
    }

    #[test]
    fn test_vertical_mode_rotates_horizontal_scripts() {
        let (dir, rot) = script_direction(
            WritingMode::VerticalRl,
            TextOrientation::Natural,
            Script::Latin,
            None,
        );
        assert_eq!(dir, Some(Direction::LeftToRight));
        assert_eq!(rot, Rotation::Clockwise);
    }

    #[test]
    fn test_vertical_mode_keeps_vertical_scripts_upright() {
        let (dir, rot) = script_direction(
            WritingMode::VerticalRl,
            TextOrientation::Natural,
            Script::Han,
            None,
        );
        assert_eq!(dir, Some(Direction::TopToBottom));
        assert_eq!(rot, Rotation::None);
    }

    #[test]
    fn test_mongolian_rotates_with_script_rotation() {
        let (dir, rot) = script_direction(
            WritingMode::VerticalRl,
            TextOrientation::Natural,
            Script::Mongolian,
            None,
        );
        assert_eq!(dir, Some(Direction::LeftToRight));
        assert_eq!(rot, Rotation::Clockwise);
    }

    #[test]
    fn test_upright_orientation_keeps_top_to_bottom() {
        let (dir, rot) = script_direction(
            WritingMode::VerticalRl,
            TextOrientation::Upright,
            Script::Latin,
            None,
        );
        assert_eq!(dir, Some(Direction::TopToBottom));
        assert_eq!(rot, Rotation::None);
    }
}
