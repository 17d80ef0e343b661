//! Deterministic fixed-metric font backend for unit tests

use std::sync::Arc;

use unicode_script::Script;

use crate::font::{Feature, Font, FontBackend, FontMetrics, ShapeOutput, ShapedGlyph};
use crate::shaping::Direction;
use crate::Result;

/// One glyph per rune, 500 font units wide (250 for spaces), no kerning.
/// Right-to-left requests come back in visual order like a real shaper.
#[derive(Debug)]
pub(crate) struct FixedBackend {
    metrics: FontMetrics,
}

impl Default for FixedBackend {
    fn default() -> Self {
        Self {
            metrics: FontMetrics {
                units_per_em: 1000,
                ascender: 800,
                descender: -200,
                line_gap: 100,
                x_height: 500,
                cap_height: 700,
                underline_position: -100,
                underline_thickness: 50,
            },
        }
    }
}

impl FontBackend for FixedBackend {
    fn name(&self) -> &str {
        "Testium"
    }

    fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    fn glyph_index(&self, ch: char) -> u16 {
        ch as u16
    }

    fn glyph_advance(&self, glyph_id: u16) -> u16 {
        if glyph_id == ' ' as u16 {
            250
        } else {
            500
        }
    }

    fn outline_glyph(
        &self,
        glyph_id: u16,
        sink: &mut dyn ttf_parser::OutlineBuilder,
    ) -> Result<bool> {
        if glyph_id == ' ' as u16 {
            return Ok(false);
        }
        let advance = self.glyph_advance(glyph_id) as f32;
        sink.move_to(0.0, 0.0);
        sink.line_to(advance, 0.0);
        sink.line_to(advance, 700.0);
        sink.line_to(0.0, 700.0);
        sink.close();
        Ok(true)
    }

    fn shape(
        &self,
        text: &str,
        _ppem: f32,
        direction: Option<Direction>,
        script: Script,
        _language: Option<&str>,
        _features: &[Feature],
    ) -> Result<ShapeOutput> {
        let direction = direction.unwrap_or(match script {
            Script::Hebrew | Script::Arabic => Direction::RightToLeft,
            _ => Direction::LeftToRight,
        });
        let mut glyphs: Vec<ShapedGlyph> = text
            .char_indices()
            .map(|(i, ch)| {
                let (x_advance, y_advance) = if direction.is_vertical() {
                    (0, -1000)
                } else {
                    (self.glyph_advance(ch as u16) as i32, 0)
                };
                ShapedGlyph {
                    id: ch as u16,
                    cluster: i as u32,
                    x_advance,
                    y_advance,
                    x_offset: 0,
                    y_offset: 0,
                }
            })
            .collect();
        if direction.is_reversed() {
            glyphs.reverse();
        }
        Ok(ShapeOutput { glyphs, direction })
    }
}

pub(crate) fn fixed_font() -> Arc<Font> {
    Arc::new(Font::new(Box::new(FixedBackend::default())))
}
