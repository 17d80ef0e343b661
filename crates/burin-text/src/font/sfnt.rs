//! SFNT-backed font backend (ttf-parser tables, rustybuzz shaping)

use std::str::FromStr;
use std::sync::Arc;

use unicode_script::Script;

use super::{Feature, FontBackend, FontMetrics, ShapeOutput, ShapedGlyph};
use crate::shaping::Direction;
use crate::{Result, TextError};

/// Production [`FontBackend`]: parses metrics once at construction and
/// re-parses the font data per shaping or outlining call, keeping the backend
/// free of self-referential borrows.
#[derive(Debug, Clone)]
pub struct SfntFont {
    data: Arc<Vec<u8>>,
    index: u32,
    name: String,
    metrics: FontMetrics,
}

impl SfntFont {
    /// Parse an SFNT font (TTF/OTF) from raw data.
    pub fn from_data(data: Vec<u8>, index: u32) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, index)
            .map_err(|e| TextError::FontParsing(e.to_string()))?;

        let underline = face.underline_metrics();
        let metrics = FontMetrics {
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
            x_height: face.x_height().unwrap_or(0),
            cap_height: face.capital_height().unwrap_or(0),
            underline_position: underline.map(|m| m.position).unwrap_or(0),
            underline_thickness: underline.map(|m| m.thickness).unwrap_or(0),
        };
        let name = font_name(&face).unwrap_or_else(|| "Unknown".to_string());

        Ok(Self {
            data: Arc::new(data),
            index,
            name,
            metrics,
        })
    }

    fn parse(&self) -> Result<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index)
            .map_err(|e| TextError::FontParsing(e.to_string()))
    }
}

/// Default horizontal direction of a script, used when the caller leaves the
/// direction unresolved.
fn base_direction(script: Script) -> Direction {
    match script {
        Script::Arabic
        | Script::Hebrew
        | Script::Syriac
        | Script::Thaana
        | Script::Nko
        | Script::Samaritan
        | Script::Mandaic
        | Script::Adlam => Direction::RightToLeft,
        _ => Direction::LeftToRight,
    }
}

impl From<Direction> for rustybuzz::Direction {
    fn from(d: Direction) -> Self {
        match d {
            Direction::LeftToRight => rustybuzz::Direction::LeftToRight,
            Direction::RightToLeft => rustybuzz::Direction::RightToLeft,
            Direction::TopToBottom => rustybuzz::Direction::TopToBottom,
            Direction::BottomToTop => rustybuzz::Direction::BottomToTop,
        }
    }
}

impl FontBackend for SfntFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    fn glyph_index(&self, ch: char) -> u16 {
        self.parse()
            .ok()
            .and_then(|face| face.glyph_index(ch))
            .map(|id| id.0)
            .unwrap_or(0)
    }

    fn glyph_advance(&self, glyph_id: u16) -> u16 {
        self.parse()
            .ok()
            .and_then(|face| face.glyph_hor_advance(ttf_parser::GlyphId(glyph_id)))
            .unwrap_or(0)
    }

    fn outline_glyph(
        &self,
        glyph_id: u16,
        sink: &mut dyn ttf_parser::OutlineBuilder,
    ) -> Result<bool> {
        let face = self.parse()?;
        Ok(face
            .outline_glyph(ttf_parser::GlyphId(glyph_id), sink)
            .is_some())
    }

    fn shape(
        &self,
        text: &str,
        _ppem: f32,
        direction: Option<Direction>,
        script: Script,
        language: Option<&str>,
        features: &[Feature],
    ) -> Result<ShapeOutput> {
        let face = rustybuzz::Face::from_slice(&self.data, self.index)
            .ok_or_else(|| TextError::ShapingFailed("unreadable font data".into()))?;

        let direction = direction.unwrap_or_else(|| base_direction(script));

        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.set_direction(direction.into());
        if script != Script::Common && script != Script::Inherited && script != Script::Unknown {
            let tag = script.short_name().as_bytes();
            if let Ok(tag) = <[u8; 4]>::try_from(tag) {
                if let Some(script) = rustybuzz::Script::from_iso15924_tag(
                    rustybuzz::ttf_parser::Tag::from_bytes(&tag),
                ) {
                    buffer.set_script(script);
                }
            }
        }
        if let Some(lang) = language {
            if let Ok(lang) = rustybuzz::Language::from_str(lang) {
                buffer.set_language(lang);
            }
        }
        buffer.guess_segment_properties();

        let features: Vec<rustybuzz::Feature> = features
            .iter()
            .map(|f| {
                rustybuzz::Feature::new(
                    rustybuzz::ttf_parser::Tag::from_bytes(&f.tag),
                    f.value,
                    ..,
                )
            })
            .collect();

        let output = rustybuzz::shape(&face, &features, buffer);
        let infos = output.glyph_infos();
        let positions = output.glyph_positions();

        let glyphs = infos
            .iter()
            .zip(positions.iter())
            .map(|(info, pos)| ShapedGlyph {
                id: info.glyph_id as u16,
                cluster: info.cluster,
                x_advance: pos.x_advance,
                y_advance: pos.y_advance,
                x_offset: pos.x_offset,
                y_offset: pos.y_offset,
            })
            .collect();

        Ok(ShapeOutput { glyphs, direction })
    }
}

fn font_name(face: &ttf_parser::Face) -> Option<String> {
    let names = face.names();
    let mut full_name = None;
    for name in names.into_iter() {
        if name.name_id == ttf_parser::name_id::FAMILY {
            if let Some(s) = name.to_string() {
                return Some(s);
            }
        } else if name.name_id == ttf_parser::name_id::FULL_NAME && full_name.is_none() {
            full_name = name.to_string();
        }
    }
    full_name
}
