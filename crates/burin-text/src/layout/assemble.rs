//! Line assembly
//!
//! Walks the coalesced items and breakpoints once, building the final lines:
//! span slicing along face/run boundaries, hyphen realization at flagged
//! breaks, baseline accumulation with line stretch, vertical overflow
//! truncation, alignment offsets, glue adjustment by the chosen ratio, and
//! the un-reversal of right-to-left / bottom-to-top content at both glyph
//! and span granularity.

use std::sync::Arc;

use crate::font::{Font, FontFace};
use crate::layout::items::SOFT_HYPHEN;
use crate::layout::{Breakpoint, Item, TextAlign, WritingMode};
use crate::shaping::adapter::ShapedText;
use crate::shaping::{glyphs_width, Glyph, Rotation};
use crate::text::{Line, SpanContent, SpanObject, TextSpan};

pub(crate) struct AssemblyInput<'a> {
    pub items: &'a [Item],
    pub breaks: &'a [Breakpoint],
    pub shaped: &'a mut ShapedText,
    pub log: &'a str,
    pub objects: &'a [SpanObject],
    pub default_face: &'a Arc<FontFace>,
    pub mode: WritingMode,
    pub halign: TextAlign,
    pub valign: TextAlign,
    pub justify: bool,
    pub width: f32,
    pub height: f32,
    pub line_stretch: f32,
}

pub(crate) struct Assembly {
    pub lines: Vec<Line>,
    pub fonts: Vec<Arc<Font>>,
    pub text: String,
    pub overflowed: bool,
}

fn align_offset(halign: TextAlign, width: f32, line_width: f32) -> f32 {
    match halign {
        TextAlign::Right => width - line_width,
        TextAlign::Center | TextAlign::Middle => (width - line_width) / 2.0,
        _ => 0.0,
    }
}

fn add_font(fonts: &mut Vec<Arc<Font>>, font: &Arc<Font>) {
    if !fonts.iter().any(|f| Arc::ptr_eq(f, font)) {
        fonts.push(font.clone());
    }
}

/// Ascent, descent and bottom used when committing a line: an empty line
/// falls back to the face active at the break, the first line follows its
/// leading span's face, and later lines take the maximum over their spans.
fn commit_heights(
    line: &Line,
    first_line: bool,
    shaped: &ShapedText,
    glyph_index: usize,
    default_face: &Arc<FontFace>,
    mode: WritingMode,
) -> (f32, f32, f32) {
    let spans = line.spans();
    if spans.is_empty() {
        let face = shaped.face_at(glyph_index).unwrap_or(default_face);
        let h = face.heights();
        return (h.ascent, h.descent, h.bottom);
    }
    if first_line && mode == WritingMode::HorizontalTb {
        let h = spans[0].face.heights();
        return (h.ascent, h.descent, h.bottom);
    }
    let h = line.heights(mode);
    (h.ascent, h.descent, h.bottom)
}

pub(crate) fn assemble(input: AssemblyInput) -> Assembly {
    let AssemblyInput {
        items,
        breaks,
        shaped,
        log,
        objects,
        default_face,
        mode,
        halign,
        valign,
        justify,
        width,
        height,
        line_stretch,
    } = input;

    // Sentinel glyph so that cluster lookups one past a run are valid.
    shaped.glyphs.push(Glyph {
        id: 0,
        cluster: log.len() as u32,
        x_advance: 0,
        y_advance: 0,
        x_offset: 0,
        y_offset: 0,
        ch: '\0',
        size: default_face.size,
        units_per_em: default_face.font.units_per_em(),
        script: unicode_script::Script::Unknown,
        vertical: false,
    });

    let mut lines = vec![Line::new()];
    let mut fonts: Vec<Arc<Font>> = Vec::new();
    let mut text = log.to_string();
    let mut overflowed = false;

    let line_spacing = 1.0 + line_stretch;
    let mut i = 0usize; // glyph index
    let mut j = 0usize; // break / line index
    let mut x = 0.0f32;
    let mut y = 0.0f32;
    // Logical end of the last committed line, for overflow truncation.
    let mut committed_cluster = 0u32;
    // Heights of the last committed line, for trailing gap removal.
    let mut last_descent = 0.0f32;
    let mut last_bottom = 0.0f32;

    if let Some(first) = breaks.first() {
        x += align_offset(halign, width, first.width);
    }

    for (position, item) in items.iter().enumerate() {
        if j < breaks.len() && position == breaks[j].position {
            if let Some(span) = lines[j].spans.last_mut() {
                // Fold the break item's glyph text into the previous span.
                for glyph in &shaped.glyphs[i..i + item.size()] {
                    span.text.push(glyph.ch);
                }

                // Realize a chosen soft hyphen as a literal hyphen glyph.
                if matches!(item, Item::Penalty { size: 1, .. })
                    && shaped.glyphs[i].ch == SOFT_HYPHEN
                {
                    let face = span.face.clone();
                    let id = face.font.glyph_index('-');
                    let hyphen = Glyph {
                        id,
                        cluster: shaped.glyphs[i].cluster,
                        x_advance: face.font.glyph_advance(id) as i32,
                        y_advance: 0,
                        x_offset: 0,
                        y_offset: 0,
                        ch: '-',
                        size: face.size,
                        units_per_em: face.font.units_per_em(),
                        script: shaped.glyphs[i].script,
                        vertical: shaped.glyphs[i].vertical,
                    };
                    span.width += hyphen.advance();
                    span.text.push('-');
                    if let SpanContent::Glyphs(glyphs) = &mut span.content {
                        glyphs.push(hyphen);
                    }
                }
            }

            let (ascent, descent, bottom) =
                commit_heights(&lines[j], j == 0, shaped, i, default_face, mode);
            let ascent = if j > 0 { ascent * line_spacing } else { ascent };
            let bottom = bottom * line_spacing;

            if height != 0.0 && height < y + ascent + descent {
                // The line does not fit the box: drop it and truncate.
                lines.pop();
                if j > 0 {
                    text = log[..committed_cluster as usize].to_string();
                } else {
                    text.clear();
                    y = 0.0;
                }
                overflowed = true;
                break;
            }

            lines[j].y = y + ascent;
            y += ascent + bottom;
            committed_cluster = shaped.glyphs[i + item.size()].cluster;
            last_descent = descent;
            last_bottom = bottom;

            if position == items.len() - 1 {
                break;
            }
            lines.push(Line::new());
            if j + 1 < breaks.len() {
                j += 1;
            }
            x = align_offset(halign, width, breaks[j].width);
        } else {
            match *item {
                Item::Box { width: item_width, size } => {
                    let mut a = i;
                    let mut dx = 0.0f32;
                    let mut k = shaped.run_index(i);
                    for b in (i + 1)..=(i + size) {
                        let next_k = shaped.run_index(b);
                        if next_k == k && b != i + size {
                            continue;
                        }
                        let ac = shaped.glyphs[a].cluster as usize;
                        let bc = shaped.glyphs[b].cluster as usize;
                        let direction = shaped.directions[k];
                        let rotation = shaped.rotations[k];

                        match shaped.faces[k].clone() {
                            Some(face) => {
                                let w = glyphs_width(&shaped.glyphs[a..b]);
                                add_font(&mut fonts, &face.font);
                                if direction.is_reversed() {
                                    // Undo the logical-order reversal applied
                                    // for line breaking.
                                    shaped.glyphs[a..b].reverse();
                                }
                                lines[j].spans.push(TextSpan {
                                    x: x + dx,
                                    width: w,
                                    face,
                                    text: log[ac..bc].to_string(),
                                    direction,
                                    rotation,
                                    content: SpanContent::Glyphs(
                                        shaped.glyphs[a..b].to_vec(),
                                    ),
                                });
                                if direction.is_reversed() {
                                    reorder_reversed_spans(
                                        &mut lines[j].spans,
                                        x + dx,
                                        w,
                                    );
                                }
                                dx += w;
                            }
                            None => {
                                // Embedded objects: one span per object.
                                let face = lines[j]
                                    .spans
                                    .last()
                                    .map(|s| s.face.clone())
                                    .unwrap_or_else(|| default_face.clone());
                                for g in a..b {
                                    let glyph = shaped.glyphs[g];
                                    let mut object =
                                        objects[glyph.id as usize].clone();
                                    let w = if mode == WritingMode::HorizontalTb {
                                        object.x = 0.0;
                                        object.width
                                    } else {
                                        object.x = -object.width / 2.0;
                                        object.y = -object.height;
                                        object.height
                                    };
                                    let sc = glyph.cluster as usize;
                                    let ec = sc + glyph.ch.len_utf8();
                                    lines[j].spans.push(TextSpan {
                                        x: x + dx,
                                        width: w,
                                        face: face.clone(),
                                        text: log[sc..ec].to_string(),
                                        direction,
                                        rotation: Rotation::None,
                                        content: SpanContent::Object(object),
                                    });
                                    dx += w;
                                }
                            }
                        }
                        k = next_k;
                        a = b;
                    }
                    x += item_width;
                }
                Item::Glue {
                    width: glue_width,
                    stretch,
                    shrink,
                    size,
                } => {
                    let mut ratio = if justify && j < breaks.len() {
                        breaks[j].ratio
                    } else {
                        0.0
                    };
                    if !ratio.is_finite() {
                        // A line without finite stretch cannot be adjusted.
                        ratio = 0.0;
                    }
                    let mut w = glue_width;
                    if ratio >= 0.0 {
                        if stretch.is_finite() {
                            w += ratio * stretch;
                        }
                    } else if shrink.is_finite() {
                        w += ratio * shrink;
                    }
                    x += w;

                    if let Some(span) = lines[j].spans.last_mut() {
                        for glyph in &shaped.glyphs[i..i + size] {
                            span.text.push(glyph.ch);
                        }
                    }
                }
                Item::Penalty { .. } => {}
            }
        }
        i += item.size();
    }

    if j > 0 {
        // Remove the line gap below the last line.
        y += -last_bottom + last_descent;
    }

    // Vertical alignment within the box.
    let mut valign = valign;
    if mode == WritingMode::VerticalRl {
        valign = match valign {
            TextAlign::Top => TextAlign::Bottom,
            TextAlign::Bottom => TextAlign::Top,
            other => other,
        };
    }
    if height > 0.0 {
        match valign {
            TextAlign::Center | TextAlign::Middle | TextAlign::Bottom => {
                let mut dy = height - y;
                if valign != TextAlign::Bottom {
                    dy /= 2.0;
                }
                for line in &mut lines {
                    line.y += dy;
                }
            }
            TextAlign::Justify if lines.len() > 1 => {
                let ddy = (height - y) / (lines.len() - 1) as f32;
                let mut dy = 0.0;
                for line in &mut lines {
                    line.y += dy;
                    dy += ddy;
                }
            }
            _ => {}
        }
    }
    if mode == WritingMode::VerticalRl {
        for line in &mut lines {
            line.y = height - line.y;
        }
    }

    Assembly {
        lines,
        fonts,
        text,
        overflowed,
    }
}

/// Move the just-pushed span of a reversed run to the visual left of the
/// contiguous reversed spans before it, restoring visual order for
/// right-to-left and bottom-to-top content.
fn reorder_reversed_spans(spans: &mut [TextSpan], x: f32, width: f32) {
    let last = spans.len() - 1;
    let mut first = last;
    while first > 0 && spans[first - 1].direction.is_reversed() {
        first -= 1;
    }
    if first < last {
        let gap = x - spans[first].x - spans[first].width;
        spans[last].x = spans[last - 1].x;
        for span in &mut spans[first..last] {
            span.x += width + gap;
        }
    }
}
