//! Rich text builder
//!
//! An append-only logical document: a growable string, an ordered list of
//! face assignments measured in rune offsets, and a table of embedded
//! objects encoded as placeholder runes. `to_text` runs the full layout
//! pipeline and produces an immutable [`Text`].

use std::sync::Arc;

use tracing::debug;
use unicode_script::Script;

use crate::font::FontFace;
use crate::layout::assemble::{assemble, AssemblyInput};
use crate::layout::coalesce::coalesce;
use crate::layout::{
    glyphs_to_items, linebreak, BreakPolicy, Breakpoint, Item, LayoutStyle, TextAlign,
    TextOrientation, VerticalAlign, WritingMode,
};
use crate::shaping::adapter::{shape_runs, RunInput, VerticalTuning};
use crate::shaping::{embedding_levels, itemize};
use crate::text::{Drawable, SpanObject, Text};
use crate::Result;

/// Builder for mixed-face, mixed-script text with embedded objects.
///
/// Single-owner and single-writer; independent instances share nothing but
/// the fonts their faces reference.
#[derive(Debug)]
pub struct RichText {
    text: String,
    /// Rune offset at which each face run starts; never empty, starts at 0,
    /// strictly increasing.
    locs: Vec<usize>,
    /// Face per run; `None` marks embedded-object placeholders.
    faces: Vec<Option<Arc<FontFace>>>,
    mode: WritingMode,
    orient: TextOrientation,
    default_face: Arc<FontFace>,
    objects: Vec<SpanObject>,
    policy: BreakPolicy,
    tuning: VerticalTuning,
}

impl RichText {
    /// A rich text starting in the given face.
    pub fn new(face: FontFace) -> Self {
        let face = Arc::new(face);
        Self {
            text: String::new(),
            locs: vec![0],
            faces: vec![Some(face.clone())],
            mode: WritingMode::default(),
            orient: TextOrientation::default(),
            default_face: face,
            objects: Vec::new(),
            policy: BreakPolicy::default(),
            tuning: VerticalTuning::default(),
        }
    }

    /// Clear the text and face assignments, keeping the first face.
    pub fn reset(&mut self) {
        self.text.clear();
        self.locs.truncate(1);
        self.faces.truncate(1);
        self.objects.clear();
    }

    pub fn set_writing_mode(&mut self, mode: WritingMode) {
        self.mode = mode;
    }

    pub fn set_text_orientation(&mut self, orient: TextOrientation) {
        self.orient = orient;
    }

    pub fn set_break_policy(&mut self, policy: BreakPolicy) {
        self.policy = policy;
    }

    pub fn set_vertical_tuning(&mut self, tuning: VerticalTuning) {
        self.tuning = tuning;
    }

    /// The logical text written so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the logical text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append text in the active face.
    pub fn write(&mut self, s: &str) {
        self.text.push_str(s);
    }

    /// Switch face and append text.
    pub fn add(&mut self, face: FontFace, s: &str) -> &mut Self {
        self.set_face(face);
        self.write(s);
        self
    }

    /// Close the active face run and open one with `face`. A no-op when the
    /// face is already active; an empty active run is replaced.
    pub fn set_face(&mut self, face: FontFace) {
        self.push_face(Some(Arc::new(face)));
    }

    fn push_face(&mut self, face: Option<Arc<FontFace>>) {
        if faces_equal(self.faces.last(), &face) {
            return;
        }
        let rune_len = self.text.chars().count();
        if self.locs.last() == Some(&rune_len) {
            // The active run is empty: replace it.
            self.locs.pop();
            self.faces.pop();
            if faces_equal(self.faces.last(), &face) {
                return;
            }
        }
        self.locs.push(rune_len);
        self.faces.push(face);
    }

    /// Retroactively assign `face` to the byte range `start..end`, splitting
    /// the runs it overlaps. A no-op when the range is empty or out of
    /// bounds; offsets are clipped to rune boundaries.
    pub fn set_face_span(&mut self, face: FontFace, start: usize, end: usize) {
        if end <= start || self.text.len() <= start {
            return;
        }
        let end = end.min(self.text.len());
        let start_rune = self.text[..floor_char_boundary(&self.text, start)]
            .chars()
            .count();
        let end_rune = self.text[..floor_char_boundary(&self.text, end)]
            .chars()
            .count();
        if end_rune <= start_rune {
            return;
        }
        let total_runes = self.text.chars().count();

        // Face in effect at the end of the range, continuing after it.
        let covering = self.locs.partition_point(|&l| l <= end_rune) - 1;
        let tail_face = self.faces[covering].clone();
        let tail_from = self.locs.partition_point(|&l| l <= end_rune);

        let keep = self.locs.partition_point(|&l| l < start_rune);
        let mut locs = self.locs[..keep].to_vec();
        let mut faces = self.faces[..keep].to_vec();

        push_run(&mut locs, &mut faces, start_rune, Some(Arc::new(face)));
        if end_rune < total_runes {
            push_run(&mut locs, &mut faces, end_rune, tail_face);
            for k in tail_from..self.locs.len() {
                push_run(&mut locs, &mut faces, self.locs[k], self.faces[k].clone());
            }
        }

        self.locs = locs;
        self.faces = faces;
    }

    /// Insert an embedded object at the current position. The object is
    /// encoded as a placeholder rune whose value is its table index, inside
    /// a face-less run.
    pub fn add_object(&mut self, drawable: Arc<dyn Drawable>, valign: VerticalAlign) -> &mut Self {
        let placeholder =
            char::from_u32(self.objects.len() as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
        let active = self.faces.last().cloned().flatten();
        self.push_face(None);
        self.text.push(placeholder);
        self.objects.push(SpanObject::new(drawable, valign));
        match active {
            Some(face) => self.push_face(Some(face)),
            None => {}
        }
        self
    }

    /// Index of the face run containing the rune offset.
    fn face_run_index(&self, rune: usize) -> usize {
        self.locs.partition_point(|&l| l <= rune).max(1) - 1
    }

    fn append_runs(&self, runs: &mut Vec<RunInput>, runes: &[char], levels: &[u8], face: usize) {
        match &self.faces[face] {
            None => runs.push(RunInput {
                text: runes.iter().collect(),
                script: Script::Unknown,
                face: None,
            }),
            Some(face) => {
                for item in itemize(runes, levels) {
                    runs.push(RunInput {
                        text: item.text,
                        script: item.script,
                        face: Some(face.clone()),
                    });
                }
            }
        }
    }

    /// Lay the accumulated text out into a box.
    ///
    /// Width zero disables line breaking (lines only at forced breaks);
    /// height zero disables vertical truncation. Breaking infeasibility and
    /// vertical truncation are reported through [`Text::overflowed`], never
    /// as errors.
    pub fn to_text(&self, style: &LayoutStyle) -> Result<Text> {
        let log = self.text.clone();
        let runes: Vec<char> = log.chars().collect();
        let levels = embedding_levels(&log);

        // Split by face, then by script and embedding level.
        let mut runs = Vec::new();
        let mut start = 0usize;
        let mut current = 0usize;
        for j in 0..runes.len() {
            let next = self.face_run_index(j);
            if next != current {
                self.append_runs(&mut runs, &runes[start..j], &levels[start..j], current);
                current = next;
                start = j;
            }
        }
        if start < runes.len() {
            self.append_runs(&mut runs, &runes[start..], &levels[start..], current);
        }

        let mut shaped = shape_runs(
            runs,
            self.mode,
            self.orient,
            &self.objects,
            &self.default_face,
            &self.tuning,
        )?;

        // In vertical modes layout happens on the rotated axis: box and
        // alignment roles swap.
        let (mut width, mut height) = (style.width, style.height);
        let (mut halign, mut valign) = (style.halign, style.valign);
        if self.mode.is_vertical() {
            std::mem::swap(&mut width, &mut height);
            std::mem::swap(&mut halign, &mut valign);
            halign = match halign {
                TextAlign::Top => TextAlign::Left,
                TextAlign::Bottom => TextAlign::Right,
                other => other,
            };
            valign = match valign {
                TextAlign::Left => TextAlign::Top,
                TextAlign::Right => TextAlign::Bottom,
                other => other,
            };
        }
        let justify = halign == TextAlign::Justify;

        let items = glyphs_to_items(&shaped.glyphs, style.indent, justify, &self.policy);
        let (mut breaks, feasible) = if width != 0.0 {
            linebreak(&items, width, &self.policy)
        } else if items.is_empty() {
            (vec![Breakpoint::new(0, 0.0)], true)
        } else {
            // No width constraint: a line per forced break.
            let mut breaks = Vec::new();
            let mut line_width = 0.0f32;
            for (position, item) in items.iter().enumerate() {
                match *item {
                    Item::Penalty { cost, .. } => {
                        if cost == f32::NEG_INFINITY {
                            breaks.push(Breakpoint::new(position, line_width));
                            line_width = 0.0;
                        }
                    }
                    _ => line_width += item.width(),
                }
            }
            (breaks, true)
        };

        let items = coalesce(items, &mut breaks, justify);
        let assembly = assemble(AssemblyInput {
            items: &items,
            breaks: &breaks,
            shaped: &mut shaped,
            log: &log,
            objects: &self.objects,
            default_face: &self.default_face,
            mode: self.mode,
            halign,
            valign,
            justify,
            width,
            height,
            line_stretch: style.line_stretch,
        });
        debug!(
            lines = assembly.lines.len(),
            overflowed = !feasible || assembly.overflowed,
            "text laid out"
        );

        Ok(Text {
            lines: assembly.lines,
            fonts: assembly.fonts,
            mode: self.mode,
            orientation: self.orient,
            width,
            height,
            text: assembly.text,
            overflowed: !feasible || assembly.overflowed,
        })
    }
}

fn faces_equal(a: Option<&Option<Arc<FontFace>>>, b: &Option<Arc<FontFace>>) -> bool {
    match (a, b) {
        (Some(Some(a)), Some(b)) => **a == **b,
        (Some(None), None) => true,
        _ => false,
    }
}

/// Append a face run, coalescing contiguous identical faces.
fn push_run(
    locs: &mut Vec<usize>,
    faces: &mut Vec<Option<Arc<FontFace>>>,
    loc: usize,
    face: Option<Arc<FontFace>>,
) {
    if faces_equal(faces.last(), &face) {
        return;
    }
    locs.push(loc);
    faces.push(face);
}

fn floor_char_boundary(s: &str, mut at: usize) -> usize {
    while at > 0 && !s.is_char_boundary(at) {
        at -= 1;
    }
    at
}
