//! Laid-out text model
//!
//! The immutable result of layout: lines of spans with their geometry, plus
//! the walkers and path conversions rendering backends consume. Spans
//! reference (never own) the fonts and faces supplied by the caller.

use std::fmt;
use std::sync::Arc;

use tiny_skia::{Path, PathBuilder, PathSegment, Transform};

use crate::font::face::LineHeights;
use crate::font::{Decoration, Font, FontFace, Hinting, Paint};
use crate::layout::{LayoutStyle, TextAlign, TextOrientation, VerticalAlign, WritingMode};
use crate::rich::RichText;
use crate::shaping::{
    embedding_levels, glyphs_width, is_paragraph_separator, itemize, Direction, Glyph, Rotation,
};
use crate::{Result, TextError};

/// Cross-axis padding factor for upright glyphs on a vertical line.
const UPRIGHT_PADDING: f32 = 1.2;

/// Device resolution in dots per pixel; zero disables pixel-grid snapping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Resolution(pub f32);

impl Resolution {
    pub fn is_set(self) -> bool {
        self.0 > 0.0
    }
}

/// Axis-aligned rectangle in y-up coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Smallest rectangle covering both; an empty rectangle is an identity.
    pub fn union(self, other: Rect) -> Rect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.w).max(other.x + other.w);
        let y1 = (self.y + self.h).max(other.y + other.h);
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

/// An opaque embedded drawable (path, image, sub-canvas) measured and placed
/// by layout, rendered by the caller's backend.
pub trait Drawable: fmt::Debug + Send + Sync {
    /// Width and height in pixels.
    fn size(&self) -> (f32, f32);

    /// Render into `renderer` under `transform`.
    fn draw(&self, renderer: &mut dyn Renderer, transform: Transform) -> Result<()>;
}

/// Path-consuming render target.
pub trait Renderer {
    fn fill_path(&mut self, path: &Path, paint: &Paint, transform: Transform);
}

/// An embedded object placed inside a text span.
#[derive(Debug, Clone)]
pub struct SpanObject {
    pub drawable: Arc<dyn Drawable>,
    /// Offset within the span, set during assembly
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub valign: VerticalAlign,
}

impl SpanObject {
    pub fn new(drawable: Arc<dyn Drawable>, valign: VerticalAlign) -> Self {
        let (width, height) = drawable.size();
        Self {
            drawable,
            x: 0.0,
            y: 0.0,
            width,
            height,
            valign,
        }
    }

    /// Ascent and descent of the object relative to the baseline; descent is
    /// negative when the object sits fully above it.
    pub fn heights(&self, face: &FontFace) -> (f32, f32) {
        let m = face.metrics();
        match self.valign {
            VerticalAlign::Baseline => (self.height, 0.0),
            VerticalAlign::FontTop => (m.ascent, -(m.ascent - self.height)),
            VerticalAlign::FontMiddle => (
                (m.ascent - m.descent + self.height) / 2.0,
                -(m.ascent - m.descent - self.height) / 2.0,
            ),
            VerticalAlign::FontBottom => (self.height - m.descent, m.descent),
        }
    }

    /// Placement transform for rendering the object at span position (x, y).
    pub fn view(&self, x: f32, y: f32, face: &FontFace) -> Transform {
        let (_, descent) = self.heights(face);
        Transform::from_translate(x + self.x, y + self.y - descent)
    }
}

/// What a span carries: shaped glyphs or a single embedded object.
#[derive(Debug, Clone)]
pub enum SpanContent {
    Glyphs(Vec<Glyph>),
    Object(SpanObject),
}

/// A horizontal (or, in vertical modes, columnar) run of one face within a
/// line.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// Offset from the line origin along the line axis
    pub x: f32,
    pub width: f32,
    pub face: Arc<FontFace>,
    /// Slice of the logical text the span covers
    pub text: String,
    pub direction: Direction,
    pub rotation: Rotation,
    pub content: SpanContent,
}

impl TextSpan {
    pub fn is_text(&self) -> bool {
        matches!(self.content, SpanContent::Glyphs(_))
    }

    pub fn glyphs(&self) -> &[Glyph] {
        match &self.content {
            SpanContent::Glyphs(glyphs) => glyphs,
            SpanContent::Object(_) => &[],
        }
    }

    pub fn object(&self) -> Option<&SpanObject> {
        match &self.content {
            SpanContent::Object(obj) => Some(obj),
            SpanContent::Glyphs(_) => None,
        }
    }
}

/// A laid-out line: a baseline position and its spans.
#[derive(Debug, Clone, Default)]
pub struct Line {
    /// Baseline offset from the box top, downward positive
    pub(crate) y: f32,
    pub(crate) spans: Vec<TextSpan>,
}

impl Line {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Baseline offset from the box top, downward positive.
    pub fn baseline(&self) -> f32 {
        self.y
    }

    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    /// Maximum top/ascent/descent/bottom over the spans. On vertical lines
    /// upright glyphs and objects contribute half their cross extent on both
    /// sides of the baseline.
    pub fn heights(&self, mode: WritingMode) -> LineHeights {
        let mut h = LineHeights::default();
        if mode == WritingMode::HorizontalTb {
            for span in &self.spans {
                match &span.content {
                    SpanContent::Glyphs(_) => {
                        let sh = span.face.heights();
                        h.top = h.top.max(sh.top);
                        h.ascent = h.ascent.max(sh.ascent);
                        h.descent = h.descent.max(sh.descent);
                        h.bottom = h.bottom.max(sh.bottom);
                    }
                    SpanContent::Object(obj) => {
                        let (ascent, descent) = obj.heights(&span.face);
                        let gap = span.face.metrics().line_gap;
                        h.top = h.top.max(ascent + gap);
                        h.ascent = h.ascent.max(ascent);
                        h.descent = h.descent.max(descent);
                        h.bottom = h.bottom.max(descent + gap);
                    }
                }
            }
        } else {
            let mut width = 0.0f32;
            for span in &self.spans {
                match &span.content {
                    SpanContent::Glyphs(glyphs) => {
                        for glyph in glyphs {
                            if glyph.vertical {
                                let advance =
                                    span.face.font.glyph_advance(glyph.id) as f32 * glyph.scale();
                                width = width.max(UPRIGHT_PADDING * advance);
                            } else {
                                let sh = span.face.heights();
                                h.top = h.top.max(sh.top);
                                h.ascent = h.ascent.max(sh.ascent);
                                h.descent = h.descent.max(sh.descent);
                                h.bottom = h.bottom.max(sh.bottom);
                            }
                        }
                    }
                    SpanContent::Object(obj) => {
                        width = width.max(obj.width);
                    }
                }
            }
            h.top = h.top.max(width / 2.0);
            h.ascent = h.ascent.max(width / 2.0);
            h.descent = h.descent.max(width / 2.0);
            h.bottom = h.bottom.max(width / 2.0);
        }
        h
    }
}

/// An immutable laid-out text.
#[derive(Debug)]
pub struct Text {
    pub(crate) lines: Vec<Line>,
    pub(crate) fonts: Vec<Arc<Font>>,
    pub(crate) mode: WritingMode,
    pub(crate) orientation: TextOrientation,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) text: String,
    pub(crate) overflowed: bool,
}

impl Text {
    /// A single text line (honoring embedded paragraph separators) in one
    /// face, without box fitting. The baseline of the first line sits at
    /// y = 0; `halign` offsets Center/Right lines to the left of the origin.
    pub fn new_line(face: FontFace, s: &str, halign: TextAlign) -> Result<Self> {
        let face = Arc::new(face);
        let m = face.metrics();
        let advance = m.ascent + m.descent + m.line_gap;

        let mut text = Text {
            lines: Vec::new(),
            fonts: vec![face.font.clone()],
            mode: WritingMode::HorizontalTb,
            orientation: TextOrientation::Natural,
            width: 0.0,
            height: 0.0,
            text: s.to_string(),
            overflowed: false,
        };

        let padded = format!("{s}\n");
        let mut start = 0usize;
        let mut y = 0.0f32;
        let mut skip_next = false;
        for (j, r) in padded.char_indices() {
            if !is_paragraph_separator(r) {
                continue;
            }
            if skip_next {
                skip_next = false;
                start = j + r.len_utf8();
                continue;
            }
            if start < j {
                let segment = &padded[start..j];
                let runes: Vec<char> = segment.chars().collect();
                let levels = embedding_levels(segment);
                let mut line = Line::new();
                line.y = y;
                let mut line_width = 0.0f32;
                for item in itemize(&runes, &levels) {
                    let output = face.font.shape(
                        &item.text,
                        face.ppem(),
                        face.direction,
                        item.script,
                        face.language.as_deref(),
                    )?;
                    let glyphs: Vec<Glyph> = output
                        .glyphs
                        .iter()
                        .map(|g| {
                            let ch = item.text[g.cluster as usize..]
                                .chars()
                                .next()
                                .unwrap_or('\u{FFFD}');
                            Glyph {
                                id: g.id,
                                cluster: g.cluster,
                                x_advance: g.x_advance,
                                y_advance: g.y_advance,
                                x_offset: g.x_offset,
                                y_offset: g.y_offset,
                                ch,
                                size: face.size,
                                units_per_em: face.font.units_per_em(),
                                script: item.script,
                                vertical: false,
                            }
                        })
                        .collect();
                    let width = glyphs_width(&glyphs);
                    line.spans.push(TextSpan {
                        x: line_width,
                        width,
                        face: face.clone(),
                        text: item.text,
                        direction: output.direction,
                        rotation: Rotation::None,
                        content: SpanContent::Glyphs(glyphs),
                    });
                    line_width += width;
                }
                match halign {
                    TextAlign::Center | TextAlign::Middle => {
                        for span in &mut line.spans {
                            span.x -= line_width / 2.0;
                        }
                    }
                    TextAlign::Right => {
                        for span in &mut line.spans {
                            span.x -= line_width;
                        }
                    }
                    _ => {}
                }
                text.lines.push(line);
            }
            y += advance;
            skip_next = r == '\r' && padded[j + 1..].starts_with('\n');
            start = j + r.len_utf8();
        }
        Ok(text)
    }

    /// Format `s` into a box of the given geometry with a single face.
    pub fn new_box(face: FontFace, s: &str, style: &LayoutStyle) -> Result<Self> {
        let mut rt = RichText::new(face);
        rt.write(s);
        rt.to_text(style)
    }

    /// True when no line carries any span.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.spans.is_empty())
    }

    /// Box width and height; either is zero when unconstrained.
    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Top position of the first line and bottom position of the last.
    pub fn heights(&self) -> (f32, f32) {
        let (Some(first), Some(last)) = (self.lines.first(), self.lines.last()) else {
            return (0.0, 0.0);
        };
        let ascent = first.heights(self.mode).ascent;
        let descent = last.heights(self.mode).descent;
        (-first.y + ascent, last.y + descent)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn writing_mode(&self) -> WritingMode {
        self.mode
    }

    pub fn orientation(&self) -> TextOrientation {
        self.orientation
    }

    /// True when lines or the text itself were cut to fit the box.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// The logical text the layout covers; truncated on overflow.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bounding rectangle from face metrics (fast, ignores glyph outlines).
    pub fn bounds(&self) -> Rect {
        let mut rect = Rect::default();
        for line in &self.lines {
            for span in &line.spans {
                let m = span.face.metrics();
                let r = if self.mode == WritingMode::HorizontalTb {
                    Rect::new(span.x, -line.y - m.descent, span.width, m.ascent + m.descent)
                } else {
                    // Columns: the baseline is the vertical line at x = line.y
                    // and the span extends downward from -span.x.
                    Rect::new(
                        line.y - m.descent,
                        -span.x - span.width,
                        m.ascent + m.descent,
                        span.width,
                    )
                };
                rect = rect.union(r);
            }
        }
        rect
    }

    /// Bounding rectangle of the actual glyph outlines (slow, fallible).
    pub fn outline_bounds(&self) -> Result<Rect> {
        let mut rect = Rect::default();
        for line in &self.lines {
            for span in &line.spans {
                let Some(path) = span.face.to_path(span.glyphs())? else {
                    continue;
                };
                let b = path.bounds();
                rect = rect.union(Rect::new(
                    span.x + b.x(),
                    -line.y + b.y(),
                    b.width(),
                    b.height(),
                ));
            }
        }
        for (_, path) in self.decoration_paths() {
            let b = path.bounds();
            rect = rect.union(Rect::new(b.x(), b.y(), b.width(), b.height()));
        }
        Ok(rect)
    }

    /// Fonts referenced by the text, deduplicated and sorted by name.
    pub fn fonts(&self) -> Vec<Arc<Font>> {
        let mut fonts = self.fonts.clone();
        fonts.sort_by(|a, b| a.name().cmp(b.name()));
        fonts
    }

    /// The dominant face: a majority vote over font, size, style, variant
    /// and fill across all spans, ties broken by first occurrence.
    pub fn most_common_face(&self) -> Option<FontFace> {
        let mut fonts: Vec<(Arc<Font>, usize)> = Vec::new();
        let mut sizes: Vec<(f32, usize)> = Vec::new();
        let mut styles: Vec<(crate::font::FontStyle, usize)> = Vec::new();
        let mut variants: Vec<(crate::font::FontVariant, usize)> = Vec::new();
        let mut fills: Vec<(Paint, usize)> = Vec::new();
        for line in &self.lines {
            for span in &line.spans {
                let face = &span.face;
                match fonts.iter_mut().find(|(f, _)| Arc::ptr_eq(f, &face.font)) {
                    Some(e) => e.1 += 1,
                    None => fonts.push((face.font.clone(), 1)),
                }
                vote(&mut sizes, face.size);
                vote(&mut styles, face.style);
                vote(&mut variants, face.variant);
                vote(&mut fills, face.fill);
            }
        }
        let font = winner(&fonts)?;
        let face = font
            .face(winner(&sizes)?)
            .with_style(winner(&styles)?)
            .with_variant(winner(&variants)?)
            .with_fill(winner(&fills)?);
        Some(face)
    }

    /// Call `cb` for every line with its baseline y (y-up) and spans.
    pub fn walk_lines(&self, mut cb: impl FnMut(f32, &[TextSpan])) {
        for line in &self.lines {
            cb(-line.y, &line.spans);
        }
    }

    /// Call `cb` for every span with its position (y-up), including the
    /// face's configured nudge offsets.
    pub fn walk_spans(&self, mut cb: impl FnMut(f32, f32, &TextSpan)) {
        for line in &self.lines {
            for span in &line.spans {
                let dx = span.face.x_offset;
                let dy = span.face.y_offset;
                if self.mode == WritingMode::HorizontalTb {
                    cb(span.x + dx, -line.y + dy, span);
                } else {
                    cb(line.y + dx, -span.x + dy, span);
                }
            }
        }
    }

    /// Call `cb` once per merged decoration path, grouped by identical fill.
    pub fn walk_decorations(&self, mut cb: impl FnMut(&Paint, &Path)) {
        for (paint, path) in self.decoration_paths() {
            cb(&paint, &path);
        }
    }

    /// Build decoration paths: contiguous spans sharing a decoration and
    /// fill extend one decoration run per line; runs with the same fill are
    /// merged into a single path across the whole text.
    fn decoration_paths(&self) -> Vec<(Paint, Path)> {
        struct DecoRun {
            deco: Decoration,
            fill: Paint,
            x: f32,
            width: f32,
            face: Arc<FontFace>,
        }

        let mut fills: Vec<Paint> = Vec::new();
        let mut builders: Vec<PathBuilder> = Vec::new();
        for line in &self.lines {
            let mut active: Vec<DecoRun> = Vec::new();
            let last_span = line.spans.len().saturating_sub(1);
            for (k, span) in line.spans.iter().enumerate() {
                let prior = active.len();
                let mut extended = vec![false; prior];
                for &deco in &span.face.decorations {
                    match active
                        .iter()
                        .position(|run| run.fill == span.face.fill && run.deco == deco)
                    {
                        Some(i) => {
                            active[i].width = span.x + span.width - active[i].x;
                            if active[i].face.size < span.face.size {
                                active[i].face = span.face.clone();
                            }
                            if i < prior {
                                extended[i] = true;
                            }
                        }
                        None => active.push(DecoRun {
                            deco,
                            fill: span.face.fill,
                            x: span.x,
                            width: span.width,
                            face: span.face.clone(),
                        }),
                    }
                }

                // Flush runs no longer extended; everything at the line end.
                let flush_all = k == last_span;
                let upper = if flush_all { active.len() } else { prior };
                for i in (0..upper).rev() {
                    if !flush_all && extended[i] {
                        continue;
                    }
                    let run = active.remove(i);
                    let Some(path) = run.deco.decorate(&run.face.metrics(), run.width) else {
                        continue;
                    };
                    let dx = run.x + run.face.x_offset;
                    let dy = -line.y + run.face.y_offset;
                    let Some(path) = path.transform(Transform::from_translate(dx, dy)) else {
                        continue;
                    };
                    match fills.iter().position(|f| *f == run.fill) {
                        Some(f) => append_path(&mut builders[f], &path),
                        None => {
                            fills.push(run.fill);
                            let mut builder = PathBuilder::new();
                            append_path(&mut builder, &path);
                            builders.push(builder);
                        }
                    }
                }
            }
        }

        fills
            .into_iter()
            .zip(builders)
            .filter_map(|(fill, builder)| builder.finish().map(|path| (fill, path)))
            .collect()
    }

    /// Render decorations, glyph outlines and embedded objects through the
    /// renderer. When a resolution is given and the face's hinting allows,
    /// unrotated spans are snapped to the vertical pixel grid.
    pub fn render_as_path(
        &self,
        renderer: &mut dyn Renderer,
        transform: Transform,
        resolution: Resolution,
    ) -> Result<()> {
        for (paint, path) in self.decoration_paths() {
            renderer.fill_path(&path, &paint, transform);
        }

        for line in &self.lines {
            for span in &line.spans {
                let (x, y) = if self.mode == WritingMode::HorizontalTb {
                    (span.x, -line.y)
                } else {
                    (line.y, -span.x)
                };
                match &span.content {
                    SpanContent::Glyphs(glyphs) => {
                        let Some(mut path) = span.face.to_path(glyphs)? else {
                            continue;
                        };
                        if span.rotation != Rotation::None {
                            path = path
                                .transform(Transform::from_rotate(span.rotation.degrees()))
                                .ok_or_else(|| {
                                    TextError::PathConversion("rotation transform".into())
                                })?;
                        }
                        let mut y = y;
                        if resolution.is_set()
                            && span.face.hinting != Hinting::None
                            && span.rotation == Rotation::None
                        {
                            // Grid-align vertically for sharper rendering.
                            let dy = transform.ty + y;
                            y += (dy * resolution.0 + 0.5).floor() / resolution.0 - dy;
                        }
                        path = path
                            .transform(Transform::from_translate(x, y))
                            .ok_or_else(|| {
                                TextError::PathConversion("translation transform".into())
                            })?;
                        renderer.fill_path(&path, &span.face.fill, transform);
                    }
                    SpanContent::Object(obj) => {
                        let view = obj.view(x, y, &span.face);
                        obj.drawable.draw(renderer, transform.pre_concat(view))?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Replay a path's segments into a builder.
fn append_path(builder: &mut PathBuilder, path: &Path) {
    for segment in path.segments() {
        match segment {
            PathSegment::MoveTo(p) => builder.move_to(p.x, p.y),
            PathSegment::LineTo(p) => builder.line_to(p.x, p.y),
            PathSegment::QuadTo(p1, p) => builder.quad_to(p1.x, p1.y, p.x, p.y),
            PathSegment::CubicTo(p1, p2, p) => {
                builder.cubic_to(p1.x, p1.y, p2.x, p2.y, p.x, p.y)
            }
            PathSegment::Close => builder.close(),
        }
    }
}

/// Insertion-order counting; used by the majority vote.
fn vote<T: PartialEq>(counts: &mut Vec<(T, usize)>, value: T) {
    match counts.iter_mut().find(|(v, _)| *v == value) {
        Some(e) => e.1 += 1,
        None => counts.push((value, 1)),
    }
}

/// Strictly-greater comparison keeps the first-seen entry on ties.
fn winner<T: Clone>(counts: &[(T, usize)]) -> Option<T> {
    let mut best: Option<(&T, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, bc)| *count > bc) {
            best = Some((value, *count));
        }
    }
    best.map(|(v, _)| v.clone())
}
