//! End-to-end layout tests over a deterministic fixed-metric font backend.
//!
//! The backend shapes one glyph per rune at 500 font units (250 for spaces)
//! and returns right-to-left runs in visual order, like a real shaper. At
//! size 10 that makes every glyph 5px wide, spaces 2.5px, ascent 8px,
//! descent 2px and line gap 1px.

use std::sync::Arc;

use burin_text::{
    Direction, Drawable, Feature, Font, FontBackend, FontFace, FontMetrics, LayoutStyle, Paint,
    Renderer, Resolution, RichText, Script, ShapeOutput, ShapedGlyph, Text, TextAlign,
    VerticalAlign, WritingMode,
};
use tiny_skia::Transform;

#[derive(Debug)]
struct TestBackend {
    metrics: FontMetrics,
}

impl Default for TestBackend {
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

impl FontBackend for TestBackend {
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
    ) -> burin_text::Result<bool> {
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
    ) -> burin_text::Result<ShapeOutput> {
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

fn font() -> Arc<Font> {
    Arc::new(Font::new(Box::new(TestBackend::default())))
}

fn face() -> FontFace {
    font().face(10.0)
}

fn layout(text: &str, style: &LayoutStyle) -> Text {
    let mut rt = RichText::new(face());
    rt.write(text);
    rt.to_text(style).expect("layout")
}

#[test]
fn scenario_a_single_line_single_span() {
    let text = layout("Hello", &LayoutStyle::new());
    assert_eq!(text.lines().len(), 1);
    let line = &text.lines()[0];
    assert_eq!(line.spans().len(), 1);
    let span = &line.spans()[0];
    assert_eq!(span.text, "Hello");
    assert_eq!(span.width, 25.0);
    // Baseline sits at the face ascent.
    assert_eq!(line.baseline(), 8.0);
    assert!(!text.overflowed());
    assert_eq!(text.text(), "Hello");
}

#[test]
fn scenario_b_one_word_per_line() {
    // One 15px word per 16px line.
    let text = layout(
        "aaa bbb",
        &LayoutStyle::new().size(16.0, 0.0),
    );
    assert!(!text.overflowed());
    assert_eq!(text.lines().len(), 2);
    for line in text.lines() {
        assert_eq!(line.spans().len(), 1);
    }
    // The breaking space folds into the first span's text, not into a span
    // of its own, and does not widen it.
    let first = &text.lines()[0].spans()[0];
    assert_eq!(first.text, "aaa ");
    assert_eq!(first.width, 15.0);
    assert_eq!(text.lines()[1].spans()[0].text, "bbb");
    assert_eq!(text.lines()[0].baseline(), 8.0);
    // ascent + descent + line gap below the previous baseline
    assert_eq!(text.lines()[1].baseline(), 19.0);
}

#[test]
fn scenario_c_justify_stretches_all_but_last_line() {
    let text = layout(
        "aaa bbb ccc",
        &LayoutStyle::new()
            .size(34.0, 0.0)
            .align(TextAlign::Justify, TextAlign::Top),
    );
    assert!(!text.overflowed());
    assert_eq!(text.lines().len(), 2);

    // First line: two spans with the stretched space between them; the line
    // fills the box exactly.
    let spans = text.lines()[0].spans();
    assert_eq!(spans.len(), 2);
    let end = spans.last().unwrap().x + spans.last().unwrap().width;
    assert!((end - 34.0).abs() < 1e-3, "justified line ends at {end}");

    // Last line keeps its natural width.
    let spans = text.lines()[1].spans();
    let end = spans.last().unwrap().x + spans.last().unwrap().width;
    assert!((end - 15.0).abs() < 1e-3, "final line ends at {end}");
}

#[test]
fn scenario_d_mixed_direction_restores_visual_order() {
    let text = layout("ab \u{05D0}\u{05D1} cd", &LayoutStyle::new());
    assert_eq!(text.lines().len(), 1);
    let spans = text.lines()[0].spans();
    assert_eq!(spans.len(), 3);

    // Span x offsets are monotonic in visual order.
    for pair in spans.windows(2) {
        assert!(pair[0].x < pair[1].x);
    }

    // The embedded right-to-left span is in visual order: cluster offsets
    // run against the logical direction.
    let rtl = &spans[1];
    assert_eq!(rtl.text, "\u{05D0}\u{05D1}");
    assert_eq!(rtl.direction, Direction::RightToLeft);
    let clusters: Vec<u32> = rtl.glyphs().iter().map(|g| g.cluster).collect();
    assert_eq!(clusters, vec![5, 3]);
}

#[test]
fn scenario_e_height_too_small_truncates_to_empty() {
    let text = layout("Hello", &LayoutStyle::new().size(100.0, 5.0));
    assert_eq!(text.lines().len(), 0);
    assert!(text.overflowed());
    assert_eq!(text.text(), "");
}

#[test]
fn p5_reversal_applied_and_undone_once() {
    let rtl = layout("\u{05D0}\u{05D1}", &LayoutStyle::new());
    let rtl_clusters: Vec<u32> = rtl.lines()[0].spans()[0]
        .glyphs()
        .iter()
        .map(|g| g.cluster)
        .collect();

    let mut rt = RichText::new(face().with_direction(Direction::LeftToRight));
    rt.write("\u{05D0}\u{05D1}");
    let ltr = rt.to_text(&LayoutStyle::new()).expect("layout");
    let mut ltr_clusters: Vec<u32> = ltr.lines()[0].spans()[0]
        .glyphs()
        .iter()
        .map(|g| g.cluster)
        .collect();
    ltr_clusters.reverse();

    // Net effect of the breaking-order reversal and its undo is exactly the
    // shaper's visual order.
    assert_eq!(rtl_clusters, ltr_clusters);
}

#[test]
fn p6_empty_input_is_not_an_error() {
    let text = layout("", &LayoutStyle::new());
    assert!(text.is_empty());
    assert!(!text.overflowed());
    assert!(text.lines().len() <= 1);
    let (w, h) = text.size();
    assert_eq!((w, h), (0.0, 0.0));
}

#[test]
fn soft_hyphen_break_realizes_hyphen() {
    let text = layout(
        "aaaa\u{00AD}bbbb",
        &LayoutStyle::new().size(25.0, 0.0),
    );
    assert!(!text.overflowed());
    assert_eq!(text.lines().len(), 2);
    let first = &text.lines()[0].spans()[0];
    assert!(first.text.ends_with('-'), "got {:?}", first.text);
    // Four letters plus the realized hyphen.
    assert_eq!(first.glyphs().len(), 5);
    assert_eq!(first.width, 25.0);
    let second = &text.lines()[1].spans()[0];
    assert_eq!(second.text, "bbbb");
}

#[test]
fn height_truncation_keeps_leading_lines() {
    let text = layout("aaa bbb", &LayoutStyle::new().size(16.0, 12.0));
    assert!(text.overflowed());
    assert_eq!(text.lines().len(), 1);
    assert_eq!(text.lines()[0].spans()[0].text, "aaa ");
    assert_eq!(text.text(), "aaa ");
}

#[test]
fn breaking_infeasibility_is_reported_not_fatal() {
    let text = layout("aaa", &LayoutStyle::new().size(2.0, 0.0));
    assert!(text.overflowed());
    assert!(!text.lines().is_empty());
    assert_eq!(text.lines()[0].spans()[0].text, "aaa");
}

#[test]
fn indent_offsets_first_line() {
    let text = layout(
        "aaa bbb",
        &LayoutStyle::new().size(50.0, 0.0).indent(5.0),
    );
    assert_eq!(text.lines().len(), 1);
    assert_eq!(text.lines()[0].spans()[0].x, 5.0);
}

#[test]
fn line_stretch_scales_spacing() {
    let text = layout(
        "aaa bbb",
        &LayoutStyle::new().size(16.0, 0.0).line_stretch(0.5),
    );
    assert_eq!(text.lines().len(), 2);
    assert_eq!(text.lines()[0].baseline(), 8.0);
    // bottom of line one scaled by 1.5, ascent of line two scaled by 1.5
    assert_eq!(text.lines()[1].baseline(), 8.0 + 4.5 + 12.0);
}

#[derive(Debug)]
struct Badge;

impl Drawable for Badge {
    fn size(&self) -> (f32, f32) {
        (4.0, 4.0)
    }

    fn draw(&self, _renderer: &mut dyn Renderer, _transform: Transform) -> burin_text::Result<()> {
        Ok(())
    }
}

#[test]
fn embedded_object_becomes_own_span() {
    let mut rt = RichText::new(face());
    rt.write("ab");
    rt.add_object(Arc::new(Badge), VerticalAlign::Baseline);
    rt.write("cd");
    let text = rt.to_text(&LayoutStyle::new()).expect("layout");

    assert_eq!(text.lines().len(), 1);
    let spans = text.lines()[0].spans();
    assert_eq!(spans.len(), 3);
    assert!(spans[0].is_text());
    let object = spans[1].object().expect("object span");
    assert_eq!(object.width, 4.0);
    assert_eq!(spans[1].x, 10.0);
    assert_eq!(spans[1].width, 4.0);
    assert_eq!(spans[2].x, 14.0);
    assert_eq!(spans[2].text, "cd");
}

#[test]
fn decorations_merge_into_one_path() {
    let mut rt = RichText::new(face().with_decoration(burin_text::Decoration::Underline));
    rt.write("aaa bbb");
    let text = rt.to_text(&LayoutStyle::new()).expect("layout");

    let mut count = 0;
    let mut width = 0.0;
    text.walk_decorations(|paint, path| {
        count += 1;
        width = path.bounds().width();
        assert_eq!(*paint, Paint::default());
    });
    assert_eq!(count, 1);
    assert!((width - 32.5).abs() < 1e-3, "underline width {width}");
}

#[test]
fn most_common_face_majority_and_tie_break() {
    let mut rt = RichText::new(face());
    rt.write("aaaa");
    rt.set_face(font().face(12.0));
    rt.write("b");
    let text = rt.to_text(&LayoutStyle::new()).expect("layout");

    // One span each: the tie goes to the first-seen size.
    let common = text.most_common_face().expect("face");
    assert_eq!(common.size, 10.0);
}

#[test]
fn fonts_deduplicated_and_sorted() {
    let text = layout("Hello", &LayoutStyle::new());
    let fonts = text.fonts();
    assert_eq!(fonts.len(), 1);
    assert_eq!(fonts[0].name(), "Testium");
}

#[test]
fn vertical_writing_lays_out_columns() {
    let mut rt = RichText::new(face());
    rt.set_writing_mode(WritingMode::VerticalRl);
    rt.write("\u{4E2D}\u{6587}");
    let text = rt
        .to_text(&LayoutStyle::new().size(20.0, 30.0))
        .expect("layout");

    assert_eq!(text.writing_mode(), WritingMode::VerticalRl);
    assert_eq!(text.lines().len(), 1);
    let span = &text.lines()[0].spans()[0];
    // Two CJK glyphs advancing 10px each down the column.
    assert_eq!(span.width, 20.0);
    assert!(span.glyphs().iter().all(|g| g.vertical));
    // The left-aligned block's column baseline is mirrored from the right.
    assert!((text.lines()[0].baseline() - 3.0).abs() < 1e-3);
}

#[test]
fn new_line_splits_paragraphs_and_centers() {
    let text = Text::new_line(face(), "Hello\nWorld", TextAlign::Center).expect("line");
    assert_eq!(text.lines().len(), 2);
    assert_eq!(text.lines()[0].baseline(), 0.0);
    // ascent + descent + line gap
    assert_eq!(text.lines()[1].baseline(), 11.0);
    assert_eq!(text.lines()[0].spans()[0].x, -12.5);

    let crlf = Text::new_line(face(), "a\r\nb", TextAlign::Left).expect("line");
    assert_eq!(crlf.lines().len(), 2);
}

#[test]
fn walkers_report_positions() {
    let text = layout("aaa bbb", &LayoutStyle::new().size(16.0, 0.0));
    let mut baselines = Vec::new();
    text.walk_lines(|y, spans| {
        baselines.push(y);
        assert_eq!(spans.len(), 1);
    });
    assert_eq!(baselines, vec![-8.0, -19.0]);

    let mut count = 0;
    text.walk_spans(|x, y, _span| {
        assert_eq!(x, 0.0);
        assert!(y < 0.0);
        count += 1;
    });
    assert_eq!(count, 2);
}

#[test]
fn bounds_cover_spans() {
    let text = layout("aaa bbb", &LayoutStyle::new().size(16.0, 0.0));
    let bounds = text.bounds();
    assert_eq!(bounds.w, 15.0);
    // Ascent of the first line down to the descent of the second.
    assert_eq!(bounds.y, -19.0 - 2.0);
    assert_eq!(bounds.h, 8.0 + 11.0 + 2.0);

    let (top, bottom) = text.heights();
    assert_eq!(top, 0.0);
    assert_eq!(bottom, 21.0);
}

#[test]
fn vertical_bounds_transpose_axes() {
    let mut rt = RichText::new(face());
    rt.set_writing_mode(WritingMode::VerticalRl);
    rt.write("\u{4E2D}\u{6587}");
    let text = rt
        .to_text(&LayoutStyle::new().size(20.0, 30.0))
        .expect("layout");
    let bounds = text.bounds();
    // The column runs down the block axis; face extents span the inline
    // axis.
    assert_eq!(bounds.h, 20.0);
    assert_eq!(bounds.w, 10.0);
}

#[test]
fn outline_bounds_covers_glyphs() {
    let text = layout("Hello", &LayoutStyle::new());
    let bounds = text.outline_bounds().expect("outline bounds");
    assert!(bounds.w >= 25.0 - 1e-3);
    assert!(bounds.h > 0.0);
}

#[test]
fn render_as_path_visits_every_span() {
    struct Counter {
        paths: usize,
    }

    impl Renderer for Counter {
        fn fill_path(&mut self, _path: &tiny_skia::Path, _paint: &Paint, _transform: Transform) {
            self.paths += 1;
        }
    }

    let text = layout("aaa bbb", &LayoutStyle::new().size(16.0, 0.0));
    let mut counter = Counter { paths: 0 };
    text.render_as_path(&mut counter, Transform::identity(), Resolution(0.0))
        .expect("render");
    // One outline path per line's span.
    assert_eq!(counter.paths, 2);
}
