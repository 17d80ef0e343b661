//! Post-break token cleanup
//!
//! With the breakpoints chosen, the item stream is compacted for assembly:
//! the empty indent box is dropped, glue adjacent to a break is folded into
//! the break item, non-breaking artifacts are removed and adjacent
//! boxes/glues merge. The pass conserves the total glyph count carried by
//! the items.

use super::{Breakpoint, Item};

/// The adjustment ratio assembly will actually apply to the current line:
/// zero unless the text is justified.
fn effective_ratio(breaks: &[Breakpoint], j: usize, justify: bool) -> f32 {
    if !justify {
        return 0.0;
    }
    breaks.get(j).or_else(|| breaks.last()).map_or(0.0, |b| b.ratio)
}

/// Compact `items` against the chosen breakpoints, rewriting break
/// positions in place.
pub fn coalesce(mut items: Vec<Item>, breaks: &mut [Breakpoint], justify: bool) -> Vec<Item> {
    let mut shift = 0usize;
    if matches!(
        items.first(),
        Some(Item::Box { width, size: 0 }) if *width == 0.0
    ) {
        items.remove(0);
        shift += 1;
    }

    let mut j = 0usize;
    let mut k = 0usize;
    while k < items.len() {
        let is_break =
            j < breaks.len() && k as isize == breaks[j].position as isize - shift as isize;
        if is_break {
            breaks[j].position -= shift;
            j += 1;
            k += 1;
            continue;
        }
        let ratio = effective_ratio(breaks, j, justify);

        let before_prev_break = k > 0 && j > 0 && k - 1 == breaks[j - 1].position;
        let before_next_break = j < breaks.len()
            && (k + 1) as isize == breaks[j].position as isize - shift as isize;

        if items[k].is_glue() && before_prev_break {
            // Fold spaces at the beginning of the line into the break.
            let size = items[k].size();
            items[k - 1].add_size(size);
            items.remove(k);
            shift += 1;
        } else if items[k].is_glue() && k + 1 < items.len() && before_next_break {
            // Fold spaces at the end of the line into the break.
            let size = items[k].size();
            items[k + 1].add_size(size);
            items.remove(k);
            shift += 1;
        } else if items[k].is_penalty() && items[k].size() == 0 {
            // Non-breaking penalties carry nothing.
            items.remove(k);
            shift += 1;
        } else if items[k].is_glue() && items[k].size() == 0 && ratio == 0.0 {
            // Empty glue on an unadjusted line.
            items.remove(k);
            shift += 1;
        } else if k > 0 && items[k].is_glue() && items[k - 1].is_glue() {
            let Item::Glue {
                width,
                stretch,
                shrink,
                size,
            } = items[k]
            else {
                unreachable!()
            };
            let Item::Glue {
                width: pw,
                stretch: ps,
                shrink: pz,
                size: psize,
            } = &mut items[k - 1]
            else {
                unreachable!()
            };
            *pw += width;
            *ps += stretch;
            *pz += shrink;
            *psize += size;
            items.remove(k);
            shift += 1;
            // Re-scan in case the merge exposed a box-glue pair.
            k -= 1;
        } else if k > 0
            && items[k].is_box()
            && items[k - 1].is_box()
            && items[k - 1].size() > 0
        {
            // Merge boxes; the zero-size indent box stays separate so its
            // width offsets the first line instead of widening a span.
            let (width, size) = (items[k].width(), items[k].size());
            let Item::Box {
                width: pw,
                size: psize,
            } = &mut items[k - 1]
            else {
                unreachable!()
            };
            *pw += width;
            *psize += size;
            items.remove(k);
            shift += 1;
        } else if k > 0 && items[k].is_glue() && items[k - 1].is_box() && {
            let Item::Glue {
                stretch, shrink, ..
            } = items[k]
            else {
                unreachable!()
            };
            ratio == 0.0 || (stretch == 0.0 && shrink == 0.0)
        } {
            // A plain inter-word space on an unadjusted line becomes part of
            // the preceding box.
            let (width, size) = (items[k].width(), items[k].size());
            let Item::Box {
                width: pw,
                size: psize,
            } = &mut items[k - 1]
            else {
                unreachable!()
            };
            *pw += width;
            *psize += size;
            items.remove(k);
            shift += 1;
        } else {
            k += 1;
        }
    }

    items
}
