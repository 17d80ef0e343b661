//! Line-breaking token stream
//!
//! Converts the shaped glyph sequence into the box/glue/penalty items the
//! paragraph breaker operates on. Every item records how many glyphs it
//! consumes (`size`) so the assembler can replay the stream against the
//! glyph sequence.

use super::BreakPolicy;
use crate::shaping::{is_paragraph_separator, is_spaceless_script, Glyph};

pub const SOFT_HYPHEN: char = '\u{00AD}';

/// A line-breaking token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Item {
    /// Unbreakable content
    Box { width: f32, size: usize },
    /// Breakable, flexible space
    Glue {
        width: f32,
        stretch: f32,
        shrink: f32,
        size: usize,
    },
    /// Optional break point; cost of negative infinity forces a break,
    /// positive infinity forbids one
    Penalty {
        width: f32,
        cost: f32,
        flagged: bool,
        size: usize,
    },
}

impl Item {
    pub fn size(&self) -> usize {
        match *self {
            Item::Box { size, .. } | Item::Glue { size, .. } | Item::Penalty { size, .. } => size,
        }
    }

    pub fn width(&self) -> f32 {
        match *self {
            Item::Box { width, .. } | Item::Glue { width, .. } | Item::Penalty { width, .. } => {
                width
            }
        }
    }

    pub fn is_box(&self) -> bool {
        matches!(self, Item::Box { .. })
    }

    pub fn is_glue(&self) -> bool {
        matches!(self, Item::Glue { .. })
    }

    pub fn is_penalty(&self) -> bool {
        matches!(self, Item::Penalty { .. })
    }

    pub(crate) fn add_size(&mut self, extra: usize) {
        match self {
            Item::Box { size, .. } | Item::Glue { size, .. } | Item::Penalty { size, .. } => {
                *size += extra
            }
        }
    }
}

fn is_breakable_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t')
}

/// Wider justified spaces after sentence punctuation, with closing quotes
/// and brackets skipped when looking back.
fn space_factor(glyphs: &[Glyph], space_at: usize) -> f32 {
    let mut j = space_at;
    while j > 0 {
        j -= 1;
        match glyphs[j].ch {
            ')' | ']' | '\'' | '"' | '\u{201D}' | '\u{2019}' => continue,
            '.' | '!' | '?' => return 3.0,
            ':' | ';' => return 2.0,
            ',' => return 1.25,
            _ => break,
        }
    }
    1.0
}

/// Convert shaped glyphs into an ordered item stream.
///
/// A leading box carries the first-line indent (zero-width when no indent is
/// requested; the coalescer drops it). The stream always ends in a finishing
/// glue plus a forced break so the final line closes.
pub fn glyphs_to_items(
    glyphs: &[Glyph],
    indent: f32,
    justify: bool,
    policy: &BreakPolicy,
) -> Vec<Item> {
    if glyphs.is_empty() {
        return Vec::new();
    }

    let mut items = vec![Item::Box {
        width: indent,
        size: 0,
    }];
    for (i, glyph) in glyphs.iter().enumerate() {
        if is_breakable_space(glyph.ch) {
            let factor = if justify && !policy.french_spacing {
                space_factor(glyphs, i)
            } else {
                1.0
            };
            let width = glyph.advance();
            items.push(Item::Glue {
                width,
                stretch: width * policy.space_stretch * factor,
                shrink: width * policy.space_shrink / factor,
                size: 1,
            });
        } else if is_paragraph_separator(glyph.ch) {
            items.push(Item::Glue {
                width: 0.0,
                stretch: f32::INFINITY,
                shrink: 0.0,
                size: 1,
            });
            items.push(Item::Penalty {
                width: 0.0,
                cost: f32::NEG_INFINITY,
                flagged: false,
                size: 0,
            });
        } else if glyph.ch == SOFT_HYPHEN {
            items.push(Item::Penalty {
                width: glyph.advance(),
                cost: policy.hyphen_penalty,
                flagged: true,
                size: 1,
            });
        } else {
            let advance = glyph.advance();
            match items.last_mut() {
                Some(Item::Box { width, size }) => {
                    *width += advance;
                    *size += 1;
                }
                _ => items.push(Item::Box {
                    width: advance,
                    size: 1,
                }),
            }
            if is_spaceless_script(glyph.script) {
                items.push(Item::Penalty {
                    width: 0.0,
                    cost: 0.0,
                    flagged: false,
                    size: 0,
                });
            }
        }
    }

    if !matches!(
        items.last(),
        Some(Item::Penalty { cost, .. }) if *cost == f32::NEG_INFINITY
    ) {
        items.push(Item::Glue {
            width: 0.0,
            stretch: f32::INFINITY,
            shrink: 0.0,
            size: 0,
        });
        items.push(Item::Penalty {
            width: 0.0,
            cost: f32::NEG_INFINITY,
            flagged: false,
            size: 0,
        });
    }
    items
}
