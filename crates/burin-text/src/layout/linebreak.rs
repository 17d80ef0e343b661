//! Optimal paragraph breaking
//!
//! Classical optimal-fit (Knuth-Plass) search over the item stream: a set of
//! active breakpoint candidates is carried forward, each tracking the width,
//! stretch and shrink accumulated since its break. At every legal breakpoint
//! the adjustment ratio to the target width is computed, infeasible
//! candidates (beyond maximum shrink) are pruned, and the best candidate per
//! fitness class survives. When no feasible candidate remains, an overfull
//! break is forced and the layout is reported as infeasible; callers always
//! receive a usable breakpoint list.

use tracing::warn;

use super::{BreakPolicy, Item};

/// A chosen line break.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    /// Index of the break item in the token stream
    pub position: usize,
    /// Adjustment ratio of the line ending here: negative means shrink was
    /// used (-1 is maximum shrink), positive means stretch.
    pub ratio: f32,
    /// Natural (unadjusted) width of the line ending here
    pub width: f32,
}

impl Breakpoint {
    pub fn new(position: usize, width: f32) -> Self {
        Self {
            position,
            ratio: 0.0,
            width,
        }
    }
}

/// Tight / normal / loose / very loose.
fn fitness_class(ratio: f32) -> usize {
    if ratio < -0.5 {
        0
    } else if ratio <= 0.5 {
        1
    } else if ratio <= 1.0 {
        2
    } else {
        3
    }
}

fn badness(ratio: f32) -> f32 {
    let r = ratio.abs().min(1000.0);
    100.0 * r * r * r
}

/// Accumulated width and flexibility. Infinitely stretchable or shrinkable
/// glue is counted separately so that differences between two accumulation
/// points stay well defined.
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    width: f32,
    stretch: f32,
    stretch_inf: u32,
    shrink: f32,
    shrink_inf: u32,
}

impl Totals {
    fn add_glue(&mut self, width: f32, stretch: f32, shrink: f32) {
        self.width += width;
        if stretch.is_infinite() {
            self.stretch_inf += 1;
        } else {
            self.stretch += stretch;
        }
        if shrink.is_infinite() {
            self.shrink_inf += 1;
        } else {
            self.shrink += shrink;
        }
    }

    /// Stretch available since `since`.
    fn stretch_since(&self, since: &Totals) -> f32 {
        if self.stretch_inf > since.stretch_inf {
            f32::INFINITY
        } else {
            self.stretch - since.stretch
        }
    }

    /// Shrink available since `since`.
    fn shrink_since(&self, since: &Totals) -> f32 {
        if self.shrink_inf > since.shrink_inf {
            f32::INFINITY
        } else {
            self.shrink - since.shrink
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    parent: Option<usize>,
    /// Item index of the break; -1 for the paragraph start
    position: isize,
    line: usize,
    fitness: usize,
    /// Accumulated totals just after this break
    totals: Totals,
    ratio: f32,
    line_width: f32,
    flagged: bool,
    demerits: f32,
}

/// A candidate considered at one breakpoint.
#[derive(Debug, Clone, Copy)]
struct Attempt {
    demerits: f32,
    parent: usize,
    ratio: f32,
    line_width: f32,
}

struct Linebreaker<'a> {
    items: &'a [Item],
    width: f32,
    policy: &'a BreakPolicy,
    nodes: Vec<Node>,
    active: Vec<usize>,
    totals: Totals,
    feasible: bool,
}

impl<'a> Linebreaker<'a> {
    fn new(items: &'a [Item], width: f32, policy: &'a BreakPolicy) -> Self {
        let start = Node {
            parent: None,
            position: -1,
            line: 0,
            fitness: 1,
            totals: Totals::default(),
            ratio: 0.0,
            line_width: 0.0,
            flagged: false,
            demerits: 0.0,
        };
        Self {
            items,
            width,
            policy,
            nodes: vec![start],
            active: vec![0],
            totals: Totals::default(),
            feasible: true,
        }
    }

    fn run(&mut self) {
        for b in 0..self.items.len() {
            match self.items[b] {
                Item::Box { width, .. } => self.totals.width += width,
                Item::Glue {
                    width,
                    stretch,
                    shrink,
                    ..
                } => {
                    if b > 0 && self.items[b - 1].is_box() {
                        self.try_break(b, 0.0, 0.0, false, Some((width, stretch, shrink)));
                    }
                    self.totals.add_glue(width, stretch, shrink);
                }
                Item::Penalty {
                    width,
                    cost,
                    flagged,
                    ..
                } => {
                    if cost < f32::INFINITY {
                        self.try_break(b, width, cost, flagged, None);
                    }
                }
            }
        }
    }

    /// Ratio needed to fit the line from `node` to the current breakpoint,
    /// and that line's natural width.
    fn ratio_from(&self, node: &Node, penalty_width: f32) -> (f32, f32) {
        let natural = self.totals.width - node.totals.width + penalty_width;
        let ratio = if natural < self.width {
            let stretch = self.totals.stretch_since(&node.totals);
            if stretch > 0.0 {
                if stretch.is_infinite() {
                    0.0
                } else {
                    (self.width - natural) / stretch
                }
            } else {
                f32::INFINITY
            }
        } else if natural > self.width {
            let shrink = self.totals.shrink_since(&node.totals);
            if shrink > 0.0 {
                if shrink.is_infinite() {
                    0.0
                } else {
                    (self.width - natural) / shrink
                }
            } else {
                f32::NEG_INFINITY
            }
        } else {
            0.0
        };
        (ratio, natural)
    }

    fn try_break(
        &mut self,
        b: usize,
        penalty_width: f32,
        cost: f32,
        flagged: bool,
        glue: Option<(f32, f32, f32)>,
    ) {
        let forced = cost == f32::NEG_INFINITY;
        let mut best: [Option<Attempt>; 4] = [None; 4];
        let mut best_overfull: Option<Attempt> = None;
        let mut survivors = Vec::with_capacity(self.active.len());

        for &a in &self.active {
            let node = self.nodes[a];
            let (ratio, line_width) = self.ratio_from(&node, penalty_width);

            if ratio < -1.0 || forced {
                // This candidate cannot reach any later breakpoint either;
                // keep the best of them around for overfull recovery.
                if best_overfull.map_or(true, |o| node.demerits < o.demerits) {
                    best_overfull = Some(Attempt {
                        demerits: node.demerits,
                        parent: a,
                        ratio: ratio.max(-1.0),
                        line_width,
                    });
                }
            } else {
                survivors.push(a);
            }

            if ratio >= -1.0 && ratio <= self.policy.tolerance {
                let mut demerits = (self.policy.line_penalty + badness(ratio)).powi(2);
                if cost >= 0.0 {
                    demerits += cost * cost;
                } else if cost.is_finite() {
                    demerits -= cost * cost;
                }
                if flagged && node.flagged {
                    demerits += self.policy.flagged_demerits;
                }
                let class = fitness_class(ratio);
                if class.abs_diff(node.fitness) > 1 {
                    demerits += self.policy.fitness_demerits;
                }
                demerits += node.demerits;

                // Strict comparison keeps the earlier candidate on ties.
                if best[class].map_or(true, |e| demerits < e.demerits) {
                    best[class] = Some(Attempt {
                        demerits,
                        parent: a,
                        ratio,
                        line_width,
                    });
                }
            }
        }

        self.active = survivors;

        let mut after = self.totals;
        if let Some((width, stretch, shrink)) = glue {
            after.add_glue(width, stretch, shrink);
        }

        let mut inserted = false;
        for (class, attempt) in best.iter().enumerate() {
            if let Some(attempt) = *attempt {
                self.insert(b, class, attempt, flagged, after);
                inserted = true;
            }
        }

        if self.active.is_empty() && !inserted {
            if let Some(attempt) = best_overfull {
                warn!(position = b, "no feasible break, forcing an overfull line");
                self.feasible = false;
                self.insert(b, fitness_class(attempt.ratio), attempt, flagged, after);
            }
        }
    }

    fn insert(&mut self, b: usize, fitness: usize, attempt: Attempt, flagged: bool, after: Totals) {
        let parent = self.nodes[attempt.parent];
        let node = Node {
            parent: Some(attempt.parent),
            position: b as isize,
            line: parent.line + 1,
            fitness,
            totals: after,
            ratio: attempt.ratio.max(-1.0),
            line_width: attempt.line_width,
            flagged,
            demerits: attempt.demerits,
        };
        self.nodes.push(node);
        self.active.push(self.nodes.len() - 1);
    }

    fn choose(&self) -> Option<usize> {
        let last = self.items.len() as isize - 1;
        let finals: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.nodes[i].position == last)
            .collect();
        let best = finals
            .iter()
            .copied()
            .min_by(|&a, &b| self.nodes[a].demerits.total_cmp(&self.nodes[b].demerits))?;
        if self.policy.looseness == 0 {
            return Some(best);
        }
        let target = self.nodes[best].line as i64 + self.policy.looseness as i64;
        finals.into_iter().min_by(|&a, &b| {
            let da = (self.nodes[a].line as i64 - target).abs();
            let db = (self.nodes[b].line as i64 - target).abs();
            da.cmp(&db)
                .then(self.nodes[a].demerits.total_cmp(&self.nodes[b].demerits))
        })
    }
}

/// Compute the optimal breakpoints for a target line width.
///
/// The boolean result is false when the content cannot fit the width even at
/// maximum shrink; the returned breakpoints still describe a usable,
/// overflowing layout.
pub fn linebreak(items: &[Item], width: f32, policy: &BreakPolicy) -> (Vec<Breakpoint>, bool) {
    if items.is_empty() {
        return (vec![Breakpoint::new(0, 0.0)], true);
    }

    let mut lb = Linebreaker::new(items, width, policy);
    lb.run();

    let Some(mut at) = lb.choose() else {
        // The stream did not end in a forced break; close it at the end.
        let width = lb.totals.width;
        return (vec![Breakpoint::new(items.len() - 1, width)], false);
    };

    let mut breaks = Vec::with_capacity(lb.nodes[at].line);
    loop {
        let node = &lb.nodes[at];
        if node.position < 0 {
            break;
        }
        breaks.push(Breakpoint {
            position: node.position as usize,
            ratio: node.ratio,
            width: node.line_width,
        });
        match node.parent {
            Some(p) => at = p,
            None => break,
        }
    }
    breaks.reverse();
    (breaks, lb.feasible)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(width: f32, size: usize) -> Item {
        Item::Box { width, size }
    }

    fn glue(width: f32, stretch: f32, shrink: f32) -> Item {
        Item::Glue {
            width,
            stretch,
            shrink,
            size: 1,
        }
    }

    fn finish() -> Vec<Item> {
        vec![
            Item::Glue {
                width: 0.0,
                stretch: f32::INFINITY,
                shrink: 0.0,
                size: 0,
            },
            Item::Penalty {
                width: 0.0,
                cost: f32::NEG_INFINITY,
                flagged: false,
                size: 0,
            },
        ]
    }

    fn two_words() -> Vec<Item> {
        let mut items = vec![
            boxed(0.0, 0),
            boxed(10.0, 2),
            glue(5.0, 2.5, 5.0 / 3.0),
            boxed(10.0, 2),
        ];
        items.extend(finish());
        items
    }

    #[test]
    fn test_empty_items() {
        let (breaks, ok) = linebreak(&[], 100.0, &BreakPolicy::default());
        assert!(ok);
        assert_eq!(breaks, vec![Breakpoint::new(0, 0.0)]);
    }

    #[test]
    fn test_single_line_fits() {
        let (breaks, ok) = linebreak(&two_words(), 100.0, &BreakPolicy::default());
        assert!(ok);
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0].position, 5);
        // Finishing glue has infinite stretch, the last line is never
        // stretched.
        assert_eq!(breaks[0].ratio, 0.0);
    }

    #[test]
    fn test_break_at_glue() {
        // Only one word fits per line.
        let (breaks, ok) = linebreak(&two_words(), 12.0, &BreakPolicy::default());
        assert!(ok);
        assert_eq!(breaks.len(), 2);
        assert_eq!(breaks[0].position, 2);
        assert_eq!(breaks[0].width, 10.0);
        assert_eq!(breaks[1].position, 5);
        assert_eq!(breaks[1].width, 10.0);
    }

    #[test]
    fn test_infeasible_reports_overfull() {
        let (breaks, ok) = linebreak(&two_words(), 4.0, &BreakPolicy::default());
        assert!(!ok);
        assert!(!breaks.is_empty());
        assert_eq!(breaks.last().unwrap().position, 5);
    }

    #[test]
    fn test_feasibility_monotone_in_width() {
        let items = two_words();
        let mut was_feasible = false;
        for width in [4.0, 8.0, 12.0, 26.0, 100.0] {
            let (_, ok) = linebreak(&items, width, &BreakPolicy::default());
            assert!(ok || !was_feasible, "feasibility lost at width {width}");
            was_feasible = ok;
        }
    }

    #[test]
    fn test_forced_break_splits_lines() {
        let mut items = vec![
            boxed(0.0, 0),
            boxed(10.0, 2),
            Item::Glue {
                width: 0.0,
                stretch: f32::INFINITY,
                shrink: 0.0,
                size: 1,
            },
            Item::Penalty {
                width: 0.0,
                cost: f32::NEG_INFINITY,
                flagged: false,
                size: 0,
            },
            boxed(10.0, 2),
        ];
        items.extend(finish());
        let (breaks, ok) = linebreak(&items, 100.0, &BreakPolicy::default());
        assert!(ok);
        assert_eq!(breaks.len(), 2);
        assert_eq!(breaks[0].position, 3);
        assert_eq!(breaks[1].position, 6);
    }

    #[test]
    fn test_justified_ratio_positive_on_broken_line() {
        // Three words, width forces a break after the second; the first line
        // has one inner glue that must stretch.
        let mut items = vec![
            boxed(0.0, 0),
            boxed(10.0, 2),
            glue(5.0, 2.5, 5.0 / 3.0),
            boxed(10.0, 2),
            glue(5.0, 2.5, 5.0 / 3.0),
            boxed(10.0, 2),
        ];
        items.extend(finish());
        let (breaks, ok) = linebreak(&items, 27.0, &BreakPolicy::default());
        assert!(ok);
        assert_eq!(breaks.len(), 2);
        // First line "word word" is 25 wide and stretches to 27.
        assert_eq!(breaks[0].position, 4);
        assert!(breaks[0].ratio > 0.0);
        assert!((breaks[0].width - 25.0).abs() < 1e-5);
        // Last line is closed by the infinite finishing glue, unstretched.
        assert_eq!(breaks[1].ratio, 0.0);
    }

    #[test]
    fn test_ratio_finite_after_forced_break() {
        // A paragraph separator must not leak its infinite stretch into the
        // following paragraph's ratio computation.
        let mut items = vec![
            boxed(0.0, 0),
            boxed(10.0, 2),
            Item::Glue {
                width: 0.0,
                stretch: f32::INFINITY,
                shrink: 0.0,
                size: 1,
            },
            Item::Penalty {
                width: 0.0,
                cost: f32::NEG_INFINITY,
                flagged: false,
                size: 0,
            },
            boxed(10.0, 2),
            glue(5.0, 2.5, 5.0 / 3.0),
            boxed(10.0, 2),
        ];
        items.extend(finish());
        let (breaks, ok) = linebreak(&items, 27.0, &BreakPolicy::default());
        assert!(ok);
        // Second paragraph fits one stretched line of natural width 25.
        assert_eq!(breaks.len(), 2);
        assert_eq!(breaks[0].position, 3);
        assert!((breaks[1].width - 25.0).abs() < 1e-5);
        assert_eq!(breaks[1].ratio, 0.0);
    }

    #[test]
    fn test_looseness_prefers_more_lines() {
        let mut items = vec![boxed(0.0, 0), boxed(10.0, 2)];
        for _ in 0..3 {
            items.push(glue(5.0, 2.5, 5.0 / 3.0));
            items.push(boxed(10.0, 2));
        }
        items.extend(finish());
        let tight = BreakPolicy::default();
        let (breaks, _) = linebreak(&items, 50.0, &tight);
        let loose = BreakPolicy {
            looseness: 1,
            ..BreakPolicy::default()
        };
        let (more, _) = linebreak(&items, 50.0, &loose);
        assert!(more.len() >= breaks.len());
    }
}
