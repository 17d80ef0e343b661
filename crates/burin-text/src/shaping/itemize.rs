//! Script/direction itemization
//!
//! Splits a rune sequence into maximal runs that share one concrete script
//! and one bidi embedding level. Scripts are tracked on a stack indexed by
//! embedding level so that nested runs (quotes, brackets, embedded opposite
//! direction text) restore the surrounding script when the level pops.

use unicode_script::{Script, UnicodeScript};

/// A maximal substring sharing one script and embedding level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptItem {
    pub script: Script,
    pub text: String,
}

/// Divide `runes` into script items using the given per-rune embedding
/// levels. `levels` must be at least as long as `runes`; empty input yields
/// an empty vector.
pub fn itemize(runes: &[char], levels: &[u8]) -> Vec<ScriptItem> {
    if runes.is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut start = 0;
    // Script stack for embedding levels; entering a higher level opens a new,
    // initially inherited slot, returning to a lower level restores the
    // script recorded there.
    let mut scripts: Vec<Script> = vec![Script::Inherited];
    for (j, &r) in runes.iter().enumerate() {
        let cur_level = scripts.len() - 1;
        let cur_script = scripts[cur_level];

        let mut script = r.script();
        let level = levels[j] as usize;
        if scripts.len() <= level {
            while scripts.len() < level {
                scripts.push(Script::Inherited);
            }
            scripts.push(script);
        } else {
            if script != Script::Inherited && script != Script::Common {
                scripts[level] = script;
            } else {
                script = scripts[level];
            }
            scripts.truncate(level + 1);
        }

        let concrete_change = cur_script != script
            && cur_script != Script::Inherited
            && cur_script != Script::Common
            && script != Script::Inherited
            && script != Script::Common;
        if j != 0 && (cur_level != level || concrete_change) {
            items.push(ScriptItem {
                script: cur_script,
                text: runes[start..j].iter().collect(),
            });
            start = j;
        }
    }
    items.push(ScriptItem {
        script: scripts[scripts.len() - 1],
        text: runes[start..].iter().collect(),
    });
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::embedding_levels;

    fn itemize_str(s: &str) -> Vec<ScriptItem> {
        let runes: Vec<char> = s.chars().collect();
        let levels = embedding_levels(s);
        itemize(&runes, &levels)
    }

    #[test]
    fn test_empty_input() {
        assert!(itemize(&[], &[]).is_empty());
    }

    #[test]
    fn test_single_script() {
        let items = itemize_str("hello world");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].script, Script::Latin);
        assert_eq!(items[0].text, "hello world");
    }

    #[test]
    fn test_common_runes_adopt_surrounding_script() {
        let items = itemize_str("one, two. three");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].script, Script::Latin);
    }

    #[test]
    fn test_level_change_splits() {
        // Latin then Hebrew: the embedding level changes, yielding two runs.
        let items = itemize_str("ab \u{05D0}\u{05D1}");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].script, Script::Latin);
        assert_eq!(items[1].script, Script::Hebrew);
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        for s in ["", "abc", "ab \u{05D0}\u{05D1} cd", "a\u{4E2D}b", "x, y! z?"] {
            let joined: String = itemize_str(s).iter().map(|i| i.text.as_str()).collect();
            assert_eq!(joined, s);
        }
    }

    #[test]
    fn test_deterministic() {
        let a = itemize_str("ab \u{05D0}\u{05D1} cd");
        let b = itemize_str("ab \u{05D0}\u{05D1} cd");
        assert_eq!(a, b);
    }
}
