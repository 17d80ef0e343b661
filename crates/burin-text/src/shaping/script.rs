//! Script classification and embedding levels

use unicode_bidi::BidiInfo;
use unicode_script::Script;

use super::Rotation;

/// Compute per-rune bidi embedding levels (UAX #9) for the whole text.
///
/// The result has one entry per rune, in logical order. Empty input yields an
/// empty vector.
pub fn embedding_levels(text: &str) -> Vec<u8> {
    if text.is_empty() {
        return Vec::new();
    }
    let info = BidiInfo::new(text, None);
    text.char_indices()
        .map(|(i, _)| info.levels[i].number())
        .collect()
}

/// True for paragraph separator runes: line feed, vertical tab, form feed,
/// carriage return, next line, line separator, paragraph separator.
pub fn is_paragraph_separator(r: char) -> bool {
    matches!(r, '\u{0A}'..='\u{0D}' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

/// True for scripts written without inter-word spaces, where a line may break
/// between any two glyphs.
pub fn is_spaceless_script(script: Script) -> bool {
    matches!(
        script,
        Script::Han
            | Script::Hangul
            | Script::Katakana
            | Script::Khmer
            | Script::Lao
            | Script::Phags_Pa
            | Script::Brahmi
            | Script::Tai_Tham
            | Script::New_Tai_Lue
            | Script::Tai_Le
            | Script::Tai_Viet
            | Script::Thai
            | Script::Tibetan
            | Script::Myanmar
    )
}

/// True for scripts with native vertical layout.
pub fn is_vertical_script(script: Script) -> bool {
    matches!(
        script,
        Script::Bopomofo
            | Script::Egyptian_Hieroglyphs
            | Script::Hiragana
            | Script::Katakana
            | Script::Han
            | Script::Hangul
            | Script::Meroitic_Cursive
            | Script::Meroitic_Hieroglyphs
            | Script::Mongolian
            | Script::Ogham
            | Script::Old_Turkic
            | Script::Phags_Pa
            | Script::Yi
    )
}

/// Intrinsic rotation of a script when laid out on a vertical line.
pub fn script_rotation(script: Script) -> Rotation {
    match script {
        Script::Mongolian | Script::Phags_Pa => Rotation::Clockwise,
        Script::Ogham | Script::Old_Turkic => Rotation::CounterClockwise,
        _ => Rotation::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_levels_per_rune() {
        let levels = embedding_levels("abc");
        assert_eq!(levels, vec![0, 0, 0]);

        // Hebrew gets an odd (right-to-left) level.
        let levels = embedding_levels("a\u{05D0}");
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0], 0);
        assert_eq!(levels[1] % 2, 1);
    }

    #[test]
    fn test_embedding_levels_empty() {
        assert!(embedding_levels("").is_empty());
    }

    #[test]
    fn test_paragraph_separators() {
        assert!(is_paragraph_separator('\n'));
        assert!(is_paragraph_separator('\r'));
        assert!(is_paragraph_separator('\u{2029}'));
        assert!(!is_paragraph_separator(' '));
    }

    #[test]
    fn test_script_rotation() {
        assert_eq!(script_rotation(Script::Mongolian), Rotation::Clockwise);
        assert_eq!(script_rotation(Script::Ogham), Rotation::CounterClockwise);
        assert_eq!(script_rotation(Script::Latin), Rotation::None);
    }
}
